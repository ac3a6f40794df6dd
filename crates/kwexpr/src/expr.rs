//! Expression tree and evaluator.
//!
//! The compiler produces a tree of [`Expr`] nodes; evaluation walks the tree
//! and checks each literal by substring containment.

use std::fmt;

use serde::Serialize;

/// The variant of an expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprKind {
    /// A keyword literal.
    Literal,
    /// A conjunction of sub-expressions.
    And,
    /// A disjunction of sub-expressions.
    Or,
}

/// A node in a compiled keyword expression.
///
/// Each node carries a negation flag, applied as the final step of that
/// node's own evaluation. The tree is canonical after compilation:
///
/// - every `And`/`Or` node has at least two children;
/// - an `And` never directly contains a non-negated `And`, and an `Or` never
///   directly contains a non-negated `Or` (negation is an explicit boundary,
///   so negated same-kind children stay nested);
/// - a literal's keyword contains none of `&`, `|`, `!`, `(`, `)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Expr {
    /// A keyword that matches by substring containment.
    Literal {
        /// Whether the containment result is inverted.
        negated: bool,
        /// The substring to search for.
        keyword: String,
    },

    /// Conjunction: all children must match.
    And {
        /// Whether the conjunction result is inverted.
        negated: bool,
        /// Ordered sub-expressions.
        children: Vec<Expr>,
    },

    /// Disjunction: at least one child must match.
    Or {
        /// Whether the disjunction result is inverted.
        negated: bool,
        /// Ordered sub-expressions.
        children: Vec<Expr>,
    },
}

impl Expr {
    /// Builds a conjunction, splicing non-negated `And` children into the new
    /// node. A lone child is returned directly with `negated` folded into it.
    pub fn and(negated: bool, children: Vec<Self>) -> Self {
        let mut flat = Vec::with_capacity(children.len());
        for child in children {
            match child {
                Self::And {
                    negated: false,
                    children: inner,
                } => flat.extend(inner),
                other => flat.push(other),
            }
        }

        if flat.len() == 1 {
            let mut child = flat.swap_remove(0);
            if negated {
                child.toggle_negated();
            }
            child
        } else {
            Self::And {
                negated,
                children: flat,
            }
        }
    }

    /// Builds a disjunction, splicing non-negated `Or` children into the new
    /// node. A lone child is returned directly with `negated` folded into it.
    pub fn or(negated: bool, children: Vec<Self>) -> Self {
        let mut flat = Vec::with_capacity(children.len());
        for child in children {
            match child {
                Self::Or {
                    negated: false,
                    children: inner,
                } => flat.extend(inner),
                other => flat.push(other),
            }
        }

        if flat.len() == 1 {
            let mut child = flat.swap_remove(0);
            if negated {
                child.toggle_negated();
            }
            child
        } else {
            Self::Or {
                negated,
                children: flat,
            }
        }
    }

    /// Returns the variant of this node.
    pub fn kind(&self) -> ExprKind {
        match self {
            Self::Literal { .. } => ExprKind::Literal,
            Self::And { .. } => ExprKind::And,
            Self::Or { .. } => ExprKind::Or,
        }
    }

    /// Returns whether this node's result is inverted.
    pub fn negated(&self) -> bool {
        match self {
            Self::Literal { negated, .. }
            | Self::And { negated, .. }
            | Self::Or { negated, .. } => *negated,
        }
    }

    /// Flips this node's negation flag.
    pub fn toggle_negated(&mut self) {
        match self {
            Self::Literal { negated, .. }
            | Self::And { negated, .. }
            | Self::Or { negated, .. } => *negated = !*negated,
        }
    }

    /// Returns this node's sub-expressions (empty for a literal).
    pub fn children(&self) -> &[Self] {
        match self {
            Self::Literal { .. } => &[],
            Self::And { children, .. } | Self::Or { children, .. } => children,
        }
    }

    /// Returns the keyword for a literal node.
    pub fn keyword(&self) -> Option<&str> {
        match self {
            Self::Literal { keyword, .. } => Some(keyword),
            Self::And { .. } | Self::Or { .. } => None,
        }
    }

    /// Evaluates this node against `text`.
    ///
    /// Literals match by case-sensitive substring containment. `And` and `Or`
    /// short-circuit in child order. The negation flag inverts the result as
    /// the final step.
    pub fn matches(&self, text: &str) -> bool {
        let result = match self {
            Self::Literal { keyword, .. } => text.contains(keyword.as_str()),
            Self::And { children, .. } => children.iter().all(|child| child.matches(text)),
            Self::Or { children, .. } => children.iter().any(|child| child.matches(text)),
        };
        result != self.negated()
    }

    /// Formats the node as an indented tree at the given depth.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        let bang = if self.negated() { "!" } else { "" };
        match self {
            Self::Literal { keyword, .. } => writeln!(f, "{prefix}{bang}Literal({keyword:?})"),
            Self::And { children, .. } => {
                writeln!(f, "{prefix}{bang}And")?;
                for child in children {
                    child.fmt_tree(f, indent + 1)?;
                }
                Ok(())
            }
            Self::Or { children, .. } => {
                writeln!(f, "{prefix}{bang}Or")?;
                for child in children {
                    child.fmt_tree(f, indent + 1)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}

/// A compiled keyword expression, ready to match against text.
///
/// Produced by [`compile`](crate::compile). The tree inside is immutable;
/// [`matches`](Self::matches) never mutates it, so a compiled expression can
/// be shared and evaluated concurrently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CompiledExpression {
    /// Root of the expression tree.
    pub(crate) root: Expr,
}

impl CompiledExpression {
    /// Returns whether `text` satisfies the expression.
    pub fn matches(&self, text: &str) -> bool {
        self.root.matches(text)
    }

    /// Returns the root node for structural inspection.
    ///
    /// This is a read-only projection of the compiled tree; it is not a way
    /// to rebuild or re-parse the expression.
    pub fn to_debug_tree(&self) -> &Expr {
        &self.root
    }
}

impl fmt::Display for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.root.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> Expr {
        Expr::Literal {
            negated: false,
            keyword: s.into(),
        }
    }

    fn not_lit(s: &str) -> Expr {
        Expr::Literal {
            negated: true,
            keyword: s.into(),
        }
    }

    #[test]
    fn and_flattens_nested() {
        let nested = Expr::and(
            false,
            vec![
                lit("a"),
                Expr::And {
                    negated: false,
                    children: vec![lit("b"), lit("c")],
                },
            ],
        );

        assert_eq!(
            nested,
            Expr::And {
                negated: false,
                children: vec![lit("a"), lit("b"), lit("c")],
            }
        );
    }

    #[test]
    fn and_keeps_negated_child_nested() {
        let negated_child = Expr::And {
            negated: true,
            children: vec![lit("b"), lit("c")],
        };
        let combined = Expr::and(false, vec![lit("a"), negated_child.clone()]);

        assert_eq!(
            combined,
            Expr::And {
                negated: false,
                children: vec![lit("a"), negated_child],
            }
        );
    }

    #[test]
    fn or_flattens_nested() {
        let nested = Expr::or(
            false,
            vec![
                lit("a"),
                Expr::Or {
                    negated: false,
                    children: vec![lit("b"), lit("c")],
                },
            ],
        );

        assert_eq!(
            nested,
            Expr::Or {
                negated: false,
                children: vec![lit("a"), lit("b"), lit("c")],
            }
        );
    }

    #[test]
    fn lone_child_lifts_with_negation() {
        assert_eq!(Expr::and(false, vec![lit("a")]), lit("a"));
        assert_eq!(Expr::or(true, vec![lit("a")]), not_lit("a"));
        // Lifting through a negated parent cancels the child's own negation.
        assert_eq!(Expr::and(true, vec![not_lit("a")]), lit("a"));
    }

    #[test]
    fn literal_matches_by_containment() {
        let expr = lit("hello");
        assert!(expr.matches("say hello world"));
        assert!(!expr.matches("say helo world"));
        assert!(!expr.matches(""));
    }

    #[test]
    fn negated_literal_inverts() {
        let expr = not_lit("hello");
        assert!(!expr.matches("say hello"));
        assert!(expr.matches("say hi"));
        assert!(expr.matches(""));
    }

    #[test]
    fn and_requires_all_children() {
        let expr = Expr::And {
            negated: false,
            children: vec![lit("a"), lit("b")],
        };
        assert!(expr.matches("ab"));
        assert!(!expr.matches("a"));
    }

    #[test]
    fn or_requires_any_child() {
        let expr = Expr::Or {
            negated: false,
            children: vec![lit("a"), lit("b")],
        };
        assert!(expr.matches("b"));
        assert!(!expr.matches("c"));
    }

    #[test]
    fn unicode_keyword_containment() {
        let expr = lit("深圳");
        assert!(expr.matches("欢迎来到深圳市"));
        assert!(!expr.matches("欢迎"));
    }

    #[test]
    fn toggle_negated_round_trips() {
        let mut expr = lit("a");
        expr.toggle_negated();
        assert!(expr.negated());
        expr.toggle_negated();
        assert!(!expr.negated());
    }

    #[test]
    fn accessors_expose_shape() {
        let expr = Expr::And {
            negated: false,
            children: vec![lit("a"), not_lit("b")],
        };
        assert_eq!(expr.kind(), ExprKind::And);
        assert_eq!(expr.children().len(), 2);
        assert_eq!(expr.children()[0].keyword(), Some("a"));
        assert_eq!(expr.keyword(), None);
        assert!(lit("a").children().is_empty());
    }

    #[test]
    fn display_renders_indented_tree() {
        let expr = Expr::And {
            negated: false,
            children: vec![lit("a"), not_lit("b")],
        };
        let rendered = expr.to_string();
        assert_eq!(rendered, "And\n  Literal(\"a\")\n  !Literal(\"b\")\n");
    }
}
