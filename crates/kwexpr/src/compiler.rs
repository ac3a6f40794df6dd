//! Expression compiler.
//!
//! Compiles a keyword expression string into an [`Expr`] tree. There is no
//! separate tokenizer: two mutually recursive segmenters split the input at
//! top-level `|` and `&` respectively, each treating the other operator as
//! ordinary segment content. A segment that still contains operators is
//! recursively compiled at the opposite level; a set of already-attempted
//! levels is threaded through when a segment spans the whole input, so an
//! expression that fits neither framing is rejected instead of recursing
//! forever.
//!
//! # Grammar
//!
//! ```text
//! expr        → disjunction
//! disjunction → conjunction ('|' conjunction)*
//! conjunction → unary ('&' unary)*
//! unary       → '!' unary | '(' expr ')' | literal
//! ```
//!
//! AND binds tighter than OR. A `!` prefix negates a literal or a single
//! fully bracketed group; it does not distribute over an unbracketed
//! multi-term sequence.

use crate::{
    error::CompileError,
    expr::{CompiledExpression, Expr},
};

/// Characters reserved by the expression language.
const CONTROL_CHARS: [char; 5] = ['&', '|', '!', '(', ')'];

/// The grammar level a segmenter pass operates at.
///
/// Each level splits the input at its own operator and absorbs the other:
/// the OR level splits at `|`, the AND level at `&`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    /// Disjunction level, splitting at `|`.
    Or,
    /// Conjunction level, splitting at `&`.
    And,
}

impl Level {
    /// The operator that ends a segment at this level.
    fn split_char(self) -> char {
        match self {
            Self::Or => '|',
            Self::And => '&',
        }
    }

    /// The opposite grammar level.
    fn other(self) -> Self {
        match self {
            Self::Or => Self::And,
            Self::And => Self::Or,
        }
    }

    /// Bit used to record this level in a [`ModeSet`].
    fn bit(self) -> u8 {
        match self {
            Self::Or => 0b01,
            Self::And => 0b10,
        }
    }
}

/// Set of grammar levels already attempted on a given input slice.
///
/// A segment identical to the whole input would otherwise bounce between the
/// two levels indefinitely; carrying the attempted set through such calls
/// turns the second attempt at the same level into a syntax error.
#[derive(Debug, Clone, Copy, Default)]
struct ModeSet(u8);

impl ModeSet {
    /// No levels attempted yet.
    const EMPTY: Self = Self(0);

    /// Returns whether `level` has already been attempted.
    fn contains(self, level: Level) -> bool {
        self.0 & level.bit() != 0
    }

    /// Returns the set with `level` added.
    fn with(self, level: Level) -> Self {
        Self(self.0 | level.bit())
    }
}

/// One operator-delimited slice of the input, plus the state gathered while
/// scanning it.
#[derive(Debug)]
struct Segment {
    /// Negation accumulated from the leading `!` prefix during trimming.
    negated: bool,
    /// The segment's characters.
    text: Vec<char>,
    /// False once an operator is seen at any depth; a segment that stays
    /// true is a plain keyword and is never recursively compiled.
    is_literal: bool,
    /// Positions of open brackets within `text`. Slot `k` holds the position
    /// of the open bracket most recently pushed at depth `k + 1`; trimming
    /// reads slot `k` to verify that the `k`-th outer bracket pair actually
    /// wraps the whole remaining segment.
    bracket_stack: Vec<usize>,
}

impl Segment {
    /// Strips the leading `!` prefix and any fully wrapping bracket pairs.
    ///
    /// Each stripped `!` toggles [`negated`](Self::negated). An outer bracket
    /// pair is stripped only when the recorded position of the corresponding
    /// open bracket matches the current left edge, so `(a)(b)` keeps its
    /// brackets. A `!` prefix may only negate a literal or one fully
    /// bracketed group; when the remainder is an unbracketed operator
    /// sequence the prefix is restored and the negation dropped.
    ///
    /// Returns true when the segment's span changed.
    fn trim(&mut self) -> bool {
        let len = self.text.len();
        let mut left = 0;
        let mut right = len;

        while left < right && self.text[left] == '!' {
            self.negated = !self.negated;
            left += 1;
        }

        while left < right
            && self.text[left] == '('
            && self.text[right - 1] == ')'
            && self.bracket_stack.get(len - right) == Some(&left)
        {
            left += 1;
            right -= 1;
        }

        if left > 0 && right == len && !self.is_literal {
            self.negated = false;
            left = 0;
        }

        if left > 0 || right < len {
            self.text.truncate(right);
            self.text.drain(..left);
            true
        } else {
            false
        }
    }

    /// Builds a literal node from this segment.
    ///
    /// Segmentation never routes an operator-bearing segment here; the
    /// control-character check guards the invariant anyway.
    fn into_literal(self) -> Result<Expr, CompileError> {
        if self.text.iter().any(|c| CONTROL_CHARS.contains(c)) {
            return Err(CompileError::invalid(collect(&self.text)));
        }
        Ok(Expr::Literal {
            negated: self.negated,
            keyword: collect(&self.text),
        })
    }
}

/// Collects a character slice back into a string.
fn collect(chars: &[char]) -> String {
    chars.iter().collect()
}

/// Extracts the next segment of `input` starting at `cursor`, splitting at
/// `split` only when outside brackets.
///
/// Returns the segment and whether it was ended by the split operator (as
/// opposed to the end of the input). Bracket positions are recorded for
/// [`Segment::trim`]; a closing bracket with no opener, or an opener still
/// unclosed at the end of the input, is a syntax error.
fn next_segment(
    input: &[char],
    cursor: &mut usize,
    split: char,
) -> Result<(Segment, bool), CompileError> {
    let mut segment = Segment {
        negated: false,
        text: Vec::with_capacity(input.len() - *cursor),
        is_literal: true,
        bracket_stack: Vec::new(),
    };
    let mut depth = 0usize;

    while *cursor < input.len() {
        let c = input[*cursor];
        *cursor += 1;
        match c {
            '(' => {
                // Re-pushing at a lower depth overwrites stale entries from
                // brackets that already closed.
                segment.bracket_stack.truncate(depth);
                segment.bracket_stack.push(segment.text.len());
                depth += 1;
                segment.text.push(c);
            }
            ')' => {
                if depth == 0 {
                    return Err(CompileError::invalid(collect(input)));
                }
                depth -= 1;
                segment.text.push(c);
            }
            c if c == split && depth == 0 => return Ok((segment, true)),
            c @ ('|' | '&') => {
                segment.text.push(c);
                segment.is_literal = false;
            }
            c => segment.text.push(c),
        }
    }

    if depth > 0 {
        return Err(CompileError::invalid(collect(&segment.text)));
    }
    Ok((segment, false))
}

/// Parses `input` as a sequence of `level`-operator-separated segments.
///
/// `negated` becomes the resulting node's negation flag. `mode` records the
/// levels already attempted on this exact slice; re-attempting a level means
/// the expression fits neither grammar rule and is rejected.
fn parse(
    level: Level,
    input: &[char],
    negated: bool,
    mode: ModeSet,
) -> Result<Expr, CompileError> {
    if input.is_empty() || mode.contains(level) {
        return Err(CompileError::invalid(collect(input)));
    }
    let mode = mode.with(level);

    let mut children = Vec::new();
    let mut cursor = 0;
    loop {
        let (mut segment, ended_by_split) = next_segment(input, &mut cursor, level.split_char())?;
        let changed = segment.trim();
        if segment.text.is_empty() {
            return Err(CompileError::invalid(collect(input)));
        }

        let child = if segment.is_literal {
            segment.into_literal()?
        } else if level == Level::Or && changed {
            // Bracket stripping can expose top-level `|` splits that were
            // hidden before, so a reshaped segment is retried at the OR
            // level rather than handed down to the AND level.
            parse(Level::Or, &segment.text, segment.negated, ModeSet::EMPTY)?
        } else if segment.text.len() == input.len() {
            parse(level.other(), &segment.text, segment.negated, mode)?
        } else {
            parse(level.other(), &segment.text, segment.negated, ModeSet::EMPTY)?
        };
        children.push(child);

        if !ended_by_split {
            break;
        }
    }

    Ok(match level {
        Level::Or => Expr::or(negated, children),
        Level::And => Expr::and(negated, children),
    })
}

/// Compiles a keyword expression into a matchable tree.
///
/// The whole input is first framed as a disjunction; segmentation and
/// recursive compilation take it from there. All syntax errors are reported
/// as [`CompileError::InvalidExpression`] carrying the offending
/// (sub)expression.
pub fn compile(expression: &str) -> Result<CompiledExpression, CompileError> {
    let chars: Vec<char> = expression.chars().collect();
    let root = parse(Level::Or, &chars, false, ModeSet::EMPTY)?;
    Ok(CompiledExpression { root })
}
