//! Boolean keyword expression matching.
//!
//! This crate compiles a small boolean expression language over keywords into
//! an immutable tree, and evaluates that tree against arbitrary text:
//!
//! - **Literals**: `rust` - match by substring containment
//! - **AND**: `rust&async` - both keywords must appear
//! - **OR**: `rust|golang` - at least one must appear
//! - **NOT**: `!deprecated` - negates a literal or a bracketed group
//! - **Grouping**: `(a|b)&c` - precedence control
//!
//! AND binds tighter than OR. Compilation normalizes the tree: redundant
//! brackets are stripped, same-kind non-negated children are flattened into
//! their parent, and single-child nodes are lifted.
//!
//! # Example
//!
//! ```
//! use kwexpr::compile;
//!
//! let expr = compile("(rust|go)&!deprecated").unwrap();
//! assert!(expr.matches("a rust crate"));
//! assert!(!expr.matches("a deprecated rust crate"));
//! ```
//!
//! A compiled expression is immutable and evaluation is read-only, so it can
//! be shared and matched concurrently without locking.

#![warn(missing_docs)]

mod compiler;
mod error;
mod expr;

pub use compiler::compile;
pub use error::CompileError;
pub use expr::{CompiledExpression, Expr, ExprKind};
