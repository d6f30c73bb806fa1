//! Boolean retrieval
//!
//! Queries combine terms with `AND`, `OR`, `NOT` and parentheses:
//!
//! ```text
//! cat AND (dog OR bird)
//! NOT (cat OR dog) AND eel
//! ```
//!
//! Operators are applied strictly left to right with no precedence.

pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod runner;

pub use evaluator::Evaluator;
pub use lexer::{Lexer, Token};
pub use parser::Query;
pub use runner::{QueryRunner, RunSummary};
