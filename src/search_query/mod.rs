//! Grammar for compact search strings such as `"a":1.1 -b` or `(a OR b>2) c=a`.
//!
//! ```text
//! sentence    = disjunction
//! disjunction = conjunction (" OR " conjunction)*
//! conjunction = atom (" " atom)*
//! atom        = "(" sentence ")" | leaf
//! leaf        = ["-"] (string op value | value)
//! op          = ":" | ">=" | ">" | "<=" | "<" | "="
//! ```
//!
//! Separators are literal: exactly one space joins conjuncts and exactly
//! ` OR ` joins disjuncts. `OR` binds looser than the implicit AND.
//! Groups nest at most [`MAX_DEPTH`] levels.

mod lexer;
mod parser;

pub use lexer::{Dialect, Number, Operator, Value};
pub use parser::{Leaf, Node, MAX_DEPTH};

use crate::error::ParseError;

/// Parse `input` into an AST for the given backend dialect.
///
/// Fails on empty input as well as on anything the grammar rejects.
pub fn parse(input: &str, dialect: Dialect) -> Result<Node, ParseError> {
    let tokens = lexer::tokenize(input, dialect)?;
    let node = parser::parse(tokens)?;
    log::debug!("parsed query dialect={dialect:?} leaves={}", node.leaf_count());
    Ok(node)
}
