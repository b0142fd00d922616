//! Compact search strings compiled for a document store or an SQL database.
//!
//! ```
//! use searchq::{document::DocumentSearch, policy::FieldPolicy, sql::SqlSearch};
//!
//! let policy = FieldPolicy::new().with_any(["title", "stars"]).with_is_string(["title"]);
//!
//! let filter = DocumentSearch::new(policy.clone()).search("rust stars>=4").unwrap();
//! assert_eq!(filter.to_json()["$and"][1], serde_json::json!({"stars": {"$gte": 4}}));
//!
//! let sql = SqlSearch::new(policy).search(Some("(rust")).unwrap();
//! assert_eq!(sql.text, "TRUE");
//! ```

pub mod config;
pub mod dates;
pub mod document;
pub mod error;
pub mod policy;
pub mod search_query;
pub mod sql;

pub use error::{ConfigurationError, ParseError, SearchError};

#[cfg(test)]
mod tests;
