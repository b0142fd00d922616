//! Compiles a parsed query into parameterized SQL boolean text.

mod query;

pub use query::{escape_like, ParamIds, SqlQuery, SqlValue, Wildcards};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dates;
use crate::error::{ConfigurationError, ParseError, SearchError};
use crate::policy::FieldPolicy;
use crate::search_query::{self, Dialect, Leaf, Node, Operator, Value};

/// Keyed fields are written into the SQL text, so they must be plain
/// (optionally dotted) identifiers.
static FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("field pattern is valid")
});

/// When a relative date on an `isDate` field replaces the written operator
/// with `<=`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateOverride {
    /// Every relative date compares with `<=`, whatever operator was written.
    #[default]
    Always,
    /// Only `field:<date>` becomes `<=`; explicit comparisons are kept.
    DefaultOperatorOnly,
}

#[derive(Debug, Clone, Default)]
pub struct SqlSearch {
    policy: FieldPolicy,
    date_override: DateOverride,
}

impl SqlSearch {
    pub fn new(policy: FieldPolicy) -> Self {
        Self {
            policy,
            date_override: DateOverride::default(),
        }
    }

    pub fn with_date_override(mut self, date_override: DateOverride) -> Self {
        self.date_override = date_override;
        self
    }

    pub fn policy(&self) -> &FieldPolicy {
        &self.policy
    }

    /// Parse and compile `query`.
    ///
    /// A missing, empty or unparseable query yields `TRUE` with no params,
    /// as does a keyed field that is not an identifier. Configuration errors
    /// are still returned.
    pub fn search(&self, query: Option<&str>) -> Result<SqlQuery, ConfigurationError> {
        self.search_at(query, Utc::now())
    }

    /// Like [`search`](Self::search) with relative dates resolved against `now`.
    pub fn search_at(
        &self,
        query: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<SqlQuery, ConfigurationError> {
        let Some(query) = query.filter(|q| !q.is_empty()) else {
            return Ok(SqlQuery::tautology());
        };

        let compiled = search_query::parse(query, Dialect::Relational)
            .map_err(SearchError::from)
            .and_then(|node| compile_at(&node, &self.policy, self.date_override, now));
        match compiled {
            Ok(query) => Ok(query),
            Err(SearchError::Parse(err)) => {
                log::debug!("unusable sql filter, matching everything: {err}");
                Ok(SqlQuery::tautology())
            }
            Err(SearchError::Configuration(err)) => Err(err),
        }
    }
}

/// Fails with [`ParseError::InvalidField`] when a keyed field is not an
/// identifier.
pub fn compile(node: &Node, policy: &FieldPolicy) -> Result<SqlQuery, SearchError> {
    compile_at(node, policy, DateOverride::default(), Utc::now())
}

pub fn compile_at(
    node: &Node,
    policy: &FieldPolicy,
    date_override: DateOverride,
    now: DateTime<Utc>,
) -> Result<SqlQuery, SearchError> {
    let mut compiler = Compiler {
        policy,
        date_override,
        now,
        ids: ParamIds::new(),
    };
    let query = compiler.node(node)?;
    log::debug!(
        "compiled sql filter params={} leaves={}",
        query.params.len(),
        node.leaf_count()
    );
    Ok(query)
}

struct Compiler<'a> {
    policy: &'a FieldPolicy,
    date_override: DateOverride,
    now: DateTime<Utc>,
    ids: ParamIds,
}

impl Compiler<'_> {
    fn node(&mut self, node: &Node) -> Result<SqlQuery, SearchError> {
        match node {
            Node::Leaf(Leaf::Keyed {
                field, op, value, ..
            }) => self.keyed(field, *op, value),
            Node::Leaf(Leaf::Bare { value, .. }) => Ok(self.bare(value)?),
            Node::And(children) => Ok(SqlQuery::and(self.children(children)?)),
            Node::Or(children) => Ok(SqlQuery::or(self.children(children)?)),
        }
    }

    fn children(&mut self, children: &[Node]) -> Result<Vec<SqlQuery>, SearchError> {
        children.iter().map(|child| self.node(child)).collect()
    }

    fn keyed(
        &mut self,
        field: &str,
        op: Operator,
        value: &Value,
    ) -> Result<SqlQuery, SearchError> {
        if !FIELD_RE.is_match(field) {
            return Err(ParseError::InvalidField {
                field: field.to_string(),
            }
            .into());
        }
        Ok(self.keyed_clause(field, op, value))
    }

    fn keyed_clause(&mut self, field: &str, op: Operator, value: &Value) -> SqlQuery {
        if value.is_null() {
            return SqlQuery::is_null(field);
        }

        if let Value::String(text) = value {
            if self.policy.is_date_field(field) {
                if let Some(at) = dates::resolve(text, self.now) {
                    let op = match self.date_override {
                        DateOverride::Always => Operator::Lte,
                        DateOverride::DefaultOperatorOnly if op == Operator::Default => {
                            Operator::Lte
                        }
                        DateOverride::DefaultOperatorOnly => op,
                    };
                    return SqlQuery::compare(field, op, dates::to_iso(at).into(), &mut self.ids);
                }
            }
        }

        if op == Operator::Default && self.policy.is_string_field(field) {
            return SqlQuery::like(field, value.text(), Wildcards::SUBSTRING, &mut self.ids);
        }

        SqlQuery::compare(field, op, value.into(), &mut self.ids)
    }

    fn bare(&mut self, value: &Value) -> Result<SqlQuery, ConfigurationError> {
        let policy = self.policy;
        let fields = policy
            .bare_fields()
            .ok_or_else(|| ConfigurationError::NoBareFields {
                token: value.text().to_string(),
            })?;

        let mut parts = Vec::with_capacity(fields.len());
        for field in fields {
            let part = if value.is_null() {
                SqlQuery::is_null(field)
            } else if policy.is_string_field(field) {
                SqlQuery::like(field, value.text(), Wildcards::SUBSTRING, &mut self.ids)
            } else {
                SqlQuery::compare(field, Operator::Eq, value.into(), &mut self.ids)
            };
            parts.push(part);
        }
        Ok(SqlQuery::or(parts))
    }
}

#[cfg(test)]
mod tests;
