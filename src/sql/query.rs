use std::collections::BTreeMap;

use rusty_ulid::Ulid;
use serde::Serialize;

use crate::search_query::{Operator, Value};

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<&Value> for SqlValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => SqlValue::Null,
            Value::String(s) => SqlValue::Text(s.clone()),
            Value::Number(n) => {
                if n.is_integer() {
                    if let Ok(i) = n.as_str().parse::<i64>() {
                        return SqlValue::Integer(i);
                    }
                }
                n.as_str()
                    .parse::<f64>()
                    .map(SqlValue::Float)
                    .unwrap_or_else(|_| SqlValue::Text(n.as_str().to_string()))
            }
        }
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

/// Placeholder names for one compilation: a fresh ULID shared by the call
/// plus a counter, so names never repeat within a call.
#[derive(Debug)]
pub struct ParamIds {
    prefix: String,
    issued: usize,
}

impl ParamIds {
    pub fn new() -> Self {
        Self {
            prefix: Ulid::generate().to_string().to_lowercase(),
            issued: 0,
        }
    }

    pub fn next_id(&mut self) -> String {
        let id = format!("p{}_{}", self.prefix, self.issued);
        self.issued += 1;
        id
    }
}

impl Default for ParamIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Which sides of a LIKE pattern get a `%`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wildcards {
    pub leading: bool,
    pub trailing: bool,
}

impl Wildcards {
    pub const SUBSTRING: Wildcards = Wildcards {
        leading: true,
        trailing: true,
    };
    pub const PREFIX: Wildcards = Wildcards {
        leading: false,
        trailing: true,
    };
    pub const SUFFIX: Wildcards = Wildcards {
        leading: true,
        trailing: false,
    };
}

/// Escape LIKE metacharacters for use with `ESCAPE '\'`.
pub fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn comparison_sql(op: Operator) -> &'static str {
    match op {
        Operator::Default | Operator::Eq => "=",
        Operator::Gte => ">=",
        Operator::Gt => ">",
        Operator::Lte => "<=",
        Operator::Lt => "<",
    }
}

/// Boolean SQL with named `@id` placeholders and the values they bind.
///
/// `text` never contains user values; pass both halves to a
/// parameterized-query executor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlQuery {
    pub text: String,
    pub params: BTreeMap<String, SqlValue>,
}

impl SqlQuery {
    /// Matches every row.
    pub fn tautology() -> Self {
        Self::from("TRUE")
    }

    pub fn is_tautology(&self) -> bool {
        self.text == "TRUE" && self.params.is_empty()
    }

    /// `(a) AND (b) ...`; an empty list is `TRUE`.
    pub fn and<I, Q>(parts: I) -> Self
    where
        I: IntoIterator<Item = Q>,
        Q: Into<SqlQuery>,
    {
        Self::join("AND", parts).unwrap_or_else(Self::tautology)
    }

    /// `(a) OR (b) ...`; an empty list is `FALSE`.
    pub fn or<I, Q>(parts: I) -> Self
    where
        I: IntoIterator<Item = Q>,
        Q: Into<SqlQuery>,
    {
        Self::join("OR", parts).unwrap_or_else(|| Self::from("FALSE"))
    }

    fn join<I, Q>(op: &str, parts: I) -> Option<Self>
    where
        I: IntoIterator<Item = Q>,
        Q: Into<SqlQuery>,
    {
        let mut texts = Vec::new();
        let mut params = BTreeMap::new();
        for part in parts {
            let part = part.into();
            texts.push(format!("({})", part.text));
            params.extend(part.params);
        }
        if texts.is_empty() {
            return None;
        }
        Some(Self {
            text: texts.join(&format!(" {op} ")),
            params,
        })
    }

    /// `field LIKE @id ESCAPE '\'` with the value escaped and wrapped in `%`.
    pub fn like(field: &str, value: &str, wildcards: Wildcards, ids: &mut ParamIds) -> Self {
        let id = ids.next_id();
        let pattern = format!(
            "{}{}{}",
            if wildcards.leading { "%" } else { "" },
            escape_like(value),
            if wildcards.trailing { "%" } else { "" },
        );
        Self {
            text: format!("{field} LIKE @{id} ESCAPE '\\'"),
            params: BTreeMap::from([(id, SqlValue::Text(pattern))]),
        }
    }

    /// `field <op> @id`, or `field IS NULL` when the value is null.
    pub fn compare(field: &str, op: Operator, value: SqlValue, ids: &mut ParamIds) -> Self {
        if value == SqlValue::Null {
            return Self::is_null(field);
        }
        let id = ids.next_id();
        Self {
            text: format!("{field} {} @{id}", comparison_sql(op)),
            params: BTreeMap::from([(id, value)]),
        }
    }

    pub fn is_null(field: &str) -> Self {
        Self::from(format!("{field} IS NULL"))
    }
}

impl From<&str> for SqlQuery {
    fn from(text: &str) -> Self {
        Self::from(text.to_string())
    }
}

impl From<String> for SqlQuery {
    fn from(text: String) -> Self {
        Self {
            text,
            params: BTreeMap::new(),
        }
    }
}
