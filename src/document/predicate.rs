use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value as Json};

use crate::search_query::Operator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Gte,
    Gt,
    Lte,
    Lt,
}

impl Comparison {
    pub fn from_operator(op: Operator) -> Option<Self> {
        match op {
            Operator::Gte => Some(Comparison::Gte),
            Operator::Gt => Some(Comparison::Gt),
            Operator::Lte => Some(Comparison::Lte),
            Operator::Lt => Some(Comparison::Lt),
            Operator::Default | Operator::Eq => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Comparison::Gte => "$gte",
            Comparison::Gt => "$gt",
            Comparison::Lte => "$lte",
            Comparison::Lt => "$lt",
        }
    }
}

/// Right-hand side of a field condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Json),
    /// Cast to a timestamp by the store: `{"$toDate": text}`.
    Date(String),
}

impl Operand {
    fn to_json(&self) -> Json {
        match self {
            Operand::Literal(v) => v.clone(),
            Operand::Date(text) => json!({ "$toDate": text }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equals(Operand),
    /// Pattern match; the pattern is already escaped.
    Matches(String),
    Compare(Comparison, Operand),
}

impl Condition {
    /// `{field: <this>}` for a positive predicate.
    fn to_json(&self) -> Json {
        match self {
            Condition::Equals(operand) => operand.to_json(),
            Condition::Matches(pattern) => json!({ "$regex": pattern }),
            Condition::Compare(cmp, operand) => {
                let mut map = Map::new();
                map.insert(cmp.key().to_string(), operand.to_json());
                Json::Object(map)
            }
        }
    }

    /// Always an operator object, so it can sit under `$not`.
    fn to_operator_json(&self) -> Json {
        match self {
            Condition::Equals(Operand::Literal(v)) => json!({ "$eq": v }),
            other => other.to_json(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldPredicate {
    pub field: String,
    pub condition: Condition,
    pub negated: bool,
}

impl FieldPredicate {
    fn to_json(&self) -> Json {
        let condition = if self.negated {
            json!({ "$not": self.condition.to_operator_json() })
        } else {
            self.condition.to_json()
        };
        let mut map = Map::new();
        map.insert(self.field.clone(), condition);
        Json::Object(map)
    }
}

/// Nested boolean filter for a document store.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentQuery {
    Field(FieldPredicate),
    And(Vec<DocumentQuery>),
    Or(Vec<DocumentQuery>),
}

impl DocumentQuery {
    pub fn to_json(&self) -> Json {
        match self {
            DocumentQuery::Field(predicate) => predicate.to_json(),
            DocumentQuery::And(children) => {
                json!({ "$and": children.iter().map(Self::to_json).collect::<Vec<_>>() })
            }
            DocumentQuery::Or(children) => {
                json!({ "$or": children.iter().map(Self::to_json).collect::<Vec<_>>() })
            }
        }
    }
}

impl Serialize for DocumentQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
