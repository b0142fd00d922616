//! Compiles a parsed query into a document-store filter built from
//! `$or`/`$and` over field predicates (`$regex`, `$gte`, `$gt`, `$lte`,
//! `$lt`, `$not`, `$toDate`).

mod predicate;

pub use predicate::{Comparison, Condition, DocumentQuery, FieldPredicate, Operand};

use chrono::{DateTime, Utc};

use crate::dates;
use crate::error::{ConfigurationError, SearchError};
use crate::policy::FieldPolicy;
use crate::search_query::{self, Dialect, Leaf, Node, Operator, Value};

#[derive(Debug, Clone, Default)]
pub struct DocumentSearch {
    policy: FieldPolicy,
}

impl DocumentSearch {
    pub fn new(policy: FieldPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &FieldPolicy {
        &self.policy
    }

    /// Parse and compile. Both parse and configuration errors are returned
    /// to the caller.
    pub fn search(&self, input: &str) -> Result<DocumentQuery, SearchError> {
        self.search_at(input, Utc::now())
    }

    /// Like [`search`](Self::search) with relative dates resolved against `now`.
    pub fn search_at(&self, input: &str, now: DateTime<Utc>) -> Result<DocumentQuery, SearchError> {
        let node = search_query::parse(input, Dialect::Document)?;
        Ok(compile_at(&node, &self.policy, now)?)
    }
}

pub fn compile(node: &Node, policy: &FieldPolicy) -> Result<DocumentQuery, ConfigurationError> {
    compile_at(node, policy, Utc::now())
}

pub fn compile_at(
    node: &Node,
    policy: &FieldPolicy,
    now: DateTime<Utc>,
) -> Result<DocumentQuery, ConfigurationError> {
    let compiler = Compiler { policy, now };
    compiler.node(node)
}

struct Compiler<'a> {
    policy: &'a FieldPolicy,
    now: DateTime<Utc>,
}

impl Compiler<'_> {
    fn node(&self, node: &Node) -> Result<DocumentQuery, ConfigurationError> {
        match node {
            Node::Leaf(leaf) => self.leaf(leaf),
            Node::And(children) => Ok(DocumentQuery::And(self.children(children)?)),
            Node::Or(children) => Ok(DocumentQuery::Or(self.children(children)?)),
        }
    }

    fn children(&self, children: &[Node]) -> Result<Vec<DocumentQuery>, ConfigurationError> {
        children.iter().map(|child| self.node(child)).collect()
    }

    fn leaf(&self, leaf: &Leaf) -> Result<DocumentQuery, ConfigurationError> {
        match leaf {
            Leaf::Keyed {
                field,
                op,
                value,
                negated,
            } => Ok(DocumentQuery::Field(FieldPredicate {
                field: field.clone(),
                condition: self.keyed_condition(field, *op, value),
                negated: *negated,
            })),
            Leaf::Bare { value, negated } => self.bare(value, *negated),
        }
    }

    fn keyed_condition(&self, field: &str, op: Operator, value: &Value) -> Condition {
        if value.is_null() {
            return Condition::Equals(Operand::Literal(serde_json::Value::Null));
        }

        // any non-null value on a date field is cast, numbers included
        let operand = if self.policy.is_date_field(field) {
            let text = value.text();
            let resolved = match value {
                Value::String(_) => dates::resolve(text, self.now).map(dates::to_iso),
                _ => None,
            };
            Operand::Date(resolved.unwrap_or_else(|| text.to_string()))
        } else if op == Operator::Default && self.policy.is_string_field(field) {
            return Condition::Matches(regex::escape(value.text()));
        } else {
            Operand::Literal(value.to_json())
        };

        match Comparison::from_operator(op) {
            Some(cmp) => Condition::Compare(cmp, operand),
            None => Condition::Equals(operand),
        }
    }

    /// One predicate per bare field: `$or` of them, or `$and` of their
    /// negations when the token is negated.
    fn bare(&self, value: &Value, negated: bool) -> Result<DocumentQuery, ConfigurationError> {
        let fields = self
            .policy
            .bare_fields()
            .ok_or_else(|| ConfigurationError::NoBareFields {
                token: value.text().to_string(),
            })?;

        let predicates = fields
            .iter()
            .map(|field| {
                let condition = if !value.is_null() && self.policy.is_string_field(field) {
                    Condition::Matches(regex::escape(value.text()))
                } else {
                    Condition::Equals(Operand::Literal(value.to_json()))
                };
                DocumentQuery::Field(FieldPredicate {
                    field: field.clone(),
                    condition,
                    negated,
                })
            })
            .collect();

        Ok(if negated {
            DocumentQuery::And(predicates)
        } else {
            DocumentQuery::Or(predicates)
        })
    }
}
