use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::ParseError;

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+(?:\.[0-9]+)?$").expect("number pattern is valid"));

/// Which backend the query is lexed for.
///
/// The document dialect reads a `-` at the start of a leaf as negation.
/// The relational dialect has no negation and additionally reserves `~`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Document,
    Relational,
}

impl Dialect {
    pub fn supports_negation(self) -> bool {
        matches!(self, Dialect::Document)
    }

    fn is_reserved(self, c: char) -> bool {
        match c {
            ' ' | '"' | ':' | '>' | '=' | '<' | '(' | ')' => true,
            '~' => matches!(self, Dialect::Relational),
            _ => false,
        }
    }
}

/// Non-negative decimal literal. Keeps its source text so output never
/// reformats what the user typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Number(String);

impl Number {
    pub fn parse(lexeme: &str) -> Option<Self> {
        NUMBER_RE
            .is_match(lexeme)
            .then(|| Number(lexeme.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_integer(&self) -> bool {
        !self.0.contains('.')
    }

    /// Integer when the literal has no fraction and fits, float otherwise.
    pub fn to_json(&self) -> serde_json::Value {
        if self.is_integer() {
            if let Ok(i) = self.0.parse::<i64>() {
                return serde_json::Value::from(i);
            }
        }
        self.0
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| serde_json::Value::String(self.0.clone()))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Number(Number),
    String(String),
    Null,
}

impl Value {
    /// Classify an unquoted run of characters.
    fn from_raw(raw: String) -> Self {
        if raw == "NULL" {
            return Value::Null;
        }
        match Number::parse(&raw) {
            Some(n) => Value::Number(n),
            None => Value::String(raw),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The value as the user wrote it, minus quoting.
    pub fn text(&self) -> &str {
        match self {
            Value::Number(n) => n.as_str(),
            Value::String(s) => s,
            Value::Null => "NULL",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Number(n) => n.to_json(),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Null => serde_json::Value::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    #[serde(rename = ":")]
    Default,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "=")]
    Eq,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Default => ":",
            Operator::Gte => ">=",
            Operator::Gt => ">",
            Operator::Lte => "<=",
            Operator::Lt => "<",
            Operator::Eq => "=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Value(Value),
    Op(Operator),
    /// Exactly one space: implicit AND.
    Space,
    /// The literal ` OR `.
    Or,
    /// Leaf negation, document dialect only.
    Minus,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Value(v) => write!(f, "value {:?}", v.text()),
            Token::Op(op) => write!(f, "operator '{op}'"),
            Token::Space => f.write_str("space"),
            Token::Or => f.write_str("' OR '"),
            Token::Minus => f.write_str("'-'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

pub fn tokenize(input: &str, dialect: Dialect) -> Result<Vec<Spanned>, ParseError> {
    let chars: Vec<char> = input.chars().collect();
    let len = chars.len();
    let mut tokens: Vec<Spanned> = Vec::new();
    let mut i = 0;

    while i < len {
        let position = i;
        let token = match chars[i] {
            ' ' => {
                if chars[i..].starts_with(&[' ', 'O', 'R', ' ']) {
                    i += 4;
                    Token::Or
                } else {
                    i += 1;
                    Token::Space
                }
            }
            '(' => {
                i += 1;
                Token::LParen
            }
            ')' => {
                i += 1;
                Token::RParen
            }
            ':' => {
                i += 1;
                Token::Op(Operator::Default)
            }
            '=' => {
                i += 1;
                Token::Op(Operator::Eq)
            }
            '>' | '<' => {
                let or_equal = chars.get(i + 1) == Some(&'=');
                let op = match (chars[i], or_equal) {
                    ('>', true) => Operator::Gte,
                    ('>', false) => Operator::Gt,
                    (_, true) => Operator::Lte,
                    (_, false) => Operator::Lt,
                };
                i += if or_equal { 2 } else { 1 };
                Token::Op(op)
            }
            '-' if dialect.supports_negation() && at_leaf_start(tokens.last()) => {
                i += 1;
                Token::Minus
            }
            '"' => Token::Value(read_quoted(&chars, &mut i, dialect)?),
            c => {
                let raw = read_raw(&chars, &mut i, dialect);
                if raw.is_empty() {
                    return Err(ParseError::Unexpected {
                        position,
                        found: format!("{c:?}"),
                        expected: "a value",
                    });
                }
                Token::Value(Value::from_raw(raw))
            }
        };
        tokens.push(Spanned { token, position });
    }

    Ok(tokens)
}

fn at_leaf_start(prev: Option<&Spanned>) -> bool {
    matches!(
        prev.map(|s| &s.token),
        None | Some(Token::Space) | Some(Token::Or) | Some(Token::LParen)
    )
}

/// `"` Value `"`, where the inner value may itself be quoted.
/// Quoted value. Quotes nest (`""a""` is `a`), so count the opening run and
/// require the same number of closing quotes after the inner raw value.
fn read_quoted(chars: &[char], i: &mut usize, dialect: Dialect) -> Result<Value, ParseError> {
    let start = *i;
    while chars.get(*i) == Some(&'"') {
        *i += 1;
    }
    let levels = *i - start;

    let inner = match chars.get(*i) {
        None => {
            return Err(ParseError::UnterminatedQuote {
                position: start + levels - 1,
            })
        }
        Some(&c) => {
            let raw = read_raw(chars, i, dialect);
            if raw.is_empty() {
                return Err(ParseError::Unexpected {
                    position: *i,
                    found: format!("{c:?}"),
                    expected: "a value",
                });
            }
            Value::from_raw(raw)
        }
    };

    // innermost quote closes first
    for level in (0..levels).rev() {
        match chars.get(*i) {
            Some('"') => *i += 1,
            None => {
                return Err(ParseError::UnterminatedQuote {
                    position: start + level,
                })
            }
            Some(&c) => {
                return Err(ParseError::Unexpected {
                    position: *i,
                    found: format!("{c:?}"),
                    expected: "closing quote",
                })
            }
        }
    }
    Ok(inner)
}

fn read_raw(chars: &[char], i: &mut usize, dialect: Dialect) -> String {
    let mut raw = String::new();
    while let Some(&c) = chars.get(*i) {
        if dialect.is_reserved(c) {
            break;
        }
        raw.push(c);
        *i += 1;
    }
    raw
}
