use serde::Serialize;

use super::lexer::{Operator, Spanned, Token, Value};
use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Leaf {
    /// A value with no field key; expanded through the field policy.
    Bare {
        value: Value,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        negated: bool,
    },
    Keyed {
        field: String,
        op: Operator,
        value: Value,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        negated: bool,
    },
}

impl Leaf {
    pub fn is_negated(&self) -> bool {
        match self {
            Leaf::Bare { negated, .. } | Leaf::Keyed { negated, .. } => *negated,
        }
    }
}

/// Parsed query. `And`/`Or` always hold at least two children.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Node {
    And(Vec<Node>),
    Or(Vec<Node>),
    #[serde(untagged)]
    Leaf(Leaf),
}

impl Node {
    fn and(mut children: Vec<Node>) -> Node {
        if children.len() == 1 {
            children.remove(0)
        } else {
            Node::And(children)
        }
    }

    fn or(mut children: Vec<Node>) -> Node {
        if children.len() == 1 {
            children.remove(0)
        } else {
            Node::Or(children)
        }
    }

    /// Number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::And(children) | Node::Or(children) => {
                children.iter().map(Node::leaf_count).sum()
            }
        }
    }
}

/// Deepest group nesting accepted; deeper input fails with
/// [`ParseError::TooDeep`] instead of exhausting the stack.
pub const MAX_DEPTH: usize = 128;

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Spanned>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// disjunction = conjunction (" OR " conjunction)*
    fn parse_disjunction(&mut self) -> Result<Node, ParseError> {
        let mut children = vec![self.parse_conjunction()?];
        while matches!(self.peek(), Some(Token::Or)) {
            self.advance();
            children.push(self.parse_conjunction()?);
        }
        Ok(Node::or(children))
    }

    /// conjunction = atom (" " atom)*
    fn parse_conjunction(&mut self) -> Result<Node, ParseError> {
        let mut children = vec![self.parse_atom()?];
        while matches!(self.peek(), Some(Token::Space)) {
            self.advance();
            children.push(self.parse_atom()?);
        }
        Ok(Node::and(children))
    }

    /// atom = "(" disjunction ")" | leaf
    fn parse_atom(&mut self) -> Result<Node, ParseError> {
        if !matches!(self.peek(), Some(Token::LParen)) {
            return self.parse_leaf().map(Node::Leaf);
        }

        let open = self.advance().map(|s| s.position).unwrap_or_default();
        if self.depth == MAX_DEPTH {
            return Err(ParseError::TooDeep { position: open });
        }
        self.depth += 1;
        let inner = self.parse_disjunction()?;
        self.depth -= 1;
        match self.advance() {
            Some(Spanned {
                token: Token::RParen,
                ..
            }) => Ok(inner),
            Some(Spanned { token, position }) => Err(ParseError::Unexpected {
                position,
                found: token.to_string(),
                expected: "')'",
            }),
            None => Err(ParseError::UnclosedGroup { position: open }),
        }
    }

    /// leaf = ["-"] (value op value | value)
    fn parse_leaf(&mut self) -> Result<Leaf, ParseError> {
        let negated = matches!(self.peek(), Some(Token::Minus));
        if negated {
            self.advance();
        }

        let first = self.expect_value()?;
        let op = match self.peek() {
            Some(Token::Op(op)) => *op,
            _ => {
                return Ok(Leaf::Bare {
                    value: first,
                    negated,
                })
            }
        };
        self.advance();

        let value = self.expect_value()?;
        Ok(Leaf::Keyed {
            field: first.text().to_string(),
            op,
            value,
            negated,
        })
    }

    fn expect_value(&mut self) -> Result<Value, ParseError> {
        match self.advance() {
            Some(Spanned {
                token: Token::Value(v),
                ..
            }) => Ok(v),
            Some(Spanned { token, position }) => Err(ParseError::Unexpected {
                position,
                found: token.to_string(),
                expected: "a value",
            }),
            None => Err(ParseError::UnexpectedEnd {
                expected: "a value",
            }),
        }
    }
}

/// Parse a token stream into a [`Node`]. The whole stream must be consumed.
pub fn parse(tokens: Vec<Spanned>) -> Result<Node, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    let mut parser = Parser::new(tokens);
    let node = parser.parse_disjunction()?;
    if let Some(Spanned { token, position }) = parser.advance() {
        return Err(ParseError::TrailingInput {
            position,
            found: token.to_string(),
        });
    }
    Ok(node)
}
