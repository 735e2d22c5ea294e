//! Express thresholds on query results.
//!
//! A threshold is a small boolean expression over the single bound variable
//! `value`, for example `value > 5` or `value >= 10 && value < 20`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::{CheckError, Classification};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpressionError {
    #[error("unexpected character {found:?} at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },
    #[error("unknown identifier {name:?} at offset {offset}, only `value` is bound")]
    UnknownIdentifier { name: String, offset: usize },
    #[error("invalid number {text:?} at offset {offset}")]
    InvalidNumber { text: String, offset: usize },
    #[error("expected {expected} at offset {offset}, found {found}")]
    Unexpected {
        expected: &'static str,
        found: String,
        offset: usize,
    },
    #[error("expected {expected}, found end of expression")]
    UnexpectedEnd { expected: &'static str },
    #[error("parentheses nested more than {} deep at offset {offset}", MAX_DEPTH)]
    TooDeep { offset: usize },
    #[error("more than {} `&&`/`||` operators, at offset {offset}", MAX_OPERATORS)]
    TooLong { offset: usize },
}

/// Limits that keep parsing, evaluation and drop within a small stack.
pub const MAX_DEPTH: usize = 64;
pub const MAX_OPERATORS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CompareOp {
    /// NaN on either side makes every operator false, `!=` included.
    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        let Some(ord) = lhs.partial_cmp(&rhs) else {
            return false;
        };
        match self {
            Self::Lt => ord == Ordering::Less,
            Self::Le => ord != Ordering::Greater,
            Self::Gt => ord == Ordering::Greater,
            Self::Ge => ord != Ordering::Less,
            Self::Eq => ord == Ordering::Equal,
            Self::Ne => ord != Ordering::Equal,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
        })
    }
}

/// A numeric leaf of an expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    Literal(f64),
    /// The bound `value`.
    Variable,
}

impl Operand {
    fn resolve(self, value: f64) -> f64 {
        match self {
            Self::Literal(n) => n,
            Self::Variable => value,
        }
    }
}

/// Parsed threshold expression. Always reduces to a boolean.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Comparison {
        op: CompareOp,
        lhs: Operand,
        rhs: Operand,
    },
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
}

impl Expression {
    pub fn parse(src: &str) -> Result<Self, ExpressionError> {
        let tokens = tokenize(src)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
            operators: 0,
        };
        let expr = parser.parse_or()?;
        match parser.tokens.get(parser.pos) {
            None => Ok(expr),
            Some(t) => Err(ExpressionError::Unexpected {
                expected: "`&&`, `||` or end of expression",
                found: t.token.to_string(),
                offset: t.offset,
            }),
        }
    }

    pub fn evaluate(&self, value: f64) -> bool {
        match self {
            Self::Comparison { op, lhs, rhs } => op.holds(lhs.resolve(value), rhs.resolve(value)),
            Self::And(l, r) => l.evaluate(value) && r.evaluate(value),
            Self::Or(l, r) => l.evaluate(value) || r.evaluate(value),
        }
    }
}

impl FromStr for Expression {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Value,
    And,
    Or,
    Compare(CompareOp),
    Minus,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "number {n}"),
            Self::Value => f.write_str("`value`"),
            Self::And => f.write_str("`&&`"),
            Self::Or => f.write_str("`||`"),
            Self::Compare(op) => write!(f, "`{op}`"),
            Self::Minus => f.write_str("`-`"),
            Self::LParen => f.write_str("`(`"),
            Self::RParen => f.write_str("`)`"),
        }
    }
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    offset: usize,
}

fn tokenize(src: &str) -> Result<Vec<Spanned>, ExpressionError> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let offset = i;
        let two = bytes.get(i + 1).copied();

        let (token, len) = match c {
            b' ' | b'\t' | b'\n' | b'\r' => {
                i += 1;
                continue;
            }
            b'0'..=b'9' | b'.' => {
                let len = number_len(&bytes[i..]);
                let text = &src[i..i + len];
                let n = text
                    .parse::<f64>()
                    .map_err(|_| ExpressionError::InvalidNumber {
                        text: text.to_owned(),
                        offset,
                    })?;
                (Token::Number(n), len)
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                let len = bytes[i..]
                    .iter()
                    .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
                    .count();
                let word = &src[i..i + len];
                let token = match word.to_ascii_lowercase().as_str() {
                    "value" => Token::Value,
                    "and" => Token::And,
                    "or" => Token::Or,
                    _ => {
                        return Err(ExpressionError::UnknownIdentifier {
                            name: word.to_owned(),
                            offset,
                        })
                    }
                };
                (token, len)
            }
            b'&' if two == Some(b'&') => (Token::And, 2),
            b'|' if two == Some(b'|') => (Token::Or, 2),
            b'<' if two == Some(b'=') => (Token::Compare(CompareOp::Le), 2),
            b'<' if two == Some(b'>') => (Token::Compare(CompareOp::Ne), 2),
            b'<' => (Token::Compare(CompareOp::Lt), 1),
            b'>' if two == Some(b'=') => (Token::Compare(CompareOp::Ge), 2),
            b'>' => (Token::Compare(CompareOp::Gt), 1),
            b'=' if two == Some(b'=') => (Token::Compare(CompareOp::Eq), 2),
            b'=' => (Token::Compare(CompareOp::Eq), 1),
            b'!' if two == Some(b'=') => (Token::Compare(CompareOp::Ne), 2),
            b'-' => (Token::Minus, 1),
            b'(' => (Token::LParen, 1),
            b')' => (Token::RParen, 1),
            _ => {
                let found = src[i..].chars().next().unwrap_or('\u{fffd}');
                return Err(ExpressionError::UnexpectedChar { found, offset });
            }
        };

        tokens.push(Spanned { token, offset });
        i += len;
    }

    Ok(tokens)
}

/// Length of the numeric literal at the start of `bytes`: digits, an optional
/// fraction and an optional exponent. Stray dots are left for `parse` to reject.
fn number_len(bytes: &[u8]) -> usize {
    let digits = |from: usize| {
        bytes[from..]
            .iter()
            .take_while(|b| b.is_ascii_digit() || **b == b'.')
            .count()
    };

    let mut len = digits(0);
    if matches!(bytes.get(len), Some(b'e' | b'E')) {
        let mut exp = len + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = bytes[exp.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if exp_digits > 0 {
            len = exp + exp_digits;
        }
    }
    len
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
    operators: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn next(&mut self, expected: &'static str) -> Result<Spanned, ExpressionError> {
        let t = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(ExpressionError::UnexpectedEnd { expected })?;
        self.pos += 1;
        Ok(t)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Count one `&&`/`||` just consumed.
    fn count_operator(&mut self) -> Result<(), ExpressionError> {
        self.operators += 1;
        if self.operators > MAX_OPERATORS {
            return Err(ExpressionError::TooLong {
                offset: self.tokens[self.pos - 1].offset,
            });
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Expression, ExpressionError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::Or) {
            self.count_operator()?;
            let rhs = self.parse_and()?;
            lhs = Expression::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expression, ExpressionError> {
        let mut lhs = self.parse_term()?;
        while self.eat(&Token::And) {
            self.count_operator()?;
            let rhs = self.parse_term()?;
            lhs = Expression::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expression, ExpressionError> {
        if self.eat(&Token::LParen) {
            self.depth += 1;
            if self.depth > MAX_DEPTH {
                return Err(ExpressionError::TooDeep {
                    offset: self.tokens[self.pos - 1].offset,
                });
            }
            let inner = self.parse_or()?;
            self.depth -= 1;
            let close = self.next("`)`")?;
            if close.token != Token::RParen {
                return Err(ExpressionError::Unexpected {
                    expected: "`)`",
                    found: close.token.to_string(),
                    offset: close.offset,
                });
            }
            return Ok(inner);
        }

        let lhs = self.parse_operand()?;
        let op = match self.next("a comparison operator")? {
            Spanned {
                token: Token::Compare(op),
                ..
            } => op,
            Spanned { token, offset } => {
                return Err(ExpressionError::Unexpected {
                    expected: "a comparison operator",
                    found: token.to_string(),
                    offset,
                })
            }
        };
        let rhs = self.parse_operand()?;
        Ok(Expression::Comparison { op, lhs, rhs })
    }

    fn parse_operand(&mut self) -> Result<Operand, ExpressionError> {
        const EXPECTED: &str = "a number or `value`";
        match self.next(EXPECTED)? {
            Spanned {
                token: Token::Number(n),
                ..
            } => Ok(Operand::Literal(n)),
            Spanned {
                token: Token::Value,
                ..
            } => Ok(Operand::Variable),
            Spanned {
                token: Token::Minus,
                ..
            } => match self.next("a number")? {
                Spanned {
                    token: Token::Number(n),
                    ..
                } => Ok(Operand::Literal(-n)),
                Spanned { token, offset } => Err(ExpressionError::Unexpected {
                    expected: "a number",
                    found: token.to_string(),
                    offset,
                }),
            },
            Spanned { token, offset } => Err(ExpressionError::Unexpected {
                expected: EXPECTED,
                found: token.to_string(),
                offset,
            }),
        }
    }
}

/// One threshold level. An absent or blank expression never fires.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Threshold(Option<Expression>);

impl Threshold {
    pub fn parse(src: Option<&str>) -> Result<Self, ExpressionError> {
        match src.map(str::trim) {
            None | Some("") => Ok(Self(None)),
            Some(s) => s.parse::<Expression>().map(|e| Self(Some(e))),
        }
    }

    pub fn is_met(&self, value: f64) -> bool {
        self.0.as_ref().is_some_and(|e| e.evaluate(value))
    }
}

/// The warning and critical pair of a check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Thresholds {
    pub warning: Threshold,
    pub critical: Threshold,
}

impl Thresholds {
    pub fn parse(warning: Option<&str>, critical: Option<&str>) -> Result<Self, CheckError> {
        fn level(name: &'static str, src: Option<&str>) -> Result<Threshold, CheckError> {
            Threshold::parse(src).map_err(|source| CheckError::ExpressionSyntax {
                level: name,
                expression: src.unwrap_or_default().to_owned(),
                source,
            })
        }

        Ok(Self {
            critical: level("critical", critical)?,
            warning: level("warning", warning)?,
        })
    }

    /// Critical is checked first and wins outright.
    pub fn classify(&self, value: f64) -> Classification {
        if self.critical.is_met(value) {
            Classification::Critical
        } else if self.warning.is_met(value) {
            Classification::Warning
        } else {
            Classification::Ok
        }
    }
}

/// Classify `value` against raw expression strings. A malformed expression
/// yields `Unknown`, never `Ok`.
pub fn classify(value: f64, warning: &str, critical: &str) -> Classification {
    match Thresholds::parse(Some(warning), Some(critical)) {
        Ok(t) => t.classify(value),
        Err(e) => {
            tracing::warn!(error = %e, "rejecting threshold expression");
            Classification::Unknown
        }
    }
}
