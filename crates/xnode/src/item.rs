//! Items and the generic value comparison nodes take part in.
//!
//! Rules for `value_eq` / `value_diff`:
//! - a Boolean operand compares effective boolean values (any node is `true`)
//! - otherwise a numeric operand coerces both sides to `xs:double`; a node
//!   contributes its string value, which must be a valid number
//! - otherwise both sides compare as strings, by code point
use core::cmp::Ordering;
use core::fmt;
use std::sync::Arc;

use crate::error::{Error, ErrorCode};
use crate::model::XdmNode;

#[derive(Debug, Clone)]
pub enum Item<N> {
    Node(N),
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
}

impl<N: XdmNode> Item<N> {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Item::Integer(_) | Item::Double(_))
    }

    pub fn as_node(&self) -> Option<&N> {
        match self {
            Item::Node(n) => Some(n),
            _ => None,
        }
    }

    /// Effective boolean value.
    pub fn boolean(&self) -> bool {
        match self {
            Item::Node(_) => true,
            Item::Boolean(b) => *b,
            Item::Integer(i) => *i != 0,
            Item::Double(d) => *d != 0.0 && !d.is_nan(),
            Item::String(s) => !s.is_empty(),
        }
    }

    pub fn string(&self) -> String {
        match self {
            Item::Node(n) => n.string_value(),
            Item::Boolean(b) => b.to_string(),
            Item::Integer(i) => i.to_string(),
            Item::Double(d) => format_double(*d),
            Item::String(s) => s.clone(),
        }
    }

    pub fn to_double(&self) -> Result<f64, Error> {
        match self {
            Item::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            #[allow(clippy::cast_precision_loss)]
            Item::Integer(i) => Ok(*i as f64),
            Item::Double(d) => Ok(*d),
            Item::Node(n) => parse_double(&n.string_value()),
            Item::String(s) => parse_double(s),
        }
    }

    pub fn to_integer(&self) -> Result<i64, Error> {
        match self {
            Item::Boolean(b) => Ok(i64::from(*b)),
            Item::Integer(i) => Ok(*i),
            Item::Double(d) => double_to_integer(*d),
            Item::Node(n) => parse_integer(&n.string_value()),
            Item::String(s) => parse_integer(s),
        }
    }

    pub fn value_eq(&self, other: &Self) -> Result<bool, Error> {
        if matches!(self, Item::Boolean(_)) || matches!(other, Item::Boolean(_)) {
            return Ok(self.boolean() == other.boolean());
        }
        if self.is_numeric() || other.is_numeric() {
            return Ok(self.to_double()? == other.to_double()?);
        }
        Ok(self.string() == other.string())
    }

    pub fn value_diff(&self, other: &Self) -> Result<Ordering, Error> {
        if matches!(self, Item::Boolean(_)) || matches!(other, Item::Boolean(_)) {
            return Ok(self.boolean().cmp(&other.boolean()));
        }
        if self.is_numeric() || other.is_numeric() {
            let (a, b) = (self.to_double()?, other.to_double()?);
            return a.partial_cmp(&b).ok_or_else(|| {
                Error::from_code(ErrorCode::XPTY0004, "NaN has no order")
            });
        }
        Ok(self.string().cmp(&other.string()))
    }
}

impl<N: XdmNode> fmt::Display for Item<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Node(n) => write!(f, "<{:?} node {}>", n.kind(), n.id().0),
            other => f.write_str(&other.string()),
        }
    }
}

fn format_double(d: f64) -> String {
    if d.is_nan() {
        "NaN".to_string()
    } else if d.is_infinite() {
        let s = if d > 0.0 { "INF" } else { "-INF" };
        s.to_string()
    } else {
        d.to_string()
    }
}

fn invalid(kind: &str, lexical: &str) -> Error {
    Error::from_code(
        ErrorCode::FORG0001,
        format!("'{lexical}' is not a valid {kind}"),
    )
}

/// `xs:double` lexical space: optional sign, digits, fraction, exponent,
/// plus `INF`, `-INF` and `NaN`. Surrounding whitespace is ignored.
pub fn parse_double(lexical: &str) -> Result<f64, Error> {
    let s = lexical.trim();
    match s {
        "INF" | "+INF" => return Ok(f64::INFINITY),
        "-INF" => return Ok(f64::NEG_INFINITY),
        "NaN" => return Ok(f64::NAN),
        _ => {}
    }
    let well_formed = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        && s.chars().any(|c| c.is_ascii_digit());
    if !well_formed {
        return Err(invalid("double", lexical));
    }
    s.parse::<f64>().map_err(|e| {
        invalid("double", lexical).with_source(Some(Arc::new(e) as Arc<dyn std::error::Error + Send + Sync>))
    })
}

pub fn parse_integer(lexical: &str) -> Result<i64, Error> {
    let s = lexical.trim();
    s.parse::<i64>().map_err(|e| {
        invalid("integer", lexical).with_source(Some(Arc::new(e) as Arc<dyn std::error::Error + Send + Sync>))
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn double_to_integer(d: f64) -> Result<i64, Error> {
    if !d.is_finite() || d.trunc() < i64::MIN as f64 || d.trunc() >= i64::MAX as f64 {
        return Err(Error::from_code(
            ErrorCode::FORG0001,
            format!("{} cannot be cast to an integer", format_double(d)),
        ));
    }
    Ok(d.trunc() as i64)
}
