//! Conversion between raw store payloads and the typed scalars declared on a model.
//!
//! The store only ever holds text payloads. A field is declared with a [`ScalarKind`], which
//! decides how the payload is read back: text is taken verbatim (lossy UTF-8), integers parse
//! their leading numeric characters and fall back to zero. A missing payload is not the same
//! as an empty one, only the former resolves to the declared default.

use crate::AttrError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Text,
    Integer,
}

impl ScalarKind {
    pub fn zero(&self) -> Scalar {
        match self {
            ScalarKind::Text => Scalar::Text(String::new()),
            ScalarKind::Integer => Scalar::Integer(0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Text => "text",
            ScalarKind::Integer => "integer",
        }
    }
}

impl FromStr for ScalarKind {
    type Err = AttrError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "string" | "text" => Ok(ScalarKind::Text),
            "integer" | "int" => Ok(ScalarKind::Integer),
            other => Err(AttrError::config(format!("type `{}` not supported, only `string` and `integer` are", other))),
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Integer(i64),
    Text(String),
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Text(_) => ScalarKind::Text,
            Scalar::Integer(_) => ScalarKind::Integer,
        }
    }

    /// Idempotent: coercing a value that already has `kind` returns it unchanged.
    pub fn coerce(self, kind: ScalarKind) -> Scalar {
        match (self, kind) {
            (Scalar::Text(s), ScalarKind::Integer) => Scalar::Integer(parse_leading_integer(&s)),
            (Scalar::Integer(i), ScalarKind::Text) => Scalar::Text(i.to_string()),
            (same, _) => same,
        }
    }

    pub fn into_text(self) -> String {
        match self.coerce(ScalarKind::Text) {
            Scalar::Text(s) => s,
            Scalar::Integer(i) => i.to_string(),
        }
    }

    pub fn into_integer(self) -> i64 {
        match self.coerce(ScalarKind::Integer) {
            Scalar::Integer(i) => i,
            Scalar::Text(s) => parse_leading_integer(&s),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => f.write_str(s),
            Scalar::Integer(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<&String> for Scalar {
    fn from(value: &String) -> Self {
        Scalar::Text(value.clone())
    }
}

macro_rules! scalar_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Scalar {
                fn from(value: $t) -> Self {
                    Scalar::Integer(i64::from(value))
                }
            }
        )*
    };
}

scalar_from_int!(i8, i16, i32, i64, u8, u16, u32);

/// Decodes a payload fetched for a field of `kind`; `None` means the key was absent.
pub fn decode(raw: Option<&[u8]>, kind: ScalarKind, default: Option<&Scalar>) -> Scalar {
    match raw {
        Some(bytes) => Scalar::Text(String::from_utf8_lossy(bytes).into_owned()).coerce(kind),
        None => match default {
            Some(value) => value.clone().coerce(kind),
            None => kind.zero(),
        },
    }
}

pub fn encode(value: &Scalar) -> Vec<u8> {
    value.to_string().into_bytes()
}

/// Reads an optional sign and the digits that follow leading whitespace, ignoring the rest.
/// Single underscores between digits are skipped, out of range values saturate.
pub fn parse_leading_integer(text: &str) -> i64 {
    let mut chars = text.trim_start().chars().peekable();
    let negative = match chars.peek() {
        Some('-') => { chars.next(); true }
        Some('+') => { chars.next(); false }
        _ => false,
    };
    let mut acc: i64 = 0;
    let mut prev_digit = false;
    while let Some(&c) = chars.peek() {
        if let Some(d) = c.to_digit(10) {
            let d = i64::from(d);
            acc = if negative { acc.saturating_mul(10).saturating_sub(d) } else { acc.saturating_mul(10).saturating_add(d) };
            prev_digit = true;
            chars.next();
        } else if c == '_' && prev_digit {
            chars.next();
            if !chars.peek().is_some_and(|n| n.is_ascii_digit()) {
                break;
            }
            prev_digit = false;
        } else {
            break;
        }
    }
    acc
}

/// A Rust type that can back a declared field.
///
/// `String` and `i64` are provided. Other types plug in by mapping themselves onto one of the
/// two stored kinds; `from_scalar` always receives a value already coerced to `KIND`.
pub trait AttrValue: Clone + PartialEq + fmt::Debug + Send + 'static {
    const KIND: ScalarKind;

    fn from_scalar(value: Scalar) -> Self;

    fn to_scalar(&self) -> Scalar;

    fn typecast(value: Scalar) -> Self {
        Self::from_scalar(value.coerce(Self::KIND))
    }
}

impl AttrValue for String {
    const KIND: ScalarKind = ScalarKind::Text;

    fn from_scalar(value: Scalar) -> Self {
        value.into_text()
    }

    fn to_scalar(&self) -> Scalar {
        Scalar::Text(self.clone())
    }
}

impl AttrValue for i64 {
    const KIND: ScalarKind = ScalarKind::Integer;

    fn from_scalar(value: Scalar) -> Self {
        value.into_integer()
    }

    fn to_scalar(&self) -> Scalar {
        Scalar::Integer(*self)
    }
}
