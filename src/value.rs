//! Wire values, the dynamic argument currency of the dispatcher.
//!
//! Bound arguments and operation results travel through the pipeline as
//! `SoapValue`s so that parameter inspectors can observe a uniform array
//! without knowing the operation's concrete signature. Parsing and
//! formatting follow XSD lexical rules for the primitive types the text
//! encoder supports.

use std::error::Error;
use std::fmt;

/// A single argument or return value crossing the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum SoapValue {
    /// No value (one-way returns, absent parameters with no default).
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Text(String),
}

impl SoapValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SoapValue::Null)
    }

    /// Numeric view: `Int` widens to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SoapValue::Double(v) => Some(*v),
            SoapValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SoapValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SoapValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SoapValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// The XSD text form of this value, or `None` for `Null` (rendered as
    /// an empty element by the body writer).
    pub fn xml_text(&self) -> Option<String> {
        match self {
            SoapValue::Null => None,
            SoapValue::Bool(v) => Some(if *v { "true".into() } else { "false".into() }),
            SoapValue::Int(v) => Some(v.to_string()),
            SoapValue::Double(v) => Some(format_double(*v)),
            SoapValue::Text(v) => Some(v.clone()),
        }
    }
}

impl From<bool> for SoapValue {
    fn from(v: bool) -> Self {
        SoapValue::Bool(v)
    }
}

impl From<i64> for SoapValue {
    fn from(v: i64) -> Self {
        SoapValue::Int(v)
    }
}

impl From<f64> for SoapValue {
    fn from(v: f64) -> Self {
        SoapValue::Double(v)
    }
}

impl From<String> for SoapValue {
    fn from(v: String) -> Self {
        SoapValue::Text(v)
    }
}

impl From<&str> for SoapValue {
    fn from(v: &str) -> Self {
        SoapValue::Text(v.to_string())
    }
}

/// The declared type of a contract parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapKind {
    Double,
    Int,
    Bool,
    Str,
}

impl SoapKind {
    /// XSD-ish name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            SoapKind::Double => "double",
            SoapKind::Int => "int",
            SoapKind::Bool => "boolean",
            SoapKind::Str => "string",
        }
    }

    /// The "absent" value a parameter slot takes when its element never
    /// arrives and no explicit default was declared.
    pub fn absent(self) -> SoapValue {
        match self {
            SoapKind::Double => SoapValue::Double(0.0),
            SoapKind::Int => SoapValue::Int(0),
            SoapKind::Bool => SoapValue::Bool(false),
            SoapKind::Str => SoapValue::Text(String::new()),
        }
    }

    /// Parse element text into a value of this kind, XSD lexical rules.
    pub fn parse(self, text: &str) -> Result<SoapValue, ValueParseError> {
        let trimmed = text.trim();
        match self {
            SoapKind::Double => parse_double(trimmed)
                .map(SoapValue::Double)
                .ok_or_else(|| self.error(text)),
            SoapKind::Int => trimmed
                .parse::<i64>()
                .map(SoapValue::Int)
                .map_err(|_| self.error(text)),
            SoapKind::Bool => match trimmed {
                "true" | "1" => Ok(SoapValue::Bool(true)),
                "false" | "0" => Ok(SoapValue::Bool(false)),
                _ => Err(self.error(text)),
            },
            // Strings are taken verbatim, untrimmed.
            SoapKind::Str => Ok(SoapValue::Text(text.to_string())),
        }
    }

    fn error(self, text: &str) -> ValueParseError {
        ValueParseError {
            kind: self,
            text: text.to_string(),
        }
    }
}

/// Format a double the way XSD expects it (`INF`, `-INF`, `NaN` for the
/// non-finite values).
pub fn format_double(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "INF".to_string()
    } else if value == f64::NEG_INFINITY {
        "-INF".to_string()
    } else {
        value.to_string()
    }
}

/// Parse an XSD double, accepting the spelled non-finite forms.
pub fn parse_double(text: &str) -> Option<f64> {
    match text {
        "INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        other => other.parse::<f64>().ok(),
    }
}

/// Element text that does not parse as the declared parameter kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueParseError {
    kind: SoapKind,
    text: String,
}

impl ValueParseError {
    pub fn kind(&self) -> SoapKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for ValueParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot parse {:?} as {}", self.text, self.kind.name())
    }
}

impl Error for ValueParseError {}
