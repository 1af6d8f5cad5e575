mod key;


use derive_more::Display;
use std::fmt;
use time::{Date, OffsetDateTime, format_description::well_known::Rfc3339};

// re-exports
pub(crate) use key::ValueKey;

///
/// ValueKind
///
/// Closed set of value families. Column types and values are matched on
/// kind, never on concrete variant.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ValueKind {
    #[display("boolean")]
    Boolean,

    #[display("json")]
    Json,

    #[display("null")]
    Null,

    #[display("numeric")]
    Numeric,

    #[display("temporal")]
    Temporal,

    #[display("text")]
    Text,
}

///
/// Value
///
/// A single candidate in a membership list. Values are bound as statement
/// parameters; the `Display` rendering is a SQL literal used for diagnostics.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Date(Date),
    Float(f64),
    Int(i64),
    Json(serde_json::Value),
    Null,
    Text(String),
    Timestamp(OffsetDateTime),
    Uint(u64),
}

impl Value {
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Boolean,
            Self::Date(_) | Self::Timestamp(_) => ValueKind::Temporal,
            Self::Float(_) | Self::Int(_) | Self::Uint(_) => ValueKind::Numeric,
            Self::Json(_) => ValueKind::Json,
            Self::Null => ValueKind::Null,
            Self::Text(_) => ValueKind::Text,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Canonical identity used for deduplication; `None` for NULL.
    pub(crate) fn key(&self) -> Option<ValueKey> {
        ValueKey::of(self)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => f.write_str(if *v { "TRUE" } else { "FALSE" }),
            Self::Date(v) => write!(f, "'{v}'"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Json(v) => write_quoted(f, &v.to_string()),
            Self::Null => f.write_str("NULL"),
            Self::Text(v) => write_quoted(f, v),
            Self::Timestamp(v) => {
                let formatted = v.format(&Rfc3339).map_err(|_| fmt::Error)?;
                write_quoted(f, &formatted)
            }
            Self::Uint(v) => write!(f, "{v}"),
        }
    }
}

// Single-quoted SQL string literal with embedded quotes doubled.
fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "'{}'", s.replace('\'', "''"))
}

///
/// Conversions
///

macro_rules! impl_from_signed {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Self::Int(i64::from(v))
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Self::Uint(u64::from(v))
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Date> for Value {
    fn from(v: Date) -> Self {
        Self::Date(v)
    }
}

impl From<OffsetDateTime> for Value {
    fn from(v: OffsetDateTime) -> Self {
        Self::Timestamp(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
