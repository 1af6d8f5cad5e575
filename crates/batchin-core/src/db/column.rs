use crate::value::{Value, ValueKind};
use derive_more::Display;

///
/// ColumnType
///
/// SQL type of a target column. Staging tables declare their single column
/// with the dialect rendering of this type.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ColumnType {
    BigInt,
    Boolean,
    Date,
    Double,
    Integer,
    Json,
    SmallInt,
    Text,
    Timestamp,
    TimestampTz,
}

impl ColumnType {
    #[must_use]
    pub const fn kind(self) -> ValueKind {
        match self {
            Self::BigInt | Self::Double | Self::Integer | Self::SmallInt => ValueKind::Numeric,
            Self::Boolean => ValueKind::Boolean,
            Self::Date | Self::Timestamp | Self::TimestampTz => ValueKind::Temporal,
            Self::Json => ValueKind::Json,
            Self::Text => ValueKind::Text,
        }
    }

    /// Whether a value of `kind` can be compared against this column.
    #[must_use]
    pub fn accepts(self, kind: ValueKind) -> bool {
        self.kind() == kind
    }

    /// Whether `value` is stored unchanged by a column of this type.
    ///
    /// Staged values are cast to the column type, literal lists are not;
    /// a value the cast would alter is not admitted.
    #[must_use]
    pub fn admits(self, value: &Value) -> bool {
        match self {
            Self::SmallInt => integral_within(value, i16::MIN.into(), i16::MAX.into()),
            Self::Integer => integral_within(value, i32::MIN.into(), i32::MAX.into()),
            Self::BigInt => integral_within(value, i64::MIN.into(), i64::MAX.into()),
            Self::Double => match *value {
                Value::Float(_) => true,
                Value::Int(v) => v.unsigned_abs() <= F64_EXACT_INT,
                Value::Uint(v) => v <= F64_EXACT_INT,
                _ => false,
            },
            Self::Date => matches!(value, Value::Date(_)),
            Self::Timestamp | Self::TimestampTz => matches!(value, Value::Timestamp(_)),
            Self::Boolean | Self::Json | Self::Text => self.accepts(value.kind()),
        }
    }
}

// Largest magnitude below which every integer has an exact f64 (2^53).
const F64_EXACT_INT: u64 = 1 << 53;

// Integral numerics inside `min..=max`; integral floats count.
#[expect(clippy::cast_possible_truncation)]
fn integral_within(value: &Value, min: i128, max: i128) -> bool {
    let v = match *value {
        Value::Int(v) => i128::from(v),
        Value::Uint(v) => i128::from(v),
        // |f| <= 1e19 keeps the cast exact; larger values are out of range anyway
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() <= 1e19 => f as i128,
        _ => return false,
    };

    (min..=max).contains(&v)
}

///
/// Column
///
/// Table-qualified column reference consumed by the optimizer.
///

#[derive(Clone, Debug, Display, Eq, Hash, PartialEq)]
#[display("{table}.{name}")]
pub struct Column {
    table: String,
    name: String,
    ty: ColumnType,
}

impl Column {
    #[must_use]
    pub fn new(table: impl Into<String>, name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            ty,
        }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn ty(&self) -> ColumnType {
        self.ty
    }
}
