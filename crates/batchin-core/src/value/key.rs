use crate::value::Value;
use time::Date;

// Integral floats inside this range compare equal to the matching integer.
const F64_I128_BOUND: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0; // 2^127

///
/// ValueKey
///
/// Canonical, hashable identity of a non-null value.
///
/// Two values share a key exactly when a database would treat them as the
/// same membership candidate: numeric variants unify (`1`, `1u`, `1.0`),
/// `-0.0` folds into `0`, timestamps compare by instant, and JSON compares
/// by its canonical (key-sorted) serialization.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) enum ValueKey {
    Bool(bool),
    Date(Date),
    Float(u64),
    Int(i128),
    Json(String),
    Text(String),
    Timestamp(i128),
}

impl ValueKey {
    pub(crate) fn of(value: &Value) -> Option<Self> {
        let key = match value {
            Value::Bool(v) => Self::Bool(*v),
            Value::Date(v) => Self::Date(*v),
            Value::Float(v) => Self::float(*v),
            Value::Int(v) => Self::Int(i128::from(*v)),
            Value::Json(v) => Self::Json(v.to_string()),
            Value::Null => return None,
            Value::Text(v) => Self::Text(v.clone()),
            Value::Timestamp(v) => Self::Timestamp(v.unix_timestamp_nanos()),
            Value::Uint(v) => Self::Int(i128::from(*v)),
        };

        Some(key)
    }

    #[expect(clippy::cast_possible_truncation)]
    fn float(v: f64) -> Self {
        if v.is_finite() && v.fract() == 0.0 && (-F64_I128_BOUND..F64_I128_BOUND).contains(&v) {
            // integral and in range, so the cast is exact
            Self::Int(v as i128)
        } else {
            Self::Float(v.to_bits())
        }
    }
}
