use crate::{
    db::column::Column,
    error::ValueSetError,
    value::{Value, ValueKey},
};
use std::collections::HashSet;

///
/// ValueSet
///
/// Validated, deduplicated membership candidates in first-occurrence order.
/// Order does not affect results but keeps chunking deterministic.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueSet {
    values: Vec<Value>,
}

impl ValueSet {
    /// Validate `values` against `column` and drop semantic duplicates.
    pub fn normalize(
        column: &Column,
        values: impl IntoIterator<Item = Value>,
    ) -> Result<Self, ValueSetError> {
        let iter = values.into_iter();
        let mut seen = HashSet::with_capacity(iter.size_hint().0);
        let mut out = Vec::with_capacity(iter.size_hint().0);

        for (index, value) in iter.enumerate() {
            let key = check(column, index, &value)?;
            if seen.insert(key) {
                out.push(value);
            }
        }

        Ok(Self { values: out })
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Value> {
        self.values
    }
}

fn check(column: &Column, index: usize, value: &Value) -> Result<ValueKey, ValueSetError> {
    if let Value::Float(f) = value
        && f.is_nan()
    {
        return Err(ValueSetError::NotANumber { index });
    }

    let Some(key) = value.key() else {
        return Err(ValueSetError::Null { index });
    };

    let found = value.kind();
    if !column.ty().accepts(found) {
        return Err(ValueSetError::KindMismatch {
            index,
            column: column.to_string(),
            expected: column.ty().kind(),
            found,
        });
    }
    if !column.ty().admits(value) {
        return Err(ValueSetError::Incompatible {
            index,
            column: column.to_string(),
            ty: column.ty(),
            value: value.to_string(),
        });
    }

    Ok(key)
}
