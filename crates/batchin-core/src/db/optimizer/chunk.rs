use crate::{
    db::{column::Column, expr::Expr, optimizer::emit},
    value::Value,
};

/// Number of groups `len` values split into.
#[must_use]
pub const fn group_count(len: usize, chunk_size: usize) -> usize {
    len.div_ceil(chunk_size)
}

/// Partition `values` into consecutive groups of at most `chunk_size` and
/// combine the per-group tests into one expression.
///
/// `chunk_size` must be non-zero; strategy selection guarantees it.
#[must_use]
pub fn plan_chunks(column: &Column, values: &[Value], chunk_size: usize, negated: bool) -> Expr {
    let groups = values
        .chunks(chunk_size)
        .map(|group| emit::in_list(column.clone(), group.to_vec(), negated))
        .collect();

    emit::combine(groups, negated)
}
