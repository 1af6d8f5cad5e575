use serde::{Deserialize, Serialize};
use std::{
    cell::RefCell,
    time::{SystemTime, UNIX_EPOCH},
};

///
/// Metrics
/// Ephemeral, in-memory counters for optimizer and staging operations.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub since_ms: u64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            since_ms: now_millis(),
        }
    }
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Planner decisions
    pub plan_constant: u64,
    pub plan_simple: u64,
    pub plan_chunk: u64,
    pub plan_temp_table: u64,
    pub values_planned: u64,

    // Staging lifecycle
    pub tables_created: u64,
    pub insert_batches: u64,
    pub rows_staged: u64,
    pub tables_indexed: u64,
    pub tables_dropped: u64,
    pub compensating_drops: u64,
    pub cleanup_failures: u64,
}

///
/// EventReport
///

pub type EventReport = EventState;

thread_local! {
    static STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    STATE.with(|cell| f(&mut cell.borrow_mut()))
}

pub(crate) fn report() -> EventReport {
    STATE.with(|cell| cell.borrow().clone())
}

pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

#[expect(clippy::cast_possible_truncation)]
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}
