//! Daily external-call budget
//!
//! One instance is shared (behind `Arc`) by every batch processor so the
//! daily ceiling holds across concurrent runs. The counter resets exactly
//! once per UTC day, the first time the budget is consulted on a new date.

use chrono::NaiveDate;
use dinewise_common::time::Clock;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Debug)]
struct BudgetState {
    count: u32,
    as_of: NaiveDate,
}

/// Point-in-time view of the budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSnapshot {
    pub count: u32,
    pub ceiling: u32,
    pub remaining: u32,
    pub as_of: NaiveDate,
}

/// Date-keyed call counter with a fixed ceiling
pub struct DailyBudget {
    ceiling: u32,
    clock: Arc<dyn Clock>,
    state: Mutex<BudgetState>,
}

impl DailyBudget {
    pub fn new(ceiling: u32, clock: Arc<dyn Clock>) -> Self {
        let as_of = clock.today();
        Self {
            ceiling,
            clock,
            state: Mutex::new(BudgetState { count: 0, as_of }),
        }
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    /// Lock the state, rolling the counter over if the date changed
    fn current(&self) -> MutexGuard<'_, BudgetState> {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        let today = self.clock.today();
        if today != state.as_of {
            info!(
                previous_date = %state.as_of,
                new_date = %today,
                calls_used = state.count,
                "Daily enrichment budget reset"
            );
            state.count = 0;
            state.as_of = today;
        }
        state
    }

    /// Whether another external call may be made today
    pub fn can_proceed(&self) -> bool {
        self.current().count < self.ceiling
    }

    /// Count one external call
    pub fn record_call(&self) {
        let mut state = self.current();
        state.count = state.count.saturating_add(1);
    }

    /// Check and count in one step
    ///
    /// Concurrent callers cannot both pass the check for the last remaining
    /// call. Returns false (and counts nothing) when exhausted.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.current();
        if state.count < self.ceiling {
            state.count += 1;
            true
        } else {
            false
        }
    }

    pub fn snapshot(&self) -> BudgetSnapshot {
        let state = self.current();
        BudgetSnapshot {
            count: state.count,
            ceiling: self.ceiling,
            remaining: self.ceiling.saturating_sub(state.count),
            as_of: state.as_of,
        }
    }
}

impl std::fmt::Debug for DailyBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyBudget")
            .field("ceiling", &self.ceiling)
            .field("state", &self.state)
            .finish()
    }
}
