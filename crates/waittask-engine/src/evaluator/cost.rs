use std::time::Instant;

use waittask_types::{ErrorKind, WaitTaskError};

/// Per-evaluation cost accounting.
///
/// Every AST node visited during [`super::Evaluator::evaluate`] spends one
/// unit from this budget; a condition that recurses through thousands of
/// field lookups (there is no loop construct to do that deliberately, but a
/// deeply nested `&&`/`||` chain can still rack up nodes) runs out before it
/// can knock the orchestrator's replay loop off its wall-clock budget.
pub struct CostBudget {
    remaining: u32,
}

impl CostBudget {
    pub fn new(limit: u32) -> Self {
        Self { remaining: limit }
    }

    /// Spend one unit, or however many `units` the caller's node costs
    /// (e.g. a `matches()` call spends more than a field lookup).
    pub fn spend(&mut self, units: u32) -> Result<(), WaitTaskError> {
        match self.remaining.checked_sub(units) {
            Some(rest) => {
                self.remaining = rest;
                Ok(())
            }
            None => Err(WaitTaskError::new(
                ErrorKind::CostExceeded,
                "condition evaluation exceeded its cost budget",
            )),
        }
    }
}

/// A wall-clock ceiling checked alongside the cost budget. Cost units are a
/// proxy for work; this catches the case a proxy always can miss (e.g. a
/// pathological regex the state estimator underestimated).
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn from_now(budget: std::time::Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    pub fn check(&self) -> Result<(), WaitTaskError> {
        if Instant::now() >= self.at {
            Err(WaitTaskError::new(
                ErrorKind::CostExceeded,
                "condition evaluation exceeded its wall-clock deadline",
            ))
        } else {
            Ok(())
        }
    }
}
