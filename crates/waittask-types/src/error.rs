use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical failure category for a wait-task, matching the error taxonomy
/// in the design spec: used for retry/continuation-routing decisions and as
/// an observability dimension in logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Config failed pre-flight validation. Non-retryable; terminates the
    /// wait-task immediately on `on_error` (see
    /// `waittask_engine::orchestrator::WaitOrchestrator::start`, which turns
    /// this into a one-entry `Failed` journal and a `WaitResult` routed to
    /// `config.on_error.next`).
    InvalidConfig,
    /// Dedupe store rejected this `signal_id` as already claimed.
    Duplicate,
    /// Predicate evaluated to `false`.
    ConditionNotMet,
    /// Predicate evaluation exceeded its cost budget. Non-retryable.
    CostExceeded,
    /// Predicate evaluated to a non-boolean. Non-retryable.
    TypeMismatch,
    /// The optional processor sub-task failed. Non-fatal to the wait-task.
    ProcessorFailed,
    /// Dedupe store is transiently unavailable. Retryable by the activity's
    /// retry policy.
    DedupeTransient,
    /// The enclosing workflow was cancelled.
    Cancelled,
    /// The wait-task's timer fired before the predicate was satisfied.
    TimedOut,
}

impl ErrorKind {
    /// Whether the host engine's activity-retry policy should retry an
    /// error of this kind. Only `DedupeTransient` is retryable — every other
    /// kind is either a terminal config error or recoverable by the
    /// orchestrator simply continuing to wait.
    pub fn retryable(self) -> bool {
        matches!(self, ErrorKind::DedupeTransient)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidConfig => "InvalidConfig",
            ErrorKind::Duplicate => "Duplicate",
            ErrorKind::ConditionNotMet => "ConditionNotMet",
            ErrorKind::CostExceeded => "CostExceeded",
            ErrorKind::TypeMismatch => "TypeMismatch",
            ErrorKind::ProcessorFailed => "ProcessorFailed",
            ErrorKind::DedupeTransient => "DedupeTransient",
            ErrorKind::Cancelled => "Cancelled",
            ErrorKind::TimedOut => "TimedOut",
        };
        f.write_str(s)
    }
}

/// Structured error surfaced across every wait-task boundary.
///
/// Carries a coarse `kind` for policy decisions plus a human-readable
/// `message`, and an optional `detail` for low-level diagnostics — same
/// shape as the teacher's `ExecutionError`, generalized to this domain's
/// error kinds.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}{}", detail.as_ref().map(|d| format!(" ({d})")).unwrap_or_default())]
pub struct WaitTaskError {
    pub kind: ErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl WaitTaskError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_task_error_round_trips_through_json() {
        let original = WaitTaskError::new(ErrorKind::CostExceeded, "too expensive")
            .with_detail("wait-task 'wait-1' condition");
        let json = serde_json::to_string(&original).unwrap();
        let decoded: WaitTaskError = serde_json::from_str(&json).unwrap();
        similar_asserts::assert_eq!(original, decoded);
    }
}
