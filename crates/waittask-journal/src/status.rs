use serde::{Deserialize, Serialize};

use crate::event::{JournalEntry, WaitEvent};

/// Derived phase of a wait-task instance. Not stored independently —
/// derived by folding over journal entries, mirroring the teacher's
/// `ExecutionStatus`, generalized to the smaller state machine of spec §4.4.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitPhase {
    /// Before the first `OrchestratorStarted` event — never observed on a
    /// non-empty journal, only as the fold's starting accumulator.
    Init,
    /// Subscribed to the signal channel and/or timer, waiting for either to resolve.
    Waiting,
    /// Cancellation requested, propagating to any in-flight activity.
    Cancelling,
    /// Terminal: predicate satisfied.
    Succeeded,
    /// Terminal: timer fired first.
    TimedOut,
    /// Terminal: cancellation completed.
    Cancelled,
    /// Terminal: config validation failed, or an unrecoverable error occurred.
    Failed,
}

impl WaitPhase {
    /// Whether the wait-task has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::TimedOut | Self::Cancelled | Self::Failed
        )
    }
}

impl std::fmt::Display for WaitPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Init => "Init",
            Self::Waiting => "Waiting",
            Self::Cancelling => "Cancelling",
            Self::Succeeded => "Succeeded",
            Self::TimedOut => "TimedOut",
            Self::Cancelled => "Cancelled",
            Self::Failed => "Failed",
        };
        f.write_str(s)
    }
}

/// Derive the current wait-task phase by replaying journal events left-to-right.
///
/// This is the canonical recovery path: load persisted entries and fold
/// them into the latest `WaitPhase`. Complexity: O(n) over `entries.len()`.
///
/// Precondition: journal invariants are enforced upstream (S-2 guarantees
/// the first event is `OrchestratorStarted`); an empty journal folds to `Init`.
pub fn derive_status(entries: &[JournalEntry]) -> WaitPhase {
    entries
        .iter()
        .fold(WaitPhase::Init, |status, entry| derive_next_status(status, &entry.event))
}

/// Apply a single-event phase transition.
///
/// Use this in append-time paths where the phase is already known and a new
/// event arrives; gives O(1) incremental updates instead of re-folding the
/// journal. Semantics match one step of `derive_status`: events that don't
/// affect phase return the previous phase unchanged.
pub fn derive_next_status(current_status: WaitPhase, event: &WaitEvent) -> WaitPhase {
    match event {
        WaitEvent::OrchestratorStarted { .. } => WaitPhase::Waiting,
        WaitEvent::CancelRequested { .. } => WaitPhase::Cancelling,
        WaitEvent::Succeeded { .. } => WaitPhase::Succeeded,
        WaitEvent::TimedOut { .. } => WaitPhase::TimedOut,
        WaitEvent::Cancelled => WaitPhase::Cancelled,
        WaitEvent::Failed { .. } => WaitPhase::Failed,
        _ => current_status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use waittask_types::{ErrorKind, WaitResult, WaitTaskError};

    fn entry(sequence: u64, event: WaitEvent) -> JournalEntry {
        JournalEntry {
            sequence,
            timestamp: Utc::now(),
            event,
        }
    }

    #[test]
    fn derive_status_matches_incremental_transitions() {
        let entries = vec![
            entry(
                0,
                WaitEvent::OrchestratorStarted {
                    wait_for: "approval".to_string(),
                    timeout: std::time::Duration::from_secs(60),
                },
            ),
            entry(1, WaitEvent::SignalChannelArmed),
            entry(
                2,
                WaitEvent::CancelRequested {
                    reason: "stop".into(),
                },
            ),
            entry(3, WaitEvent::Cancelled),
        ];

        let folded = derive_status(&entries);
        let incremental = entries
            .iter()
            .fold(WaitPhase::Init, |status, e| derive_next_status(status, &e.event));

        assert_eq!(folded, incremental);
        assert_eq!(folded, WaitPhase::Cancelled);
        assert!(folded.is_terminal());
    }

    #[test]
    fn empty_journal_folds_to_init() {
        assert_eq!(derive_status(&[]), WaitPhase::Init);
    }

    #[test]
    fn derived_phase_matches_its_snapshot() {
        let entries = vec![
            entry(
                0,
                WaitEvent::OrchestratorStarted {
                    wait_for: "approval".to_string(),
                    timeout: std::time::Duration::from_secs(60),
                },
            ),
            entry(1, WaitEvent::SignalChannelArmed),
        ];
        insta::assert_debug_snapshot!(derive_status(&entries), @"Waiting");
    }

    #[test]
    fn timed_out_after_waiting_is_terminal() {
        let entries = vec![
            entry(
                0,
                WaitEvent::OrchestratorStarted {
                    wait_for: "approval".to_string(),
                    timeout: std::time::Duration::from_secs(60),
                },
            ),
            entry(1, WaitEvent::TimerFired),
            entry(
                2,
                WaitEvent::TimedOut {
                    result: WaitResult::timeout("denied".to_string(), Utc::now()),
                },
            ),
        ];

        assert_eq!(derive_status(&entries), WaitPhase::TimedOut);
    }

    #[test]
    fn failed_before_waiting_is_terminal() {
        let entries = vec![entry(
            0,
            WaitEvent::Failed {
                error: WaitTaskError::new(ErrorKind::InvalidConfig, "bad condition"),
            },
        )];

        assert_eq!(derive_status(&entries), WaitPhase::Failed);
    }
}
