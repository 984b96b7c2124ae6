//! Journal invariant checking engine.
//!
//! Provides two modes of validation:
//! - **Incremental** ([`InvariantState::check_append`]): O(1) per entry via auxiliary state.
//!   Used at append time to reject invalid entries before they hit the journal.
//! - **Batch** ([`validate_journal`]): O(n) full scan that collects all violations.
//!   Used for diagnostics and journal recovery.
//!
//! Invariants are grouped into two sub-modules (9 checks total):
//! - [`structural`] (S-1..S-4): Sequence numbering, lifecycle bookends, terminal uniqueness.
//! - [`control_flow`] (CF-1..CF-5): Timer, activity-dispatch, and cancellation consistency.

mod control_flow;
mod structural;

use std::collections::{HashMap, HashSet};

use waittask_types::DecisionReason;

use crate::error::JournalViolation;
use crate::event::{JournalEntry, WaitEvent, WaitJournal};

/// Accumulated auxiliary state for O(1) incremental invariant checking.
///
/// Each field tracks just enough information from previously ingested
/// entries to validate the next append without rescanning the journal.
/// Fields are `pub(crate)` so sub-module checkers can read them; only
/// [`InvariantState::apply_entry`] mutates them.
#[derive(Clone, Debug, Default)]
pub struct InvariantState {
    /// Number of entries ingested so far. Used by S-1 (expected sequence == len).
    pub(crate) len: usize,

    /// Sequence number of the first terminal event, if any.
    pub(crate) terminal_seq: Option<u64>,

    /// Whether `TimerArmed` has been seen. Required by CF-1 before `TimerFired`.
    pub(crate) timer_armed: bool,

    /// Whether `CancelRequested` has been seen. Required by CF-5 before `Cancelled`.
    pub(crate) cancel_requested: bool,

    /// `signal_id`s that have appeared in a `SignalDelivered` event. Checked by CF-2.
    pub(crate) delivered_signal_ids: HashSet<String>,

    /// `signal_id`s that have appeared in an `ActivityDispatched` event. Checked by CF-3.
    pub(crate) dispatched_signal_ids: HashSet<String>,

    /// Most recently observed `ActivityCompleted` reason per `signal_id`. Checked by CF-4.
    pub(crate) completed_reasons: HashMap<String, DecisionReason>,

    /// Reason carried by the most recent `ActivityCompleted` event overall,
    /// regardless of `signal_id` — this is "the terminating ActivityCompleted"
    /// CF-4 refers to, since `Succeeded` always follows the activity call
    /// that satisfied the predicate.
    pub(crate) last_completed_reason: Option<DecisionReason>,
}

impl InvariantState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and ingest a single journal entry (incremental path).
    pub fn check_append(&mut self, entry: &JournalEntry) -> Result<(), JournalViolation> {
        structural::check(self, entry)?;
        control_flow::check(self, entry)?;
        self.apply_entry(entry);
        Ok(())
    }

    /// Run both invariant groups, collecting one violation per group rather
    /// than short-circuiting, so [`validate_journal`] surfaces independent
    /// issues in a single pass over a corrupt journal.
    fn collect_entry_violations(
        &self,
        entry: &JournalEntry,
        violations: &mut Vec<JournalViolation>,
    ) {
        if let Err(v) = structural::check(self, entry) {
            violations.push(v);
        }
        if let Err(v) = control_flow::check(self, entry) {
            violations.push(v);
        }
    }

    /// Update auxiliary state after an entry passes validation (or is
    /// force-applied during batch validation).
    fn apply_entry(&mut self, entry: &JournalEntry) {
        match &entry.event {
            WaitEvent::Succeeded { .. }
            | WaitEvent::TimedOut { .. }
            | WaitEvent::Cancelled
            | WaitEvent::Failed { .. } => {
                self.terminal_seq.get_or_insert(entry.sequence);
            }
            WaitEvent::TimerArmed { .. } => {
                self.timer_armed = true;
            }
            WaitEvent::CancelRequested { .. } => {
                self.cancel_requested = true;
            }
            WaitEvent::SignalDelivered { signal } => {
                self.delivered_signal_ids
                    .insert(signal.signal_id().to_string());
            }
            WaitEvent::ActivityDispatched { signal_id } => {
                self.dispatched_signal_ids.insert(signal_id.clone());
            }
            WaitEvent::ActivityCompleted { signal_id, decision } => {
                self.completed_reasons
                    .insert(signal_id.clone(), decision.reason);
                self.last_completed_reason = Some(decision.reason);
            }
            _ => {}
        }
        self.len += 1;
    }
}

/// Batch-validate an entire journal, returning all detected violations.
///
/// An empty journal is reported as [`JournalViolation::MissingOrchestratorStarted`].
pub fn validate_journal(journal: &WaitJournal) -> Vec<JournalViolation> {
    if journal.entries.is_empty() {
        return vec![JournalViolation::MissingOrchestratorStarted {
            first_event: "<empty>".to_string(),
        }];
    }

    let mut state = InvariantState::new();
    let mut violations = Vec::new();

    for entry in &journal.entries {
        state.collect_entry_violations(entry, &mut violations);
        state.apply_entry(entry);
    }

    if !violations.is_empty() {
        tracing::warn!(
            wait_task_id = %journal.wait_task_id,
            count = violations.len(),
            "journal failed invariant validation"
        );
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(sequence: u64, event: WaitEvent) -> JournalEntry {
        JournalEntry {
            sequence,
            timestamp: Utc::now(),
            event,
        }
    }

    #[test]
    fn empty_journal_is_reported_as_missing_start() {
        let journal = WaitJournal::new("wait-1");
        let violations = validate_journal(&journal);
        assert_eq!(violations.len(), 1);
    }

    #[test_log::test]
    fn valid_journal_has_no_violations_under_traced_execution() {
        // #[test_log::test] surfaces the tracing::warn! in validate_journal
        // on stderr when the test fails, instead of it vanishing silently.
        let mut journal = WaitJournal::new("wait-1");
        journal.entries.push(entry(
            0,
            WaitEvent::OrchestratorStarted {
                wait_for: "approval".to_string(),
                timeout: std::time::Duration::from_secs(60),
            },
        ));
        assert!(validate_journal(&journal).is_empty());
    }

    #[test]
    fn violation_warning_is_observable_on_a_manual_subscriber() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        // Out-of-order sequence numbers: S-1 violation, logged by validate_journal.
        let mut journal = WaitJournal::new("wait-1");
        journal.entries.push(entry(
            1,
            WaitEvent::OrchestratorStarted {
                wait_for: "approval".to_string(),
                timeout: std::time::Duration::from_secs(60),
            },
        ));
        assert!(!validate_journal(&journal).is_empty());
    }
}
