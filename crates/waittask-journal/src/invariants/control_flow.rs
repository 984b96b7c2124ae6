//! Control-flow invariants (CF-1 through CF-5).
//!
//! Enforces the causal ordering between arming, delivery, dispatch, and
//! termination: a timer can't fire before it's armed (CF-1), an activity
//! can't be dispatched for a signal that was never delivered (CF-2) or
//! complete before being dispatched (CF-3), the wait-task can't declare
//! success without the activity actually having found the condition met
//! (CF-4) — the direct journal-level encoding of testable property #6
//! (continuation correctness) from spec §8 — and cancellation can't
//! complete without having been requested (CF-5).

use super::InvariantState;
use crate::error::JournalViolation;
use crate::event::{JournalEntry, WaitEvent};
use waittask_types::DecisionReason;

/// Validate control-flow invariants against the current accumulated state.
pub(crate) fn check(state: &InvariantState, entry: &JournalEntry) -> Result<(), JournalViolation> {
    match &entry.event {
        // CF-1: TimerFired requires a prior TimerArmed.
        WaitEvent::TimerFired => {
            if !state.timer_armed {
                return Err(JournalViolation::TimerFiredWithoutArmed {
                    fired_seq: entry.sequence,
                });
            }
        }
        // CF-2: ActivityDispatched requires a prior SignalDelivered for the same signal_id.
        WaitEvent::ActivityDispatched { signal_id } => {
            if !state.delivered_signal_ids.contains(signal_id) {
                return Err(JournalViolation::ActivityDispatchedWithoutDelivery {
                    signal_id: signal_id.clone(),
                    dispatched_seq: entry.sequence,
                });
            }
        }
        // CF-3: ActivityCompleted requires a prior ActivityDispatched for the same signal_id.
        WaitEvent::ActivityCompleted { signal_id, .. } => {
            if !state.dispatched_signal_ids.contains(signal_id) {
                return Err(JournalViolation::ActivityCompletedWithoutDispatch {
                    signal_id: signal_id.clone(),
                    completed_seq: entry.sequence,
                });
            }
        }
        // CF-4: Succeeded requires the terminating ActivityCompleted's
        // decision to carry reason == ConditionMet.
        WaitEvent::Succeeded { .. } => {
            if state.last_completed_reason != Some(DecisionReason::ConditionMet) {
                return Err(JournalViolation::SucceededWithoutConditionMet {
                    succeeded_seq: entry.sequence,
                });
            }
        }
        // CF-5: Cancelled requires a prior CancelRequested.
        WaitEvent::Cancelled => {
            if !state.cancel_requested {
                return Err(JournalViolation::CancelledWithoutRequest {
                    cancelled_seq: entry.sequence,
                });
            }
        }
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use waittask_types::{ProcessingDecision, SignalEnvelope, SignalMetadata, WaitResult};

    fn mk_entry(sequence: u64, event: WaitEvent) -> JournalEntry {
        JournalEntry {
            sequence,
            timestamp: Utc::now(),
            event,
        }
    }

    fn signal(signal_id: &str) -> SignalEnvelope {
        SignalEnvelope::new(
            serde_json::json!({}),
            SignalMetadata {
                signal_id: signal_id.to_string(),
                received_at_utc: Utc::now(),
                workflow_id: "wf-1".to_string(),
                source: None,
            },
        )
    }

    #[test]
    fn cf1_timer_fired_without_armed_reports_timer_fired_without_armed() {
        let state = InvariantState::default();
        let entry = mk_entry(2, WaitEvent::TimerFired);

        let err = check(&state, &entry).unwrap_err();
        assert_eq!(
            err,
            JournalViolation::TimerFiredWithoutArmed { fired_seq: 2 }
        );
    }

    #[test]
    fn cf1_timer_fired_with_prior_armed_passes() {
        let state = InvariantState {
            timer_armed: true,
            ..Default::default()
        };
        let entry = mk_entry(3, WaitEvent::TimerFired);

        assert!(check(&state, &entry).is_ok());
    }

    #[test]
    fn cf2_activity_dispatched_without_delivery_reports_violation() {
        let state = InvariantState::default();
        let entry = mk_entry(
            4,
            WaitEvent::ActivityDispatched {
                signal_id: "a1".to_string(),
            },
        );

        let err = check(&state, &entry).unwrap_err();
        assert_eq!(
            err,
            JournalViolation::ActivityDispatchedWithoutDelivery {
                signal_id: "a1".to_string(),
                dispatched_seq: 4,
            }
        );
    }

    #[test]
    fn cf2_activity_dispatched_with_prior_delivery_passes() {
        let state = InvariantState {
            delivered_signal_ids: std::iter::once("a1".to_string()).collect(),
            ..Default::default()
        };
        let entry = mk_entry(
            4,
            WaitEvent::ActivityDispatched {
                signal_id: "a1".to_string(),
            },
        );

        assert!(check(&state, &entry).is_ok());
    }

    #[test]
    fn cf3_activity_completed_without_dispatch_reports_violation() {
        let state = InvariantState::default();
        let entry = mk_entry(
            5,
            WaitEvent::ActivityCompleted {
                signal_id: "a1".to_string(),
                decision: ProcessingDecision::duplicate(signal("a1")),
            },
        );

        let err = check(&state, &entry).unwrap_err();
        assert_eq!(
            err,
            JournalViolation::ActivityCompletedWithoutDispatch {
                signal_id: "a1".to_string(),
                completed_seq: 5,
            }
        );
    }

    #[test]
    fn cf3_activity_completed_with_prior_dispatch_passes() {
        let state = InvariantState {
            dispatched_signal_ids: std::iter::once("a1".to_string()).collect(),
            ..Default::default()
        };
        let entry = mk_entry(
            5,
            WaitEvent::ActivityCompleted {
                signal_id: "a1".to_string(),
                decision: ProcessingDecision::duplicate(signal("a1")),
            },
        );

        assert!(check(&state, &entry).is_ok());
    }

    #[test]
    fn cf4_succeeded_without_condition_met_reports_violation() {
        let state = InvariantState {
            last_completed_reason: Some(DecisionReason::ConditionNotMet),
            ..Default::default()
        };
        let entry = mk_entry(
            6,
            WaitEvent::Succeeded {
                result: WaitResult::timeout("granted".to_string(), Utc::now()),
            },
        );

        let err = check(&state, &entry).unwrap_err();
        assert_eq!(
            err,
            JournalViolation::SucceededWithoutConditionMet { succeeded_seq: 6 }
        );
    }

    #[test]
    fn cf4_succeeded_with_condition_met_passes() {
        let state = InvariantState {
            last_completed_reason: Some(DecisionReason::ConditionMet),
            ..Default::default()
        };
        let entry = mk_entry(
            6,
            WaitEvent::Succeeded {
                result: WaitResult::timeout("granted".to_string(), Utc::now()),
            },
        );

        assert!(check(&state, &entry).is_ok());
    }

    #[test]
    fn cf5_cancelled_without_request_reports_violation() {
        let state = InvariantState::default();
        let entry = mk_entry(7, WaitEvent::Cancelled);

        let err = check(&state, &entry).unwrap_err();
        assert_eq!(
            err,
            JournalViolation::CancelledWithoutRequest { cancelled_seq: 7 }
        );
    }

    #[test]
    fn cf5_cancelled_with_prior_request_passes() {
        let state = InvariantState {
            cancel_requested: true,
            ..Default::default()
        };
        let entry = mk_entry(7, WaitEvent::Cancelled);

        assert!(check(&state, &entry).is_ok());
    }
}
