use waittask_types::ProcessingDecision;

use crate::event::{JournalEntry, WaitEvent};

/// Returns true if `signal_id` was ever delivered (`SignalDelivered`).
///
/// Scan complexity: O(n).
pub fn is_signal_delivered(entries: &[JournalEntry], signal_id: &str) -> bool {
    entries.iter().any(|e| match &e.event {
        WaitEvent::SignalDelivered { signal } => signal.signal_id() == signal_id,
        _ => false,
    })
}

/// Returns true if the activity was ever dispatched for `signal_id`.
///
/// Scan complexity: O(n).
pub fn is_activity_dispatched(entries: &[JournalEntry], signal_id: &str) -> bool {
    entries.iter().any(|e| match &e.event {
        WaitEvent::ActivityDispatched { signal_id: sid } => sid == signal_id,
        _ => false,
    })
}

/// Returns the most recent `ActivityCompleted` decision for `signal_id`, if any.
///
/// Scan complexity: O(n).
pub fn activity_completed_decision<'a>(
    entries: &'a [JournalEntry],
    signal_id: &str,
) -> Option<&'a ProcessingDecision> {
    entries.iter().rev().find_map(|e| match &e.event {
        WaitEvent::ActivityCompleted {
            signal_id: sid,
            decision,
        } if sid == signal_id => Some(decision),
        _ => None,
    })
}

/// Returns true if a cancellation request appears anywhere in the journal.
///
/// Scan complexity: O(n).
pub fn has_cancel_requested(entries: &[JournalEntry]) -> bool {
    entries
        .iter()
        .any(|e| matches!(e.event, WaitEvent::CancelRequested { .. }))
}

/// Returns the first terminal event in journal order, if present.
///
/// Terminal events are `Succeeded`, `TimedOut`, `Cancelled`, or `Failed`.
/// Scan complexity: O(n).
pub fn terminal_event(entries: &[JournalEntry]) -> Option<&WaitEvent> {
    entries.iter().find_map(|e| {
        if e.event.is_terminal() {
            Some(&e.event)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use waittask_types::{SignalEnvelope, SignalMetadata, WaitResult};

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

    fn entry(sequence: u64, event: WaitEvent) -> JournalEntry {
        JournalEntry {
            sequence,
            timestamp: Utc::now(),
            event,
        }
    }

    #[test]
    fn is_signal_delivered_matches_on_signal_id() {
        let entries = vec![entry(
            0,
            WaitEvent::SignalDelivered {
                signal: signal("a1"),
            },
        )];

        assert!(is_signal_delivered(&entries, "a1"));
        assert!(!is_signal_delivered(&entries, "b1"));
    }

    #[test]
    fn activity_completed_decision_returns_latest_for_signal_id() {
        let first = ProcessingDecision::condition_not_met(signal("a1"), None);
        let second = ProcessingDecision::condition_met(signal("a1"), None);
        let entries = vec![
            entry(
                0,
                WaitEvent::ActivityCompleted {
                    signal_id: "a1".to_string(),
                    decision: first,
                },
            ),
            entry(
                1,
                WaitEvent::ActivityCompleted {
                    signal_id: "a1".to_string(),
                    decision: second.clone(),
                },
            ),
        ];

        assert_eq!(activity_completed_decision(&entries, "a1"), Some(&second));
        assert_eq!(activity_completed_decision(&entries, "b1"), None);
    }

    #[test]
    fn has_cancel_requested_scans_whole_journal() {
        let entries = vec![entry(
            0,
            WaitEvent::CancelRequested {
                reason: "stop".to_string(),
            },
        )];
        assert!(has_cancel_requested(&entries));
        assert!(!has_cancel_requested(&[]));
    }

    #[test]
    fn terminal_event_finds_first_terminal() {
        let entries = vec![
            entry(0, WaitEvent::SignalChannelArmed),
            entry(
                1,
                WaitEvent::Succeeded {
                    result: WaitResult::timeout("granted".to_string(), Utc::now()),
                },
            ),
        ];

        assert!(matches!(
            terminal_event(&entries),
            Some(WaitEvent::Succeeded { .. })
        ));
        assert!(terminal_event(&[]).is_none());
    }
}
