use std::collections::HashMap;

use waittask_types::ProcessingDecision;

use crate::event::{JournalEntry, WaitEvent};

/// Batch-built replay cache keyed by `signal_id`.
///
/// Construction is a single O(n) scan over journal entries. On replay, the
/// orchestrator looks up this cache before invoking the activity dispatcher
/// so that a re-run reuses the recorded `ProcessingDecision` for a given
/// `signal_id` instead of re-executing the non-deterministic activity —
/// this is the direct mechanism behind testable property #3 (determinism
/// under replay) and generalizes the teacher's `ReplayCache` (which indexed
/// `InvokeCompleted`/`TimerFired`/`SignalReceived` by `PromiseId`).
#[derive(Clone, Debug, Default)]
pub struct ReplayCache {
    decisions: HashMap<String, ProcessingDecision>,
}

impl ReplayCache {
    /// Build cache entries from a full journal history in one pass.
    ///
    /// Only `ActivityCompleted` contributes cache entries — `ActivityFailed`
    /// is not cached, since spec §4.3 step 5 treats evaluator/dedupe errors
    /// as retryable-by-the-activity-policy rather than a value to replay.
    pub fn build(entries: &[JournalEntry]) -> Self {
        let mut decisions = HashMap::new();

        for entry in entries {
            if let WaitEvent::ActivityCompleted { signal_id, decision } = &entry.event {
                decisions.insert(signal_id.clone(), decision.clone());
            }
        }

        Self { decisions }
    }

    /// Look up a cached decision for `signal_id`, if the activity already
    /// ran for it earlier in this journal.
    pub fn lookup(&self, signal_id: &str) -> Option<&ProcessingDecision> {
        self.decisions.get(signal_id)
    }

    /// Number of cached decisions.
    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    /// True when no decisions are cached.
    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use waittask_types::{SignalEnvelope, SignalMetadata};

    fn signal(signal_id: &str) -> SignalEnvelope {
        SignalEnvelope::new(
            serde_json::json!({"status": "approved"}),
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
    fn build_caches_activity_completed_by_signal_id() {
        let decision = ProcessingDecision::condition_met(signal("a1"), None);
        let entries = vec![
            entry(
                0,
                WaitEvent::ActivityDispatched {
                    signal_id: "a1".to_string(),
                },
            ),
            entry(
                1,
                WaitEvent::ActivityCompleted {
                    signal_id: "a1".to_string(),
                    decision: decision.clone(),
                },
            ),
        ];

        let cache = ReplayCache::build(&entries);

        assert_eq!(cache.len(), 1);
        assert!(!cache.is_empty());
        assert_eq!(cache.lookup("a1"), Some(&decision));
        assert_eq!(cache.lookup("missing"), None);
    }

    #[test]
    fn activity_failed_is_not_cached() {
        let entries = vec![entry(
            0,
            WaitEvent::ActivityFailed {
                signal_id: "a1".to_string(),
                error: waittask_types::WaitTaskError::new(
                    waittask_types::ErrorKind::CostExceeded,
                    "too expensive",
                ),
            },
        )];

        let cache = ReplayCache::build(&entries);
        assert!(cache.is_empty());
    }
}
