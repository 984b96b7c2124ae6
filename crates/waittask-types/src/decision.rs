use serde::{Deserialize, Serialize};

use crate::processor::ProcessorOutput;
use crate::signal::SignalEnvelope;

/// Why the signal-processing activity did or did not continue.
///
/// Exactly one reason accompanies every decision; `ShouldContinue` is only
/// ever true alongside `ConditionMet` (enforced by `ProcessingDecision`'s
/// constructors rather than left as caller discipline).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionReason {
    Duplicate,
    ConditionMet,
    ConditionNotMet,
    Error,
}

/// Return value of one signal-processing activity invocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessingDecision {
    pub should_continue: bool,
    pub signal: SignalEnvelope,
    pub processor_output: Option<ProcessorOutput>,
    pub reason: DecisionReason,
}

impl ProcessingDecision {
    /// The signal was already claimed by a prior delivery. Terminal for this
    /// invocation — the orchestrator silently keeps waiting.
    pub fn duplicate(signal: SignalEnvelope) -> Self {
        Self {
            should_continue: false,
            signal,
            processor_output: None,
            reason: DecisionReason::Duplicate,
        }
    }

    /// The predicate evaluated to `true`. The only reason that may carry
    /// `should_continue = true`.
    pub fn condition_met(signal: SignalEnvelope, processor_output: Option<ProcessorOutput>) -> Self {
        Self {
            should_continue: true,
            signal,
            processor_output,
            reason: DecisionReason::ConditionMet,
        }
    }

    /// The predicate evaluated to `false`. The orchestrator keeps waiting.
    pub fn condition_not_met(
        signal: SignalEnvelope,
        processor_output: Option<ProcessorOutput>,
    ) -> Self {
        Self {
            should_continue: false,
            signal,
            processor_output,
            reason: DecisionReason::ConditionNotMet,
        }
    }

    /// Checks the `should_continue ⇒ reason == ConditionMet` invariant.
    pub fn is_well_formed(&self) -> bool {
        !self.should_continue || self.reason == DecisionReason::ConditionMet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SignalMetadata;
    use chrono::Utc;

    fn signal() -> SignalEnvelope {
        SignalEnvelope::new(
            serde_json::json!({"status": "approved"}),
            SignalMetadata {
                signal_id: "sig-1".to_string(),
                received_at_utc: Utc::now(),
                workflow_id: "wf-1".to_string(),
                source: None,
            },
        )
    }

    #[test]
    fn condition_met_decision_reason_matches_its_snapshot() {
        let decision = ProcessingDecision::condition_met(signal(), None);
        insta::assert_debug_snapshot!(decision.reason, @"ConditionMet");
        assert!(decision.is_well_formed());
    }

    #[test]
    fn duplicate_decision_cannot_continue() {
        let decision = ProcessingDecision::duplicate(signal());
        assert!(!decision.should_continue);
        assert!(decision.is_well_formed());
    }
}
