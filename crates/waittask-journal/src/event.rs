use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use waittask_types::{ProcessingDecision, SignalEnvelope, WaitResult, WaitTaskError};

/// Everything that can happen to a single wait-task instance, in the order
/// the deterministic orchestrator observes it.
///
/// Each variant carries exactly the fields needed to replay it without
/// re-running any non-deterministic work — generalizes the teacher's
/// `EventType` (20 variants covering a whole execution) down to the handful
/// of things a wait point does: arm a channel and a timer, react to
/// deliveries, and terminate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum WaitEvent {
    /// Always the first event. Pins the instance to the `wait_for` signal
    /// name and the configured timeout.
    OrchestratorStarted {
        wait_for: String,
        timeout: Duration,
    },
    /// The orchestrator has subscribed to the named signal channel.
    SignalChannelArmed,
    /// The timeout timer has been armed; `fire_at` is computed from the
    /// virtual clock, never read again from the wall clock on replay.
    TimerArmed { fire_at: DateTime<Utc> },
    /// One envelope arrived on the signal channel. May recur for the same
    /// `signal_id` under at-least-once delivery.
    SignalDelivered { signal: SignalEnvelope },
    /// The orchestrator handed an envelope to the activity via the host's
    /// activity-dispatch (never a direct call — spec §4.4).
    ActivityDispatched { signal_id: String },
    /// The activity returned a decision. Cached for replay: a re-run must
    /// reuse this value rather than invoking the activity again.
    ActivityCompleted {
        signal_id: String,
        decision: ProcessingDecision,
    },
    /// The activity failed (evaluator or dedupe error). Non-fatal — the
    /// orchestrator logs and keeps waiting.
    ActivityFailed {
        signal_id: String,
        error: WaitTaskError,
    },
    /// The armed timer elapsed.
    TimerFired,
    /// Cancellation was requested by the enclosing workflow.
    CancelRequested { reason: String },
    /// Terminal: the predicate was satisfied by some delivered signal.
    Succeeded { result: WaitResult },
    /// Terminal: the timer fired before any signal satisfied the predicate.
    TimedOut { result: WaitResult },
    /// Terminal: cancellation completed. No continuation is emitted.
    Cancelled,
    /// Terminal: config validation failed before the loop ever started.
    Failed { error: WaitTaskError },
}

impl WaitEvent {
    /// Variant name, for error messages and logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OrchestratorStarted { .. } => "OrchestratorStarted",
            Self::SignalChannelArmed => "SignalChannelArmed",
            Self::TimerArmed { .. } => "TimerArmed",
            Self::SignalDelivered { .. } => "SignalDelivered",
            Self::ActivityDispatched { .. } => "ActivityDispatched",
            Self::ActivityCompleted { .. } => "ActivityCompleted",
            Self::ActivityFailed { .. } => "ActivityFailed",
            Self::TimerFired => "TimerFired",
            Self::CancelRequested { .. } => "CancelRequested",
            Self::Succeeded { .. } => "Succeeded",
            Self::TimedOut { .. } => "TimedOut",
            Self::Cancelled => "Cancelled",
            Self::Failed { .. } => "Failed",
        }
    }

    /// Whether this event ends the wait-task (`Succeeded`, `TimedOut`,
    /// `Cancelled`, or `Failed`).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded { .. } | Self::TimedOut { .. } | Self::Cancelled | Self::Failed { .. }
        )
    }
}

/// A single entry in the wait-task journal's append-only event log.
///
/// Sequence is 0-indexed and monotonically increasing. Timestamp is
/// wall-clock for debugging only — not used in replay logic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub event: WaitEvent,
}

/// The full journal for one wait-task instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaitJournal {
    pub wait_task_id: String,
    pub entries: Vec<JournalEntry>,
}

impl WaitJournal {
    pub fn new(wait_task_id: impl Into<String>) -> Self {
        Self {
            wait_task_id: wait_task_id.into(),
            entries: Vec::new(),
        }
    }
}
