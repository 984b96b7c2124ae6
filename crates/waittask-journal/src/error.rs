/// Describes a specific journal invariant violation.
///
/// Grouped: Structural (S-1..S-4), Control Flow (CF-1..CF-5) — the
/// teacher's SE-* (generic invoke lifecycle) and JS-* (JoinSet) groups have
/// no counterpart here: a wait-task has no child invocations and no
/// concurrent joins to track (multi-signal aggregation is an explicit
/// Non-goal), so those checks are dropped rather than ported.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum JournalViolation {
    /// S-1: Sequence numbers must equal their array index (0-indexed, strict equality).
    #[error("entry {entry_index}: expected sequence {expected}, got {actual}")]
    NonMonotonicSequence {
        entry_index: usize,
        expected: u64,
        actual: u64,
    },
    /// S-2: The first event in every journal must be `OrchestratorStarted`.
    #[error("journal must start with OrchestratorStarted, got {first_event}")]
    MissingOrchestratorStarted { first_event: String },
    /// S-3: At most one terminal event per journal.
    #[error("multiple terminal events at sequence {first_at} and {second_at}")]
    MultipleTerminalEvents { first_at: u64, second_at: u64 },
    /// S-4: A terminal event must be the last entry in the journal.
    #[error("terminal event at {terminal_seq} is not the last of {journal_len} entries")]
    TerminalNotLast {
        terminal_seq: u64,
        journal_len: usize,
    },

    /// CF-1: `TimerFired` requires a preceding `TimerArmed`.
    #[error("TimerFired at {fired_seq} without a preceding TimerArmed")]
    TimerFiredWithoutArmed { fired_seq: u64 },
    /// CF-2: `ActivityDispatched { signal_id }` requires a preceding
    /// `SignalDelivered` carrying that `signal_id`.
    #[error(
        "ActivityDispatched for {signal_id} at {dispatched_seq} without a matching SignalDelivered"
    )]
    ActivityDispatchedWithoutDelivery {
        signal_id: String,
        dispatched_seq: u64,
    },
    /// CF-3: `ActivityCompleted { signal_id, .. }` requires a preceding
    /// `ActivityDispatched` for the same `signal_id`.
    #[error(
        "ActivityCompleted for {signal_id} at {completed_seq} without a matching ActivityDispatched"
    )]
    ActivityCompletedWithoutDispatch {
        signal_id: String,
        completed_seq: u64,
    },
    /// CF-4: `Succeeded` requires the terminating `ActivityCompleted`'s
    /// decision to have `reason == ConditionMet`.
    #[error("Succeeded at {succeeded_seq} without a ConditionMet ActivityCompleted")]
    SucceededWithoutConditionMet { succeeded_seq: u64 },
    /// CF-5: `Cancelled` requires a preceding `CancelRequested`.
    #[error("Cancelled at {cancelled_seq} without a preceding CancelRequested")]
    CancelledWithoutRequest { cancelled_seq: u64 },
}
