//! Structural invariants (S-1 through S-4).
//!
//! Enforces the physical integrity of the journal as an append-only,
//! 0-indexed event log with well-defined lifecycle bookends. These run
//! before control-flow checks since later invariants rely on structural
//! soundness (e.g. sequence == index).

use super::InvariantState;
use crate::error::JournalViolation;
use crate::event::{JournalEntry, WaitEvent};

/// Validate structural invariants against the current accumulated state.
pub(crate) fn check(state: &InvariantState, entry: &JournalEntry) -> Result<(), JournalViolation> {
    // S-1: Sequence numbers must equal their 0-based array index.
    debug_assert!(state.len <= u64::MAX as usize);
    let expected = state.len as u64;
    if entry.sequence != expected {
        return Err(JournalViolation::NonMonotonicSequence {
            entry_index: state.len,
            expected,
            actual: entry.sequence,
        });
    }

    // S-2: The very first event must be `OrchestratorStarted` — except when
    // config validation fails before the orchestrator loop ever starts
    // (spec §4.4's `Init -> ... -> Failed(InvalidConfig)` path), in which
    // case the journal is a lone terminal `Failed` and nothing else.
    if state.len == 0
        && !matches!(
            entry.event,
            WaitEvent::OrchestratorStarted { .. } | WaitEvent::Failed { .. }
        )
    {
        return Err(JournalViolation::MissingOrchestratorStarted {
            first_event: entry.event.name().to_string(),
        });
    }

    // S-3 / S-4: Terminal event finality. Once recorded, the journal is
    // sealed — another terminal is a uniqueness violation (S-3), a
    // non-terminal append is "terminal not last" (S-4).
    if let Some(first_at) = state.terminal_seq {
        if entry.event.is_terminal() {
            return Err(JournalViolation::MultipleTerminalEvents {
                first_at,
                second_at: entry.sequence,
            });
        }
        return Err(JournalViolation::TerminalNotLast {
            terminal_seq: first_at,
            journal_len: state.len.saturating_add(1),
        });
    }

    Ok(())
}
