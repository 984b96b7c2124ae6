//! Boundary traits the deterministic orchestrator consumes from the host
//! durable-workflow engine.
//!
//! The engine itself (replay-based scheduler, signal channels, timers,
//! activity retry) is an external collaborator assumed given by spec §1 —
//! this module specifies only the narrow interfaces the orchestrator needs
//! from it, so the orchestrator crate never names a concrete engine type.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::decision::ProcessingDecision;
use crate::error::WaitTaskError;
use crate::signal::SignalEnvelope;

/// The named signal channel a wait-task instance subscribes to.
///
/// Ordering of deliveries on one channel is the host's responsibility
/// (spec §5); this trait only exposes "give me the next envelope".
#[async_trait]
pub trait SignalChannel: Send + Sync {
    /// Await the next envelope delivered to this channel. Returns `None`
    /// once the channel is closed (e.g. the workflow is tearing down).
    async fn recv(&mut self) -> Option<SignalEnvelope>;
}

/// A single arm-then-fire deadline owned exclusively by one wait-task.
#[async_trait]
pub trait Timer: Send + Sync {
    /// Arm the timer for `duration` from the virtual clock's current
    /// instant, returning the computed fire time for journaling.
    async fn arm(&mut self, duration: Duration) -> DateTime<Utc>;

    /// Suspend until the armed deadline elapses.
    async fn wait(&mut self);
}

/// The engine's virtual clock. All time reads inside the deterministic
/// orchestration loop go through this — never `Utc::now()` directly — so
/// that replay observes the recorded time instead of the wall clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Replay-aware invocation of the signal-processing activity.
///
/// A real implementation checks the journal's `ReplayCache` before running
/// the activity fresh, so that a replay observes the recorded
/// `ProcessingDecision` rather than re-executing non-deterministic work
/// (spec §4.4: "the activity is invoked via the engine's activity-dispatch,
/// not a direct call").
///
/// `cancel` is the same [`CancellationToken`] the orchestrator itself
/// selects on (spec §5: "the orchestrator cancels any in-flight activity
/// via the activity's context"). The orchestrator additionally races this
/// call against `cancel.cancelled()` so a cancellation is observed even if
/// the implementation never polls `cancel` on its own; a well-behaved
/// implementation should still check it at I/O boundaries (e.g. before a
/// retry) so cancelled work doesn't keep running after the race is lost.
#[async_trait]
pub trait ActivityDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        signal: SignalEnvelope,
        cancel: &dyn CancellationToken,
    ) -> Result<ProcessingDecision, WaitTaskError>;
}

/// Cooperative cancellation propagated from the enclosing workflow.
#[async_trait]
pub trait CancellationToken: Send + Sync {
    /// Resolves once cancellation has been requested.
    async fn cancelled(&self);

    /// Non-blocking poll, used at points where the loop must check without
    /// suspending (e.g. before dispatching an already-received signal).
    fn is_cancelled(&self) -> bool;
}

/// Logger usable from inside the deterministic loop.
///
/// Spec §4.4 requires logging inside the replay-sensitive loop to go
/// through a replay-safe abstraction rather than calling `tracing` macros
/// directly — a side-effecting log call during replay is harmless in
/// practice, but the boundary keeps the loop provably free of anything
/// that could diverge between a live run and a replay.
pub trait ReplaySafeLogger: Send + Sync {
    fn log_event(&self, event: &str, fields: &[(&str, &str)]);
}
