//! Deterministic wait-task state machine (spec §4.4).
//!
//! Everything here must be safe to replay: the only non-deterministic call
//! is `dispatcher.dispatch`, and it goes through the host's
//! `ActivityDispatcher`, which is expected to consult the journal's replay
//! cache before running anything fresh. No `tracing` macro, no
//! `Utc::now()`, no direct RNG use — time comes from `Clock`, logging goes
//! through `ReplaySafeLogger`.

use waittask_journal::{InvariantState, JournalEntry, WaitEvent, WaitJournal};
use waittask_types::host::{ActivityDispatcher, CancellationToken, Clock, ReplaySafeLogger, SignalChannel, Timer};
use waittask_types::{ErrorKind, WaitConfig, WaitResult, WaitTaskError};

use crate::config::{self, CompiledWaitConfig};
use crate::evaluator::Evaluator;

/// Terminal outcome of one orchestrator run, carrying both the host-facing
/// [`WaitResult`] (absent on cancellation — spec §4.4: "no continuation is
/// emitted"; present with `status: Failed` when [`WaitOrchestrator::start`]
/// rejects an invalid config) and the completed journal for persistence/
/// diagnostics.
pub struct OrchestratorOutcome {
    pub result: Option<WaitResult>,
    pub journal: WaitJournal,
}

/// Drives one wait-task instance from `Init` through to a terminal phase.
///
/// Generic over the host boundary traits (spec's host collaborator) so this
/// crate never names a concrete durable-engine type.
pub struct WaitOrchestrator<C, T, Clk, A, Cn, L> {
    channel: C,
    timer: T,
    clock: Clk,
    dispatcher: A,
    cancel: Cn,
    logger: L,
    journal: WaitJournal,
    invariants: InvariantState,
}

impl<C, T, Clk, A, Cn, L> WaitOrchestrator<C, T, Clk, A, Cn, L>
where
    C: SignalChannel,
    T: Timer,
    Clk: Clock,
    A: ActivityDispatcher,
    Cn: CancellationToken,
    L: ReplaySafeLogger,
{
    pub fn new(
        wait_task_id: impl Into<String>,
        channel: C,
        timer: T,
        clock: Clk,
        dispatcher: A,
        cancel: Cn,
        logger: L,
    ) -> Self {
        Self {
            channel,
            timer,
            clock,
            dispatcher,
            cancel,
            logger,
            journal: WaitJournal::new(wait_task_id),
            invariants: InvariantState::new(),
        }
    }

    fn append(&mut self, event: WaitEvent) -> Result<(), WaitTaskError> {
        let entry = JournalEntry {
            sequence: self.journal.entries.len() as u64,
            timestamp: self.clock.now(),
            event,
        };
        self.invariants.check_append(&entry).map_err(|violation| {
            WaitTaskError::new(
                ErrorKind::InvalidConfig,
                format!("journal invariant violated: {violation}"),
            )
        })?;
        self.logger.log_event(entry.event.name(), &[("sequence", &entry.sequence.to_string())]);
        self.journal.entries.push(entry);
        Ok(())
    }

    /// Entry point covering the full `Init` phase of spec §4.4: validates
    /// `config` against `evaluator` before the orchestrator ever subscribes
    /// to `channel` or arms `timer`.
    ///
    /// On validation failure, returns a terminal [`OrchestratorOutcome`]
    /// carrying a one-entry journal (`WaitEvent::Failed`) and a
    /// [`WaitResult`] routed to `config.on_error.next` — `channel`, `timer`,
    /// and `dispatcher` are never touched, matching the `Failed(InvalidConfig)`
    /// terminal state, which never reaches `Waiting`. On success, proceeds
    /// into the same loop as [`run`](Self::run).
    pub async fn start(
        wait_task_id: impl Into<String>,
        config: &WaitConfig,
        evaluator: &Evaluator,
        channel: C,
        timer: T,
        clock: Clk,
        dispatcher: A,
        cancel: Cn,
        logger: L,
    ) -> Result<OrchestratorOutcome, WaitTaskError> {
        let wait_task_id = wait_task_id.into();
        match config::validate(config, evaluator) {
            Ok(compiled) => {
                Self::new(wait_task_id, channel, timer, clock, dispatcher, cancel, logger)
                    .run(&compiled)
                    .await
            }
            Err(error) => {
                let completed_at = clock.now();
                let mut journal = WaitJournal::new(wait_task_id);
                journal.entries.push(JournalEntry {
                    sequence: 0,
                    timestamp: completed_at,
                    event: WaitEvent::Failed { error },
                });
                let result = WaitResult::failed(config.on_error.next.clone(), completed_at);
                Ok(OrchestratorOutcome {
                    result: Some(result),
                    journal,
                })
            }
        }
    }

    /// Run the wait-task to completion against `config`.
    ///
    /// Serializes signal dispatch: only one delivery is in flight against
    /// the activity at a time (spec's MVP default — no concurrent-dispatch
    /// option). Further deliveries queue behind `channel.recv()`'s own
    /// buffering; this loop never calls `dispatch` again before the prior
    /// call resolves.
    pub async fn run(mut self, config: &CompiledWaitConfig) -> Result<OrchestratorOutcome, WaitTaskError> {
        self.append(WaitEvent::OrchestratorStarted {
            wait_for: config.wait_for().to_string(),
            timeout: config.timeout(),
        })?;
        self.append(WaitEvent::SignalChannelArmed)?;

        let fire_at = self.timer.arm(config.timeout()).await;
        self.append(WaitEvent::TimerArmed { fire_at })?;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    self.append(WaitEvent::CancelRequested { reason: "workflow cancellation".to_string() })?;
                    self.append(WaitEvent::Cancelled)?;
                    return Ok(OrchestratorOutcome { result: None, journal: self.journal });
                }
                _ = self.timer.wait() => {
                    self.append(WaitEvent::TimerFired)?;
                    let result = WaitResult::timeout(
                        config.config().next_task_on_timeout().to_string(),
                        self.clock.now(),
                    );
                    self.append(WaitEvent::TimedOut { result: result.clone() })?;
                    return Ok(OrchestratorOutcome { result: Some(result), journal: self.journal });
                }
                delivered = self.channel.recv() => {
                    let Some(signal) = delivered else {
                        continue;
                    };
                    let signal_id = signal.signal_id().to_string();
                    self.append(WaitEvent::SignalDelivered { signal: signal.clone() })?;
                    self.append(WaitEvent::ActivityDispatched { signal_id: signal_id.clone() })?;

                    // Race the dispatch itself against cancellation, not just the
                    // top-level select — once a signal is in flight to the
                    // activity, a cancellation arriving mid-dispatch must still
                    // cut the wait short rather than wait for dispatch to return
                    // on its own (spec §4.4/§5: cancellation propagates to any
                    // in-flight activity). `cancel` is also handed to the
                    // dispatcher itself so its own I/O can observe it.
                    let dispatch_outcome = tokio::select! {
                        _ = self.cancel.cancelled() => None,
                        result = self.dispatcher.dispatch(signal, &self.cancel) => Some(result),
                    };

                    let Some(dispatch_result) = dispatch_outcome else {
                        self.append(WaitEvent::CancelRequested { reason: "workflow cancellation".to_string() })?;
                        self.append(WaitEvent::Cancelled)?;
                        return Ok(OrchestratorOutcome { result: None, journal: self.journal });
                    };

                    match dispatch_result {
                        Ok(decision) => {
                            self.append(WaitEvent::ActivityCompleted {
                                signal_id: signal_id.clone(),
                                decision: decision.clone(),
                            })?;
                            if decision.should_continue {
                                let result = WaitResult::success(
                                    decision.signal,
                                    decision.processor_output,
                                    config.config().next_task_on_success().to_string(),
                                    self.clock.now(),
                                );
                                self.append(WaitEvent::Succeeded { result: result.clone() })?;
                                return Ok(OrchestratorOutcome { result: Some(result), journal: self.journal });
                            }
                        }
                        Err(error) => {
                            self.append(WaitEvent::ActivityFailed { signal_id, error })?;
                        }
                    }
                }
            }
        }
    }
}
