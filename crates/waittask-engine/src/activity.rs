//! Signal-processing activity: the one piece of non-deterministic work the
//! orchestrator ever calls out to (spec §4.3). Runs once per delivered
//! signal, behind the host's `ActivityDispatcher`/retry machinery, never
//! inline in the deterministic loop.

use async_trait::async_trait;
use waittask_types::{DecisionReason, ProcessingDecision, SignalEnvelope, WaitTaskError};

use crate::config::CompiledWaitConfig;
use crate::dedupe::DedupeStore;
use crate::evaluator::{EvalContext, Evaluator};

/// Invokes the optional processor sub-task declared in `WaitConfig.processor`.
///
/// A processor failure is captured as a non-fatal `ProcessorOutput { error }`
/// by [`SignalProcessingActivity::process`] rather than aborting the
/// activity — the predicate still gets a chance to evaluate against the raw
/// signal.
#[async_trait]
pub trait ProcessorInvoker: Send + Sync {
    async fn invoke(&self, signal: &SignalEnvelope) -> Result<serde_json::Value, String>;
}

/// Implements spec §4.3's algorithm: claim -> (optional) process -> evaluate.
pub struct SignalProcessingActivity<D, P> {
    dedupe: D,
    processor: Option<P>,
    evaluator: Evaluator,
}

impl<D, P> SignalProcessingActivity<D, P>
where
    D: DedupeStore,
    P: ProcessorInvoker,
{
    pub fn new(dedupe: D, processor: Option<P>, evaluator: Evaluator) -> Self {
        Self {
            dedupe,
            processor,
            evaluator,
        }
    }

    /// Run the activity for one delivered `signal` against `config`'s
    /// compiled predicate.
    ///
    /// `try_claim` first (spec §4.2's atomic check-and-set) — a duplicate
    /// short-circuits before the processor or evaluator ever run, since
    /// re-running either against an already-satisfied signal would be
    /// wasted (or worse, double-counted) work.
    pub async fn process(
        &self,
        signal: SignalEnvelope,
        config: &CompiledWaitConfig,
    ) -> Result<ProcessingDecision, WaitTaskError> {
        let claimed = self.dedupe.try_claim(signal.signal_id()).await?;
        if !claimed {
            return Ok(ProcessingDecision::duplicate(signal));
        }

        let processor_output = match &self.processor {
            Some(invoker) => match invoker.invoke(&signal).await {
                Ok(output) => Some(waittask_types::ProcessorOutput::success(output)),
                Err(error) => {
                    tracing::warn!(signal_id = signal.signal_id(), %error, "processor sub-task failed, evaluating raw signal");
                    Some(waittask_types::ProcessorOutput::failed(error))
                }
            },
            None => None,
        };

        let ctx = EvalContext {
            signal: &signal,
            processor: processor_output.as_ref(),
        };

        let satisfied = self
            .evaluator
            .evaluate(config.predicate(), &ctx)
            .map_err(|e| e.with_detail(format!("wait-task '{}'", config.id())))?;

        if satisfied {
            Ok(ProcessingDecision::condition_met(signal, processor_output))
        } else {
            Ok(ProcessingDecision::condition_not_met(signal, processor_output))
        }
    }
}

/// A `ProcessorInvoker` that is never actually called — used only to give
/// [`crate::factory::WaitTaskFactory::with_defaults`] a concrete type
/// parameter when no processor sub-task is configured.
pub struct ProcessorInvokerNoop;

#[async_trait]
impl ProcessorInvoker for ProcessorInvokerNoop {
    async fn invoke(&self, _signal: &SignalEnvelope) -> Result<serde_json::Value, String> {
        unreachable!("ProcessorInvokerNoop is never invoked; it exists only to satisfy WaitTaskFactory's type parameter when no processor is configured")
    }
}
