//! Explicit construction and registration of the wait-task primitive with
//! the host's task registry (spec §4.7).
//!
//! There is deliberately no module-level auto-registration (e.g. a
//! `#[ctor]`-style side effect run at process start) — the host calls
//! [`WaitTaskFactory::register`] itself, at a point of its choosing, the
//! same way the teacher's component loader is driven by an explicit call
//! rather than implicit global state.

use std::sync::Arc;

use async_trait::async_trait;
use waittask_types::host::ReplaySafeLogger;
use waittask_types::{WaitConfig, WaitTaskError};

use crate::activity::ProcessorInvoker;
use crate::config::{self, CompiledWaitConfig};
use crate::dedupe::{DedupeStore, InMemoryDedupeStore};
use crate::evaluator::Evaluator;

/// A [`ReplaySafeLogger`] that discards everything. Used only to give
/// [`WaitTaskFactory::with_defaults`] a concrete type parameter when the
/// host hasn't wired up its own logger yet.
pub struct NoopLogger;

impl ReplaySafeLogger for NoopLogger {
    fn log_event(&self, _event: &str, _fields: &[(&str, &str)]) {}
}

/// The host-side surface a wait-task registers itself against. Modeled
/// narrowly: the factory only needs to hand the host a validated config and
/// get back nothing, or an error if the host's own graph-level checks
/// reject it.
#[async_trait]
pub trait TaskRegistry: Send + Sync {
    async fn register_wait_task(&self, config: CompiledWaitConfig) -> Result<(), WaitTaskError>;
}

/// Builds and registers wait-task instances from `WaitConfig` declarations.
///
/// Holds the shared, reusable collaborators (evaluator, dedupe store,
/// optional processor invoker) that every wait-task instance in a process
/// shares, as opposed to the per-instance host boundary types
/// ([`waittask_types::host`]) that [`crate::orchestrator::WaitOrchestrator`]
/// takes directly.
pub struct WaitTaskFactory<D, P, L> {
    evaluator: Evaluator,
    dedupe_store: Arc<D>,
    processor_invoker: Option<Arc<P>>,
    logger: L,
}

impl<D, P, L> WaitTaskFactory<D, P, L>
where
    D: DedupeStore + 'static,
    P: ProcessorInvoker + 'static,
    L: ReplaySafeLogger,
{
    pub fn new(
        evaluator: Evaluator,
        dedupe_store: Arc<D>,
        processor_invoker: Option<Arc<P>>,
        logger: L,
    ) -> Self {
        Self {
            evaluator,
            dedupe_store,
            processor_invoker,
            logger,
        }
    }

    /// Validate `config` and hand it to `registry`. Does not construct an
    /// orchestrator or run anything — registration only makes the host
    /// aware the wait point exists and is well-formed; the host decides
    /// when to instantiate an orchestrator for a live workflow run.
    pub async fn register(
        &self,
        config: &WaitConfig,
        registry: &dyn TaskRegistry,
    ) -> Result<(), WaitTaskError> {
        let compiled = config::validate(config, &self.evaluator)?;
        let id = compiled.id().to_string();
        registry.register_wait_task(compiled).await?;
        self.logger.log_event("WaitTaskRegistered", &[("id", &id)]);
        Ok(())
    }

    pub fn dedupe_store(&self) -> Arc<D> {
        self.dedupe_store.clone()
    }

    pub fn processor_invoker(&self) -> Option<Arc<P>> {
        self.processor_invoker.clone()
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }
}

impl WaitTaskFactory<InMemoryDedupeStore, crate::activity::ProcessorInvokerNoop, NoopLogger> {
    /// A factory wired with the in-process defaults: no distributed dedupe
    /// store, no processor sub-task, no logger. What a host reaches for to
    /// get a wait point running before it has wired up its own
    /// Redis-backed dedupe store, processor dispatch, or logging sink.
    pub fn with_defaults(evaluator: Evaluator) -> Self {
        Self::new(evaluator, Arc::new(InMemoryDedupeStore::new()), None, NoopLogger)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct RecordingRegistry {
        registered: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TaskRegistry for RecordingRegistry {
        async fn register_wait_task(&self, config: CompiledWaitConfig) -> Result<(), WaitTaskError> {
            self.registered.lock().unwrap().push(config.id().to_string());
            Ok(())
        }
    }

    fn config() -> WaitConfig {
        WaitConfig {
            id: "wait-1".into(),
            wait_for: "approval".into(),
            condition: "signal.payload.status == 'approved'".into(),
            timeout: std::time::Duration::from_secs(60),
            processor: None,
            on_success: waittask_types::ContinuationSpec { next: "next_task".into() },
            on_error: waittask_types::ContinuationSpec { next: "error_task".into() },
            on_timeout: None,
        }
    }

    #[tokio::test]
    async fn register_validates_then_hands_to_registry() {
        let factory = WaitTaskFactory::with_defaults(Evaluator::default());
        let registry = RecordingRegistry { registered: Mutex::new(Vec::new()) };
        factory.register(&config(), &registry).await.unwrap();
        assert_eq!(registry.registered.lock().unwrap().as_slice(), ["wait-1"]);
    }

    #[tokio::test]
    async fn register_rejects_invalid_config_before_reaching_registry() {
        let factory = WaitTaskFactory::with_defaults(Evaluator::default());
        let registry = RecordingRegistry { registered: Mutex::new(Vec::new()) };
        let mut bad = config();
        bad.condition = String::new();
        assert!(factory.register(&bad, &registry).await.is_err());
        assert!(registry.registered.lock().unwrap().is_empty());
    }
}
