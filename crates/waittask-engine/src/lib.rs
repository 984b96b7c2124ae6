pub mod activity;
pub mod config;
pub mod dedupe;
pub mod evaluator;
pub mod factory;
pub mod orchestrator;

pub use activity::{ProcessorInvoker, SignalProcessingActivity};
pub use config::{CompiledWaitConfig, validate};
pub use dedupe::{DedupeStore, InMemoryDedupeStore};
pub use evaluator::{CompiledPredicate, EvalContext, Evaluator, Value};
pub use factory::{NoopLogger, TaskRegistry, WaitTaskFactory};
pub use orchestrator::{OrchestratorOutcome, WaitOrchestrator};
