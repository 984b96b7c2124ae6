pub mod config;
pub mod decision;
pub mod error;
pub mod host;
pub mod processor;
pub mod result;
pub mod signal;

pub use config::{ContinuationSpec, ProcessorSpec, WaitConfig};
pub use decision::{DecisionReason, ProcessingDecision};
pub use error::{ErrorKind, WaitTaskError};
pub use processor::ProcessorOutput;
pub use result::{WaitResult, WaitStatus};
pub use signal::{SignalEnvelope, SignalMetadata};
