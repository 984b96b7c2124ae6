use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::processor::ProcessorOutput;
use crate::signal::SignalEnvelope;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitStatus {
    Success,
    Timeout,
    /// Config failed pre-flight validation (spec §4.4's `Failed(InvalidConfig)`
    /// terminal state) — the wait-task never entered `Waiting` at all.
    Failed,
}

/// Terminal outcome of one wait-task instance, emitted exactly once.
///
/// `status == Success` implies `signal.is_some()`; `next_task` is derived
/// from the wait-task's config per `status` (see `WaitConfig::next_task`).
/// `status == Failed` carries no `signal`/`processor_output` — it is only
/// ever produced by config validation failing before the orchestrator loop
/// starts, so no signal was ever delivered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaitResult {
    pub status: WaitStatus,
    pub signal: Option<SignalEnvelope>,
    #[serde(rename = "processor_output")]
    pub processor_output: Option<ProcessorOutput>,
    pub next_task: String,
    pub completed_at: DateTime<Utc>,
}

impl WaitResult {
    pub fn success(
        signal: SignalEnvelope,
        processor_output: Option<ProcessorOutput>,
        next_task: String,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            status: WaitStatus::Success,
            signal: Some(signal),
            processor_output,
            next_task,
            completed_at,
        }
    }

    pub fn timeout(next_task: String, completed_at: DateTime<Utc>) -> Self {
        Self {
            status: WaitStatus::Timeout,
            signal: None,
            processor_output: None,
            next_task,
            completed_at,
        }
    }

    /// Routes to `config.on_error.next` per spec §4.4/§7: an `InvalidConfig`
    /// failure terminates the wait-task immediately, before it ever
    /// subscribes to a signal channel or arms a timer.
    pub fn failed(next_task: String, completed_at: DateTime<Utc>) -> Self {
        Self {
            status: WaitStatus::Failed,
            signal: None,
            processor_output: None,
            next_task,
            completed_at,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        match self.status {
            WaitStatus::Success => self.signal.is_some(),
            WaitStatus::Timeout | WaitStatus::Failed => true,
        }
    }
}
