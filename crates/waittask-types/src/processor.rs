use serde::{Deserialize, Serialize};

/// Result of the optional processor sub-task transform applied to a raw
/// signal before predicate evaluation.
///
/// If the processor is declared and fails, `error` is populated and
/// `output` may be absent — the orchestration treats this as non-fatal and
/// proceeds to evaluate the predicate against the raw signal only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessorOutput {
    pub output: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl ProcessorOutput {
    pub fn success(output: serde_json::Value) -> Self {
        Self {
            output: Some(output),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            output: None,
            error: Some(error.into()),
        }
    }

    pub fn failed_with_output(output: serde_json::Value, error: impl Into<String>) -> Self {
        Self {
            output: Some(output),
            error: Some(error.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}
