use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One wait point declared by the host workflow graph.
///
/// Deserialized from the host's YAML fragment (spec §6) after the host has
/// already parsed the surrounding graph — this crate never touches YAML
/// itself. Immutable for the lifetime of one wait-task instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaitConfig {
    pub id: String,
    pub wait_for: String,
    pub condition: String,
    #[serde(with = "humantime_duration")]
    pub timeout: Duration,
    pub processor: Option<ProcessorSpec>,
    pub on_success: ContinuationSpec,
    pub on_error: ContinuationSpec,
    pub on_timeout: Option<ContinuationSpec>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessorSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "use")]
    pub use_: Option<String>,
    #[serde(rename = "with")]
    pub with: Option<serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContinuationSpec {
    pub next: String,
}

impl WaitConfig {
    /// The continuation to route to for a given terminal status, per spec
    /// §4.4: success always routes to `on_success`; timeout prefers
    /// `on_timeout` and falls back to `on_error` when absent.
    pub fn next_task_on_success(&self) -> &str {
        &self.on_success.next
    }

    pub fn next_task_on_timeout(&self) -> &str {
        self.on_timeout
            .as_ref()
            .map(|c| c.next.as_str())
            .unwrap_or(&self.on_error.next)
    }
}

/// `serde`'s default `Duration` encoding is a struct of secs/nanos, which is
/// unreadable in a YAML/JSON config fragment. This mirrors how host configs
/// in this codebase's neighboring crates accept human-readable durations
/// (e.g. `"1h"`, `"30s"`) on the wire while keeping `std::time::Duration` as
/// the in-memory representation.
mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&humantime::format_duration(*d).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
