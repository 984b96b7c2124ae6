use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One delivery of an external signal to a specific workflow instance.
///
/// `metadata.signal_id` is the unit the dedupe store keys on — it must
/// uniquely identify this logical delivery, whether client-supplied or
/// server-assigned at publish time. `received_at_utc` is stamped once, at
/// intake, and never recomputed on replay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalEnvelope {
    pub payload: serde_json::Value,
    pub metadata: SignalMetadata,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalMetadata {
    pub signal_id: String,
    pub received_at_utc: DateTime<Utc>,
    pub workflow_id: String,
    pub source: Option<String>,
}

impl SignalEnvelope {
    pub fn new(payload: serde_json::Value, metadata: SignalMetadata) -> Self {
        Self { payload, metadata }
    }

    pub fn signal_id(&self) -> &str {
        &self.metadata.signal_id
    }
}

impl SignalMetadata {
    /// Mint a server-assigned `signal_id` for a publish request that omitted
    /// one (spec §4.5/§6: "response includes the server-assigned `signal_id`
    /// if the client omitted it"). The host's publish handler is the only
    /// caller — this crate never generates an id on the orchestrator's or
    /// activity's behalf.
    pub fn generate_signal_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}
