//! Snapshot serialization: full session state to/from JSON.
//!
//! A snapshot is written every `snapshot_interval` committed commands,
//! inside the same transaction as that command. It captures everything
//! needed to resume the session without replaying its event log.

use crate::{
    error::PlanResult,
    state::AppState,
    types::{Seq, SessionId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub seq:        Seq,
    pub state:      AppState,
}

impl SessionSnapshot {
    pub fn to_json(&self) -> PlanResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> PlanResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Whether the command numbered `seq` should be followed by a snapshot.
pub fn is_due(seq: Seq, interval: Seq) -> bool {
    interval > 0 && seq > 0 && seq % interval == 0
}
