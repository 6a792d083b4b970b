use chrono::{DateTime, Utc};
use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};

use crate::model::common::form::FormSettings;

/// Why a published form stopped accepting responses.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// The response deadline passed.
    Deadline,
    /// The response cap was reached.
    MaxResponses,
}

impl CloseReason {
    /// The machine-readable reason code used on the wire.
    pub fn as_code(self) -> &'static str {
        match self {
            Self::Deadline => "deadline",
            Self::MaxResponses => "max_responses",
        }
    }
}

impl From<CloseReason> for Bson {
    fn from(reason: CloseReason) -> Self {
        to_bson(&reason).expect("Serialisation is infallible")
    }
}

/// Decide whether a published form must close, and why.
///
/// The deadline is checked before the response cap; only the first
/// applicable reason is reported. This function never reopens anything:
/// it is consulted only for forms that are currently published, and its
/// one-directional result is persisted by
/// [`sync_publication_state`](crate::model::db::form::sync_publication_state)
/// on every read and accepted write that exposes publication state.
pub fn should_close(
    settings: &FormSettings,
    response_count: u32,
    now: DateTime<Utc>,
) -> Option<CloseReason> {
    if let Some(deadline) = settings.response_deadline_at {
        if now >= deadline {
            return Some(CloseReason::Deadline);
        }
    }
    if let Some(max) = settings.max_responses {
        if response_count >= max {
            return Some(CloseReason::MaxResponses);
        }
    }
    None
}
