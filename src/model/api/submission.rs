use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::common::answer::Answer;
use crate::model::mongodb::Id;

use super::identity::IdentityAssertion;

/// A submission attempt: the answers plus the identity assertion that
/// vouches for the respondent. The assertion is optional at the wire level
/// so its absence can be rejected with a legible `unverified` reason
/// rather than a parse error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub answers: Vec<Answer>,
    #[serde(default)]
    pub identity_token: Option<IdentityAssertion>,
}

/// What an accepted submission returns to the respondent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub response_id: Id,
    pub submitted_at: DateTime<Utc>,
    pub confirmation_message: String,
}
