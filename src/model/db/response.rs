use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::common::{answer::Answer, email::Email, form::FormId};
use crate::model::mongodb::Id;

/// Core response data, as stored in the database.
///
/// A response is created exactly once per accepted submission and is
/// immutable thereafter; it is owned by its form and deleted with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseCore {
    /// The form this response belongs to.
    pub form_id: FormId,
    /// The verified, normalised address of the respondent.
    pub respondent_email: Email,
    /// When the submission was accepted.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub submitted_at: DateTime<Utc>,
    /// The answers, one per answered question.
    pub answers: Vec<Answer>,
}

impl ResponseCore {
    /// Create a new response, stamped with the current time.
    pub fn new(form_id: FormId, respondent_email: Email, answers: Vec<Answer>) -> Self {
        Self {
            form_id,
            respondent_email,
            submitted_at: Utc::now(),
            answers,
        }
    }
}

/// A response without an ID.
pub type NewResponse = ResponseCore;

/// A response from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub response: ResponseCore,
}

impl Deref for Response {
    type Target = ResponseCore;

    fn deref(&self) -> &Self::Target {
        &self.response
    }
}

impl DerefMut for Response {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.response
    }
}
