use chrono::{DateTime, Utc};
use mongodb::bson::{doc, serde_helpers::chrono_datetime_as_bson_datetime};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::common::{
    autoclose::{should_close, CloseReason},
    form::{FormId, FormSettings, FormState, Question},
};
use crate::model::mongodb::{u32_id_filter, Coll};

/// A form as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    /// Unique ID.
    #[serde(rename = "_id")]
    pub id: FormId,
    /// Top-level metadata.
    #[serde(flatten)]
    pub metadata: FormMetadata,
    /// The ordered question list.
    pub questions: Vec<Question>,
    /// Behaviour settings.
    pub settings: FormSettings,
    /// How many responses have been accepted.
    pub response_count: u32,
}

/// A view on just the form's top-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormMetadata {
    /// Form title.
    pub title: String,
    /// Form description (markdown).
    pub description: String,
    /// Publication state.
    pub state: FormState,
    /// Why the form closed; always present iff the state is `Closed`.
    pub closed_reason: Option<CloseReason>,
    /// When the form was created.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Form {
    pub fn is_published(&self) -> bool {
        self.metadata.state == FormState::Published
    }
}

/// Re-run the auto-close evaluator for the given form and persist the
/// transition if one fired, returning the up-to-date form.
///
/// This must run before the publication state is exposed to any caller
/// (public fetch, status check, submission attempt, admin reads):
/// skipping it risks serving a form whose deadline has already passed.
/// Closure is one-directional; drafts and already-closed forms pass
/// through untouched.
pub async fn sync_publication_state(form: Form, forms: &Coll<Form>) -> Result<Form> {
    if form.metadata.state != FormState::Published {
        return Ok(form);
    }
    let reason = match should_close(&form.settings, form.response_count, Utc::now()) {
        Some(reason) => reason,
        None => return Ok(form),
    };

    let mut filter = u32_id_filter(form.id);
    filter.insert("state", FormState::Published);
    let update = doc! {
        "$set": {
            "state": FormState::Closed,
            "closed_reason": reason,
        }
    };
    forms.update_one(filter, update, None).await?;
    info!("Form {} auto-closed ({})", form.id, reason.as_code());

    let mut form = form;
    form.metadata.state = FormState::Closed;
    form.metadata.closed_reason = Some(reason);
    Ok(form)
}
