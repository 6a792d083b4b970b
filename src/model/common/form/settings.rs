use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::mongodb::serde_option_datetime;

/// Per-form behaviour settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSettings {
    /// May one respondent submit more than once?
    pub allow_multiple_responses: bool,
    /// Require identity verification before any answer is accepted.
    pub limit_one_response: bool,
    /// Show a progress bar while filling in the form.
    pub show_progress_bar: bool,
    /// Message shown after a successful submission.
    pub confirmation_message: String,
    /// Message shown instead of the form once it has closed.
    pub closed_message: Option<String>,
    /// Stop accepting responses at this time.
    #[serde(with = "serde_option_datetime")]
    pub response_deadline_at: Option<DateTime<Utc>>,
    /// Stop accepting responses once this many have been collected.
    /// Always at least 1 when present.
    pub max_responses: Option<u32>,
    /// Receipt email sent to the respondent after acceptance.
    pub email_notification: Option<EmailNotification>,
}

/// Settings for the post-submission receipt email.
///
/// Subject and message are templates; `{{email}}`, `{{form_title}}` and
/// `{{submitted_at}}` are substituted at send time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailNotification {
    pub enabled: bool,
    pub subject: String,
    pub message: String,
}

/// Values available to receipt templates.
pub struct ReceiptVars<'a> {
    pub email: &'a str,
    pub form_title: &'a str,
    pub submitted_at: DateTime<Utc>,
}

impl EmailNotification {
    /// Render the subject and message templates for one receipt.
    pub fn render(&self, vars: &ReceiptVars<'_>) -> (String, String) {
        (substitute(&self.subject, vars), substitute(&self.message, vars))
    }
}

fn substitute(template: &str, vars: &ReceiptVars<'_>) -> String {
    template
        .replace("{{email}}", vars.email)
        .replace("{{form_title}}", vars.form_title)
        .replace("{{submitted_at}}", &vars.submitted_at.to_rfc3339())
}
