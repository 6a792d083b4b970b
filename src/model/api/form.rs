use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::common::{
    autoclose::CloseReason,
    form::{
        EmailNotification, FormId, FormSettings, FormState, Question, QuestionId, QuestionOption,
        QuestionType,
    },
    pages::{build_pages, FormPage},
};
use crate::model::db::{
    form::{Form, FormMetadata},
    response::Response,
};
use crate::model::mongodb::Id;

/// A form specification, as submitted by an admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSpec {
    /// Form title.
    pub title: String,
    /// Form description (markdown).
    pub description: String,
    /// Question specifications, in presentation order.
    pub questions: Vec<QuestionSpec>,
    /// Behaviour settings.
    pub settings: SettingsSpec,
}

/// Ways a form specification can be invalid.
#[derive(Debug, Error)]
pub enum FormSpecError {
    #[error("`max_responses` must be at least 1")]
    ZeroMaxResponses,
    #[error("choice question \"{0}\" must have at least one option")]
    NoOptions(String),
    #[error("section break \"{0}\" cannot be required")]
    RequiredSectionBreak(String),
    #[error("question \"{0}\" has duplicate option values")]
    DuplicateOptionValues(String),
}

impl FormSpec {
    /// Convert this spec into a proper form with unique IDs, checking the
    /// model invariants.
    pub fn into_form(self, id: FormId, now: DateTime<Utc>) -> Result<Form, FormSpecError> {
        let (title, description, questions, settings) = self.into_parts()?;
        Ok(Form {
            id,
            metadata: FormMetadata {
                title,
                description,
                state: FormState::Draft,
                closed_reason: None,
                created_at: now,
            },
            questions,
            settings,
            response_count: 0,
        })
    }

    /// Validate the spec and produce the pieces a form is built from.
    /// Question and option IDs are assigned from presentation order.
    pub fn into_parts(
        self,
    ) -> Result<(String, String, Vec<Question>, FormSettings), FormSpecError> {
        if self.settings.max_responses == Some(0) {
            return Err(FormSpecError::ZeroMaxResponses);
        }
        let questions = self
            .questions
            .into_iter()
            .enumerate()
            .map(|(i, q)| {
                let question_id = 1 + QuestionId::try_from(i).expect("usize to u32");
                q.into_question(question_id)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok((
            self.title,
            self.description,
            questions,
            self.settings.into_settings(),
        ))
    }
}

/// A question specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSpec {
    /// What kind of question this is.
    pub question_type: QuestionType,
    /// Question title.
    pub title: String,
    /// Optional longer help text.
    #[serde(default)]
    pub description: Option<String>,
    /// Must this question be answered?
    #[serde(default)]
    pub required: bool,
    /// Options for choice-type questions.
    #[serde(default)]
    pub options: Vec<OptionSpec>,
    /// Placeholder text for free-entry questions.
    #[serde(default)]
    pub placeholder: Option<String>,
    /// Upper bound of the scale for rating questions.
    #[serde(default)]
    pub max_rating: Option<u32>,
}

/// One option of a choice-type question specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionSpec {
    pub label: String,
    pub value: String,
}

impl QuestionSpec {
    /// Convert this spec into a question with the given unique ID,
    /// checking the question invariants.
    pub fn into_question(self, id: QuestionId) -> Result<Question, FormSpecError> {
        if self.question_type == QuestionType::SectionBreak && self.required {
            return Err(FormSpecError::RequiredSectionBreak(self.title));
        }
        if self.question_type.is_choice() && self.options.is_empty() {
            return Err(FormSpecError::NoOptions(self.title));
        }
        let mut seen = std::collections::HashSet::new();
        if !self.options.iter().all(|o| seen.insert(o.value.as_str())) {
            return Err(FormSpecError::DuplicateOptionValues(self.title));
        }

        let options = self
            .options
            .into_iter()
            .enumerate()
            .map(|(i, o)| QuestionOption {
                id: 1 + u32::try_from(i).expect("usize to u32"),
                label: o.label,
                value: o.value,
            })
            .collect();
        Ok(Question {
            id,
            question_type: self.question_type,
            title: self.title,
            description: self.description,
            required: self.required,
            options,
            placeholder: self.placeholder,
            max_rating: self.max_rating,
        })
    }
}

/// Form settings as they appear on the wire: identical to
/// [`FormSettings`] but with RFC 3339 datetimes instead of BSON ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsSpec {
    #[serde(default)]
    pub allow_multiple_responses: bool,
    #[serde(default)]
    pub limit_one_response: bool,
    #[serde(default = "default_true")]
    pub show_progress_bar: bool,
    pub confirmation_message: String,
    #[serde(default)]
    pub closed_message: Option<String>,
    #[serde(default)]
    pub response_deadline_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_responses: Option<u32>,
    #[serde(default)]
    pub email_notification: Option<EmailNotification>,
}

fn default_true() -> bool {
    true
}

impl SettingsSpec {
    pub fn into_settings(self) -> FormSettings {
        FormSettings {
            allow_multiple_responses: self.allow_multiple_responses,
            limit_one_response: self.limit_one_response,
            show_progress_bar: self.show_progress_bar,
            confirmation_message: self.confirmation_message,
            closed_message: self.closed_message,
            response_deadline_at: self.response_deadline_at,
            max_responses: self.max_responses,
            email_notification: self.email_notification,
        }
    }
}

impl From<FormSettings> for SettingsSpec {
    fn from(settings: FormSettings) -> Self {
        Self {
            allow_multiple_responses: settings.allow_multiple_responses,
            limit_one_response: settings.limit_one_response,
            show_progress_bar: settings.show_progress_bar,
            confirmation_message: settings.confirmation_message,
            closed_message: settings.closed_message,
            response_deadline_at: settings.response_deadline_at,
            max_responses: settings.max_responses,
            email_notification: settings.email_notification,
        }
    }
}

/// An API-friendly description of a form, as returned to admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDescription {
    pub id: FormId,
    pub title: String,
    pub description: String,
    pub state: FormState,
    pub closed_reason: Option<CloseReason>,
    pub created_at: DateTime<Utc>,
    pub questions: Vec<Question>,
    pub settings: SettingsSpec,
    pub response_count: u32,
}

impl From<Form> for FormDescription {
    fn from(form: Form) -> Self {
        Self {
            id: form.id,
            title: form.metadata.title,
            description: form.metadata.description,
            state: form.metadata.state,
            closed_reason: form.metadata.closed_reason,
            created_at: form.metadata.created_at,
            questions: form.questions,
            settings: form.settings.into(),
            response_count: form.response_count,
        }
    }
}

/// A summary of a form, shorter than the full description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSummary {
    pub id: FormId,
    pub title: String,
    pub state: FormState,
    pub closed_reason: Option<CloseReason>,
    pub created_at: DateTime<Utc>,
    pub response_count: u32,
}

impl From<Form> for FormSummary {
    fn from(form: Form) -> Self {
        Self {
            id: form.id,
            title: form.metadata.title,
            state: form.metadata.state,
            closed_reason: form.metadata.closed_reason,
            created_at: form.metadata.created_at,
            response_count: form.response_count,
        }
    }
}

/// The respondent-facing view of a form: presentation settings and the
/// derived pages, with no respondent data or notification internals.
/// Pages are only included while the form accepts responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicForm {
    pub id: FormId,
    pub title: String,
    pub description: String,
    pub state: FormState,
    pub closed_reason: Option<CloseReason>,
    pub closed_message: Option<String>,
    pub show_progress_bar: bool,
    pub pages: Vec<FormPage>,
}

impl From<Form> for PublicForm {
    fn from(form: Form) -> Self {
        let pages = if form.metadata.state == FormState::Published {
            build_pages(&form.questions)
        } else {
            Vec::new()
        };
        Self {
            id: form.id,
            title: form.metadata.title,
            description: form.metadata.description,
            state: form.metadata.state,
            closed_reason: form.metadata.closed_reason,
            closed_message: form.settings.closed_message,
            show_progress_bar: form.settings.show_progress_bar,
            pages,
        }
    }
}

/// The publication status of a form, cheap enough to poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormStatus {
    pub state: FormState,
    pub closed_reason: Option<CloseReason>,
    pub closed_message: Option<String>,
}

impl From<Form> for FormStatus {
    fn from(form: Form) -> Self {
        Self {
            state: form.metadata.state,
            closed_reason: form.metadata.closed_reason,
            closed_message: form.settings.closed_message,
        }
    }
}

/// An API-friendly description of one collected response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseDescription {
    pub id: Id,
    pub respondent_email: String,
    pub submitted_at: DateTime<Utc>,
    pub answers: Vec<crate::model::common::answer::Answer>,
}

impl From<Response> for ResponseDescription {
    fn from(response: Response) -> Self {
        Self {
            id: response.id,
            respondent_email: response.response.respondent_email.to_string(),
            submitted_at: response.response.submitted_at,
            answers: response.response.answers,
        }
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl FormSpec {
        /// A two-page feedback form with a required email question.
        pub fn example1() -> Self {
            Self {
                title: "Customer feedback".to_string(),
                description: "Tell us how we did.".to_string(),
                questions: vec![
                    QuestionSpec {
                        question_type: QuestionType::ShortText,
                        title: "Name".to_string(),
                        description: None,
                        required: false,
                        options: vec![],
                        placeholder: Some("Jo Bloggs".to_string()),
                        max_rating: None,
                    },
                    QuestionSpec {
                        question_type: QuestionType::Email,
                        title: "Email".to_string(),
                        description: None,
                        required: true,
                        options: vec![],
                        placeholder: None,
                        max_rating: None,
                    },
                    QuestionSpec {
                        question_type: QuestionType::SectionBreak,
                        title: "Your visit".to_string(),
                        description: Some("A few questions about your visit.".to_string()),
                        required: false,
                        options: vec![],
                        placeholder: None,
                        max_rating: None,
                    },
                    QuestionSpec {
                        question_type: QuestionType::Rating,
                        title: "Overall rating".to_string(),
                        description: None,
                        required: true,
                        options: vec![],
                        placeholder: None,
                        max_rating: Some(5),
                    },
                    QuestionSpec {
                        question_type: QuestionType::Checkbox,
                        title: "What did you enjoy?".to_string(),
                        description: None,
                        required: false,
                        options: vec![
                            OptionSpec {
                                label: "Service".to_string(),
                                value: "service".to_string(),
                            },
                            OptionSpec {
                                label: "Atmosphere".to_string(),
                                value: "atmosphere".to_string(),
                            },
                        ],
                        placeholder: None,
                        max_rating: None,
                    },
                ],
                settings: SettingsSpec::example(),
            }
        }

        /// A single-question form that closes after one response.
        pub fn example_capped() -> Self {
            let mut spec = Self::example_minimal();
            spec.title = "Capped form".to_string();
            spec.settings.max_responses = Some(1);
            spec
        }

        /// The smallest useful form: one optional question, no limits.
        pub fn example_minimal() -> Self {
            Self {
                title: "Quick question".to_string(),
                description: String::new(),
                questions: vec![QuestionSpec {
                    question_type: QuestionType::ShortText,
                    title: "Anything to add?".to_string(),
                    description: None,
                    required: false,
                    options: vec![],
                    placeholder: None,
                    max_rating: None,
                }],
                settings: SettingsSpec::example(),
            }
        }
    }

    impl SettingsSpec {
        pub fn example() -> Self {
            Self {
                allow_multiple_responses: false,
                limit_one_response: false,
                show_progress_bar: true,
                confirmation_message: "Thanks for responding!".to_string(),
                closed_message: Some("This form is no longer taking responses.".to_string()),
                response_deadline_at: None,
                max_responses: None,
                email_notification: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_conversion_assigns_sequential_ids() {
        let form = FormSpec::example1()
            .into_form(7, Utc::now())
            .unwrap();
        assert_eq!(form.id, 7);
        assert_eq!(form.metadata.state, FormState::Draft);
        let ids: Vec<u32> = form.questions.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        let option_ids: Vec<u32> = form.questions[4].options.iter().map(|o| o.id).collect();
        assert_eq!(option_ids, vec![1, 2]);
    }

    #[test]
    fn zero_max_responses_is_rejected() {
        let mut spec = FormSpec::example_minimal();
        spec.settings.max_responses = Some(0);
        assert!(matches!(
            spec.into_form(1, Utc::now()),
            Err(FormSpecError::ZeroMaxResponses)
        ));
    }

    #[test]
    fn choice_questions_need_options() {
        let mut spec = FormSpec::example_minimal();
        spec.questions[0].question_type = QuestionType::Dropdown;
        assert!(matches!(
            spec.into_form(1, Utc::now()),
            Err(FormSpecError::NoOptions(_))
        ));
    }

    #[test]
    fn section_breaks_cannot_be_required() {
        let mut spec = FormSpec::example_minimal();
        spec.questions[0].question_type = QuestionType::SectionBreak;
        spec.questions[0].required = true;
        assert!(matches!(
            spec.into_form(1, Utc::now()),
            Err(FormSpecError::RequiredSectionBreak(_))
        ));
    }

    #[test]
    fn duplicate_option_values_are_rejected() {
        let mut spec = FormSpec::example_minimal();
        spec.questions[0].question_type = QuestionType::MultipleChoice;
        spec.questions[0].options = vec![
            OptionSpec {
                label: "A".to_string(),
                value: "same".to_string(),
            },
            OptionSpec {
                label: "B".to_string(),
                value: "same".to_string(),
            },
        ];
        assert!(matches!(
            spec.into_form(1, Utc::now()),
            Err(FormSpecError::DuplicateOptionValues(_))
        ));
    }

    #[test]
    fn public_form_of_a_published_form_carries_pages() {
        let mut form = FormSpec::example1().into_form(1, Utc::now()).unwrap();
        form.metadata.state = FormState::Published;
        let public = PublicForm::from(form);
        assert_eq!(public.pages.len(), 2);
        assert_eq!(public.pages[0].questions.len(), 2);
        assert_eq!(public.pages[1].title.as_deref(), Some("Your visit"));
    }
}
