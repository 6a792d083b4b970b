use serde::{Deserialize, Serialize};

use crate::model::common::form::QuestionId;

/// The kinds of question a form can contain.
///
/// `SectionBreak` is a pseudo-question: it terminates the current page and
/// begins a new, optionally titled one, and never carries an answer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    ShortText,
    LongText,
    MultipleChoice,
    Checkbox,
    Dropdown,
    Rating,
    Date,
    Time,
    Email,
    Phone,
    Number,
    FileUpload,
    SectionBreak,
}

impl QuestionType {
    /// Can a respondent answer this question at all?
    pub fn is_answerable(self) -> bool {
        self != Self::SectionBreak
    }

    /// Does this question present a fixed set of options to pick from?
    pub fn is_choice(self) -> bool {
        matches!(self, Self::MultipleChoice | Self::Checkbox | Self::Dropdown)
    }
}

/// A single question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Question unique ID.
    pub id: QuestionId,
    /// What kind of question this is.
    pub question_type: QuestionType,
    /// Question title, shown as the field label.
    pub title: String,
    /// Optional longer help text.
    pub description: Option<String>,
    /// Must this question be answered before submission?
    pub required: bool,
    /// Options for choice-type questions; empty otherwise.
    pub options: Vec<QuestionOption>,
    /// Placeholder text for free-entry questions.
    pub placeholder: Option<String>,
    /// Upper bound of the scale for rating questions.
    pub max_rating: Option<u32>,
}

/// One selectable option of a choice-type question.
/// Values are unique within the question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: u32,
    pub label: String,
    pub value: String,
}
