use serde::{Deserialize, Serialize};

use crate::model::common::form::{QuestionId, QuestionType};

/// One respondent's answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// The question being answered.
    pub question_id: QuestionId,
    /// The answer itself.
    pub value: AnswerValue,
}

/// The closed set of shapes an answer value can take.
///
/// Checkbox questions collect a selection of option values; rating and
/// number questions collect a number; everything else answerable collects
/// text (file uploads store the uploaded file's URL as opaque text).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Selection(Vec<String>),
    Number(f64),
    Null,
}

impl AnswerValue {
    /// Is this answer empty for the purposes of required-field validation?
    ///
    /// Empty means null, the empty string (no trimming), or an empty
    /// selection. Any number counts as a value.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.is_empty(),
            Self::Selection(values) => values.is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Does this value have the right shape for the given question type?
    ///
    /// Null conforms to every answerable type; emptiness is judged
    /// separately. Section breaks accept no value at all.
    pub fn conforms_to(&self, question_type: QuestionType) -> bool {
        use QuestionType::*;
        match question_type {
            SectionBreak => false,
            Checkbox => matches!(self, Self::Selection(_) | Self::Null),
            Rating | Number => matches!(self, Self::Number(_) | Self::Null),
            ShortText | LongText | MultipleChoice | Dropdown | Date | Time | Email | Phone
            | FileUpload => matches!(self, Self::Text(_) | Self::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emptiness() {
        assert!(AnswerValue::Null.is_empty());
        assert!(AnswerValue::Text(String::new()).is_empty());
        assert!(AnswerValue::Selection(vec![]).is_empty());
        // No trimming: whitespace counts as an answer.
        assert!(!AnswerValue::Text(" ".to_string()).is_empty());
        assert!(!AnswerValue::Number(0.0).is_empty());
        assert!(!AnswerValue::Selection(vec!["a".to_string()]).is_empty());
    }

    #[test]
    fn shapes_follow_question_types() {
        let text = AnswerValue::Text("hello".to_string());
        let selection = AnswerValue::Selection(vec!["a".to_string()]);
        let number = AnswerValue::Number(3.0);

        assert!(text.conforms_to(QuestionType::ShortText));
        assert!(text.conforms_to(QuestionType::FileUpload));
        assert!(!text.conforms_to(QuestionType::Checkbox));

        assert!(selection.conforms_to(QuestionType::Checkbox));
        assert!(!selection.conforms_to(QuestionType::Dropdown));

        assert!(number.conforms_to(QuestionType::Rating));
        assert!(number.conforms_to(QuestionType::Number));
        assert!(!number.conforms_to(QuestionType::LongText));

        // Nothing conforms to a section break.
        assert!(!AnswerValue::Null.conforms_to(QuestionType::SectionBreak));
    }

    #[test]
    fn untagged_json_round_trip() {
        let answers = vec![
            AnswerValue::Text("free text".to_string()),
            AnswerValue::Selection(vec!["x".to_string(), "y".to_string()]),
            AnswerValue::Number(4.0),
            AnswerValue::Null,
        ];
        for value in answers {
            let json = rocket::serde::json::serde_json::to_string(&value).unwrap();
            let back: AnswerValue = rocket::serde::json::serde_json::from_str(&json).unwrap();
            assert_eq!(value, back);
        }
    }
}
