use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::common::answer::{Answer, AnswerValue};
use crate::model::common::form::{FormSettings, Question, QuestionId, QuestionType};

/// The result of validating a set of answers. Validation is total: it
/// always produces an outcome, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// A single problem found while validating, in question order.
/// Callers typically surface only the first to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub question_id: Option<QuestionId>,
    pub question_title: Option<String>,
    pub message: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A required question has no answer, or an empty one.
    MissingRequired,
    /// An answer's value has the wrong shape for its question type.
    TypeMismatch,
    /// A rating lies outside the question's scale.
    OutOfRange,
    /// An answer references a question the form does not contain.
    UnknownQuestion,
    /// An answer references a section break, which takes no answer.
    NotAnswerable,
    /// The form limits respondents to one response, and no identity token
    /// was supplied. Distinct so callers can prompt verification rather
    /// than point at a field.
    IdentityRequired,
}

/// Validate the answers for a single page of the form.
///
/// `scope` is the IDs of the questions on the page being left; only those
/// questions are checked. Identity is never a page-level concern.
pub fn validate_page(
    questions: &[Question],
    answers: &[Answer],
    scope: &[QuestionId],
) -> ValidationOutcome {
    let by_id = index_answers(answers);
    let issues = questions
        .iter()
        .filter(|question| scope.contains(&question.id))
        .filter_map(|question| check_question(question, by_id.get(&question.id).copied()))
        .collect();
    ValidationOutcome { issues }
}

/// Validate a whole submission.
///
/// Every answerable question is checked, answers addressed to unknown or
/// section-break questions are rejected, and if the form limits
/// respondents to one response an identity token must accompany the
/// submission.
pub fn validate_submission(
    questions: &[Question],
    settings: &FormSettings,
    answers: &[Answer],
    identity_token: Option<&str>,
) -> ValidationOutcome {
    let by_id = index_answers(answers);
    let mut issues: Vec<ValidationIssue> = questions
        .iter()
        .filter_map(|question| check_question(question, by_id.get(&question.id).copied()))
        .collect();

    for answer in answers {
        let target = questions.iter().find(|q| q.id == answer.question_id);
        match target {
            None => issues.push(ValidationIssue {
                kind: IssueKind::UnknownQuestion,
                question_id: Some(answer.question_id),
                question_title: None,
                message: format!("This form has no question {}", answer.question_id),
            }),
            Some(question) if !question.question_type.is_answerable() => {
                issues.push(ValidationIssue {
                    kind: IssueKind::NotAnswerable,
                    question_id: Some(question.id),
                    question_title: Some(question.title.clone()),
                    message: "Section breaks cannot be answered".to_string(),
                })
            }
            Some(_) => {}
        }
    }

    if settings.limit_one_response && identity_token.map_or(true, str::is_empty) {
        issues.push(ValidationIssue {
            kind: IssueKind::IdentityRequired,
            question_id: None,
            question_title: None,
            message: "This form requires identity verification before submitting".to_string(),
        });
    }

    ValidationOutcome { issues }
}

/// The shared per-question predicate behind both entry points.
fn check_question(question: &Question, answer: Option<&AnswerValue>) -> Option<ValidationIssue> {
    // Section breaks carry no answer and are checked separately.
    if !question.question_type.is_answerable() {
        return None;
    }

    let issue = |kind, message: String| {
        Some(ValidationIssue {
            kind,
            question_id: Some(question.id),
            question_title: Some(question.title.clone()),
            message,
        })
    };

    match answer {
        None => {
            if question.required {
                issue(
                    IssueKind::MissingRequired,
                    format!("\"{}\" requires an answer", question.title),
                )
            } else {
                None
            }
        }
        Some(value) => {
            if !value.conforms_to(question.question_type) {
                return issue(
                    IssueKind::TypeMismatch,
                    format!("The answer to \"{}\" has the wrong shape", question.title),
                );
            }
            if question.required && value.is_empty() {
                return issue(
                    IssueKind::MissingRequired,
                    format!("\"{}\" requires an answer", question.title),
                );
            }
            if let (AnswerValue::Number(rating), Some(max)) = (value, question.max_rating) {
                if question.question_type == QuestionType::Rating
                    && (*rating < 1.0 || *rating > f64::from(max))
                {
                    return issue(
                        IssueKind::OutOfRange,
                        format!("\"{}\" must be rated between 1 and {}", question.title, max),
                    );
                }
            }
            None
        }
    }
}

/// Index answers by question ID. A later answer for the same question
/// supersedes an earlier one.
fn index_answers(answers: &[Answer]) -> HashMap<QuestionId, &AnswerValue> {
    answers
        .iter()
        .map(|answer| (answer.question_id, &answer.value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::common::form::{QuestionOption, QuestionType};

    fn settings() -> FormSettings {
        FormSettings {
            allow_multiple_responses: false,
            limit_one_response: false,
            show_progress_bar: true,
            confirmation_message: "Thanks!".to_string(),
            closed_message: None,
            response_deadline_at: None,
            max_responses: None,
            email_notification: None,
        }
    }

    fn question(id: u32, question_type: QuestionType, title: &str, required: bool) -> Question {
        Question {
            id,
            question_type,
            title: title.to_string(),
            description: None,
            required,
            options: if question_type.is_choice() {
                vec![QuestionOption {
                    id: 1,
                    label: "Yes".to_string(),
                    value: "yes".to_string(),
                }]
            } else {
                Vec::new()
            },
            placeholder: None,
            max_rating: (question_type == QuestionType::Rating).then_some(5),
        }
    }

    fn text_answer(question_id: u32, text: &str) -> Answer {
        Answer {
            question_id,
            value: AnswerValue::Text(text.to_string()),
        }
    }

    #[test]
    fn no_required_questions_validates_anything() {
        let questions = vec![question(1, QuestionType::ShortText, "Name", false)];
        assert!(validate_page(&questions, &[], &[1]).is_valid());
        assert!(validate_submission(&questions, &settings(), &[], None).is_valid());
    }

    #[test]
    fn missing_required_answer_is_reported_with_the_title() {
        let questions = vec![question(1, QuestionType::Email, "Email", true)];
        let outcome = validate_submission(&questions, &settings(), &[], None);
        assert!(!outcome.is_valid());
        assert_eq!(outcome.issues.len(), 1);
        let issue = &outcome.issues[0];
        assert_eq!(issue.kind, IssueKind::MissingRequired);
        assert_eq!(issue.question_title.as_deref(), Some("Email"));
        assert!(issue.message.contains("Email"));
    }

    #[test]
    fn empty_string_and_empty_selection_fail_required() {
        let questions = vec![
            question(1, QuestionType::ShortText, "Name", true),
            question(2, QuestionType::Checkbox, "Toppings", true),
        ];
        let answers = vec![
            text_answer(1, ""),
            Answer {
                question_id: 2,
                value: AnswerValue::Selection(vec![]),
            },
        ];
        let outcome = validate_submission(&questions, &settings(), &answers, None);
        assert_eq!(outcome.issues.len(), 2);
        assert!(outcome
            .issues
            .iter()
            .all(|i| i.kind == IssueKind::MissingRequired));
    }

    #[test]
    fn all_violations_are_collected_in_question_order() {
        let questions = vec![
            question(1, QuestionType::ShortText, "First", true),
            question(2, QuestionType::ShortText, "Second", true),
            question(3, QuestionType::ShortText, "Third", true),
        ];
        let outcome = validate_submission(&questions, &settings(), &[], None);
        let titles: Vec<_> = outcome
            .issues
            .iter()
            .map(|i| i.question_title.clone().unwrap())
            .collect();
        assert_eq!(titles, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn page_scope_only_checks_in_scope_questions() {
        let questions = vec![
            question(1, QuestionType::ShortText, "Page one", true),
            question(2, QuestionType::ShortText, "Page two", true),
        ];
        let outcome = validate_page(&questions, &[text_answer(1, "done")], &[1]);
        assert!(outcome.is_valid());

        let outcome = validate_page(&questions, &[], &[1]);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].question_id, Some(1));
    }

    #[test]
    fn page_validation_never_checks_identity() {
        let mut limited = settings();
        limited.limit_one_response = true;
        let questions = vec![question(1, QuestionType::ShortText, "Q", false)];
        // Page validation has no identity parameter at all; the submission
        // variant with the same inputs must reject.
        assert!(validate_page(&questions, &[], &[1]).is_valid());
        let outcome = validate_submission(&questions, &limited, &[], None);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].kind, IssueKind::IdentityRequired);
    }

    #[test]
    fn identity_rejection_ignores_answer_completeness() {
        let mut limited = settings();
        limited.limit_one_response = true;
        let questions = vec![question(1, QuestionType::ShortText, "Q", true)];
        let answers = vec![text_answer(1, "complete")];

        let outcome = validate_submission(&questions, &limited, &answers, None);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].kind, IssueKind::IdentityRequired);

        let outcome = validate_submission(&questions, &limited, &answers, Some(""));
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].kind, IssueKind::IdentityRequired);

        let outcome = validate_submission(&questions, &limited, &answers, Some("token"));
        assert!(outcome.is_valid());
    }

    #[test]
    fn unknown_and_unanswerable_targets_are_rejected() {
        let questions = vec![
            question(1, QuestionType::ShortText, "Q", false),
            question(2, QuestionType::SectionBreak, "Part two", false),
        ];
        let answers = vec![text_answer(99, "stray"), text_answer(2, "not allowed")];
        let outcome = validate_submission(&questions, &settings(), &answers, None);
        let kinds: Vec<_> = outcome.issues.iter().map(|i| i.kind).collect();
        assert!(kinds.contains(&IssueKind::UnknownQuestion));
        assert!(kinds.contains(&IssueKind::NotAnswerable));
    }

    #[test]
    fn wrong_shape_is_a_type_mismatch() {
        let questions = vec![question(1, QuestionType::Checkbox, "Pick", false)];
        let outcome =
            validate_submission(&questions, &settings(), &[text_answer(1, "oops")], None);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].kind, IssueKind::TypeMismatch);
    }

    #[test]
    fn rating_bounds_are_enforced() {
        let questions = vec![question(1, QuestionType::Rating, "Stars", false)];
        let ok = Answer {
            question_id: 1,
            value: AnswerValue::Number(5.0),
        };
        assert!(validate_submission(&questions, &settings(), &[ok], None).is_valid());

        let too_big = Answer {
            question_id: 1,
            value: AnswerValue::Number(6.0),
        };
        let outcome = validate_submission(&questions, &settings(), &[too_big], None);
        assert_eq!(outcome.issues[0].kind, IssueKind::OutOfRange);
    }
}
