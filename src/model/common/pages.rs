use serde::{Deserialize, Serialize};

use crate::model::common::form::{Question, QuestionType};

/// A derived grouping of consecutive answerable questions, presented
/// together before the respondent advances.
///
/// Pages are never persisted; they are recomputed from the question list
/// whenever it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormPage {
    /// 1-based position of this page within the form.
    pub index: u32,
    /// Title of the section break that opened this page, if any.
    pub title: Option<String>,
    /// Description of the section break that opened this page, if any.
    pub description: Option<String>,
    /// The answerable questions on this page, in form order.
    pub questions: Vec<Question>,
}

impl FormPage {
    fn untitled() -> Self {
        Self {
            index: 0,
            title: None,
            description: None,
            questions: Vec::new(),
        }
    }

    fn from_break(section_break: &Question) -> Self {
        Self {
            index: 0,
            title: (!section_break.title.is_empty()).then(|| section_break.title.clone()),
            description: section_break.description.clone(),
            questions: Vec::new(),
        }
    }

    /// A page that presents nothing: no questions, no title, no description.
    fn is_blank(&self) -> bool {
        self.questions.is_empty() && self.title.is_none() && self.description.is_none()
    }
}

/// Split a question sequence into ordered pages at section-break markers.
///
/// Each section break flushes the page accumulated so far (only if it holds
/// at least one question, or nothing has been flushed yet) and opens a new
/// page titled from the break; the break itself joins no page. The result
/// always contains at least one page, blank pages that would appear as
/// empty navigable steps are dropped, and every answerable question lands
/// on exactly one page in its original order.
pub fn build_pages(questions: &[Question]) -> Vec<FormPage> {
    let mut pages: Vec<FormPage> = Vec::new();
    let mut current = FormPage::untitled();

    for question in questions {
        if question.question_type == QuestionType::SectionBreak {
            if !current.questions.is_empty() || pages.is_empty() {
                pages.push(current);
            }
            current = FormPage::from_break(question);
        } else {
            current.questions.push(question.clone());
        }
    }
    if !current.questions.is_empty() || pages.is_empty() {
        pages.push(current);
    }

    // Drop pages that present nothing, keeping at least one page even for
    // an empty or all-section-break form.
    if pages.iter().any(|page| !page.is_blank()) {
        pages.retain(|page| !page.is_blank());
    } else {
        pages.truncate(1);
    }

    for (position, page) in pages.iter_mut().enumerate() {
        page.index = position as u32 + 1;
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: u32, title: &str) -> Question {
        Question {
            id,
            question_type: QuestionType::ShortText,
            title: title.to_string(),
            description: None,
            required: false,
            options: Vec::new(),
            placeholder: None,
            max_rating: None,
        }
    }

    fn section_break(id: u32, title: &str) -> Question {
        Question {
            id,
            question_type: QuestionType::SectionBreak,
            title: title.to_string(),
            description: None,
            required: false,
            options: Vec::new(),
            placeholder: None,
            max_rating: None,
        }
    }

    #[test]
    fn empty_form_yields_one_untitled_page() {
        let pages = build_pages(&[]);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].index, 1);
        assert!(pages[0].title.is_none());
        assert!(pages[0].questions.is_empty());
    }

    #[test]
    fn form_without_breaks_is_a_single_page() {
        let questions = vec![question(1, "a"), question(2, "b")];
        let pages = build_pages(&questions);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].questions, questions);
    }

    #[test]
    fn splits_at_section_break() {
        // One break in the middle of a four-question list: two pages of
        // sizes [2, remaining].
        let questions = vec![
            question(1, "a"),
            question(2, "b"),
            section_break(3, "Part two"),
            question(4, "c"),
        ];
        let pages = build_pages(&questions);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].questions.len(), 2);
        assert_eq!(pages[0].title, None);
        assert_eq!(pages[1].questions.len(), 1);
        assert_eq!(pages[1].title.as_deref(), Some("Part two"));
        assert_eq!(pages[1].index, 2);
    }

    #[test]
    fn breaks_never_appear_on_pages_and_order_is_kept() {
        let questions = vec![
            question(1, "a"),
            section_break(2, "s1"),
            question(3, "b"),
            question(4, "c"),
            section_break(5, "s2"),
            question(6, "d"),
        ];
        let pages = build_pages(&questions);

        let flattened: Vec<u32> = pages
            .iter()
            .flat_map(|p| p.questions.iter().map(|q| q.id))
            .collect();
        assert_eq!(flattened, vec![1, 3, 4, 6]);
        for page in &pages {
            assert!(page
                .questions
                .iter()
                .all(|q| q.question_type != QuestionType::SectionBreak));
        }
    }

    #[test]
    fn consecutive_untitled_breaks_collapse_to_one_page() {
        let questions = vec![section_break(1, ""), section_break(2, ""), section_break(3, "")];
        let pages = build_pages(&questions);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].questions.is_empty());
    }

    #[test]
    fn leading_break_does_not_leave_a_blank_first_page() {
        let questions = vec![section_break(1, "Intro"), question(2, "a")];
        let pages = build_pages(&questions);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].title.as_deref(), Some("Intro"));
        assert_eq!(pages[0].questions.len(), 1);
        assert_eq!(pages[0].index, 1);
    }

    #[test]
    fn always_at_least_one_page() {
        let inputs: Vec<Vec<Question>> = vec![
            vec![],
            vec![section_break(1, "")],
            vec![section_break(1, ""), section_break(2, "")],
            vec![question(1, "a")],
        ];
        for questions in inputs {
            assert!(!build_pages(&questions).is_empty());
        }
    }
}
