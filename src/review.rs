use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::QuizError;
use crate::models::{ResultRecord, SelectedQuestion, Subject};

pub const SKIPPED_LABEL: &str = "Skipped";
pub const SKIPPED_TIMEOUT_LABEL: &str = "Skipped (Time Out)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Correct,
    Incorrect,
    Skipped,
}

#[derive(Debug, Clone)]
pub struct NumberedSection<'a> {
    pub subject: Subject,
    pub questions: Vec<(u32, &'a SelectedQuestion)>,
}

/// Groups questions by subject in canonical order and numbers them 1.. across
/// all groups. The quiz page and the review both lay questions out with this,
/// so a question keeps its number from one page to the next.
pub fn numbered_sections(questions: &[SelectedQuestion]) -> Vec<NumberedSection<'_>> {
    let mut groups: BTreeMap<&Subject, Vec<&SelectedQuestion>> = BTreeMap::new();
    for q in questions {
        groups.entry(q.subject()).or_default().push(q);
    }

    let mut number = 0u32;
    groups
        .into_iter()
        .map(|(subject, group)| NumberedSection {
            subject: subject.clone(),
            questions: group
                .into_iter()
                .map(|q| {
                    number += 1;
                    (number, q)
                })
                .collect(),
        })
        .collect()
}

pub fn classify(user_answer: Option<&str>, correct_answer: &str) -> Classification {
    match user_answer {
        None => Classification::Skipped,
        Some(a) if a == correct_answer => Classification::Correct,
        Some(_) => Classification::Incorrect,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionReview {
    pub text: String,
    pub is_correct: bool,
    pub selected_wrong: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionReview {
    pub display_number: u32,
    pub quiz_index: usize,
    pub question_text: String,
    pub options: Vec<OptionReview>,
    pub correct_answer: String,
    pub user_answer: Option<String>,
    pub classification: Classification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped_label: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectReview {
    pub subject: Subject,
    pub heading: String,
    pub questions: Vec<QuestionReview>,
}

pub fn review(result: &ResultRecord) -> Result<Vec<SubjectReview>, QuizError> {
    result
        .check_integrity()
        .map_err(|issues| QuizError::InvalidResultRecord {
            details: issues.into_iter().map(Into::into).collect(),
        })?;

    let sections = numbered_sections(&result.questions)
        .into_iter()
        .map(|section| SubjectReview {
            heading: format!("{} Review", section.subject),
            subject: section.subject,
            questions: section
                .questions
                .into_iter()
                .map(|(display_number, q)| review_question(display_number, q, result))
                .collect(),
        })
        .collect();
    Ok(sections)
}

fn review_question(display_number: u32, q: &SelectedQuestion, result: &ResultRecord) -> QuestionReview {
    let user_answer = result.answers.get(&q.quiz_index).cloned();
    let correct_answer = &q.record.answer;
    let classification = classify(user_answer.as_deref(), correct_answer);

    let options = q
        .record
        .options
        .iter()
        .map(|text| OptionReview {
            text: text.clone(),
            is_correct: text == correct_answer,
            selected_wrong: classification == Classification::Incorrect
                && user_answer.as_deref() == Some(text.as_str()),
        })
        .collect();

    let skipped_label = (classification == Classification::Skipped).then_some(if result.timed_out {
        SKIPPED_TIMEOUT_LABEL
    } else {
        SKIPPED_LABEL
    });

    QuestionReview {
        display_number,
        quiz_index: q.quiz_index,
        question_text: q.record.question.clone(),
        options,
        correct_answer: correct_answer.clone(),
        user_answer,
        classification,
        skipped_label,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationCounts {
    pub correct: usize,
    pub incorrect: usize,
    pub skipped: usize,
}

impl ClassificationCounts {
    pub fn from_reviews(sections: &[SubjectReview]) -> Self {
        let mut counts = Self::default();
        for q in sections.iter().flat_map(|s| &s.questions) {
            match q.classification {
                Classification::Correct => counts.correct += 1,
                Classification::Incorrect => counts.incorrect += 1,
                Classification::Skipped => counts.skipped += 1,
            }
        }
        counts
    }
}
