use once_cell::sync::OnceCell;
use std::collections::BTreeSet;

use crate::error::QuizError;
use crate::models::{validate_questions, QuestionRecord, Subject};

static SEE_QUESTIONS_RAW: &str = include_str!("../data/see_questions.json");
static SEE_STORE: OnceCell<QuestionStore> = OnceCell::new();

#[derive(Debug, Clone)]
pub struct QuestionStore {
    questions: Vec<QuestionRecord>,
}

impl QuestionStore {
    pub fn from_json(raw: &str) -> Result<Self, QuizError> {
        let questions: Vec<QuestionRecord> =
            serde_json::from_str(raw).map_err(|e| QuizError::StoreUnavailable {
                message: format!("question bank is not valid json: {e}"),
                details: Vec::new(),
            })?;
        Self::from_records(questions)
    }

    pub fn from_records(questions: Vec<QuestionRecord>) -> Result<Self, QuizError> {
        if let Err(issues) = validate_questions(&questions) {
            return Err(QuizError::StoreUnavailable {
                message: "question bank failed validation".into(),
                details: issues.into_iter().map(Into::into).collect(),
            });
        }
        Ok(Self { questions })
    }

    pub fn embedded() -> Result<&'static QuestionStore, QuizError> {
        SEE_STORE.get_or_try_init(|| Self::from_json(SEE_QUESTIONS_RAW))
    }

    pub fn all_questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    pub fn subjects(&self) -> Vec<Subject> {
        let set: BTreeSet<&Subject> = self.questions.iter().map(|q| &q.subject).collect();
        set.into_iter().cloned().collect()
    }

    pub fn count_for(&self, subjects: &[Subject]) -> usize {
        self.questions
            .iter()
            .filter(|q| subjects.contains(&q.subject))
            .count()
    }
}
