use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use validator::Validate;

use crate::error::ErrorDetail;

/// Subjects with a fixed display position; every other label sorts after
/// these, lexically.
pub const CANONICAL_SUBJECTS: [&str; 2] = ["Science", "Social"];

pub const OPTIONS_PER_QUESTION: usize = 4;
pub const DEFAULT_EXAM_TYPE: &str = "SEE";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subject(String);

impl Subject {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn science() -> Self {
        Self::new(CANONICAL_SUBJECTS[0])
    }

    pub fn social() -> Self {
        Self::new(CANONICAL_SUBJECTS[1])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn rank(&self) -> usize {
        CANONICAL_SUBJECTS
            .iter()
            .position(|s| *s == self.0)
            .unwrap_or(CANONICAL_SUBJECTS.len())
    }
}

impl Ord for Subject {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank()
            .cmp(&other.rank())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Subject {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub subject: Subject,
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedQuestion {
    #[serde(rename = "quizIndex")]
    pub quiz_index: usize,
    #[serde(flatten)]
    pub record: QuestionRecord,
}

impl SelectedQuestion {
    pub fn subject(&self) -> &Subject {
        &self.record.subject
    }

    pub fn is_correct(&self, answer: &str) -> bool {
        self.record.answer == answer
    }
}

/// User selections keyed by `quizIndex`; a missing key means skipped.
pub type AnswerMap = BTreeMap<usize, String>;

fn default_exam_type() -> String {
    DEFAULT_EXAM_TYPE.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct QuizSettings {
    #[serde(rename = "timeLimit")]
    #[validate(range(min = 1, max = 180, message = "must be between 1 and 180 minutes"))]
    pub time_limit_minutes: u32,
    #[serde(rename = "numQuestions")]
    #[validate(range(min = 10, max = 100, message = "must be between 10 and 100 questions"))]
    pub requested_question_count: u32,
    #[validate(length(min = 1, message = "select at least one subject"))]
    pub subjects: Vec<Subject>,
    #[serde(rename = "examType", default = "default_exam_type")]
    pub exam_type: String,
}

impl QuizSettings {
    /// Subjects are kept in canonical order with duplicates collapsed.
    pub fn new(time_limit_minutes: u32, requested_question_count: u32, subjects: Vec<Subject>) -> Self {
        let mut subjects = subjects;
        subjects.sort();
        subjects.dedup();
        Self {
            time_limit_minutes,
            requested_question_count,
            subjects,
            exam_type: default_exam_type(),
        }
    }

    pub fn time_limit_ms(&self) -> u64 {
        u64::from(self.time_limit_minutes) * 60_000
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub score: u32,
    #[serde(rename = "totalQuestions")]
    pub total_questions: u32,
    #[serde(rename = "timeTaken")]
    pub time_taken_ms: u64,
    #[serde(rename = "userAnswers")]
    pub answers: AnswerMap,
    #[serde(rename = "quizQuestions")]
    pub questions: Vec<SelectedQuestion>,
    #[serde(rename = "timeRanOut")]
    pub timed_out: bool,
    pub settings: QuizSettings,
}

impl ResultRecord {
    pub fn check_integrity(&self) -> Result<(), Vec<ValidationIssue>> {
        let mut issues = Vec::new();
        if self.total_questions as usize != self.questions.len() {
            issues.push(ValidationIssue {
                field: "totalQuestions".into(),
                issue: format!("must equal the number of questions ({})", self.questions.len()),
            });
        }
        if self.score > self.total_questions {
            issues.push(ValidationIssue {
                field: "score".into(),
                issue: "must not exceed totalQuestions".into(),
            });
        }
        let mut seen = HashSet::new();
        for (i, q) in self.questions.iter().enumerate() {
            if !seen.insert(q.quiz_index) {
                issues.push(ValidationIssue {
                    field: format!("quizQuestions[{i}].quizIndex"),
                    issue: "must be unique".into(),
                });
            }
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: String,
    pub issue: String,
}

impl From<ValidationIssue> for ErrorDetail {
    fn from(i: ValidationIssue) -> Self {
        ErrorDetail {
            field: i.field,
            issue: i.issue,
        }
    }
}

fn settings_field_name(field: &str) -> &str {
    match field {
        "time_limit_minutes" | "timeLimit" => "timeLimit",
        "requested_question_count" | "numQuestions" => "numQuestions",
        other => other,
    }
}

pub fn validate_settings(settings: &QuizSettings) -> Result<(), Vec<ValidationIssue>> {
    let Err(errors) = settings.validate() else {
        return Ok(());
    };
    let mut issues: Vec<ValidationIssue> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = settings_field_name(&field).to_string();
            errs.iter()
                .map(|e| ValidationIssue {
                    field: field.clone(),
                    issue: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
                .collect::<Vec<_>>()
        })
        .collect();
    issues.sort_by(|a, b| a.field.cmp(&b.field));
    Err(issues)
}

pub fn validate_questions(questions: &[QuestionRecord]) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    for (i, q) in questions.iter().enumerate() {
        if q.subject.as_str().trim().is_empty() {
            issues.push(ValidationIssue {
                field: format!("questions[{i}].subject"),
                issue: "must not be empty".into(),
            });
        }
        if q.question.trim().is_empty() {
            issues.push(ValidationIssue {
                field: format!("questions[{i}].question"),
                issue: "must not be empty".into(),
            });
        }
        if q.options.len() != OPTIONS_PER_QUESTION {
            issues.push(ValidationIssue {
                field: format!("questions[{i}].options"),
                issue: format!("must contain exactly {OPTIONS_PER_QUESTION} options"),
            });
        }
        let mut seen = HashSet::new();
        for (j, opt) in q.options.iter().enumerate() {
            if opt.trim().is_empty() {
                issues.push(ValidationIssue {
                    field: format!("questions[{i}].options[{j}]"),
                    issue: "must not be empty".into(),
                });
            }
            if !seen.insert(opt.as_str()) {
                issues.push(ValidationIssue {
                    field: format!("questions[{i}].options[{j}]"),
                    issue: "must be unique".into(),
                });
            }
        }
        // Exact match only: "Mars" and "mars " are different answers.
        if !q.options.iter().any(|o| *o == q.answer) {
            issues.push(ValidationIssue {
                field: format!("questions[{i}].answer"),
                issue: "must equal one of the options".into(),
            });
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
