use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::error::{ErrorDetail, QuizError};
use crate::models::{validate_settings, QuizSettings, ResultRecord, Subject};
use crate::review::{self, SubjectReview};
use crate::selector::{self, CountDowngrade};
use crate::session::QuizSession;
use crate::storage::{self, LocalStorage};
use crate::store::QuestionStore;
use crate::summary::ResultSummary;

static WHOLE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("whole number pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Setup,
    Quiz,
    Results,
}

#[derive(Debug, Clone, Default)]
pub struct SetupForm {
    pub time_limit: String,
    pub question_count: String,
    pub subjects: Vec<String>,
}

fn parse_whole_number(
    raw: &str,
    field: &str,
    empty_message: &str,
    issues: &mut Vec<ErrorDetail>,
) -> Option<u32> {
    let value = raw.trim();
    if value.is_empty() {
        issues.push(ErrorDetail::new(field, empty_message));
        return None;
    }
    if !WHOLE_NUMBER.is_match(value) {
        issues.push(ErrorDetail::new(field, "Please enter whole numbers only."));
        return None;
    }
    // Digits that overflow u32 are far outside any allowed range.
    Some(value.parse().unwrap_or(u32::MAX))
}

impl SetupForm {
    pub fn parse(&self) -> Result<QuizSettings, QuizError> {
        let mut issues = Vec::new();
        let time_limit = parse_whole_number(
            &self.time_limit,
            "timeLimit",
            "Please enter time (1-180 min).",
            &mut issues,
        );
        let question_count = parse_whole_number(
            &self.question_count,
            "numQuestions",
            "Enter question count (10-100).",
            &mut issues,
        );
        let subjects: Vec<Subject> = self
            .subjects
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(Subject::new)
            .collect();

        let settings = QuizSettings::new(
            time_limit.unwrap_or_default(),
            question_count.unwrap_or_default(),
            subjects,
        );
        if let Err(range_issues) = validate_settings(&settings) {
            let already_reported: Vec<String> = issues.iter().map(|i| i.field.clone()).collect();
            issues.extend(
                range_issues
                    .into_iter()
                    .filter(|i| !already_reported.contains(&i.field))
                    .map(ErrorDetail::from),
            );
        }

        if issues.is_empty() {
            Ok(settings)
        } else {
            Err(QuizError::InvalidSettings { details: issues })
        }
    }
}

/// Validates the form and stores the settings for the quiz page. Without
/// stored settings the quiz cannot start, so a failed save is an error here.
pub fn submit_setup<S: LocalStorage + ?Sized>(storage: &mut S, form: &SetupForm) -> Result<QuizSettings, QuizError> {
    let settings = form.parse()?;
    storage::save_settings(storage, &settings)?;
    info!(
        "quiz settings saved: {} min, {} questions, subjects {:?}",
        settings.time_limit_minutes, settings.requested_question_count, settings.subjects
    );
    Ok(settings)
}

#[derive(Debug)]
pub struct QuizStart {
    pub session: QuizSession,
    pub warning: Option<CountDowngrade>,
}

pub fn start_quiz<S, R>(
    storage: &S,
    store: &QuestionStore,
    rng: &mut R,
    now: Instant,
) -> Result<QuizStart, QuizError>
where
    S: LocalStorage + ?Sized,
    R: Rng + ?Sized,
{
    let mut settings = storage::load_settings(storage).inspect_err(|err| {
        warn!("cannot start quiz: {}", err);
    })?;
    let selection = selector::select(&settings, store.all_questions(), rng)?;
    selection.apply_to(&mut settings);
    let warning = selection.downgrade;
    let session = QuizSession::start(settings, selection.questions, now);
    Ok(QuizStart { session, warning })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub display_number: u32,
    pub quiz_index: usize,
    pub question_text: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    pub subject: Subject,
    pub heading: String,
    pub questions: Vec<QuestionView>,
}

pub fn quiz_view<R: Rng + ?Sized>(session: &QuizSession, rng: &mut R) -> Vec<SectionView> {
    session
        .layout()
        .into_iter()
        .map(|section| SectionView {
            heading: format!("{} Questions", section.subject),
            subject: section.subject,
            questions: section
                .questions
                .into_iter()
                .map(|(display_number, q)| QuestionView {
                    display_number,
                    quiz_index: q.quiz_index,
                    question_text: q.record.question.clone(),
                    options: selector::shuffle_options(q, rng),
                })
                .collect(),
        })
        .collect()
}

#[derive(Debug)]
pub struct Navigation {
    pub to: Page,
    pub warning: Option<QuizError>,
}

/// Stores the result and moves on to the results page whatever happens.
pub fn finish_quiz<S: LocalStorage + ?Sized>(storage: &mut S, result: &ResultRecord) -> Navigation {
    let warning = match storage::save_results(storage, result) {
        Ok(()) => {
            info!("quiz results saved");
            None
        }
        Err(err) => {
            warn!("could not save quiz results, proceeding anyway: {}", err);
            Some(err)
        }
    };
    if let Err(err) = storage::clear_settings(storage) {
        warn!("could not clear quiz settings: {}", err);
    }
    Navigation {
        to: Page::Results,
        warning,
    }
}

#[derive(Debug, Clone)]
pub struct ResultsPage {
    pub record: ResultRecord,
    pub summary: ResultSummary,
}

impl ResultsPage {
    pub fn details(&self) -> Result<Vec<SubjectReview>, QuizError> {
        review::review(&self.record)
    }
}

pub fn open_results<S: LocalStorage + ?Sized>(storage: &S) -> Result<ResultsPage, QuizError> {
    let record = storage::load_results(storage).inspect_err(|err| {
        warn!("cannot show results: {}", err);
    })?;
    let summary = ResultSummary::from_record(&record);
    Ok(ResultsPage { record, summary })
}
