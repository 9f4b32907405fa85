use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::error::QuizError;
use crate::models::{QuestionRecord, QuizSettings, SelectedQuestion, Subject};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountDowngrade {
    pub requested: u32,
    pub available: usize,
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub questions: Vec<SelectedQuestion>,
    pub effective_count: usize,
    pub downgrade: Option<CountDowngrade>,
}

impl Selection {
    pub fn apply_to(&self, settings: &mut QuizSettings) {
        if self.downgrade.is_some() {
            settings.requested_question_count = self.effective_count as u32;
        }
    }
}

/// Splits `target` between two subjects. The first gets the larger half of an
/// odd target; a shortfall on either side moves to the other, capped by what
/// it has.
pub fn split_counts(target: usize, first_available: usize, second_available: usize) -> (usize, usize) {
    let mut first = target - target / 2;
    let mut second = target / 2;

    if first > first_available {
        let deficit = first - first_available;
        first = first_available;
        second = (second + deficit).min(second_available);
    }
    if second > second_available {
        let deficit = second - second_available;
        second = second_available;
        first = (first + deficit).min(first_available);
    }
    (first, second)
}

pub fn select<R: Rng + ?Sized>(
    settings: &QuizSettings,
    pool: &[QuestionRecord],
    rng: &mut R,
) -> Result<Selection, QuizError> {
    let subjects: BTreeSet<&Subject> = settings.subjects.iter().collect();
    let mut available: Vec<&QuestionRecord> = pool
        .iter()
        .filter(|q| subjects.contains(&q.subject))
        .collect();

    if available.is_empty() {
        return Err(QuizError::NoQuestionsAvailable {
            subjects: subjects.iter().map(|s| s.to_string()).collect(),
        });
    }

    let requested = settings.requested_question_count as usize;
    let target = requested.min(available.len());
    let downgrade = (target < requested).then(|| CountDowngrade {
        requested: settings.requested_question_count,
        available: available.len(),
    });
    if downgrade.is_some() {
        warn!(
            "only {} questions available, less than the {} requested",
            available.len(),
            requested
        );
    }

    available.shuffle(rng);

    let chosen: Vec<&QuestionRecord> = if subjects.len() == 2 {
        // BTreeSet iterates in canonical subject order.
        let first = subjects.iter().next().copied();
        let (first_group, second_group): (Vec<&QuestionRecord>, Vec<&QuestionRecord>) = available
            .into_iter()
            .partition(|q| Some(&q.subject) == first);
        let (first_count, second_count) = split_counts(target, first_group.len(), second_group.len());
        debug!(
            "two-subject split: {} + {} of target {}",
            first_count, second_count, target
        );
        let mut chosen: Vec<&QuestionRecord> = first_group
            .into_iter()
            .take(first_count)
            .chain(second_group.into_iter().take(second_count))
            .collect();
        chosen.shuffle(rng);
        chosen
    } else {
        available.truncate(target);
        available
    };

    let questions: Vec<SelectedQuestion> = chosen
        .into_iter()
        .enumerate()
        .map(|(quiz_index, record)| SelectedQuestion {
            quiz_index,
            record: record.clone(),
        })
        .collect();

    Ok(Selection {
        effective_count: questions.len(),
        questions,
        downgrade,
    })
}

pub fn shuffle_options<R: Rng + ?Sized>(question: &SelectedQuestion, rng: &mut R) -> Vec<String> {
    let mut options = question.record.options.clone();
    options.shuffle(rng);
    options
}
