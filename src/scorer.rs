use crate::models::{AnswerMap, QuizSettings, ResultRecord, SelectedQuestion};

/// Builds the immutable result of a quiz. On timeout the configured limit is
/// recorded as the time taken, whatever `elapsed_ms` says.
pub fn score(
    selected: &[SelectedQuestion],
    answers: &AnswerMap,
    elapsed_ms: u64,
    timed_out: bool,
    settings: &QuizSettings,
) -> ResultRecord {
    let score = selected
        .iter()
        .filter(|q| {
            answers
                .get(&q.quiz_index)
                .is_some_and(|given| q.is_correct(given))
        })
        .count() as u32;

    ResultRecord {
        score,
        total_questions: selected.len() as u32,
        time_taken_ms: if timed_out {
            settings.time_limit_ms()
        } else {
            elapsed_ms
        },
        answers: answers.clone(),
        questions: selected.to_vec(),
        timed_out,
        settings: settings.clone(),
    }
}
