use tracing::warn;

use crate::models::AnswerMap;

#[derive(Debug, Clone, Default)]
pub struct AnswerTracker {
    answers: AnswerMap,
    question_count: usize,
}

impl AnswerTracker {
    pub fn new(question_count: usize) -> Self {
        Self {
            answers: AnswerMap::new(),
            question_count,
        }
    }

    /// Returns `false` and leaves the map untouched for an index outside the quiz.
    pub fn record(&mut self, quiz_index: usize, option: impl Into<String>) -> bool {
        if quiz_index >= self.question_count {
            warn!(
                "ignoring answer for quiz index {} (quiz has {} questions)",
                quiz_index, self.question_count
            );
            return false;
        }
        self.answers.insert(quiz_index, option.into());
        true
    }

    pub fn answer_for(&self, quiz_index: usize) -> Option<&str> {
        self.answers.get(&quiz_index).map(String::as_str)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_selection_wins() {
        let mut t = AnswerTracker::new(3);
        assert!(t.record(1, "Mars"));
        assert!(t.record(1, "Venus"));
        assert_eq!(t.answer_for(1), Some("Venus"));
        assert_eq!(t.answer_for(0), None);
        assert_eq!(t.answered_count(), 1);
    }

    #[test]
    fn out_of_range_index_is_ignored() {
        let mut t = AnswerTracker::new(2);
        assert!(!t.record(2, "Mars"));
        assert!(!t.record(usize::MAX, "Mars"));
        assert!(t.answers().is_empty());
    }
}
