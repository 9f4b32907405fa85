use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{QuizSettings, ResultRecord, SelectedQuestion};
use crate::review::{numbered_sections, NumberedSection};
use crate::scorer;
use crate::tracker::AnswerTracker;

pub const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    Manual,
    Timeout,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Submitted(ResultRecord),
    AlreadySubmitted,
}

impl SubmitOutcome {
    pub fn into_record(self) -> Option<ResultRecord> {
        match self {
            SubmitOutcome::Submitted(record) => Some(record),
            SubmitOutcome::AlreadySubmitted => None,
        }
    }
}

/// State of one quiz page load. Owns the selected questions and answers and
/// guarantees the scorer runs at most once.
#[derive(Debug)]
pub struct QuizSession {
    id: Uuid,
    settings: QuizSettings,
    questions: Vec<SelectedQuestion>,
    tracker: AnswerTracker,
    started_at: Instant,
    deadline: Instant,
    submitted: bool,
}

impl QuizSession {
    pub fn start(settings: QuizSettings, questions: Vec<SelectedQuestion>, now: Instant) -> Self {
        let deadline = now + Duration::from_millis(settings.time_limit_ms());
        let id = Uuid::new_v4();
        info!(
            session = %id,
            questions = questions.len(),
            time_limit = settings.time_limit_minutes,
            "quiz session started"
        );
        Self {
            id,
            tracker: AnswerTracker::new(questions.len()),
            settings,
            questions,
            started_at: now,
            deadline,
            submitted: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    pub fn questions(&self) -> &[SelectedQuestion] {
        &self.questions
    }

    pub fn tracker(&self) -> &AnswerTracker {
        &self.tracker
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn layout(&self) -> Vec<NumberedSection<'_>> {
        numbered_sections(&self.questions)
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }

    /// Whole seconds left, rounded to nearest like the countdown display.
    pub fn seconds_remaining(&self, now: Instant) -> u64 {
        ((self.remaining(now).as_millis() + 500) / 1000) as u64
    }

    pub fn record_answer(&mut self, quiz_index: usize, option: impl Into<String>) -> bool {
        if self.submitted {
            warn!(session = %self.id, "answer after submission ignored");
            return false;
        }
        self.tracker.record(quiz_index, option)
    }

    pub fn submit(&mut self, now: Instant, trigger: SubmitTrigger) -> SubmitOutcome {
        if self.submitted {
            info!(session = %self.id, ?trigger, "quiz already submitted");
            return SubmitOutcome::AlreadySubmitted;
        }
        self.submitted = true;

        let elapsed_ms = now.saturating_duration_since(self.started_at).as_millis() as u64;
        let record = scorer::score(
            &self.questions,
            self.tracker.answers(),
            elapsed_ms,
            trigger == SubmitTrigger::Timeout,
            &self.settings,
        );
        info!(
            session = %self.id,
            ?trigger,
            score = record.score,
            total = record.total_questions,
            "quiz submitted"
        );
        SubmitOutcome::Submitted(record)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizEvent {
    Answer { quiz_index: usize, option: String },
    Submit,
}

/// Drives a session until it is submitted by the user or by the clock.
///
/// Every tick recomputes the remaining time from the deadline and hands it to
/// `on_tick`. Returns `None` when `events` closes first, which cancels the
/// countdown without scoring. A session that was already submitted yields
/// `AlreadySubmitted` on the next submit or tick.
pub async fn run_countdown<F>(
    session: &mut QuizSession,
    mut events: mpsc::Receiver<QuizEvent>,
    mut on_tick: F,
) -> Option<SubmitOutcome>
where
    F: FnMut(Duration),
{
    let mut ticker = time::interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now();
                on_tick(session.remaining(now));
                if session.seconds_remaining(now) == 0 {
                    info!(session = %session.id(), "timer reached zero");
                    return Some(session.submit(now, SubmitTrigger::Timeout));
                }
            }
            event = events.recv() => match event {
                Some(QuizEvent::Answer { quiz_index, option }) => {
                    session.record_answer(quiz_index, option);
                }
                Some(QuizEvent::Submit) => {
                    return Some(session.submit(Instant::now(), SubmitTrigger::Manual));
                }
                None => {
                    info!(session = %session.id(), "quiz abandoned, countdown cancelled");
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuestionRecord, Subject};

    fn session(now: Instant) -> QuizSession {
        session_with_limit(now, 30)
    }

    fn session_with_limit(now: Instant, minutes: u32) -> QuizSession {
        let questions = (0..6)
            .map(|i| SelectedQuestion {
                quiz_index: i,
                record: QuestionRecord {
                    subject: Subject::science(),
                    question: format!("Q{i}"),
                    options: vec!["Earth".into(), "Mars".into(), "Jupiter".into(), "Venus".into()],
                    answer: "Mars".into(),
                },
            })
            .collect();
        QuizSession::start(QuizSettings::new(minutes, 10, vec![Subject::science()]), questions, now)
    }

    #[test]
    fn submission_is_exactly_once() {
        let start = Instant::now();
        let mut s = session(start);
        s.record_answer(2, "Mars");
        let first = s.submit(start + Duration::from_secs(90), SubmitTrigger::Manual);
        let second = s.submit(start + Duration::from_secs(1800), SubmitTrigger::Timeout);

        let record = first.into_record().unwrap();
        assert_eq!(record.score, 1);
        assert_eq!(record.time_taken_ms, 90_000);
        assert!(!record.timed_out);
        assert_eq!(second, SubmitOutcome::AlreadySubmitted);
        assert!(s.is_submitted());
    }

    #[test]
    fn timeout_records_limit_not_wall_clock() {
        let start = Instant::now();
        let mut s = session(start);
        let record = s
            .submit(start + Duration::from_millis(1_801_300), SubmitTrigger::Timeout)
            .into_record()
            .unwrap();
        assert!(record.timed_out);
        assert_eq!(record.time_taken_ms, 1_800_000);
    }

    #[test]
    fn remaining_is_computed_from_deadline() {
        let start = Instant::now();
        let s = session(start);
        assert_eq!(s.seconds_remaining(start), 1800);
        assert_eq!(s.seconds_remaining(start + Duration::from_millis(1_799_600)), 0);
        assert_eq!(s.seconds_remaining(start + Duration::from_secs(4000)), 0);
        assert_eq!(s.remaining(start + Duration::from_secs(1000)), Duration::from_secs(800));
    }

    #[test]
    fn answers_after_submit_are_ignored() {
        let start = Instant::now();
        let mut s = session(start);
        s.submit(start, SubmitTrigger::Manual);
        assert!(!s.record_answer(0, "Mars"));
        assert_eq!(s.tracker().answered_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_times_out_at_deadline() {
        let mut s = session_with_limit(Instant::now(), 1);

        let (tx, rx) = mpsc::channel(8);
        let mut ticks = Vec::new();
        let record = run_countdown(&mut s, rx, |left| ticks.push(left))
            .await
            .and_then(SubmitOutcome::into_record)
            .unwrap();
        drop(tx);

        assert!(record.timed_out);
        assert_eq!(record.time_taken_ms, 60_000);
        assert_eq!(ticks.first(), Some(&Duration::from_secs(60)));
        assert_eq!(ticks.last(), Some(&Duration::ZERO));
        assert_eq!(ticks.len(), 61);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_manual_submit_and_late_timeout() {
        let mut s = session(Instant::now());
        let (tx, rx) = mpsc::channel(8);
        tx.send(QuizEvent::Answer {
            quiz_index: 2,
            option: "Mars".into(),
        })
        .await
        .unwrap();
        tx.send(QuizEvent::Answer {
            quiz_index: 9,
            option: "Mars".into(),
        })
        .await
        .unwrap();
        tx.send(QuizEvent::Submit).await.unwrap();

        let record = run_countdown(&mut s, rx, |_| {})
            .await
            .and_then(SubmitOutcome::into_record)
            .unwrap();
        assert!(!record.timed_out);
        assert_eq!(record.score, 1);
        assert_eq!(record.answers.len(), 1);

        // The timer firing after a click must not score again.
        let late = s.submit(Instant::now() + Duration::from_secs(1800), SubmitTrigger::Timeout);
        assert_eq!(late, SubmitOutcome::AlreadySubmitted);
    }

    #[tokio::test(start_paused = true)]
    async fn closing_events_cancels_countdown() {
        let mut s = session(Instant::now());
        let (tx, rx) = mpsc::channel::<QuizEvent>(1);
        drop(tx);
        assert!(run_countdown(&mut s, rx, |_| {}).await.is_none());
        assert!(!s.is_submitted());
    }

    #[tokio::test(start_paused = true)]
    async fn submit_after_submission_is_reported() {
        let start = Instant::now();
        let mut s = session(start);
        s.submit(start, SubmitTrigger::Manual);

        let (tx, rx) = mpsc::channel(1);
        tx.send(QuizEvent::Submit).await.unwrap();
        let outcome = run_countdown(&mut s, rx, |_| {}).await;
        assert_eq!(outcome, Some(SubmitOutcome::AlreadySubmitted));
    }
}
