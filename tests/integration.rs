use rand::rngs::StdRng;
use rand::SeedableRng;
use see_quiz::config::{build_rng, build_storage, AppConfig};
use see_quiz::flow::{finish_quiz, open_results, quiz_view, start_quiz, submit_setup, Page, SetupForm};
use see_quiz::review::{Classification, ClassificationCounts, SubjectReview};
use see_quiz::session::{run_countdown, QuizEvent, SubmitOutcome};
use see_quiz::storage::{FileStorage, MemoryStorage};
use see_quiz::store::QuestionStore;
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tokio::time::Instant;

fn setup_form(time: &str, count: &str, subjects: &[&str]) -> SetupForm {
    SetupForm {
        time_limit: time.into(),
        question_count: count.into(),
        subjects: subjects.iter().map(|s| s.to_string()).collect(),
    }
}

fn classifications(sections: &[SubjectReview]) -> BTreeMap<usize, Classification> {
    sections
        .iter()
        .flat_map(|s| &s.questions)
        .map(|q| (q.quiz_index, q.classification))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn setup_quiz_results_flow() {
    let config = AppConfig {
        rng_seed: Some(7),
        ..AppConfig::default()
    };
    let mut storage = build_storage(&config);
    let mut rng = build_rng(&config);
    let store = QuestionStore::embedded().unwrap();

    submit_setup(&mut *storage, &setup_form("30", "11", &["Science", "Social"])).unwrap();
    let mut start = start_quiz(&*storage, store, &mut rng, Instant::now()).unwrap();
    assert!(start.warning.is_none());

    let view = quiz_view(&start.session, &mut rng);
    let quiz_numbers: Vec<(u32, usize)> = view
        .iter()
        .flat_map(|s| s.questions.iter().map(|q| (q.display_number, q.quiz_index)))
        .collect();
    assert_eq!(quiz_numbers.len(), 11);

    // Answer the first three questions correctly and the fourth wrongly.
    let questions = start.session.questions().to_vec();
    let (tx, rx) = mpsc::channel(16);
    for q in &questions[..3] {
        tx.send(QuizEvent::Answer {
            quiz_index: q.quiz_index,
            option: q.record.answer.clone(),
        })
        .await
        .unwrap();
    }
    let wrong = questions[3]
        .record
        .options
        .iter()
        .find(|o| **o != questions[3].record.answer)
        .unwrap()
        .clone();
    tx.send(QuizEvent::Answer {
        quiz_index: questions[3].quiz_index,
        option: wrong,
    })
    .await
    .unwrap();
    tx.send(QuizEvent::Submit).await.unwrap();

    let record = run_countdown(&mut start.session, rx, |_| {})
        .await
        .and_then(SubmitOutcome::into_record)
        .unwrap();
    assert_eq!(record.score, 3);
    assert!(!record.timed_out);

    let nav = finish_quiz(&mut *storage, &record);
    assert_eq!(nav.to, Page::Results);
    assert!(nav.warning.is_none());

    let page = open_results(&*storage).unwrap();
    assert_eq!(page.summary.score, 3);
    assert_eq!(page.summary.total_questions, 11);

    let details = page.details().unwrap();
    let review_numbers: Vec<(u32, usize)> = details
        .iter()
        .flat_map(|s| s.questions.iter().map(|q| (q.display_number, q.quiz_index)))
        .collect();
    assert_eq!(quiz_numbers, review_numbers);

    let counts = ClassificationCounts::from_reviews(&details);
    assert_eq!(counts.correct, 3);
    assert_eq!(counts.incorrect, 1);
    assert_eq!(counts.skipped, 7);

    // Stored and reloaded records classify exactly like the in-memory one.
    let direct = see_quiz::review::review(&record).unwrap();
    assert_eq!(classifications(&direct), classifications(&details));
}

#[tokio::test(start_paused = true)]
async fn timed_out_quiz_records_full_limit() {
    let mut storage = MemoryStorage::new();
    let mut rng = StdRng::seed_from_u64(3);
    submit_setup(&mut storage, &setup_form("1", "10", &["Social"])).unwrap();
    let mut start = start_quiz(&storage, QuestionStore::embedded().unwrap(), &mut rng, Instant::now())
        .unwrap();

    let (tx, rx) = mpsc::channel(4);
    let first = start.session.questions()[0].clone();
    tx.send(QuizEvent::Answer {
        quiz_index: first.quiz_index,
        option: first.record.answer.clone(),
    })
    .await
    .unwrap();

    let mut last_display = String::new();
    let record = run_countdown(&mut start.session, rx, |left| {
        last_display = see_quiz::summary::format_time_mmss(left.as_millis() as u64);
    })
    .await
    .and_then(SubmitOutcome::into_record)
    .unwrap();
    drop(tx);

    assert!(record.timed_out);
    assert_eq!(record.time_taken_ms, 60_000);
    assert_eq!(record.score, 1);
    assert_eq!(last_display, "00:00");

    finish_quiz(&mut storage, &record);
    let page = open_results(&storage).unwrap();
    assert_eq!(page.summary.time_text, "Time Limit Reached (1 min)");
    let details = page.details().unwrap();
    let skipped = details
        .iter()
        .flat_map(|s| &s.questions)
        .filter(|q| q.classification == Classification::Skipped)
        .count();
    assert_eq!(skipped, 9);
    assert!(details
        .iter()
        .flat_map(|s| &s.questions)
        .filter(|q| q.classification == Classification::Skipped)
        .all(|q| q.skipped_label == Some("Skipped (Time Out)")));
}

#[test]
fn red_planet_answered_and_skipped_questions() {
    let mut storage = MemoryStorage::new();
    let mut rng = StdRng::seed_from_u64(11);
    submit_setup(&mut storage, &setup_form("30", "15", &["Science"])).unwrap();
    let mut start = start_quiz(&storage, QuestionStore::embedded().unwrap(), &mut rng, Instant::now())
        .unwrap();

    let mars = start
        .session
        .questions()
        .iter()
        .find(|q| q.record.answer == "Mars")
        .unwrap()
        .quiz_index;
    let untouched = (mars + 3) % 15;
    assert!(start.session.record_answer(mars, "Mars"));

    let record = start
        .session
        .submit(Instant::now(), see_quiz::session::SubmitTrigger::Manual)
        .into_record()
        .unwrap();
    let classes = classifications(&see_quiz::review::review(&record).unwrap());
    assert_eq!(classes[&mars], Classification::Correct);
    assert_eq!(classes[&untouched], Classification::Skipped);
}

#[test]
fn results_survive_reload_from_file() {
    let path = std::env::temp_dir()
        .join(format!("see_quiz_it_{}", uuid::Uuid::new_v4()))
        .join("local_storage.json");
    let mut rng = StdRng::seed_from_u64(21);
    let record = {
        let mut storage = FileStorage::open(&path);
        submit_setup(&mut storage, &setup_form("20", "12", &["Science", "Social"])).unwrap();
        let mut start = start_quiz(&storage, QuestionStore::embedded().unwrap(), &mut rng, Instant::now())
            .unwrap();
        let q = start.session.questions()[5].clone();
        start.session.record_answer(q.quiz_index, q.record.answer.clone());
        let record = start
            .session
            .submit(Instant::now(), see_quiz::session::SubmitTrigger::Manual)
            .into_record()
            .unwrap();
        finish_quiz(&mut storage, &record);
        record
    };

    let reopened = FileStorage::open(&path);
    let page = open_results(&reopened).unwrap();
    assert_eq!(page.record, record);
    assert_eq!(
        classifications(&page.details().unwrap()),
        classifications(&see_quiz::review::review(&record).unwrap())
    );
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}
