//! Integration tests for QuizMe core
//!
//! Tests the full pipeline: catalog file → store → access gate → wire
//! envelope → player session

use quizme_core::player::{Correctness, Update};
use quizme_core::{
    AccessGate, Command, CorsPolicy, Decision, EmbedEnvelope, Event, JsonFileStore, PlayerConfig,
    PlayerDriver, QuizMeError,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn write_catalog(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("quizzes.json");
    let catalog = json!({
        "quizzes": [
            {
                "id": "letters",
                "name": "Letters",
                "questions": [
                    { "question": "First letter?", "options": ["A", "B", "C"], "correctAnswer": "A", "hint": "" },
                    { "question": "Second letter?", "answers": ["A", "B", "C"], "correctAnswer": "B", "hint": "" },
                    { "question": "Third letter?", "options": ["A", "B", "C"], "correctAnswer": "C", "hint": "" }
                ],
                "totalQuestions": 3,
                "allowedEmbedDomains": []
            },
            {
                "id": "private",
                "name": "Members Only",
                "questions": "[{\"question\":\"Secret?\",\"options\":[\"yes\",\"no\"],\"correctAnswer\":\"yes\"}]",
                "allowedEmbedDomains": ["members.example.com"]
            }
        ]
    });
    std::fs::write(&path, serde_json::to_string_pretty(&catalog).unwrap()).unwrap();
    path
}

#[test]
fn test_end_to_end_open_quiz() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::open(write_catalog(&dir)).unwrap());
    let gate = AccessGate::new(store);

    let grant = gate
        .authorize("letters", Some("https://any.blog"))
        .expect("open quiz is served");
    assert_eq!(grant.decision, Decision::AllowAll);
    assert_eq!(grant.allow_origin, "*");
    assert_eq!(grant.quiz.questions[1].options, vec!["A", "B", "C"]);
}

#[test]
fn test_end_to_end_restricted_quiz() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::open(write_catalog(&dir)).unwrap());
    let gate = AccessGate::with_policy(store, CorsPolicy::Joined);

    assert!(matches!(
        gate.authorize("private", Some("https://elsewhere.io")),
        Err(QuizMeError::Forbidden(_))
    ));
    assert!(gate.authorize("private", Some("")).is_ok());

    let grant = gate
        .authorize("private", Some("https://members.example.com"))
        .unwrap();
    assert_eq!(grant.allow_origin, "members.example.com");
    assert_eq!(grant.quiz.total_questions, 1);
}

#[test]
fn test_registration_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog(&dir);
    {
        let gate = AccessGate::new(Arc::new(JsonFileStore::open(&path).unwrap()));
        gate.register_allowed_domain("letters", "school.edu").unwrap();
        gate.register_allowed_domain("letters", "school.edu").unwrap();
    }

    let gate = AccessGate::new(Arc::new(JsonFileStore::open(&path).unwrap()));
    let grant = gate.authorize("letters", Some("https://school.edu")).unwrap();
    assert_eq!(grant.decision, Decision::Allow);
    assert_eq!(grant.quiz.allowed_embed_domains, vec!["school.edu"]);
    assert!(gate.authorize("letters", Some("https://other.org")).is_err());
}

#[tokio::test]
async fn test_player_over_wire_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let gate = AccessGate::new(Arc::new(JsonFileStore::open(write_catalog(&dir)).unwrap()));
    let grant = gate.authorize("letters", None).unwrap();

    // Round through the JSON body the data endpoint sends.
    let body = serde_json::to_string(&EmbedEnvelope { quiz: grant.quiz }).unwrap();
    let envelope: EmbedEnvelope = serde_json::from_str(&body).unwrap();

    let mut driver = PlayerDriver::new(PlayerConfig {
        advance_delay: Duration::ZERO,
        ..PlayerConfig::default()
    });
    driver.handle(Event::Loaded(Ok(envelope.quiz)));

    let mut correct_checks = 0;
    for answer in ["A", "B"] {
        driver.handle(Event::Command(Command::Select(answer.into())));
        let before = driver.player().session().unwrap().index();
        assert_eq!(driver.handle(Event::Command(Command::Check)), Update::Changed);
        let session = driver.player().session().unwrap();
        assert_eq!(session.index(), before + 1);
        assert_eq!(session.correctness(), Correctness::Unanswered);
        correct_checks += 1;
    }
    driver.handle(Event::Command(Command::Skip));

    let session = driver.player().session().unwrap();
    let stats = session.stats().expect("quiz complete");
    assert_eq!(stats.correct, correct_checks);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.percentage(), 67);
    assert!(!driver.is_ticking());
}
