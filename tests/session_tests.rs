use impulso_escolar::error::{SessionError, SourceError};
use impulso_escolar::session::{FailurePolicy, Phase, QuizSession};
use impulso_escolar::sources::MockSource;
use impulso_escolar::{Level, Question};

fn question(prompt: &str, correct: usize) -> Question {
    Question::new(
        prompt,
        vec!["um".into(), "dois".into(), "três".into(), "quatro".into()],
        correct,
    )
    .unwrap()
}

#[tokio::test]
async fn correct_answer_advances_level_and_requests_next_at_new_level() {
    let (source, handle) = MockSource::new();
    handle.push_question(question("primeira", 2));
    handle.push_question(question("segunda", 0));

    let mut session = QuizSession::new(Box::new(source));
    let first = session.load_next().await.unwrap();
    assert_eq!(first.prompt(), "primeira");

    let grade = session.submit(2).expect("grading should happen");
    assert!(grade.correct);
    assert_eq!(grade.level_before.get(), 1);
    assert_eq!(grade.level_after.get(), 2);
    assert_eq!(session.level().get(), 2);

    let second = session.load_next().await.unwrap();
    assert_eq!(second.prompt(), "segunda");
    // The second fetch must carry the advanced level.
    assert_eq!(handle.fetched_levels(), vec![1, 2]);
}

#[tokio::test]
async fn incorrect_answer_at_level_one_stays_at_the_floor() {
    let (source, handle) = MockSource::new();
    handle.push_question(question("primeira", 1));

    let mut session = QuizSession::new(Box::new(source));
    session.load_next().await.unwrap();
    let grade = session.submit(0).unwrap();
    assert!(!grade.correct);
    assert_eq!(grade.correct_index, 1);
    assert_eq!(session.level().get(), 1);
}

#[tokio::test]
async fn ceiling_is_respected_at_level_ten() {
    let (source, handle) = MockSource::new();
    handle.push_question(question("topo", 3));

    let mut session = QuizSession::new(Box::new(source)).with_level(Level::new(10));
    session.load_next().await.unwrap();
    let grade = session.submit(3).unwrap();
    assert!(grade.correct);
    assert_eq!(grade.level_after.get(), 10);
}

#[tokio::test]
async fn double_submit_does_not_double_advance() {
    let (source, handle) = MockSource::new();
    handle.push_question(question("única", 0));

    let mut session = QuizSession::new(Box::new(source));
    session.load_next().await.unwrap();
    assert!(session.submit(0).is_some());
    assert_eq!(session.level().get(), 2);

    // Same click delivered twice: the second one must be a no-op.
    assert!(session.submit(0).is_none());
    assert_eq!(session.level().get(), 2);
    assert!(matches!(session.state().phase, Phase::Graded { .. }));
}

#[tokio::test]
async fn fallback_source_serves_after_primary_exhausts_retries() {
    let (primary, primary_handle) = MockSource::new();
    primary_handle.push_failure(SourceError::Network("down".into()));
    primary_handle.push_failure(SourceError::Network("still down".into()));

    let (fallback, fallback_handle) = MockSource::new();
    fallback_handle.push_question(question("do fallback", 0));

    let mut session = QuizSession::new(Box::new(primary))
        .with_fallback(Box::new(fallback))
        .with_max_attempts(2);

    let q = session.load_next().await.unwrap();
    assert_eq!(q.prompt(), "do fallback");
    assert_eq!(primary_handle.fetched_levels(), vec![1, 1]);
    assert_eq!(fallback_handle.fetched_levels(), vec![1]);
}

#[tokio::test]
async fn surface_policy_propagates_and_session_stays_usable() {
    let (source, handle) = MockSource::new();
    handle.push_failure(SourceError::RateLimit);
    handle.push_failure(SourceError::RateLimit);

    let mut session = QuizSession::new(Box::new(source))
        .with_policy(FailurePolicy::Surface)
        .with_max_attempts(2);

    let error = session.load_next().await.unwrap_err();
    assert!(matches!(error, SessionError::Source(SourceError::RateLimit)));
    assert!(matches!(session.state().phase, Phase::Idle));

    // A manual retry after the failure must still work.
    handle.push_question(question("depois do erro", 1));
    let q = session.load_next().await.unwrap();
    assert_eq!(q.prompt(), "depois do erro");
}

#[tokio::test]
async fn arithmetic_default_fallback_needs_no_scripting() {
    let (source, handle) = MockSource::new();
    handle.push_failure(SourceError::Network("offline".into()));
    handle.push_failure(SourceError::Network("offline".into()));

    // Default policy falls back to the built-in arithmetic source.
    let mut session = QuizSession::new(Box::new(source));
    let q = session.load_next().await.unwrap();
    assert_eq!(q.options().len(), 4);
    assert!(q.prompt().starts_with("Quanto é"));
}
