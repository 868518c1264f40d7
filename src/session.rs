//! The quiz session state machine.
//!
//! One session owns the difficulty level and the current question and cycles
//! through `Idle → AwaitingAnswer → Graded → AwaitingAnswer → …`. State is an
//! immutable [`SessionState`] value replaced wholesale on every transition;
//! the UI is expected to render as a pure projection of that value. `&mut`
//! access plus an explicit phase check mean at most one fetch is ever in
//! flight, and dropping the `load_next` future cancels an outstanding fetch.

use tracing::{debug, info, instrument, warn};

use crate::error::{SessionError, SourceError};
use crate::level::Level;
use crate::question::{Question, OPTION_COUNT};
use crate::sources::{ArithmeticSource, QuestionSource};

/// Where the session currently is in the question lifecycle.
#[derive(Debug, Clone)]
pub enum Phase {
    /// No question loaded yet (start of game, or after a surfaced failure).
    Idle,
    /// A question is published and exactly one answer is expected.
    AwaitingAnswer { question: Question },
    /// The answer was graded; feedback can be rendered until the next load.
    Graded { question: Question, grade: Grade },
}

/// Outcome of grading one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grade {
    pub correct: bool,
    pub picked: usize,
    pub correct_index: usize,
    pub level_before: Level,
    pub level_after: Level,
}

/// The complete session value: current level plus lifecycle phase.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub level: Level,
    pub phase: Phase,
}

/// What to do when the active source keeps failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Switch to the fallback source so the player always gets a question.
    Fallback,
    /// Surface the error; the session stays `Idle` and can be retried.
    Surface,
}

/// Orchestrates the request/display/answer/advance cycle.
#[derive(Debug)]
pub struct QuizSession {
    source: Box<dyn QuestionSource>,
    fallback: Box<dyn QuestionSource>,
    policy: FailurePolicy,
    max_attempts: usize,
    state: SessionState,
}

impl QuizSession {
    /// Session at level 1 with the default policy: two attempts against the
    /// active source, then the network-free arithmetic fallback.
    pub fn new(source: Box<dyn QuestionSource>) -> Self {
        Self {
            source,
            fallback: Box::new(ArithmeticSource::new()),
            policy: FailurePolicy::Fallback,
            max_attempts: 2,
            state: SessionState { level: Level::default(), phase: Phase::Idle },
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.state = SessionState { level, phase: Phase::Idle };
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_fallback(mut self, fallback: Box<dyn QuestionSource>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn level(&self) -> Level {
        self.state.level
    }

    /// Fetch and publish the next question at the current level.
    ///
    /// Legal from `Idle` and `Graded`; while a question is awaiting an
    /// answer this is a state error, not a silent refetch. On failure the
    /// session is left `Idle` and renderable, never wedged.
    #[instrument(skip(self), fields(level = self.state.level.get(), source = self.source.name()))]
    pub async fn load_next(&mut self) -> Result<Question, SessionError> {
        if matches!(self.state.phase, Phase::AwaitingAnswer { .. }) {
            return Err(SessionError::NotReady("a question is already awaiting an answer"));
        }

        let level = self.state.level;
        let mut last_error: Option<SourceError> = None;
        for attempt in 1..=self.max_attempts {
            match self.source.fetch(level).await {
                Ok(question) => {
                    info!(attempt, prompt = question.prompt(), "question published");
                    self.publish(question.clone());
                    return Ok(question);
                }
                Err(error) => {
                    warn!(attempt, error = %error, "question fetch failed");
                    last_error = Some(error);
                }
            }
        }

        let last_error = last_error.unwrap_or(SourceError::Exhausted);
        match self.policy {
            FailurePolicy::Fallback => {
                info!(fallback = self.fallback.name(), "switching to fallback source");
                match self.fallback.fetch(level).await {
                    Ok(question) => {
                        self.publish(question.clone());
                        Ok(question)
                    }
                    Err(fallback_error) => {
                        warn!(error = %fallback_error, "fallback source failed too");
                        self.state = SessionState { level, phase: Phase::Idle };
                        Err(SessionError::Source(fallback_error))
                    }
                }
            }
            FailurePolicy::Surface => {
                self.state = SessionState { level, phase: Phase::Idle };
                Err(SessionError::Source(last_error))
            }
        }
    }

    /// Grade a selected option.
    ///
    /// Legal only while a question awaits its answer; a second call (double
    /// click) or an out-of-range index is a no-op returning `None`, so the
    /// level can never advance twice for one question.
    pub fn submit(&mut self, picked: usize) -> Option<Grade> {
        let Phase::AwaitingAnswer { question } = &self.state.phase else {
            debug!(picked, "ignoring selection outside AwaitingAnswer");
            return None;
        };
        if picked >= OPTION_COUNT {
            debug!(picked, "ignoring out-of-range selection");
            return None;
        }

        let correct = question.is_correct(picked);
        let level_before = self.state.level;
        let level_after = level_before.advance(correct);
        let grade = Grade {
            correct,
            picked,
            correct_index: question.correct_index(),
            level_before,
            level_after,
        };
        info!(
            correct,
            picked,
            level = level_after.get(),
            "answer graded"
        );

        let question = question.clone();
        self.state = SessionState { level: level_after, phase: Phase::Graded { question, grade } };
        Some(grade)
    }

    fn publish(&mut self, question: Question) {
        self.state = SessionState {
            level: self.state.level,
            phase: Phase::AwaitingAnswer { question },
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MockSource;

    fn question(correct: usize) -> Question {
        Question::new(
            "Quanto é 2 + 2?",
            vec!["3".into(), "4".into(), "5".into(), "6".into()],
            correct,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn load_while_awaiting_answer_is_rejected() {
        let (source, handle) = MockSource::new();
        handle.push_question(question(1));
        let mut session = QuizSession::new(Box::new(source));
        session.load_next().await.unwrap();
        assert!(matches!(
            session.load_next().await,
            Err(SessionError::NotReady(_))
        ));
    }

    #[tokio::test]
    async fn submit_before_any_question_is_a_noop() {
        let (source, _handle) = MockSource::new();
        let mut session = QuizSession::new(Box::new(source));
        assert!(session.submit(0).is_none());
        assert_eq!(session.level().get(), 1);
    }

    #[tokio::test]
    async fn out_of_range_pick_is_ignored() {
        let (source, handle) = MockSource::new();
        handle.push_question(question(1));
        let mut session = QuizSession::new(Box::new(source));
        session.load_next().await.unwrap();
        assert!(session.submit(4).is_none());
        assert!(matches!(session.state().phase, Phase::AwaitingAnswer { .. }));
    }
}
