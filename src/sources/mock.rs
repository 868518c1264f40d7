//! Scriptable question source for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::SourceError;
use crate::level::Level;
use crate::question::Question;
use crate::sources::QuestionSource;

/// One scripted reply from a [`MockSource`].
#[derive(Debug)]
pub enum MockResponse {
    Question(Question),
    Failure(SourceError),
}

/// Shared handle used to script responses and inspect recorded fetches.
#[derive(Debug, Default)]
pub struct MockHandle {
    queue: Mutex<VecDeque<MockResponse>>,
    fetched_levels: Mutex<Vec<u8>>,
}

impl MockHandle {
    pub fn push(&self, response: MockResponse) {
        self.queue
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push_back(response);
    }

    pub fn push_question(&self, question: Question) {
        self.push(MockResponse::Question(question));
    }

    pub fn push_failure(&self, error: SourceError) {
        self.push(MockResponse::Failure(error));
    }

    /// Levels requested so far, in order.
    pub fn fetched_levels(&self) -> Vec<u8> {
        self.fetched_levels
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

/// Question source that replays scripted responses. An empty queue counts as
/// a network failure, which keeps exhausted scripts loud in tests.
#[derive(Debug, Clone)]
pub struct MockSource {
    handle: Arc<MockHandle>,
}

impl MockSource {
    pub fn new() -> (Self, Arc<MockHandle>) {
        let handle = Arc::new(MockHandle::default());
        (Self { handle: handle.clone() }, handle)
    }
}

#[async_trait]
impl QuestionSource for MockSource {
    async fn fetch(&self, level: Level) -> Result<Question, SourceError> {
        self.handle
            .fetched_levels
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(level.get());
        let next = self
            .handle
            .queue
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front();
        match next {
            Some(MockResponse::Question(question)) => Ok(question),
            Some(MockResponse::Failure(error)) => Err(error),
            None => Err(SourceError::Network("mock queue empty".to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn clone_box(&self) -> Box<dyn QuestionSource> {
        Box::new(self.clone())
    }
}
