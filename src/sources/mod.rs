//! Question sources: pluggable strategies that produce a validated
//! [`Question`] for a difficulty level.
//!
//! Every strategy hides behind one object-safe contract so the session can
//! hold a `Box<dyn QuestionSource>` and swap strategies (including the
//! network-free arithmetic fallback) without caring where questions come
//! from.

pub mod ai;
pub mod arithmetic;
pub mod encyclopedia;
pub mod mock;
pub mod trivia;

pub use ai::AiSource;
pub use arithmetic::ArithmeticSource;
pub use encyclopedia::EncyclopediaSource;
pub use mock::{MockHandle, MockSource};
pub use trivia::TriviaSource;

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::level::Level;
use crate::question::Question;

/// A strategy that produces one question at a given difficulty level.
///
/// Implementors provide `fetch`; parsing and normalization happen inside the
/// strategy so callers only ever see a validated `Question` or a typed
/// failure.
#[async_trait]
pub trait QuestionSource: Send + Sync + Debug {
    /// Produce one question for `level`, or fail with a `SourceError`.
    async fn fetch(&self, level: Level) -> Result<Question, SourceError>;

    /// Short human-readable name, used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Clone this source into a boxed trait object.
    fn clone_box(&self) -> Box<dyn QuestionSource>;
}

impl Clone for Box<dyn QuestionSource> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[async_trait]
impl QuestionSource for Box<dyn QuestionSource> {
    async fn fetch(&self, level: Level) -> Result<Question, SourceError> {
        self.as_ref().fetch(level).await
    }

    fn name(&self) -> &'static str {
        self.as_ref().name()
    }

    fn clone_box(&self) -> Box<dyn QuestionSource> {
        self.as_ref().clone_box()
    }
}
