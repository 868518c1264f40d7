//! Impulso Escolar: an adaptive multiple-choice quiz engine.
//!
//! The session state machine fetches questions from a pluggable
//! [`sources::QuestionSource`], grades exactly one answer per question, and
//! moves the difficulty level one step up or down inside `[1, 10]`. Sources
//! cover a generative AI backend, a public trivia API, encyclopedia-extract
//! cloze questions, and a network-free arithmetic generator used as the
//! terminal fallback.

pub mod config;
pub mod error;
pub mod level;
pub mod normalize;
pub mod parse;
pub mod question;
pub mod session;
pub mod sources;

// Convenient re-exports
pub use error::{NormalizeError, ParseError, SessionError, SourceError};
pub use level::Level;
pub use question::Question;
pub use session::{FailurePolicy, Grade, Phase, QuizSession, SessionState};
pub use sources::QuestionSource;
