use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::NormalizeError;

pub const OPTION_COUNT: usize = 4;

/// A fully validated multiple-choice question: a prompt, exactly four
/// pairwise-distinct options, and the index of the correct one.
///
/// Construct only through [`Question::new`], which enforces the invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    prompt: String,
    options: [String; OPTION_COUNT],
    correct: usize,
}

impl Question {
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct: usize,
    ) -> Result<Self, NormalizeError> {
        let options: [String; OPTION_COUNT] = options
            .try_into()
            .map_err(|v: Vec<String>| NormalizeError::OptionCount(v.len()))?;
        if correct >= OPTION_COUNT {
            return Err(NormalizeError::IndexOutOfRange(correct));
        }
        // Distinctness after trim + case-fold; source heuristics occasionally
        // produce the same text twice and such a question is ungradable.
        for i in 0..OPTION_COUNT {
            for j in (i + 1)..OPTION_COUNT {
                if options[i].trim().to_lowercase() == options[j].trim().to_lowercase() {
                    return Err(NormalizeError::DuplicateOptions);
                }
            }
        }
        Ok(Self { prompt: prompt.into(), options, correct })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    pub fn correct_index(&self) -> usize {
        self.correct
    }

    pub fn correct_text(&self) -> &str {
        &self.options[self.correct]
    }

    pub fn is_correct(&self, picked: usize) -> bool {
        picked == self.correct
    }
}

/// Structured payload the AI backend is asked to produce. May arrive embedded
/// in surrounding prose; see `parse::extract_json_payload`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QuestionPayload {
    /// The question text, in Portuguese.
    pub question: String,
    /// Exactly four answer options, only one of them correct.
    pub options: Vec<String>,
    /// Zero-based index of the correct option.
    #[serde(rename = "correctAnswerIndex")]
    pub correct_answer_index: usize,
}

impl TryFrom<QuestionPayload> for Question {
    type Error = NormalizeError;

    fn try_from(payload: QuestionPayload) -> Result<Self, Self::Error> {
        Question::new(payload.question, payload.options, payload.correct_answer_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(v: [&str; 4]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn valid_question_passes() {
        let q = Question::new("Quanto é 2 + 2?", opts(["3", "4", "5", "6"]), 1).unwrap();
        assert_eq!(q.correct_text(), "4");
        assert!(q.is_correct(1));
        assert!(!q.is_correct(0));
    }

    #[test]
    fn wrong_option_count_rejected() {
        let err = Question::new("?", opts(["a", "b", "c", "d"])[..3].to_vec(), 0).unwrap_err();
        assert!(matches!(err, NormalizeError::OptionCount(3)));
    }

    #[test]
    fn out_of_range_index_rejected() {
        let err = Question::new("?", opts(["a", "b", "c", "d"]), 4).unwrap_err();
        assert!(matches!(err, NormalizeError::IndexOutOfRange(4)));
    }

    #[test]
    fn duplicate_options_rejected() {
        let err = Question::new("?", opts(["a", "b", " A ", "d"]), 0).unwrap_err();
        assert!(matches!(err, NormalizeError::DuplicateOptions));
    }
}
