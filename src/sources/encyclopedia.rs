//! Fill-in-the-blank questions extracted from random encyclopedia articles.
//!
//! The strategy: fetch a random article summary, keep declarative sentences
//! whose length fits a level-scaled window, pick one, mask one "important"
//! word (level-scaled length window, alphabetic only), and offer the masked
//! word among three distractors drawn from the same sentence. Thin pools are
//! common, so the fetch retries with a fresh article a bounded number of
//! times and then fails cleanly instead of recursing forever.

use std::fmt::Debug;
use std::sync::Mutex;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::SourceError;
use crate::level::Level;
use crate::question::Question;
use crate::sources::QuestionSource;

const SUMMARY_ENDPOINT: &str = "https://pt.wikipedia.org/api/rest_v1/page/random/summary";

/// Fresh-article fetches per `fetch` call before giving up.
const MAX_ATTEMPTS: usize = 3;

const BLANK: &str = "_____";

/// Article-extract seam. The production implementation hits the random
/// summary endpoint; tests plug in scripted extracts.
#[async_trait]
pub trait ExtractProvider: Send + Sync + Debug {
    async fn fetch_extract(&self) -> Result<String, SourceError>;
    fn clone_box(&self) -> Box<dyn ExtractProvider>;
}

impl Clone for Box<dyn ExtractProvider> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    extract: String,
}

/// Random article summaries from the encyclopedia REST API.
#[derive(Debug, Clone)]
pub struct RestExtractProvider {
    client: Client,
}

impl RestExtractProvider {
    pub fn new() -> Self {
        Self { client: Client::new() }
    }
}

impl Default for RestExtractProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractProvider for RestExtractProvider {
    async fn fetch_extract(&self) -> Result<String, SourceError> {
        let response = self
            .client
            .get(SUMMARY_ENDPOINT)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(SourceError::Api {
                status: response.status().as_u16(),
                message: "encyclopedia API error".to_string(),
            });
        }
        let body: SummaryResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;
        Ok(body.extract)
    }

    fn clone_box(&self) -> Box<dyn ExtractProvider> {
        Box::new(self.clone())
    }
}

/// Question source that builds cloze questions from random article extracts.
#[derive(Debug)]
pub struct EncyclopediaSource {
    provider: Box<dyn ExtractProvider>,
    rng: Mutex<StdRng>,
}

impl EncyclopediaSource {
    pub fn new() -> Self {
        Self::with_provider(Box::new(RestExtractProvider::new()))
    }

    pub fn with_provider(provider: Box<dyn ExtractProvider>) -> Self {
        Self { provider, rng: Mutex::new(StdRng::from_entropy()) }
    }
}

impl Default for EncyclopediaSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EncyclopediaSource {
    fn clone(&self) -> Self {
        let rng = self.rng.lock().unwrap_or_else(|p| p.into_inner()).clone();
        Self { provider: self.provider.clone(), rng: Mutex::new(rng) }
    }
}

#[async_trait]
impl QuestionSource for EncyclopediaSource {
    #[instrument(skip(self), fields(level = level.get()))]
    async fn fetch(&self, level: Level) -> Result<Question, SourceError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let extract = self.provider.fetch_extract().await?;
            let question = {
                let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
                build_cloze(&extract, level, &mut *rng)
            };
            match question {
                Some(question) => {
                    debug!(attempt, prompt = question.prompt(), "built cloze question");
                    return Ok(question);
                }
                None => {
                    warn!(attempt, "article extract yielded no usable sentence/word pool");
                }
            }
        }
        Err(SourceError::Exhausted)
    }

    fn name(&self) -> &'static str {
        "encyclopedia"
    }

    fn clone_box(&self) -> Box<dyn QuestionSource> {
        Box::new(self.clone())
    }
}

/// Level-scaled sentence window, in words.
fn sentence_window(level: Level) -> (usize, usize) {
    let l = level.get() as usize;
    ((10).max(5 * l), (50).min(20 * l))
}

/// Level-scaled word-length window, in characters.
fn word_window(level: Level) -> (usize, usize) {
    let l = level.get() as usize;
    ((3).max(l.min(5)), (8).min(2 * l))
}

/// Split an extract into sentences, keeping only declarative ones (the cloze
/// format reads wrong on questions and exclamations) inside the level's
/// length window.
fn candidate_sentences(extract: &str, level: Level) -> Vec<String> {
    let (min_words, max_words) = sentence_window(level);
    let mut sentences = Vec::new();
    let mut current = String::new();
    for ch in extract.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            let sentence = current.trim().to_string();
            current = String::new();
            if sentence.ends_with('.') {
                let words = sentence.split_whitespace().count();
                if (min_words..=max_words).contains(&words) {
                    sentences.push(sentence);
                }
            }
        }
    }
    sentences
}

/// Alphabetic-only words inside the level's length window, deduplicated
/// case-insensitively, in order of first appearance.
fn candidate_words(sentence: &str, level: Level) -> Vec<String> {
    let (min_len, max_len) = word_window(level);
    let mut seen = Vec::new();
    let mut words = Vec::new();
    for token in sentence.split_whitespace() {
        let word = token.trim_matches(|c: char| !c.is_alphabetic());
        let len = word.chars().count();
        if len < min_len || len > max_len || !word.chars().all(char::is_alphabetic) {
            continue;
        }
        let folded = word.to_lowercase();
        if !seen.contains(&folded) {
            seen.push(folded);
            words.push(word.to_string());
        }
    }
    words
}

/// Blank out the first whole-word occurrence of `word` in `sentence`,
/// keeping surrounding punctuation. Matching is on whole tokens so that
/// `casa` never blanks the inside of `casas`.
fn mask_word(sentence: &str, word: &str) -> String {
    let mut masked = false;
    let tokens: Vec<String> = sentence
        .split_whitespace()
        .map(|token| {
            let core = token.trim_matches(|c: char| !c.is_alphabetic());
            if !masked && core == word {
                masked = true;
                token.replacen(core, BLANK, 1)
            } else {
                token.to_string()
            }
        })
        .collect();
    tokens.join(" ")
}

/// Build one cloze question from an article extract, or `None` when the
/// sentence or word pool is empty for this level.
fn build_cloze(extract: &str, level: Level, rng: &mut impl Rng) -> Option<Question> {
    let sentences = candidate_sentences(extract, level);
    if sentences.is_empty() {
        return None;
    }
    let sentence = &sentences[rng.gen_range(0..sentences.len())];

    let mut words = candidate_words(sentence, level);
    if words.len() < 4 {
        return None;
    }

    let masked = words.swap_remove(rng.gen_range(0..words.len()));
    let prompt = format!("Complete a frase: {}", mask_word(sentence, &masked));

    words.shuffle(rng);
    let mut options: Vec<String> = words.into_iter().take(3).collect();
    options.push(masked.clone());
    options.shuffle(rng);
    let correct = options.iter().position(|o| *o == masked)?;

    Question::new(prompt, options, correct).ok()
}
