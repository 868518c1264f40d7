//! Trivia API adapter: fetches one multiple-choice question from a public
//! trivia database, translates it to pt-BR, and rebuilds it as a validated
//! [`Question`] with a shuffled option order.

use std::fmt::Debug;
use std::sync::Mutex;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::SourceError;
use crate::level::Level;
use crate::question::{Question, OPTION_COUNT};
use crate::sources::QuestionSource;

const TRIVIA_ENDPOINT: &str = "https://opentdb.com/api.php";

/// Coarse difficulty bucket the trivia API understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn from_level(level: Level) -> Self {
        match level.get() {
            1..=3 => Self::Easy,
            4..=7 => Self::Medium,
            _ => Self::Hard,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

#[derive(Debug, Deserialize)]
struct TriviaResponse {
    response_code: u8,
    results: Vec<TriviaItem>,
}

#[derive(Debug, Deserialize)]
struct TriviaItem {
    question: String,
    correct_answer: String,
    incorrect_answers: Vec<String>,
}

/// Translation seam. The production implementation goes through an HTTP
/// translation API; tests and offline runs plug in [`NoTranslate`].
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    async fn translate(&self, text: &str) -> Result<String, SourceError>;
    fn clone_box(&self) -> Box<dyn Translator>;
}

impl Clone for Box<dyn Translator> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Identity translator.
#[derive(Debug, Clone, Default)]
pub struct NoTranslate;

#[async_trait]
impl Translator for NoTranslate {
    async fn translate(&self, text: &str) -> Result<String, SourceError> {
        Ok(text.to_string())
    }

    fn clone_box(&self) -> Box<dyn Translator> {
        Box::new(self.clone())
    }
}

/// en → pt-BR translation via the MyMemory public API.
#[derive(Debug, Clone)]
pub struct MyMemoryTranslator {
    client: Client,
}

#[derive(Debug, Deserialize)]
struct MyMemoryResponse {
    #[serde(rename = "responseData")]
    response_data: MyMemoryData,
}

#[derive(Debug, Deserialize)]
struct MyMemoryData {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

impl MyMemoryTranslator {
    pub fn new() -> Self {
        Self { client: Client::new() }
    }
}

impl Default for MyMemoryTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Translator for MyMemoryTranslator {
    async fn translate(&self, text: &str) -> Result<String, SourceError> {
        let response = self
            .client
            .get("https://api.mymemory.translated.net/get")
            .query(&[("q", text), ("langpair", "en|pt-BR")])
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(SourceError::Api {
                status: response.status().as_u16(),
                message: "translation API error".to_string(),
            });
        }
        let body: MyMemoryResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;
        Ok(body.response_data.translated_text)
    }

    fn clone_box(&self) -> Box<dyn Translator> {
        Box::new(self.clone())
    }
}

/// Question source backed by the public trivia database.
#[derive(Debug)]
pub struct TriviaSource {
    client: Client,
    translator: Box<dyn Translator>,
    rng: Mutex<StdRng>,
}

impl TriviaSource {
    pub fn new() -> Self {
        Self::with_translator(Box::new(MyMemoryTranslator::new()))
    }

    pub fn with_translator(translator: Box<dyn Translator>) -> Self {
        Self {
            client: Client::new(),
            translator,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

impl Default for TriviaSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for TriviaSource {
    fn clone(&self) -> Self {
        let rng = self.rng.lock().unwrap_or_else(|p| p.into_inner()).clone();
        Self {
            client: self.client.clone(),
            translator: self.translator.clone(),
            rng: Mutex::new(rng),
        }
    }
}

#[async_trait]
impl QuestionSource for TriviaSource {
    #[instrument(skip(self), fields(level = level.get()))]
    async fn fetch(&self, level: Level) -> Result<Question, SourceError> {
        let difficulty = Difficulty::from_level(level);
        debug!(difficulty = difficulty.as_str(), "fetching trivia question");

        let response = self
            .client
            .get(TRIVIA_ENDPOINT)
            .query(&[
                ("amount", "1"),
                ("type", "multiple"),
                ("difficulty", difficulty.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SourceError::Api {
                status: response.status().as_u16(),
                message: "trivia API error".to_string(),
            });
        }

        let body: TriviaResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;
        if body.response_code != 0 {
            warn!(code = body.response_code, "trivia API reported a non-zero response code");
            return Err(SourceError::Api {
                status: 200,
                message: format!("trivia response code {}", body.response_code),
            });
        }
        let item = body.results.into_iter().next().ok_or(SourceError::Api {
            status: 200,
            message: "trivia response contained no questions".to_string(),
        })?;

        let mut prompt = self.translator.translate(&decode_entities(&item.question)).await?;
        if level.get() <= 3 {
            prompt = simplify_phrasing(&prompt);
        }
        let correct = self
            .translator
            .translate(&decode_entities(&item.correct_answer))
            .await?;
        let mut incorrect = Vec::with_capacity(item.incorrect_answers.len());
        for answer in &item.incorrect_answers {
            incorrect.push(self.translator.translate(&decode_entities(answer)).await?);
        }

        build_question(prompt, correct, incorrect, &self.rng)
    }

    fn name(&self) -> &'static str {
        "trivia"
    }

    fn clone_box(&self) -> Box<dyn QuestionSource> {
        Box::new(self.clone())
    }
}

/// Combine 1 correct + 3 incorrect answers into a shuffled `Question`.
fn build_question(
    prompt: String,
    correct: String,
    incorrect: Vec<String>,
    rng: &Mutex<StdRng>,
) -> Result<Question, SourceError> {
    let mut options: Vec<String> = incorrect.into_iter().take(OPTION_COUNT - 1).collect();
    options.push(correct.clone());
    {
        let mut rng = rng.lock().unwrap_or_else(|p| p.into_inner());
        options.shuffle(&mut *rng);
    }
    let correct_index = options
        .iter()
        .position(|o| *o == correct)
        .unwrap_or_default();
    Ok(Question::new(prompt, options, correct_index)?)
}

/// Fixed substitutions that soften encyclopedic interrogative phrasing for
/// low levels.
const SIMPLIFICATIONS: &[(&str, &str)] = &[
    ("Qual das seguintes alternativas", "Qual"),
    ("Qual das seguintes opções", "Qual"),
    ("Qual das seguintes", "Qual"),
    ("Qual dos seguintes", "Qual"),
    ("Qual destas", "Qual"),
    ("Qual destes", "Qual"),
];

fn simplify_phrasing(prompt: &str) -> String {
    for (pattern, replacement) in SIMPLIFICATIONS {
        if prompt.len() >= pattern.len()
            && prompt.is_char_boundary(pattern.len())
            && prompt[..pattern.len()].eq_ignore_ascii_case(pattern)
        {
            return format!("{replacement}{}", &prompt[pattern.len()..]);
        }
    }
    prompt.to_string()
}

/// Minimal HTML entity decoding for trivia payloads (`&quot;`, `&#039;` etc).
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';') {
            Some(semi) if semi <= 8 => {
                let entity = &tail[1..semi];
                match decode_entity(entity) {
                    Some(ch) => out.push(ch),
                    None => out.push_str(&tail[..=semi]),
                }
                rest = &tail[semi + 1..];
            }
            _ => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "quot" => Some('"'),
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        "eacute" => Some('é'),
        "aacute" => Some('á'),
        "ouml" => Some('ö'),
        _ => {
            let code = if let Some(hex) = entity.strip_prefix("#x").or(entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok()?
            } else {
                return None;
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_buckets() {
        assert_eq!(Difficulty::from_level(Level::new(1)), Difficulty::Easy);
        assert_eq!(Difficulty::from_level(Level::new(3)), Difficulty::Easy);
        assert_eq!(Difficulty::from_level(Level::new(4)), Difficulty::Medium);
        assert_eq!(Difficulty::from_level(Level::new(7)), Difficulty::Medium);
        assert_eq!(Difficulty::from_level(Level::new(8)), Difficulty::Hard);
        assert_eq!(Difficulty::from_level(Level::new(10)), Difficulty::Hard);
    }

    #[test]
    fn entity_decoding() {
        assert_eq!(decode_entities("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(decode_entities("&quot;ok&quot;"), "\"ok\"");
        assert_eq!(decode_entities("it&#039;s"), "it's");
        assert_eq!(decode_entities("caf&#xE9;"), "café");
        assert_eq!(decode_entities("no entities"), "no entities");
        assert_eq!(decode_entities("dangling & amp"), "dangling & amp");
    }

    #[test]
    fn simplification_applies_only_at_start() {
        assert_eq!(
            simplify_phrasing("Qual das seguintes opções é um planeta?"),
            "Qual é um planeta?"
        );
        assert_eq!(simplify_phrasing("Onde fica Qual das seguintes?"), "Onde fica Qual das seguintes?");
    }

    #[test]
    fn build_question_marks_correct_after_shuffle() {
        let rng = Mutex::new(StdRng::seed_from_u64(3));
        let q = build_question(
            "Qual é a maior?".to_string(),
            "baleia-azul".to_string(),
            vec!["elefante".into(), "girafa".into(), "orca".into()],
            &rng,
        )
        .unwrap();
        assert_eq!(q.correct_text(), "baleia-azul");
        assert_eq!(q.options().len(), 4);
    }
}
