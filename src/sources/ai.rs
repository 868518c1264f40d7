//! AI backend adapter: asks a chat-completions backend to generate one
//! multiple-choice question and parses whatever comes back.
//!
//! The backend is prompted for a strict JSON payload (schema included in the
//! prompt), but replies range from clean JSON through prose-wrapped JSON to
//! the plain-text `Pergunta:` template. Both shapes are handled; the result
//! is always a validated [`Question`] or a typed [`SourceError`].

use async_trait::async_trait;
use reqwest::Client;
use schemars::schema_for;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::config::BackendConfig;
use crate::error::SourceError;
use crate::level::Level;
use crate::normalize::normalize;
use crate::parse::{extract_json_payload, parse_template};
use crate::question::{Question, QuestionPayload};
use crate::sources::QuestionSource;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Question source backed by a generative AI endpoint.
#[derive(Debug, Clone)]
pub struct AiSource {
    client: Client,
    config: BackendConfig,
    topic: Option<String>,
}

impl AiSource {
    pub fn new(config: BackendConfig) -> Self {
        Self { client: Client::new(), config, topic: None }
    }

    /// Scope generated questions to a subject. Optional; without it the
    /// backend picks general school topics.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    fn build_prompt(&self, level: Level) -> String {
        let subject = match &self.topic {
            Some(topic) => format!("sobre o tema \"{topic}\""),
            None => "sobre conteúdos escolares do ensino fundamental".to_string(),
        };
        // The backend works on a 1-100 difficulty scale.
        let difficulty = u16::from(level.get()) * 10;
        let base = format!(
            "Crie uma pergunta de múltipla escolha {subject} com nível de dificuldade {difficulty} \
             (em uma escala de 1 a 100, onde 1 é muito fácil e 100 é extremamente difícil).\n\n\
             A pergunta deve ser adequada para estudantes do ensino fundamental.\n\n\
             Forneça a pergunta, 4 opções de resposta (sendo apenas uma correta) e o índice da \
             resposta correta (0, 1, 2 ou 3).\n\n\
             Não inclua nenhum texto adicional, apenas o JSON."
        );
        add_schema_guidance(base)
    }

    async fn call_backend(&self, prompt: String) -> Result<String, SourceError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request to AI backend failed");
                SourceError::Network(e.to_string())
            })?;

        debug!(status = %response.status(), "received response from AI backend");

        if response.status() == 429 {
            warn!("AI backend rate limit exceeded");
            return Err(SourceError::RateLimit);
        }
        if response.status() == 401 {
            error!("AI backend authentication failed");
            return Err(SourceError::Authentication);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            error!(status, message, "AI backend returned an error");
            return Err(SourceError::Api { status, message });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(SourceError::Api {
                status: 200,
                message: "no choices in backend response".to_string(),
            })?;

        info!(response_len = content.len(), "received generated question text");
        Ok(content)
    }
}

/// Append the JSON schema of the expected payload to the prompt, so the model
/// knows the exact shape to produce.
fn add_schema_guidance(prompt: String) -> String {
    let schema = schema_for!(QuestionPayload);
    let schema_json = serde_json::to_string_pretty(&schema)
        .unwrap_or_else(|_| "{}".to_string());
    format!(
        "{prompt}\n\nResponda com JSON válido seguindo exatamente este esquema:\n```json\n{schema_json}\n```"
    )
}

/// Parse generated text into a `Question`: embedded JSON first (most
/// reliable), then the plain-text template with answer normalization.
pub fn question_from_text(text: &str) -> Result<Question, SourceError> {
    match extract_json_payload::<QuestionPayload>(text) {
        Ok(payload) => {
            let question = Question::try_from(payload)?;
            debug!("parsed question from embedded JSON payload");
            return Ok(question);
        }
        Err(json_err) => {
            debug!(error = %json_err, "no usable JSON payload, trying the text template");
        }
    }

    let template = parse_template(text)?;
    let options: Vec<String> = template.options.to_vec();
    let correct = normalize(&template.answer_text, &options).ok_or_else(|| {
        crate::error::NormalizeError::AnswerNotFound(template.answer_text.clone())
    })?;
    Ok(Question::new(template.prompt, options, correct)?)
}

#[async_trait]
impl QuestionSource for AiSource {
    #[instrument(skip(self), fields(level = level.get()))]
    async fn fetch(&self, level: Level) -> Result<Question, SourceError> {
        let prompt = self.build_prompt(level);
        let text = self.call_backend(prompt).await?;
        question_from_text(&text)
    }

    fn name(&self) -> &'static str {
        "ai"
    }

    fn clone_box(&self) -> Box<dyn QuestionSource> {
        Box::new(self.clone())
    }
}
