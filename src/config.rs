use std::env;

/// Trait for types that resolve their configuration from environment
/// variables, consulting a local `.env` file first via dotenvy.
pub trait KeyFromEnv {
    /// The environment variable name for this value.
    const KEY_NAME: &'static str;

    /// Find the value by checking the `.env` file, then the environment.
    fn find_key() -> Option<String> {
        // Load .env silently; a missing file is fine.
        let _ = dotenvy::dotenv();
        env::var(Self::KEY_NAME).ok()
    }
}

/// Configuration for the AI question backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Chat-completions endpoint (OpenRouter-compatible).
    pub endpoint: String,
    /// Bearer token for the backend.
    pub api_key: String,
    /// Model identifier passed through to the backend.
    pub model: String,
    /// Sampling temperature for question generation.
    pub temperature: f32,
}

pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "anthropic/claude-3-5-haiku";

struct BackendUrl;
impl KeyFromEnv for BackendUrl {
    const KEY_NAME: &'static str = "IMPULSO_BACKEND_URL";
}

struct BackendKey;
impl KeyFromEnv for BackendKey {
    const KEY_NAME: &'static str = "OPENROUTER_API_KEY";
}

impl BackendConfig {
    /// Build a config from the environment. Returns `None` when no API key is
    /// available, in which case callers should pick a network-free source.
    pub fn from_env() -> Option<Self> {
        let api_key = BackendKey::find_key()?;
        let endpoint = BackendUrl::find_key().unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        Some(Self {
            endpoint,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
        })
    }
}
