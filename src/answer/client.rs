use crate::answer::{AnswerError, AnswerService};
use crate::config::AnswerConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Returned when the service answers without any content
pub const NO_ANSWER: &str = "No answer found.";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for an OpenAI-compatible `chat/completions` endpoint
pub struct ChatCompletionsClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl ChatCompletionsClient {
    pub fn new(
        api_base: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, AnswerError> {
        let defaults = AnswerConfig::default();
        let endpoint = completions_endpoint(api_base)?;
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            model: model.into(),
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
        })
    }

    /// Builds a client, reading the API key from `config.api_key_env`
    pub fn from_config(config: &AnswerConfig) -> Result<Self, AnswerError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AnswerError::MissingApiKey(config.api_key_env.clone()))?;

        Ok(Self::new(&config.api_base, api_key, config.model.clone())?
            .with_sampling(config.temperature, config.max_tokens))
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl AnswerService for ChatCompletionsClient {
    async fn complete(&self, prompt: &str) -> Result<String, AnswerError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        tracing::debug!("Requesting completion from {} ({})", self.endpoint, self.model);

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!("Completion request failed with {}: {}", status, message);
            return Err(AnswerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response.json().await?;
        let answer = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .unwrap_or_else(|| NO_ANSWER.to_string());

        Ok(answer)
    }
}

fn completions_endpoint(api_base: &str) -> Result<Url, AnswerError> {
    let mut base = api_base.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }

    Url::parse(&base)
        .and_then(|base| base.join("chat/completions"))
        .map_err(|e| AnswerError::InvalidBase(format!("{}: {}", api_base, e)))
}
