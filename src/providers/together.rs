use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::auth::Token;
use crate::config::TranslationConfig;
use crate::error::{Result, SentryLensError};
use crate::rate_limit::{RateCategory, RateLimiter};
use crate::summary::is_not_available;

#[async_trait]
pub trait Translator: Send + Sync {
    /// Never fails: on any problem the input comes back untouched.
    async fn translate(&self, text: &str) -> String;
}

/// Used when no translation key is configured.
#[derive(Debug, Default)]
pub struct PassthroughTranslator;

#[async_trait]
impl Translator for PassthroughTranslator {
    async fn translate(&self, text: &str) -> String {
        text.to_string()
    }
}

const TRANSLATION_PROMPT: &str = "Traduza o texto abaixo do inglês para o português do Brasil.
Regras:
- Mantenha exatamente como estão: nomes de tipos de erro e exceções, nomes de processos e sinais, \
frames de stack trace, identificadores, nomes de funções e variáveis, caminhos de arquivos, \
códigos de erro, nomes de protocolos e de filas.
- Mantenha a pontuação e a formatação originais.
- Traduza apenas o texto em linguagem natural ao redor desses termos.
- Responda somente com a tradução, sem comentários.

Texto:
";

const RATE_LIMITED_PAUSE: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: String,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    top_k: u32,
    repetition_penalty: f32,
    stop: [&'static str; 2],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: String,
}

pub struct TogetherTranslator {
    client: Client,
    endpoint: String,
    api_key: Token,
    model: String,
    limiter: Arc<RateLimiter>,
    rate_limited_pause: Duration,
}

impl TogetherTranslator {
    pub fn new(
        config: &TranslationConfig,
        api_key: Token,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent("SentryLens/0.1.0")
            .build()
            .map_err(|e| SentryLensError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            model: config.model.clone(),
            limiter,
            rate_limited_pause: RATE_LIMITED_PAUSE,
        })
    }

    #[cfg(test)]
    fn with_rate_limited_pause(mut self, pause: Duration) -> Self {
        self.rate_limited_pause = pause;
        self
    }

    fn request_body<'a>(&'a self, text: &str) -> CompletionRequest<'a> {
        CompletionRequest {
            model: &self.model,
            prompt: format!("{TRANSLATION_PROMPT}{text}\n\nTradução:"),
            max_tokens: 512,
            temperature: 0.3,
            top_p: 0.7,
            top_k: 50,
            repetition_penalty: 1.0,
            stop: ["</s>", "\n\n\n"],
        }
    }

    async fn complete(&self, text: &str) -> Result<Option<String>> {
        self.limiter.acquire(RateCategory::Translation).await;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.as_str())
            .json(&self.request_body(text))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(None);
        }
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(SentryLensError::Api { status, body });
        }

        let completion = response.json::<CompletionResponse>().await?;
        Ok(Some(
            completion
                .choices
                .into_iter()
                .next()
                .map(|c| c.text.trim().to_string())
                .unwrap_or_default(),
        ))
    }
}

#[async_trait]
impl Translator for TogetherTranslator {
    async fn translate(&self, text: &str) -> String {
        if is_not_available(text) {
            return text.to_string();
        }

        let mut outcome = self.complete(text).await;
        if matches!(outcome, Ok(None)) {
            warn!(
                "Translation rate limited, retrying once in {:?}",
                self.rate_limited_pause
            );
            tokio::time::sleep(self.rate_limited_pause).await;
            outcome = self.complete(text).await;
        }

        match outcome {
            Ok(Some(translated)) if !translated.is_empty() => {
                debug!("Translated {} chars", text.len());
                translated
            }
            Ok(Some(_)) => {
                warn!("Translation returned an empty completion, keeping original text");
                text.to_string()
            }
            Ok(None) => {
                warn!("Translation still rate limited, keeping original text");
                text.to_string()
            }
            Err(e) => {
                warn!("Translation failed, keeping original text: {e}");
                text.to_string()
            }
        }
    }
}
