use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;
use crate::error::GenerationError;

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    config: GenerationConfig,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, config: GenerationConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            config,
        }
    }

    /// Runs `/api/generate`, retrying failed attempts with a linearly growing pause
    /// (`retry_delay * attempt`). Fails once every attempt has failed.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError> {
        let attempts = self.config.retry_attempts.max(1);
        let mut last_err = None;

        for attempt in 1..=attempts {
            match self.generate_once(prompt).await {
                Ok(text) => return Ok(text),
                Err(err) => {
                    tracing::error!(
                        "ollama request failed (attempt {}/{}): {:#}",
                        attempt,
                        attempts,
                        err
                    );
                    last_err = Some(err);
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.config.retry_delay * attempt).await;
            }
        }

        Err(GenerationError::Exhausted {
            attempts,
            last_error: last_err
                .map(|err| format!("{err:#}"))
                .unwrap_or_else(|| "no attempt was made".to_string()),
        })
    }

    async fn generate_once(&self, prompt: &str) -> Result<String> {
        #[derive(Serialize)]
        struct GenerateReq<'a> {
            model: &'a str,
            prompt: &'a str,
            stream: bool,
            options: GenerateOptions<'a>,
        }

        #[derive(Serialize)]
        struct GenerateOptions<'a> {
            num_predict: usize,
            temperature: f32,
            top_p: f32,
            frequency_penalty: f32,
            stop: &'a [String],
        }

        #[derive(Deserialize)]
        struct GenerateResp {
            response: String,
        }

        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(url)
            .timeout(self.config.timeout)
            .json(&GenerateReq {
                model: &self.config.model,
                prompt,
                stream: false,
                options: GenerateOptions {
                    num_predict: self.config.max_output_tokens,
                    temperature: self.config.temperature,
                    top_p: self.config.top_p,
                    frequency_penalty: self.config.frequency_penalty,
                    stop: &self.config.stop,
                },
            })
            .send()
            .await
            .context("failed to call ollama generate endpoint")?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "ollama /api/generate returned {status}: {}",
                normalize_err_body(&body)
            );
        }

        let response = response
            .json::<GenerateResp>()
            .await
            .context("failed to decode ollama generate response")?;

        Ok(response.response.trim().to_string())
    }
}

fn normalize_err_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(err) = json.get("error").and_then(|v| v.as_str()) {
            return err.to_string();
        }
    }

    trimmed.to_string()
}
