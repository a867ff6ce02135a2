//! Hugging Face Inference API summarization backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::summarize::backend::{BackendError, SummaryBackend};

/// Remote summarization over the hosted inference API.
pub struct HfInferenceBackend {
    client: reqwest::Client,
    base_url: String,
    token: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_length: u32,
    min_length: u32,
}

#[derive(Debug, Deserialize)]
struct InferenceResult {
    summary_text: Option<String>,
}

impl HfInferenceBackend {
    pub fn new(base_url: &str, token: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            model: model.to_string(),
        }
    }

    /// BART-family models reject long inputs with index errors, so they get
    /// a tighter character budget and the model-default token caps.
    fn is_bart(&self) -> bool {
        self.model.to_lowercase().contains("bart")
    }

    fn max_input_chars(&self) -> usize {
        if self.is_bart() {
            1500
        } else {
            4000
        }
    }

    fn parameters(&self) -> InferenceParameters {
        if self.is_bart() {
            InferenceParameters {
                max_length: 142,
                min_length: 56,
            }
        } else {
            InferenceParameters {
                max_length: 1000,
                min_length: 50,
            }
        }
    }
}

#[async_trait]
impl SummaryBackend for HfInferenceBackend {
    fn name(&self) -> &'static str {
        "hf-inference"
    }

    async fn summarize(&self, text: &str) -> Result<String, BackendError> {
        let limit = self.max_input_chars();
        let input: String = if text.chars().count() > limit {
            tracing::debug!(model = %self.model, limit, "truncating summarization input");
            text.chars().take(limit).collect()
        } else {
            text.to_string()
        };

        let url = format!("{}/models/{}", self.base_url, self.model);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&InferenceRequest {
                inputs: &input,
                parameters: self.parameters(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        // The API answers `[{"summary_text": "…"}]`.
        let results: Vec<InferenceResult> = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;

        let summary = results
            .into_iter()
            .next()
            .and_then(|r| r.summary_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| BackendError::Malformed("empty summary_text".to_string()))?;

        Ok(summary)
    }
}
