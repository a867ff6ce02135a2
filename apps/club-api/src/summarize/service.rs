//! Ordered fallback chain over summarization backends.

use crate::config::Config;
use crate::summarize::backend::SummaryBackend;
use crate::summarize::fallback::{truncate_fallback, MIN_SUMMARIZABLE_CHARS};
use crate::summarize::hf::HfInferenceBackend;

/// Result of a summarization attempt. Never an error: when every backend
/// fails, `text` carries the truncation fallback and `fallback` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryOutcome {
    pub text: String,
    pub fallback: bool,
    /// Human-readable diagnostic, set on fallback.
    pub detail: Option<String>,
}

/// Process-wide summarization resource, built once at startup and shared
/// through `AppState`.
pub struct SummaryService {
    backends: Vec<Box<dyn SummaryBackend>>,
}

impl SummaryService {
    pub fn new(backends: Vec<Box<dyn SummaryBackend>>) -> Self {
        Self { backends }
    }

    /// Assemble the backend chain from configuration. Without an API token
    /// there is no remote backend and every summary is a truncation fallback.
    pub fn from_config(config: &Config) -> Self {
        let mut backends: Vec<Box<dyn SummaryBackend>> = Vec::new();

        if let Some(token) = &config.hf_token {
            backends.push(Box::new(HfInferenceBackend::new(
                &config.summary_api_url,
                token,
                &config.hf_summarization_model,
            )));
            tracing::info!(model = %config.hf_summarization_model, "summarization backend configured");
        } else {
            tracing::warn!("HF_TOKEN not set; summaries will use the truncation fallback");
        }

        Self::new(backends)
    }

    /// Summarize `text`, trying each backend in order.
    ///
    /// Inputs below the summarizable threshold are returned verbatim and not
    /// flagged. Backend failures are logged and recovered locally.
    pub async fn summarize(&self, text: &str) -> SummaryOutcome {
        if text.trim().chars().count() < MIN_SUMMARIZABLE_CHARS {
            return SummaryOutcome {
                text: text.to_string(),
                fallback: false,
                detail: None,
            };
        }

        let mut last_failure: Option<String> = None;

        for backend in &self.backends {
            match backend.summarize(text).await {
                Ok(summary) => {
                    tracing::debug!(
                        backend = backend.name(),
                        chars = summary.chars().count(),
                        "summary generated"
                    );
                    return SummaryOutcome {
                        text: summary,
                        fallback: false,
                        detail: None,
                    };
                }
                Err(e) => {
                    tracing::warn!(backend = backend.name(), error = %e, "summarization backend failed");
                    last_failure = Some(format!("{}: {e}", backend.name()));
                }
            }
        }

        let detail = match last_failure {
            Some(failure) => format!("Summarization unavailable ({failure}); showing an excerpt"),
            None => "No summarization backend configured; showing an excerpt".to_string(),
        };

        SummaryOutcome {
            text: truncate_fallback(text),
            fallback: true,
            detail: Some(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarize::backend::{BackendError, SummaryBackend};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedBackend {
        output: &'static str,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SummaryBackend for FixedBackend {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn summarize(&self, _text: &str) -> Result<String, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.output.to_string())
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl SummaryBackend for FailingBackend {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn summarize(&self, _text: &str) -> Result<String, BackendError> {
            Err(BackendError::Malformed("boom".to_string()))
        }
    }

    fn long_text() -> String {
        "The annual general meeting covered the budget, elections, and plans. ".repeat(10)
    }

    #[tokio::test]
    async fn short_input_returned_verbatim() {
        let service = SummaryService::new(vec![Box::new(FailingBackend)]);
        let outcome = service.summarize("Too short to bother.").await;
        assert_eq!(outcome.text, "Too short to bother.");
        assert!(!outcome.fallback);
        assert!(outcome.detail.is_none());
    }

    #[tokio::test]
    async fn first_successful_backend_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = SummaryService::new(vec![
            Box::new(FailingBackend),
            Box::new(FixedBackend {
                output: "A concise summary.",
                calls: calls.clone(),
            }),
        ]);

        let outcome = service.summarize(&long_text()).await;
        assert_eq!(outcome.text, "A concise summary.");
        assert!(!outcome.fallback);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn all_backends_failing_yields_flagged_truncation() {
        let service = SummaryService::new(vec![Box::new(FailingBackend)]);
        let text = long_text();

        let outcome = service.summarize(&text).await;
        assert!(outcome.fallback);
        assert!(outcome.text.ends_with("..."));
        assert!(text.starts_with(outcome.text.trim_end_matches("...")));
        assert!(outcome.detail.as_deref().unwrap().contains("failing"));
    }

    #[tokio::test]
    async fn no_backends_yields_flagged_truncation() {
        let service = SummaryService::new(vec![]);
        let outcome = service.summarize(&long_text()).await;
        assert!(outcome.fallback);
        assert!(outcome
            .detail
            .as_deref()
            .unwrap()
            .contains("No summarization backend configured"));
    }
}
