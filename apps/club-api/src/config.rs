/// Club API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Maximum connections in the Postgres pool.
    pub db_pool_size: usize,
    /// Hugging Face API token. When unset, the remote summarization backend
    /// is not configured and summaries fall back to truncation.
    pub hf_token: Option<String>,
    /// Summarization model identifier on the inference API.
    pub hf_summarization_model: String,
    /// Base URL of the summarization inference API. Overridable so tests can
    /// point at a local mock server.
    pub summary_api_url: String,
    /// Kick off a background summary generation right after post creation.
    pub summary_warm_cache: bool,
    /// Session lifetime in seconds.
    pub session_ttl_seconds: i64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Panics with a descriptive message if a required variable is missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_var("DATABASE_URL"),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4003),
            db_pool_size: std::env::var("DB_POOL_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),
            hf_token: std::env::var("HF_TOKEN").ok().filter(|s| !s.is_empty()),
            hf_summarization_model: std::env::var("HF_SUMMARIZATION_MODEL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "facebook/bart-large-cnn".to_string()),
            summary_api_url: std::env::var("SUMMARY_API_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "https://router.huggingface.co/hf-inference".to_string()),
            summary_warm_cache: std::env::var("SUMMARY_WARM_CACHE")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
            session_ttl_seconds: std::env::var("SESSION_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60 * 60 * 24 * 14),
        }
    }
}

fn required_var(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{name} env var is required"))
}
