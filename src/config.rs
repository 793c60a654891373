use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Budget preset for the result store and context assembly.
/// Controls summarize_threshold, max_context_tokens and max_stored_results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    /// Small prompts for models with tight context windows.
    /// summarize_threshold=4000, max_context_tokens=8000, max_stored_results=5
    Strict,
    /// Large prompts for long-context models.
    /// summarize_threshold=50000, max_context_tokens=100000, max_stored_results=20
    Generous,
    /// Use individual environment variable settings.
    Custom,
}

impl OperatingMode {
    pub fn from_env() -> Self {
        match env::var("APPROVER_MODE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "strict" | "compact" | "small-context" => Self::Strict,
            "generous" | "long-context" | "large" => Self::Generous,
            _ => Self::Custom,
        }
    }
}

/// Endpoints of the external collaborators that supply prompt context.
/// Any unset endpoint simply contributes nothing to the prompt.
#[derive(Debug, Clone, Default)]
pub struct SourceEndpoints {
    pub tokens_url: Option<String>,
    pub environment_url: Option<String>,
    pub executor_status_url: Option<String>,
    pub pipedream_accounts_url: Option<String>,
    pub composio_accounts_url: Option<String>,
}

impl SourceEndpoints {
    fn from_env() -> Self {
        Self {
            tokens_url: non_empty_var("TOKENS_URL"),
            environment_url: non_empty_var("ENVIRONMENT_URL"),
            executor_status_url: non_empty_var("EXECUTOR_STATUS_URL"),
            pipedream_accounts_url: non_empty_var("PIPEDREAM_ACCOUNTS_URL"),
            composio_accounts_url: non_empty_var("COMPOSIO_ACCOUNTS_URL"),
        }
    }
}

pub struct Config {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
    /// Optional path to an MCP `list_tools` response loaded at startup.
    pub abilities_path: Option<PathBuf>,
    /// Where connector notes are persisted.
    pub notes_path: PathBuf,
    /// Ring buffer capacity for stored tool results.
    pub max_stored_results: usize,
    /// Estimated tokens above which a stored result is summarized.
    pub summarize_threshold: usize,
    /// Token budget shared by all stored results when rendered into context.
    pub max_context_tokens: usize,
    /// Default number of search matches when the caller does not ask.
    pub default_max_results: usize,
    /// How long gathered context facts are reused. Zero disables the cache.
    pub context_cache_ttl: Duration,
    /// Per-request timeout applied to collaborator fetches.
    pub fetch_timeout: Duration,
    pub endpoints: SourceEndpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            shutdown_timeout_secs: 5,
            abilities_path: None,
            notes_path: PathBuf::from(".approver/notes.json"),
            max_stored_results: 10,
            summarize_threshold: 25_000,
            max_context_tokens: 25_000,
            default_max_results: 5,
            context_cache_ttl: Duration::from_secs(30),
            fetch_timeout: Duration::from_secs(10),
            endpoints: SourceEndpoints::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// The `APPROVER_MODE` environment variable controls budget presets:
    /// - `strict`: small prompts (threshold=4000, budget=8000, 5 stored results)
    /// - `generous`: long-context prompts (threshold=50000, budget=100000, 20 stored results)
    /// - Unset or other: uses individual env vars or defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let mode = OperatingMode::from_env();

        let (summarize_threshold, max_context_tokens, max_stored_results) = match mode {
            OperatingMode::Strict => (4_000, 8_000, 5),
            OperatingMode::Generous => (50_000, 100_000, 20),
            OperatingMode::Custom => (
                env::var("SUMMARIZE_THRESHOLD")
                    .unwrap_or_else(|_| "25000".to_string())
                    .parse()?,
                env::var("MAX_CONTEXT_TOKENS")
                    .unwrap_or_else(|_| "25000".to_string())
                    .parse()?,
                env::var("MAX_STORED_RESULTS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
            ),
        };

        let config = Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8787".to_string())
                .parse()?,
            shutdown_timeout_secs: env::var("SHUTDOWN_TIMEOUT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
            abilities_path: non_empty_var("ABILITIES_PATH").map(PathBuf::from),
            notes_path: PathBuf::from(
                env::var("NOTES_PATH").unwrap_or_else(|_| ".approver/notes.json".to_string()),
            ),
            max_stored_results,
            summarize_threshold,
            max_context_tokens,
            default_max_results: env::var("DEFAULT_MAX_RESULTS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
            context_cache_ttl: Duration::from_secs(
                env::var("CONTEXT_CACHE_TTL")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()?,
            ),
            fetch_timeout: Duration::from_secs(
                env::var("FETCH_TIMEOUT")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
            ),
            endpoints: SourceEndpoints::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject budget combinations the result store cannot honour.
    ///
    /// A threshold above the context budget would let the newest unsummarized
    /// result overflow the budget on its own.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_stored_results == 0 {
            anyhow::bail!("MAX_STORED_RESULTS must be at least 1");
        }
        if self.summarize_threshold > self.max_context_tokens {
            anyhow::bail!(
                "SUMMARIZE_THRESHOLD ({}) must not exceed MAX_CONTEXT_TOKENS ({})",
                self.summarize_threshold,
                self.max_context_tokens
            );
        }
        Ok(())
    }

    /// Returns the operating mode based on current configuration.
    pub fn mode(&self) -> OperatingMode {
        OperatingMode::from_env()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
