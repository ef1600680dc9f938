//! Runtime settings.
//!
//! Settings are read once from an optional TOML file overlaid with
//! `GENQUEUE__SECTION__KEY` environment variables, validated, then passed to
//! constructors. Nothing else reads the environment.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

use crate::artifact::{
    domain::{DEFAULT_CONTENT_TYPE, DEFAULT_PATH_PREFIX},
    services::MaterializerSettings,
};
use crate::generation::domain::{DEFAULT_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL, PollPolicy};
use crate::logging::LoggingSettings;
use crate::prompt::domain::DEFAULT_ARCHETYPES;
use crate::queue::domain::{DEFAULT_MAX_RETRIES, QueueDepth, RetryPolicy};

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "GENQUEUE";

/// Separator between prefix, section and key in environment overrides.
pub const ENV_SEPARATOR: &str = "__";

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized.
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is present but unusable.
    #[error("invalid setting {field}: {reason}")]
    Invalid {
        /// Dotted path of the setting.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A setting required by the requested command is absent.
    #[error("missing setting {0}")]
    Missing(&'static str),
}

/// Queue engine limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    /// Attempts per task before it is abandoned.
    pub max_retries: u32,
    /// Longest self-continuing chain.
    pub max_queue_depth: u32,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            max_queue_depth: QueueDepth::DEFAULT_LIMIT.value(),
        }
    }
}

impl QueueSettings {
    /// Returns the retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `max_retries` is zero.
    pub fn retry_policy(&self) -> Result<RetryPolicy, ConfigError> {
        RetryPolicy::new(self.max_retries).map_err(|_| ConfigError::Invalid {
            field: "queue.max_retries",
            reason: "must be at least 1",
        })
    }

    /// Returns the depth limit.
    #[must_use]
    pub const fn max_depth(&self) -> QueueDepth {
        QueueDepth::new(self.max_queue_depth)
    }
}

/// Generation service connection and polling.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Submission endpoint.
    pub submit_url: String,
    /// Status endpoint.
    pub status_url: String,
    /// Bearer token.
    pub api_key: Option<String>,
    /// Generation type sent with submissions.
    pub generation_type: String,
    /// Outputs requested per job.
    pub output_count: u32,
    /// Status checks before a job is abandoned.
    pub poll_attempts: u32,
    /// Delay before each status check, in milliseconds.
    pub poll_interval_ms: u64,
    /// Per-request timeout, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            submit_url: "https://api.nanobananaapi.ai/api/v1/nanobanana/generate".to_owned(),
            status_url: "https://api.nanobananaapi.ai/api/v1/nanobanana/record-info".to_owned(),
            api_key: None,
            generation_type: "TEXTTOIAMGE".to_owned(),
            output_count: 1,
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
            poll_interval_ms: duration_millis(DEFAULT_POLL_INTERVAL),
            request_timeout_secs: 30,
        }
    }
}

impl GenerationSettings {
    /// Returns the polling policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `poll_attempts` is zero.
    pub fn poll_policy(&self) -> Result<PollPolicy, ConfigError> {
        PollPolicy::new(self.poll_attempts, Duration::from_millis(self.poll_interval_ms)).map_err(
            |_| ConfigError::Invalid {
                field: "generation.poll_attempts",
                reason: "must be at least 1",
            },
        )
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Optional chat-model refinement of rendered instructions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RefinementSettings {
    /// Chat completions endpoint.
    pub endpoint: String,
    /// Bearer token.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

const fn default_temperature() -> f32 {
    0.7
}

/// Instruction composition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Template file replacing the built-in template.
    pub template_path: Option<Utf8PathBuf>,
    /// Visual archetypes, picked by task identifier.
    pub archetypes: Vec<String>,
    /// Chat refinement; rendered templates are used as-is when absent.
    pub refinement: Option<RefinementSettings>,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            template_path: None,
            archetypes: DEFAULT_ARCHETYPES.iter().map(|&name| name.to_owned()).collect(),
            refinement: None,
        }
    }
}

/// Where artifacts are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// A directory on the local filesystem.
    #[default]
    Local,
    /// A public object bucket reached over HTTP.
    Bucket,
}

/// Artifact storage.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Selected backend.
    pub backend: StorageBackend,
    /// Root directory of the local backend.
    pub local_root: Utf8PathBuf,
    /// Public URL prefix of the local backend.
    pub public_base_url: String,
    /// Base URL of the bucket service.
    pub bucket_url: Option<String>,
    /// Bucket name.
    pub bucket: String,
    /// Bucket service key.
    pub service_key: Option<String>,
    /// Leading path segment of every artifact.
    pub path_prefix: String,
    /// Content type used when the fetched one is not an image type.
    pub default_content_type: String,
    /// Per-request timeout for downloads and uploads, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            local_root: Utf8PathBuf::from("artifacts"),
            public_base_url: "http://localhost:8080/artifacts".to_owned(),
            bucket_url: None,
            bucket: "event-images".to_owned(),
            service_key: None,
            path_prefix: DEFAULT_PATH_PREFIX.to_owned(),
            default_content_type: DEFAULT_CONTENT_TYPE.to_owned(),
            request_timeout_secs: 60,
        }
    }
}

impl StorageSettings {
    /// Returns the materializer naming settings.
    #[must_use]
    pub fn materializer(&self) -> MaterializerSettings {
        MaterializerSettings {
            path_prefix: self.path_prefix.clone(),
            default_content_type: self.default_content_type.clone(),
        }
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Task database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// `PostgreSQL` connection URL.
    pub url: Option<String>,
    /// Connection pool size.
    pub pool_size: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: 4,
        }
    }
}

impl DatabaseSettings {
    /// Returns the connection URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when no URL is configured.
    pub fn require_url(&self) -> Result<&str, ConfigError> {
        self.url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("database.url"))
    }
}

/// HTTP entry point.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Listen address.
    pub bind: String,
    /// URL continuations are posted to; derived from `bind` when absent.
    pub self_url: Option<String>,
    /// Bearer token attached to continuation requests.
    pub bearer_token: Option<String>,
    /// Timeout of continuation requests, in seconds.
    pub continuation_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_owned(),
            self_url: None,
            bearer_token: None,
            continuation_timeout_secs: 900,
        }
    }
}

impl ServerSettings {
    /// Returns the URL continuations are posted to.
    #[must_use]
    pub fn continuation_url(&self) -> String {
        self.self_url
            .clone()
            .unwrap_or_else(|| format!("http://{}/process", self.bind))
    }

    /// Returns the continuation request timeout.
    #[must_use]
    pub const fn continuation_timeout(&self) -> Duration {
        Duration::from_secs(self.continuation_timeout_secs)
    }
}

/// Complete runtime settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Queue engine limits.
    pub queue: QueueSettings,
    /// Generation service.
    pub generation: GenerationSettings,
    /// Instruction composition.
    pub prompt: PromptSettings,
    /// Artifact storage.
    pub storage: StorageSettings,
    /// Task database.
    pub database: DatabaseSettings,
    /// HTTP entry point.
    pub server: ServerSettings,
    /// Logging.
    pub logging: LoggingSettings,
}

impl Settings {
    /// Loads settings from `path` (when given) and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a source is unreadable or a value fails
    /// validation.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(file) = path {
            builder = builder.add_source(File::new(file.as_str(), FileFormat::Toml));
        }
        let settings: Self = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.validated()
    }

    /// Parses settings from TOML text without consulting the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the text does not parse or a value fails
    /// validation.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let settings: Self = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        settings.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        self.queue.retry_policy()?;
        self.generation.poll_policy()?;
        if self.queue.max_queue_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "queue.max_queue_depth",
                reason: "must be at least 1",
            });
        }
        if self.generation.output_count == 0 {
            return Err(ConfigError::Invalid {
                field: "generation.output_count",
                reason: "must be at least 1",
            });
        }
        if self.prompt.archetypes.is_empty() {
            return Err(ConfigError::Invalid {
                field: "prompt.archetypes",
                reason: "must list at least one archetype",
            });
        }
        Ok(self)
    }
}
