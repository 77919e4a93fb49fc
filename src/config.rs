//! Configuration for the simulation server and CLI.
//!
//! Settings are read from `statesandbox.toml` and layered as
//! file → environment → CLI flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! schema_path = "dimensions.toml"   # optional, replaces the built-in schema
//!
//! [generator]
//! backend = "openai"                # or "claude-cli"
//! base_url = "https://api.openai.com/v1"
//! api_key_env = "OPENAI_API_KEY"
//! low_model = "gpt-4.1-mini"
//! medium_model = "o4-mini"
//! high_model = "o3"
//! request_timeout_secs = 300
//! claude_cmd = "claude"
//!
//! [turn]
//! period_months = 12
//! max_policy_chars = 1000
//! # sampler_seed = 42
//!
//! [guard]
//! stale_after_secs = 600
//! sweep_interval_secs = 600
//!
//! [stream]
//! heartbeat_interval_ms = 2000
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8000
//!
//! [logging]
//! level = "info"
//! format = "pretty"                 # or "json"
//! # dir = "logs"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::schema::DocumentSchema;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "statesandbox.toml";

/// Which text generator implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeneratorBackend {
    /// OpenAI-compatible chat completions endpoint (default)
    #[default]
    Openai,
    /// Local `claude` CLI in print mode
    ClaudeCli,
}

impl std::fmt::Display for GeneratorBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorBackend::Openai => write!(f, "openai"),
            GeneratorBackend::ClaudeCli => write!(f, "claude-cli"),
        }
    }
}

impl std::str::FromStr for GeneratorBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(GeneratorBackend::Openai),
            "claude-cli" | "claude" => Ok(GeneratorBackend::ClaudeCli),
            _ => anyhow::bail!(
                "Invalid generator backend '{}'. Valid values: openai, claude-cli",
                s
            ),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Text generator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub backend: GeneratorBackend,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_low_model")]
    pub low_model: String,
    #[serde(default = "default_medium_model")]
    pub medium_model: String,
    #[serde(default = "default_high_model")]
    pub high_model: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_claude_cmd")]
    pub claude_cmd: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            backend: GeneratorBackend::default(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            low_model: default_low_model(),
            medium_model: default_medium_model(),
            high_model: default_high_model(),
            request_timeout_secs: default_request_timeout_secs(),
            claude_cmd: default_claude_cmd(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_low_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_medium_model() -> String {
    "o4-mini".to_string()
}

fn default_high_model() -> String {
    "o3".to_string()
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_claude_cmd() -> String {
    "claude".to_string()
}

/// Turn pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnConfig {
    /// How far one turn advances the period key
    #[serde(default = "default_period_months")]
    pub period_months: u32,
    /// Player policy text beyond this many characters is cut off
    #[serde(default = "default_max_policy_chars")]
    pub max_policy_chars: usize,
    /// Fixed seed for the event sampler; entropy when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampler_seed: Option<u64>,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            period_months: default_period_months(),
            max_policy_chars: default_max_policy_chars(),
            sampler_seed: None,
        }
    }
}

fn default_period_months() -> u32 {
    12
}

fn default_max_policy_chars() -> usize {
    1000
}

/// Turn lock sweeper settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardConfig {
    #[serde(default = "default_guard_secs")]
    pub stale_after_secs: u64,
    #[serde(default = "default_guard_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: default_guard_secs(),
            sweep_interval_secs: default_guard_secs(),
        }
    }
}

impl GuardConfig {
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    /// Never zero; tokio intervals reject a zero period.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

fn default_guard_secs() -> u64 {
    600
}

/// Progress stream settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
        }
    }
}

impl StreamConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms.max(1))
    }
}

fn default_heartbeat_interval_ms() -> u64 {
    2000
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    /// Also write daily-rolling log files here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// The `statesandbox.toml` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SandboxToml {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_path: Option<PathBuf>,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub turn: TurnConfig,
    #[serde(default)]
    pub guard: GuardConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SandboxToml {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse statesandbox.toml")
    }

    /// Load the file if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Reject values no turn can run with.
    pub fn check(&self) -> Result<()> {
        anyhow::ensure!(
            self.turn.period_months > 0,
            "turn.period_months must be greater than 0: turns would not advance the period"
        );
        Ok(())
    }

    /// Check the configuration for values that are legal but probably wrong.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.turn.max_policy_chars == 0 {
            warnings.push("turn.max_policy_chars is 0: every policy will be dropped".to_string());
        }
        if self.guard.stale_after_secs < 60 {
            warnings.push(format!(
                "guard.stale_after_secs = {} is shorter than a typical turn; running turns may lose their lock",
                self.guard.stale_after_secs
            ));
        }
        if self.guard.sweep_interval_secs == 0 {
            warnings.push("guard.sweep_interval_secs must be greater than 0".to_string());
        }
        if self.stream.heartbeat_interval_ms == 0 {
            warnings.push("stream.heartbeat_interval_ms must be greater than 0".to_string());
        }
        if self.generator.backend == GeneratorBackend::Openai
            && !self.generator.base_url.starts_with("http")
        {
            warnings.push(format!(
                "generator.base_url '{}' is not an http(s) URL",
                self.generator.base_url
            ));
        }
        if let Some(path) = &self.schema_path
            && !path.exists()
        {
            warnings.push(format!("schema_path {} does not exist", path.display()));
        }

        warnings
    }
}

/// Effective configuration: the file plus environment overrides.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    pub toml: SandboxToml,
    pub api_key: Option<String>,
}

impl SandboxConfig {
    /// Load from `path` (or `statesandbox.toml` in the working directory) and
    /// apply overrides from the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let default_path = PathBuf::from(CONFIG_FILE_NAME);
        let toml = match path {
            Some(path) => SandboxToml::load(path)?,
            None => SandboxToml::load_or_default(&default_path)?,
        };
        Self::from_toml_with_env(toml, |key| std::env::var(key).ok())
    }

    /// Apply overrides using `env` as the variable source.
    pub fn from_toml_with_env<F>(mut toml: SandboxToml, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = env("STATESANDBOX_GENERATOR") {
            toml.generator.backend = backend.parse()?;
        }
        if let Some(cmd) = env("STATESANDBOX_CLAUDE_CMD") {
            toml.generator.claude_cmd = cmd;
        }
        if let Some(port) = env("STATESANDBOX_PORT") {
            toml.server.port = port
                .parse()
                .with_context(|| format!("STATESANDBOX_PORT '{}' is not a valid port", port))?;
        }
        toml.check()?;
        let api_key = env(&toml.generator.api_key_env).filter(|k| !k.trim().is_empty());
        Ok(Self { toml, api_key })
    }

    /// The configured document schema: the file at `schema_path`, or the built-in one.
    pub fn schema(&self) -> Result<DocumentSchema> {
        match &self.toml.schema_path {
            Some(path) => DocumentSchema::load(path),
            None => Ok(DocumentSchema::builtin()),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.toml.server.host, self.toml.server.port)
    }
}
