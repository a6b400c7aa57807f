use crate::error::SpoolError;
use figment::{Figment, providers::{Env, Format, Yaml}};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpoolConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub access_log: AccessLogSettings,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Request bodies above this size are rejected before reaching handlers.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

/// Access log settings as they appear in the config file.
///
/// Turned into a runtime logger config (template compiled, sink opened) by
/// the gases crate. An empty `format` selects the default JSON line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessLogSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub output: OutputKind,
    #[serde(default)]
    pub file: FileOutputConfig,
    /// Exact request paths that are never logged.
    #[serde(default)]
    pub skip_paths: Vec<String>,
    /// Regex patterns over the request path; a match skips logging.
    #[serde(default)]
    pub skip_patterns: Vec<String>,
    #[serde(default)]
    pub missing_field: MissingField,
    /// Upper bound on idle render buffers kept for reuse.
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,
}

/// Where rendered access log lines are written.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    #[default]
    Stdout,
    Stderr,
    /// Emit each line as a `tracing` event on the `access_log` target.
    Tracing,
    File,
}

/// What a placeholder renders when its value is absent.
///
/// Only `header:` placeholders can be absent; the fixed fields always have a
/// value.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MissingField {
    /// Render nothing.
    #[default]
    Empty,
    /// Fail the render; the line is dropped.
    Error,
}

/// Append-only access log file with rotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutputConfig {
    #[serde(default = "default_file_path")]
    pub path: PathBuf,
    /// 0 = size-based rotation disabled (daily rotation only).
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
    /// 0 = keep every rotated file.
    #[serde(default = "default_max_rotated_files")]
    pub max_rotated_files: usize,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_addr() -> String { "0.0.0.0:8080".into() }
fn default_body_limit() -> usize { 1024 * 1024 }
fn default_true() -> bool { true }
fn default_pool_capacity() -> usize { 1024 }
fn default_file_path() -> PathBuf { PathBuf::from("logs/access.log") }
fn default_max_file_size() -> u64 { 100 * 1024 * 1024 }
fn default_max_rotated_files() -> usize { 30 }

// ── Impls ─────────────────────────────────────────────────────

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl Default for AccessLogSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            format: String::new(),
            output: OutputKind::Stdout,
            file: FileOutputConfig::default(),
            skip_paths: Vec::new(),
            skip_patterns: Vec::new(),
            missing_field: MissingField::Empty,
            pool_capacity: default_pool_capacity(),
        }
    }
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            path: default_file_path(),
            max_file_size_bytes: default_max_file_size(),
            max_rotated_files: default_max_rotated_files(),
        }
    }
}

impl SpoolConfig {
    /// Load configuration from YAML file + env overrides.
    ///
    /// Environment variables use the `SPOOL_` prefix and `__` between nested
    /// keys, e.g. `SPOOL_ACCESS_LOG__FORMAT`.
    pub fn load(path: &Path) -> Result<Self, SpoolError> {
        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("SPOOL_").split("__"))
            .extract()
            .map_err(|e| SpoolError::ConfigError(e.to_string()))
    }
}
