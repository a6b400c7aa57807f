use super::pool::BufferPool;
use super::sink::{Sink, StdoutSink, open_sink};
use crate::skipper::{any_of, skip_paths, skip_patterns};
use spool_core::config::{AccessLogSettings, MissingField};
use spool_core::handler::default_skipper;
use spool_core::{Skipper, SpoolError};
use spool_template::{DEFAULT_FORMAT, Template};
use std::sync::Arc;

/// Settings for the access logger gas.
///
/// Start from `LoggerConfig::default()` and override what you need; an empty
/// `format` falls back to [`DEFAULT_FORMAT`].
#[derive(Clone)]
pub struct LoggerConfig {
    /// Requests for which this returns true pass through unlogged.
    pub skipper: Skipper,
    /// Placeholders: `time_rfc3339`, `id`, `remote_ip`, `host`, `uri`,
    /// `method`, `path`, `referer`, `user_agent`, `status`, `latency`
    /// (microseconds), `latency_human`, `bytes_in`, `bytes_out`, and
    /// `header:<name>`.
    ///
    /// Example: `"{{.remote_ip}} {{.status}}\n"`.
    pub format: String,
    pub output: Arc<dyn Sink>,
    pub missing_field: MissingField,
    /// Idle render buffers kept for reuse.
    pub pool_capacity: usize,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            skipper: default_skipper(),
            format: DEFAULT_FORMAT.to_string(),
            output: Arc::new(StdoutSink),
            missing_field: MissingField::Empty,
            pool_capacity: 1024,
        }
    }
}

impl LoggerConfig {
    /// Runtime config from the config-file section. Opens the sink.
    pub fn from_settings(settings: &AccessLogSettings) -> Result<Self, SpoolError> {
        let mut skippers = Vec::new();
        if !settings.skip_paths.is_empty() {
            skippers.push(skip_paths(settings.skip_paths.iter().cloned()));
        }
        if !settings.skip_patterns.is_empty() {
            skippers.push(skip_patterns(&settings.skip_patterns)?);
        }
        let skipper = match skippers.len() {
            0 => default_skipper(),
            1 => skippers.remove(0),
            _ => any_of(skippers),
        };

        Ok(Self {
            skipper,
            format: settings.format.clone(),
            output: open_sink(settings)?,
            missing_field: settings.missing_field,
            pool_capacity: settings.pool_capacity,
        })
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_output(mut self, output: Arc<dyn Sink>) -> Self {
        self.output = output;
        self
    }

    pub fn with_skipper(mut self, skipper: Skipper) -> Self {
        self.skipper = skipper;
        self
    }

    pub fn with_missing_field(mut self, policy: MissingField) -> Self {
        self.missing_field = policy;
        self
    }

    /// Compile the format and allocate the buffer pool.
    pub(crate) fn compile(&self) -> Result<(Template, BufferPool), SpoolError> {
        let format = if self.format.is_empty() {
            DEFAULT_FORMAT
        } else {
            self.format.as_str()
        };
        let template = Template::compile(format)?.with_missing_field(self.missing_field);
        Ok((template, BufferPool::new(self.pool_capacity)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spool_core::config::OutputKind;

    #[test]
    fn default_config_uses_default_format() {
        let cfg = LoggerConfig::default();
        assert_eq!(cfg.format, DEFAULT_FORMAT);
        assert_eq!(cfg.missing_field, MissingField::Empty);
    }

    #[test]
    fn empty_format_falls_back_to_default() {
        let cfg = LoggerConfig::default().with_format("");
        let (template, _) = cfg.compile().unwrap();
        assert_eq!(template.as_str(), DEFAULT_FORMAT);
    }

    #[test]
    fn defaults_are_fresh_per_instance() {
        let a = LoggerConfig::default().with_format("{{.status}}");
        let b = LoggerConfig::default();
        assert_eq!(a.format, "{{.status}}");
        assert_eq!(b.format, DEFAULT_FORMAT);
    }

    #[test]
    fn bad_format_fails_compile() {
        let cfg = LoggerConfig::default().with_format("{{.status");
        assert!(matches!(cfg.compile(), Err(SpoolError::InvalidFormat { .. })));
    }

    #[test]
    fn from_settings_carries_fields() {
        let settings = AccessLogSettings {
            format: "{{.method}}\n".into(),
            output: OutputKind::Tracing,
            missing_field: MissingField::Error,
            pool_capacity: 3,
            ..Default::default()
        };
        let cfg = LoggerConfig::from_settings(&settings).unwrap();
        assert_eq!(cfg.format, "{{.method}}\n");
        assert_eq!(cfg.missing_field, MissingField::Error);
        assert_eq!(cfg.pool_capacity, 3);
    }

    #[test]
    fn from_settings_rejects_bad_skip_pattern() {
        let settings = AccessLogSettings {
            output: OutputKind::Tracing,
            skip_patterns: vec!["[".into()],
            ..Default::default()
        };
        assert!(matches!(
            LoggerConfig::from_settings(&settings),
            Err(SpoolError::ConfigError(_))
        ));
    }
}
