//! Access logger gas.
//!
//! Wraps the next handler, times it, and writes one templated line per
//! request to the configured sink once the response is final.

pub mod config;
pub mod pool;
pub mod record;
pub mod sink;

pub use config::LoggerConfig;
pub use pool::{BufferPool, PooledBuffer};
pub use record::build_record;
pub use sink::{MemorySink, RotatingFileSink, Sink, StderrSink, StdoutSink, TracingSink};

use spool_core::{Context, Gas, HandlerFunc, Skipper, SpoolError};
use spool_template::Template;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Logger gas with the default config (JSON lines to stdout).
pub fn logger() -> Result<Gas, SpoolError> {
    logger_with_config(LoggerConfig::default())
}

/// Logger gas from config. Fails if the format does not compile.
pub fn logger_with_config(config: LoggerConfig) -> Result<Gas, SpoolError> {
    let logger = Arc::new(AccessLogger::new(config)?);
    Ok(Arc::new(move |next: HandlerFunc| -> HandlerFunc {
        let logger = Arc::clone(&logger);
        Arc::new(move |ctx: &mut Context| logger.handle(&next, ctx))
    }))
}

/// Compiled logger state shared by every request.
pub struct AccessLogger {
    skipper: Skipper,
    template: Template,
    output: Arc<dyn Sink>,
    pool: BufferPool,
}

impl AccessLogger {
    pub fn new(config: LoggerConfig) -> Result<Self, SpoolError> {
        let (template, pool) = config.compile()?;
        debug!(format = template.as_str(), "Access logger compiled");
        Ok(Self {
            skipper: config.skipper,
            template,
            output: config.output,
            pool,
        })
    }

    /// Run `next` and log the outcome. Returns `next`'s result unchanged.
    pub fn handle(&self, next: &HandlerFunc, ctx: &mut Context) -> Result<(), SpoolError> {
        if (self.skipper)(ctx) {
            return next(ctx);
        }

        let start = Instant::now();
        let result = next(ctx);
        if let Err(ref err) = result {
            if !ctx.error_handled() {
                ctx.handle_error(err);
            }
        }
        let latency = start.elapsed();

        self.log(ctx, latency);
        result
    }

    fn log(&self, ctx: &Context, latency: Duration) {
        let mut buf = self.pool.acquire();
        let record = build_record(&self.template, ctx, latency);
        match self.template.render(&record, &mut *buf) {
            Ok(()) => {
                if let Err(e) = self.output.write_line(&buf) {
                    debug!(error = %e, "Access log write failed");
                }
            }
            Err(e) => debug!(error = %e, "Access log line dropped"),
        }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }
}
