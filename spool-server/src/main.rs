// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Spool — templated HTTP access logging
//
//  Host:    synchronous gas chain behind an axum bridge
//  Logging: one rendered line per request, pooled buffers
//  Config:  YAML file + SPOOL_* environment overrides
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use clap::Parser;
use spool_core::{Context, HandlerFunc, SpoolConfig, SpoolError};
use spool_gases::{LoggerConfig, logger_with_config, request_id};
use spool_host::{App, Service, server};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "spool", version, about = "Spool — templated HTTP access logging")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "spool.yaml")]
    config: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Listen address, overrides `server.addr`
    #[arg(long)]
    addr: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Tracing ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_target(false)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Spool starting");

    // ── Config ──
    let mut config = if cli.config.exists() {
        info!(path = %cli.config.display(), "Loading config file");
        SpoolConfig::load(&cli.config)?
    } else {
        info!("No config file found, using defaults");
        SpoolConfig::default()
    };
    if let Some(addr) = cli.addr {
        config.server.addr = addr;
    }

    // ── Pipeline ──
    let service = build_service(&config)?;

    // ── Serve ──
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    rt.block_on(async {
        server::serve(
            &config.server.addr,
            service,
            config.server.body_limit_bytes,
            shutdown_signal(),
        )
        .await
    })?;

    info!("Spool stopped");
    Ok(())
}

/// Request id first so the access log sees the id on every line.
fn build_service(config: &SpoolConfig) -> anyhow::Result<Arc<Service>> {
    let mut app = App::new();
    app.gas(request_id());

    let settings = &config.access_log;
    if settings.enabled {
        let logger_config = LoggerConfig::from_settings(settings)?;
        app.gas(logger_with_config(logger_config)?);
        info!(output = ?settings.output, "Access log enabled");
    } else {
        info!("Access log disabled");
    }

    let index: HandlerFunc = Arc::new(|ctx: &mut Context| {
        ctx.response.string(200, "spool is running\n");
        Ok(())
    });
    let health: HandlerFunc = Arc::new(|ctx: &mut Context| {
        ctx.response.json(200, &serde_json::json!({ "status": "ok" }))
    });
    let echo: HandlerFunc = Arc::new(|ctx: &mut Context| {
        let body = ctx.request.body.clone();
        ctx.response.write_header(200);
        ctx.response.write(&body);
        Ok(())
    });
    let fail: HandlerFunc = Arc::new(|_: &mut Context| -> Result<(), SpoolError> {
        Err(SpoolError::Internal("intentional failure".to_string()))
    });

    app.get("/", index)
        .get("/health", health)
        .post("/echo", echo)
        .get("/fail", fail);

    Ok(app.build())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received, stopping...");
}
