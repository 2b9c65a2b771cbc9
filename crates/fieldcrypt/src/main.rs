//! `fieldcrypt` — field encryption service entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline (tracing + optional OTLP).
//! 3. Select the key source: KMS in production, derived key otherwise.
//! 4. Build the [`KeyManager`] and initialise the first key.
//! 5. Spawn background key rotation, if configured.
//! 6. Build the Axum router and serve until Ctrl-C, then release keys.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tracing::info;

use fieldcrypt::{
    aws::AwsClients,
    config::{Config, KeySourceSetting},
    dek::{self, DerivedKeySource, KeyManager, KeySource, ManagedKeySource, ManagerOptions},
    server::{self, state::AppState},
    telemetry,
};

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        runtime_mode = %cfg.runtime_mode,
        listen_port = cfg.listen_port,
        "fieldcrypt starting"
    );

    // -----------------------------------------------------------------------
    // 3. Key source
    // -----------------------------------------------------------------------
    let source: Arc<dyn KeySource> = match cfg.key_source() {
        KeySourceSetting::Managed { key_id, endpoint } => {
            let aws = AwsClients::init(endpoint.as_deref()).await?;
            Arc::new(ManagedKeySource::new(Arc::new(aws), key_id))
        }
        KeySourceSetting::Derived { secret } => {
            Arc::new(DerivedKeySource::new(secret.as_deref()))
        }
    };

    // -----------------------------------------------------------------------
    // 4. Key manager
    // -----------------------------------------------------------------------
    let keys = KeyManager::new(
        source,
        ManagerOptions {
            versioned_envelopes: cfg.versioned_envelopes,
            max_key_versions: cfg.max_key_versions,
        },
    );
    keys.initialize()
        .await
        .context("failed to initialise encryption key")?;

    // -----------------------------------------------------------------------
    // 5. Background tasks
    // -----------------------------------------------------------------------
    let rotation = (cfg.key_rotation_interval_secs > 0).then(|| {
        dek::rotation_task(
            keys.clone(),
            Duration::from_secs(cfg.key_rotation_interval_secs),
        )
    });

    // -----------------------------------------------------------------------
    // 6. HTTP server
    // -----------------------------------------------------------------------
    let router = server::router::build(AppState::new(keys.clone()));

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(rotation) = rotation {
        rotation.abort();
        // Cancelled before the keys are released.
        let _ = rotation.await;
    }
    keys.shutdown().await;
    telemetry::shutdown_telemetry();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
