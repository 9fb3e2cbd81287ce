use anyhow::Context;

use mixerp_api::app::{AppServices, build_app};
use mixerp_auth::Actor;
use mixerp_infra::config::AppConfig;
use mixerp_infra::dedup::ScanRunner;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    mixerp_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let services = AppServices::from_config(&config)
        .await
        .context("failed to initialise services")?;

    let runner = config.scan_interval.map(|interval| {
        tracing::info!(interval_secs = interval.as_secs(), "scheduled duplicate scans enabled");
        ScanRunner {
            interval: Some(interval),
            ..ScanRunner::default()
        }
        .spawn(services.detector.clone(), Actor::system(config.system_actor.clone()))
    });

    let app = build_app(services);

    let addr = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(runner) = runner {
        runner.shutdown().await;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
