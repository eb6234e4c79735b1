//! Voice Gateway Server Entry Point

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use voice_gateway_config::{read_settings, Settings};
use voice_gateway_providers::ProviderFactory;
use voice_gateway_server::{create_router, init_metrics, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional overlay: config/{VOICE_GATEWAY_ENV}.toml
    let env = std::env::var("VOICE_GATEWAY_ENV").ok();
    let settings = read_settings(env.as_deref())?;

    init_tracing(&settings);
    // After tracing, so validation warnings are not lost
    settings.validate()?;
    tracing::info!("Starting voice gateway v{}", env!("CARGO_PKG_VERSION"));

    // Fail at startup, not on the first call
    let providers = ProviderFactory::create(&settings)?;
    tracing::info!(?providers, "Providers configured");

    let metrics = if settings.observability.metrics_enabled {
        let handle = init_metrics()?;
        tracing::info!("Prometheus metrics at /metrics");
        Some(handle)
    } else {
        None
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    tracing::info!(
        incoming = %settings.server.incoming_path,
        stream = %settings.server.stream_path,
        stream_url = %settings.server.resolved_stream_url(),
        "Telephony endpoints"
    );

    let app = create_router(AppState::new(settings, metrics));

    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

/// `RUST_LOG` wins; otherwise `observability.log_level` for our crates
fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &settings.observability.log_level;
        format!("voice_gateway={level},tower_http={level}").into()
    });

    let fmt_layer = if settings.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
