use duo_site_service::{
    AppState, DefaultAppState, config::SiteConfig, document::GALLERY_MOUNT, repositories::SheetDbSource,
    routes::create_router,
};
use std::time::Duration;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("duo_site_service=debug".parse().expect("static directive")),
        )
        .init();

    let config = SiteConfig::from_env().unwrap_or_else(|err| {
        error!(error = %err, "Invalid configuration");
        std::process::exit(1);
    });

    let source = SheetDbSource::new(config.endpoint.clone(), config.fetch_timeout)
        .unwrap_or_else(|err| {
            error!(error = %err, "Failed to build HTTP client");
            std::process::exit(1);
        });

    let app_state = DefaultAppState::for_site(config.gallery_options(GALLERY_MOUNT), source)
        .unwrap_or_else(|err| {
            error!(error = %err, "Failed to mount gallery");
            std::process::exit(1);
        });

    info!(endpoint = %config.endpoint, "Loading gallery content");
    app_state.gallery().spawn_reload();

    let app = create_router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(
                    config.fetch_timeout + Duration::from_secs(5),
                )),
        )
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .unwrap_or_else(|err| {
            error!(bind_address = %config.bind_address, error = %err, "Failed to bind to address");
            std::process::exit(1);
        });

    info!(bind_address = %config.bind_address, "Server running");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    if let Err(err) = server.await {
        error!(error = %err, "Server error");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, finishing in-flight requests");
}
