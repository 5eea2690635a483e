use anyhow::{Context, Result};
use axum::routing::post;
use axum::Router;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use push_hub::config::Config;
use push_hub::handlers;
use push_hub::http_client::HttpGateway;
use push_hub::hub::Hub;
use push_hub::queue::NotifyQueue;
use push_hub::state::AppState;
use push_hub::store::Store;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let config = Config::from_env().context("load configuration")?;
    tracing_subscriber::fmt().with_env_filter(EnvFilter::new(&config.log_level)).init();

    let queue = NotifyQueue::open(&config.notify_queue_db).context("open notify queue")?;
    let hub = Hub::new(Store::new(), HttpGateway::new(reqwest::Client::new()), queue, config.self_url.clone());
    let bind_addr = config.bind_addr;
    let state = AppState::new(hub, config);

    let app = Router::new()
        .route("/publish", post(handlers::publish::publish))
        .route("/subscribe", post(handlers::subscribe::subscribe))
        .route("/listen", post(handlers::listen::listen))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = TcpListener::bind(bind_addr).await.with_context(|| format!("bind {bind_addr}"))?;
    info!(addr = %bind_addr, "hub listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { info!("received Ctrl+C, shutting down"); },
        _ = terminate => { info!("received SIGTERM, shutting down"); },
    }
}
