use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;

use course_webhook::{routes, ConfigBuilder, SeaOrmPurchaseStore, WebhookReceiver};

/// Attaches a fresh UUID to each request as `x-request-id`.
#[derive(Clone, Default)]
struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let request_id = uuid::Uuid::new_v4().to_string().parse().ok()?;
        Some(RequestId::new(request_id))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    course_webhook::init_tracing();

    let config = ConfigBuilder::new().from_env().build()?;

    let database_url = config
        .database_url
        .clone()
        .context("DATABASE_URL is not set")?;
    let db = sea_orm::Database::connect(&database_url)
        .await
        .context("failed to connect to database")?;

    let store = SeaOrmPurchaseStore::new(db);
    store
        .ensure_schema()
        .await
        .context("failed to ensure purchases table")?;

    if config.webhook_secret.is_none() {
        tracing::warn!(
            "STRIPE_WEBHOOK_SECRET is not set; all webhook deliveries will be rejected"
        );
    }

    let receiver = Arc::new(WebhookReceiver::new(store, config.webhook_secret.clone()));

    let app = routes(receiver)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http());

    let addr = config.server.addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Webhook endpoint at http://{}/api/webhook", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Graceful shutdown signal handler
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
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, starting graceful shutdown");
        },
    }

    // Give connections a grace period to close
    tokio::time::sleep(Duration::from_secs(1)).await;
    tracing::info!("Shutdown complete");
}
