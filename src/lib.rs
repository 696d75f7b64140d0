//! Stripe checkout webhook receiver for course purchases.
//!
//! Receives asynchronous Stripe notifications on `POST /api/webhook`,
//! verifies the `Stripe-Signature` header against a shared signing secret,
//! and records a `(course_id, user_id)` purchase row when a
//! `checkout.session.completed` event carries both identifiers in its
//! checkout metadata. Everything else answers with a fixed status/body pair
//! that Stripe's redelivery policy keys off.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use course_webhook::{routes, ConfigBuilder, InMemoryPurchaseStore, WebhookReceiver};
//!
//! #[tokio::main]
//! async fn main() {
//!     course_webhook::init_tracing();
//!
//!     let config = ConfigBuilder::new().from_env().build().unwrap();
//!     let receiver = Arc::new(WebhookReceiver::new(
//!         InMemoryPurchaseStore::new(),
//!         config.webhook_secret.clone(),
//!     ));
//!
//!     let app = routes(receiver);
//!     let listener = tokio::net::TcpListener::bind(config.server.addr().unwrap())
//!         .await
//!         .unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod receiver;
pub mod sea_orm_store;
pub mod signature;
pub mod store;

pub use config::{Config, ConfigBuilder, LoggingConfig, ServerConfig};
pub use error::{Result, WebhookError};
pub use event::{CheckoutSession, Event, EventKind, CHECKOUT_SESSION_COMPLETED};
pub use receiver::{routes, WebhookOutcome, WebhookReceiver};
pub use sea_orm_store::SeaOrmPurchaseStore;
pub use store::{InMemoryPurchaseStore, Purchase, PurchaseStore};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing with sensible defaults.
///
/// Respects `RUST_LOG`, falling back to `info`. Set
/// `COURSE_WEBHOOK_LOG_JSON=true` for JSON output.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("COURSE_WEBHOOK_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
