//! HTTP server
//!
//! Router assembly and the listening loop with graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::handlers::{
    buy_furniture_handler, campaign_handler, campaigns_handler, credentials_handler, did_handler,
    email_login_handler, furniture_catalog_handler, health_handler, metamask_login_handler,
    user_handler, verify_credential_handler, verify_donation_handler,
};
use crate::config::ServerConfig;
use crate::context::AppContext;

const MAX_REQUEST_BODY_SIZE: usize = 256 * 1024;

/// Build the application router
///
/// Layer order is bottom-up: the first `.layer` call is the innermost.
pub fn build_router(ctx: Arc<AppContext>) -> Router {
    let cors = build_cors_layer(&ctx.config.server);
    let timeout = Duration::from_secs(ctx.config.server.request_timeout_secs);

    Router::new()
        .route("/health", get(health_handler))
        .route("/verify-donation", post(verify_donation_handler))
        .route("/user/:address", get(user_handler))
        .route("/buy-furniture", post(buy_furniture_handler))
        .route("/furniture", get(furniture_catalog_handler))
        .route("/did/:address", get(did_handler))
        .route("/campaigns", get(campaigns_handler))
        .route("/campaigns/:id", get(campaign_handler))
        .route("/credentials/verify", post(verify_credential_handler))
        .route("/credentials/:did", get(credentials_handler))
        .route("/auth/email", post(email_login_handler))
        .route("/auth/metamask", post(metamask_login_handler))
        .layer(axum::extract::DefaultBodyLimit::max(MAX_REQUEST_BODY_SIZE))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(ctx)
}

/// CORS from configuration; no origins configured means any origin
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if config.cors_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Bind and serve until Ctrl-C
pub async fn serve(ctx: Arc<AppContext>) -> Result<()> {
    let addr = ctx.config.server.bind_addr;
    let app = build_router(ctx);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Donation Village API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
