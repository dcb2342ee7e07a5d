//! Site Custody Service
//!
//! REST backend for field operations at managed sites (e.g. telecom towers).
//! Each site runs two independent state machines:
//!
//! - **Visitor access**: request → authorize → check-in → check-out
//! - **Key custody**: request → authorize → confirm borrow → return
//!
//! Completed visits and key loans are archived into bounded, newest-first
//! ledgers on the site.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Storage**: PostgreSQL with sqlx, or an in-memory store when no database is configured
//! - **Concurrency**: every lifecycle transition runs under a per-site lock
//! - **Format**: camelCase JSON requests/responses

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod services;
pub mod store;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::DEFAULT_MAX_BODY_BYTES, lifecycle::LifecyclePolicy, store::SiteStore};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SiteStore>,
    pub policy: LifecyclePolicy,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn SiteStore>, policy: LifecyclePolicy) -> Self {
        Self {
            store,
            policy,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Build the HTTP router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let body_limit = state.max_body_bytes;

    let api = Router::new()
        // Site registry
        .route(
            "/sites",
            get(handlers::sites::list_sites).post(handlers::sites::create_site),
        )
        .route(
            "/sites/{site_id}",
            get(handlers::sites::get_site).put(handlers::sites::update_site),
        )
        // Visitor access lifecycle
        .route("/access/request", post(handlers::access::request_access))
        .route(
            "/access/authorize/{site_id}",
            post(handlers::access::authorize_access),
        )
        .route(
            "/access/cancel/{site_id}",
            post(handlers::access::cancel_access),
        )
        .route(
            "/access/checkin/{site_id}",
            post(handlers::access::check_in),
        )
        .route(
            "/access/checkout/{site_id}",
            post(handlers::access::check_out),
        )
        // Key custody lifecycle
        .route("/keys/request", post(handlers::keys::request_key))
        .route(
            "/keys/authorize/{site_id}",
            post(handlers::keys::authorize_key),
        )
        .route("/keys/cancel/{site_id}", post(handlers::keys::cancel_key))
        .route(
            "/keys/confirm/{site_id}",
            post(handlers::keys::confirm_borrow),
        )
        .route("/keys/return/{site_id}", post(handlers::keys::return_key));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api", api)
        // Photos are sent inline, so allow large bodies
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
