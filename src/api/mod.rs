//! API module for the email geolocation tracker
//!
//! This module provides the webhook ingest endpoint and the REST
//! endpoints consumed by the map frontend.

mod handlers;
pub mod models;
mod routes;

use actix_web::web;

/// Initialize API routes
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(routes::config_webhook_routes)
            .configure(routes::config_location_routes)
            .configure(routes::config_stats_routes)
            .configure(routes::config_service_routes),
    );
}

/// Re-export ApiDoc for OpenAPI documentation
pub use routes::ApiDoc;
