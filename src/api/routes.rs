//! API route definitions
//!
//! This module defines all API routes and their configurations.

use actix_web::web;
use utoipa::OpenApi;

use crate::api::handlers;
use crate::api::models;

/// Configure the webhook ingest route
pub fn config_webhook_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/inbound-email", web::post().to(handlers::inbound_email));
}

/// Configure location read routes
pub fn config_location_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/locations")
            .route("", web::get().to(handlers::get_locations))
            .route("/markers", web::get().to(handlers::get_markers)),
    );
}

/// Configure statistics routes
pub fn config_stats_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/stats", web::get().to(handlers::get_stats));
}

/// Configure service routes
pub fn config_service_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health))
        .route("/openapi.json", web::get().to(handlers::openapi_spec));
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_locations,
        handlers::get_markers,
        handlers::get_stats,
        handlers::health,
    ),
    components(
        schemas(
            models::LocationResponse,
            models::StatsResponse,
            models::ErrorResponse,
            crate::model::MarkerGroup,
            crate::model::MarkerSource,
        )
    ),
    tags(
        (name = "Locations", description = "Stored location endpoints"),
        (name = "Statistics", description = "Statistics endpoints"),
        (name = "Service", description = "Service endpoints"),
    )
)]
pub struct ApiDoc;
