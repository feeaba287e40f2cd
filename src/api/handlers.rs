//! API request handlers
//!
//! This module contains the request handlers for all API endpoints.

use actix_web::{web, HttpResponse, Responder};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::api::models::*;
use crate::dao::SqliteDB;
use crate::model::{group_by_coordinates, InboundEmail, MarkerGroup};
use crate::service::GeoResolver;

/// Handle an inbound email webhook: extract the sender IP, resolve it
/// to a geolocation and acknowledge with the running email count.
pub async fn inbound_email(
    resolver: web::Data<GeoResolver>,
    body: web::Bytes,
) -> impl Responder {
    let raw: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            return webhook_error(
                HttpResponse::BadRequest(),
                &format!("Invalid webhook payload: {}", e),
            );
        }
    };

    let email: InboundEmail = match serde_json::from_value(raw.clone()) {
        Ok(email) => email,
        Err(e) => {
            return webhook_error(
                HttpResponse::BadRequest(),
                &format!("Invalid webhook payload: {}", e),
            );
        }
    };

    let Some(ip_address) = email.sender_ip() else {
        info!("IP address could not be extracted from webhook data");
        return webhook_error(
            HttpResponse::BadRequest(),
            "IP address not found in webhook data",
        );
    };

    match resolver.resolve(&ip_address, &raw).await {
        Ok(resolution) => {
            if let Some(warning) = resolution.warning {
                warn!("Degraded resolution for {}: {:?}", ip_address, warning);
            }
            info!(
                "Resolved {} via {:?} (email count: {})",
                ip_address, resolution.source, resolution.email_count
            );

            HttpResponse::Ok().json(WebhookAck {
                success: true,
                source: resolution.source,
                original_email_data: OriginalEmailData {
                    from: email.from,
                    subject: email.subject,
                },
                geolocation: resolution.geolocation,
                email_count: resolution.email_count,
                ip_address,
            })
        }
        Err(e) => {
            error!("Failed to resolve {}: {}", ip_address, e);
            webhook_error(HttpResponse::build(e.http_status()), &e.to_string())
        }
    }
}

fn webhook_error(mut builder: actix_web::HttpResponseBuilder, message: &str) -> HttpResponse {
    builder.json(json!({ "success": false, "error": message }))
}

/// Get all stored location records
#[utoipa::path(
    get,
    path = "/api/v1/locations",
    responses(
        (status = 200, description = "Successfully retrieved locations", body = Vec<LocationResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Locations"
)]
pub async fn get_locations(db: web::Data<SqliteDB>) -> impl Responder {
    match db.get_all_locations() {
        Ok(records) => {
            let locations: Vec<LocationResponse> =
                records.into_iter().map(LocationResponse::from).collect();
            HttpResponse::Ok().json(locations)
        }
        Err(e) => {
            error!("Failed to get locations: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to fetch IP locations".to_string(),
                code: Some("DATABASE_ERROR".to_string()),
            })
        }
    }
}

/// Get map markers grouped by rounded coordinate
#[utoipa::path(
    get,
    path = "/api/v1/locations/markers",
    responses(
        (status = 200, description = "Successfully retrieved markers", body = Vec<MarkerGroup>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Locations"
)]
pub async fn get_markers(db: web::Data<SqliteDB>) -> impl Responder {
    match db.get_all_locations() {
        Ok(records) => HttpResponse::Ok().json(group_by_coordinates(&records)),
        Err(e) => {
            error!("Failed to get markers: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to fetch IP locations".to_string(),
                code: Some("DATABASE_ERROR".to_string()),
            })
        }
    }
}

/// Get aggregate statistics
#[utoipa::path(
    get,
    path = "/api/v1/stats",
    responses(
        (status = 200, description = "Successfully retrieved statistics", body = StatsResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Statistics"
)]
pub async fn get_stats(db: web::Data<SqliteDB>) -> impl Responder {
    match db.get_stats() {
        Ok(stats) => HttpResponse::Ok().json(StatsResponse {
            total_locations: stats.total_locations,
            total_emails: stats.total_emails,
            last_received: stats.last_received,
        }),
        Err(e) => {
            error!("Failed to get statistics: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to retrieve statistics".to_string(),
                code: Some("DATABASE_ERROR".to_string()),
            })
        }
    }
}

/// Service health check
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service is up")
    ),
    tag = "Service"
)]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// Serve the OpenAPI document
pub async fn openapi_spec() -> impl Responder {
    use utoipa::OpenApi;
    HttpResponse::Ok().json(crate::api::ApiDoc::openapi())
}
