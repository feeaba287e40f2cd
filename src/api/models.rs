//! API data models
//!
//! This module defines the data structures used in API responses.

use crate::model::LocationRecord;
use crate::service::resolver::{Geolocation, Source};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Stored location record as returned by the read endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationResponse {
    /// Sender IP address (unique)
    pub ip_address: String,

    pub latitude: Option<f64>,

    pub longitude: Option<f64>,

    pub country: Option<String>,

    /// Flag image URL
    pub country_flag: Option<String>,

    /// Original webhook payload of the first-seen email
    #[schema(value_type = Object)]
    pub raw_data: Value,

    /// Number of emails received from this IP
    pub email_count: i64,

    pub created_at: String,

    pub updated_at: String,
}

impl From<LocationRecord> for LocationResponse {
    fn from(record: LocationRecord) -> Self {
        LocationResponse {
            ip_address: record.ip_address,
            latitude: record.latitude,
            longitude: record.longitude,
            country: record.country,
            country_flag: record.country_flag,
            raw_data: record.raw_data,
            email_count: record.email_count,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Statistics response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Number of distinct sender IPs
    pub total_locations: usize,

    /// Total emails received across all IPs
    pub total_emails: i64,

    /// Timestamp of the most recent update
    pub last_received: Option<String>,
}

/// Error response for the read endpoints
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Error code (optional)
    pub code: Option<String>,
}

/// Successful webhook acknowledgement
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    pub success: bool,
    pub source: Source,
    pub original_email_data: OriginalEmailData,
    pub geolocation: Geolocation,
    pub email_count: i64,
    pub ip_address: String,
}

/// Selected fields echoed back from the webhook payload
#[derive(Debug, Serialize)]
pub struct OriginalEmailData {
    #[serde(rename = "From")]
    pub from: Option<String>,

    #[serde(rename = "Subject")]
    pub subject: Option<String>,
}
