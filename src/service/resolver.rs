//! Lookup-or-fetch resolution of a sender IP to a geolocation.
//!
//! Known IPs are answered from the store with a count bump; unknown
//! IPs go to the external API and are persisted. Store failures after
//! the geolocation is already in hand degrade the result (with an
//! explicit warning) instead of failing the webhook.

use crate::dao::SqliteDB;
use crate::error::{AtlasError, Result};
use crate::model::{LocationRecord, NewLocation};
use crate::service::geo_client::{GeoClient, GeoFetch};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

/// Where a resolution's geolocation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Database,
    Api,
}

/// Non-fatal degradation attached to an otherwise successful resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveWarning {
    /// Count increment failed; the count comes from the stale initial read
    StaleCount,
    /// Insert failed; the geolocation was returned but not persisted
    NotPersisted,
}

/// Normalized geolocation for the webhook response. City is only known
/// on the live-API path (it is never persisted), so database-sourced
/// responses omit it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Geolocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub country: Option<String>,
    pub country_flag: Option<String>,
}

impl Geolocation {
    fn from_record(record: &LocationRecord) -> Self {
        Geolocation {
            latitude: record.latitude,
            longitude: record.longitude,
            city: None,
            country: record.country.clone(),
            country_flag: record.country_flag.clone(),
        }
    }
}

#[derive(Debug)]
pub struct Resolution {
    pub source: Source,
    pub geolocation: Geolocation,
    pub email_count: i64,
    pub warning: Option<ResolveWarning>,
}

#[derive(Clone)]
pub struct GeoResolver {
    db: SqliteDB,
    geo: GeoClient,
}

impl GeoResolver {
    pub fn new(db: SqliteDB, geo: GeoClient) -> Self {
        GeoResolver { db, geo }
    }

    /// Resolve an IP to a geolocation and the running email count. The
    /// raw payload is persisted alongside a first-seen IP's record.
    pub async fn resolve(&self, ip: &str, raw_payload: &Value) -> Result<Resolution> {
        let existing = self
            .db
            .get_location_by_ip(ip)
            .map_err(|e| AtlasError::Database(e.to_string()))?;

        if let Some(existing) = existing {
            debug!("Found IP in store: {}", ip);
            let updated = match self.db.increment_email_count(ip) {
                Ok(updated) => updated,
                Err(e) => {
                    warn!("Count increment failed for {}: {}", ip, e);
                    None
                }
            };
            return Ok(existing_resolution(existing, updated));
        }

        debug!("IP not in store, querying geolocation API: {}", ip);
        let fetched = self.geo.fetch(ip).await?;

        let location = NewLocation {
            ip_address: ip.to_string(),
            latitude: fetched.latitude,
            longitude: fetched.longitude,
            country: fetched.country.clone(),
            country_flag: fetched.country_flag.clone(),
            raw_data: raw_payload.clone(),
        };

        let persisted = match self.db.insert_location(&location) {
            Ok(count) => Some(count),
            Err(e) => {
                error!("Failed to persist location for {}: {}", ip, e);
                None
            }
        };

        Ok(fresh_resolution(fetched, persisted))
    }
}

/// Build the response for a known IP. A missing updated record means
/// the increment lost to a concurrent delete or errored; answer from
/// the stale initial read rather than failing.
fn existing_resolution(existing: LocationRecord, updated: Option<LocationRecord>) -> Resolution {
    match updated {
        Some(record) => Resolution {
            source: Source::Database,
            geolocation: Geolocation::from_record(&record),
            email_count: record.email_count,
            warning: None,
        },
        None => Resolution {
            source: Source::Database,
            geolocation: Geolocation::from_record(&existing),
            email_count: existing.email_count,
            warning: Some(ResolveWarning::StaleCount),
        },
    }
}

/// Build the response for a first-seen IP. A failed insert still
/// returns the fetched geolocation with the default count.
fn fresh_resolution(fetched: GeoFetch, persisted_count: Option<i64>) -> Resolution {
    let warning = if persisted_count.is_none() {
        Some(ResolveWarning::NotPersisted)
    } else {
        None
    };

    Resolution {
        source: Source::Api,
        geolocation: Geolocation {
            latitude: fetched.latitude,
            longitude: fetched.longitude,
            city: fetched.city,
            country: fetched.country,
            country_flag: fetched.country_flag,
        },
        email_count: persisted_count.unwrap_or(1),
        warning,
    }
}
