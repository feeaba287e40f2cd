use serde_json::Value;

/// Stored geolocation record, one per distinct sender IP
#[derive(Debug, Clone)]
pub struct LocationRecord {
    pub ip_address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub country: Option<String>,
    pub country_flag: Option<String>,
    /// Original webhook payload of the first-seen email
    pub raw_data: Value,
    pub email_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Insert shape for a first-seen IP. The store fills email_count (1)
/// and both timestamps.
#[derive(Debug, Clone)]
pub struct NewLocation {
    pub ip_address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub country: Option<String>,
    pub country_flag: Option<String>,
    pub raw_data: Value,
}
