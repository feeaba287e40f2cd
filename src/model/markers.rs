use crate::model::LocationRecord;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const COORD_SCALE: f64 = 100_000.0; // 5 decimal places

/// Map marker for one coordinate group
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkerGroup {
    /// Latitude rounded to 5 decimal places
    pub latitude: f64,

    /// Longitude rounded to 5 decimal places
    pub longitude: f64,

    /// Sum of email counts over all records in this group
    pub email_count: i64,

    /// One entry per contributing record, in store order
    pub sources: Vec<MarkerSource>,
}

/// A single record's contribution to a marker popup
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkerSource {
    pub ip_address: String,
    pub from: Option<String>,
    pub from_name: Option<String>,
    pub subject: Option<String>,
    pub country: Option<String>,
    pub country_flag: Option<String>,
    pub email_count: i64,
}

/// Group records by coordinate rounded to 5 decimal places, merging
/// markers at (near-)identical positions. Records lacking either
/// coordinate are skipped. Groups preserve the first-seen order of the
/// input array.
pub fn group_by_coordinates(records: &[LocationRecord]) -> Vec<MarkerGroup> {
    let mut groups: Vec<MarkerGroup> = Vec::new();
    let mut index: std::collections::HashMap<(i64, i64), usize> = std::collections::HashMap::new();

    for record in records {
        let (lat, lon) = match (record.latitude, record.longitude) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => continue,
        };

        let key = ((lat * COORD_SCALE).round() as i64, (lon * COORD_SCALE).round() as i64);
        let source = MarkerSource {
            ip_address: record.ip_address.clone(),
            from: raw_field(record, "From"),
            from_name: raw_field(record, "FromName"),
            subject: raw_field(record, "Subject"),
            country: record.country.clone(),
            country_flag: record.country_flag.clone(),
            email_count: record.email_count,
        };

        match index.get(&key) {
            Some(&i) => {
                groups[i].email_count += record.email_count;
                groups[i].sources.push(source);
            }
            None => {
                index.insert(key, groups.len());
                groups.push(MarkerGroup {
                    latitude: key.0 as f64 / COORD_SCALE,
                    longitude: key.1 as f64 / COORD_SCALE,
                    email_count: record.email_count,
                    sources: vec![source],
                });
            }
        }
    }

    groups
}

fn raw_field(record: &LocationRecord, name: &str) -> Option<String> {
    record
        .raw_data
        .get(name)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(ip: &str, lat: Option<f64>, lon: Option<f64>, count: i64) -> LocationRecord {
        LocationRecord {
            ip_address: ip.to_string(),
            latitude: lat,
            longitude: lon,
            country: Some("Germany".to_string()),
            country_flag: Some("https://flagcdn.com/de.png".to_string()),
            raw_data: json!({
                "From": format!("{}@example.com", ip),
                "FromName": "Sender",
                "Subject": "hello"
            }),
            email_count: count,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_merges_records_within_rounding_distance() {
        let records = vec![
            record("192.0.2.1", Some(52.520004), Some(13.405001), 3),
            record("192.0.2.2", Some(52.52), Some(13.405), 2),
        ];
        let groups = group_by_coordinates(&records);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].latitude, 52.52);
        assert_eq!(groups[0].longitude, 13.405);
        assert_eq!(groups[0].email_count, 5);
        assert_eq!(groups[0].sources.len(), 2);
        assert_eq!(groups[0].sources[0].ip_address, "192.0.2.1");
        assert_eq!(groups[0].sources[1].ip_address, "192.0.2.2");
    }

    #[test]
    fn test_separates_records_past_rounding_distance() {
        let records = vec![
            record("192.0.2.1", Some(52.52), Some(13.405), 1),
            record("192.0.2.2", Some(52.52001), Some(13.405), 1),
        ];
        let groups = group_by_coordinates(&records);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_skips_records_without_coordinates() {
        let records = vec![
            record("192.0.2.1", None, Some(13.405), 1),
            record("192.0.2.2", Some(52.52), None, 1),
            record("192.0.2.3", Some(52.52), Some(13.405), 1),
        ];
        let groups = group_by_coordinates(&records);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].sources[0].ip_address, "192.0.2.3");
    }

    #[test]
    fn test_preserves_first_seen_order() {
        let records = vec![
            record("192.0.2.1", Some(10.0), Some(10.0), 1),
            record("192.0.2.2", Some(-33.0), Some(151.0), 1),
            record("192.0.2.3", Some(10.0), Some(10.0), 1),
        ];
        let groups = group_by_coordinates(&records);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].latitude, 10.0);
        assert_eq!(groups[1].latitude, -33.0);
        assert_eq!(groups[0].sources.len(), 2);
    }

    #[test]
    fn test_popup_fields_come_from_raw_payload() {
        let records = vec![record("192.0.2.1", Some(1.0), Some(2.0), 1)];
        let groups = group_by_coordinates(&records);
        let source = &groups[0].sources[0];
        assert_eq!(source.from.as_deref(), Some("192.0.2.1@example.com"));
        assert_eq!(source.from_name.as_deref(), Some("Sender"));
        assert_eq!(source.subject.as_deref(), Some("hello"));
    }
}
