use crate::model::{LocationRecord, NewLocation};
use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Aggregate counters for the stats endpoint
#[derive(Debug)]
pub struct LocationStats {
    pub total_locations: usize,
    pub total_emails: i64,
    pub last_received: Option<String>,
}

#[derive(Clone)]
pub struct SqliteDB {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDB {
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS ip_locations (
                ip_address TEXT PRIMARY KEY,
                latitude REAL,
                longitude REAL,
                country TEXT,
                country_flag TEXT,
                raw_data TEXT NOT NULL,
                email_count INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        // Optimization: Set WAL mode for better concurrency
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        Ok(SqliteDB {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert a first-seen location. A conflicting insert (another
    /// webhook won the race for the same IP) converts into a count
    /// bump; raw_data and geolocation stay as first written. Returns
    /// the stored email count.
    pub fn insert_location(&self, location: &NewLocation) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let timestamp = Utc::now().to_rfc3339();
        let raw_data = serde_json::to_string(&location.raw_data)?;

        conn.execute(
            "INSERT INTO ip_locations (ip_address, latitude, longitude, country, country_flag, raw_data, email_count, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)
             ON CONFLICT(ip_address)
             DO UPDATE SET email_count = email_count + 1, updated_at = ?7",
            params![
                location.ip_address,
                location.latitude,
                location.longitude,
                location.country,
                location.country_flag,
                raw_data,
                timestamp
            ],
        )?;

        let count: i64 = conn.query_row(
            "SELECT email_count FROM ip_locations WHERE ip_address = ?1",
            [&location.ip_address],
            |row| row.get(0),
        )?;

        Ok(count)
    }

    pub fn get_location_by_ip(&self, ip: &str) -> Result<Option<LocationRecord>> {
        let conn = self.conn.lock().unwrap();

        let result = conn
            .query_row(
                "SELECT ip_address, latitude, longitude, country, country_flag, raw_data, email_count, created_at, updated_at
                 FROM ip_locations WHERE ip_address = ?1",
                [ip],
                map_location_row,
            )
            .optional()?;

        Ok(result)
    }

    pub fn get_all_locations(&self) -> Result<Vec<LocationRecord>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT ip_address, latitude, longitude, country, country_flag, raw_data, email_count, created_at, updated_at
             FROM ip_locations",
        )?;

        let records = stmt
            .query_map([], map_location_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Atomically bump the email count and touch updated_at. Returns
    /// the updated record, or None if no such IP exists.
    pub fn increment_email_count(&self, ip: &str) -> Result<Option<LocationRecord>> {
        let conn = self.conn.lock().unwrap();
        let timestamp = Utc::now().to_rfc3339();

        let changed = conn.execute(
            "UPDATE ip_locations SET email_count = email_count + 1, updated_at = ?2 WHERE ip_address = ?1",
            params![ip, timestamp],
        )?;

        if changed == 0 {
            return Ok(None);
        }

        let record = conn
            .query_row(
                "SELECT ip_address, latitude, longitude, country, country_flag, raw_data, email_count, created_at, updated_at
                 FROM ip_locations WHERE ip_address = ?1",
                [ip],
                map_location_row,
            )
            .optional()?;

        Ok(record)
    }

    pub fn get_stats(&self) -> Result<LocationStats> {
        let conn = self.conn.lock().unwrap();

        let stats = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(email_count), 0), MAX(updated_at) FROM ip_locations",
            [],
            |row| {
                Ok(LocationStats {
                    total_locations: row.get::<_, i64>(0)? as usize,
                    total_emails: row.get(1)?,
                    last_received: row.get(2)?,
                })
            },
        )?;

        Ok(stats)
    }

    #[cfg(test)]
    pub fn remove_location(&self, ip: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute("DELETE FROM ip_locations WHERE ip_address = ?1", [ip])?;
        Ok(changed > 0)
    }
}

fn map_location_row(row: &Row<'_>) -> rusqlite::Result<LocationRecord> {
    let raw: String = row.get(5)?;
    Ok(LocationRecord {
        ip_address: row.get(0)?,
        latitude: row.get(1)?,
        longitude: row.get(2)?,
        country: row.get(3)?,
        country_flag: row.get(4)?,
        raw_data: serde_json::from_str(&raw).unwrap_or(Value::Null),
        email_count: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_location(ip: &str) -> NewLocation {
        NewLocation {
            ip_address: ip.to_string(),
            latitude: Some(52.52),
            longitude: Some(13.405),
            country: Some("Germany".to_string()),
            country_flag: Some("https://flagcdn.com/de.png".to_string()),
            raw_data: json!({"From": "a@example.com", "Subject": "first"}),
        }
    }

    #[test]
    fn test_insert_and_lookup() {
        let db = SqliteDB::new(":memory:").unwrap();

        let count = db.insert_location(&new_location("192.0.2.1")).unwrap();
        assert_eq!(count, 1);

        let record = db.get_location_by_ip("192.0.2.1").unwrap().unwrap();
        assert_eq!(record.ip_address, "192.0.2.1");
        assert_eq!(record.latitude, Some(52.52));
        assert_eq!(record.email_count, 1);
        assert_eq!(record.raw_data["Subject"], "first");
        assert!(!record.created_at.is_empty());
        assert_eq!(record.created_at, record.updated_at);

        assert!(db.get_location_by_ip("192.0.2.99").unwrap().is_none());
    }

    #[test]
    fn test_conflicting_insert_bumps_count_and_keeps_first_payload() {
        let db = SqliteDB::new(":memory:").unwrap();
        db.insert_location(&new_location("192.0.2.1")).unwrap();

        let mut second = new_location("192.0.2.1");
        second.raw_data = json!({"Subject": "second"});
        second.latitude = Some(0.0);
        let count = db.insert_location(&second).unwrap();
        assert_eq!(count, 2);

        let record = db.get_location_by_ip("192.0.2.1").unwrap().unwrap();
        assert_eq!(record.email_count, 2);
        assert_eq!(record.raw_data["Subject"], "first");
        assert_eq!(record.latitude, Some(52.52));

        let all = db.get_all_locations().unwrap();
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn test_increment_email_count() {
        let db = SqliteDB::new(":memory:").unwrap();
        db.insert_location(&new_location("192.0.2.1")).unwrap();

        let updated = db.increment_email_count("192.0.2.1").unwrap().unwrap();
        assert_eq!(updated.email_count, 2);

        assert!(db.increment_email_count("192.0.2.99").unwrap().is_none());
    }

    #[test]
    fn test_stats() {
        let db = SqliteDB::new(":memory:").unwrap();

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.total_locations, 0);
        assert_eq!(stats.total_emails, 0);
        assert!(stats.last_received.is_none());

        db.insert_location(&new_location("192.0.2.1")).unwrap();
        db.insert_location(&new_location("192.0.2.2")).unwrap();
        db.increment_email_count("192.0.2.1").unwrap();

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.total_locations, 2);
        assert_eq!(stats.total_emails, 3);
        assert!(stats.last_received.is_some());
    }

    #[test]
    fn test_file_backed_store_persists_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atlas.db");
        let path = path.to_str().unwrap();

        {
            let db = SqliteDB::new(path).unwrap();
            db.insert_location(&new_location("192.0.2.1")).unwrap();
        }

        let db = SqliteDB::new(path).unwrap();
        let all = db.get_all_locations().unwrap();
        assert_eq!(all.len(), 1);
    }
}
