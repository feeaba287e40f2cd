use crate::error::{AtlasError, Result};
use serde::Deserialize;

/// Client for the external IP geolocation API
#[derive(Clone)]
pub struct GeoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

/// Geolocation fields consumed from the API response
#[derive(Debug, Clone)]
pub struct GeoFetch {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub country_flag: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeoApiResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    city: Option<String>,
    country: Option<String>,
    flag: Option<FlagImages>,
}

#[derive(Debug, Deserialize)]
struct FlagImages {
    png: Option<String>,
}

impl GeoClient {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        GeoClient {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    /// Fetch geolocation for an IP. Non-success upstream responses are
    /// relayed as Upstream errors carrying the status and body.
    pub async fn fetch(&self, ip: &str) -> Result<GeoFetch> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AtlasError::Config("API key missing".to_string()))?;

        let url = self.request_url(api_key, ip);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| String::new());
            return Err(AtlasError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body: GeoApiResponse = response
            .json()
            .await
            .map_err(|e| AtlasError::Parse(e.to_string()))?;

        Ok(GeoFetch {
            latitude: body.latitude,
            longitude: body.longitude,
            city: body.city,
            country: body.country,
            country_flag: body.flag.and_then(|f| f.png),
        })
    }

    fn request_url(&self, api_key: &str, ip: &str) -> String {
        format!("{}?api_key={}&ip_address={}", self.base_url, api_key, ip)
    }
}
