use regex::Regex;
use serde::Deserialize;
use std::net::Ipv4Addr;

/// Inbound email webhook payload. All fields are optional; the payload
/// shape is whatever the mail provider posts, and anything we do not
/// read here is still kept verbatim as the stored raw payload.
#[derive(Debug, Deserialize)]
pub struct InboundEmail {
    #[serde(rename = "Headers")]
    pub headers: Option<Vec<EmailHeader>>,

    #[serde(rename = "SourceIp")]
    pub source_ip: Option<String>,

    #[serde(rename = "Client")]
    pub client: Option<ClientInfo>,

    #[serde(rename = "From")]
    pub from: Option<String>,

    #[serde(rename = "FromName")]
    pub from_name: Option<String>,

    #[serde(rename = "Subject")]
    pub subject: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmailHeader {
    #[serde(rename = "Name")]
    pub name: Option<String>,

    #[serde(rename = "Value")]
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClientInfo {
    #[serde(rename = "IP")]
    pub ip: Option<String>,
}

impl InboundEmail {
    /// Extract the sender IP, in priority order: the `Received-SPF`
    /// header's `client-ip=` token, then `SourceIp`, then `Client.IP`.
    /// Empty strings count as absent.
    pub fn sender_ip(&self) -> Option<String> {
        if let Some(ip) = self.spf_client_ip() {
            return Some(ip);
        }

        self.source_ip
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.client
                    .as_ref()
                    .and_then(|c| c.ip.as_deref())
                    .filter(|s| !s.is_empty())
            })
            .map(|s| s.to_string())
    }

    /// Parse a `client-ip=<dotted-quad>` token out of the Received-SPF
    /// header value. The quad must be a valid IPv4 address, otherwise
    /// extraction falls through to the other sources.
    fn spf_client_ip(&self) -> Option<String> {
        let headers = self.headers.as_ref()?;
        let spf = headers
            .iter()
            .find(|h| h.name.as_deref() == Some("Received-SPF"))?;
        let value = spf.value.as_deref()?;

        let re = Regex::new(r"client-ip=([0-9]+\.[0-9]+\.[0-9]+\.[0-9]+)").unwrap();
        let candidate = re.captures(value)?.get(1)?.as_str();

        if candidate.parse::<Ipv4Addr>().is_ok() {
            Some(candidate.to_string())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> InboundEmail {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_spf_header_wins_over_other_sources() {
        let email = payload(json!({
            "Headers": [
                {"Name": "X-Spam-Status", "Value": "No"},
                {"Name": "Received-SPF", "Value": "pass (spfd: domain of example.com designates 203.0.113.5 as permitted sender) client-ip=203.0.113.5;"}
            ],
            "SourceIp": "192.0.2.1",
            "Client": {"IP": "192.0.2.2"}
        }));
        assert_eq!(email.sender_ip(), Some("203.0.113.5".to_string()));
    }

    #[test]
    fn test_invalid_spf_quad_falls_through_to_source_ip() {
        let email = payload(json!({
            "Headers": [
                {"Name": "Received-SPF", "Value": "fail client-ip=999.0.0.1;"}
            ],
            "SourceIp": "192.0.2.1"
        }));
        assert_eq!(email.sender_ip(), Some("192.0.2.1".to_string()));
    }

    #[test]
    fn test_source_ip_before_client_ip() {
        let email = payload(json!({
            "SourceIp": "192.0.2.1",
            "Client": {"IP": "192.0.2.2"}
        }));
        assert_eq!(email.sender_ip(), Some("192.0.2.1".to_string()));
    }

    #[test]
    fn test_empty_source_ip_falls_through_to_client_ip() {
        let email = payload(json!({
            "SourceIp": "",
            "Client": {"IP": "192.0.2.2"}
        }));
        assert_eq!(email.sender_ip(), Some("192.0.2.2".to_string()));
    }

    #[test]
    fn test_no_ip_anywhere() {
        let email = payload(json!({
            "From": "sender@example.com",
            "Subject": "hello"
        }));
        assert_eq!(email.sender_ip(), None);
    }

    #[test]
    fn test_spf_header_without_client_ip_token() {
        let email = payload(json!({
            "Headers": [
                {"Name": "Received-SPF", "Value": "neutral"}
            ],
            "Client": {"IP": "192.0.2.2"}
        }));
        assert_eq!(email.sender_ip(), Some("192.0.2.2".to_string()));
    }
}
