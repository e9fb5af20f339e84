//! Vendor tracking page scraper.
//!
//! Plain HTTP against the portal's public order status pages; no browser
//! session is needed for these. The portal intermittently answers 403 for
//! unauthenticated status views, so that status is an expected outcome, not
//! an error.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::TransportError;
use crate::models::Shipment;

/// Status pages render a block-list page for obvious bot agents.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static CARRIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Shipment Vendor\s*:?\s*([A-Za-z][A-Za-z0-9.&-]*)").expect("valid regex")
});
static TRACKING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Shipment Tracking\s*:?\s*([A-Za-z0-9]{8,})").expect("valid regex")
});

/// Resolves one vendor order number to its shipment details.
#[async_trait]
pub trait ShipmentLookup: Send + Sync {
    async fn lookup(&self, order_number: &str) -> Result<Shipment, TransportError>;
}

pub struct TrackingScraper {
    http: reqwest::Client,
    base_url: String,
}

impl TrackingScraper {
    pub fn new(config: &Config) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            base_url: config.tracking_base_url.clone(),
        })
    }
}

#[async_trait]
impl ShipmentLookup for TrackingScraper {
    async fn lookup(&self, order_number: &str) -> Result<Shipment, TransportError> {
        let url = format!("{}{}", self.base_url, order_number);
        let response = self.http.get(&url).send().await?;

        if response.status() == StatusCode::FORBIDDEN {
            warn!("🚫 Status page for order {order_number} answered 403, leaving it pending");
            return Ok(Shipment {
                carrier: "Unknown".to_string(),
                tracking_number: None,
            });
        }

        // Any other failing status means the portal itself is unhealthy.
        let response = response.error_for_status()?;
        let page = response.text().await?;
        let shipment = parse_tracking_page(&page);
        debug!(
            "🔎 Order {order_number}: carrier {}, tracking {:?}",
            shipment.carrier, shipment.tracking_number
        );
        Ok(shipment)
    }
}

/// Pulls carrier and tracking number out of a status page.
///
/// Tags are stripped first so the label/value pairs read as plain text
/// regardless of the markup around them. A page that carries neither label
/// comes back as `Unknown` with no tracking number.
pub fn parse_tracking_page(page: &str) -> Shipment {
    let text = TAG_RE.replace_all(page, " ");
    let carrier = CARRIER_RE
        .captures(&text)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    let tracking_number = TRACKING_RE.captures(&text).map(|c| c[1].to_string());
    Shipment {
        carrier,
        tracking_number,
    }
}

// ========== tests ==========

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_config;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answers exactly one request on a local port with a canned response.
    async fn serve_once(status_line: &'static str, body: &'static str) -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf).await;
            let reply = format!(
                "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(reply.as_bytes()).await.unwrap();
        });
        addr
    }

    fn scraper_for(addr: std::net::SocketAddr) -> TrackingScraper {
        let mut config = test_config();
        config.tracking_base_url = format!("http://{addr}/track/");
        TrackingScraper::new(&config).unwrap()
    }

    #[test]
    fn parses_carrier_and_tracking_from_markup() {
        let page = "<div class=\"status\">\
                    <span>Shipment Vendor:</span><span>UPS</span>\
                    <span>Shipment Tracking:</span><span>1Z999AA10123456784</span>\
                    </div>";
        let shipment = parse_tracking_page(page);
        assert_eq!(shipment.carrier, "UPS");
        assert_eq!(
            shipment.tracking_number.as_deref(),
            Some("1Z999AA10123456784")
        );
    }

    #[test]
    fn page_without_tracking_number_yet() {
        let page = "<p>Shipment Vendor: FedEx</p><p>Shipment Tracking:</p>";
        let shipment = parse_tracking_page(page);
        assert_eq!(shipment.carrier, "FedEx");
        assert_eq!(shipment.tracking_number, None);
    }

    #[test]
    fn unrelated_page_is_unknown() {
        let shipment = parse_tracking_page("<html><body>Please sign in</body></html>");
        assert_eq!(shipment.carrier, "Unknown");
        assert_eq!(shipment.tracking_number, None);
    }

    #[test]
    fn short_placeholder_is_not_a_tracking_number() {
        let page = "Shipment Vendor: USPS Shipment Tracking: pending";
        let shipment = parse_tracking_page(page);
        assert_eq!(shipment.carrier, "USPS");
        assert_eq!(shipment.tracking_number, None);
    }

    #[tokio::test]
    async fn error_status_aborts_the_lookup() {
        let addr = serve_once("500 Internal Server Error", "upstream unavailable").await;
        let err = scraper_for(addr).lookup("9001").await.unwrap_err();
        assert!(matches!(err, TransportError::Http(_)));
    }

    #[tokio::test]
    async fn forbidden_status_leaves_the_shipment_unresolved() {
        let addr = serve_once("403 Forbidden", "Access denied").await;
        let shipment = scraper_for(addr).lookup("9001").await.unwrap();
        assert_eq!(shipment.carrier, "Unknown");
        assert_eq!(shipment.tracking_number, None);
    }
}
