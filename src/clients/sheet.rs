//! HTTP client for the tracking sheet bridge.
//!
//! The bridge is a small ops-maintained service in front of the order
//! tracking spreadsheet: `POST /rows` appends, `GET /rows?pending=true` lists
//! rows still missing shipment details, `POST /shipments` fills them in.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clients::TrackingStore;
use crate::config::{Config, Secret};
use crate::error::TransportError;
use crate::models::{PendingShipment, ShipmentUpdate, TrackingRecord};

pub struct SheetBridgeClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<Secret>,
}

#[derive(Serialize)]
struct AppendPayload<'a> {
    rows: &'a [TrackingRecord],
}

#[derive(Deserialize)]
struct PendingResponse {
    rows: Vec<PendingShipment>,
}

#[derive(Serialize)]
struct ShipmentPayload<'a> {
    updates: &'a [ShipmentUpdate],
}

impl SheetBridgeClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config
                .tracking_api
                .base_url
                .trim_end_matches('/')
                .to_string(),
            token: config.tracking_api.token.clone(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self.http.request(method, format!("{}/{path}", self.base_url));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose());
        }
        request
    }

    fn check(response: Response) -> Result<Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(TransportError::Bridge {
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl TrackingStore for SheetBridgeClient {
    async fn append_row(&self, record: &TrackingRecord) -> Result<(), TransportError> {
        self.append_batch(std::slice::from_ref(record)).await
    }

    async fn append_batch(&self, records: &[TrackingRecord]) -> Result<(), TransportError> {
        if records.is_empty() {
            return Ok(());
        }
        let response = self
            .request(Method::POST, "rows")
            .json(&AppendPayload { rows: records })
            .send()
            .await?;
        Self::check(response)?;
        info!("📊 Appended {} row(s) to the tracking sheet", records.len());
        Ok(())
    }

    async fn pending_shipments(&self) -> Result<Vec<PendingShipment>, TransportError> {
        let response = self
            .request(Method::GET, "rows")
            .query(&[("pending", "true")])
            .send()
            .await?;
        let body: PendingResponse = Self::check(response)?.json().await?;
        Ok(body.rows)
    }

    async fn record_shipments(&self, updates: &[ShipmentUpdate]) -> Result<(), TransportError> {
        if updates.is_empty() {
            return Ok(());
        }
        let response = self
            .request(Method::POST, "shipments")
            .json(&ShipmentPayload { updates })
            .send()
            .await?;
        Self::check(response)?;
        Ok(())
    }
}
