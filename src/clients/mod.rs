//! Transport collaborators: the FTP drop, the tracking sheet bridge and the
//! SMTP notifier.
//!
//! Each collaborator is a narrow trait with one production implementation so
//! the coordinator can be exercised against in-memory fakes. None of them
//! carries order logic; failures surface as [`TransportError`] and the
//! coordinator decides what is fatal.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::models::{PendingShipment, ShipmentUpdate, TrackingRecord};

pub mod ftp;
pub mod mailer;
pub mod sheet;

pub use ftp::FtpOrderSource;
pub use mailer::SmtpNotifier;
pub use sheet::SheetBridgeClient;

/// Where order files come from and where consumed ones go.
#[async_trait]
pub trait OrderFileSource: Send + Sync {
    /// Download every order file from the drop into the local orders
    /// directory and return their names, in drop listing order.
    async fn fetch(&self) -> Result<Vec<String>, TransportError>;

    /// Move consumed files out of the drop so the next run does not see them.
    async fn archive(&self, names: &[String]) -> Result<(), TransportError>;
}

/// The tracking sheet: append-only for order rows, updatable for shipments.
#[async_trait]
pub trait TrackingStore: Send + Sync {
    /// Append a single (PO, vendor order number) row.
    async fn append_row(&self, record: &TrackingRecord) -> Result<(), TransportError>;

    /// Append a batch of rows in one call.
    async fn append_batch(&self, records: &[TrackingRecord]) -> Result<(), TransportError>;

    /// Rows that have an order number but no tracking number yet.
    async fn pending_shipments(&self) -> Result<Vec<PendingShipment>, TransportError>;

    /// Fill in carrier and tracking number for previously appended rows.
    async fn record_shipments(&self, updates: &[ShipmentUpdate]) -> Result<(), TransportError>;
}

/// One-way notification channel for run summaries and failure alerts.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> Result<(), TransportError>;
}
