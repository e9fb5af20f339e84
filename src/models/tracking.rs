//! Tracking-side entities shared by the sheet bridge and the shipment sweep.

use serde::{Deserialize, Serialize};

/// A (PO, vendor order number) pair appended to the tracking sheet after a
/// successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingRecord {
    pub po_number: String,
    pub order_number: String,
}

/// A sheet row whose shipment details have not been filled in yet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PendingShipment {
    /// Sheet row index, echoed back verbatim when the row is updated.
    pub row: u64,
    pub order_number: String,
}

/// Carrier and tracking number scraped from the vendor's order status page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shipment {
    pub carrier: String,
    /// `None` until the vendor has handed the parcel to a carrier.
    pub tracking_number: Option<String>,
}

/// One resolved sheet update produced by the shipment sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShipmentUpdate {
    pub row: u64,
    pub carrier: String,
    pub tracking_number: Option<String>,
}

impl ShipmentUpdate {
    pub fn new(pending: &PendingShipment, shipment: Shipment) -> Self {
        Self {
            row: pending.row,
            carrier: shipment.carrier,
            tracking_number: shipment.tracking_number,
        }
    }
}
