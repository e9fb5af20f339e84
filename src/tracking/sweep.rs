//! Shipment refresh sweep.
//!
//! Runs after the order flow: every tracking sheet row that has an order
//! number but no tracking number yet gets its vendor status page fetched, and
//! the rows a carrier has picked up are written back. Rows the portal refuses
//! to show (or that have no tracking yet) simply stay pending for the next
//! run.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info};

use crate::clients::TrackingStore;
use crate::error::TransportError;
use crate::models::ShipmentUpdate;
use crate::tracking::scraper::ShipmentLookup;

/// Sheet writes per bridge call.
const UPDATE_CHUNK: usize = 10;
/// Pause between bridge calls, the sheet backend throttles bursts.
const CHUNK_PAUSE: Duration = Duration::from_secs(1);

/// Resolves pending shipments and records them. Returns how many rows were
/// updated.
pub async fn refresh_tracking<S, L>(store: &S, lookup: &L) -> Result<usize, TransportError>
where
    S: TrackingStore + ?Sized,
    L: ShipmentLookup + ?Sized,
{
    let pending = store.pending_shipments().await?;
    if pending.is_empty() {
        info!("🔎 No shipments pending tracking");
        return Ok(0);
    }
    info!("🔎 Resolving tracking for {} order(s)", pending.len());

    let mut updates: Vec<ShipmentUpdate> = Vec::new();
    for row in &pending {
        let shipment = lookup.lookup(&row.order_number).await?;
        if shipment.tracking_number.is_some() {
            updates.push(ShipmentUpdate::new(row, shipment));
        } else {
            debug!("Order {} has no tracking yet", row.order_number);
        }
    }

    let mut first = true;
    for chunk in updates.chunks(UPDATE_CHUNK) {
        if !first {
            sleep(CHUNK_PAUSE).await;
        }
        first = false;
        store.record_shipments(chunk).await?;
    }

    info!(
        "✅ Tracking updated for {}/{} pending order(s)",
        updates.len(),
        pending.len()
    );
    Ok(updates.len())
}

// ========== tests ==========
