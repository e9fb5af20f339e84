//! Orchestrator layer - owns the run from first fetch to final email.
//!
//! ## Modules
//!
//! - `app`: the run coordinator. Fetches order files, hands each file's
//!   purchase orders to the batch orchestrator, archives consumed files,
//!   records vendor order numbers, emails the summary and finally refreshes
//!   shipment tracking.
//! - `batch`: drives purchase orders through portal sessions in fixed-size
//!   batches, one login per batch.
//!
//! ## Layering
//!
//! ```text
//! orchestrator   (this layer: run + batch policy)
//!     ↓
//! workflow       (one PO through the checkout pages)
//!     ↓
//! services       (authentication)
//!     ↓
//! infrastructure (UiDriver over CDP)
//! ```
//!
//! The layers below never decide what happens after a failure; containment
//! policy lives here. The transport ports in `clients` and the shipment
//! sweep in `tracking` plug into this layer from the side.

pub mod app;
pub mod batch;

pub use app::{App, FileOutcome, FileStatus, RunSummary};
pub use batch::BatchOrchestrator;
