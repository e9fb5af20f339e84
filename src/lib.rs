//! # FNET Order Bot
//!
//! Places wholesale purchase orders on the FNET vendor portal and keeps the
//! tracking sheet current.
//!
//! ## Architecture
//!
//! The portal side is a strict four-layer stack:
//!
//! ### ① Infrastructure
//! - `infrastructure/` - owns the page, exposes capabilities
//! - `UiDriver` - navigate / wait / fill / click / frames, backed by CDP
//!
//! ### ② Services
//! - `services/` - single capabilities against a live session
//! - `Authenticator` - portal login with retry
//!
//! ### ③ Workflow
//! - `workflow/` - one purchase order through the checkout pages
//! - `OrderCtx` - run context (PO number + position)
//! - `CheckoutFlow` - search → cart → shipping → payment → submit → confirm
//!
//! ### ④ Orchestration
//! - `orchestrator/batch` - batches of POs, one portal session per batch
//! - `orchestrator/app` - the full run: fetch → process → archive → record
//!   → email → shipment refresh
//!
//! Around the stack sit the transport edges: `clients/` (FTP drop, tracking
//! sheet bridge, SMTP) and `tracking/` (shipment page scraping and the
//! pending-row sweep).

pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod tracking;
pub mod utils;
pub mod workflow;

#[cfg(test)]
mod test_support;

// Re-export the common types.
pub use browser::BrowserSessionProvider;
pub use config::Config;
pub use error::{CheckoutError, DriverError, DriverResult, TransportError};
pub use infrastructure::{CdpDriver, SessionProvider, UiDriver, Wait};
pub use models::{CheckoutResult, PurchaseOrder};
pub use orchestrator::{App, BatchOrchestrator};
pub use services::Authenticator;
pub use workflow::{CheckoutFlow, OrderCtx};
