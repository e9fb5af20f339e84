//! Browser lifecycle: launching Chromium and owning per-batch sessions.

pub mod session;

pub use session::{BrowserSessionProvider, PortalSession};
