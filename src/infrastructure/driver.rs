//! Portal interaction surface - infrastructure layer
//!
//! `UiDriver` is the complete vocabulary the upper layers may use against the
//! portal: navigate, bounded condition waits, fill/click/select/submit, read
//! text, and scoped frame context switching. The production implementation is
//! [`crate::infrastructure::CdpDriver`]; tests substitute a scripted fake.

use async_trait::async_trait;
use std::fmt;

use crate::error::DriverResult;

/// A portal element, addressed by CSS selector and carrying a human label for
/// log and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    css: &'static str,
    label: &'static str,
}

impl Target {
    pub const fn css(css: &'static str, label: &'static str) -> Self {
        Self { css, label }
    }

    pub fn selector(&self) -> &'static str {
        self.css
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.css)
    }
}

/// Wait classes for condition waits.
///
/// `Short` covers controls expected to be present already, `Long` covers full
/// page loads and slow third-party widgets. The concrete timeouts come from
/// configuration (defaults 10s / 30s).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    Short,
    Long,
}

/// Driving one portal session.
///
/// All selector operations resolve inside the current frame context; frames
/// nest via `enter_frame`/`exit_frame` and callers must restore the parent
/// context on every path (see the payment step of the checkout flow).
#[async_trait]
pub trait UiDriver: Send + Sync {
    /// Navigate the session to a URL. Resets any frame context.
    async fn goto(&self, url: &str) -> DriverResult<()>;

    /// Poll until the target is present and visible, up to the wait class
    /// timeout.
    async fn wait_for(&self, target: &Target, wait: Wait) -> DriverResult<()>;

    /// Clear the target field and enter the value.
    async fn fill(&self, target: &Target, value: &str) -> DriverResult<()>;

    /// Click the target, requiring it to be visible and enabled.
    async fn click(&self, target: &Target) -> DriverResult<()>;

    /// Click the target through its programmatic action, bypassing the
    /// visibility check. For controls that are never reliably clickable
    /// through the checked path.
    async fn click_unchecked(&self, target: &Target) -> DriverResult<()>;

    /// Select the option with the given value in a dropdown.
    async fn select_value(&self, target: &Target, value: &str) -> DriverResult<()>;

    /// Submit the form the target belongs to.
    async fn submit(&self, target: &Target) -> DriverResult<()>;

    /// The rendered text of the target.
    async fn text(&self, target: &Target) -> DriverResult<String>;

    /// Descend into the nth frame matching the marker. Subsequent operations
    /// resolve inside that frame until `exit_frame`.
    async fn enter_frame(&self, marker: &Target, nth: usize) -> DriverResult<()>;

    /// Return to the parent context. Errors with `FrameUnderflow` when no
    /// frame is active.
    async fn exit_frame(&self) -> DriverResult<()>;
}

/// Owns browser session lifecycle for the batch orchestrator.
///
/// `close` is deliberately infallible: teardown runs on every exit path and a
/// failed quit must never mask the batch outcome - implementations log and
/// swallow.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    type Session: UiDriver + Send + Sync;

    async fn open(&self) -> DriverResult<Self::Session>;

    async fn close(&self, session: Self::Session);
}
