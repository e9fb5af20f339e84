//! Error types, grouped by the seam they occur at.
//!
//! Containment policy: a `CheckoutError` aborts one PO, a `LoginError` aborts
//! one batch, an `ExtractError` aborts one file, a `TransportError` is logged
//! and the run continues (except the initial order-file fetch, which is fatal
//! because there is nothing to process). Only `ConfigError` and errors that
//! escape the run coordinator terminate the process.

use std::time::Duration;

use thiserror::Error;

// ========== configuration ==========

/// Startup configuration failure. Always fatal, raised before any session work.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingEnvVar(String),

    #[error("environment variable {var} is invalid: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

// ========== portal driver ==========

/// Failure vocabulary for a single portal interaction.
///
/// Every selector-level problem the driver can hit reduces to one of these;
/// upper layers wrap them with step or attempt context.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("timed out after {waited:?} waiting for {target}")]
    WaitTimeout { target: String, waited: Duration },

    #[error("element not found: {target}")]
    NotFound { target: String },

    #[error("element not interactable: {target}")]
    Hidden { target: String },

    #[error("{target} does not belong to a form")]
    NoForm { target: String },

    #[error("option '{value}' not present in {target}")]
    OptionMissing { target: String, value: String },

    #[error("frame not found: {frame}")]
    MissingFrame { frame: String },

    #[error("frame has no reachable document: {frame}")]
    DetachedFrame { frame: String },

    #[error("no frame context to exit")]
    FrameUnderflow,

    #[error("browser launch failed: {message}")]
    Launch { message: String },

    #[error("browser call failed: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    #[error("script result could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("script reported: {message}")]
    Script { message: String },
}

// ========== authentication ==========

/// Portal login failure, scoped to the batch whose session was logging in.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("login failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: usize,
        #[source]
        last: DriverError,
    },

    /// The welcome banner rendered but its text did not confirm the account.
    /// Historically this was treated as a successful login; it is surfaced as
    /// its own kind so the orchestrator decides the policy.
    #[error("welcome banner did not confirm sign-in (text: {banner:?})")]
    Ambiguous { banner: String },
}

// ========== order file extraction ==========

/// Order-file parsing failure. Fails the whole file, never a single row.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{file}: required column '{column}' is missing")]
    MissingColumn { file: String, column: String },

    #[error("{file} line {line}: quantity '{value}' for sku {sku} is not a positive integer")]
    InvalidQuantity {
        file: String,
        line: usize,
        sku: String,
        value: String,
    },

    #[error("{file}: malformed record: {source}")]
    Malformed {
        file: String,
        #[source]
        source: csv::Error,
    },
}

// ========== checkout ==========

/// The checkout states, in wizard order. Used to name the failing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStep {
    SearchItem,
    NavigateCheckout,
    FillShipping,
    ProceedShipping,
    FillPayment,
    SubmitOrder,
}

impl std::fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CheckoutStep::SearchItem => "SearchItem",
            CheckoutStep::NavigateCheckout => "NavigateCheckout",
            CheckoutStep::FillShipping => "FillShipping",
            CheckoutStep::ProceedShipping => "ProceedShipping",
            CheckoutStep::FillPayment => "FillPayment",
            CheckoutStep::SubmitOrder => "SubmitOrder",
        };
        f.write_str(name)
    }
}

/// A checkout abort, tagged with the step that failed. Aborts that PO only;
/// items already added to the cart are left behind (the portal offers no
/// rollback).
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("item search failed for sku {sku}: {source}")]
    SearchItem {
        sku: String,
        #[source]
        source: DriverError,
    },

    #[error("checkout page did not load: {source}")]
    NavigateCheckout {
        #[source]
        source: DriverError,
    },

    #[error("shipping form rejected: {source}")]
    FillShipping {
        #[source]
        source: DriverError,
    },

    #[error("shipping method selection failed: {source}")]
    ProceedShipping {
        #[source]
        source: DriverError,
    },

    #[error("payment entry failed: {source}")]
    FillPayment {
        #[source]
        source: DriverError,
    },

    #[error("order submission failed: {source}")]
    SubmitOrder {
        #[source]
        source: DriverError,
    },
}

impl CheckoutError {
    /// The state-machine step this failure belongs to.
    pub fn step(&self) -> CheckoutStep {
        match self {
            CheckoutError::SearchItem { .. } => CheckoutStep::SearchItem,
            CheckoutError::NavigateCheckout { .. } => CheckoutStep::NavigateCheckout,
            CheckoutError::FillShipping { .. } => CheckoutStep::FillShipping,
            CheckoutError::ProceedShipping { .. } => CheckoutStep::ProceedShipping,
            CheckoutError::FillPayment { .. } => CheckoutStep::FillPayment,
            CheckoutError::SubmitOrder { .. } => CheckoutStep::SubmitOrder,
        }
    }
}

// ========== external transports ==========

/// FTP / HTTP / SMTP collaborator failure. Logged where it happens; only the
/// initial order-file fetch treats it as fatal.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("FTP error: {0}")]
    Ftp(#[from] suppaftp::FtpError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("email build error: {0}")]
    Mail(#[from] lettre::error::Error),

    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("sheet bridge returned status {status}")]
    Bridge { status: u16 },
}

// ========== result aliases ==========

pub type DriverResult<T> = Result<T, DriverError>;
