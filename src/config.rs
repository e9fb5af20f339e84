//! Runtime configuration, sourced from the environment once at startup.
//!
//! Every component receives the validated [`Config`] by reference; nothing
//! deeper than this module reads an environment variable. Missing or invalid
//! values fail the process before any browser or network work begins.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// A credential or payment value that must never appear in logs.
///
/// `Debug` prints a fixed placeholder; the value is only reachable through
/// [`Secret::expose`].
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The wrapped value. Call sites are the audit surface.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Card data entered into the portal's isolated payment frames.
#[derive(Clone, Debug)]
pub struct PaymentCard {
    pub number: Secret,
    pub expiry: Secret,
    pub cvv: Secret,
}

/// FTP drop the vendor order files arrive on.
#[derive(Clone, Debug)]
pub struct FtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Secret,
    /// Remote directory holding unprocessed order files.
    pub orders_dir: String,
    /// Remote directory consumed files are moved into.
    pub archive_dir: String,
}

/// SMTP relay used for the run summary and failure notifications.
#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: Secret,
    pub from: String,
    pub to: String,
}

/// HTTP bridge in front of the order tracking sheet.
#[derive(Clone, Debug)]
pub struct TrackingApiConfig {
    pub base_url: String,
    pub token: Option<Secret>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Portal login page.
    pub login_url: String,
    /// Portal checkout page, navigated to once the cart is filled.
    pub checkout_url: String,
    pub portal_username: String,
    pub portal_password: Secret,
    pub payment: PaymentCard,
    /// Local directory order files are downloaded into.
    pub orders_dir: PathBuf,
    /// Base URL of the vendor tracking pages, order number appended.
    pub tracking_base_url: String,
    pub ftp: FtpConfig,
    pub smtp: SmtpConfig,
    pub tracking_api: TrackingApiConfig,
    /// POs processed per browser session.
    pub batch_size: usize,
    /// Short wait class for controls expected to be present already.
    pub short_wait: Duration,
    /// Long wait class for full page loads and slow widgets.
    pub long_wait: Duration,
    /// Fallback delay where the page exposes no observable condition.
    pub settle: Duration,
    /// Pause after each placed order, vendor-side pacing.
    pub order_pace: Duration,
    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,
}

impl Config {
    /// Load `.env` (if present) and build the configuration from the process
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Build from environment variables already set on the process.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::build(|var| std::env::var(var))
    }

    /// Core parsing and validation, decoupled from the real environment so
    /// tests can drive it with a plain map lookup.
    fn build<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let require = |var: &str| -> Result<String, ConfigError> {
            lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
        };

        let or_default = |var: &str, default: &str| -> String {
            lookup(var).unwrap_or_else(|_| default.to_string())
        };

        let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
            let raw = or_default(var, default);
            raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
        };

        let login_url = require("LOGIN_URL")?;
        let checkout_url = require("CHECKOUT_PAGE_URL")?;
        let portal_username = require("LOGIN_USERNAME")?;
        let portal_password = Secret::new(require("LOGIN_PASSWORD")?);

        let payment = PaymentCard {
            number: Secret::new(require("CC_NUM")?),
            expiry: Secret::new(require("CC_EXP_NUM")?),
            cvv: Secret::new(require("CC_CSV")?),
        };

        let orders_dir = PathBuf::from(require("LOCAL_ORDERS_DIR")?);
        let tracking_base_url = require("TRACKING_BASE_URL")?;

        let ftp_port = parse_u64("FTP_PORT", "21")?;
        let ftp_port = u16::try_from(ftp_port).map_err(|_| ConfigError::InvalidEnvVar {
            var: "FTP_PORT".to_string(),
            reason: format!("{ftp_port} is not a valid port"),
        })?;
        let ftp = FtpConfig {
            host: require("FTP_HOST")?,
            port: ftp_port,
            username: require("FTP_USERNAME")?,
            password: Secret::new(require("FTP_PASSWORD")?),
            orders_dir: or_default("FTP_ORDERS_DIR", "/orders"),
            archive_dir: or_default("FTP_ARCHIVE_DIR", "/orders/processed"),
        };

        let smtp = SmtpConfig {
            host: require("SMTP_HOST")?,
            username: require("SMTP_USERNAME")?,
            password: Secret::new(require("SMTP_PASSWORD")?),
            from: require("EMAIL_FROM")?,
            to: require("EMAIL_TO")?,
        };

        let tracking_api = TrackingApiConfig {
            base_url: require("TRACKING_API_URL")?,
            token: lookup("TRACKING_API_TOKEN").ok().map(Secret::new),
        };

        let batch_size = parse_u64("BATCH_SIZE", "15")? as usize;
        if batch_size == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: "BATCH_SIZE".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let short_wait = Duration::from_secs(parse_u64("SHORT_WAIT_SECS", "10")?);
        let long_wait = Duration::from_secs(parse_u64("LONG_WAIT_SECS", "30")?);
        let settle = Duration::from_millis(parse_u64("SETTLE_MS", "2000")?);
        let order_pace = Duration::from_secs(parse_u64("ORDER_PACE_SECS", "5")?);

        let headless_raw = or_default("HEADLESS", "true");
        let headless = headless_raw
            .parse::<bool>()
            .map_err(|_| ConfigError::InvalidEnvVar {
                var: "HEADLESS".to_string(),
                reason: format!("'{headless_raw}' is not true/false"),
            })?;
        let chrome_executable = lookup("CHROME_EXECUTABLE").ok().map(PathBuf::from);

        Ok(Self {
            login_url,
            checkout_url,
            portal_username,
            portal_password,
            payment,
            orders_dir,
            tracking_base_url,
            ftp,
            smtp,
            tracking_api,
            batch_size,
            short_wait,
            long_wait,
            settle,
            order_pace,
            headless,
            chrome_executable,
        })
    }
}
