//! Portal login with bounded retries.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::{Config, Secret};
use crate::error::{DriverResult, LoginError};
use crate::infrastructure::{selectors, UiDriver, Wait};

/// Attempts per session before the batch is given up.
const MAX_ATTEMPTS: usize = 3;
/// Fixed pause between failed attempts. No pause after the last failure and
/// none when the first attempt succeeds.
const RETRY_DELAY: Duration = Duration::from_secs(5);

enum AttemptOutcome {
    Confirmed,
    /// Banner rendered but its text did not confirm the account.
    Ambiguous { banner: String },
}

/// Logs a fresh session into the portal.
pub struct Authenticator {
    login_url: String,
    username: String,
    password: Secret,
}

impl Authenticator {
    pub fn new(config: &Config) -> Self {
        Self {
            login_url: config.login_url.clone(),
            username: config.portal_username.clone(),
            password: config.portal_password.clone(),
        }
    }

    /// Runs login attempts until one is confirmed, a terminal outcome shows
    /// up, or the attempt budget is spent.
    pub async fn login<D>(&self, driver: &D) -> Result<(), LoginError>
    where
        D: UiDriver + ?Sized,
    {
        let mut attempt = 1;
        loop {
            info!("🔑 Login attempt {attempt}/{MAX_ATTEMPTS} as {}", self.username);
            match self.attempt(driver).await {
                Ok(AttemptOutcome::Confirmed) => {
                    info!("✅ Portal sign-in confirmed");
                    return Ok(());
                }
                // Not a portal hiccup, retrying would only re-enter the same
                // credentials against the same answer.
                Ok(AttemptOutcome::Ambiguous { banner }) => {
                    return Err(LoginError::Ambiguous { banner });
                }
                Err(source) if attempt < MAX_ATTEMPTS => {
                    warn!("⚠️ Login attempt {attempt} failed: {source}");
                    attempt += 1;
                    sleep(RETRY_DELAY).await;
                }
                Err(last) => {
                    warn!("⚠️ Login attempt {attempt} failed: {last}");
                    return Err(LoginError::RetriesExhausted {
                        attempts: MAX_ATTEMPTS,
                        last,
                    });
                }
            }
        }
    }

    async fn attempt<D>(&self, driver: &D) -> DriverResult<AttemptOutcome>
    where
        D: UiDriver + ?Sized,
    {
        driver.goto(&self.login_url).await?;
        driver.wait_for(&selectors::USERNAME_FIELD, Wait::Long).await?;
        driver.wait_for(&selectors::PASSWORD_FIELD, Wait::Long).await?;
        driver.fill(&selectors::USERNAME_FIELD, &self.username).await?;
        driver
            .fill(&selectors::PASSWORD_FIELD, self.password.expose())
            .await?;
        driver.wait_for(&selectors::LOGIN_BUTTON, Wait::Short).await?;
        driver.click(&selectors::LOGIN_BUTTON).await?;

        driver.wait_for(&selectors::WELCOME_BANNER, Wait::Short).await?;
        let banner = driver.text(&selectors::WELCOME_BANNER).await?;
        if banner.contains("Welcome") {
            Ok(AttemptOutcome::Confirmed)
        } else {
            Ok(AttemptOutcome::Ambiguous { banner })
        }
    }
}

// ========== tests ==========
