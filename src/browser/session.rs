//! Browser session lifecycle.
//!
//! One fresh Chromium per batch: the orchestrator opens a session, logs it in,
//! runs its batch, and tears it down. Sessions deliberately never outlive a
//! batch; long-lived sessions accumulate DOM and memory state that degrades
//! checkout reliability over a run.

use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{DriverError, DriverResult};
use crate::infrastructure::driver::{SessionProvider, Target, UiDriver, Wait};
use crate::infrastructure::CdpDriver;

/// A live portal session: the browser process, its CDP event loop, and the
/// driver over its working page.
pub struct PortalSession {
    browser: Browser,
    event_loop: JoinHandle<()>,
    driver: CdpDriver,
}

impl PortalSession {
    async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("⚠️ browser close failed: {}", e);
        }
        self.event_loop.abort();
        debug!("browser session torn down");
    }
}

#[async_trait]
impl UiDriver for PortalSession {
    async fn goto(&self, url: &str) -> DriverResult<()> {
        self.driver.goto(url).await
    }

    async fn wait_for(&self, target: &Target, wait: Wait) -> DriverResult<()> {
        self.driver.wait_for(target, wait).await
    }

    async fn fill(&self, target: &Target, value: &str) -> DriverResult<()> {
        self.driver.fill(target, value).await
    }

    async fn click(&self, target: &Target) -> DriverResult<()> {
        self.driver.click(target).await
    }

    async fn click_unchecked(&self, target: &Target) -> DriverResult<()> {
        self.driver.click_unchecked(target).await
    }

    async fn select_value(&self, target: &Target, value: &str) -> DriverResult<()> {
        self.driver.select_value(target, value).await
    }

    async fn submit(&self, target: &Target) -> DriverResult<()> {
        self.driver.submit(target).await
    }

    async fn text(&self, target: &Target) -> DriverResult<String> {
        self.driver.text(target).await
    }

    async fn enter_frame(&self, marker: &Target, nth: usize) -> DriverResult<()> {
        self.driver.enter_frame(marker, nth).await
    }

    async fn exit_frame(&self) -> DriverResult<()> {
        self.driver.exit_frame().await
    }
}

/// Launches a fresh Chromium for every batch.
pub struct BrowserSessionProvider {
    headless: bool,
    chrome_executable: Option<PathBuf>,
    short_wait: Duration,
    long_wait: Duration,
}

impl BrowserSessionProvider {
    pub fn new(config: &Config) -> Self {
        Self {
            headless: config.headless,
            chrome_executable: config.chrome_executable.clone(),
            short_wait: config.short_wait,
            long_wait: config.long_wait,
        }
    }

    async fn launch(&self) -> DriverResult<(Browser, JoinHandle<()>, Page)> {
        info!("🚀 launching browser session...");

        let mut builder = BrowserConfig::builder().args(vec![
            "--disable-gpu",
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--remote-debugging-port=0",
        ]);
        if self.headless {
            builder = builder.new_headless_mode();
        } else {
            builder = builder.with_head();
        }
        if let Some(path) = &self.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let browser_config = builder
            .build()
            .map_err(|message| DriverError::Launch { message })?;

        let (browser, mut handler) = Browser::launch(browser_config).await?;
        debug!("browser launched");

        let event_loop = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        // Short pause for browser state to settle before opening a page.
        sleep(Duration::from_millis(300)).await;

        let page = browser.new_page("about:blank").await?;
        debug!("working page ready");

        Ok((browser, event_loop, page))
    }
}

#[async_trait]
impl SessionProvider for BrowserSessionProvider {
    type Session = PortalSession;

    async fn open(&self) -> DriverResult<PortalSession> {
        let (browser, event_loop, page) = self.launch().await?;
        let driver = CdpDriver::new(page, self.short_wait, self.long_wait);
        Ok(PortalSession {
            browser,
            event_loop,
            driver,
        })
    }

    async fn close(&self, session: PortalSession) {
        session.shutdown().await;
    }
}
