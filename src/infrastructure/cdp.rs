//! CDP driver - infrastructure layer
//!
//! Holds the one `Page` resource and implements [`UiDriver`] over it. Every
//! operation is a small script evaluated in the page; the script resolves the
//! selector through the driver's current frame path, so the same operations
//! work inside the embedded payment frames.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::error::{DriverError, DriverResult};
use crate::infrastructure::driver::{Target, UiDriver, Wait};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One hop of the active frame path.
///
/// Kept driver-side so exiting a frame never needs a browser round trip; the
/// path is replayed at the start of every evaluated script.
#[derive(Debug, Clone, Serialize)]
struct FrameHop {
    css: String,
    index: usize,
}

/// Outcome envelope returned by every evaluated operation script.
#[derive(Debug, Deserialize)]
struct JsOutcome {
    status: String,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

/// CDP-backed portal driver.
pub struct CdpDriver {
    page: Page,
    short_wait: Duration,
    long_wait: Duration,
    frames: Mutex<Vec<FrameHop>>,
}

impl CdpDriver {
    pub fn new(page: Page, short_wait: Duration, long_wait: Duration) -> Self {
        Self {
            page,
            short_wait,
            long_wait,
            frames: Mutex::new(Vec::new()),
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    fn timeout_of(&self, wait: Wait) -> Duration {
        match wait {
            Wait::Short => self.short_wait,
            Wait::Long => self.long_wait,
        }
    }

    /// Evaluate an operation body with `doc` bound to the document of the
    /// current frame path. Frame resolution failures are mapped here; the
    /// body's own statuses are returned to the caller.
    async fn run_op(&self, body: &str) -> DriverResult<JsOutcome> {
        let hops = {
            let frames = self.frames.lock().await;
            serde_json::to_string(&*frames)?
        };
        let script = format!(
            r#"
            (() => {{
                const hops = {hops};
                let doc = document;
                for (const hop of hops) {{
                    const frame = doc.querySelectorAll(hop.css)[hop.index];
                    if (!frame) return {{ status: "missing-frame", detail: hop.css + "[" + hop.index + "]" }};
                    if (!frame.contentDocument) return {{ status: "detached-frame", detail: hop.css + "[" + hop.index + "]" }};
                    doc = frame.contentDocument;
                }}
                {body}
            }})()
            "#
        );

        let result = self.page.evaluate(script).await?;
        let outcome: JsOutcome = result.into_value()?;

        match outcome.status.as_str() {
            "missing-frame" => Err(DriverError::MissingFrame {
                frame: outcome.detail.unwrap_or_default(),
            }),
            "detached-frame" => Err(DriverError::DetachedFrame {
                frame: outcome.detail.unwrap_or_default(),
            }),
            _ => Ok(outcome),
        }
    }

    fn expect_ok(&self, outcome: JsOutcome, target: &Target) -> DriverResult<()> {
        match outcome.status.as_str() {
            "ok" => Ok(()),
            "missing" => Err(DriverError::NotFound {
                target: target.to_string(),
            }),
            "hidden" => Err(DriverError::Hidden {
                target: target.to_string(),
            }),
            "no-form" => Err(DriverError::NoForm {
                target: target.to_string(),
            }),
            other => Err(DriverError::Script {
                message: format!("unexpected status '{other}' for {target}"),
            }),
        }
    }
}

#[async_trait]
impl UiDriver for CdpDriver {
    async fn goto(&self, url: &str) -> DriverResult<()> {
        // Navigation tears down any embedded frame context.
        self.frames.lock().await.clear();
        self.page.goto(url).await?;
        Ok(())
    }

    async fn wait_for(&self, target: &Target, wait: Wait) -> DriverResult<()> {
        let limit = self.timeout_of(wait);
        let deadline = Instant::now() + limit;
        let sel = serde_json::to_string(target.selector())?;
        let body = format!(
            r#"
                const el = doc.querySelector({sel});
                if (!el) return {{ status: "absent" }};
                const visible = !!(el.offsetParent || el.getClientRects().length);
                return {{ status: visible ? "visible" : "hidden" }};
            "#
        );

        loop {
            let outcome = self.run_op(&body).await?;
            match outcome.status.as_str() {
                "visible" => return Ok(()),
                "absent" | "hidden" => {}
                other => {
                    return Err(DriverError::Script {
                        message: format!("unexpected status '{other}' for {target}"),
                    })
                }
            }
            if Instant::now() >= deadline {
                return Err(DriverError::WaitTimeout {
                    target: target.to_string(),
                    waited: limit,
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn fill(&self, target: &Target, value: &str) -> DriverResult<()> {
        let sel = serde_json::to_string(target.selector())?;
        let val = serde_json::to_string(value)?;
        let body = format!(
            r#"
                const el = doc.querySelector({sel});
                if (!el) return {{ status: "missing" }};
                el.focus();
                el.value = {val};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return {{ status: "ok" }};
            "#
        );
        let outcome = self.run_op(&body).await?;
        self.expect_ok(outcome, target)
    }

    async fn click(&self, target: &Target) -> DriverResult<()> {
        let sel = serde_json::to_string(target.selector())?;
        let body = format!(
            r#"
                const el = doc.querySelector({sel});
                if (!el) return {{ status: "missing" }};
                const visible = !!(el.offsetParent || el.getClientRects().length);
                if (!visible || el.disabled) return {{ status: "hidden" }};
                el.click();
                return {{ status: "ok" }};
            "#
        );
        let outcome = self.run_op(&body).await?;
        self.expect_ok(outcome, target)
    }

    async fn click_unchecked(&self, target: &Target) -> DriverResult<()> {
        let sel = serde_json::to_string(target.selector())?;
        let body = format!(
            r#"
                const el = doc.querySelector({sel});
                if (!el) return {{ status: "missing" }};
                el.click();
                return {{ status: "ok" }};
            "#
        );
        let outcome = self.run_op(&body).await?;
        self.expect_ok(outcome, target)
    }

    async fn select_value(&self, target: &Target, value: &str) -> DriverResult<()> {
        let sel = serde_json::to_string(target.selector())?;
        let val = serde_json::to_string(value)?;
        let body = format!(
            r#"
                const el = doc.querySelector({sel});
                if (!el) return {{ status: "missing" }};
                const options = Array.from(el.options || []);
                if (!options.some(o => o.value === {val})) return {{ status: "no-option" }};
                el.value = {val};
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return {{ status: "ok" }};
            "#
        );
        let outcome = self.run_op(&body).await?;
        if outcome.status == "no-option" {
            return Err(DriverError::OptionMissing {
                target: target.to_string(),
                value: value.to_string(),
            });
        }
        self.expect_ok(outcome, target)
    }

    async fn submit(&self, target: &Target) -> DriverResult<()> {
        let sel = serde_json::to_string(target.selector())?;
        let body = format!(
            r#"
                const el = doc.querySelector({sel});
                if (!el) return {{ status: "missing" }};
                const form = el.form || el.closest("form");
                if (!form) return {{ status: "no-form" }};
                if (form.requestSubmit) {{ form.requestSubmit(); }} else {{ form.submit(); }}
                return {{ status: "ok" }};
            "#
        );
        let outcome = self.run_op(&body).await?;
        self.expect_ok(outcome, target)
    }

    async fn text(&self, target: &Target) -> DriverResult<String> {
        let sel = serde_json::to_string(target.selector())?;
        let body = format!(
            r#"
                const el = doc.querySelector({sel});
                if (!el) return {{ status: "missing" }};
                return {{ status: "ok", text: el.innerText || el.textContent || "" }};
            "#
        );
        let outcome = self.run_op(&body).await?;
        match outcome.status.as_str() {
            "ok" => Ok(outcome.text.unwrap_or_default()),
            "missing" => Err(DriverError::NotFound {
                target: target.to_string(),
            }),
            other => Err(DriverError::Script {
                message: format!("unexpected status '{other}' for {target}"),
            }),
        }
    }

    async fn enter_frame(&self, marker: &Target, nth: usize) -> DriverResult<()> {
        // Check the frame before committing the hop so a bad one never poisons the path.
        let sel = serde_json::to_string(marker.selector())?;
        let body = format!(
            r#"
                const frame = doc.querySelectorAll({sel})[{nth}];
                if (!frame) return {{ status: "missing" }};
                if (!frame.contentDocument) return {{ status: "detached" }};
                return {{ status: "ok" }};
            "#
        );
        let outcome = self.run_op(&body).await?;
        match outcome.status.as_str() {
            "ok" => {
                self.frames.lock().await.push(FrameHop {
                    css: marker.selector().to_string(),
                    index: nth,
                });
                Ok(())
            }
            "missing" => Err(DriverError::MissingFrame {
                frame: format!("{marker}[{nth}]"),
            }),
            "detached" => Err(DriverError::DetachedFrame {
                frame: format!("{marker}[{nth}]"),
            }),
            other => Err(DriverError::Script {
                message: format!("unexpected status '{other}' for {marker}"),
            }),
        }
    }

    async fn exit_frame(&self) -> DriverResult<()> {
        let mut frames = self.frames.lock().await;
        if frames.pop().is_none() {
            return Err(DriverError::FrameUnderflow);
        }
        Ok(())
    }
}
