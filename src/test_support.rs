//! Shared test doubles for the driver, session provider and transport
//! collaborators.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::clients::{Notifier, OrderFileSource, TrackingStore};
use crate::config::{Config, FtpConfig, PaymentCard, Secret, SmtpConfig, TrackingApiConfig};
use crate::error::{DriverError, DriverResult, TransportError};
use crate::infrastructure::{selectors, SessionProvider, Target, UiDriver, Wait};
use crate::models::{PendingShipment, Shipment, ShipmentUpdate, TrackingRecord};
use crate::tracking::ShipmentLookup;

/// A fully populated configuration with short pauses, for unit tests.
pub fn test_config() -> Config {
    Config {
        login_url: "https://portal.test/login".to_string(),
        checkout_url: "https://portal.test/checkout".to_string(),
        portal_username: "acme-wholesale".to_string(),
        portal_password: Secret::new("pw"),
        payment: PaymentCard {
            number: Secret::new("4111111111111111"),
            expiry: Secret::new("03/30"),
            cvv: Secret::new("123"),
        },
        orders_dir: PathBuf::from("/tmp/fnet-orders-test"),
        tracking_base_url: "https://portal.test/track/".to_string(),
        ftp: FtpConfig {
            host: "ftp.test".to_string(),
            port: 21,
            username: "drop".to_string(),
            password: Secret::new("drop-pw"),
            orders_dir: "/orders".to_string(),
            archive_dir: "/orders/processed".to_string(),
        },
        smtp: SmtpConfig {
            host: "smtp.test".to_string(),
            username: "bot@test".to_string(),
            password: Secret::new("smtp-pw"),
            from: "bot@test".to_string(),
            to: "ops@test".to_string(),
        },
        tracking_api: TrackingApiConfig {
            base_url: "https://bridge.test".to_string(),
            token: None,
        },
        batch_size: 15,
        short_wait: Duration::from_secs(10),
        long_wait: Duration::from_secs(30),
        settle: Duration::from_millis(100),
        order_pace: Duration::from_secs(5),
        headless: true,
        chrome_executable: None,
    }
}

// ========== driver fake ==========

/// One recorded driver call, in invocation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    Goto(String),
    WaitFor(String),
    Fill(String, String),
    Click(String),
    ClickUnchecked(String),
    SelectValue(String, String),
    Submit(String),
    Text(String),
    EnterFrame(String, usize),
    ExitFrame,
}

/// Operation kinds a [`FailRule`] can intercept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOp {
    Goto,
    WaitFor,
    Fill,
    Click,
    ClickUnchecked,
    SelectValue,
    Submit,
    Text,
    EnterFrame,
}

struct FailRule {
    op: FailOp,
    /// Substring match against the selector (or URL for `Goto`).
    target: String,
    remaining: usize,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<DriverCall>,
    texts: HashMap<String, String>,
    /// Selector -> permitted option values. No entry means any value selects.
    select_options: HashMap<String, Vec<String>>,
    fail_rules: Vec<FailRule>,
    frame_depth: usize,
    max_frame_depth: usize,
}

/// Scripted in-memory driver. Records every call; failures are injected per
/// operation and selector with a use count, so "fail twice then work" retry
/// shapes are expressible.
#[derive(Clone, Default)]
pub struct FakeDriver {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A driver whose login banner and confirmation heading are already in
    /// place, so whole flows succeed without per-test setup.
    pub fn happy() -> Self {
        let driver = Self::new();
        driver.set_text(&selectors::WELCOME_BANNER, "Welcome back, ACME Wholesale");
        driver.set_text(&selectors::CONFIRMATION_HEADING, "Order Confirmation #1000");
        driver
    }

    pub fn set_text(&self, target: &Target, text: &str) {
        self.state
            .lock()
            .unwrap()
            .texts
            .insert(target.selector().to_string(), text.to_string());
    }

    pub fn set_select_options(&self, target: &Target, values: &[&str]) {
        self.state.lock().unwrap().select_options.insert(
            target.selector().to_string(),
            values.iter().map(|v| (*v).to_string()).collect(),
        );
    }

    /// Fail the next `times` calls of `op` whose selector contains `target`.
    pub fn fail_times(&self, op: FailOp, target: &str, times: usize) {
        self.state.lock().unwrap().fail_rules.push(FailRule {
            op,
            target: target.to_string(),
            remaining: times,
        });
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count_of(&self, op: FailOp) -> usize {
        self.calls()
            .iter()
            .filter(|call| op_of(call) == Some(op))
            .count()
    }

    pub fn frame_depth(&self) -> usize {
        self.state.lock().unwrap().frame_depth
    }

    pub fn max_frame_depth(&self) -> usize {
        self.state.lock().unwrap().max_frame_depth
    }

    /// Records the call, then errors if a scripted failure matches.
    fn check(&self, op: FailOp, target: &str, call: DriverCall) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        for rule in &mut state.fail_rules {
            if rule.op == op && rule.remaining > 0 && target.contains(&rule.target) {
                rule.remaining -= 1;
                return Err(error_for(op, target));
            }
        }
        Ok(())
    }
}

fn op_of(call: &DriverCall) -> Option<FailOp> {
    match call {
        DriverCall::Goto(_) => Some(FailOp::Goto),
        DriverCall::WaitFor(_) => Some(FailOp::WaitFor),
        DriverCall::Fill(_, _) => Some(FailOp::Fill),
        DriverCall::Click(_) => Some(FailOp::Click),
        DriverCall::ClickUnchecked(_) => Some(FailOp::ClickUnchecked),
        DriverCall::SelectValue(_, _) => Some(FailOp::SelectValue),
        DriverCall::Submit(_) => Some(FailOp::Submit),
        DriverCall::Text(_) => Some(FailOp::Text),
        DriverCall::EnterFrame(_, _) => Some(FailOp::EnterFrame),
        DriverCall::ExitFrame => None,
    }
}

fn error_for(op: FailOp, target: &str) -> DriverError {
    let target = target.to_string();
    match op {
        FailOp::Goto => DriverError::Script {
            message: format!("navigation to {target} failed"),
        },
        FailOp::WaitFor => DriverError::WaitTimeout {
            target,
            waited: Duration::from_secs(1),
        },
        FailOp::Fill | FailOp::Text => DriverError::NotFound { target },
        FailOp::Click | FailOp::ClickUnchecked => DriverError::Hidden { target },
        FailOp::SelectValue => DriverError::OptionMissing {
            target,
            value: String::new(),
        },
        FailOp::Submit => DriverError::NoForm { target },
        FailOp::EnterFrame => DriverError::MissingFrame { frame: target },
    }
}

#[async_trait]
impl UiDriver for FakeDriver {
    async fn goto(&self, url: &str) -> DriverResult<()> {
        self.check(FailOp::Goto, url, DriverCall::Goto(url.to_string()))?;
        self.state.lock().unwrap().frame_depth = 0;
        Ok(())
    }

    async fn wait_for(&self, target: &Target, _wait: Wait) -> DriverResult<()> {
        self.check(
            FailOp::WaitFor,
            target.selector(),
            DriverCall::WaitFor(target.selector().to_string()),
        )
    }

    async fn fill(&self, target: &Target, value: &str) -> DriverResult<()> {
        self.check(
            FailOp::Fill,
            target.selector(),
            DriverCall::Fill(target.selector().to_string(), value.to_string()),
        )
    }

    async fn click(&self, target: &Target) -> DriverResult<()> {
        self.check(
            FailOp::Click,
            target.selector(),
            DriverCall::Click(target.selector().to_string()),
        )
    }

    async fn click_unchecked(&self, target: &Target) -> DriverResult<()> {
        self.check(
            FailOp::ClickUnchecked,
            target.selector(),
            DriverCall::ClickUnchecked(target.selector().to_string()),
        )
    }

    async fn select_value(&self, target: &Target, value: &str) -> DriverResult<()> {
        self.check(
            FailOp::SelectValue,
            target.selector(),
            DriverCall::SelectValue(target.selector().to_string(), value.to_string()),
        )?;
        let state = self.state.lock().unwrap();
        if let Some(options) = state.select_options.get(target.selector()) {
            if !options.iter().any(|o| o == value) {
                return Err(DriverError::OptionMissing {
                    target: target.selector().to_string(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    async fn submit(&self, target: &Target) -> DriverResult<()> {
        self.check(
            FailOp::Submit,
            target.selector(),
            DriverCall::Submit(target.selector().to_string()),
        )
    }

    async fn text(&self, target: &Target) -> DriverResult<String> {
        self.check(
            FailOp::Text,
            target.selector(),
            DriverCall::Text(target.selector().to_string()),
        )?;
        let state = self.state.lock().unwrap();
        Ok(state
            .texts
            .get(target.selector())
            .cloned()
            .unwrap_or_default())
    }

    async fn enter_frame(&self, marker: &Target, nth: usize) -> DriverResult<()> {
        self.check(
            FailOp::EnterFrame,
            marker.selector(),
            DriverCall::EnterFrame(marker.selector().to_string(), nth),
        )?;
        let mut state = self.state.lock().unwrap();
        state.frame_depth += 1;
        state.max_frame_depth = state.max_frame_depth.max(state.frame_depth);
        Ok(())
    }

    async fn exit_frame(&self) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(DriverCall::ExitFrame);
        if state.frame_depth == 0 {
            return Err(DriverError::FrameUnderflow);
        }
        state.frame_depth -= 1;
        Ok(())
    }
}

// ========== session provider fake ==========

/// Hands out scripted sessions, one per `open`, and counts lifecycle calls.
pub struct FakeSessionProvider {
    drivers: Mutex<VecDeque<FakeDriver>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

impl FakeSessionProvider {
    /// Every batch gets the next driver from the list; when the list runs
    /// out, further opens fail like a launch error.
    pub fn scripted(drivers: Vec<FakeDriver>) -> Self {
        Self {
            drivers: Mutex::new(drivers.into()),
            opened: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
        }
    }

    /// Every batch gets a clone of the same driver (shared call log).
    pub fn shared(driver: &FakeDriver, batches: usize) -> Self {
        Self::scripted(vec![driver.clone(); batches])
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for FakeSessionProvider {
    type Session = FakeDriver;

    async fn open(&self) -> DriverResult<FakeDriver> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.drivers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| DriverError::Launch {
                message: "no scripted session left".to_string(),
            })
    }

    async fn close(&self, _session: FakeDriver) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

// ========== transport fakes ==========

/// In-memory order drop. `fetch` only returns names; tests that exercise the
/// coordinator place matching files in the configured orders directory.
pub struct FakeOrderSource {
    names: Vec<String>,
    fail_fetch: bool,
    archived: Mutex<Vec<String>>,
}

impl FakeOrderSource {
    pub fn new(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|n| (*n).to_string()).collect(),
            fail_fetch: false,
            archived: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            names: Vec::new(),
            fail_fetch: true,
            archived: Mutex::new(Vec::new()),
        }
    }

    pub fn archived(&self) -> Vec<String> {
        self.archived.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderFileSource for FakeOrderSource {
    async fn fetch(&self) -> Result<Vec<String>, TransportError> {
        if self.fail_fetch {
            return Err(TransportError::Io(std::io::Error::other(
                "drop unreachable",
            )));
        }
        Ok(self.names.clone())
    }

    async fn archive(&self, names: &[String]) -> Result<(), TransportError> {
        self.archived.lock().unwrap().extend_from_slice(names);
        Ok(())
    }
}

/// In-memory tracking sheet recording appends and shipment writes per call.
#[derive(Default)]
pub struct FakeTrackingStore {
    appends: Mutex<Vec<Vec<TrackingRecord>>>,
    pending: Mutex<Vec<PendingShipment>>,
    shipment_writes: Mutex<Vec<Vec<ShipmentUpdate>>>,
}

impl FakeTrackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pending(&self, rows: Vec<PendingShipment>) {
        *self.pending.lock().unwrap() = rows;
    }

    /// All appended records, flattened across calls.
    pub fn appended(&self) -> Vec<TrackingRecord> {
        self.appends.lock().unwrap().iter().flatten().cloned().collect()
    }

    pub fn append_call_sizes(&self) -> Vec<usize> {
        self.appends.lock().unwrap().iter().map(Vec::len).collect()
    }

    /// All shipment updates, flattened across calls.
    pub fn recorded_shipments(&self) -> Vec<ShipmentUpdate> {
        self.shipment_writes
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .cloned()
            .collect()
    }

    pub fn shipment_write_sizes(&self) -> Vec<usize> {
        self.shipment_writes
            .lock()
            .unwrap()
            .iter()
            .map(Vec::len)
            .collect()
    }
}

#[async_trait]
impl TrackingStore for FakeTrackingStore {
    async fn append_row(&self, record: &TrackingRecord) -> Result<(), TransportError> {
        self.appends.lock().unwrap().push(vec![record.clone()]);
        Ok(())
    }

    async fn append_batch(&self, records: &[TrackingRecord]) -> Result<(), TransportError> {
        self.appends.lock().unwrap().push(records.to_vec());
        Ok(())
    }

    async fn pending_shipments(&self) -> Result<Vec<PendingShipment>, TransportError> {
        Ok(self.pending.lock().unwrap().clone())
    }

    async fn record_shipments(&self, updates: &[ShipmentUpdate]) -> Result<(), TransportError> {
        self.shipment_writes.lock().unwrap().push(updates.to_vec());
        Ok(())
    }
}

/// Scripted shipment lookup: order number -> shipment. Anything not listed
/// answers like a blocked status page (carrier Unknown, no tracking).
#[derive(Default)]
pub struct FakeLookup {
    shipments: HashMap<String, Shipment>,
    calls: Mutex<Vec<String>>,
}

impl FakeLookup {
    pub fn new(shipments: HashMap<String, Shipment>) -> Self {
        Self {
            shipments,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ShipmentLookup for FakeLookup {
    async fn lookup(&self, order_number: &str) -> Result<Shipment, TransportError> {
        self.calls.lock().unwrap().push(order_number.to_string());
        Ok(self
            .shipments
            .get(order_number)
            .cloned()
            .unwrap_or_else(|| Shipment {
                carrier: "Unknown".to_string(),
                tracking_number: None,
            }))
    }
}

/// Captures sent mail instead of talking to a relay.
#[derive(Default)]
pub struct FakeNotifier {
    messages: Mutex<Vec<(String, String)>>,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// (subject, body) pairs in send order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), TransportError> {
        self.messages
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
        Ok(())
    }
}
