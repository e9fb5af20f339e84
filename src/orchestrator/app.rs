//! Run coordinator - the application entrypoint.
//!
//! ## Responsibilities
//!
//! 1. **Wiring**: builds the production collaborators from configuration
//! 2. **Top-level flow**: fetch order files → extract → batch-process per
//!    file → archive → record order numbers → summary email
//! 3. **Failure boundary**: any error escaping the order flow is reported
//!    once via an urgent email and re-raised for a non-zero exit
//! 4. **Shipment refresh**: after the order flow, resolve pending tracking
//!    rows
//!
//! Containment on the way down: a failed PO never aborts its file, a failed
//! file never aborts the run, and transport hiccups after the initial fetch
//! are logged rather than raised. Partial failure is a normal, zero-exit
//! outcome reported in the summary email.

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{error, info, warn};

use crate::browser::BrowserSessionProvider;
use crate::clients::{
    FtpOrderSource, Notifier, OrderFileSource, SheetBridgeClient, SmtpNotifier, TrackingStore,
};
use crate::config::Config;
use crate::error::CheckoutError;
use crate::infrastructure::SessionProvider;
use crate::models::{extract_orders, CheckoutResult, OrderFile, TrackingRecord};
use crate::orchestrator::batch::BatchOrchestrator;
use crate::tracking::{refresh_tracking, ShipmentLookup, TrackingScraper};

const SUMMARY_SUBJECT: &str = "FNET Order Summary";
const FAILURE_SUBJECT: &str = "FNET Bot Failed";

/// Per-file outcome recorded for the summary.
#[derive(Debug)]
pub enum FileStatus {
    Processed(Vec<CheckoutResult>),
    Skipped(String),
}

#[derive(Debug)]
pub struct FileOutcome {
    pub file: String,
    pub status: FileStatus,
}

/// Everything the run did, in file order. Feeds the summary email, the
/// tracking sheet append and the final log banner.
#[derive(Debug, Default)]
pub struct RunSummary {
    outcomes: Vec<FileOutcome>,
}

impl RunSummary {
    pub fn record_processed(&mut self, file: &str, results: Vec<CheckoutResult>) {
        self.outcomes.push(FileOutcome {
            file: file.to_string(),
            status: FileStatus::Processed(results),
        });
    }

    pub fn record_skipped(&mut self, file: &str, reason: String) {
        self.outcomes.push(FileOutcome {
            file: file.to_string(),
            status: FileStatus::Skipped(reason),
        });
    }

    fn results(&self) -> impl Iterator<Item = (&str, &CheckoutResult)> {
        self.outcomes.iter().filter_map(|outcome| match &outcome.status {
            FileStatus::Processed(results) => Some((outcome.file.as_str(), results)),
            FileStatus::Skipped(_) => None,
        })
        .flat_map(|(file, results)| results.iter().map(move |result| (file, result)))
    }

    pub fn success_count(&self) -> usize {
        self.results().filter(|(_, r)| r.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.results().filter(|(_, r)| !r.is_success()).count()
    }

    /// Placed orders as (po, file, vendor order number).
    pub fn placed(&self) -> Vec<(&str, &str, Option<&str>)> {
        self.results()
            .filter_map(|(file, result)| match result {
                CheckoutResult::Success {
                    po_number,
                    vendor_order_number,
                } => Some((po_number.as_str(), file, vendor_order_number.as_deref())),
                CheckoutResult::Failure { .. } => None,
            })
            .collect()
    }

    /// Failed orders as (po, file, reason).
    pub fn failed(&self) -> Vec<(&str, &str, &CheckoutError)> {
        self.results()
            .filter_map(|(file, result)| match result {
                CheckoutResult::Failure { po_number, reason } => {
                    Some((po_number.as_str(), file, reason))
                }
                CheckoutResult::Success { .. } => None,
            })
            .collect()
    }

    /// Skipped files as (file, reason).
    pub fn skipped(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match &outcome.status {
                FileStatus::Skipped(reason) => {
                    Some((outcome.file.as_str(), reason.as_str()))
                }
                FileStatus::Processed(_) => None,
            })
            .collect()
    }

    /// Rows for the tracking sheet. Placed orders whose confirmation heading
    /// yielded no number have nothing to record and are left out.
    pub fn tracking_records(&self) -> Vec<TrackingRecord> {
        self.placed()
            .into_iter()
            .filter_map(|(po, _, number)| {
                number.map(|order_number| TrackingRecord {
                    po_number: po.to_string(),
                    order_number: order_number.to_string(),
                })
            })
            .collect()
    }
}

/// The application. Owns the collaborators for one complete run.
pub struct App<P, F, T, N, L>
where
    P: SessionProvider,
    F: OrderFileSource,
    T: TrackingStore,
    N: Notifier,
    L: ShipmentLookup,
{
    config: Config,
    orchestrator: BatchOrchestrator<P>,
    source: F,
    store: T,
    notifier: N,
    lookup: L,
}

impl App<BrowserSessionProvider, FtpOrderSource, SheetBridgeClient, SmtpNotifier, TrackingScraper> {
    /// Wires the production collaborators.
    pub fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);
        let provider = BrowserSessionProvider::new(&config);
        let source = FtpOrderSource::new(&config);
        let store = SheetBridgeClient::new(&config);
        let notifier = SmtpNotifier::new(&config).context("building the SMTP notifier")?;
        let lookup = TrackingScraper::new(&config).context("building the tracking scraper")?;
        Ok(Self::with_parts(config, provider, source, store, notifier, lookup))
    }
}

impl<P, F, T, N, L> App<P, F, T, N, L>
where
    P: SessionProvider,
    F: OrderFileSource,
    T: TrackingStore,
    N: Notifier,
    L: ShipmentLookup,
{
    pub fn with_parts(
        config: Config,
        provider: P,
        source: F,
        store: T,
        notifier: N,
        lookup: L,
    ) -> Self {
        let orchestrator = BatchOrchestrator::new(provider, &config);
        Self {
            config,
            orchestrator,
            source,
            store,
            notifier,
            lookup,
        }
    }

    /// One complete run. Partial PO failures still end in `Ok`; only an
    /// error escaping the order flow (reported by email first) or a failed
    /// shipment refresh is raised.
    pub async fn run(&self) -> Result<()> {
        if let Err(e) = self.execute().await {
            error!("💥 Run aborted: {e:#}");
            // Best effort, the alert must not mask the original failure.
            if let Err(mail) = self.notifier.send(FAILURE_SUBJECT, &failure_body(&e)).await {
                error!("❌ Failure alert could not be sent: {mail}");
            }
            return Err(e);
        }

        // The refresh runs outside the failure alert: a tracking miss is not
        // an order failure and the orders above are already placed.
        let updated = refresh_tracking(&self.store, &self.lookup)
            .await
            .context("refreshing shipment tracking")?;
        if updated > 0 {
            info!("🚚 {updated} shipment update(s) written to the tracking sheet");
        }
        Ok(())
    }

    async fn execute(&self) -> Result<()> {
        let names = self
            .source
            .fetch()
            .await
            .context("fetching order files from the drop")?;
        if names.is_empty() {
            info!("📭 Order drop is empty, nothing to do");
            return Ok(());
        }

        let mut summary = RunSummary::default();
        for name in &names {
            match self.process_file(name).await {
                Ok(results) => summary.record_processed(name, results),
                Err(reason) => {
                    warn!("⚠️ Skipping {name}: {reason:#}");
                    summary.record_skipped(name, format!("{reason:#}"));
                }
            }
        }

        self.archive_files(&names).await;
        self.record_orders(&summary).await;
        self.send_summary(&summary).await;
        log_final_stats(&summary);
        Ok(())
    }

    /// Reads, extracts and batch-processes one downloaded file. An error here
    /// skips this file only.
    async fn process_file(&self, name: &str) -> Result<Vec<CheckoutResult>> {
        let path = self.config.orders_dir.join(name);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let file = OrderFile::new(name, contents);
        let orders = extract_orders(&file)?;
        if orders.is_empty() {
            info!("📄 {name}: file holds no orders");
            return Ok(Vec::new());
        }

        log_file_start(name, orders.len());
        Ok(self.orchestrator.process(name, &orders).await)
    }

    /// Moves consumed files out of the way, drop-side and locally. Archiving
    /// runs for every fetched file regardless of its outcome; a file that
    /// failed will not parse better on a second pass, and the summary email
    /// is the record of what happened.
    async fn archive_files(&self, names: &[String]) {
        if let Err(e) = self.source.archive(names).await {
            warn!("⚠️ Drop-side archive failed: {e}");
        }

        let processed_dir = self.config.orders_dir.join("processed");
        if let Err(e) = tokio::fs::create_dir_all(&processed_dir).await {
            warn!("⚠️ Could not create {}: {e}", processed_dir.display());
            return;
        }
        for name in names {
            let from = self.config.orders_dir.join(name);
            let to = processed_dir.join(name);
            if let Err(e) = tokio::fs::rename(&from, &to).await {
                warn!("⚠️ Could not move {name} into processed/: {e}");
            }
        }
    }

    async fn record_orders(&self, summary: &RunSummary) {
        let records = summary.tracking_records();
        if records.is_empty() {
            return;
        }
        match self.store.append_batch(&records).await {
            Ok(()) => info!("📊 Recorded {} order number(s)", records.len()),
            // Loud: these orders are placed and their numbers exist only in
            // the logs now.
            Err(e) => error!("❌ Could not record order numbers to the tracking sheet: {e}"),
        }
    }

    async fn send_summary(&self, summary: &RunSummary) {
        let body = summary_body(summary);
        if let Err(e) = self.notifier.send(SUMMARY_SUBJECT, &body).await {
            warn!("⚠️ Summary email could not be sent: {e}");
        }
    }
}

// ========== email bodies ==========

fn summary_body(summary: &RunSummary) -> String {
    let mut body = format!("FNET order run {}\n\n", Local::now().format("%Y-%m-%d %H:%M"));

    let placed = summary.placed();
    body.push_str(&format!("Successful orders ({}):\n", placed.len()));
    if placed.is_empty() {
        body.push_str("  None\n");
    }
    for (po, file, number) in &placed {
        match number {
            Some(n) => body.push_str(&format!("  {po} ({file}) -> order #{n}\n")),
            None => body.push_str(&format!("  {po} ({file}) -> order number not captured\n")),
        }
    }
    body.push('\n');

    let failed = summary.failed();
    body.push_str(&format!("Failed orders ({}):\n", failed.len()));
    if failed.is_empty() {
        body.push_str("  None\n");
    }
    for (po, file, reason) in &failed {
        body.push_str(&format!("  {po} ({file}): failed at {}\n", reason.step()));
    }
    body.push('\n');

    let skipped = summary.skipped();
    body.push_str(&format!("Skipped files ({}):\n", skipped.len()));
    if skipped.is_empty() {
        body.push_str("  None\n");
    }
    for (file, reason) in &skipped {
        body.push_str(&format!("  {file}: {reason}\n"));
    }

    body
}

fn failure_body(error: &anyhow::Error) -> String {
    format!(
        "The FNET order run aborted before completion.\n\n\
         Error: {error:#}\n\n\
         Unprocessed files remain in the drop and will be picked up by the \
         next run. Check the logs before re-running: orders placed before \
         the abort are already with the vendor.\n"
    )
}

// ========== log helpers ==========

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 FNET order bot starting");
    info!("📦 Batch size: {} PO(s) per session", config.batch_size);
    info!("🖥️ Headless: {}", config.headless);
    info!("📁 Orders directory: {}", config.orders_dir.display());
    info!("{}", "=".repeat(60));
}

fn log_file_start(name: &str, order_count: usize) {
    info!("📄 {name}: {order_count} purchase order(s) extracted");
}

fn log_final_stats(summary: &RunSummary) {
    info!("{}", "=".repeat(60));
    info!("📊 Run complete at {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!("✅ Placed: {}", summary.success_count());
    info!("❌ Failed: {}", summary.failure_count());
    let skipped = summary.skipped();
    if !skipped.is_empty() {
        info!("⚠️ Skipped files: {}", skipped.len());
    }
    info!("{}", "=".repeat(60));
}

// ========== tests ==========
