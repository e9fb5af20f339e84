//! Batch orchestration - one browser session per slice of purchase orders.
//!
//! ## Responsibilities
//!
//! 1. **Partitioning**: contiguous batches of `batch_size` POs, in file order
//! 2. **Session lifecycle**: open a fresh session per batch, close it on
//!    every exit path
//! 3. **Login policy**: exhausted retries skip the batch, an unconfirmed
//!    welcome banner is warned about and the batch proceeds
//! 4. **Sequencing**: checkout strictly one PO at a time, with a pacing
//!    pause after each placed order
//!
//! A browser session accumulates DOM and cart state over many sequential
//! checkouts; bounding the PO count per session keeps long runs stable. POs
//! of a skipped batch produce no results at all, so the caller can tell
//! "never attempted" from "attempted and failed".

use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::LoginError;
use crate::infrastructure::SessionProvider;
use crate::models::{CheckoutResult, PurchaseOrder};
use crate::services::Authenticator;
use crate::workflow::{CheckoutFlow, OrderCtx};

pub struct BatchOrchestrator<P: SessionProvider> {
    provider: P,
    authenticator: Authenticator,
    flow: CheckoutFlow,
    batch_size: usize,
    order_pace: Duration,
}

impl<P: SessionProvider> BatchOrchestrator<P> {
    pub fn new(provider: P, config: &Config) -> Self {
        Self {
            provider,
            authenticator: Authenticator::new(config),
            flow: CheckoutFlow::new(config),
            batch_size: config.batch_size,
            order_pace: config.order_pace,
        }
    }

    /// Processes one file's orders in fresh-session batches. Results come
    /// back in PO order; POs of batches that never got a working session are
    /// absent.
    pub async fn process(&self, file_name: &str, orders: &[PurchaseOrder]) -> Vec<CheckoutResult> {
        let total = orders.len();
        let total_batches = total.div_ceil(self.batch_size);
        let mut results = Vec::with_capacity(total);

        for (batch_index, batch) in orders.chunks(self.batch_size).enumerate() {
            let batch_num = batch_index + 1;
            log_batch_start(file_name, batch_num, total_batches, batch.len());

            let session = match self.provider.open().await {
                Ok(session) => session,
                Err(e) => {
                    error!(
                        "❌ Batch {batch_num}/{total_batches}: could not open a session, skipping {} PO(s): {e}",
                        batch.len()
                    );
                    continue;
                }
            };

            match self.authenticator.login(&session).await {
                Ok(()) => {}
                Err(LoginError::Ambiguous { banner }) => {
                    warn!(
                        "⚠️ Batch {batch_num}: sign-in unconfirmed (banner {banner:?}), proceeding anyway"
                    );
                }
                Err(e) => {
                    error!(
                        "❌ Batch {batch_num}/{total_batches}: login failed, skipping {} PO(s): {e}",
                        batch.len()
                    );
                    self.provider.close(session).await;
                    continue;
                }
            }

            let batch_results = self.run_batch(&session, batch, batch_index, total).await;
            self.provider.close(session).await;

            log_batch_complete(batch_num, &batch_results);
            results.extend(batch_results);
        }

        results
    }

    async fn run_batch(
        &self,
        session: &P::Session,
        batch: &[PurchaseOrder],
        batch_index: usize,
        total: usize,
    ) -> Vec<CheckoutResult> {
        let mut results = Vec::with_capacity(batch.len());
        for (offset, order) in batch.iter().enumerate() {
            let position = batch_index * self.batch_size + offset + 1;
            let ctx = OrderCtx::new(&order.po_number, position, total);

            let result = self.flow.run(session, order, &ctx).await;
            if result.is_success() {
                // Vendor-side pacing between placed orders.
                sleep(self.order_pace).await;
            }
            results.push(result);
        }
        results
    }
}

// ========== log helpers ==========

fn log_batch_start(file: &str, batch_num: usize, total_batches: usize, size: usize) {
    info!("{}", "=".repeat(60));
    info!("📦 {file}: batch {batch_num}/{total_batches}, {size} PO(s), fresh session");
    info!("{}", "=".repeat(60));
}

fn log_batch_complete(batch_num: usize, results: &[CheckoutResult]) {
    let succeeded = results.iter().filter(|r| r.is_success()).count();
    info!("{}", "─".repeat(60));
    info!("✓ Batch {batch_num} complete: {succeeded}/{} placed", results.len());
    info!("{}", "─".repeat(60));
}

// ========== tests ==========
