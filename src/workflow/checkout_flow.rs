//! Checkout flow - workflow layer
//!
//! The complete trip of one purchase order through the portal:
//! 1. search each line item and add it to the bag
//! 2. checkout page → shipping form → dropship method
//! 3. payment frames → submit → confirmation heading
//!
//! Strictly linear with no backward edges. The first failing step aborts the
//! PO; items already added to the bag stay there because the portal offers no
//! rollback, and retrying mid-wizard is not safe. The flow holds no session
//! resources, it only drives the `UiDriver` it is handed.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::{Config, PaymentCard};
use crate::error::{CheckoutError, DriverResult};
use crate::infrastructure::{selectors, Target, UiDriver, Wait};
use crate::models::{CheckoutResult, LineItem, PurchaseOrder, ShippingInfo};
use crate::workflow::order_ctx::OrderCtx;

static ORDER_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\d+)").expect("valid regex"));

/// The numeric token following `#` in a confirmation heading.
pub fn parse_order_number(heading: &str) -> Option<String> {
    ORDER_NUMBER_RE
        .captures(heading)
        .map(|captures| captures[1].to_string())
}

/// Drives one purchase order through the checkout wizard.
pub struct CheckoutFlow {
    checkout_url: String,
    payment: PaymentCard,
    /// Pause where the page exposes no observable condition. A reliability
    /// tradeoff, not a guarantee; tune via SETTLE_MS.
    settle: Duration,
}

impl CheckoutFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            checkout_url: config.checkout_url.clone(),
            payment: config.payment.clone(),
            settle: config.settle,
        }
    }

    /// Runs the wizard for one PO and reports the terminal outcome. Never
    /// returns an error: every failure is folded into the result so the batch
    /// can keep going.
    pub async fn run<D>(&self, driver: &D, order: &PurchaseOrder, ctx: &OrderCtx) -> CheckoutResult
    where
        D: UiDriver + ?Sized,
    {
        log_order_start(ctx, order);
        match self.execute(driver, order, ctx).await {
            Ok(vendor_order_number) => {
                match &vendor_order_number {
                    Some(number) => info!("[{ctx}] ✅ Order placed, vendor order #{number}"),
                    None => warn!("[{ctx}] ⚠️ Order placed, but no vendor order number was read"),
                }
                CheckoutResult::Success {
                    po_number: order.po_number.clone(),
                    vendor_order_number,
                }
            }
            Err(reason) => {
                error!("[{ctx}] ❌ Checkout failed at {}: {reason}", reason.step());
                CheckoutResult::Failure {
                    po_number: order.po_number.clone(),
                    reason,
                }
            }
        }
    }

    async fn execute<D>(
        &self,
        driver: &D,
        order: &PurchaseOrder,
        ctx: &OrderCtx,
    ) -> Result<Option<String>, CheckoutError>
    where
        D: UiDriver + ?Sized,
    {
        for item in &order.items {
            self.search_item(driver, item, ctx)
                .await
                .map_err(|source| CheckoutError::SearchItem {
                    sku: item.sku.clone(),
                    source,
                })?;
        }

        self.navigate_checkout(driver)
            .await
            .map_err(|source| CheckoutError::NavigateCheckout { source })?;

        self.fill_shipping(driver, &order.shipping)
            .await
            .map_err(|source| CheckoutError::FillShipping { source })?;

        self.proceed_shipping(driver)
            .await
            .map_err(|source| CheckoutError::ProceedShipping { source })?;

        self.fill_payment(driver, ctx)
            .await
            .map_err(|source| CheckoutError::FillPayment { source })?;

        self.submit_order(driver, ctx)
            .await
            .map_err(|source| CheckoutError::SubmitOrder { source })?;

        Ok(self.read_order_number(driver, ctx).await)
    }

    /// Searches one SKU and adds it to the bag.
    async fn search_item<D>(&self, driver: &D, item: &LineItem, ctx: &OrderCtx) -> DriverResult<()>
    where
        D: UiDriver + ?Sized,
    {
        info!("[{ctx}] 🔍 Searching sku {} (qty {})", item.sku, item.quantity);

        driver.wait_for(&selectors::SEARCH_INPUT, Wait::Long).await?;
        // The search box re-renders shortly after it first appears; filling
        // too early loses the text.
        sleep(self.settle).await;
        driver.fill(&selectors::SEARCH_INPUT, &item.sku).await?;
        driver.submit(&selectors::SEARCH_INPUT).await?;

        driver.wait_for(&selectors::PRODUCT_TITLE, Wait::Long).await?;
        if item.quantity > 1 {
            driver
                .fill(&selectors::QUANTITY_FIELD, &item.quantity.to_string())
                .await?;
        }
        driver.wait_for(&selectors::ADD_TO_BAG, Wait::Short).await?;
        driver.click(&selectors::ADD_TO_BAG).await?;
        // Nothing in the DOM marks the bag add as finished.
        sleep(self.settle).await;
        Ok(())
    }

    async fn navigate_checkout<D>(&self, driver: &D) -> DriverResult<()>
    where
        D: UiDriver + ?Sized,
    {
        driver.goto(&self.checkout_url).await?;
        driver.wait_for(&selectors::SHIPPING_FORM, Wait::Short).await?;
        Ok(())
    }

    /// Fills the destination. Every field is written, including empty ones,
    /// so values from the previous order in this session cannot leak through.
    async fn fill_shipping<D>(&self, driver: &D, shipping: &ShippingInfo) -> DriverResult<()>
    where
        D: UiDriver + ?Sized,
    {
        driver.wait_for(&selectors::FIRST_NAME, Wait::Short).await?;
        driver.fill(&selectors::FIRST_NAME, &shipping.first_name).await?;
        driver.fill(&selectors::LAST_NAME, &shipping.last_name).await?;
        driver.fill(&selectors::ADDRESS1, &shipping.address1).await?;
        driver.fill(&selectors::ADDRESS2, &shipping.address2).await?;
        driver.fill(&selectors::ZIP, &shipping.zip).await?;
        driver.fill(&selectors::CITY, &shipping.city).await?;
        driver
            .select_value(&selectors::STATE_DROPDOWN, &shipping.state)
            .await?;
        Ok(())
    }

    async fn proceed_shipping<D>(&self, driver: &D) -> DriverResult<()>
    where
        D: UiDriver + ?Sized,
    {
        driver.click(&selectors::SHIPPING_PROCEED).await?;
        // The dropship control appearing is what signals the method list has
        // loaded.
        driver.wait_for(&selectors::DROPSHIP_METHOD, Wait::Short).await?;
        driver.click_unchecked(&selectors::DROPSHIP_METHOD).await?;
        driver.wait_for(&selectors::PROCEED_CHECKOUT, Wait::Short).await?;
        driver.click(&selectors::PROCEED_CHECKOUT).await?;
        Ok(())
    }

    /// Enters the card details into the three isolated payment frames.
    async fn fill_payment<D>(&self, driver: &D, ctx: &OrderCtx) -> DriverResult<()>
    where
        D: UiDriver + ?Sized,
    {
        info!("[{ctx}] 💳 Entering payment details");

        driver.wait_for(&selectors::PAYMENT_FRAME, Wait::Long).await?;
        // The widget hydrates the frame contents after the frames attach, and
        // no condition observable from the parent document covers that.
        sleep(self.settle).await;

        self.fill_frame_field(driver, 0, &selectors::CARD_NUMBER_FIELD, self.payment.number.expose())
            .await?;
        self.fill_frame_field(driver, 1, &selectors::CARD_EXPIRY_FIELD, self.payment.expiry.expose())
            .await?;
        self.fill_frame_field(driver, 2, &selectors::CARD_CVV_FIELD, self.payment.cvv.expose())
            .await?;
        Ok(())
    }

    /// Fills one field inside the nth payment frame. The parent frame context
    /// is restored on success and failure alike; a fill error wins over an
    /// exit error when both occur.
    async fn fill_frame_field<D>(
        &self,
        driver: &D,
        nth: usize,
        field: &Target,
        value: &str,
    ) -> DriverResult<()>
    where
        D: UiDriver + ?Sized,
    {
        driver.enter_frame(&selectors::PAYMENT_FRAME, nth).await?;
        let filled = async {
            driver.wait_for(field, Wait::Short).await?;
            driver.fill(field, value).await
        }
        .await;
        let restored = driver.exit_frame().await;
        filled.and(restored)
    }

    async fn submit_order<D>(&self, driver: &D, ctx: &OrderCtx) -> DriverResult<()>
    where
        D: UiDriver + ?Sized,
    {
        info!("[{ctx}] 📤 Submitting the order");
        driver.wait_for(&selectors::SUBMIT_ORDER, Wait::Short).await?;
        driver.click(&selectors::SUBMIT_ORDER).await?;
        driver
            .wait_for(&selectors::CONFIRMATION_HEADING, Wait::Long)
            .await?;
        Ok(())
    }

    /// Reads the vendor order number off the confirmation page. The order is
    /// already placed at this point, so nothing here can fail the PO; a
    /// heading that will not yield a number is logged and recorded as absent.
    async fn read_order_number<D>(&self, driver: &D, ctx: &OrderCtx) -> Option<String>
    where
        D: UiDriver + ?Sized,
    {
        match driver.text(&selectors::CONFIRMATION_HEADING).await {
            Ok(heading) => {
                let number = parse_order_number(&heading);
                if number.is_none() {
                    warn!("[{ctx}] ⚠️ Confirmation heading has no order number: {heading:?}");
                }
                number
            }
            Err(e) => {
                warn!("[{ctx}] ⚠️ Could not read the confirmation heading: {e}");
                None
            }
        }
    }
}

// ========== log helpers ==========

fn log_order_start(ctx: &OrderCtx, order: &PurchaseOrder) {
    info!(
        "[{ctx}] 🛒 Starting checkout: {} item(s), shipping to {}, {}",
        order.items.len(),
        order.shipping.city,
        order.shipping.state
    );
}

// ========== tests ==========
