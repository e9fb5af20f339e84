//! Order domain entities.

use crate::error::CheckoutError;

/// A downloaded order file. Consumed once by extraction, archived after the
/// run regardless of per-PO outcome.
#[derive(Debug, Clone)]
pub struct OrderFile {
    pub name: String,
    pub contents: String,
}

impl OrderFile {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// Destination for one purchase order, taken from the first row of its group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingInfo {
    pub first_name: String,
    pub last_name: String,
    pub address1: String,
    /// Empty when the optional column is absent.
    pub address2: String,
    pub city: String,
    /// Two-letter code, passed to the portal's state dropdown as-is.
    pub state: String,
    pub zip: String,
}

/// One cart add. Duplicate SKUs across rows are NOT merged; every row becomes
/// its own line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub sku: String,
    pub quantity: u32,
}

/// A purchase order: one destination and its ordered line items, grouped from
/// the rows of a single order file.
#[derive(Debug, Clone)]
pub struct PurchaseOrder {
    pub po_number: String,
    pub shipping: ShippingInfo,
    pub items: Vec<LineItem>,
}

/// Outcome of one PO's trip through checkout.
#[derive(Debug)]
pub enum CheckoutResult {
    Success {
        po_number: String,
        /// `None` when the confirmation heading carried no parseable number;
        /// the order itself went through.
        vendor_order_number: Option<String>,
    },
    Failure {
        po_number: String,
        reason: CheckoutError,
    },
}

impl CheckoutResult {
    pub fn po_number(&self) -> &str {
        match self {
            CheckoutResult::Success { po_number, .. } => po_number,
            CheckoutResult::Failure { po_number, .. } => po_number,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CheckoutResult::Success { .. })
    }
}
