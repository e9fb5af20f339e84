//! Checkout context: which PO is being processed, and where it sits in the
//! file's order list. Log display only, no behavior hangs off it.

use std::fmt::Display;

#[derive(Debug, Clone)]
pub struct OrderCtx {
    pub po_number: String,

    /// 1-based position within the file's extracted order list.
    pub position: usize,

    /// Order count of the file, for progress display.
    pub total: usize,
}

impl OrderCtx {
    pub fn new(po_number: impl Into<String>, position: usize, total: usize) -> Self {
        Self {
            po_number: po_number.into(),
            position,
            total,
        }
    }
}

impl Display for OrderCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PO {} ({}/{})", self.po_number, self.position, self.total)
    }
}
