pub mod extract;
pub mod order;
pub mod tracking;

pub use extract::extract_orders;
pub use order::{CheckoutResult, LineItem, OrderFile, PurchaseOrder, ShippingInfo};
pub use tracking::{PendingShipment, Shipment, ShipmentUpdate, TrackingRecord};
