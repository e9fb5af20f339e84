pub mod checkout_flow;
pub mod order_ctx;

pub use checkout_flow::{parse_order_number, CheckoutFlow};
pub use order_ctx::OrderCtx;
