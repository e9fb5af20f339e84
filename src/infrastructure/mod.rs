//! Infrastructure layer: the portal driver abstraction and its CDP backing.

pub mod cdp;
pub mod driver;
pub mod selectors;

pub use cdp::CdpDriver;
pub use driver::{SessionProvider, Target, UiDriver, Wait};
