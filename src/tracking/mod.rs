//! Post-run shipment tracking: vendor status page scraping and the sheet
//! refresh sweep.

pub mod scraper;
pub mod sweep;

pub use scraper::{parse_tracking_page, ShipmentLookup, TrackingScraper};
pub use sweep::refresh_tracking;
