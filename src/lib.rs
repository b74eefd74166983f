//! Salescope: aggregate analytics over sales and customer CSV exports
//!
//! This library turns two raw tables (sales transactions, customer records) into
//! summary tables for charting: revenue trends by calendar period, discount and
//! refund rates, product rankings, spend/frequency segmentation, and geographic
//! distribution. Every transform is a stateless pure function over in-memory
//! records; nothing is persisted between calls.

pub mod cli;
pub mod data;
pub mod geo;
pub mod ranking;
pub mod rates;
pub mod segment;
pub mod trend;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use data::{
    load_city_reference, load_country_reference, load_customer_data, load_sales_data,
    CustomerData, CustomerRecord, CustomerType, SalesData, SalesRecord,
};
pub use geo::{resolve_customer_geo, GeoResolution, MatchType};
pub use rates::Rate;
pub use segment::SegmentBucket;
pub use trend::{GrowthPoint, PeriodBucket};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;

/// Round to two decimal places, matching the display precision of every
/// rate and growth figure in the report.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
