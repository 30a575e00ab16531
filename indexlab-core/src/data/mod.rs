//! Market data: the date-indexed dataset, volume enrichment, and
//! date-window restriction.

pub mod dataset;
pub mod volume;
pub mod window;

pub use dataset::{MarketDataset, RawDataset, Snapshot};
