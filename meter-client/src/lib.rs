pub mod db;
pub mod domain;
pub mod retry;

pub use domain::{AggregatedPoint, IngestError, RawReading, Reading, Resolution};
pub use retry::RetryPolicy;
