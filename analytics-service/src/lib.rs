pub mod aggregate;
pub mod config;
pub mod dashboard;
pub mod export;
pub mod ingest;
pub mod metrics_server;
pub mod observability;
pub mod sources;

pub use aggregate::{
    aggregate, aggregate_range, bucket_key, filter_and_aggregate, filter_and_aggregate_now, filter_recent,
};
pub use ingest::{ingest, IngestReport};
