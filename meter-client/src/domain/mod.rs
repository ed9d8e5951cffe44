mod aggregated_point;
mod reading;
mod resolution;

pub use aggregated_point::AggregatedPoint;
pub use reading::{parse_timestamp, IngestError, RawReading, Reading};
pub use resolution::{Resolution, UnknownResolution};
