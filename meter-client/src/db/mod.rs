pub mod meter_reading_queries;

pub use meter_reading_queries::{load_readings, MeterReadingRow};
