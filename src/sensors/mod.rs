pub mod analytics;
pub mod service;

pub use analytics::SensorAnalytics;
pub use service::{IngestError, Reading, SensorService};
