//! Metrics Adapters
//!
//! Prometheus step counters and wallet latency histograms, rendered to
//! the text exposition format on demand.

pub mod prometheus;

pub use self::prometheus::StepMetrics;
