pub mod chart;
pub mod envelope;

pub use chart::ChartRequest;
pub use envelope::{InterpretResponse, TokenUsage, format_processing_time};
