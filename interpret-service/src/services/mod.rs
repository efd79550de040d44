pub mod chart;
pub mod metrics;
pub mod prompt;
pub mod providers;

pub use prompt::{PromptError, PromptLoader};
