mod policy;
mod types;
mod utils;

pub use types::{BackoffPolicy, RetryConfig, RetryPolicy};
pub use utils::calculate_delay;
