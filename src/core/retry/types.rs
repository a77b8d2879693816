use crate::core::pipeline::Stage;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackoffPolicy {
    Constant,
    Linear,
    Exponential { factor: f32 },
}

/// Attempt budget for one stage of the navigation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_policy: BackoffPolicy,
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub stages: HashMap<Stage, RetryPolicy>,
    pub fallback: RetryPolicy,
}
