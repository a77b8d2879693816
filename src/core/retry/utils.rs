use super::types::*;
use std::time::Duration;

pub fn calculate_delay(policy: &RetryPolicy, attempt: usize) -> Duration {
    if attempt == 0 {
        return std::cmp::min(policy.initial_delay, policy.max_delay);
    }

    let delay = match policy.backoff_policy {
        BackoffPolicy::Constant => policy.initial_delay,
        BackoffPolicy::Linear => policy.initial_delay.mul_f32((attempt + 1) as f32),
        BackoffPolicy::Exponential { factor } => {
            policy.initial_delay.mul_f32(factor.powi(attempt as i32))
        }
    };

    std::cmp::min(delay, policy.max_delay)
}
