use super::types::*;
use super::utils::calculate_delay;
use crate::core::pipeline::Stage;
use std::collections::HashMap;
use std::time::Duration;

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            backoff_policy: BackoffPolicy::Exponential { factor: 2.0 },
        }
    }
}

impl RetryPolicy {
    pub fn attempts(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, initial_delay: Duration, max_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self.max_delay = max_delay;
        self
    }

    pub fn with_backoff(mut self, backoff_policy: BackoffPolicy) -> Self {
        self.backoff_policy = backoff_policy;
        self
    }

    pub fn calculate_delay(&self, attempt: usize) -> Duration {
        calculate_delay(self, attempt)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        let mut stages = HashMap::new();
        stages.insert(Stage::Connected, RetryPolicy::attempts(2));
        // Overlays that come back are handled by the sweep's own rounds.
        stages.insert(Stage::PopupsClear, RetryPolicy::attempts(1));
        stages.insert(Stage::SublistOpen, RetryPolicy::attempts(3));
        stages.insert(Stage::FiltersSet, RetryPolicy::attempts(2));
        stages.insert(Stage::SearchSubmitted, RetryPolicy::attempts(2));
        // The grid wait is already the longest bounded wait of the run.
        stages.insert(Stage::ResultsReady, RetryPolicy::attempts(1));

        Self {
            stages,
            fallback: RetryPolicy::default(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self, stage: Stage) -> &RetryPolicy {
        self.stages.get(&stage).unwrap_or(&self.fallback)
    }

    pub fn set_policy(&mut self, stage: Stage, policy: RetryPolicy) {
        self.stages.insert(stage, policy);
    }

    /// Same attempt counts, no pauses between attempts.
    pub fn without_delays(mut self) -> Self {
        for policy in self.stages.values_mut() {
            policy.initial_delay = Duration::ZERO;
            policy.max_delay = Duration::ZERO;
        }
        self.fallback.initial_delay = Duration::ZERO;
        self.fallback.max_delay = Duration::ZERO;
        self
    }
}
