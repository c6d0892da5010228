use std::sync::Arc;
use std::time::Duration;

use flowcheck_core::scope::DEFAULT_RANDOM_INT_MAX;
use flowcheck_core::Generators;

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Upper bound on requests in flight at once.
    pub max_concurrency: usize,
    /// Used when a step sets no `timeoutMs`.
    pub default_step_timeout: Duration,
    /// Wall-clock budget for a whole run.
    pub run_deadline: Option<Duration>,
    pub max_response_bytes: usize,
    /// Inclusive upper bound for `$randomInt`.
    pub random_int_max: u32,
    pub random_seed: Option<u64>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            default_step_timeout: Duration::from_secs(30),
            run_deadline: None,
            max_response_bytes: 4 * 1024 * 1024,
            random_int_max: DEFAULT_RANDOM_INT_MAX,
            random_seed: None,
        }
    }
}

impl ExecutorConfig {
    /// Fresh generator state for one run.
    pub fn generators(&self) -> Arc<Generators> {
        Arc::new(match self.random_seed {
            Some(seed) => Generators::seeded(self.random_int_max, seed),
            None => Generators::new(self.random_int_max),
        })
    }

    pub fn step_timeout(&self, timeout_ms: Option<u64>) -> Duration {
        timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(self.default_step_timeout)
    }
}
