use serde::{Deserialize, Serialize};

/// Controls how a JSON-RPC batch is fanned out across the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    #[serde(default = "default_batch_concurrency_limit")]
    pub batch_concurrency_limit: usize,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

fn default_batch_concurrency_limit() -> usize {
    10
}

fn default_max_batch_size() -> usize {
    100
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            batch_concurrency_limit: default_batch_concurrency_limit(),
            max_batch_size: default_max_batch_size(),
        }
    }
}
