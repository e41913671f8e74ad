use serde::{Deserialize, Serialize};

/// Bounds concurrent outbound requests per network, independent of the breaker.
/// `max_concurrent` caps in-flight upstream calls; `max_queued` caps how many
/// additional callers may wait for a free slot before being rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestQueueConfig {
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    #[serde(default = "default_max_queued")]
    pub max_queued: usize,
}

fn default_max_concurrent() -> usize {
    100
}

fn default_max_queued() -> usize {
    1_000
}

impl Default for RequestQueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            max_queued: default_max_queued(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_permissive() {
        let config = RequestQueueConfig::default();
        assert_eq!(config.max_concurrent, 100);
        assert_eq!(config.max_queued, 1_000);
    }
}
