use serde::{Deserialize, Serialize};

use crate::upstream_config::UpstreamConfig;

/// One routable network: a primary upstream, an optional archive fallback,
/// and the chain id used for the canned `eth_chainId` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub primary: UpstreamConfig,
    #[serde(default)]
    pub fallback: Option<UpstreamConfig>,
    #[serde(default)]
    pub chain_id: Option<u64>,
}

impl NetworkConfig {
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}
