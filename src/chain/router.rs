//! Read-endpoint selection with chain-id validation and fallback.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::chain::reader::ChainReader;
use crate::errors::{Error, Result};

/// Selects a healthy read connection per network.
///
/// Endpoints are configured per network in priority order (primary first).
/// A candidate is accepted only when the chain id it reports matches the
/// requested network; mismatches and connection failures advance to the next
/// candidate. Validated connections are cached and reused across calls.
pub struct ReadEndpointRouter {
    endpoints: HashMap<u64, Vec<Arc<dyn ChainReader>>>,
    healthy: RwLock<HashMap<u64, Arc<dyn ChainReader>>>,
}

impl ReadEndpointRouter {
    pub fn new() -> Self {
        ReadEndpointRouter {
            endpoints: HashMap::new(),
            healthy: RwLock::new(HashMap::new()),
        }
    }

    /// Register the ordered endpoint list for a network.
    #[must_use]
    pub fn with_network(mut self, network_id: u64, endpoints: Vec<Arc<dyn ChainReader>>) -> Self {
        self.endpoints.insert(network_id, endpoints);
        self
    }

    /// Return a validated connection for `network_id`, probing candidates in
    /// priority order on the first call and reusing the cached winner after.
    ///
    /// # Errors
    ///
    /// `ApiError` when no configured endpoint both responds and reports the
    /// requested chain id.
    pub async fn get_connection(&self, network_id: u64) -> Result<Arc<dyn ChainReader>> {
        if let Some(conn) = self.healthy.read().await.get(&network_id) {
            return Ok(Arc::clone(conn));
        }

        let candidates = self.endpoints.get(&network_id).ok_or_else(|| {
            Error::api(
                format!("no provider available for network {network_id}"),
                "no endpoints configured",
            )
        })?;

        for (priority, candidate) in candidates.iter().enumerate() {
            match candidate.chain_id().await {
                Ok(id) if id == network_id => {
                    debug!(network_id, priority, "read endpoint validated");
                    self.healthy
                        .write()
                        .await
                        .insert(network_id, Arc::clone(candidate));
                    return Ok(Arc::clone(candidate));
                }
                Ok(id) => {
                    warn!(
                        network_id,
                        priority,
                        reported = id,
                        "endpoint reports wrong chain id, trying next"
                    );
                }
                Err(err) => {
                    warn!(network_id, priority, %err, "endpoint probe failed, trying next");
                }
            }
        }

        Err(Error::api(
            format!("no provider available for network {network_id}"),
            format!("all {} endpoints failed validation", candidates.len()),
        ))
    }

    /// Drop the cached connection for a network so the next call re-probes.
    pub async fn invalidate(&self, network_id: u64) {
        self.healthy.write().await.remove(&network_id);
    }
}

impl Default for ReadEndpointRouter {
    fn default() -> Self {
        Self::new()
    }
}
