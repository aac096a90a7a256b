//! Process-wide TTL cache for the archive tree.
//!
//! The tree carries no viewer-specific filtering, so one cached value
//! serves every caller. The cache is deliberately last-writer-wins: the
//! loader runs outside the lock, so two tasks that both observe a miss
//! both rebuild and the later write sticks. A redundant rebuild is a
//! duplicate store query, not a correctness problem, since the tree is a
//! pure function of durable store state.

use crate::error::Result;
use crate::tree::ArchiveNode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// How long a built tree stays fresh.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

struct CachedTree {
    tree: Arc<Vec<ArchiveNode>>,
    built_at: Instant,
}

/// Single-value cache holding the archive tree and its build timestamp.
///
/// Construct one per process and hand it to every request handler; do not
/// create one per request.
pub struct ArchiveCache {
    ttl: Duration,
    state: RwLock<Option<CachedTree>>,
}

impl Default for ArchiveCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl, state: RwLock::new(None) }
    }

    /// Return the cached tree if it is younger than the TTL, otherwise run
    /// `loader`, cache its output, and return it. Loader errors propagate
    /// without touching the cached value.
    pub async fn get_or_build<F, Fut>(&self, loader: F) -> Result<Arc<Vec<ArchiveNode>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<ArchiveNode>>>,
    {
        if let Some(cached) = self.state.read().await.as_ref() {
            if cached.built_at.elapsed() < self.ttl {
                return Ok(Arc::clone(&cached.tree));
            }
        }
        let tree = Arc::new(loader().await?);
        *self.state.write().await = Some(CachedTree { tree: Arc::clone(&tree), built_at: Instant::now() });
        Ok(tree)
    }

    /// Drop the cached value unconditionally. Every write path that touches
    /// semester, course, item, lab, or assistant data calls this last.
    pub async fn invalidate(&self) {
        *self.state.write().await = None;
    }
}
