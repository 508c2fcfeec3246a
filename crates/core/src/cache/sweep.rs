//! Background removal of expired memory-tier entries.
//!
//! Lookups already refuse stale entries; the sweep keeps the memory tier from
//! holding pages nobody asks for again. The durable tier is left to lazy
//! removal and `QueryCache::purge_expired_durable`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::entry::CacheEntry;
use super::query::QueryCache;
use crate::clock::Clock;

/// Handle to a running expiry sweep. The task stops when this is dropped.
#[derive(Debug)]
pub struct ExpirySweep {
    handle: JoinHandle<()>,
}

impl ExpirySweep {
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for ExpirySweep {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn sweep_memory(memory: &RwLock<HashMap<String, CacheEntry>>, clock: &dyn Clock) -> usize {
    let now = clock.now();
    let mut memory = memory.write().await;
    let before = memory.len();
    memory.retain(|_, entry| entry.is_valid_at(now));
    before - memory.len()
}

impl QueryCache {
    /// Remove every stale memory-tier entry now.
    pub async fn sweep_expired(&self) -> usize {
        sweep_memory(&self.memory, self.clock.as_ref()).await
    }

    /// Start a task that calls `sweep_expired` every `interval`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_expiry_sweep(&self, interval: Duration) -> ExpirySweep {
        let memory = Arc::clone(&self.memory);
        let clock = Arc::clone(&self.clock);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let removed = sweep_memory(&memory, clock.as_ref()).await;
                if removed > 0 {
                    tracing::debug!(removed, "expired memory entries swept");
                }
            }
        });

        ExpirySweep { handle }
    }
}
