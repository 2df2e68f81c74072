//! Background eviction task.

use std::fmt::Display;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::budget::BudgetSource;
use crate::registry::RateLimiterRegistry;

/// Owns a running sweeper task. Dropping the handle stops the task.
#[derive(Debug)]
pub struct SweeperHandle {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Stop the sweeper and wait for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

impl<K, B> RateLimiterRegistry<K, B>
where
    K: Eq + Hash + Clone + Display + Send + Sync + 'static,
    B: BudgetSource<K>,
{
    /// Run [`sweep`](Self::sweep) every `interval` on the current tokio
    /// runtime.
    ///
    /// The task holds only a weak reference and exits on its own once the
    /// registry is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> SweeperHandle {
        let registry: Weak<Self> = Arc::downgrade(self);
        let name = self.name();
        let (stop, mut stopped) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    _ = ticker.tick() => {
                        let Some(live) = registry.upgrade() else { break };
                        live.sweep();
                    }
                }
            }
            tracing::debug!(limiter = name, "rate-limit sweeper stopped");
        });

        SweeperHandle {
            stop: Some(stop),
            task: Some(task),
        }
    }
}
