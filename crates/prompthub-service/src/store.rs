//! Polling prompt store.
//!
//! `PromptStore` owns the authoritative client-side copy of the catalog.
//! Each poll replaces the whole catalog; subscribers are told on the first
//! successful fetch and afterwards only when the list changes. Deliveries
//! are serialized and always end on the newest catalog.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use prompthub_core::catalog::Catalog;
use prompthub_core::prompt::Prompt;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{PromptService, ServiceError};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
#[error("prompt fetch failed: {0}")]
pub struct FetchError(#[from] pub ServiceError);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    /// Ceiling for the delay after repeated failures.
    pub max_backoff: Duration,
}

impl PollConfig {
    pub fn from_millis(interval_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            max_backoff: Duration::from_millis(max_backoff_ms),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

/// Delay before the next poll after `failures` consecutive failed fetches.
/// Doubles per failure, capped at `max_backoff` (never below `interval`).
pub fn backoff_delay(interval: Duration, failures: u32, max_backoff: Duration) -> Duration {
    if failures == 0 {
        return interval;
    }
    let factor = 1u32.checked_shl(failures.min(16)).unwrap_or(u32::MAX);
    interval
        .saturating_mul(factor)
        .min(max_backoff.max(interval))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&Arc<Catalog>) + Send + Sync>;

/// The current catalog and how many times it has been replaced.
/// Generation 0 means nothing has loaded yet.
struct Current {
    catalog: Arc<Catalog>,
    generation: u64,
}

struct Shared {
    service: Arc<dyn PromptService>,
    current: Mutex<Current>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    /// Held while listeners run, so deliveries never interleave.
    delivery: Mutex<()>,
    next_subscription: AtomicU64,
    failures: AtomicU32,
    paused: AtomicBool,
}

impl Shared {
    async fn refresh(&self) -> Result<Vec<Prompt>, FetchError> {
        match self.service.list_prompts().await {
            Ok(prompts) => {
                self.failures.store(0, Ordering::Relaxed);
                self.apply(prompts.clone());
                Ok(prompts)
            }
            Err(e) => {
                let failures = self.failures.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(failures, "error fetching prompts: {e}");
                Err(FetchError(e))
            }
        }
    }

    fn apply(&self, prompts: Vec<Prompt>) {
        let (next, generation) = {
            let mut current = self.current.lock().unwrap();
            // The first successful fetch always counts, even when empty.
            if current.generation > 0 && current.catalog.prompts() == prompts.as_slice() {
                return;
            }
            current.generation += 1;
            current.catalog = Arc::new(Catalog::new(prompts));
            (current.catalog.clone(), current.generation)
        };
        debug!(
            prompts = next.len(),
            tags = next.tags().len(),
            generation,
            "catalog replaced"
        );

        // Listeners run outside the catalog lock so they may read the store.
        // A catalog that was superseded before its turn to be delivered is
        // dropped; whoever replaced it delivers the newer one afterwards.
        let _delivery = self.delivery.lock().unwrap();
        if self.current.lock().unwrap().generation != generation {
            debug!(generation, "skipping superseded catalog");
            return;
        }
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(&next);
        }
    }
}

pub struct PromptStore {
    shared: Arc<Shared>,
    poller: Option<JoinHandle<()>>,
}

impl PromptStore {
    pub fn new(service: Arc<dyn PromptService>) -> Self {
        Self {
            shared: Arc::new(Shared {
                service,
                current: Mutex::new(Current {
                    catalog: Arc::new(Catalog::default()),
                    generation: 0,
                }),
                listeners: Mutex::new(Vec::new()),
                delivery: Mutex::new(()),
                next_subscription: AtomicU64::new(0),
                failures: AtomicU32::new(0),
                paused: AtomicBool::new(false),
            }),
            poller: None,
        }
    }

    /// The catalog as of the last successful fetch.
    pub fn snapshot(&self) -> Arc<Catalog> {
        self.shared.current.lock().unwrap().catalog.clone()
    }

    /// Number of times the catalog has been replaced. Zero until the first
    /// successful fetch.
    pub fn generation(&self) -> u64 {
        self.shared.current.lock().unwrap().generation
    }

    /// Fetch now and replace the catalog. On failure the previous catalog is
    /// kept and the error is logged.
    pub async fn refresh(&self) -> Result<Vec<Prompt>, FetchError> {
        self.shared.refresh().await
    }

    /// Fire a single refresh on `handle` without waiting for it.
    pub fn spawn_refresh(&self, handle: &Handle) {
        let shared = self.shared.clone();
        handle.spawn(async move {
            let _ = shared.refresh().await;
        });
    }

    /// Start polling on `handle`. The first poll fires one interval from now;
    /// callers do their own mount-time `refresh`. Restarts if already running.
    ///
    /// Every tick spawns its fetch as a separate task, so a slow response
    /// never delays the next tick and whichever fetch settles last wins.
    pub fn start(&mut self, handle: &Handle, config: PollConfig) {
        self.stop();
        info!(
            interval_ms = config.interval.as_millis() as u64,
            max_backoff_ms = config.max_backoff.as_millis() as u64,
            "prompt polling started"
        );
        let shared = self.shared.clone();
        let fetch_handle = handle.clone();
        self.poller = Some(handle.spawn(async move {
            loop {
                let failures = shared.failures.load(Ordering::Relaxed);
                let delay = backoff_delay(config.interval, failures, config.max_backoff);
                tokio::time::sleep(delay).await;
                if shared.paused.load(Ordering::Relaxed) {
                    continue;
                }
                let shared = shared.clone();
                fetch_handle.spawn(async move {
                    // Already logged inside refresh.
                    let _ = shared.refresh().await;
                });
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
            info!("prompt polling stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_finished())
    }

    /// Skip poll ticks until `resume`. A running loop keeps its schedule.
    pub fn pause(&self) {
        if !self.shared.paused.swap(true, Ordering::Relaxed) {
            debug!("prompt polling paused");
        }
    }

    pub fn resume(&self) {
        if self.shared.paused.swap(false, Ordering::Relaxed) {
            debug!("prompt polling resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Relaxed)
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.shared.failures.load(Ordering::Relaxed)
    }

    /// Register `listener` to receive every new catalog.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Arc<Catalog>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(
            self.shared
                .next_subscription
                .fetch_add(1, Ordering::Relaxed),
        );
        self.shared
            .listeners
            .lock()
            .unwrap()
            .push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.shared
            .listeners
            .lock()
            .unwrap()
            .retain(|(sid, _)| *sid != id);
    }
}

impl Drop for PromptStore {
    fn drop(&mut self) {
        self.stop();
    }
}
