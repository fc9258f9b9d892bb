//! Single-flight, caching coordinator around [`ForecastLoadTask`].
//!
//! States:
//!
//! - `Idle`: nothing cached, nothing running.
//! - `Loading`: exactly one task in flight, tagged with a generation number.
//! - `Cached`: the last completed result, reused until invalidated.
//!
//! `start()` in `Idle` launches a task, in `Loading` does nothing, and in
//! `Cached` redelivers the cached result. `invalidate_and_restart()` drops the
//! cache and any in-flight task, then starts again. A completion whose
//! generation is no longer current is discarded, so a superseded task can never
//! overwrite a newer result.
//!
//! The state lock is never held while calling the subscriber. Notifications go
//! through a separate reentrant delivery lock, so a completion racing with an
//! invalidation is either delivered before the new `Started` or discarded.
//! The preferred location is read on the blocking pool, never on the thread
//! that triggers the load.

use parking_lot::{Mutex, ReentrantMutex};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::{
    config::PreferenceSource,
    model::{ForecastErrorKind, ForecastQuery, ForecastResult},
    task::ForecastLoadTask,
};

/// What the loader tells its subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    /// A task was launched. Always precedes the matching `Delivered`.
    Started,
    /// A result, either fresh from a task or from the cache.
    Delivered(Arc<ForecastResult>),
}

/// What a call to [`ForecastLoader::start`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Launched,
    CacheHit,
    AlreadyLoading,
}

pub type Subscriber = Arc<dyn Fn(LoadEvent) + Send + Sync>;

#[derive(Debug)]
enum LoaderState {
    Idle,
    Loading { generation: u64, handle: Option<JoinHandle<()>> },
    Cached(Arc<ForecastResult>),
}

struct Inner {
    state: LoaderState,
    generation: u64,
    subscriber: Option<Subscriber>,
}

struct Shared {
    inner: Mutex<Inner>,
    /// Held across every subscriber call; always taken before `inner`.
    delivery: ReentrantMutex<()>,
    task: ForecastLoadTask,
    preferences: Arc<dyn PreferenceSource>,
}

/// Cheap to clone; clones share the same cache and in-flight task.
///
/// Must be driven from inside a tokio runtime, since launching a load spawns
/// onto the current one.
#[derive(Clone)]
pub struct ForecastLoader {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for ForecastLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecastLoader")
            .field("state", &self.shared.inner.lock().state)
            .finish_non_exhaustive()
    }
}

impl ForecastLoader {
    pub fn new(task: ForecastLoadTask, preferences: Arc<dyn PreferenceSource>) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: LoaderState::Idle,
                    generation: 0,
                    subscriber: None,
                }),
                delivery: ReentrantMutex::new(()),
                task,
                preferences,
            }),
        }
    }

    /// Register the sole delivery target, replacing any previous one.
    pub fn subscribe(&self, subscriber: Subscriber) {
        self.shared.inner.lock().subscriber = Some(subscriber);
    }

    /// The cached result, if the loader is holding one.
    pub fn cached(&self) -> Option<Arc<ForecastResult>> {
        match &self.shared.inner.lock().state {
            LoaderState::Cached(result) => Some(result.clone()),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.shared.inner.lock().state, LoaderState::Loading { .. })
    }

    pub fn start(&self) -> StartOutcome {
        let _delivery = self.shared.delivery.lock();
        let mut inner = self.shared.inner.lock();

        let cached = match &inner.state {
            LoaderState::Loading { .. } => {
                tracing::debug!("forecast load already in flight");
                return StartOutcome::AlreadyLoading;
            }
            LoaderState::Cached(result) => Some(result.clone()),
            LoaderState::Idle => None,
        };
        let subscriber = inner.subscriber.clone();

        if let Some(result) = cached {
            drop(inner);
            tracing::debug!("delivering cached forecast");
            if let Some(subscriber) = subscriber {
                subscriber(LoadEvent::Delivered(result));
            }
            return StartOutcome::CacheHit;
        }

        inner.generation += 1;
        let generation = inner.generation;
        inner.state = LoaderState::Loading { generation, handle: None };
        drop(inner);

        // Announce before spawning so `Started` always precedes the delivery.
        if let Some(subscriber) = subscriber {
            subscriber(LoadEvent::Started);
        }

        let shared = self.shared.clone();
        let handle = tokio::spawn(async move {
            let result = Self::load(&shared).await;
            Self::complete(&shared, generation, result);
        });

        // The task may already have finished; only keep the handle while this
        // generation is still the one loading.
        let mut inner = self.shared.inner.lock();
        if let LoaderState::Loading { generation: current, handle: slot } = &mut inner.state {
            if *current == generation {
                *slot = Some(handle);
            }
        }
        StartOutcome::Launched
    }

    /// Drop the cached result and any in-flight task, then [`start`](Self::start).
    pub fn invalidate_and_restart(&self) -> StartOutcome {
        let previous = std::mem::replace(&mut self.shared.inner.lock().state, LoaderState::Idle);

        if let LoaderState::Loading { generation, handle } = previous {
            tracing::debug!(generation, "abandoning in-flight forecast load");
            if let Some(handle) = handle {
                handle.abort();
            }
        }

        self.start()
    }

    async fn load(shared: &Arc<Shared>) -> ForecastResult {
        // Preference sources may hit the disk.
        let preferences = shared.preferences.clone();
        match tokio::task::spawn_blocking(move || preferences.preferred_location()).await {
            Ok(location) => shared.task.run(&ForecastQuery::new(location)).await,
            Err(err) => {
                tracing::warn!(error = %err, "could not read preferred location");
                ForecastResult::Failure(ForecastErrorKind::Malformed)
            }
        }
    }

    fn complete(shared: &Shared, generation: u64, result: ForecastResult) {
        let _delivery = shared.delivery.lock();
        let mut inner = shared.inner.lock();

        match inner.state {
            LoaderState::Loading { generation: current, .. } if current == generation => {}
            _ => {
                tracing::debug!(generation, "discarding result of superseded forecast load");
                return;
            }
        }

        let result = Arc::new(result);
        inner.state = LoaderState::Cached(result.clone());
        let subscriber = inner.subscriber.clone();
        drop(inner);

        if let Some(subscriber) = subscriber {
            subscriber(LoadEvent::Delivered(result));
        }
    }
}
