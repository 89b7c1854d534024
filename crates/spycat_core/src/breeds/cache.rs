//! Time-bounded breed vocabulary cache.
//!
//! # Invariants
//! - Readers observe either the previous complete snapshot or the next one;
//!   snapshots are swapped whole behind an `RwLock`.
//! - At most one refresh is in flight. While it runs, callers holding a stale
//!   snapshot answer from it without waiting; callers with no snapshot wait
//!   for that refresh and share its outcome instead of fetching again.
//! - A failed refresh never replaces an existing snapshot. Lookups keep
//!   answering from the stale vocabulary; the stale timestamp is kept so the
//!   next lookup after the failed attempt tries again.
//! - With no snapshot at all, a refresh failure propagates.
//! - An empty upstream vocabulary counts as a failed refresh.

use crate::breeds::{normalize_breed, BreedError, BreedSource, BreedValidator};
use log::{info, warn};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, TryLockError};
use std::time::{Duration, Instant};

/// Monotonic time source, injectable for tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct Snapshot {
    breeds: HashSet<String>,
    refreshed_at: Instant,
}

/// Outcome of the latest refresh attempt, guarded by the refresh lock.
#[derive(Default)]
struct RefreshState {
    last_error: Option<BreedError>,
}

/// Lazily refreshed cache over a [`BreedSource`].
pub struct BreedCache<S, C = SystemClock> {
    source: S,
    clock: C,
    ttl: Duration,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    refresh_lock: Mutex<RefreshState>,
    /// Bumped after every finished refresh attempt, successful or not.
    attempts: AtomicU64,
}

impl<S: BreedSource> BreedCache<S, SystemClock> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self::with_clock(source, SystemClock, ttl)
    }
}

impl<S: BreedSource, C: Clock> BreedCache<S, C> {
    pub fn with_clock(source: S, clock: C, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            ttl,
            snapshot: RwLock::new(None),
            refresh_lock: Mutex::new(RefreshState::default()),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of cached breeds, or `None` before the first refresh.
    pub fn cached_len(&self) -> Option<usize> {
        self.current().map(|snapshot| snapshot.breeds.len())
    }

    /// Drops the snapshot so the next lookup refreshes unconditionally.
    pub fn invalidate(&self) {
        let _state = self.lock_refresh();
        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn current(&self) -> Option<Arc<Snapshot>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn is_fresh(&self, snapshot: &Snapshot) -> bool {
        self.clock
            .now()
            .saturating_duration_since(snapshot.refreshed_at)
            <= self.ttl
    }

    fn lock_refresh(&self) -> MutexGuard<'_, RefreshState> {
        self.refresh_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot_for_lookup(&self) -> Result<Arc<Snapshot>, BreedError> {
        let existing = self.current();
        if let Some(snapshot) = existing.as_ref().filter(|s| self.is_fresh(s)) {
            return Ok(Arc::clone(snapshot));
        }
        let seen_attempts = self.attempts.load(Ordering::SeqCst);

        let mut state = match existing {
            // Stale callers never queue behind an in-flight refresh.
            Some(stale) => match self.refresh_lock.try_lock() {
                Ok(state) => state,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => return Ok(stale),
            },
            None => self.lock_refresh(),
        };

        let existing = self.current();
        if let Some(snapshot) = existing.as_ref().filter(|s| self.is_fresh(s)) {
            return Ok(Arc::clone(snapshot));
        }
        // A refresh finished while this caller waited; reuse its outcome.
        if self.attempts.load(Ordering::SeqCst) != seen_attempts {
            return match (existing, state.last_error.clone()) {
                (Some(snapshot), _) => Ok(snapshot),
                (None, Some(err)) => Err(err),
                (None, None) => Err(BreedError::UpstreamUnavailable(
                    "breed vocabulary was invalidated during refresh".to_string(),
                )),
            };
        }

        let outcome = self.refresh();
        state.last_error = outcome.as_ref().err().cloned();
        self.attempts.fetch_add(1, Ordering::SeqCst);

        match outcome {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => match existing {
                Some(stale) => {
                    warn!(
                        "event=breed_cache_refresh module=breeds status=error fallback=stale cached={} error={}",
                        stale.breeds.len(),
                        err
                    );
                    Ok(stale)
                }
                None => {
                    warn!(
                        "event=breed_cache_refresh module=breeds status=error fallback=none error={}",
                        err
                    );
                    Err(err)
                }
            },
        }
    }

    fn refresh(&self) -> Result<Arc<Snapshot>, BreedError> {
        let started_at = self.clock.now();
        let names = self.source.fetch_breeds()?;
        let breeds: HashSet<String> = names.iter().map(|name| normalize_breed(name)).collect();
        if breeds.is_empty() {
            return Err(BreedError::UpstreamUnavailable(
                "upstream returned an empty breed list".to_string(),
            ));
        }

        let snapshot = Arc::new(Snapshot {
            breeds,
            refreshed_at: started_at,
        });
        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&snapshot));

        info!(
            "event=breed_cache_refresh module=breeds status=ok count={} ttl_s={}",
            snapshot.breeds.len(),
            self.ttl.as_secs()
        );
        Ok(snapshot)
    }
}

impl<S: BreedSource, C: Clock> BreedValidator for BreedCache<S, C> {
    fn is_known_breed(&self, name: &str) -> Result<bool, BreedError> {
        let snapshot = self.snapshot_for_lookup()?;
        Ok(snapshot.breeds.contains(&normalize_breed(name)))
    }
}

impl<V: BreedValidator + ?Sized> BreedValidator for Arc<V> {
    fn is_known_breed(&self, name: &str) -> Result<bool, BreedError> {
        (**self).is_known_breed(name)
    }
}
