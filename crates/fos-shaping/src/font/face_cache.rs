//! Font Face Cache
//!
//! Maps fonts to their shaped faces. Faces are expensive to build and hold a
//! lot of address space, so only a handful are kept.
//!
//! The cache never blocks a lookup: when another thread holds the gate the
//! caller builds an uncached face instead of waiting. Evicted faces are
//! dropped after the gate is released so a slow native release does not
//! serialize unrelated callers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

use super::{FontFace, FontId};

struct CacheEntry<F> {
    font: FontId,
    face: FontFace<F>,
}

struct CacheState<F> {
    /// `None` until the first insert and after a reset
    slots: Option<Box<[Option<CacheEntry<F>>]>>,
    /// Most recently used slot
    mru: usize,
}

#[derive(Default)]
struct Counters {
    fast_hits: AtomicU64,
    slow_hits: AtomicU64,
    slow_lookups: AtomicU64,
    misses: AtomicU64,
    busy: AtomicU64,
    evictions: AtomicU64,
}

/// Fixed-capacity font → face cache
pub struct FaceCache<F> {
    state: Mutex<CacheState<F>>,
    capacity: usize,
    counters: Counters,
}

impl<F> FaceCache<F> {
    /// Create a cache holding at most `capacity` faces
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState { slots: None, mru: 0 }),
            capacity: capacity.max(1),
            counters: Counters::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Return the cached face for `font`, or build one with `create`.
    ///
    /// The returned handle is one reference owned by the caller.
    pub fn get_or_create<E>(
        &self,
        font: FontId,
        create: impl FnOnce() -> Result<F, E>,
    ) -> Result<FontFace<F>, E> {
        if let Some(face) = self.lookup(font) {
            return Ok(face);
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        let face = FontFace::new(create()?);
        self.insert(font, &face);
        Ok(face)
    }

    /// Drop every cached face. Lookups racing the reset either finish
    /// against the old slots or miss and build a new face.
    pub fn reset(&self) {
        let detached = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.slots.take()
        };

        if let Some(slots) = detached {
            let released = slots.iter().flatten().count();
            tracing::debug!(released, "face cache reset");
            drop(slots);
        }
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .slots
            .as_deref()
            .map_or(0, |slots| slots.iter().flatten().count())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `font` currently owns a slot
    pub fn contains(&self, font: FontId) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .slots
            .as_deref()
            .is_some_and(|slots| slots.iter().flatten().any(|entry| entry.font == font))
    }

    /// Get cache statistics
    pub fn stats(&self) -> FaceCacheStats {
        FaceCacheStats {
            len: self.len(),
            capacity: self.capacity,
            fast_hits: self.counters.fast_hits.load(Ordering::Relaxed),
            slow_hits: self.counters.slow_hits.load(Ordering::Relaxed),
            slow_lookups: self.counters.slow_lookups.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            busy: self.counters.busy.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
        }
    }

    fn try_enter(&self) -> Option<MutexGuard<'_, CacheState<F>>> {
        match self.state.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => {
                self.counters.busy.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("face cache busy");
                None
            }
        }
    }

    fn lookup(&self, font: FontId) -> Option<FontFace<F>> {
        let mut guard = self.try_enter()?;
        let state = &mut *guard;
        let slots = state.slots.as_deref()?;

        if let Some(entry) = slots[state.mru].as_ref().filter(|entry| entry.font == font) {
            self.counters.fast_hits.fetch_add(1, Ordering::Relaxed);
            return Some(entry.face.clone());
        }

        self.counters.slow_lookups.fetch_add(1, Ordering::Relaxed);
        let index = slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|entry| entry.font == font))?;
        let face = slots[index].as_ref().map(|entry| entry.face.clone());
        state.mru = index;

        self.counters.slow_hits.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(slot = index, "face cache slow hit");
        face
    }

    fn insert(&self, font: FontId, face: &FontFace<F>) {
        let bumped = {
            let Some(mut guard) = self.try_enter() else {
                return;
            };
            let state = &mut *guard;
            let capacity = self.capacity;
            let slots = state
                .slots
                .get_or_insert_with(|| (0..capacity).map(|_| None).collect());

            // Default to the slot after the MRU, but take an empty one if any.
            let slot = slots
                .iter()
                .position(Option::is_none)
                .unwrap_or((state.mru + 1) % capacity);
            state.mru = slot;

            slots[slot].replace(CacheEntry { font, face: face.clone() })
        };

        if let Some(entry) = bumped {
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(evicted = entry.font.get(), "face cache eviction");
            drop(entry);
        }
    }
}

impl<F> std::fmt::Debug for FaceCache<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaceCache")
            .field("capacity", &self.capacity)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceCacheStats {
    pub len: usize,
    pub capacity: usize,
    pub fast_hits: u64,
    pub slow_hits: u64,
    /// Full scans of the slot array
    pub slow_lookups: u64,
    pub misses: u64,
    /// Lookups or inserts skipped because the gate was held
    pub busy: u64,
    pub evictions: u64,
}
