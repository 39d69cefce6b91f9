//! Double-buffered agent store.
//!
//! The store owns two fixed frames of [`Boid`]s and an atomic index naming the
//! committed one. Readers lock the committed frame; the single writer fills the
//! other frame from it and flips the index once the whole frame is written.
//! A reader therefore sees tick `N` or tick `N + 1` in full, never a mix.

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use tracing::trace;

use crate::boid::{Boid, MAX_LEVELS};
use crate::error::StoreError;

struct Frame {
    tick: u64,
    boids: Vec<Boid>,
}

/// Canonical agent state for the lifetime of a world.
pub struct AgentStore {
    frames: [RwLock<Frame>; 2],
    current: AtomicUsize,
    commit_lock: Mutex<()>,
    len: usize,
}

/// Read view of one fully committed tick.
pub struct Snapshot<'a> {
    frame: RwLockReadGuard<'a, Frame>,
}

impl Snapshot<'_> {
    /// Tick number of the frame being read.
    pub fn tick(&self) -> u64 {
        self.frame.tick
    }

    pub fn boids(&self) -> &[Boid] {
        &self.frame.boids
    }
}

impl Deref for Snapshot<'_> {
    type Target = [Boid];

    fn deref(&self) -> &[Boid] {
        &self.frame.boids
    }
}

impl AgentStore {
    /// Create a store holding `boids` as tick 0.
    ///
    /// Every agent must have a level below [`MAX_LEVELS`] and a finite position
    /// and heading. The agent count is fixed from here on.
    pub fn new(boids: Vec<Boid>) -> Result<Self, StoreError> {
        validate(&boids)?;
        let len = boids.len();
        let back = boids.clone();
        Ok(Self {
            frames: [
                RwLock::new(Frame { tick: 0, boids }),
                RwLock::new(Frame { tick: 0, boids: back }),
            ],
            current: AtomicUsize::new(0),
            commit_lock: Mutex::new(()),
            len,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Tick number of the committed frame.
    pub fn tick(&self) -> u64 {
        self.snapshot().tick()
    }

    /// Lock the committed frame for reading.
    ///
    /// Holding a snapshot blocks the commit after next, so keep it short-lived.
    pub fn snapshot(&self) -> Snapshot<'_> {
        loop {
            let idx = self.current.load(Ordering::Acquire);
            let frame = self.frames[idx].read();
            // A flip between the load and the lock would leave us on the back
            // frame, which may hold a partially written tick.
            if self.current.load(Ordering::Acquire) == idx {
                return Snapshot { frame };
            }
        }
    }

    /// Copy of the committed frame.
    pub fn to_vec(&self) -> Vec<Boid> {
        self.snapshot().to_vec()
    }

    /// Run one tick's writer.
    ///
    /// `write` receives the committed frame and the back frame. The back frame
    /// holds stale data and must be overwritten in full. The frames flip only
    /// if `write` returns `Ok`; on `Err` the committed state is untouched.
    ///
    /// Returns `write`'s output together with the tick number it committed.
    pub fn commit<T, E>(
        &self,
        write: impl FnOnce(&[Boid], &mut [Boid]) -> Result<T, E>,
    ) -> Result<(T, u64), E> {
        let _writer = self.commit_lock.lock();
        let front_idx = self.current.load(Ordering::Acquire);
        let back_idx = 1 - front_idx;

        let front = self.frames[front_idx].read();
        let mut back = self.frames[back_idx].write();
        let out = write(&front.boids, &mut back.boids)?;
        back.tick = front.tick + 1;
        let tick = back.tick;
        drop(back);
        drop(front);

        self.current.store(back_idx, Ordering::Release);
        trace!(tick, "committed frame");
        Ok((out, tick))
    }

    /// Replace every agent in one commit.
    pub fn replace(&self, boids: &[Boid]) -> Result<u64, StoreError> {
        if boids.len() != self.len {
            return Err(StoreError::LengthMismatch {
                expected: self.len,
                got: boids.len(),
            });
        }
        validate(boids)?;
        let ((), tick) = self.commit(|_, next| {
            next.copy_from_slice(boids);
            Ok::<_, StoreError>(())
        })?;
        Ok(tick)
    }
}

fn validate(boids: &[Boid]) -> Result<(), StoreError> {
    for (index, boid) in boids.iter().enumerate() {
        if boid.level >= MAX_LEVELS {
            return Err(StoreError::InvalidLevel {
                index,
                level: boid.level,
                max: MAX_LEVELS,
            });
        }
        if !boid.is_finite() {
            return Err(StoreError::NonFinite { index });
        }
    }
    Ok(())
}
