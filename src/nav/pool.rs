//! Fixed pool of reusable navigation paths
//!
//! Agents obtain a path when they are created and give it back when they are
//! destroyed. The pool never grows: all paths are allocated up front and a
//! free list threads through the vacant slots.
//!
//! # Example
//!
//! ```ignore
//! let mut pool = PathPool::new(16);
//!
//! let handle = pool.obtain()?;
//! if let Some(path) = pool.get_mut(&handle) {
//!     let _ = path.append_vertex(Vec2::ZERO);
//! }
//!
//! // Consumes the handle, so it cannot be returned twice
//! pool.release(handle);
//! ```

use super::path::NavPath;
use crate::core::NavError;

// ============================================================================
// Path Handle
// ============================================================================

/// Exclusive claim on one pooled path.
///
/// Deliberately neither `Clone` nor `Copy`: exactly one owner can hold a slot,
/// and [`PathPool::release`] takes the handle by value.
#[derive(Debug, PartialEq, Eq, Hash)]
#[must_use = "a dropped handle leaks its pooled path"]
pub struct PathHandle(usize);

impl PathHandle {
    /// Slot index, for logging
    #[inline]
    pub const fn raw(&self) -> usize {
        self.0
    }
}

// ============================================================================
// Slot State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// Handed out to an agent
    Occupied,
    /// Free, linking to the next free slot (or `NONE`)
    Vacant(usize),
}

// ============================================================================
// Path Pool
// ============================================================================

/// Fixed-capacity pool of [`NavPath`]s.
///
/// | Operation | Time Complexity |
/// |-----------|-----------------|
/// | `obtain`  | O(1)            |
/// | `release` | O(1)            |
/// | `get`     | O(1)            |
#[derive(Debug)]
pub struct PathPool {
    paths: Box<[NavPath]>,
    slots: Box<[Slot]>,
    free_head: usize,
    active_count: usize,
}

impl PathPool {
    const NONE: usize = usize::MAX;

    /// Allocate `capacity` empty paths
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let paths = (0..capacity).map(|_| NavPath::new()).collect();
        let slots = (0..capacity)
            .map(|i| {
                if i + 1 < capacity {
                    Slot::Vacant(i + 1)
                } else {
                    Slot::Vacant(Self::NONE)
                }
            })
            .collect();
        Self {
            paths,
            slots,
            free_head: if capacity > 0 { 0 } else { Self::NONE },
            active_count: 0,
        }
    }

    /// Claim a cleared path
    ///
    /// # Errors
    ///
    /// Returns [`NavError::PoolExhausted`] when every path is checked out,
    /// which means some owner never returned theirs
    pub fn obtain(&mut self) -> Result<PathHandle, NavError> {
        let index = self.free_head;
        let Some(Slot::Vacant(next)) = self.slots.get(index).copied() else {
            log::error!(
                "Path pool exhausted: all {} paths in use",
                self.slots.len()
            );
            return Err(NavError::PoolExhausted {
                capacity: self.slots.len(),
            });
        };

        self.free_head = next;
        self.slots[index] = Slot::Occupied;
        self.paths[index].clear();
        self.active_count += 1;
        Ok(PathHandle(index))
    }

    /// Give a path back to the pool
    pub fn release(&mut self, handle: PathHandle) {
        let index = handle.0;
        match self.slots.get(index) {
            Some(Slot::Occupied) => {
                self.slots[index] = Slot::Vacant(self.free_head);
                self.free_head = index;
                self.active_count -= 1;
            }
            _ => log::warn!("Released path handle {index} that is not checked out"),
        }
    }

    /// Path behind a live handle
    #[inline]
    pub fn get(&self, handle: &PathHandle) -> Option<&NavPath> {
        match self.slots.get(handle.0) {
            Some(Slot::Occupied) => self.paths.get(handle.0),
            _ => None,
        }
    }

    /// Mutable path behind a live handle
    #[inline]
    pub fn get_mut(&mut self, handle: &PathHandle) -> Option<&mut NavPath> {
        match self.slots.get(handle.0) {
            Some(Slot::Occupied) => self.paths.get_mut(handle.0),
            _ => None,
        }
    }

    /// Number of paths currently checked out
    #[inline]
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Number of paths still available
    #[inline]
    pub fn available(&self) -> usize {
        self.slots.len() - self.active_count
    }

    /// Total number of pooled paths
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;

    #[test]
    fn test_obtain_release_reuses_slot() {
        let mut pool = PathPool::new(2);
        let a = pool.obtain().unwrap();
        let raw = a.raw();
        assert_eq!(pool.active_count(), 1);

        pool.release(a);
        assert_eq!(pool.active_count(), 0);

        let b = pool.obtain().unwrap();
        assert_eq!(b.raw(), raw);
        pool.release(b);
    }

    #[test]
    fn test_live_handles_are_distinct() {
        let mut pool = PathPool::new(16);
        let handles: Vec<PathHandle> = (0..16).map(|_| pool.obtain().unwrap()).collect();

        let mut raws: Vec<usize> = handles.iter().map(PathHandle::raw).collect();
        raws.sort_unstable();
        raws.dedup();
        assert_eq!(raws.len(), 16);

        for h in handles {
            pool.release(h);
        }
        assert_eq!(pool.available(), 16);
    }

    #[test]
    fn test_leaked_handle_starves_pool() {
        let mut pool = PathPool::new(2);
        let kept = pool.obtain().unwrap();
        let leaked = pool.obtain().unwrap();
        std::mem::forget(leaked);

        assert_eq!(
            pool.obtain().unwrap_err(),
            NavError::PoolExhausted { capacity: 2 }
        );
        pool.release(kept);
        assert!(pool.obtain().is_ok());
    }

    #[test]
    fn test_obtained_path_is_cleared() {
        let mut pool = PathPool::new(1);
        let h = pool.obtain().unwrap();
        assert!(pool.get_mut(&h).unwrap().append_vertex(Vec2::ONE));
        pool.release(h);

        let h = pool.obtain().unwrap();
        assert!(pool.get(&h).unwrap().is_empty());
        pool.release(h);
    }

    #[test]
    fn test_empty_pool() {
        let mut pool = PathPool::new(0);
        assert!(pool.obtain().is_err());
        assert_eq!(pool.capacity(), 0);
    }
}
