//! Multi-producer multi-consumer ring queue.

use crossbeam::utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, Ordering};

struct Cell<T> {
    sequence: CachePadded<AtomicU64>,
    value: UnsafeCell<MaybeUninit<T>>,
}

/// Bounded lock-free MPMC queue (power-of-two capacity).
///
/// Each cell carries a sequence counter. A producer claims a position by
/// CAS on the tail cursor and publishes by storing `pos + 1` into the
/// cell; a consumer claims by CAS on the head cursor and releases the cell
/// for the next lap by storing `pos + capacity`.
///
/// When a cursor read turns out stale because another thread won the
/// position, the operation reloads the cursor and retries; a genuinely
/// full or empty queue returns immediately. The retry loop is bounded by
/// contention, not by queue state, so no call ever blocks.
pub struct MpmcQueue<T> {
    cells: Box<[Cell<T>]>,
    mask: u64,
    tail: CachePadded<AtomicU64>,
    head: CachePadded<AtomicU64>,
}

unsafe impl<T: Send> Send for MpmcQueue<T> {}
unsafe impl<T: Send> Sync for MpmcQueue<T> {}

impl<T> MpmcQueue<T> {
    /// Build a queue with `capacity` cells; `capacity` must be a power of
    /// two.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(
            capacity.is_power_of_two(),
            "queue capacity must be a power of two"
        );

        let cells: Box<[Cell<T>]> = (0..capacity)
            .map(|i| Cell {
                sequence: CachePadded::new(AtomicU64::new(i as u64)),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect();

        Self {
            cells,
            mask: (capacity - 1) as u64,
            tail: CachePadded::new(AtomicU64::new(0)),
            head: CachePadded::new(AtomicU64::new(0)),
        }
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// Enqueue `value`; hands it back when the queue is full.
    pub fn try_push(&self, value: T) -> Result<(), T> {
        let mut pos = self.tail.load(Ordering::Relaxed);
        loop {
            let cell = &self.cells[(pos & self.mask) as usize];
            let seq = cell.sequence.load(Ordering::Acquire);

            if seq == pos {
                // Cell free this lap; claim the position.
                match self.tail.compare_exchange_weak(
                    pos,
                    pos + 1,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        unsafe {
                            (*cell.value.get()).write(value);
                        }
                        cell.sequence.store(pos + 1, Ordering::Release);
                        return Ok(());
                    }
                    Err(observed) => pos = observed,
                }
            } else if seq < pos {
                // The cell still holds last lap's value: genuinely full.
                return Err(value);
            } else {
                // Another producer claimed this position; reload.
                pos = self.tail.load(Ordering::Relaxed);
            }
        }
    }

    /// Dequeue the oldest value, `None` when empty.
    pub fn try_pop(&self) -> Option<T> {
        let mut pos = self.head.load(Ordering::Relaxed);
        loop {
            let cell = &self.cells[(pos & self.mask) as usize];
            let seq = cell.sequence.load(Ordering::Acquire);
            let expected = pos + 1;

            if seq == expected {
                match self.head.compare_exchange_weak(
                    pos,
                    pos + 1,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        let value = unsafe { (*cell.value.get()).assume_init_read() };
                        cell.sequence
                            .store(pos + self.cells.len() as u64, Ordering::Release);
                        return Some(value);
                    }
                    Err(observed) => pos = observed,
                }
            } else if seq < expected {
                // Producer has not published this position: genuinely empty.
                return None;
            } else {
                // Another consumer claimed this position; reload.
                pos = self.head.load(Ordering::Relaxed);
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Approximate occupancy under concurrent access.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        tail.saturating_sub(head) as usize
    }
}

impl<T> Drop for MpmcQueue<T> {
    fn drop(&mut self) {
        while self.try_pop().is_some() {}
    }
}
