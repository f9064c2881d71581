//! Single-producer single-consumer ring queue.

use crossbeam::utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, Ordering};

struct Slot<T> {
    /// Publication counter. `pos + 1` after the producer writes lap `pos`,
    /// `pos + C` once the consumer has drained it.
    sequence: CachePadded<AtomicU64>,
    value: UnsafeCell<MaybeUninit<T>>,
}

/// Bounded wait-free SPSC queue of capacity `C` (a power of two).
///
/// Exactly one thread may push and exactly one thread may pop; the slot
/// sequence counters carry the release/acquire edge between them:
///
/// - producer: acquire-read the slot sequence, write the payload,
///   release-store `pos + 1`, relaxed-advance the tail;
/// - consumer: acquire-read the slot sequence, read the payload,
///   release-store `pos + C`, relaxed-advance the head.
///
/// `try_push` on a full queue and `try_pop` on an empty queue return
/// immediately: no retries, no blocking, no allocation.
pub struct SpscQueue<T, const C: usize> {
    slots: Box<[Slot<T>]>,
    tail: CachePadded<AtomicU64>,
    head: CachePadded<AtomicU64>,
}

unsafe impl<T: Send, const C: usize> Send for SpscQueue<T, C> {}
unsafe impl<T: Send, const C: usize> Sync for SpscQueue<T, C> {}

impl<T, const C: usize> SpscQueue<T, C> {
    #[must_use]
    pub fn new() -> Self {
        assert!(C.is_power_of_two(), "queue capacity must be a power of two");

        let slots: Box<[Slot<T>]> = (0..C)
            .map(|i| Slot {
                sequence: CachePadded::new(AtomicU64::new(i as u64)),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect();

        Self {
            slots,
            tail: CachePadded::new(AtomicU64::new(0)),
            head: CachePadded::new(AtomicU64::new(0)),
        }
    }

    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        C
    }

    /// Enqueue `value`; hands it back when the queue is full.
    ///
    /// Must only be called from the producer thread.
    pub fn try_push(&self, value: T) -> Result<(), T> {
        let tail = self.tail.load(Ordering::Relaxed);
        let slot = &self.slots[(tail as usize) & (C - 1)];

        if slot.sequence.load(Ordering::Acquire) != tail {
            // Consumer has not drained this lap yet.
            return Err(value);
        }

        unsafe {
            (*slot.value.get()).write(value);
        }
        slot.sequence.store(tail + 1, Ordering::Release);
        self.tail.store(tail + 1, Ordering::Relaxed);
        Ok(())
    }

    /// Dequeue the oldest value, `None` when empty.
    ///
    /// Must only be called from the consumer thread.
    pub fn try_pop(&self) -> Option<T> {
        let head = self.head.load(Ordering::Relaxed);
        let slot = &self.slots[(head as usize) & (C - 1)];

        if slot.sequence.load(Ordering::Acquire) != head + 1 {
            return None;
        }

        let value = unsafe { (*slot.value.get()).assume_init_read() };
        slot.sequence.store(head + C as u64, Ordering::Release);
        self.head.store(head + 1, Ordering::Relaxed);
        Some(value)
    }

    /// Whether the queue looked empty at the moment of the call.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Approximate occupancy: the producer and consumer cursors are read
    /// independently, so the result may lag either side by one.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        tail.saturating_sub(head) as usize
    }
}

impl<T, const C: usize> Default for SpscQueue<T, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const C: usize> Drop for SpscQueue<T, C> {
    fn drop(&mut self) {
        while self.try_pop().is_some() {}
    }
}
