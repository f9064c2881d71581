//! Slot arena with a lock-free MPMC free list.

use crossbeam::utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};

/// Sentinel index terminating the free list.
const NIL: u32 = u32::MAX;

/// Opaque handle to an occupied pool slot.
///
/// A `SlotIndex` is only ever produced by [`MemoryPool::insert`] and is
/// consumed by [`MemoryPool::take`], so a slot cannot be released twice
/// through the same handle.
#[derive(Debug, PartialEq, Eq)]
pub struct SlotIndex(u32);

impl SlotIndex {
    /// Raw slot number, `< N` for the owning pool.
    #[inline]
    #[must_use]
    pub const fn raw(&self) -> u32 {
        self.0
    }
}

struct Slot<T> {
    value: UnsafeCell<MaybeUninit<T>>,
    /// Next free slot while on the free list; unused while occupied.
    next: AtomicU32,
}

/// A fixed arena of `N` slots of `T`, allocated once at construction.
///
/// The free list is a Treiber stack over slot indices. The list head packs
/// a 32-bit generation tag next to the index so a concurrent pop/push pair
/// cannot ABA the head. Both `insert` and `take` are lock-free: a CAS
/// retry loop with no blocking and no heap traffic.
///
/// `take`/`get`/`get_mut` trust their `SlotIndex`, which cannot be forged
/// or duplicated outside this module; indices from a *different* pool
/// instance are the one remaining misuse and are caught by a debug
/// assertion on the slot bound.
pub struct MemoryPool<T, const N: usize> {
    slots: Box<[Slot<T>]>,
    /// Packed (tag << 32 | index) free-list head.
    free_head: CachePadded<AtomicU64>,
    outstanding: AtomicUsize,
}

// The pool hands values across threads when producers and consumers
// recycle concurrently, hence the Send bound on T.
unsafe impl<T: Send, const N: usize> Send for MemoryPool<T, N> {}
unsafe impl<T: Send, const N: usize> Sync for MemoryPool<T, N> {}

impl<T, const N: usize> MemoryPool<T, N> {
    /// Build a pool with all `N` slots free.
    #[must_use]
    pub fn new() -> Self {
        assert!(N > 0, "pool capacity must be non-zero");
        assert!(N < NIL as usize, "pool capacity exceeds index space");

        let slots: Box<[Slot<T>]> = (0..N)
            .map(|i| Slot {
                value: UnsafeCell::new(MaybeUninit::uninit()),
                next: AtomicU32::new(if i + 1 < N { (i + 1) as u32 } else { NIL }),
            })
            .collect();

        Self {
            slots,
            free_head: CachePadded::new(AtomicU64::new(pack(0, 0))),
            outstanding: AtomicUsize::new(0),
        }
    }

    /// Total slot count.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Slots currently handed out. Approximate under concurrency.
    #[inline]
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Relaxed)
    }

    /// Move `value` into a free slot.
    ///
    /// When every slot is outstanding the value is handed back unchanged
    /// so the caller decides how to shed load.
    pub fn insert(&self, value: T) -> Result<SlotIndex, T> {
        let Some(idx) = self.pop_free() else {
            return Err(value);
        };
        // Exclusive: the slot was just popped, no other thread holds it.
        unsafe {
            (*self.slots[idx as usize].value.get()).write(value);
        }
        self.outstanding.fetch_add(1, Ordering::Relaxed);
        Ok(SlotIndex(idx))
    }

    /// Move the value out of `slot` and return the slot to the free list.
    pub fn take(&self, slot: SlotIndex) -> T {
        let idx = slot.0;
        debug_assert!((idx as usize) < N);
        // The handle is consumed, so this read is the slot's last use
        // before it re-enters the free list.
        let value = unsafe { (*self.slots[idx as usize].value.get()).assume_init_read() };
        self.push_free(idx);
        self.outstanding.fetch_sub(1, Ordering::Relaxed);
        value
    }

    /// Shared access to the value in `slot`.
    #[inline]
    #[must_use]
    pub fn get(&self, slot: &SlotIndex) -> &T {
        debug_assert!((slot.0 as usize) < N);
        unsafe { (*self.slots[slot.0 as usize].value.get()).assume_init_ref() }
    }

    /// Exclusive access to the value in `slot`.
    #[inline]
    #[must_use]
    pub fn get_mut(&self, slot: &mut SlotIndex) -> &mut T {
        debug_assert!((slot.0 as usize) < N);
        // &mut SlotIndex gives unique access to the slot's value: the
        // index is linear and this borrow pins it.
        unsafe { (*self.slots[slot.0 as usize].value.get()).assume_init_mut() }
    }

    fn pop_free(&self) -> Option<u32> {
        let mut head = self.free_head.load(Ordering::Acquire);
        loop {
            let (tag, idx) = unpack(head);
            if idx == NIL {
                return None;
            }
            let next = self.slots[idx as usize].next.load(Ordering::Relaxed);
            match self.free_head.compare_exchange_weak(
                head,
                pack(tag.wrapping_add(1), next),
                Ordering::Acquire,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(idx),
                Err(observed) => head = observed,
            }
        }
    }

    fn push_free(&self, idx: u32) {
        let mut head = self.free_head.load(Ordering::Relaxed);
        loop {
            let (tag, old_idx) = unpack(head);
            self.slots[idx as usize].next.store(old_idx, Ordering::Relaxed);
            // Release on success publishes the link store above; failure
            // reloads with relaxed ordering and retries.
            match self.free_head.compare_exchange_weak(
                head,
                pack(tag.wrapping_add(1), idx),
                Ordering::Release,
                Ordering::Relaxed,
            ) {
                Ok(_) => return,
                Err(observed) => head = observed,
            }
        }
    }
}

impl<T, const N: usize> Default for MemoryPool<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Drop for MemoryPool<T, N> {
    fn drop(&mut self) {
        // Values still outstanding at drop were leaked by index loss;
        // walking the free list tells us which slots are NOT occupied.
        let mut free_flags = vec![false; N];
        let (_, mut idx) = unpack(*self.free_head.get_mut());
        while idx != NIL {
            free_flags[idx as usize] = true;
            idx = *self.slots[idx as usize].next.get_mut();
        }

        for (i, is_free) in free_flags.iter().enumerate() {
            if !is_free {
                unsafe {
                    (*self.slots[i].value.get()).assume_init_drop();
                }
            }
        }
    }
}

#[inline]
const fn pack(tag: u32, idx: u32) -> u64 {
    ((tag as u64) << 32) | idx as u64
}

#[inline]
const fn unpack(word: u64) -> (u32, u32) {
    ((word >> 32) as u32, word as u32)
}
