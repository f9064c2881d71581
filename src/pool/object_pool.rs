//! Object pool with scope-bound slot return.

use super::memory_pool::{MemoryPool, SlotIndex};
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};

/// Pool of reusable objects whose handles return their slot on drop.
///
/// `acquire` pops a free slot and moves the supplied value in; the
/// returned [`Pooled`] guard owns the slot for its lifetime and pushes it
/// back when dropped. Because the guard borrows the pool, handles cannot
/// outlive it, and because [`SlotIndex`] is linear a slot cannot be
/// returned twice.
pub struct ObjectPool<T, const N: usize> {
    inner: MemoryPool<T, N>,
}

impl<T, const N: usize> ObjectPool<T, N> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: MemoryPool::new(),
        }
    }

    /// Move `value` into a pooled slot, or hand it back when the pool is
    /// exhausted so the caller can shed or retry.
    pub fn acquire(&self, value: T) -> Result<Pooled<'_, T, N>, T> {
        match self.inner.insert(value) {
            Ok(slot) => Ok(Pooled {
                pool: &self.inner,
                slot: ManuallyDrop::new(slot),
            }),
            Err(value) => Err(value),
        }
    }

    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Handles currently live. Approximate under concurrency.
    #[inline]
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.inner.outstanding()
    }
}

impl<T, const N: usize> Default for ObjectPool<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Owning handle to a pooled object. Dereferences to `T`; returns the slot
/// to the pool when dropped.
pub struct Pooled<'a, T, const N: usize> {
    pool: &'a MemoryPool<T, N>,
    slot: ManuallyDrop<SlotIndex>,
}

impl<T, const N: usize> Pooled<'_, T, N> {
    /// Detach the value from the pool, releasing the slot immediately.
    #[must_use]
    pub fn into_inner(mut self) -> T {
        // Slot ownership moves out; skip the drop-time return.
        let slot = unsafe { ManuallyDrop::take(&mut self.slot) };
        let value = self.pool.take(slot);
        std::mem::forget(self);
        value
    }
}

impl<T, const N: usize> Deref for Pooled<'_, T, N> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.pool.get(&self.slot)
    }
}

impl<T, const N: usize> DerefMut for Pooled<'_, T, N> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        self.pool.get_mut(&mut self.slot)
    }
}

impl<T, const N: usize> Drop for Pooled<'_, T, N> {
    fn drop(&mut self) {
        let slot = unsafe { ManuallyDrop::take(&mut self.slot) };
        drop(self.pool.take(slot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_slot_on_scope_exit() {
        let pool: ObjectPool<u32, 1> = ObjectPool::new();
        {
            let guard = pool.acquire(41).unwrap();
            assert_eq!(*guard, 41);
            assert_eq!(pool.outstanding(), 1);
            assert!(pool.acquire(99).is_err());
        }
        assert_eq!(pool.outstanding(), 0);
        let again = pool.acquire(42).unwrap();
        assert_eq!(*again, 42);
    }

    #[test]
    fn deref_mut_updates_value() {
        let pool: ObjectPool<Vec<u8>, 2> = ObjectPool::new();
        let mut guard = pool.acquire(vec![1, 2]).unwrap();
        guard.push(3);
        assert_eq!(&*guard, &[1, 2, 3]);
    }

    #[test]
    fn into_inner_releases_slot() {
        let pool: ObjectPool<String, 1> = ObjectPool::new();
        let guard = pool.acquire(String::from("x")).unwrap();
        let value = guard.into_inner();
        assert_eq!(value, "x");
        assert_eq!(pool.outstanding(), 0);
        assert!(pool.acquire(String::from("y")).is_ok());
    }

    #[test]
    fn exhaustion_hands_value_back() {
        let pool: ObjectPool<String, 1> = ObjectPool::new();
        let _held = pool.acquire(String::from("held")).unwrap();
        match pool.acquire(String::from("spill")) {
            Err(v) => assert_eq!(v, "spill"),
            Ok(_) => panic!("pool should be exhausted"),
        }
    }
}
