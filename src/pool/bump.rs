//! Frame-scoped bump allocator over a fixed byte buffer.

use crossbeam::utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Bump allocator over `S` bytes with a single atomic head.
///
/// `alloc_uninit` aligns the head up for `T`, advances it by
/// `n * size_of::<T>()`, and hands back the claimed region. When the head
/// reaches the end of the buffer the allocation wraps to offset zero, but
/// only once the tail has been advanced past the wrapped region; until
/// then exhaustion reports `None`.
///
/// The tail only moves through [`BumpArena::advance_tail`], whose caller
/// asserts the released bytes are dead, or through [`BumpArena::reset`],
/// which requires exclusive access and therefore proves no allocation is
/// still borrowed.
pub struct BumpArena<const S: usize> {
    buf: UnsafeCell<[MaybeUninit<u8>; S]>,
    head: CachePadded<AtomicUsize>,
    tail: CachePadded<AtomicUsize>,
}

unsafe impl<const S: usize> Send for BumpArena<S> {}
unsafe impl<const S: usize> Sync for BumpArena<S> {}

impl<const S: usize> BumpArena<S> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: UnsafeCell::new([MaybeUninit::uninit(); S]),
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    /// Buffer size in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        S
    }

    /// Bytes consumed since the last wrap or reset.
    #[inline]
    #[must_use]
    pub fn used(&self) -> usize {
        self.head.load(Ordering::Relaxed)
    }

    /// Claim scratch space for `n` values of `T`.
    ///
    /// Returns `None` when the remaining buffer cannot hold the aligned
    /// region and the wrapped region at offset zero is still protected by
    /// the tail.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_uninit<T>(&self, n: usize) -> Option<&mut [MaybeUninit<T>]> {
        let bytes = n.checked_mul(std::mem::size_of::<T>())?;
        if bytes == 0 {
            return Some(&mut []);
        }
        let align = std::mem::align_of::<T>();

        let mut head = self.head.load(Ordering::Relaxed);
        loop {
            let aligned = align_up(head, align)?;
            let offset = if aligned.checked_add(bytes)? <= S {
                aligned
            } else {
                // Wrap to zero only when the tail has moved past the
                // region the wrapped allocation would claim.
                let tail = self.tail.load(Ordering::Acquire);
                if bytes <= S && tail >= bytes && head >= tail {
                    0
                } else {
                    return None;
                }
            };

            match self.head.compare_exchange_weak(
                head,
                offset + bytes,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    // The CAS gives this thread exclusive ownership of
                    // [offset, offset + bytes).
                    let base = self.buf.get() as *mut MaybeUninit<u8>;
                    let ptr = unsafe { base.add(offset) } as *mut MaybeUninit<T>;
                    return Some(unsafe { std::slice::from_raw_parts_mut(ptr, n) });
                }
                Err(observed) => head = observed,
            }
        }
    }

    /// Declare `bytes` more of the oldest region dead, allowing future
    /// wraps over it.
    ///
    /// # Safety
    /// No reference obtained from `alloc_uninit` may still point into the
    /// released region.
    pub unsafe fn advance_tail(&self, bytes: usize) {
        self.tail.fetch_add(bytes, Ordering::Release);
    }

    /// Zero the head and tail, recycling the whole buffer.
    ///
    /// Takes `&mut self`: outstanding allocations borrow the arena, so
    /// exclusive access proves there are none.
    pub fn reset(&mut self) {
        *self.head.get_mut() = 0;
        *self.tail.get_mut() = 0;
    }
}

impl<const S: usize> Default for BumpArena<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn align_up(offset: usize, align: usize) -> Option<usize> {
    offset.checked_add(align - 1).map(|v| v & !(align - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_until_exhausted() {
        let arena: BumpArena<64> = BumpArena::new();
        let a = arena.alloc_uninit::<u64>(4).expect("first region");
        assert_eq!(a.len(), 4);
        let b = arena.alloc_uninit::<u64>(4).expect("second region");
        assert_eq!(b.len(), 4);
        assert!(arena.alloc_uninit::<u64>(1).is_none());
    }

    #[test]
    fn respects_alignment() {
        let arena: BumpArena<64> = BumpArena::new();
        let _byte = arena.alloc_uninit::<u8>(1).unwrap();
        let words = arena.alloc_uninit::<u64>(1).unwrap();
        assert_eq!(words.as_ptr() as usize % std::mem::align_of::<u64>(), 0);
    }

    #[test]
    fn reset_recycles_buffer() {
        let mut arena: BumpArena<32> = BumpArena::new();
        assert!(arena.alloc_uninit::<u64>(4).is_some());
        assert!(arena.alloc_uninit::<u64>(1).is_none());
        arena.reset();
        assert!(arena.alloc_uninit::<u64>(4).is_some());
    }

    #[test]
    fn wraps_once_tail_advances() {
        let arena: BumpArena<32> = BumpArena::new();
        assert!(arena.alloc_uninit::<u64>(3).is_some());
        // 8 bytes left at the end; a 16-byte region cannot wrap yet.
        assert!(arena.alloc_uninit::<u64>(2).is_none());
        unsafe { arena.advance_tail(16) };
        let wrapped = arena.alloc_uninit::<u64>(2).expect("wrapped region");
        assert_eq!(wrapped.len(), 2);
    }

    #[test]
    fn writes_are_usable() {
        let arena: BumpArena<128> = BumpArena::new();
        let region = arena.alloc_uninit::<u32>(4).unwrap();
        for (i, slot) in region.iter_mut().enumerate() {
            slot.write(i as u32 * 10);
        }
        let values: Vec<u32> = region.iter().map(|s| unsafe { s.assume_init() }).collect();
        assert_eq!(values, [0, 10, 20, 30]);
    }
}
