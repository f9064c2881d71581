//! Fixed-capacity allocators that keep the hot path free of heap traffic.
//!
//! Three primitives with complementary roles:
//!
//! - [`MemoryPool`]: a slot arena served by a lock-free MPMC free list.
//!   Any thread may recycle a slot concurrently with allocations.
//! - [`ObjectPool`]: wraps a [`MemoryPool`] and hands out [`Pooled`]
//!   handles that return their slot on scope exit, so a slot can never be
//!   returned twice or leaked while the handle lives.
//! - [`BumpArena`]: a fixed byte buffer with a single atomic head for
//!   frame-scoped scratch allocations.
//!
//! All three are bounded: exhaustion is reported as `None`, never by
//! blocking or falling back to the heap.

mod bump;
mod memory_pool;
mod object_pool;

pub use bump::BumpArena;
pub use memory_pool::{MemoryPool, SlotIndex};
pub use object_pool::{ObjectPool, Pooled};
