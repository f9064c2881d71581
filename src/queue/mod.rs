//! Bounded lock-free queues connecting the feed, strategy, and order
//! threads.
//!
//! Both queues are sequence-numbered rings with power-of-two capacity.
//! Head, tail, and every slot are padded to cache-line granularity so
//! producer and consumer never false-share. A successful push
//! happens-before the pop that observes it, through the release/acquire
//! pair on the slot's sequence counter. Neither queue blocks, retries
//! internally on genuine full/empty, or allocates after construction;
//! backpressure is the caller's problem.

mod mpmc;
mod spsc;

pub use mpmc::MpmcQueue;
pub use spsc::SpscQueue;
