//! Blocking synchronization primitives built on top of
//! [`crate::process::scheduler`]'s `block`/`unblock` (`spec.md` §4.2).
//!
//! The teacher splits its own sleeping primitives the same way
//! (`sync::mutex`, a separate `sync::wait_queue` for the FIFO list); none of
//! them carry data, unlike [`crate::process::scheduler::WaitQueue`] here,
//! which is exactly the teacher's `wait_queue` role reused across all four
//! primitives below instead of being duplicated per primitive.

pub mod barrier;
pub mod condvar;
pub mod lock;
pub mod semaphore;
