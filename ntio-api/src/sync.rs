//! Synchronization primitives
//!
//! The subsystem runs on a single cooperative thread; these locks only guard
//! data that is shared by reference count, never held across a callback.

pub use spin::Mutex;
pub use spin::MutexGuard;
