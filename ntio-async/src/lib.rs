//! ntio Async
//!
//! Server-side tracking of NT-style asynchronous I/O. The crate decides when
//! an in-flight operation completes and how the client learns about it:
//! directly on the synchronous request path, through an APC queued to the
//! issuing thread, or through a completion port.
//!
//! # Architecture
//!
//! - **Iosb**: shared, write-once record of an operation's outcome
//! - **Object**: the async object state machine (create, handoff, terminate)
//! - **Queue**: per-source FIFO queues of asyncs waiting for readiness
//! - **Completion**: final result delivery (APC, completion port, events)
//! - **Cancel**: cancellation scans and timeouts
//! - **Dispatch**: request handler trait and dispatcher
//! - **Handlers**: the `cancel_async` and `get_async_result` requests
//!
//! # Usage
//!
//! ```rust,ignore
//! use ntio_async::{AsyncIo, AsyncIoConfig};
//!
//! let mut io = AsyncIo::new(AsyncIoConfig::default(), objects, timers);
//! let queue = io.create_queue(&source);
//! let id = io.create_request(&ctx, source.clone(), CompletionFlags::empty(), params)?;
//! io.queue(queue, id)?;
//! let reply = io.handoff(id, Status::PENDING, false)?;
//! io.release(id);
//!
//! // later, when the source becomes ready
//! io.wake_up(queue, Status::ALERTED);
//! ```

#![no_std]

extern crate alloc;

#[macro_use]
pub mod logging;

pub mod config;
pub mod stats;
pub mod iosb;
pub mod object;
pub mod queue;
pub mod completion;
pub mod cancel;
pub mod subsystem;
pub mod dispatch;
pub mod handlers;
pub mod types;

// Re-export commonly used items
pub use config::AsyncIoConfig;
pub use stats::AsyncStats;
pub use iosb::{Iosb, IosbRef};
pub use object::{AsyncFlags, CompletionCallback, Handoff};
pub use subsystem::AsyncIo;
pub use dispatch::{RequestContext, RequestDispatcher, RequestHandler, Reply, DispatchStats};
pub use handlers::{AsyncResult, CancelAsyncHandler, CancelAsyncRequest, GetAsyncResultHandler, register_handlers};
pub use types::*;
