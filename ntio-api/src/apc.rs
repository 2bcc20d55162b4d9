//! Client-directed callback descriptors

use crate::core::status::Status;
use crate::core::types::{ApcParam, ClientPtr};

/// A callback queued to a client thread and run in its own context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApcCall {
    /// Async I/O notification. The client finishes the I/O (or fetches the
    /// result when `status` is `ALERTED`) and reports the final status back.
    AsyncIo {
        user: ClientPtr,
        sb: ClientPtr,
        status: Status,
    },
    /// User APC routine with its three arguments.
    User {
        func: ClientPtr,
        args: [ApcParam; 3],
    },
}

impl ApcCall {
    /// Status carried by an async I/O notification.
    pub fn async_status(&self) -> Option<Status> {
        match self {
            ApcCall::AsyncIo { status, .. } => Some(*status),
            ApcCall::User { .. } => None,
        }
    }
}

/// Outcome of queuing an APC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApcDelivery {
    /// The thread accepted the call and will report a result later.
    Queued,
    /// The call was dropped, e.g. the thread is terminating.
    Rejected,
}
