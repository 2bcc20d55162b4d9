//! Collaborator interfaces
//!
//! The async subsystem does not own file descriptors, threads, handles or
//! timers. The embedding server implements these traits and hands trait
//! objects to the subsystem.
//!
//! Implementations must not call back into the subsystem from inside these
//! methods. Anything that would re-enter it is reported through the return
//! value instead (see [`ApcDelivery::Rejected`] and
//! [`IoSource::cancel_async`]).

use alloc::sync::Arc;

use crate::apc::{ApcCall, ApcDelivery};
use crate::core::status::Status;
use crate::core::types::{ApcParam, AsyncId, ObjHandle, ObjectId, ProcessId, QueueId, ThreadId, Timeout, TimerKey};

/// A completion port binding: the port and the key asyncs post with.
#[derive(Clone)]
pub struct CompletionBinding {
    pub port: Arc<dyn CompletionPort>,
    pub key: ApcParam,
}

impl core::fmt::Debug for CompletionBinding {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CompletionBinding").field("key", &self.key).finish()
    }
}

/// Trait for I/O completion ports
pub trait CompletionPort {
    /// Posts a completion entry
    fn add_completion(&self, key: ApcParam, value: ApcParam, status: Status, information: ApcParam);
}

/// Trait for file-like objects that asyncs are issued against
pub trait IoSource {
    /// The kernel object the client refers to when cancelling
    fn user_object(&self) -> ObjectId;

    /// Completion port currently associated with the object
    fn completion(&self) -> Option<CompletionBinding>;

    /// Whether the object was opened for overlapped I/O
    fn is_overlapped(&self) -> bool;

    /// Sets the signaled state seen by waiters on the object itself
    fn set_signaled(&self, signaled: bool);

    /// Re-evaluates readiness for `queue`; `waiting` tells whether the head of
    /// the queue still waits for the object.
    fn reselect_async(&self, queue: QueueId, waiting: bool);

    /// Decides how a cancelled async terminates
    fn cancel_async(&self, _async_id: AsyncId) -> Status {
        Status::CANCELLED
    }
}

/// Trait for client threads
pub trait ClientThread {
    fn id(&self) -> ThreadId;

    fn process_id(&self) -> ProcessId;

    /// Queues a callback to the thread. When `owner` is set, the thread
    /// reports the call's result back for that async once it has run.
    fn queue_apc(&self, owner: Option<AsyncId>, call: ApcCall) -> ApcDelivery;
}

/// Trait for event objects
pub trait WaitEvent {
    fn set(&self);

    fn reset(&self);
}

/// Trait for the kernel object layer
pub trait ObjectManager {
    /// Resolves an event handle with modify access
    fn resolve_event(&self, process: ProcessId, handle: ObjHandle) -> Option<Arc<dyn WaitEvent>>;

    /// Resolves any handle to the identity of its object
    fn resolve_object(&self, process: ProcessId, handle: ObjHandle) -> Option<ObjectId>;

    /// Allocates a synchronize-access handle referring to the async
    fn alloc_wait_handle(&self, process: ProcessId, async_id: AsyncId) -> Option<ObjHandle>;

    /// Closes a handle in the process's table
    fn close_handle(&self, process: ProcessId, handle: ObjHandle);

    /// Wakes threads waiting on the async object
    fn wake_up(&self, async_id: AsyncId);
}

/// Trait for the timer scheduler
pub trait TimerService {
    /// Registers a timeout for `target`; the scheduler reports expiry back
    /// together with the returned key.
    fn add_timeout(&self, when: Timeout, target: AsyncId) -> TimerKey;

    /// Cancels a registration
    fn remove_timeout(&self, key: TimerKey);
}
