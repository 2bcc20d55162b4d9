//! Async objects
//!
//! An async object tracks one in-flight operation from the request that
//! started it to the moment its final status is known and delivered.
//!
//! ```text
//!   create ──► Unqueued ──queue──► Queued ──terminate──► Terminated ──► Destroyed
//!                  │                                    ▲      │
//!                  └────────────terminate───────────────┘      │
//!                                        set_result(PENDING) ◄─┘ (alerted only)
//! ```
//!
//! The only back edge is the restart of an alerted async, see
//! [`AsyncIo::set_result`].

use alloc::boxed::Box;
use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;
use core::fmt;

use ntio_api::error::{self, Result};
use ntio_api::{
    AsyncId, AsyncParams, ClientThread, CompletionBinding, CompletionFlags, DataSize, IoSource, ObjHandle, ProcessId,
    QueueId, Status, TimerKey, WaitEvent,
};

use crate::dispatch::RequestContext;
use crate::iosb::{Iosb, IosbRef, copy_payload};
use crate::subsystem::AsyncIo;

bitflags::bitflags! {
    /// Async object state flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AsyncFlags: u8 {
        /// Request accepted but still pending
        const PENDING = 0b0000_0001;
        /// Waiters on the async have been woken
        const SIGNALED = 0b0000_0010;
        /// Result goes back on the request path instead of through an APC
        const DIRECT_RESULT = 0b0000_0100;
        /// Source is ready but the client still has to perform the I/O
        const ALERTED = 0b0000_1000;
        /// Status is known and notification has been dispatched
        const TERMINATED = 0b0001_0000;
        /// Not even the initial synchronous/pending disposition is known
        const UNKNOWN_STATUS = 0b0010_0000;
    }
}

/// One-shot callback run when the final result is committed
pub type CompletionCallback = Box<dyn FnOnce(Status)>;

/// Link from an async to the source it was issued against.
///
/// The async holds the source while unqueued; once queued the queue is the
/// owning link and the async only keeps a weak back reference.
pub(crate) enum SourceLink {
    Detached,
    Owned(Arc<dyn IoSource>),
    Queued(Weak<dyn IoSource>),
}

impl SourceLink {
    pub(crate) fn get(&self) -> Option<Arc<dyn IoSource>> {
        match self {
            SourceLink::Detached => None,
            SourceLink::Owned(source) => Some(source.clone()),
            SourceLink::Queued(source) => source.upgrade(),
        }
    }

    pub(crate) fn is_attached(&self) -> bool {
        !matches!(self, SourceLink::Detached)
    }
}

pub(crate) struct AsyncObject {
    pub(crate) thread: Arc<dyn ClientThread>,
    pub(crate) process: ProcessId,
    pub(crate) queue: Option<QueueId>,
    pub(crate) source: SourceLink,
    pub(crate) timeout: Option<TimerKey>,
    pub(crate) timeout_status: Status,
    pub(crate) event: Option<Arc<dyn WaitEvent>>,
    pub(crate) params: AsyncParams,
    pub(crate) iosb: Option<IosbRef>,
    pub(crate) wait_handle: Option<ObjHandle>,
    pub(crate) flags: AsyncFlags,
    pub(crate) completion: Option<CompletionBinding>,
    pub(crate) comp_flags: CompletionFlags,
    pub(crate) completion_callback: Option<CompletionCallback>,
    pub(crate) holds: u32,
}

impl fmt::Debug for AsyncObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Async")
            .field("thread", &self.thread.id())
            .field("process", &self.process)
            .field("queue", &self.queue)
            .field("flags", &self.flags)
            .field("holds", &self.holds)
            .finish()
    }
}

/// Reply of [`AsyncIo::handoff`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handoff {
    /// Status to report for the request
    pub status: Status,
    /// Result size, once the outcome is final
    pub result: Option<DataSize>,
    /// Output buffer moved out of the IOSB
    pub data: Option<Vec<u8>>,
    /// Handle the client waits on, if it still needs one
    pub wait_handle: Option<ObjHandle>,
}

impl AsyncIo {
    /// Create an async for an operation issued by `thread` against `source`.
    ///
    /// Fails when the request names an event that does not resolve, or when
    /// the source is bound to a completion port and the request also names
    /// an APC routine; the two notification mechanisms exclude each other.
    /// The caller owns one hold on the returned async.
    pub fn create(
        &mut self,
        source: Arc<dyn IoSource>,
        thread: Arc<dyn ClientThread>,
        params: AsyncParams,
        iosb: Option<IosbRef>,
    ) -> Result<AsyncId> {
        let process = thread.process_id();

        let event = match params.event {
            Some(handle) => match self.objects.resolve_event(process, handle) {
                Some(event) => Some(event),
                None => {
                    self.count(|s| s.creation_failures += 1);
                    return Err(error::invalid_handle("event handle does not resolve"));
                }
            },
            None => None,
        };

        let completion = source.completion();
        if completion.is_some() && params.apc != 0 {
            aio_warn!("process {} asked for an APC on a file bound to a completion port", process);
            self.count(|s| s.creation_failures += 1);
            return Err(error::invalid_parameter("APC routine given for a file bound to a completion port"));
        }

        if let Some(event) = &event {
            event.reset();
        }

        let obj = AsyncObject {
            thread,
            process,
            queue: None,
            source: SourceLink::Owned(source),
            timeout: None,
            timeout_status: Status::TIMEOUT,
            event,
            params,
            iosb,
            wait_handle: None,
            flags: AsyncFlags::PENDING,
            completion,
            comp_flags: CompletionFlags::empty(),
            completion_callback: None,
            holds: 1,
        };
        let id = AsyncId::from_index(self.asyncs.insert(obj));
        self.registry.entry(process).or_default().insert(0, id);
        self.count(|s| s.created += 1);
        aio_debug!("created {} for process {}", id, process);
        Ok(id)
    }

    /// Create an async for the request currently being served.
    ///
    /// The IOSB is built from the request payload and reply capacity, and a
    /// wait handle is pre-allocated so a synchronous caller can wait without
    /// another round trip. The returned async must go through
    /// [`AsyncIo::handoff`].
    pub fn create_request(
        &mut self,
        ctx: &RequestContext,
        source: Arc<dyn IoSource>,
        comp_flags: CompletionFlags,
        params: AsyncParams,
    ) -> Result<AsyncId> {
        let iosb = Iosb::create(&ctx.data, ctx.reply_max_size, &self.config)?;
        let id = self.create(source, ctx.thread.clone(), params, Some(iosb))?;

        let process = ctx.thread.process_id();
        let Some(handle) = self.objects.alloc_wait_handle(process, id) else {
            self.release(id);
            return Err(error::out_of_memory());
        };

        let obj = self.obj_mut(id)?;
        obj.wait_handle = Some(handle);
        obj.holds += 1;
        obj.flags.remove(AsyncFlags::PENDING);
        obj.flags.insert(AsyncFlags::DIRECT_RESULT);
        obj.comp_flags = comp_flags;
        Ok(id)
    }

    /// Mark the async as still awaiting completion, optionally waking
    /// waiters so they re-check. No effect once terminated.
    pub fn set_pending(&mut self, id: AsyncId, signal: bool) -> Result<()> {
        let obj = self.obj_mut(id)?;
        if obj.flags.contains(AsyncFlags::TERMINATED) {
            return Ok(());
        }
        obj.flags.insert(AsyncFlags::PENDING);
        obj.flags.remove(AsyncFlags::UNKNOWN_STATUS);
        if signal && !obj.flags.contains(AsyncFlags::SIGNALED) {
            obj.flags.insert(AsyncFlags::SIGNALED);
            self.objects.wake_up(id);
        }
        Ok(())
    }

    /// Mark the initial status as unknown; no direct result until resolved
    pub fn set_unknown_status(&mut self, id: AsyncId) -> Result<()> {
        let obj = self.obj_mut(id)?;
        obj.flags.insert(AsyncFlags::UNKNOWN_STATUS);
        obj.flags.remove(AsyncFlags::DIRECT_RESULT);
        Ok(())
    }

    /// Register a one-shot callback run when the final result is committed
    pub fn set_completion_callback(&mut self, id: AsyncId, callback: CompletionCallback) -> Result<()> {
        self.obj_mut(id)?.completion_callback = Some(callback);
        Ok(())
    }

    /// The async's IOSB, if it has one
    pub fn iosb(&self, id: AsyncId) -> Result<Option<IosbRef>> {
        Ok(self.obj(id)?.iosb.clone())
    }

    /// The thread that issued the async
    pub fn thread(&self, id: AsyncId) -> Result<Arc<dyn ClientThread>> {
        Ok(self.obj(id)?.thread.clone())
    }

    pub fn flags(&self, id: AsyncId) -> Result<AsyncFlags> {
        Ok(self.obj(id)?.flags)
    }

    pub fn is_terminated(&self, id: AsyncId) -> bool {
        self.has_flags(id, AsyncFlags::TERMINATED)
    }

    /// Wait-subsystem query: whether waiters on the async are released
    pub fn is_signaled(&self, id: AsyncId) -> bool {
        self.has_flags(id, AsyncFlags::SIGNALED)
    }

    /// Hand the async's state back to the request that created it.
    ///
    /// `request_status` is the status the request handler arrived at:
    /// `PENDING` when the operation was left to complete later, an error when
    /// it failed in-band, or a final status already returned with the reply.
    pub fn handoff(&mut self, id: AsyncId, request_status: Status, force_blocking: bool) -> Result<Handoff> {
        self.pinned(id, |io| io.handoff_pinned(id, request_status, force_blocking))
    }

    fn handoff_pinned(&mut self, id: AsyncId, request_status: Status, force_blocking: bool) -> Result<Handoff> {
        let obj = self.obj(id)?;
        let iosb = obj
            .iosb
            .clone()
            .ok_or_else(|| error::invalid_state("handoff of an async without an I/O status block"))?;

        if obj.flags.contains(AsyncFlags::UNKNOWN_STATUS) {
            return Ok(Handoff {
                status: Status::PENDING,
                result: None,
                data: None,
                wait_handle: obj.wait_handle,
            });
        }

        if !obj.flags.contains(AsyncFlags::PENDING) && request_status.is_error() {
            self.close_wait_handle(id);
            return Ok(Handoff {
                status: request_status,
                result: None,
                data: None,
                wait_handle: None,
            });
        }

        let mut data = None;
        if !request_status.is_pending() {
            // status and data were already returned with the reply
            self.terminate(id, request_status)?;
        } else if !iosb.status().is_pending() {
            data = iosb.take_output(DataSize::MAX);
        }

        let status = iosb.status();
        let mut result = None;
        if !status.is_pending() {
            result = Some(iosb.result());
            self.obj_mut(id)?.flags.insert(AsyncFlags::SIGNALED);
        } else {
            let obj = self.obj_mut(id)?;
            obj.flags.remove(AsyncFlags::DIRECT_RESULT);
            obj.flags.insert(AsyncFlags::PENDING);
            let overlapped = obj.source.get().is_some_and(|source| source.is_overlapped());
            if !force_blocking && overlapped {
                self.close_wait_handle(id);
            }
        }

        let status = iosb.status();
        Ok(Handoff {
            status,
            result,
            data,
            wait_handle: self.obj(id)?.wait_handle,
        })
    }

    /// Terminate the async with `status`.
    ///
    /// Only the first call has an effect. The status lands in the IOSB only
    /// if nothing was committed there yet. Unless the result goes back on
    /// the request path, an async I/O APC is queued to the owning thread;
    /// it reports `ALERTED` whenever the client has to come back for a result
    /// size or output data.
    pub fn terminate(&mut self, id: AsyncId, status: Status) -> Result<()> {
        let obj = self.obj_mut(id)?;
        if obj.flags.contains(AsyncFlags::TERMINATED) {
            return Ok(());
        }

        obj.flags.insert(AsyncFlags::TERMINATED);
        if let Some(iosb) = &obj.iosb {
            iosb.commit_status(status);
        }
        if status == Status::ALERTED {
            obj.flags.insert(AsyncFlags::ALERTED);
        }
        let direct = obj.flags.contains(AsyncFlags::DIRECT_RESULT);
        self.count(|s| s.terminated += 1);
        aio_debug!("terminating {} with {:?}", id, status);

        // a rejected APC completes the async right away, which may drop the
        // last reference to it
        self.pinned(id, |io| {
            if !direct {
                io.notify_thread(id, status);
            }
            io.reselect(id);
        });
        Ok(())
    }

    /// Wait-subsystem callback for a satisfied wait on the async's handle.
    /// Returns the status the waiter wakes up with.
    pub fn satisfied(&mut self, id: AsyncId) -> Result<Status> {
        self.pinned(id, |io| {
            let obj = io.obj(id)?;
            let iosb = obj
                .iosb
                .clone()
                .ok_or_else(|| error::invalid_state("wait on an async without an I/O status block"))?;

            if obj.flags.contains(AsyncFlags::DIRECT_RESULT) {
                io.set_result(id, iosb.status(), iosb.result() as u64)?;
                io.obj_mut(id)?.flags.remove(AsyncFlags::DIRECT_RESULT);
            }

            // closing here saves the client a round trip
            io.close_wait_handle(id);
            Ok(iosb.status())
        })
    }

    /// Complete a request-based async with an already owned output buffer.
    /// An async that was cancelled in the meantime keeps its status and the
    /// buffer is dropped.
    pub fn request_complete(
        &mut self,
        id: AsyncId,
        status: Status,
        result: DataSize,
        out_data: Option<Vec<u8>>,
    ) -> Result<()> {
        let iosb = self
            .obj(id)?
            .iosb
            .clone()
            .ok_or_else(|| error::invalid_state("request completion of an async without an I/O status block"))?;

        if !iosb.complete(status, result, out_data) {
            aio_trace!("{} already completed, dropping late result", id);
            return Ok(());
        }
        self.terminate(id, status)
    }

    /// Complete a request-based async, copying `out_data`. When the copy
    /// cannot be allocated the async terminates with `NO_MEMORY`.
    pub fn request_complete_alloc(&mut self, id: AsyncId, status: Status, result: DataSize, out_data: &[u8]) -> Result<()> {
        if out_data.is_empty() {
            return self.request_complete(id, status, result, None);
        }
        match copy_payload(out_data, self.config.max_output_size) {
            Ok(copy) => self.request_complete(id, status, result, Some(copy)),
            Err(_) => self.terminate(id, Status::NO_MEMORY),
        }
    }

    /// The wait handle was closed by the client
    pub fn wait_handle_closed(&mut self, id: AsyncId) {
        let had_handle = self.obj_mut(id).is_ok_and(|obj| obj.wait_handle.take().is_some());
        if had_handle {
            self.release(id);
        }
    }

    /// Closes the pre-allocated wait handle and drops its hold
    pub(crate) fn close_wait_handle(&mut self, id: AsyncId) {
        let Ok(obj) = self.obj_mut(id) else {
            return;
        };
        let Some(handle) = obj.wait_handle.take() else {
            return;
        };
        let process = obj.process;
        self.objects.close_handle(process, handle);
        self.release(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_are_distinct() {
        let all = [
            AsyncFlags::PENDING,
            AsyncFlags::SIGNALED,
            AsyncFlags::DIRECT_RESULT,
            AsyncFlags::ALERTED,
            AsyncFlags::TERMINATED,
            AsyncFlags::UNKNOWN_STATUS,
        ];
        let mut seen = AsyncFlags::empty();
        for flag in all {
            assert!(!seen.intersects(flag));
            seen |= flag;
        }
        assert_eq!(seen, AsyncFlags::all());
    }

    #[test]
    fn test_detached_link() {
        let link = SourceLink::Detached;
        assert!(!link.is_attached());
        assert!(link.get().is_none());
    }
}
