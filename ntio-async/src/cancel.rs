//! Cancellation and timeouts

use ntio_api::error::Result;
use ntio_api::{AsyncId, ClientPtr, ObjectId, ProcessId, Status, ThreadId, Timeout, TimerKey};

use crate::object::AsyncFlags;
use crate::subsystem::AsyncIo;

impl AsyncIo {
    /// Cancel the asyncs of `process` matching every given filter: the object
    /// they were issued against, the issuing thread and the client IOSB
    /// address. Returns the number of asyncs cancelled.
    pub fn cancel(
        &mut self,
        process: ProcessId,
        object: Option<ObjectId>,
        thread: Option<ThreadId>,
        iosb: Option<ClientPtr>,
    ) -> usize {
        let mut woken = 0;
        // terminating one async can complete or destroy others, so the
        // registry is scanned again from the start after every match
        while let Some(id) = self.next_cancel_target(process, object, thread, iosb) {
            let status = self
                .obj(id)
                .ok()
                .and_then(|obj| obj.source.get())
                .map_or(Status::CANCELLED, |source| source.cancel_async(id));
            if let Err(err) = self.terminate(id, status) {
                aio_warn!("failed to cancel {}: {}", id, err);
                break;
            }
            self.count(|s| s.cancelled += 1);
            woken += 1;
        }
        if woken > 0 {
            aio_debug!("cancelled {} asyncs of process {}", woken, process);
        }
        woken
    }

    fn next_cancel_target(
        &self,
        process: ProcessId,
        object: Option<ObjectId>,
        thread: Option<ThreadId>,
        iosb: Option<ClientPtr>,
    ) -> Option<AsyncId> {
        self.process_asyncs(process).iter().copied().find(|id| {
            let Ok(obj) = self.obj(*id) else {
                return false;
            };
            if obj.flags.contains(AsyncFlags::TERMINATED) {
                return false;
            }
            let object_matches = object.is_none_or(|object| {
                obj.source.get().is_some_and(|source| source.user_object() == object)
            });
            object_matches
                && thread.is_none_or(|thread| obj.thread.id() == thread)
                && iosb.is_none_or(|iosb| obj.params.iosb == iosb)
        })
    }

    /// Cancel every async of a process that is going away
    pub fn cancel_process(&mut self, process: ProcessId) -> usize {
        self.cancel(process, None, None, None)
    }

    /// Arm a timeout that terminates the async with `status` when it fires.
    /// A previous timeout is replaced; `Timeout::INFINITE` only disarms.
    pub fn set_timeout(&mut self, id: AsyncId, timeout: Timeout, status: Status) -> Result<()> {
        let obj = self.obj_mut(id)?;
        let previous = obj.timeout.take();
        obj.timeout_status = status;
        if let Some(key) = previous {
            self.timers.remove_timeout(key);
        }
        if !timeout.is_infinite() {
            let key = self.timers.add_timeout(timeout, id);
            self.obj_mut(id)?.timeout = Some(key);
        }
        Ok(())
    }

    /// Timer callback. Expiry reports for a timer that was replaced or
    /// removed in the meantime are ignored.
    pub fn timeout_expired(&mut self, id: AsyncId, key: TimerKey) -> Result<()> {
        let obj = self.obj_mut(id)?;
        if obj.timeout != Some(key) {
            aio_trace!("ignoring stale timer {:?} for {}", key, id);
            return Ok(());
        }
        obj.timeout = None;
        let status = obj.timeout_status;
        self.count(|s| s.timed_out += 1);
        aio_debug!("{} timed out", id);
        self.terminate(id, status)
    }
}
