//! Result delivery
//!
//! Once the client reports the final status of an operation, the result is
//! delivered through exactly one of the request's notification mechanisms:
//! a user APC when the request named an APC routine, otherwise a completion
//! port entry when the request carried a completion value. The event (or
//! the source itself) is signaled and waiters on the async are woken in
//! either case.

use ntio_api::error::{self, Result};
use ntio_api::{ApcCall, ApcDelivery, ApcParam, AsyncId, CompletionFlags, Status};

use crate::object::AsyncFlags;
use crate::subsystem::AsyncIo;

impl AsyncIo {
    /// Queues the async I/O APC for a freshly terminated async. A thread that
    /// refuses the call completes the async on the spot.
    pub(crate) fn notify_thread(&mut self, id: AsyncId, status: Status) {
        let Ok(obj) = self.obj(id) else {
            return;
        };

        // a nonzero result or pending output needs another round trip
        let needs_fetch = obj.iosb.as_ref().is_some_and(|iosb| iosb.result() != 0 || iosb.has_output());
        let reported = if needs_fetch { Status::ALERTED } else { status };
        let call = ApcCall::AsyncIo {
            user: obj.params.user,
            sb: obj.params.iosb,
            status: reported,
        };

        match obj.thread.queue_apc(Some(id), call) {
            ApcDelivery::Queued => {
                if let Ok(obj) = self.obj_mut(id) {
                    obj.holds += 1;
                }
                self.count(|s| s.apcs_queued += 1);
            }
            ApcDelivery::Rejected => {
                aio_debug!("thread rejected the I/O APC of {}, completing with {:?}", id, reported);
                self.count(|s| s.apcs_rejected += 1);
                if let Err(err) = self.set_result(id, reported, 0) {
                    aio_warn!("failed to complete {}: {}", id, err);
                }
            }
        }
    }

    /// The client ran the async I/O APC queued for `id` and reported its
    /// result. Drops the hold the APC carried.
    pub fn apc_completed(&mut self, id: AsyncId, status: Status, total: ApcParam) {
        if let Err(err) = self.set_result(id, status, total) {
            aio_warn!("dropping APC result for {}: {}", id, err);
        }
        self.release(id);
    }

    /// Record the final result the client reported for a terminated async.
    ///
    /// An alerted async reporting `PENDING` is restarted: it goes back to
    /// waiting on its queue. Any other status is final and is delivered to
    /// the client.
    pub fn set_result(&mut self, id: AsyncId, status: Status, total: ApcParam) -> Result<()> {
        let obj = self.obj_mut(id)?;
        if !obj.flags.contains(AsyncFlags::TERMINATED) {
            return Err(error::invalid_state("result reported for an async that was never woken"));
        }

        if obj.flags.contains(AsyncFlags::ALERTED) && status.is_pending() {
            self.restart(id);
            return Ok(());
        }

        self.pinned(id, |io| io.finish(id, status, total))
    }

    /// The client could not finish an alerted operation after all; the async
    /// goes back to waiting for the source.
    fn restart(&mut self, id: AsyncId) {
        if let Ok(obj) = self.obj_mut(id) {
            obj.flags.remove(AsyncFlags::TERMINATED | AsyncFlags::ALERTED);
        }
        self.count(|s| s.restarted += 1);
        aio_trace!("restarting {}", id);
        self.reselect(id);
    }

    fn finish(&mut self, id: AsyncId, status: Status, total: ApcParam) -> Result<()> {
        let obj = self.obj_mut(id)?;
        let timer = obj.timeout.take();
        obj.flags.insert(AsyncFlags::TERMINATED);
        if let Some(iosb) = &obj.iosb {
            iosb.set_status(status);
        }
        if let Some(key) = timer {
            self.timers.remove_timeout(key);
        }

        let obj = self.obj(id)?;
        let params = obj.params;
        if params.apc != 0 {
            let call = ApcCall::User {
                func: params.apc,
                args: [params.apc_context, params.iosb, 0],
            };
            if obj.thread.queue_apc(None, call) == ApcDelivery::Rejected {
                aio_debug!("user APC of {} was rejected", id);
            }
        } else if params.apc_context != 0
            && (obj.flags.contains(AsyncFlags::PENDING) || !obj.comp_flags.contains(CompletionFlags::SKIP_ON_SUCCESS))
        {
            self.post_completion(id, params.apc_context, status, total);
        }

        let obj = self.obj(id)?;
        if let Some(event) = &obj.event {
            event.set();
        } else if let Some(source) = obj.source.get() {
            source.set_signaled(true);
        }

        let obj = self.obj_mut(id)?;
        let wake = !obj.flags.contains(AsyncFlags::SIGNALED);
        obj.flags.insert(AsyncFlags::SIGNALED);
        let callback = obj.completion_callback.take();
        if wake {
            self.objects.wake_up(id);
        }
        if let Some(callback) = callback {
            callback(status);
        }

        self.reselect(id);
        self.detach_from_queue(id);
        self.count(|s| s.completed += 1);
        aio_debug!("{} completed with {:?}", id, status);
        Ok(())
    }

    /// Posts a completion entry to the port the async is bound to. The
    /// binding is looked up on the source if the async has none yet.
    fn post_completion(&mut self, id: AsyncId, value: ApcParam, status: Status, information: ApcParam) {
        let Ok(obj) = self.obj_mut(id) else {
            return;
        };
        if obj.completion.is_none() {
            obj.completion = obj.source.get().and_then(|source| source.completion());
        }
        let Some(binding) = obj.completion.clone() else {
            return;
        };
        binding.port.add_completion(binding.key, value, status, information);
        self.count(|s| s.completions_posted += 1);
    }
}
