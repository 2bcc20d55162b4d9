//! Async queues
//!
//! A source keeps one queue per operation class (reads, writes, ...).
//! Queued asyncs wait in FIFO order until the source becomes ready; the
//! source then wakes the head with `ALERTED` so the client can retry the
//! operation, or wakes every member with a final status.

use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;

use ntio_api::collections::VecDeque;
use ntio_api::error::{self, Result};
use ntio_api::{AsyncId, IoSource, QueueId, Status};

use crate::object::{AsyncFlags, SourceLink};
use crate::subsystem::AsyncIo;

pub(crate) struct AsyncQueue {
    pub(crate) source: Weak<dyn IoSource>,
    pub(crate) members: VecDeque<AsyncId>,
}

impl AsyncIo {
    /// Create an empty queue on `source`. The source owns the queue and must
    /// free it with [`AsyncIo::free_queue`] before it goes away.
    pub fn create_queue(&mut self, source: &Arc<dyn IoSource>) -> QueueId {
        let queue = AsyncQueue {
            source: Arc::downgrade(source),
            members: VecDeque::new(),
        };
        QueueId::from_index(self.queues.insert(queue))
    }

    /// Append an async to the tail of a queue.
    ///
    /// From here on the queue keeps the async alive and the async no longer
    /// keeps its source alive. The source is marked not signaled.
    pub fn queue(&mut self, queue: QueueId, id: AsyncId) -> Result<()> {
        if !self.queues.contains(queue.index()) {
            return Err(error::stale("async queue no longer exists"));
        }

        let obj = self.obj_mut(id)?;
        if obj.queue.is_some() {
            return Err(error::invalid_state("async is already queued"));
        }
        let source = match &obj.source {
            SourceLink::Owned(source) => source.clone(),
            _ => return Err(error::invalid_state("async has no source to queue on")),
        };
        obj.source = SourceLink::Queued(Arc::downgrade(&source));
        obj.queue = Some(queue);

        if let Some(q) = self.queues.get_mut(queue.index()) {
            q.members.push_back(id);
        }
        source.set_signaled(false);
        aio_trace!("queued {} on {}", id, queue);
        Ok(())
    }

    /// Tear down a queue whose source is going away. Every member is
    /// terminated with `HANDLES_CLOSED`; completion port bindings are
    /// captured first so the final result can still be posted.
    pub fn free_queue(&mut self, queue: QueueId) {
        let Some(members) = self.queues.get_mut(queue.index()).map(|q| core::mem::take(&mut q.members)) else {
            return;
        };
        aio_debug!("freeing {} with {} asyncs", queue, members.len());

        for id in members {
            self.pinned(id, |io| {
                if let Ok(obj) = io.obj_mut(id) {
                    if obj.completion.is_none() {
                        obj.completion = obj.source.get().and_then(|source| source.completion());
                    }
                    obj.source = SourceLink::Detached;
                }
                if let Err(err) = io.terminate(id, Status::HANDLES_CLOSED) {
                    aio_warn!("failed to terminate {}: {}", id, err);
                }
                if let Ok(obj) = io.obj_mut(id) {
                    obj.queue = None;
                }
            });
        }
        self.queues.remove(queue.index());
    }

    /// Whether the head of the queue still waits to be alerted
    pub fn waiting(&self, queue: QueueId) -> bool {
        self.queues
            .get(queue.index())
            .and_then(|q| q.members.front())
            .is_some_and(|head| !self.has_flags(*head, AsyncFlags::TERMINATED))
    }

    /// Terminate queued asyncs with `status`. `ALERTED` only wakes the head
    /// of the queue.
    pub fn wake_up(&mut self, queue: QueueId, status: Status) {
        let members: Vec<AsyncId> = match self.queues.get(queue.index()) {
            Some(q) => q.members.iter().copied().collect(),
            None => return,
        };

        for id in members {
            // an earlier termination may already have unlinked it
            if !self.obj(id).is_ok_and(|obj| obj.queue == Some(queue)) {
                continue;
            }
            if let Err(err) = self.terminate(id, status) {
                aio_warn!("failed to wake {}: {}", id, err);
            }
            if status == Status::ALERTED {
                break;
            }
        }
    }

    /// First queued async that is not terminated yet. The caller receives a
    /// hold and must release it.
    pub fn find_pending(&mut self, queue: QueueId) -> Option<AsyncId> {
        let id = self
            .queue_members(queue)
            .iter()
            .copied()
            .find(|id| !self.has_flags(*id, AsyncFlags::TERMINATED))?;
        self.grab(id).ok()?;
        Some(id)
    }

    /// Members of a queue, head first
    pub fn queue_members(&self, queue: QueueId) -> Vec<AsyncId> {
        self.queues
            .get(queue.index())
            .map(|q| q.members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Unlinks a completed async from its queue and its source
    pub(crate) fn detach_from_queue(&mut self, id: AsyncId) {
        let Ok(obj) = self.obj_mut(id) else {
            return;
        };
        let Some(queue) = obj.queue.take() else {
            return;
        };
        obj.source = SourceLink::Detached;
        if let Some(q) = self.queues.get_mut(queue.index()) {
            q.members.retain(|entry| *entry != id);
        }
        self.maybe_destroy(id);
    }
}
