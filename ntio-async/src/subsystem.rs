//! The async I/O subsystem
//!
//! [`AsyncIo`] owns every async object and async queue of the server. Objects
//! live in generation-checked arenas and refer to each other by id; the
//! collaborators they interact with are trait objects.
//!
//! # Lifetime rules
//!
//! An async stays alive while it is a member of a queue or while it has at
//! least one hold. Holds belong to:
//!
//! - the creator, until it calls [`AsyncIo::release`]
//! - the pre-allocated wait handle, until it is closed
//! - an APC that names the async as its owner, until its result comes back
//! - callers of [`AsyncIo::find_pending`]
//! - scoped pins taken while notifications run
//!
//! Membership in the per-process registry is not a hold. Destruction unlinks
//! the async from the registry, cancels its timer and drops its references.

use alloc::sync::Arc;
use alloc::vec::Vec;

use ntio_api::collections::HashMap;
use ntio_api::error::{self, Result};
use ntio_api::{Arena, AsyncId, ClientPtr, ObjectManager, ProcessId, QueueId, TimerService};

use crate::config::AsyncIoConfig;
use crate::object::{AsyncFlags, AsyncObject};
use crate::queue::AsyncQueue;
use crate::stats::AsyncStats;

/// Server-side async I/O state
pub struct AsyncIo {
    pub(crate) config: AsyncIoConfig,
    pub(crate) objects: Arc<dyn ObjectManager>,
    pub(crate) timers: Arc<dyn TimerService>,
    pub(crate) asyncs: Arena<AsyncObject>,
    pub(crate) queues: Arena<AsyncQueue>,
    /// Per-process registry, most recently created first
    pub(crate) registry: HashMap<ProcessId, Vec<AsyncId>>,
    pub(crate) stats: AsyncStats,
}

impl AsyncIo {
    /// Create an empty subsystem bound to the kernel object layer and the
    /// timer scheduler
    pub fn new(config: AsyncIoConfig, objects: Arc<dyn ObjectManager>, timers: Arc<dyn TimerService>) -> Self {
        Self {
            config,
            objects,
            timers,
            asyncs: Arena::new(),
            queues: Arena::new(),
            registry: HashMap::new(),
            stats: AsyncStats::new(),
        }
    }

    pub fn config(&self) -> &AsyncIoConfig {
        &self.config
    }

    pub fn stats(&self) -> &AsyncStats {
        &self.stats
    }

    pub fn objects(&self) -> &Arc<dyn ObjectManager> {
        &self.objects
    }

    /// Number of live asyncs
    pub fn len(&self) -> usize {
        self.asyncs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.asyncs.is_empty()
    }

    pub fn contains(&self, id: AsyncId) -> bool {
        self.asyncs.contains(id.index())
    }

    /// Asyncs registered for `process`, most recent first
    pub fn process_asyncs(&self, process: ProcessId) -> &[AsyncId] {
        self.registry.get(&process).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Finds the async of `process` created with the given user token
    pub fn find_by_user(&self, process: ProcessId, user: ClientPtr) -> Option<AsyncId> {
        self.process_asyncs(process)
            .iter()
            .copied()
            .find(|id| self.obj(*id).is_ok_and(|obj| obj.params.user == user))
    }

    pub(crate) fn obj(&self, id: AsyncId) -> Result<&AsyncObject> {
        self.asyncs.get(id.index()).ok_or_else(|| error::stale("async object no longer exists"))
    }

    pub(crate) fn obj_mut(&mut self, id: AsyncId) -> Result<&mut AsyncObject> {
        self.asyncs.get_mut(id.index()).ok_or_else(|| error::stale("async object no longer exists"))
    }

    pub(crate) fn has_flags(&self, id: AsyncId, flags: AsyncFlags) -> bool {
        self.obj(id).is_ok_and(|obj| obj.flags.contains(flags))
    }

    pub(crate) fn count(&mut self, f: impl FnOnce(&mut AsyncStats)) {
        if self.config.collect_stats {
            f(&mut self.stats);
        }
    }

    /// Adds a hold on behalf of an external holder
    pub fn grab(&mut self, id: AsyncId) -> Result<()> {
        self.obj_mut(id)?.holds += 1;
        Ok(())
    }

    /// Drops a hold; the async is destroyed once nothing keeps it alive.
    /// Releasing a stale id is a no-op.
    pub fn release(&mut self, id: AsyncId) {
        if let Ok(obj) = self.obj_mut(id) {
            obj.holds = obj.holds.saturating_sub(1);
            self.maybe_destroy(id);
        }
    }

    /// Runs `f` with `id` kept alive; destruction triggered inside `f` is
    /// deferred until it returns.
    pub(crate) fn pinned<R>(&mut self, id: AsyncId, f: impl FnOnce(&mut Self) -> R) -> R {
        let pinned = self.grab(id).is_ok();
        let ret = f(self);
        if pinned {
            self.release(id);
        }
        ret
    }

    pub(crate) fn maybe_destroy(&mut self, id: AsyncId) {
        let unreferenced = self.obj(id).is_ok_and(|obj| obj.holds == 0 && obj.queue.is_none());
        if unreferenced {
            self.destroy(id);
        }
    }

    fn destroy(&mut self, id: AsyncId) {
        let Some(obj) = self.asyncs.remove(id.index()) else {
            return;
        };
        aio_trace!("destroying {:?}", obj);

        let process = obj.process;
        if let Some(list) = self.registry.get_mut(&process) {
            list.retain(|entry| *entry != id);
            if list.is_empty() {
                self.registry.remove(&process);
            }
        }

        debug_assert!(obj.queue.is_none(), "queue members are never destroyed");

        if let Some(key) = obj.timeout {
            self.timers.remove_timeout(key);
        }
        self.count(|s| s.destroyed += 1);
        // iosb, event, port, thread and source references drop with `obj`
    }

    /// Re-evaluates the readiness of the source `id` is queued on
    pub(crate) fn reselect(&self, id: AsyncId) {
        if let Ok(obj) = self.obj(id) {
            if let Some(queue) = obj.queue {
                if obj.source.is_attached() {
                    self.reselect_queue(queue);
                }
            }
        }
    }

    pub(crate) fn reselect_queue(&self, queue: QueueId) {
        let Some(q) = self.queues.get(queue.index()) else {
            return;
        };
        if let Some(source) = q.source.upgrade() {
            source.reselect_async(queue, self.waiting(queue));
        }
    }
}
