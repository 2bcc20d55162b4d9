//! Common test utilities: recording fakes for the collaborators of the
//! async subsystem

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};

use ntio_api::*;
use ntio_api::sync::Mutex;
use ntio_async::*;

pub const PROCESS: ProcessId = 10;
pub const THREAD: ThreadId = 11;

/// Client thread recording every APC it is asked to run
pub struct FakeThread {
    pub id: ThreadId,
    pub process: ProcessId,
    pub apcs: Mutex<Vec<(Option<AsyncId>, ApcCall)>>,
    pub reject: AtomicBool,
}

impl FakeThread {
    pub fn new(id: ThreadId, process: ProcessId) -> Arc<Self> {
        Arc::new(Self {
            id,
            process,
            apcs: Mutex::new(Vec::new()),
            reject: AtomicBool::new(false),
        })
    }

    pub fn apcs(&self) -> Vec<(Option<AsyncId>, ApcCall)> {
        self.apcs.lock().clone()
    }

    pub fn last_apc(&self) -> Option<(Option<AsyncId>, ApcCall)> {
        self.apcs.lock().last().copied()
    }
}

impl ClientThread for FakeThread {
    fn id(&self) -> ThreadId {
        self.id
    }

    fn process_id(&self) -> ProcessId {
        self.process
    }

    fn queue_apc(&self, owner: Option<AsyncId>, call: ApcCall) -> ApcDelivery {
        if self.reject.load(Ordering::SeqCst) {
            return ApcDelivery::Rejected;
        }
        self.apcs.lock().push((owner, call));
        ApcDelivery::Queued
    }
}

/// Completion port recording posted entries
#[derive(Default)]
pub struct FakePort {
    pub entries: Mutex<Vec<(ApcParam, ApcParam, Status, ApcParam)>>,
}

impl CompletionPort for FakePort {
    fn add_completion(&self, key: ApcParam, value: ApcParam, status: Status, information: ApcParam) {
        self.entries.lock().push((key, value, status, information));
    }
}

/// File-like source
pub struct FakeSource {
    pub object: ObjectId,
    pub overlapped: bool,
    pub completion: Mutex<Option<CompletionBinding>>,
    pub signaled: Mutex<Option<bool>>,
    pub reselects: Mutex<Vec<(QueueId, bool)>>,
    pub cancel_status: Mutex<Status>,
}

impl FakeSource {
    pub fn new(object: u64) -> Arc<Self> {
        Self::build(object, false, None)
    }

    pub fn overlapped(object: u64) -> Arc<Self> {
        Self::build(object, true, None)
    }

    pub fn with_port(object: u64, port: Arc<FakePort>, key: ApcParam) -> Arc<Self> {
        Self::build(object, true, Some(CompletionBinding { port, key }))
    }

    fn build(object: u64, overlapped: bool, completion: Option<CompletionBinding>) -> Arc<Self> {
        Arc::new(Self {
            object: ObjectId(object),
            overlapped,
            completion: Mutex::new(completion),
            signaled: Mutex::new(None),
            reselects: Mutex::new(Vec::new()),
            cancel_status: Mutex::new(Status::CANCELLED),
        })
    }

    pub fn signaled(&self) -> Option<bool> {
        *self.signaled.lock()
    }
}

impl IoSource for FakeSource {
    fn user_object(&self) -> ObjectId {
        self.object
    }

    fn completion(&self) -> Option<CompletionBinding> {
        self.completion.lock().clone()
    }

    fn is_overlapped(&self) -> bool {
        self.overlapped
    }

    fn set_signaled(&self, signaled: bool) {
        *self.signaled.lock() = Some(signaled);
    }

    fn reselect_async(&self, queue: QueueId, waiting: bool) {
        self.reselects.lock().push((queue, waiting));
    }

    fn cancel_async(&self, _async_id: AsyncId) -> Status {
        *self.cancel_status.lock()
    }
}

/// Event object
#[derive(Default)]
pub struct FakeEvent {
    pub signaled: AtomicBool,
    pub resets: AtomicUsize,
}

impl FakeEvent {
    pub fn is_set(&self) -> bool {
        self.signaled.load(Ordering::SeqCst)
    }
}

impl WaitEvent for FakeEvent {
    fn set(&self) {
        self.signaled.store(true, Ordering::SeqCst);
    }

    fn reset(&self) {
        self.signaled.store(false, Ordering::SeqCst);
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

/// Handle table and wait queue of the kernel object layer
pub struct FakeObjects {
    pub events: Mutex<HashMap<u32, Arc<FakeEvent>>>,
    pub objects: Mutex<HashMap<u32, ObjectId>>,
    pub wait_handles: Mutex<HashMap<ObjHandle, AsyncId>>,
    pub next_handle: AtomicU32,
    pub closed: Mutex<Vec<ObjHandle>>,
    pub woken: Mutex<Vec<AsyncId>>,
    pub fail_alloc: AtomicBool,
}

impl FakeObjects {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(HashMap::new()),
            objects: Mutex::new(HashMap::new()),
            wait_handles: Mutex::new(HashMap::new()),
            next_handle: AtomicU32::new(0x100),
            closed: Mutex::new(Vec::new()),
            woken: Mutex::new(Vec::new()),
            fail_alloc: AtomicBool::new(false),
        })
    }

    pub fn add_event(&self, handle: u32) -> Arc<FakeEvent> {
        let event = Arc::new(FakeEvent::default());
        self.events.lock().insert(handle, event.clone());
        event
    }

    pub fn add_object(&self, handle: u32, object: ObjectId) {
        self.objects.lock().insert(handle, object);
    }

    pub fn woken(&self) -> Vec<AsyncId> {
        self.woken.lock().clone()
    }

    pub fn closed(&self) -> Vec<ObjHandle> {
        self.closed.lock().clone()
    }
}

impl ObjectManager for FakeObjects {
    fn resolve_event(&self, _process: ProcessId, handle: ObjHandle) -> Option<Arc<dyn WaitEvent>> {
        let event = self.events.lock().get(&handle.raw()).cloned()?;
        Some(event as Arc<dyn WaitEvent>)
    }

    fn resolve_object(&self, _process: ProcessId, handle: ObjHandle) -> Option<ObjectId> {
        self.objects.lock().get(&handle.raw()).copied()
    }

    fn alloc_wait_handle(&self, _process: ProcessId, async_id: AsyncId) -> Option<ObjHandle> {
        if self.fail_alloc.load(Ordering::SeqCst) {
            return None;
        }
        let handle = ObjHandle(self.next_handle.fetch_add(4, Ordering::SeqCst));
        self.wait_handles.lock().insert(handle, async_id);
        Some(handle)
    }

    fn close_handle(&self, _process: ProcessId, handle: ObjHandle) {
        self.wait_handles.lock().remove(&handle);
        self.closed.lock().push(handle);
    }

    fn wake_up(&self, async_id: AsyncId) {
        self.woken.lock().push(async_id);
    }
}

/// Timer scheduler that never fires on its own
pub struct FakeTimers {
    pub next: AtomicU64,
    pub active: Mutex<Vec<(TimerKey, Timeout, AsyncId)>>,
    pub removed: Mutex<Vec<TimerKey>>,
}

impl FakeTimers {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next: AtomicU64::new(1),
            active: Mutex::new(Vec::new()),
            removed: Mutex::new(Vec::new()),
        })
    }

    pub fn active(&self) -> Vec<(TimerKey, Timeout, AsyncId)> {
        self.active.lock().clone()
    }
}

impl TimerService for FakeTimers {
    fn add_timeout(&self, when: Timeout, target: AsyncId) -> TimerKey {
        let key = TimerKey(self.next.fetch_add(1, Ordering::SeqCst));
        self.active.lock().push((key, when, target));
        key
    }

    fn remove_timeout(&self, key: TimerKey) {
        self.active.lock().retain(|(active, _, _)| *active != key);
        self.removed.lock().push(key);
    }
}

/// A subsystem wired to fresh fakes, with one client thread
pub struct Harness {
    pub io: AsyncIo,
    pub objects: Arc<FakeObjects>,
    pub timers: Arc<FakeTimers>,
    pub thread: Arc<FakeThread>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(AsyncIoConfig::default())
    }

    pub fn with_config(config: AsyncIoConfig) -> Self {
        let objects = FakeObjects::new();
        let timers = FakeTimers::new();
        let io = AsyncIo::new(config, objects.clone(), timers.clone());
        Self {
            io,
            objects,
            timers,
            thread: FakeThread::new(THREAD, PROCESS),
        }
    }

    pub fn ctx(&self) -> RequestContext {
        RequestContext::new(self.thread.clone())
    }

    /// Creates a plain async with its own IOSB
    pub fn create(&mut self, source: &Arc<FakeSource>, params: AsyncParams) -> (AsyncId, IosbRef) {
        let iosb = Iosb::create(&[], 0, self.io.config()).unwrap();
        let id = self
            .io
            .create(dyn_source(source), self.thread.clone(), params, Some(iosb.clone()))
            .unwrap();
        (id, iosb)
    }

    /// Creates an async, queues it and drops the creator's hold
    pub fn create_queued(&mut self, source: &Arc<FakeSource>, queue: QueueId, user: ClientPtr) -> (AsyncId, IosbRef) {
        let (id, iosb) = self.create(source, AsyncParams::new(0x1000 + user, user));
        self.io.queue(queue, id).unwrap();
        self.io.release(id);
        (id, iosb)
    }

    pub fn create_queue(&mut self, source: &Arc<FakeSource>) -> QueueId {
        self.io.create_queue(&dyn_source(source))
    }
}

pub fn dyn_source(source: &Arc<FakeSource>) -> Arc<dyn IoSource> {
    source.clone()
}
