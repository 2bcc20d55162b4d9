//! Request dispatcher

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::format;

use ntio_api::error;
use ntio_api::sync::Mutex;

use super::traits::{Reply, RequestContext, RequestHandler};
use crate::subsystem::AsyncIo;

/// Request dispatcher
pub struct RequestDispatcher {
    /// Registered request handlers
    handlers: BTreeMap<u32, Box<dyn RequestHandler>>,
    /// Request statistics
    stats: Mutex<DispatchStats>,
}

impl RequestDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
            stats: Mutex::new(DispatchStats::default()),
        }
    }

    /// Register a handler under its request code, replacing any previous one
    pub fn register_handler(&mut self, handler: Box<dyn RequestHandler>) {
        aio_trace!("registering request {} ({:#x})", handler.name(), handler.id());
        self.handlers.insert(handler.id(), handler);
    }

    pub fn get_handler(&self, id: u32) -> Option<&dyn RequestHandler> {
        self.handlers.get(&id).map(|handler| handler.as_ref())
    }

    /// Dispatch a request
    pub fn dispatch(&self, io: &mut AsyncIo, id: u32, ctx: &RequestContext, args: &[u64]) -> ntio_api::Result<Reply> {
        let handler = self
            .handlers
            .get(&id)
            .filter(|handler| handler.is_available())
            .ok_or_else(|| error::not_found(&format!("request {:#x} not found", id)))?;

        let result = handler.execute(io, ctx, args);

        let mut stats = self.stats.lock();
        stats.total_calls += 1;
        *stats.calls_by_type.entry(id).or_insert(0) += 1;
        if let Err(err) = &result {
            stats.error_count += 1;
            aio_debug!("request {} failed: {}", handler.name(), err);
        }

        result
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats.lock().clone()
    }
}

impl Default for RequestDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Request statistics
#[derive(Debug, Clone, Default)]
pub struct DispatchStats {
    /// Total number of dispatched requests
    pub total_calls: u64,
    /// Number of requests by code
    pub calls_by_type: BTreeMap<u32, u64>,
    /// Number of failed requests
    pub error_count: u64,
}
