//! Request handler traits

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use ntio_api::{ClientThread, DataSize, Result, Status};

use crate::subsystem::AsyncIo;

/// The request being served: the calling thread, the variable-length
/// request payload and the capacity of the reply buffer.
#[derive(Clone)]
pub struct RequestContext {
    pub thread: Arc<dyn ClientThread>,
    pub data: Vec<u8>,
    pub reply_max_size: DataSize,
}

impl RequestContext {
    pub fn new(thread: Arc<dyn ClientThread>) -> Self {
        Self {
            thread,
            data: Vec::new(),
            reply_max_size: 0,
        }
    }

    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    pub fn with_reply_max_size(mut self, size: DataSize) -> Self {
        self.reply_max_size = size;
        self
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("thread", &self.thread.id())
            .field("process", &self.thread.process_id())
            .field("data_len", &self.data.len())
            .field("reply_max_size", &self.reply_max_size)
            .finish()
    }
}

/// Reply to a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Fixed-size reply field
    pub value: u64,
    /// Status the request completes with
    pub status: Status,
    /// Variable-length reply data
    pub data: Option<Vec<u8>>,
}

impl Reply {
    pub fn new(value: u64, status: Status) -> Self {
        Self { value, status, data: None }
    }

    pub fn with_data(mut self, data: Option<Vec<u8>>) -> Self {
        self.data = data;
        self
    }
}

/// Request handler trait
pub trait RequestHandler: Send + Sync {
    /// Execute the request against the subsystem
    fn execute(&self, io: &mut AsyncIo, ctx: &RequestContext, args: &[u64]) -> Result<Reply>;

    /// Get the request name
    fn name(&self) -> &str;

    /// Get the request code
    fn id(&self) -> u32;

    /// Check if the request is available
    fn is_available(&self) -> bool {
        true
    }
}
