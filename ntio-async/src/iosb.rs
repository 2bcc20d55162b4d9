//! I/O status blocks
//!
//! An IOSB records the outcome of one operation. It is created by the
//! request layer with a copy of the request payload, shared between the
//! async object and whoever fetches the result, and freed with its buffers
//! when the last [`IosbRef`] is dropped.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use ntio_api::error::{self, Result};
use ntio_api::sync::Mutex;
use ntio_api::{DataSize, Status};

use crate::config::AsyncIoConfig;

/// I/O status block
pub struct Iosb {
    status: Status,
    result: DataSize,
    in_data: Arc<Vec<u8>>,
    out_size: DataSize,
    out_data: Option<Vec<u8>>,
}

impl Iosb {
    /// Allocate an IOSB holding a copy of `in_data`, with `out_size` bytes of
    /// reply capacity recorded.
    pub fn create(in_data: &[u8], out_size: DataSize, config: &AsyncIoConfig) -> Result<IosbRef> {
        let in_data = copy_payload(in_data, config.max_input_size)?;
        let iosb = Iosb {
            status: Status::PENDING,
            result: 0,
            in_data: Arc::new(in_data),
            out_size: out_size.min(config.max_output_size),
            out_data: None,
        };
        Ok(IosbRef(Arc::new(Mutex::new(iosb))))
    }
}

impl fmt::Debug for Iosb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("I/O status block")
            .field("status", &self.status)
            .field("result", &self.result)
            .field("in_size", &self.in_data.len())
            .field("out_size", &self.out_size)
            .field("has_output", &self.out_data.is_some())
            .finish()
    }
}

/// Copy a client payload, failing instead of aborting when it cannot be
/// allocated.
pub(crate) fn copy_payload(data: &[u8], limit: DataSize) -> Result<Vec<u8>> {
    if data.len() > limit {
        return Err(error::out_of_memory());
    }
    let mut copy = Vec::new();
    copy.try_reserve_exact(data.len()).map_err(|_| error::out_of_memory())?;
    copy.extend_from_slice(data);
    Ok(copy)
}

/// Shared reference to an [`Iosb`]
#[derive(Clone)]
pub struct IosbRef(Arc<Mutex<Iosb>>);

impl IosbRef {
    pub fn status(&self) -> Status {
        self.0.lock().status
    }

    pub fn result(&self) -> DataSize {
        self.0.lock().result
    }

    /// Reply capacity, or the size of the stored output once completed
    pub fn out_size(&self) -> DataSize {
        self.0.lock().out_size
    }

    pub fn in_size(&self) -> DataSize {
        self.0.lock().in_data.len()
    }

    /// Runs `f` over the request payload. The block is unlocked while `f`
    /// runs.
    pub fn with_input<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let data = self.0.lock().in_data.clone();
        f(&data)
    }

    pub fn has_output(&self) -> bool {
        self.0.lock().out_data.is_some()
    }

    /// Commits `status` if the block is still pending. Returns whether this
    /// call was the one that committed.
    pub fn commit_status(&self, status: Status) -> bool {
        let mut iosb = self.0.lock();
        if !iosb.status.is_pending() {
            return false;
        }
        iosb.status = status;
        true
    }

    /// Overwrites the status with the final one reported by the client.
    pub fn set_status(&self, status: Status) {
        self.0.lock().status = status;
    }

    /// Stores the full outcome of a request-based operation. Returns `false`
    /// and drops `out_data` when the block was already completed.
    pub fn complete(&self, status: Status, result: DataSize, out_data: Option<Vec<u8>>) -> bool {
        let mut iosb = self.0.lock();
        if !iosb.status.is_pending() {
            return false;
        }
        iosb.status = status;
        iosb.result = result;
        iosb.out_size = out_data.as_ref().map_or(0, Vec::len);
        iosb.out_data = out_data;
        true
    }

    /// Moves the output buffer out, truncated to `max` bytes. Only the first
    /// caller gets it; a zero-sized take leaves the buffer in place.
    pub fn take_output(&self, max: DataSize) -> Option<Vec<u8>> {
        let mut iosb = self.0.lock();
        let size = iosb.out_size.min(max);
        if size == 0 {
            return None;
        }
        let mut data = iosb.out_data.take()?;
        data.truncate(size);
        Some(data)
    }

    /// Whether both references point at the same block
    pub fn ptr_eq(&self, other: &IosbRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for IosbRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0.lock(), f)
    }
}
