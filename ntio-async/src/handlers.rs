//! Async requests
//!
//! The client-facing requests of the subsystem: cancelling outstanding I/O
//! and fetching the result of an alerted async.

use alloc::boxed::Box;
use alloc::vec::Vec;

use ntio_api::error::{self, Result};
use ntio_api::{ClientPtr, DataSize, ObjHandle, Status};

use crate::dispatch::{Reply, RequestContext, RequestDispatcher, RequestHandler};
use crate::subsystem::AsyncIo;
use crate::types::{REQ_CANCEL_ASYNC, REQ_GET_ASYNC_RESULT};

/// Register the async request handlers
pub fn register_handlers(dispatcher: &mut RequestDispatcher) -> Result<()> {
    dispatcher.register_handler(Box::new(CancelAsyncHandler));
    dispatcher.register_handler(Box::new(GetAsyncResultHandler));
    Ok(())
}

/// Parameters of a `cancel_async` request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelAsyncRequest {
    /// Handle of the object whose I/O is cancelled
    pub handle: ObjHandle,
    /// Only cancel the async with this client IOSB address
    pub iosb: Option<ClientPtr>,
    /// Only cancel I/O issued by the calling thread
    pub only_thread: bool,
}

impl CancelAsyncRequest {
    /// Decodes `[handle, iosb, only_thread]`; a zero IOSB address means any.
    pub fn from_args(args: &[u64]) -> Result<Self> {
        let [handle, iosb, only_thread] = args else {
            return Err(error::invalid_parameter("cancel_async takes 3 arguments"));
        };
        let handle = u32::try_from(*handle).map_err(|_| error::invalid_handle("handle out of range"))?;
        Ok(Self {
            handle: ObjHandle(handle),
            iosb: (*iosb != 0).then_some(*iosb),
            only_thread: *only_thread != 0,
        })
    }
}

/// Cancel the calling process's I/O on an object. Returns how many asyncs
/// were cancelled; naming an IOSB that matches nothing is an error.
pub fn cancel_async(io: &mut AsyncIo, ctx: &RequestContext, req: &CancelAsyncRequest) -> Result<usize> {
    let process = ctx.thread.process_id();
    let object = io
        .objects()
        .resolve_object(process, req.handle)
        .ok_or_else(|| error::invalid_handle("cancel_async on an invalid handle"))?;
    let thread = req.only_thread.then(|| ctx.thread.id());

    let count = io.cancel(process, Some(object), thread, req.iosb);
    if count == 0 && req.iosb.is_some() {
        return Err(error::not_found("no async matches the I/O status block"));
    }
    Ok(count)
}

/// Result of a `get_async_result` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncResult {
    /// Result size recorded in the IOSB
    pub size: DataSize,
    /// IOSB status
    pub status: Status,
    /// Output data, truncated to the reply capacity
    pub data: Option<Vec<u8>>,
}

/// Fetch the outcome of the calling process's async created with `user`.
/// The output buffer is handed out only once.
pub fn get_async_result(io: &mut AsyncIo, ctx: &RequestContext, user: ClientPtr) -> Result<AsyncResult> {
    let process = ctx.thread.process_id();
    let iosb = io
        .find_by_user(process, user)
        .and_then(|id| io.iosb(id).ok().flatten())
        .ok_or_else(|| error::invalid_parameter("no async with this user token"))?;

    let data = iosb.take_output(ctx.reply_max_size);
    Ok(AsyncResult {
        size: iosb.result(),
        status: iosb.status(),
        data,
    })
}

/// `cancel_async` request handler
pub struct CancelAsyncHandler;

impl RequestHandler for CancelAsyncHandler {
    fn id(&self) -> u32 {
        REQ_CANCEL_ASYNC
    }

    fn execute(&self, io: &mut AsyncIo, ctx: &RequestContext, args: &[u64]) -> Result<Reply> {
        let req = CancelAsyncRequest::from_args(args)?;
        let count = cancel_async(io, ctx, &req)?;
        Ok(Reply::new(count as u64, Status::SUCCESS))
    }

    fn name(&self) -> &str {
        "cancel_async"
    }
}

/// `get_async_result` request handler
pub struct GetAsyncResultHandler;

impl RequestHandler for GetAsyncResultHandler {
    fn id(&self) -> u32 {
        REQ_GET_ASYNC_RESULT
    }

    fn execute(&self, io: &mut AsyncIo, ctx: &RequestContext, args: &[u64]) -> Result<Reply> {
        let [user] = args else {
            return Err(error::invalid_parameter("get_async_result takes 1 argument"));
        };
        let result = get_async_result(io, ctx, *user)?;
        Ok(Reply::new(result.size as u64, result.status).with_data(result.data))
    }

    fn name(&self) -> &str {
        "get_async_result"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_args() {
        let req = CancelAsyncRequest::from_args(&[4, 0, 1]).unwrap();
        assert_eq!(req.handle, ObjHandle(4));
        assert_eq!(req.iosb, None);
        assert!(req.only_thread);

        let req = CancelAsyncRequest::from_args(&[4, 0x1000, 0]).unwrap();
        assert_eq!(req.iosb, Some(0x1000));
        assert!(!req.only_thread);
    }

    #[test]
    fn test_cancel_args_rejects_bad_input() {
        assert!(CancelAsyncRequest::from_args(&[4, 0]).is_err());
        assert!(CancelAsyncRequest::from_args(&[u64::MAX, 0, 0]).is_err());
    }
}
