//! Request type definitions
//!
//! This module contains the request numbers of the requests served by this
//! crate.

/// Request numbers
pub const REQ_CANCEL_ASYNC: u32 = 0x0140;
pub const REQ_GET_ASYNC_RESULT: u32 = 0x0141;
