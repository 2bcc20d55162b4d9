//! Error handling module for the async I/O subsystem

use core::fmt;
use alloc::string::{String, ToString};

use crate::core::status::Status;

/// Common error type used throughout the subsystem
///
/// Every variant maps onto the NT status that is reported back to the
/// requesting client, see [`Error::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Conflicting or malformed request parameters
    InvalidParameter(String),
    /// A handle did not resolve to a usable object
    InvalidHandle(String),
    /// The object is not in a state that allows the operation
    InvalidState(String),
    /// Nothing matched the request
    NotFound(String),
    /// A buffer could not be allocated
    OutOfMemory,
    /// An id referred to an object that no longer exists
    Stale(String),
    /// A raw status reported by a collaborator
    Status(Status),
}

impl Error {
    /// NT status reported to the client for this error
    pub fn status(&self) -> Status {
        match self {
            Error::InvalidParameter(_) => Status::INVALID_PARAMETER,
            Error::InvalidHandle(_) => Status::INVALID_HANDLE,
            Error::InvalidState(_) => Status::INVALID_DEVICE_STATE,
            Error::NotFound(_) => Status::NOT_FOUND,
            Error::OutOfMemory => Status::NO_MEMORY,
            Error::Stale(_) => Status::INVALID_HANDLE,
            Error::Status(status) => *status,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            Error::InvalidHandle(msg) => write!(f, "Invalid handle: {}", msg),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::OutOfMemory => write!(f, "Out of memory"),
            Error::Stale(msg) => write!(f, "Stale object id: {}", msg),
            Error::Status(status) => write!(f, "Status {}", status),
        }
    }
}

impl From<Status> for Error {
    fn from(status: Status) -> Self {
        match status {
            Status::NO_MEMORY => Error::OutOfMemory,
            other => Error::Status(other),
        }
    }
}

/// Result type for operations that can fail
pub type Result<T> = core::result::Result<T, Error>;

/// Creates a new invalid parameter error
pub fn invalid_parameter(msg: &str) -> Error {
    Error::InvalidParameter(msg.to_string())
}

/// Creates a new invalid handle error
pub fn invalid_handle(msg: &str) -> Error {
    Error::InvalidHandle(msg.to_string())
}

/// Creates a new invalid state error
pub fn invalid_state(msg: &str) -> Error {
    Error::InvalidState(msg.to_string())
}

/// Creates a new not found error
pub fn not_found(msg: &str) -> Error {
    Error::NotFound(msg.to_string())
}

/// Creates a new stale id error
pub fn stale(msg: &str) -> Error {
    Error::Stale(msg.to_string())
}

/// Creates a new out of memory error
pub fn out_of_memory() -> Error {
    Error::OutOfMemory
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(invalid_parameter("x").status(), Status::INVALID_PARAMETER);
        assert_eq!(not_found("x").status(), Status::NOT_FOUND);
        assert_eq!(out_of_memory().status(), Status::NO_MEMORY);
        assert_eq!(Error::from(Status::CANCELLED).status(), Status::CANCELLED);
        assert_eq!(Error::from(Status::NO_MEMORY), Error::OutOfMemory);
    }
}
