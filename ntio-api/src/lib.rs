//! ntio API - Core types and collaborator interfaces
//!
//! This crate provides the types shared between the async I/O subsystem of the
//! server and the collaborators it is embedded in: the kernel-object layer,
//! the fd/readiness layer, the thread model, the timer scheduler and
//! completion ports.
//!
//! # Architecture
//!
//! - **Core**: status codes, identifiers, handles, timeouts and request parameters
//! - **Error**: the common error type and `Result` alias
//! - **Arena**: generation-checked storage backing the typed object ids
//! - **Apc**: client-directed callback descriptors
//! - **Interfaces**: traits implemented by the embedding server
//!
//! # Usage
//!
//! ```rust
//! use ntio_api::{Error, Result, Status};
//!
//! fn check(status: Status) -> Result<()> {
//!     if status.is_error() {
//!         return Err(Error::Status(status));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check(Status::SUCCESS).is_ok());
//! assert!(check(Status::CANCELLED).is_err());
//! ```

#![no_std]

extern crate alloc;

// Core modules
pub mod core;
pub mod error;
pub mod arena;
pub mod apc;
pub mod interfaces;
pub mod collections;
pub mod sync;

// Re-export commonly used types
pub use crate::core::types::*;
pub use crate::core::status::Status;
pub use crate::error::{Error, Result};
pub use crate::arena::{Arena, Index};
pub use crate::apc::{ApcCall, ApcDelivery};
pub use crate::interfaces::*;
