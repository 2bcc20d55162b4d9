//! Core module containing status codes and fundamental types

pub mod status;
pub mod types;

// Re-export commonly used items
pub use status::Status;
pub use types::*;
