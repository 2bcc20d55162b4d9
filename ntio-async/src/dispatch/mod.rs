//! Request dispatch
//!
//! Requests that reach the subsystem directly from a client (rather than
//! through a file's own request handler) are served by [`RequestHandler`]s
//! registered with a [`RequestDispatcher`].

pub mod dispatcher;
pub mod traits;

// Re-export commonly used items
pub use dispatcher::{DispatchStats, RequestDispatcher};
pub use traits::{Reply, RequestContext, RequestHandler};
