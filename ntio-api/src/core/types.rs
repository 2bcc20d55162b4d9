//! Core types used throughout the async I/O subsystem

use core::fmt;

use crate::arena::Index;

/// Process identifier type
pub type ProcessId = u32;

/// Thread identifier type
pub type ThreadId = u32;

/// Address in the client's address space
pub type ClientPtr = u64;

/// Opaque APC / completion parameter
pub type ApcParam = u64;

/// Size type for request and reply payloads
pub type DataSize = usize;

/// Handle value in a client process's handle table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjHandle(pub u32);

impl ObjHandle {
    /// Returns the raw handle value.
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ObjHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Identity of a kernel object, used to match asyncs by the object they
/// were issued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

/// Registration key handed out by the timer scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerKey(pub u64);

/// Timeout in 100ns units, NT convention.
///
/// Positive values are absolute deadlines, negative values are relative to
/// now, and [`Timeout::INFINITE`] never expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timeout(pub i64);

impl Timeout {
    pub const INFINITE: Timeout = Timeout(i64::MAX);

    /// Relative timeout of `ticks` units from now.
    pub const fn relative(ticks: i64) -> Self {
        Timeout(-ticks)
    }

    pub const fn is_infinite(self) -> bool {
        self.0 == i64::MAX
    }

    pub const fn is_relative(self) -> bool {
        self.0 < 0
    }
}

/// Identifier of an async object
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AsyncId(Index);

/// Identifier of an async queue
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueueId(Index);

macro_rules! arena_id {
    ($name:ident, $prefix:literal) => {
        impl $name {
            pub const fn from_index(index: Index) -> Self {
                $name(index)
            }

            pub const fn index(self) -> Index {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}.{}"), self.0.slot(), self.0.generation())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(self, f)
            }
        }
    };
}

arena_id!(AsyncId, "async");
arena_id!(QueueId, "queue");

bitflags::bitflags! {
    /// Per-request completion flags, as set on the file object.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CompletionFlags: u32 {
        /// Do not post to the completion port when the request completed
        /// synchronously with success.
        const SKIP_ON_SUCCESS = 0x1;
    }
}

/// Client-supplied parameters of an asynchronous request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AsyncParams {
    /// Event to signal on completion
    pub event: Option<ObjHandle>,
    /// Client address of the I/O status block
    pub iosb: ClientPtr,
    /// Opaque token correlating the async with client-side state
    pub user: ClientPtr,
    /// User APC routine
    pub apc: ClientPtr,
    /// APC context, or completion value when a port is bound
    pub apc_context: ApcParam,
}

impl AsyncParams {
    pub fn new(iosb: ClientPtr, user: ClientPtr) -> Self {
        Self {
            iosb,
            user,
            ..Self::default()
        }
    }

    pub fn with_event(mut self, event: ObjHandle) -> Self {
        self.event = Some(event);
        self
    }

    pub fn with_apc(mut self, apc: ClientPtr, context: ApcParam) -> Self {
        self.apc = apc;
        self.apc_context = context;
        self
    }

    /// Sets the completion value reported through a completion port.
    pub fn with_context(mut self, context: ApcParam) -> Self {
        self.apc_context = context;
        self
    }
}
