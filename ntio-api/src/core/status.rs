//! NT status codes

use core::fmt;

/// An NT status code as seen by client processes.
///
/// The two top bits carry the severity: `0` success, `1` informational,
/// `2` warning, `3` error. `PENDING` and `ALERTED` are informational codes
/// with special meaning to the async subsystem.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct Status(u32);

impl Status {
    pub const SUCCESS: Status = Status(0x0000_0000);
    pub const ALERTED: Status = Status(0x0000_0101);
    pub const TIMEOUT: Status = Status(0x0000_0102);
    pub const PENDING: Status = Status(0x0000_0103);
    pub const BUFFER_OVERFLOW: Status = Status(0x8000_0005);
    pub const INVALID_HANDLE: Status = Status(0xC000_0008);
    pub const INVALID_PARAMETER: Status = Status(0xC000_000D);
    pub const END_OF_FILE: Status = Status(0xC000_0011);
    pub const NO_MEMORY: Status = Status(0xC000_0017);
    pub const IO_TIMEOUT: Status = Status(0xC000_00B5);
    pub const CANCELLED: Status = Status(0xC000_0120);
    pub const INVALID_DEVICE_STATE: Status = Status(0xC000_0184);
    pub const HANDLES_CLOSED: Status = Status(0xC000_0206);
    pub const NOT_FOUND: Status = Status(0xC000_0225);

    /// Wraps a raw status value.
    pub const fn from_raw(raw: u32) -> Self {
        Status(raw)
    }

    /// Returns the raw status value.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Severity bits of the code.
    pub const fn severity(self) -> u32 {
        self.0 >> 30
    }

    /// `NT_SUCCESS`: success or informational severity.
    pub const fn is_success(self) -> bool {
        self.severity() <= 1
    }

    /// `NT_ERROR`: error severity.
    pub const fn is_error(self) -> bool {
        self.severity() == 3
    }

    pub const fn is_pending(self) -> bool {
        self.0 == Self::PENDING.0
    }

    fn name(self) -> Option<&'static str> {
        let name = match self {
            Status::SUCCESS => "STATUS_SUCCESS",
            Status::ALERTED => "STATUS_ALERTED",
            Status::TIMEOUT => "STATUS_TIMEOUT",
            Status::PENDING => "STATUS_PENDING",
            Status::BUFFER_OVERFLOW => "STATUS_BUFFER_OVERFLOW",
            Status::INVALID_HANDLE => "STATUS_INVALID_HANDLE",
            Status::INVALID_PARAMETER => "STATUS_INVALID_PARAMETER",
            Status::END_OF_FILE => "STATUS_END_OF_FILE",
            Status::NO_MEMORY => "STATUS_NO_MEMORY",
            Status::IO_TIMEOUT => "STATUS_IO_TIMEOUT",
            Status::CANCELLED => "STATUS_CANCELLED",
            Status::INVALID_DEVICE_STATE => "STATUS_INVALID_DEVICE_STATE",
            Status::HANDLES_CLOSED => "STATUS_HANDLES_CLOSED",
            Status::NOT_FOUND => "STATUS_NOT_FOUND",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "Status({:#010x})", self.0),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({:#010x})", name, self.0),
            None => write!(f, "{:#010x}", self.0),
        }
    }
}

impl From<u32> for Status {
    fn from(raw: u32) -> Self {
        Status(raw)
    }
}

impl From<Status> for u32 {
    fn from(status: Status) -> Self {
        status.0
    }
}
