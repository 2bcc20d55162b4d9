//! Async I/O statistics

/// Counters maintained by [`crate::AsyncIo`] when statistics are enabled
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AsyncStats {
    /// Asyncs created
    pub created: u64,
    /// Asyncs destroyed after their last hold went away
    pub destroyed: u64,
    /// First terminations (repeated terminate calls are not counted)
    pub terminated: u64,
    /// Asyncs terminated by a cancel scan
    pub cancelled: u64,
    /// Asyncs terminated by an expiring timer
    pub timed_out: u64,
    /// Alerted asyncs restarted by a pending result
    pub restarted: u64,
    /// Final results committed through `set_result`
    pub completed: u64,
    /// APCs accepted by client threads
    pub apcs_queued: u64,
    /// APCs rejected by client threads
    pub apcs_rejected: u64,
    /// Completion port entries posted
    pub completions_posted: u64,
    /// Creations refused for conflicting or unresolvable parameters
    pub creation_failures: u64,
}

impl AsyncStats {
    pub const fn new() -> Self {
        Self {
            created: 0,
            destroyed: 0,
            terminated: 0,
            cancelled: 0,
            timed_out: 0,
            restarted: 0,
            completed: 0,
            apcs_queued: 0,
            apcs_rejected: 0,
            completions_posted: 0,
            creation_failures: 0,
        }
    }

    /// Asyncs currently alive
    pub fn live(&self) -> u64 {
        self.created.saturating_sub(self.destroyed)
    }
}
