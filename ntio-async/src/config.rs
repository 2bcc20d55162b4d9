//! Subsystem configuration

use ntio_api::DataSize;

/// Default cap on request payloads copied into an IOSB
pub const DEFAULT_MAX_INPUT_SIZE: DataSize = 16 * 1024 * 1024;

/// Default cap on the output capacity recorded in an IOSB
pub const DEFAULT_MAX_OUTPUT_SIZE: DataSize = 16 * 1024 * 1024;

/// Async I/O subsystem configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsyncIoConfig {
    /// Largest request payload an IOSB accepts; larger copies fail with
    /// `Error::OutOfMemory`
    pub max_input_size: DataSize,
    /// Upper bound for the reply capacity recorded at IOSB creation
    pub max_output_size: DataSize,
    /// Whether [`crate::AsyncStats`] counters are maintained
    pub collect_stats: bool,
}

impl AsyncIoConfig {
    pub const fn new() -> Self {
        Self {
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
            max_output_size: DEFAULT_MAX_OUTPUT_SIZE,
            collect_stats: true,
        }
    }

    pub fn with_max_input_size(mut self, size: DataSize) -> Self {
        self.max_input_size = size;
        self
    }

    pub fn with_max_output_size(mut self, size: DataSize) -> Self {
        self.max_output_size = size;
        self
    }

    pub fn with_stats(mut self, enabled: bool) -> Self {
        self.collect_stats = enabled;
        self
    }
}

impl Default for AsyncIoConfig {
    fn default() -> Self {
        Self::new()
    }
}
