//! Errors reported by fallible sequence operations.

use thiserror::Error;

/// Boxed error produced by a user-supplied element constructor.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for sequence operations.
pub type Result<T> = std::result::Result<T, SequenceError>;

/// Errors that can occur while allocating, building or addressing a `Sequence`.
#[derive(Debug, Error)]
pub enum SequenceError {
    /// The global allocator returned null for the requested block.
    #[error("allocation of {bytes} bytes (align {align}) failed")]
    AllocationFailure {
        /// Size of the requested block in bytes.
        bytes: usize,
        /// Alignment of the requested block.
        align: usize,
    },

    /// The requested element count does not fit in a valid memory layout.
    #[error("capacity overflow")]
    CapacityOverflow,

    /// An element constructor reported failure part way through a block.
    #[error("element construction failed after {constructed} of {requested} elements: {source}")]
    Construction {
        /// Elements that were built (and since destroyed) before the failure.
        constructed: usize,
        /// Elements the operation set out to build.
        requested: usize,
        /// The constructor's own error.
        #[source]
        source: BoxError,
    },

    /// A checked access or positional removal addressed a missing element,
    /// or a range removal got bounds that are reversed or past the end.
    #[error("index {index} out of range for sequence of length {len}")]
    OutOfRange {
        /// The offending index. For a range, the bound that broke
        /// `start <= end <= len`.
        index: usize,
        /// Length of the sequence at the time of the call.
        len: usize,
    },
}

impl SequenceError {
    /// Returns true for errors that come from the allocator or layout math.
    pub fn is_allocation(&self) -> bool {
        matches!(
            self,
            SequenceError::AllocationFailure { .. } | SequenceError::CapacityOverflow
        )
    }
}
