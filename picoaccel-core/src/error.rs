use std::collections::TryReserveError;

use thiserror::Error;

/// All errors produced by picoaccel-core.
///
/// The cache never surfaces these past `initialize`; a cache failure is always
/// a miss. Fixed-point arithmetic never fails at all.
#[derive(Debug, Error)]
pub enum AccelError {
    #[error("unsupported transform length {len} (supported: 256, 512)")]
    UnsupportedLength { len: usize },

    #[error("buffer too short: expected at least {expected} samples, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    #[error("out of memory while allocating {what}")]
    OutOfMemory {
        what: &'static str,
        #[source]
        source: TryReserveError,
    },

    #[error("transform context used before initialization")]
    Uninitialized,

    #[error("transform context used after deallocation")]
    Deallocated,
}

impl AccelError {
    /// `true` for resource exhaustion, which a caller may retry with a smaller
    /// configuration. Argument and state errors are programmer errors.
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(self, AccelError::OutOfMemory { .. })
    }
}

pub type Result<T> = std::result::Result<T, AccelError>;

/// Allocate a `len`-element vector filled with `fill`, reporting allocation
/// failure instead of aborting.
pub(crate) fn try_alloc<T: Clone>(len: usize, fill: T, what: &'static str) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|source| AccelError::OutOfMemory { what, source })?;
    v.resize(len, fill);
    Ok(v)
}
