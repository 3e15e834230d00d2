//! Error types for cholr

use thiserror::Error;

/// Result type alias using cholr's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during tiled factorization
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Matrix/tile geometry rejected before any kernel runs
    #[error("Invalid configuration (n={n}, ts={ts}): {reason}")]
    InvalidConfiguration {
        /// Matrix dimension
        n: usize,
        /// Tile dimension
        ts: usize,
        /// Why the configuration was rejected
        reason: &'static str,
    },

    /// The matrix does not admit a real Cholesky factorization
    #[error(
        "Matrix is not positive definite: non-positive pivot in diagonal tile {tile}, column {column}"
    )]
    NotPositiveDefinite {
        /// Block index k of the diagonal tile whose factorization failed
        tile: usize,
        /// Column within the tile where the pivot turned non-positive
        column: usize,
    },

    /// Unexpected arithmetic fault inside a kernel (non-finite pivot)
    #[error("Kernel failure in {node}: {detail}")]
    KernelFailure {
        /// The operation that faulted
        node: &'static str,
        /// Description of the fault
        detail: String,
    },

    /// Dense buffer passed to a conversion has the wrong length
    #[error("Dense buffer length mismatch: expected {expected}, got {got}")]
    DenseSizeMismatch {
        /// Expected element count (n * n)
        expected: usize,
        /// Actual element count
        got: usize,
    },
}

impl Error {
    /// Create an invalid-configuration error
    pub fn invalid_configuration(n: usize, ts: usize, reason: &'static str) -> Self {
        Self::InvalidConfiguration { n, ts, reason }
    }
}
