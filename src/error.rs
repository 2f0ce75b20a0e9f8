use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the hard-disk engine and its driver.
///
/// Every failure in the core is a precondition violation or a numeric
/// degeneracy; nothing here is transient, so callers should not retry.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid user or API parameter.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// Two disks interpenetrate in a configuration handed to the engine.
    #[error("disks {i} and {j} overlap (distance {distance:.6} < 1)")]
    Overlap { i: usize, j: usize, distance: f64 },

    /// Random placement could not fit a disk within its attempt budget.
    #[error(
        "could not place disk {particle} without overlap after {attempts} attempts; \
         use a lattice configuration or a lower density"
    )]
    GenerationFailed { particle: usize, attempts: usize },

    /// Numerical or geometric issue (coincident centres, NaN contact time).
    #[error("numerical error: {0}")]
    MathError(String),

    /// The prediction table holds no future collision.
    #[error("no collision predicted for any particle")]
    NoCollision,

    /// Propagated I/O errors (config files).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed JSON configuration or report serialisation failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
