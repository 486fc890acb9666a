//! Error taxonomy for lattice loading, compilation and scene assembly

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the library. Unknown lattice symbols are never an error;
/// they resolve to an empty site.
#[derive(Debug, Error)]
pub enum CrystalError {
    /// No persisted lattice exists yet; the caller has to ask for a default one.
    #[error("no lattice model found for '{name}' (expected {path:?}); run `init` to create one")]
    MissingModel { name: String, path: PathBuf },

    /// Rows tokenize to different lengths, so the matrix would be ragged.
    #[error("malformed lattice: row {row} has {found} sites, expected {expected}")]
    MalformedLattice {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A curve cell looked past the grid edge under the `reject` boundary policy.
    #[error("curve at row {row}, column {col} needs neighbours outside the lattice")]
    NeighborBounds { row: usize, col: usize },

    #[error("invalid dimension: {0}")]
    InvalidDimension(String),

    #[error("scene has no crystals; add one before placing {0}")]
    NoCrystals(&'static str),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("script rendering failed: {0}")]
    Render(#[from] minijinja::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CrystalError>;
