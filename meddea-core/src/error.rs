//! Error types for meddea-core.

use crate::units::Unit;
use thiserror::Error;

/// Result type alias for meddea operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for meddea operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Module or pixel index outside the physical detector layout.
    #[error("invalid pixel address: module {module}, pixel {pixel}")]
    InvalidAddress { module: u8, pixel: u8 },

    /// Flat pixel id that does not decode to a physical pixel.
    #[error("invalid pixel id: {0:#06x}")]
    InvalidPixelId(u16),

    /// Slot-to-pixel assignment disagrees between telemetry rows.
    #[error("pixel assignment changed at row {row}")]
    PixelAssignmentUnstable { row: usize },

    /// Quantity carries a unit the operation cannot accept.
    #[error("unsupported unit {found}, expected {expected}")]
    UnsupportedUnit { found: Unit, expected: &'static str },

    /// Spectral regions passed where exactly one is required.
    #[error("expected exactly one spectral region, got {0}")]
    UnsupportedRegionCount(usize),

    /// Energy selection requested on a list without calibrated energies.
    #[error("event list is not calibrated")]
    NotCalibrated,

    /// Parallel columns of different lengths.
    #[error("column length mismatch for {column}: expected {expected}, got {actual}")]
    LengthMismatch {
        column: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Time column is not ordered.
    #[error("{series} series is not time ordered at row {row}")]
    Unsorted { series: &'static str, row: usize },

    /// Time value that is NaN or infinite.
    #[error("{series} series has a non-finite time at row {row}")]
    NonFiniteTime { series: &'static str, row: usize },

    /// Operation needs at least one row.
    #[error("{0} series is empty")]
    EmptySeries(&'static str),

    /// Bin edges that cannot form a histogram.
    #[error("invalid bin edges: {0}")]
    InvalidBinEdges(String),

    /// Parameter outside its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
