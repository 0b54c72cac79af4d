//! Text persistence for inverse-depth patch edges.
//!
//! ## Record format
//!
//! A patch edge persists its camera parameter id, its 9 measurement values and
//! the upper triangle (diagonal included) of its 9×9 information matrix:
//!
//! ```text
//! <parameter_id> <m_0> ... <m_8> <Ω_00> <Ω_01> ... <Ω_08> <Ω_11> ... <Ω_88>
//! ```
//!
//! The 45 information values are written row-major over `(i, j)` with `i ≤ j`.
//! Reading mirrors every off-diagonal value into its transposed slot.
//!
//! ## File format
//!
//! Files hold one edge per line, prefixed by the tag and the ids of the point,
//! observation pose and anchor pose vertices:
//!
//! ```text
//! EDGE_INVD_PATCH <point_id> <observation_id> <anchor_id> <record>
//! ```
//!
//! Empty lines and lines starting with `#` are skipped, as are unknown tags.

use thiserror::Error;

pub mod g2o;
pub mod record;

pub use g2o::{EDGE_TAG, PatchEdgeEntry, PatchEdgeLoader};
pub use record::{EdgeRecord, INFORMATION_UPPER_LEN, PATCH_DIM};

/// Errors that can occur while reading or writing patch edges.
#[derive(Error, Debug)]
pub enum IoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid number format at line {line}: {value}")]
    InvalidNumber { line: usize, value: String },

    #[error("Missing required fields at line {line}: expected {expected}, found {found}")]
    MissingFields {
        line: usize,
        expected: usize,
        found: usize,
    },
}

/// Parses one whitespace token, reporting the line on failure.
pub(crate) fn parse_token<T: std::str::FromStr>(token: &str, line: usize) -> Result<T, IoError> {
    token.parse::<T>().map_err(|_| IoError::InvalidNumber {
        line,
        value: token.to_string(),
    })
}
