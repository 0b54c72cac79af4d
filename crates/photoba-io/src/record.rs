//! Measurement and information record of a single patch edge.

use crate::{IoError, parse_token};
use nalgebra::{SMatrix, SVector};
use std::fmt;
use std::io::Write;

/// Residual dimension of a patch edge.
pub const PATCH_DIM: usize = 9;

/// Number of stored information entries: the upper triangle of a 9×9 matrix.
pub const INFORMATION_UPPER_LEN: usize = PATCH_DIM * (PATCH_DIM + 1) / 2;

/// Number of whitespace tokens in a serialized record.
pub const RECORD_TOKENS: usize = 1 + PATCH_DIM + INFORMATION_UPPER_LEN;

/// Persisted part of a patch edge.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    /// Id of the camera parameter block the edge is bound to
    pub parameter_id: i32,
    /// Per-pixel measurement values
    pub measurement: SVector<f64, PATCH_DIM>,
    /// Symmetric information matrix weighting the residual
    pub information: SMatrix<f64, PATCH_DIM, PATCH_DIM>,
}

impl EdgeRecord {
    pub fn new(
        parameter_id: i32,
        measurement: SVector<f64, PATCH_DIM>,
        information: SMatrix<f64, PATCH_DIM, PATCH_DIM>,
    ) -> Self {
        Self {
            parameter_id,
            measurement,
            information,
        }
    }

    /// Upper triangle of the information matrix, row-major over `i ≤ j`.
    pub fn information_upper(&self) -> [f64; INFORMATION_UPPER_LEN] {
        let mut upper = [0.0; INFORMATION_UPPER_LEN];
        let mut k = 0;
        for i in 0..PATCH_DIM {
            for j in i..PATCH_DIM {
                upper[k] = self.information[(i, j)];
                k += 1;
            }
        }
        upper
    }

    /// Parses a record from its whitespace tokens.
    ///
    /// Extra trailing tokens are ignored. `line` is only used in error reports.
    pub fn parse_tokens(tokens: &[&str], line: usize) -> Result<Self, IoError> {
        if tokens.len() < RECORD_TOKENS {
            return Err(IoError::MissingFields {
                line,
                expected: RECORD_TOKENS,
                found: tokens.len(),
            });
        }

        let parameter_id = parse_token::<i32>(tokens[0], line)?;

        let mut measurement = SVector::<f64, PATCH_DIM>::zeros();
        for (i, token) in tokens[1..=PATCH_DIM].iter().enumerate() {
            measurement[i] = parse_token::<f64>(token, line)?;
        }

        let mut information = SMatrix::<f64, PATCH_DIM, PATCH_DIM>::zeros();
        let mut cursor = 1 + PATCH_DIM;
        for i in 0..PATCH_DIM {
            for j in i..PATCH_DIM {
                let value = parse_token::<f64>(tokens[cursor], line)?;
                information[(i, j)] = value;
                if i != j {
                    information[(j, i)] = value;
                }
                cursor += 1;
            }
        }

        Ok(Self {
            parameter_id,
            measurement,
            information,
        })
    }

    /// Writes the record as one line fragment (no trailing newline).
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), IoError> {
        write!(writer, "{self}")?;
        Ok(())
    }
}

impl fmt::Display for EdgeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parameter_id)?;
        for value in self.measurement.iter() {
            write!(f, " {value}")?;
        }
        for value in self.information_upper() {
            write!(f, " {value}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for EdgeRecord {
    type Err = IoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        Self::parse_tokens(&tokens, 0)
    }
}
