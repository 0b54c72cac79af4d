//! Error types for the photoba library
//!
//! Errors are only produced while building edges, pyramids and variables, or
//! while reading and writing edge files. Residual and Jacobian evaluation never
//! fails.

use photoba_camera_models::CameraModelError;
use photoba_io::IoError;
use thiserror::Error;

/// Main result type used throughout the photoba library
pub type PhotobaResult<T> = Result<T, PhotobaError>;

/// Main error type for the photoba library
#[derive(Debug, Error)]
pub enum PhotobaError {
    /// Edge file reading or writing failed
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// Invalid camera model parameters
    #[error("Camera model error: {0}")]
    Camera(#[from] CameraModelError),

    /// Intensity and gradient grids disagree or are unusable
    #[error("Invalid pyramid: {0}")]
    InvalidPyramid(String),

    /// Edge bindings are inconsistent
    #[error("Invalid edge: {0}")]
    InvalidEdge(String),

    /// A handle does not refer to a variable of the store
    #[error("Unknown {kind} handle {index}")]
    UnknownVariable { kind: &'static str, index: usize },
}
