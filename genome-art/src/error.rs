//! Error types for rendering.

/// Error types for visualization rendering.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Canvas dimensions are unusable
    #[error("Invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Unknown style name
    #[error("Unknown render style: {0}")]
    UnknownStyle(String),

    /// PNG encoding failed
    #[error("Encoding error: {0}")]
    Encode(String),

    /// Writing the artifact failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
