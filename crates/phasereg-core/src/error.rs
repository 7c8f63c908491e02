use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistrationError {
    #[error("Image sizes differ ({cols1}x{rows1} != {cols2}x{rows2})")]
    SizeMismatch {
        rows1: usize,
        cols1: usize,
        rows2: usize,
        cols2: usize,
    },

    #[error("Invalid image size ({cols}x{rows} != configured {expected_cols}x{expected_rows})")]
    UnexpectedSize {
        rows: usize,
        cols: usize,
        expected_rows: usize,
        expected_cols: usize,
    },

    #[error("Multichannel images are not supported ({channels} channels)")]
    Multichannel { channels: usize },

    #[error("Invalid image dimensions: {cols}x{rows}")]
    InvalidDimensions { rows: usize, cols: usize },

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Wrong optimized parameter count ({got} < {expected})")]
    ParameterCount { got: usize, expected: usize },

    #[error("Reference shift count {reference} differs from calculated shift count {calculated}")]
    ShiftCountMismatch { reference: usize, calculated: usize },

    #[error("Empty image pair set")]
    EmptyPairs,
}

impl RegistrationError {
    /// True for errors caused by the caller's images rather than the configuration.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::SizeMismatch { .. } | Self::UnexpectedSize { .. } | Self::Multichannel { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, RegistrationError>;
