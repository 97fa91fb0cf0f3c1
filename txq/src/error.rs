use std::fmt;

#[derive(Debug)]
pub enum ContextError {
    InvalidDimensions { width: usize, height: usize },
    UnsupportedPlaneCount { planes: usize },
    InvalidSegment { segment: u8 },
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextError::InvalidDimensions { width, height } => {
                write!(
                    f,
                    "invalid block dimensions {}x{}: must match a supported block size",
                    width, height
                )
            }
            ContextError::UnsupportedPlaneCount { planes } => {
                write!(f, "unsupported plane count {}: must be 1 or 3", planes)
            }
            ContextError::InvalidSegment { segment } => {
                write!(f, "segment id {} out of range", segment)
            }
        }
    }
}

impl std::error::Error for ContextError {}
