//! # Volume Errors

use thiserror::Error;

/// Result type for volume reference operations
pub type VolumeResult<T> = Result<T, VolumeError>;

/// Volume reference errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VolumeError {
    /// The volume is being removed and hands out no new references
    #[error("Volume closed: {0}")]
    VolumeClosed(String),

    /// More references were released than obtained
    #[error("Reference count underflow on volume: {0}")]
    ReferenceUnderflow(String),
}

impl VolumeError {
    /// Identifier of the volume the error concerns
    pub fn volume_id(&self) -> &str {
        match self {
            VolumeError::VolumeClosed(id) | VolumeError::ReferenceUnderflow(id) => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = VolumeError::VolumeClosed("vol-0".into());
        assert_eq!(err.to_string(), "Volume closed: vol-0");
        assert_eq!(err.volume_id(), "vol-0");
    }
}
