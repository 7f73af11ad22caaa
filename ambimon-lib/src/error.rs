use crate::packet::PacketType;
use thiserror::Error;

/// The primary error type for the `ambimon-lib` library.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmbimonError {
    #[error("Frame length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Unexpected packet type at this stage: {0}")]
    UnexpectedPacketType(PacketType),

    #[error("Corrupt packet header (CRC mismatch), frame cannot be processed")]
    CorruptHeader,

    #[error("Device id {0} is outside the supported range")]
    InvalidDeviceId(u8),

    #[error("Message serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AmbimonError {
    fn from(err: serde_json::Error) -> Self {
        AmbimonError::Serialization(err.to_string())
    }
}
