use crate::key::ValueKind;

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The key's parity does not match the value type.
    #[error("key {key} cannot carry a {kind} value (even keys carry integers, odd keys floats)")]
    InvalidKeyParity { key: u16, kind: ValueKind },

    /// The key is reserved and cannot be sent.
    #[error("key {0} is reserved")]
    InvalidKey(u16),

    /// A key arrived but its value did not follow within the partial-frame timeout.
    #[error("incomplete frame for key {key} ({available} of {expected} value bytes available)")]
    IncompleteFrame {
        key: u16,
        expected: usize,
        available: usize,
    },

    /// The underlying transport failed.
    #[error("frame transport error: {0}")]
    Transport(#[from] keylink_transport::TransportError),
}

impl FrameError {
    /// Whether the error is a parity or reserved-key rejection raised before any I/O.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            FrameError::InvalidKeyParity { .. } | FrameError::InvalidKey(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
