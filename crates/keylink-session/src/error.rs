/// Errors that can occur in link session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] keylink_transport::TransportError),

    /// Frame-level error (including key parity rejections).
    #[error("frame error: {0}")]
    Frame(#[from] keylink_frame::FrameError),

    /// The peer did not answer the handshake in time.
    #[error("handshake timed out after {0:?}")]
    HandshakeTimeout(std::time::Duration),

    /// A previous transport failure broke synchronization; re-open the link.
    #[error("link is not synchronized")]
    NotSynchronized,
}

impl SessionError {
    /// Lift a frame error, surfacing transport failures at this level.
    pub(crate) fn from_frame(err: keylink_frame::FrameError) -> Self {
        match err {
            keylink_frame::FrameError::Transport(err) => SessionError::Transport(err),
            other => SessionError::Frame(other),
        }
    }

    /// Whether the error was a key parity or reserved-key rejection.
    pub fn is_invalid_key(&self) -> bool {
        matches!(self, SessionError::Frame(err) if err.is_validation())
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
