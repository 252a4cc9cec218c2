/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the named serial device.
    #[cfg(feature = "serial")]
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        source: serialport::Error,
    },

    /// Failed to apply the requested line rate.
    #[cfg(feature = "serial")]
    #[error("failed to configure {baud} baud: {source}")]
    Configure {
        baud: u32,
        source: serialport::Error,
    },

    /// Failed to enumerate serial devices.
    #[cfg(feature = "serial")]
    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(serialport::Error),

    /// An I/O error occurred on the byte channel.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote end of the channel has gone away.
    #[error("transport closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
