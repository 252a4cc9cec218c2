use std::fmt;
use std::io;

use keylink_frame::FrameError;
use keylink_session::SessionError;
use keylink_transport::TransportError;

// Process exit codes. Usage and timeout follow sysexits / coreutils.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound | io::ErrorKind::BrokenPipe => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

fn serial_error(context: &str, err: &serialport::Error) -> CliError {
    let code = match err.kind() {
        serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => PERMISSION_DENIED,
        serialport::ErrorKind::InvalidInput => USAGE,
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Open { ref source, .. }
        | TransportError::Configure { ref source, .. } => serial_error(context, source),
        TransportError::Enumerate(ref source) => serial_error(context, source),
        TransportError::Io(source) => io_error(context, source),
        TransportError::Closed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Transport(err) => transport_error(context, err),
        FrameError::InvalidKeyParity { .. } | FrameError::InvalidKey(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::IncompleteFrame { .. } => CliError::new(TIMEOUT, format!("{context}: {err}")),
    }
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Transport(err) => transport_error(context, err),
        SessionError::Frame(err) => frame_error(context, err),
        SessionError::HandshakeTimeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        SessionError::NotSynchronized => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use keylink_frame::ValueKind;

    use super::*;

    #[test]
    fn parity_rejection_is_data_invalid() {
        let err = session_error(
            "send failed",
            SessionError::Frame(FrameError::InvalidKeyParity {
                key: 2,
                kind: ValueKind::Float,
            }),
        );
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.starts_with("send failed: "));
    }

    #[test]
    fn handshake_timeout_is_timeout() {
        let err = session_error(
            "open failed",
            SessionError::HandshakeTimeout(Duration::from_secs(1)),
        );
        assert_eq!(err.code, TIMEOUT);
    }

    #[test]
    fn nested_transport_error_unwraps() {
        let err = session_error(
            "receive failed",
            SessionError::Frame(FrameError::Transport(TransportError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "denied",
            )))),
        );
        assert_eq!(err.code, PERMISSION_DENIED);
    }

    #[test]
    fn missing_device_is_transport_error() {
        let err = transport_error(
            "open failed",
            TransportError::Open {
                port: "/dev/ttyUSB9".to_string(),
                source: serialport::Error::new(serialport::ErrorKind::NoDevice, "no such device"),
            },
        );
        assert_eq!(err.code, TRANSPORT_ERROR);
    }
}
