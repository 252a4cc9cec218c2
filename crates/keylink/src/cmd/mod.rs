use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use keylink_frame::FrameConfig;
use keylink_session::{HandshakeConfig, HandshakeRole, LinkConfig, LinkSession};
use keylink_transport::{SerialTransport, DEFAULT_BAUD_RATE};

use crate::exit::{session_error, transport_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod listen;
pub mod ports;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List serial ports on this host.
    Ports(PortsArgs),
    /// Send a single key/value pair.
    Send(SendArgs),
    /// Listen and print received key/value pairs.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ports(args) => ports::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Handshake side taken by the CLI.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Role {
    /// Send `$` until the device answers.
    Initiator,
    /// Wait for the device's `$` and answer once.
    Responder,
}

impl From<Role> for HandshakeRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Initiator => HandshakeRole::Initiator,
            Role::Responder => HandshakeRole::Responder,
        }
    }
}

/// Options shared by every command that opens a link.
#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Serial device (e.g. /dev/ttyUSB0, COM3).
    #[arg(env = "KEYLINK_PORT")]
    pub port: String,
    /// Line rate.
    #[arg(long, env = "KEYLINK_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Handshake side. The device usually initiates, so the host responds.
    #[arg(long, value_enum, default_value = "responder")]
    pub role: Role,
    /// Give up if the handshake has not completed (e.g. 10s, 500ms). 0 waits forever.
    #[arg(long, default_value = "10s")]
    pub handshake_timeout: String,
}

impl LinkArgs {
    pub fn link_config(&self, frame: FrameConfig) -> CliResult<LinkConfig> {
        let timeout = parse_duration(&self.handshake_timeout)?;
        Ok(LinkConfig {
            baud_rate: self.baud,
            handshake: HandshakeConfig {
                role: self.role.into(),
                timeout: (!timeout.is_zero()).then_some(timeout),
                ..HandshakeConfig::default()
            },
            frame,
        })
    }
}

/// Open the serial device and run the handshake.
pub fn open_link(
    args: &LinkArgs,
    frame: FrameConfig,
) -> CliResult<LinkSession<SerialTransport>> {
    let config = args.link_config(frame)?;
    let port = SerialTransport::open(&args.port, args.baud)
        .map_err(|err| transport_error("open failed", err))?;
    LinkSession::open_with_config(port, config).map_err(|err| session_error("handshake failed", err))
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Key to send under. Even keys carry integers, odd keys floats.
    #[arg(long, short = 'k')]
    pub key: u16,
    /// Value to send (parsed as i16 for even keys, f32 for odd keys).
    #[arg(long, short = 'v', allow_hyphen_values = true)]
    pub value: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Filter to specific keys (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub keys: Option<Vec<u16>>,
    /// Exit after receiving N payloads.
    #[arg(long)]
    pub count: Option<usize>,
    /// Sleep between polls of an idle line (e.g. 10ms).
    #[arg(long, default_value = "10ms")]
    pub poll: String,
    /// Return to the poll loop instead of waiting when a frame arrives split.
    #[arg(long)]
    pub buffer_partial: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `500ms`, `5s` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(timeout: &str) -> LinkArgs {
        LinkArgs {
            port: "/dev/ttyUSB0".to_string(),
            baud: 9_600,
            role: Role::Initiator,
            handshake_timeout: timeout.to_string(),
        }
    }

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        let err = parse_duration("bad").unwrap_err();
        assert_eq!(err.code, USAGE);
        assert!(parse_duration("").is_err());
        assert!(parse_duration("-1s").is_err());
    }

    #[test]
    fn link_config_carries_flags() {
        let config = link("250ms").link_config(FrameConfig::default()).unwrap();
        assert_eq!(config.baud_rate, 9_600);
        assert_eq!(config.handshake.role, HandshakeRole::Initiator);
        assert_eq!(config.handshake.timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn zero_handshake_timeout_waits_forever() {
        let config = link("0s").link_config(FrameConfig::default()).unwrap();
        assert!(config.handshake.timeout.is_none());
    }
}
