use keylink_frame::{FrameConfig, Key, Payload, Value};

use crate::cmd::{open_link, SendArgs};
use crate::exit::{frame_error, session_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_payload, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    // Reject bad input before touching the device.
    let payload = parse_payload(args.key, &args.value)?;

    let mut link = open_link(&args.link, FrameConfig::default())?;
    link.send_payload(&payload)
        .map_err(|err| session_error("send failed", err))?;
    print_payload("sent", &args.link.port, &payload, format);

    link.close()
        .map_err(|err| session_error("close failed", err))?;
    Ok(SUCCESS)
}

/// Build a payload from a key and its textual value, choosing the value
/// type from the key's parity.
fn parse_payload(key: u16, raw: &str) -> CliResult<Payload> {
    let Some(parsed) = Key::new(key) else {
        return Err(frame_error(
            "invalid key",
            keylink_frame::FrameError::InvalidKey(key),
        ));
    };

    let raw = raw.trim();
    let value = if parsed.is_integer() {
        raw.parse::<i16>().map(Value::Integer).map_err(|err| {
            CliError::new(
                DATA_INVALID,
                format!("key {key} carries an integer; cannot parse {raw:?}: {err}"),
            )
        })?
    } else {
        raw.parse::<f32>().map(Value::Float).map_err(|err| {
            CliError::new(
                DATA_INVALID,
                format!("key {key} carries a float; cannot parse {raw:?}: {err}"),
            )
        })?
    };

    Payload::new(key, value).map_err(|err| frame_error("invalid payload", err))
}
