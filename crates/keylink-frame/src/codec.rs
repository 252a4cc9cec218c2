use std::time::Duration;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::Result;
use crate::key::{Key, Payload, Value, ValueKind};

/// Key prefix: 2 bytes, little-endian `u16`.
pub const KEY_SIZE: usize = 2;

/// Frame carrying an integer: key (2) + `i16` (2).
pub const INTEGER_FRAME_SIZE: usize = KEY_SIZE + 2;

/// Frame carrying a float: key (2) + `f32` (4).
pub const FLOAT_FRAME_SIZE: usize = KEY_SIZE + 4;

/// Largest frame on the wire.
pub const MAX_FRAME_SIZE: usize = FLOAT_FRAME_SIZE;

/// Default interval between availability checks while waiting on a partial frame.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Encode a key/value pair into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────────────────────────────┐
/// │ Key (2B LE)  │ Value                                │
/// │              │ even key: i16 (2B LE)                │
/// │              │ odd key:  f32 (4B LE, IEEE-754 bits) │
/// └──────────────┴──────────────────────────────────────┘
/// ```
///
/// Fails without touching `dst` if the key is 0 or its parity does not
/// match the value.
pub fn encode_value(key: u16, value: Value, dst: &mut BytesMut) -> Result<()> {
    let payload = Payload::new(key, value)?;
    encode_payload(&payload, dst);
    Ok(())
}

/// Encode an already validated payload.
pub fn encode_payload(payload: &Payload, dst: &mut BytesMut) {
    dst.reserve(payload.wire_size());
    dst.put_u16_le(payload.key().get());
    match payload.value() {
        Value::Integer(v) => dst.put_i16_le(v),
        Value::Float(v) => dst.put_u32_le(v.to_bits()),
    }
}

/// Encode a key/value pair into a fresh buffer.
pub fn encode(key: u16, value: impl Into<Value>) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(MAX_FRAME_SIZE);
    encode_value(key, value.into(), &mut buf)?;
    Ok(buf.freeze())
}

/// Outcome of decoding from a buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decoded {
    /// A complete frame was consumed.
    Frame(Payload),
    /// A zero key was consumed; nothing was sent.
    NoMessage,
    /// The buffer does not hold a complete frame yet. Nothing was consumed.
    Incomplete,
}

/// Decode one frame from a buffer.
///
/// The buffered counterpart of [`crate::FrameReader`]: callers append bytes
/// as they arrive and call this until it stops yielding frames.
pub fn decode_payload(src: &mut BytesMut) -> Decoded {
    if src.len() < KEY_SIZE {
        return Decoded::Incomplete;
    }

    let raw = u16::from_le_bytes([src[0], src[1]]);
    let Some(key) = Key::new(raw) else {
        src.advance(KEY_SIZE);
        return Decoded::NoMessage;
    };

    let total = KEY_SIZE + key.kind().wire_size();
    if src.len() < total {
        return Decoded::Incomplete;
    }

    src.advance(KEY_SIZE);
    let body = src.split_to(key.kind().wire_size());
    Decoded::Frame(payload_from_body(key, &body))
}

/// Build a payload from the value bytes that followed `key`.
///
/// `body` must hold exactly `key.kind().wire_size()` bytes.
pub(crate) fn payload_from_body(key: Key, mut body: &[u8]) -> Payload {
    let value = match key.kind() {
        ValueKind::Integer => Value::Integer(body.get_i16_le()),
        ValueKind::Float => Value::Float(f32::from_bits(body.get_u32_le())),
    };
    Payload::from_wire(key, value)
}

/// What the reader does when a key has arrived but its value has not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartialFramePolicy {
    /// Wait for the value bytes. A key on the wire means the sender is
    /// mid-frame, so the wait is short in practice. Without a
    /// `partial_timeout` this is a blocking read; a peer that goes away
    /// surfaces as a transport error.
    #[default]
    Block,
    /// Keep what has arrived and return "no message"; the next poll resumes
    /// the same frame.
    Buffer,
}

/// Configuration for frame decoding.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Partial frame handling. Default: [`PartialFramePolicy::Block`].
    pub policy: PartialFramePolicy,
    /// Sleep between availability checks during a bounded partial-frame wait.
    pub poll_interval: Duration,
    /// Upper bound on a blocking partial-frame wait. Default: unbounded.
    pub partial_timeout: Option<Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            policy: PartialFramePolicy::Block,
            poll_interval: DEFAULT_POLL_INTERVAL,
            partial_timeout: None,
        }
    }
}
