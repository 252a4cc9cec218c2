//! Key-parity typed frame codec for keylink.
//!
//! Every frame is a 2-byte little-endian key followed by a value whose type
//! is implied by the key:
//! - even key: 2-byte little-endian `i16`
//! - odd key: 4-byte little-endian IEEE-754 `f32`
//!
//! There is no length field, tag byte or checksum. Key 0 is reserved and
//! means "no message".

pub mod codec;
pub mod error;
pub mod key;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_payload, encode, encode_payload, encode_value, Decoded, FrameConfig,
    PartialFramePolicy, DEFAULT_POLL_INTERVAL, FLOAT_FRAME_SIZE, INTEGER_FRAME_SIZE, KEY_SIZE,
    MAX_FRAME_SIZE,
};
pub use error::{FrameError, Result};
pub use key::{Key, Payload, Value, ValueKind};
pub use reader::FrameReader;
pub use writer::FrameWriter;
