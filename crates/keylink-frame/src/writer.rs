use bytes::BytesMut;
use keylink_transport::Transport;
use tracing::debug;

use crate::codec::{encode_payload, MAX_FRAME_SIZE};
use crate::error::Result;
use crate::key::{Payload, Value};

/// Writes complete frames to a transport.
///
/// Each frame goes out in a single `write` call followed by a flush.
#[derive(Debug)]
pub struct FrameWriter {
    buf: BytesMut,
}

impl FrameWriter {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(MAX_FRAME_SIZE),
        }
    }

    /// Validate, encode and send a value under `key`.
    ///
    /// Parity or reserved-key violations are reported before the transport
    /// is touched.
    pub fn send<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        key: u16,
        value: impl Into<Value>,
    ) -> Result<()> {
        let payload = Payload::new(key, value)?;
        self.write_payload(transport, &payload)
    }

    /// Write a complete frame (blocking).
    pub fn write_payload<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        payload: &Payload,
    ) -> Result<()> {
        self.buf.clear();
        encode_payload(payload, &mut self.buf);

        transport.write(&self.buf)?;
        transport.flush()?;
        debug!(key = payload.key().get(), value = %payload.value(), "frame sent");
        Ok(())
    }
}

impl Default for FrameWriter {
    fn default() -> Self {
        Self::new()
    }
}
