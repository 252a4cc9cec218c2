use std::time::Instant;

use bytes::BytesMut;
use keylink_transport::Transport;
use tracing::{debug, trace};

use crate::codec::{payload_from_body, FrameConfig, PartialFramePolicy, KEY_SIZE, MAX_FRAME_SIZE};
use crate::error::{FrameError, Result};
use crate::key::{Key, Payload};

/// Polls a transport for complete frames.
///
/// A poll never blocks waiting for a key: with fewer than two bytes
/// buffered it returns `Ok(None)`. Once a key has been read, the value is
/// handled according to the configured [`PartialFramePolicy`].
#[derive(Debug)]
pub struct FrameReader {
    config: FrameConfig,
    pending_key: Option<Key>,
    body: BytesMut,
}

impl FrameReader {
    /// Create a new frame reader with default configuration.
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            config,
            pending_key: None,
            body: BytesMut::with_capacity(MAX_FRAME_SIZE),
        }
    }

    /// Read the next frame if one is available.
    ///
    /// Returns `Ok(None)` when no key is buffered, when the key is the
    /// reserved 0, or (with [`PartialFramePolicy::Buffer`]) when the value
    /// is still in flight.
    pub fn poll<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<Option<Payload>> {
        let key = match self.pending_key {
            Some(key) => key,
            None => match self.read_key(transport)? {
                Some(key) => key,
                None => return Ok(None),
            },
        };

        let needed = key.kind().wire_size();
        match self.config.policy {
            PartialFramePolicy::Block => {
                let missing = needed - self.body.len();
                self.wait_for(transport, key, missing)?;
                self.take(transport, missing)?;
            }
            PartialFramePolicy::Buffer => {
                let missing = needed - self.body.len();
                let ready = transport.bytes_available()?.min(missing);
                self.take(transport, ready)?;
                if self.body.len() < needed {
                    trace!(key = key.get(), have = self.body.len(), needed, "partial frame buffered");
                    self.pending_key = Some(key);
                    return Ok(None);
                }
            }
        }

        self.pending_key = None;
        let payload = payload_from_body(key, &self.body);
        self.body.clear();
        debug!(key = key.get(), value = %payload.value(), "frame received");
        Ok(Some(payload))
    }

    /// Whether a key has been read and its value is still awaited.
    pub fn has_partial_frame(&self) -> bool {
        self.pending_key.is_some()
    }

    /// Drop a buffered partial frame.
    pub fn reset(&mut self) {
        self.pending_key = None;
        self.body.clear();
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    fn read_key<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<Option<Key>> {
        if transport.bytes_available()? < KEY_SIZE {
            return Ok(None);
        }

        let mut raw = [0u8; KEY_SIZE];
        transport.read_exact(&mut raw)?;
        let key = Key::new(u16::from_le_bytes(raw));
        if key.is_none() {
            trace!("zero key read, no message");
        }
        Ok(key)
    }

    /// Wait until `missing` value bytes are buffered.
    ///
    /// Unbounded waits are left to the blocking `read_exact` that follows,
    /// which also reports a peer that hangs up mid-frame.
    fn wait_for<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        key: Key,
        missing: usize,
    ) -> Result<()> {
        let Some(limit) = self.config.partial_timeout else {
            return Ok(());
        };

        let started = Instant::now();
        loop {
            let available = transport.bytes_available()?;
            if available >= missing {
                return Ok(());
            }
            if started.elapsed() >= limit {
                return Err(FrameError::IncompleteFrame {
                    key: key.get(),
                    expected: missing,
                    available,
                });
            }
            std::thread::sleep(self.config.poll_interval);
        }
    }

    fn take<T: Transport + ?Sized>(&mut self, transport: &mut T, count: usize) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let mut chunk = [0u8; MAX_FRAME_SIZE];
        transport.read_exact(&mut chunk[..count])?;
        self.body.extend_from_slice(&chunk[..count]);
        Ok(())
    }
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use keylink_transport::{pair, MemoryTransport, TransportError};

    use super::*;
    use crate::codec::encode;
    use crate::key::Value;

    #[test]
    fn empty_stream_is_no_message() {
        let (_left, mut right) = pair();
        let mut reader = FrameReader::new();
        assert!(reader.poll(&mut right).unwrap().is_none());
    }

    #[test]
    fn read_integer_frame() {
        let (mut left, mut right) = pair();
        left.write(&encode(2, 300i16).unwrap()).unwrap();

        let mut reader = FrameReader::new();
        let payload = reader.poll(&mut right).unwrap().unwrap();
        assert_eq!(payload.key().get(), 2);
        assert_eq!(payload.value(), Value::Integer(300));
        assert_eq!(right.bytes_available().unwrap(), 0);
    }

    #[test]
    fn read_float_frame() {
        let (mut left, mut right) = pair();
        left.write(&encode(3, 1.5f32).unwrap()).unwrap();

        let mut reader = FrameReader::new();
        let payload = reader.poll(&mut right).unwrap().unwrap();
        assert_eq!(payload.key().get(), 3);
        assert_eq!(payload.value(), Value::Float(1.5));
    }

    #[test]
    fn read_multiple_frames() {
        let (mut left, mut right) = pair();
        left.write(&encode(2, 1i16).unwrap()).unwrap();
        left.write(&encode(5, 2.0f32).unwrap()).unwrap();
        left.write(&encode(8, 3i16).unwrap()).unwrap();

        let mut reader = FrameReader::new();
        let keys: Vec<u16> = (0..3)
            .map(|_| reader.poll(&mut right).unwrap().unwrap().key().get())
            .collect();
        assert_eq!(keys, vec![2, 5, 8]);
        assert!(reader.poll(&mut right).unwrap().is_none());
    }

    #[test]
    fn single_key_byte_does_not_block() {
        let (mut left, mut right) = pair();
        left.write(&[0x02]).unwrap();

        let mut reader = FrameReader::new();
        assert!(reader.poll(&mut right).unwrap().is_none());
        // The lone byte stays on the wire for the next poll.
        assert_eq!(right.bytes_available().unwrap(), 1);

        left.write(&[0x00, 0x07, 0x00]).unwrap();
        let payload = reader.poll(&mut right).unwrap().unwrap();
        assert_eq!(payload.value(), Value::Integer(7));
    }

    #[test]
    fn zero_key_is_no_message() {
        let (mut left, mut right) = pair();
        left.write(&[0x00, 0x00]).unwrap();

        let mut reader = FrameReader::new();
        assert!(reader.poll(&mut right).unwrap().is_none());
        assert_eq!(right.bytes_available().unwrap(), 0);
    }

    #[test]
    fn block_policy_waits_for_value() {
        let (mut left, mut right) = pair();
        left.write(&[0x03, 0x00]).unwrap();

        let sender = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            left.write(&2.5f32.to_le_bytes()).unwrap();
            left
        });

        let cfg = FrameConfig {
            poll_interval: Duration::from_millis(1),
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(cfg);
        let payload = reader.poll(&mut right).unwrap().unwrap();
        assert_eq!(payload.value(), Value::Float(2.5));
        let _left = sender.join().unwrap();
    }

    #[test]
    fn block_policy_times_out() {
        let (mut left, mut right) = pair();
        left.write(&[0x03, 0x00, 0xAA]).unwrap();

        let cfg = FrameConfig {
            poll_interval: Duration::from_millis(1),
            partial_timeout: Some(Duration::from_millis(20)),
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(cfg);
        let err = reader.poll(&mut right).unwrap_err();
        assert!(matches!(
            err,
            FrameError::IncompleteFrame {
                key: 3,
                expected: 4,
                available: 1
            }
        ));
    }

    #[test]
    fn buffer_policy_resumes_split_frame() {
        let (mut left, mut right) = pair();
        let wire = encode(9, -4.0f32).unwrap();
        left.write(&wire[..3]).unwrap();

        let cfg = FrameConfig {
            policy: PartialFramePolicy::Buffer,
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(cfg);

        assert!(reader.poll(&mut right).unwrap().is_none());
        assert!(reader.has_partial_frame());
        assert!(reader.poll(&mut right).unwrap().is_none());

        left.write(&wire[3..]).unwrap();
        let payload = reader.poll(&mut right).unwrap().unwrap();
        assert_eq!(payload.key().get(), 9);
        assert_eq!(payload.value(), Value::Float(-4.0));
        assert!(!reader.has_partial_frame());
    }

    #[test]
    fn reset_discards_partial_frame() {
        let (mut left, mut right) = pair();
        left.write(&[0x04, 0x00]).unwrap();

        let cfg = FrameConfig {
            policy: PartialFramePolicy::Buffer,
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(cfg);
        assert!(reader.poll(&mut right).unwrap().is_none());
        assert!(reader.has_partial_frame());

        reader.reset();
        assert!(!reader.has_partial_frame());
    }

    #[test]
    fn timed_out_frame_is_dropped() {
        let (mut left, mut right) = pair();
        left.write(&[0x02, 0x00, 0x01]).unwrap();

        let cfg = FrameConfig {
            poll_interval: Duration::from_millis(1),
            partial_timeout: Some(Duration::from_millis(10)),
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(cfg);
        let err = reader.poll(&mut right).unwrap_err();
        assert!(matches!(err, FrameError::IncompleteFrame { key: 2, .. }));
        assert!(!reader.has_partial_frame());

        // The stray value byte is now the only thing buffered.
        assert!(reader.poll(&mut right).unwrap().is_none());
        assert_eq!(right.bytes_available().unwrap(), 1);
    }

    /// Run `poll` on another thread so a hang fails the test instead of stalling it.
    fn poll_within(
        mut transport: MemoryTransport,
        config: FrameConfig,
    ) -> Result<Option<Payload>> {
        let (done, outcome) = mpsc::channel();
        thread::spawn(move || {
            let mut reader = FrameReader::with_config(config);
            let _ = done.send(reader.poll(&mut transport));
        });
        outcome
            .recv_timeout(Duration::from_secs(2))
            .expect("poll should return once the peer is gone")
    }

    #[test]
    fn peer_dropped_after_key_fails_blocking_wait() {
        let (mut left, right) = pair();
        left.write(&[0x02, 0x00]).unwrap();
        drop(left);

        let err = poll_within(right, FrameConfig::default()).unwrap_err();
        assert!(matches!(err, FrameError::Transport(TransportError::Closed)));
    }

    #[test]
    fn peer_dropped_mid_value_fails_blocking_wait() {
        let (mut left, right) = pair();
        left.write(&[0x03, 0x00, 0x00, 0x00]).unwrap();
        drop(left);

        let err = poll_within(right, FrameConfig::default()).unwrap_err();
        assert!(matches!(err, FrameError::Transport(TransportError::Closed)));
    }

    #[test]
    fn peer_dropped_during_timed_wait_is_reported() {
        let (mut left, right) = pair();
        left.write(&[0x02, 0x00]).unwrap();
        drop(left);

        let cfg = FrameConfig {
            poll_interval: Duration::from_millis(1),
            partial_timeout: Some(Duration::from_secs(30)),
            ..FrameConfig::default()
        };
        let err = poll_within(right, cfg).unwrap_err();
        assert!(matches!(err, FrameError::Transport(TransportError::Closed)));
    }

    #[test]
    fn closed_transport_surfaces_as_transport_error() {
        let mut reader = FrameReader::new();
        let mut transport = ClosedTransport;
        let err = reader.poll(&mut transport).unwrap_err();
        assert!(matches!(err, FrameError::Transport(TransportError::Closed)));
    }

    struct ClosedTransport;

    impl Transport for ClosedTransport {
        fn configure(&mut self, _baud_rate: u32) -> keylink_transport::Result<()> {
            Ok(())
        }

        fn write(&mut self, _bytes: &[u8]) -> keylink_transport::Result<()> {
            Err(TransportError::Closed)
        }

        fn bytes_available(&mut self) -> keylink_transport::Result<usize> {
            Err(TransportError::Closed)
        }

        fn read_exact(&mut self, _buf: &mut [u8]) -> keylink_transport::Result<()> {
            Err(TransportError::Closed)
        }
    }
}
