use keylink_frame::{FrameConfig, FrameReader, FrameWriter, Payload, Value};
use keylink_transport::{Transport, TransportError, DEFAULT_BAUD_RATE};
use tracing::{debug, info, warn};

use crate::error::{Result, SessionError};
use crate::handshake::{establish, respond, HandshakeConfig, HandshakeResult, HandshakeRole};

/// Byte written by [`LinkSession::close`] to tell the peer the host is going away.
pub const CLOSE_NOTIFY: u8 = 0x00;

/// Configuration for opening a link session.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Line rate applied before the handshake. Default: 19200.
    pub baud_rate: u32,
    pub handshake: HandshakeConfig,
    pub frame: FrameConfig,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            handshake: HandshakeConfig::default(),
            frame: FrameConfig::default(),
        }
    }
}

/// A synchronized link over an exclusively owned transport.
///
/// Constructing a session blocks until the handshake completes. After
/// that, [`send`](Self::send) writes one frame per call and
/// [`receive`](Self::receive) polls for the next one without blocking on
/// an empty line.
pub struct LinkSession<T: Transport> {
    transport: T,
    reader: FrameReader,
    writer: FrameWriter,
    config: LinkConfig,
    handshake: HandshakeResult,
    synchronized: bool,
}

impl<T: Transport> LinkSession<T> {
    /// Configure `transport` at 19200 baud and run the initiator handshake.
    pub fn open(transport: T) -> Result<Self> {
        Self::open_with_config(transport, LinkConfig::default())
    }

    /// Open with explicit line rate, handshake role and frame policy.
    pub fn open_with_config(mut transport: T, config: LinkConfig) -> Result<Self> {
        transport.configure(config.baud_rate)?;

        let handshake = match config.handshake.role {
            HandshakeRole::Initiator => establish(&mut transport, &config.handshake)?,
            HandshakeRole::Responder => respond(&mut transport, &config.handshake)?,
        };

        info!(
            transport = transport.transport_name(),
            role = handshake.role.name(),
            baud = config.baud_rate,
            sentinels = handshake.sentinels_sent,
            elapsed_ms = handshake.elapsed.as_millis() as u64,
            "link synchronized"
        );

        Ok(Self {
            transport,
            reader: FrameReader::with_config(config.frame.clone()),
            writer: FrameWriter::new(),
            config,
            handshake,
            synchronized: true,
        })
    }

    /// Send `value` under `key`.
    ///
    /// Key range and parity are checked first; a rejected pair never
    /// reaches the transport.
    pub fn send(&mut self, value: impl Into<Value>, key: u16) -> Result<()> {
        let payload = Payload::new(key, value)?;
        self.send_payload(&payload)
    }

    /// Send an already validated payload.
    pub fn send_payload(&mut self, payload: &Payload) -> Result<()> {
        self.ensure_synchronized()?;
        let outcome = self.writer.write_payload(&mut self.transport, payload);
        self.track(outcome)
    }

    /// Poll for the next payload.
    ///
    /// `Ok(None)` means nothing complete is on the line (including the
    /// reserved zero key).
    pub fn receive(&mut self) -> Result<Option<Payload>> {
        self.ensure_synchronized()?;
        let outcome = self.reader.poll(&mut self.transport);
        self.track(outcome)
    }

    /// Whether the handshake completed and no transport failure has occurred since.
    pub fn is_synchronized(&self) -> bool {
        self.synchronized
    }

    /// Outcome of the opening handshake.
    pub fn handshake(&self) -> &HandshakeResult {
        &self.handshake
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Notify the peer with [`CLOSE_NOTIFY`] and hand the transport back.
    ///
    /// A session that already lost synchronization skips the notification.
    pub fn close(mut self) -> Result<T> {
        if self.synchronized {
            self.transport.write(&[CLOSE_NOTIFY])?;
            self.transport.flush()?;
            debug!("close notification sent");
        }
        info!("link closed");
        Ok(self.transport)
    }

    /// Hand the transport back without notifying the peer.
    pub fn into_transport(self) -> T {
        self.transport
    }

    fn ensure_synchronized(&self) -> Result<()> {
        if self.synchronized {
            Ok(())
        } else {
            Err(SessionError::NotSynchronized)
        }
    }

    fn track<R>(&mut self, outcome: keylink_frame::Result<R>) -> Result<R> {
        outcome.map_err(|err| {
            let err = SessionError::from_frame(err);
            if let SessionError::Transport(ref cause) = err {
                self.mark_desynchronized(cause);
            }
            err
        })
    }

    fn mark_desynchronized(&mut self, cause: &TransportError) {
        if self.synchronized {
            warn!(error = %cause, "transport failed, link no longer synchronized");
        }
        self.synchronized = false;
        self.reader.reset();
    }
}

impl<T: Transport> std::fmt::Debug for LinkSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSession")
            .field("transport", &self.transport.transport_name())
            .field("synchronized", &self.synchronized)
            .field("role", &self.handshake.role)
            .field("baud_rate", &self.config.baud_rate)
            .field("partial_frame", &self.reader.has_partial_frame())
            .finish()
    }
}
