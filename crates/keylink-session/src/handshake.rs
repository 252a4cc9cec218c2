use std::time::{Duration, Instant};

use keylink_transport::Transport;
use tracing::{debug, trace, warn};

use crate::error::{Result, SessionError};

/// Handshake byte exchanged by both ends (`'$'`).
pub const SENTINEL: u8 = b'$';

/// Default interval between sentinel retransmissions and inbound checks.
pub const DEFAULT_HANDSHAKE_INTERVAL: Duration = Duration::from_millis(100);

/// Which side of the handshake this end plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandshakeRole {
    /// Transmit the sentinel periodically until the peer sends one back.
    /// The microcontroller end of a link.
    #[default]
    Initiator,
    /// Wait for the peer's sentinel, then answer with one.
    /// The host end of a link.
    Responder,
}

impl HandshakeRole {
    pub fn name(self) -> &'static str {
        match self {
            HandshakeRole::Initiator => "initiator",
            HandshakeRole::Responder => "responder",
        }
    }
}

/// Configuration for the sentinel handshake.
#[derive(Debug, Clone)]
pub struct HandshakeConfig {
    pub role: HandshakeRole,
    /// Retransmit / poll interval. Default: 100 ms.
    pub interval: Duration,
    /// Give up after this long. Default: wait forever.
    pub timeout: Option<Duration>,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            role: HandshakeRole::Initiator,
            interval: DEFAULT_HANDSHAKE_INTERVAL,
            timeout: None,
        }
    }
}

/// Result of a successful handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeResult {
    pub role: HandshakeRole,
    /// Sentinels written to the peer.
    pub sentinels_sent: u32,
    /// Inbound bytes thrown away while synchronizing.
    pub discarded: usize,
    pub elapsed: Duration,
}

/// Run the initiator side of the handshake.
///
/// Checks the inbound stream for the sentinel, and if it is not there
/// writes one and sleeps for `config.interval`. Bytes other than the
/// sentinel are discarded. On success exactly one sentinel has been
/// consumed; anything behind it is left for the frame reader.
pub fn establish<T: Transport + ?Sized>(
    transport: &mut T,
    config: &HandshakeConfig,
) -> Result<HandshakeResult> {
    let started = Instant::now();
    let mut sentinels_sent = 0u32;
    let mut discarded = 0usize;

    loop {
        while transport.bytes_available()? > 0 {
            let byte = transport.read_byte()?;
            if byte == SENTINEL {
                debug!(sentinels_sent, discarded, "handshake established");
                return Ok(HandshakeResult {
                    role: HandshakeRole::Initiator,
                    sentinels_sent,
                    discarded,
                    elapsed: started.elapsed(),
                });
            }
            discarded += 1;
            trace!(byte, "discarding non-sentinel byte during handshake");
        }

        check_deadline(started, config.timeout)?;

        transport.write(&[SENTINEL])?;
        transport.flush()?;
        sentinels_sent = sentinels_sent.saturating_add(1);
        std::thread::sleep(config.interval);
    }
}

/// Run the responder side of the handshake.
///
/// Polls every `config.interval` for the peer's sentinel. Once seen, the
/// rest of the inbound buffer is drained (the initiator may have queued
/// several retransmissions) and a single sentinel is written back.
pub fn respond<T: Transport + ?Sized>(
    transport: &mut T,
    config: &HandshakeConfig,
) -> Result<HandshakeResult> {
    let started = Instant::now();
    let mut discarded = 0usize;

    loop {
        let mut seen = false;
        while transport.bytes_available()? > 0 {
            let byte = transport.read_byte()?;
            if byte == SENTINEL {
                seen = true;
                break;
            }
            discarded += 1;
            trace!(byte, "discarding non-sentinel byte during handshake");
        }

        if seen {
            // Nothing but sentinels (or line noise) precedes our answer.
            let extra = transport.bytes_available()?;
            if extra > 0 {
                let mut drain = vec![0u8; extra];
                transport.read_exact(&mut drain)?;
                let stray = drain.iter().filter(|&&b| b != SENTINEL).count();
                if stray > 0 {
                    warn!(stray, "non-sentinel bytes drained during handshake");
                }
                discarded += extra;
            }

            transport.write(&[SENTINEL])?;
            transport.flush()?;
            debug!(discarded, "handshake answered");
            return Ok(HandshakeResult {
                role: HandshakeRole::Responder,
                sentinels_sent: 1,
                discarded,
                elapsed: started.elapsed(),
            });
        }

        check_deadline(started, config.timeout)?;
        std::thread::sleep(config.interval);
    }
}

fn check_deadline(started: Instant, timeout: Option<Duration>) -> Result<()> {
    if let Some(limit) = timeout {
        if started.elapsed() >= limit {
            return Err(SessionError::HandshakeTimeout(limit));
        }
    }
    Ok(())
}
