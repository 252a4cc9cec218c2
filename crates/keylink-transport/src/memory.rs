use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Create two connected in-memory transports.
///
/// Bytes written to one end become readable on the other. Either end may
/// be moved to another thread, which makes the pair a stand-in for a
/// serial cable in tests and demos.
pub fn pair() -> (MemoryTransport, MemoryTransport) {
    let left_to_right = Arc::new(Pipe::default());
    let right_to_left = Arc::new(Pipe::default());

    let left = MemoryTransport {
        rx: Arc::clone(&right_to_left),
        tx: Arc::clone(&left_to_right),
        baud_rate: None,
    };
    let right = MemoryTransport {
        rx: left_to_right,
        tx: right_to_left,
        baud_rate: None,
    };
    (left, right)
}

#[derive(Default)]
struct Pipe {
    state: Mutex<PipeState>,
    ready: Condvar,
}

#[derive(Default)]
struct PipeState {
    buf: VecDeque<u8>,
    closed: bool,
}

impl Pipe {
    fn lock(&self) -> MutexGuard<'_, PipeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn close(&self) {
        self.lock().closed = true;
        self.ready.notify_all();
    }
}

/// One end of an in-memory duplex byte channel. See [`pair`].
pub struct MemoryTransport {
    rx: Arc<Pipe>,
    tx: Arc<Pipe>,
    baud_rate: Option<u32>,
}

impl MemoryTransport {
    /// The line rate most recently applied with [`Transport::configure`].
    pub fn baud_rate(&self) -> Option<u32> {
        self.baud_rate
    }

    /// Bytes written by the other end that have not been read yet.
    pub fn pending(&self) -> Vec<u8> {
        self.rx.lock().buf.iter().copied().collect()
    }
}

impl Transport for MemoryTransport {
    fn transport_name(&self) -> &'static str {
        "memory"
    }

    fn configure(&mut self, baud_rate: u32) -> Result<()> {
        self.baud_rate = Some(baud_rate);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = self.tx.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        state.buf.extend(bytes.iter().copied());
        drop(state);
        self.tx.ready.notify_all();
        trace!(len = bytes.len(), "memory transport write");
        Ok(())
    }

    fn bytes_available(&mut self) -> Result<usize> {
        let state = self.rx.lock();
        // Buffered bytes stay readable after the peer hangs up.
        if state.closed && state.buf.is_empty() {
            return Err(TransportError::Closed);
        }
        Ok(state.buf.len())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut state = self.rx.lock();
        while state.buf.len() < buf.len() {
            if state.closed {
                return Err(TransportError::Closed);
            }
            state = self
                .rx
                .ready
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        let wanted = buf.len();
        for (slot, byte) in buf.iter_mut().zip(state.buf.drain(..wanted)) {
            *slot = byte;
        }
        Ok(())
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        // Peer reads drain what is buffered, then observe the close.
        self.tx.close();
        self.rx.close();
    }
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("baud_rate", &self.baud_rate)
            .field("pending", &self.rx.lock().buf.len())
            .finish()
    }
}
