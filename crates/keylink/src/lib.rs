//! Typed key/value telemetry over a serial line.
//!
//! keylink moves single scalar readings between a microcontroller and a
//! host. Each frame is a 16-bit key followed by either an `i16` (even key)
//! or an `f32` (odd key); the key's parity is the only type tag. A `'$'`
//! handshake makes sure both ends are listening before data flows.
//!
//! # Crate Structure
//!
//! - [`transport`]: Byte channel abstraction (serial port, in-memory pipe)
//! - [`frame`]: Key/value codec and transport-backed frame reader/writer
//! - [`session`]: Handshake and synchronized link sessions
//!
//! # Example
//!
//! ```no_run
//! use keylink::session::LinkSession;
//! use keylink::transport::SerialTransport;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let port = SerialTransport::open("/dev/ttyUSB0", 19_200)?;
//! let mut link = LinkSession::open(port)?;
//!
//! link.send(21.5f32, 1)?;
//! if let Some(payload) = link.receive()? {
//!     println!("{payload}");
//! }
//! # Ok(())
//! # }
//! ```

/// Re-export transport types.
pub mod transport {
    pub use keylink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use keylink_frame::*;
}

/// Re-export session types.
pub mod session {
    pub use keylink_session::*;
}
