//! Duplex byte-channel abstraction for keylink.
//!
//! The link protocol only needs a handful of primitives from the wire:
//! - configure the line rate
//! - write a byte slice
//! - ask how many inbound bytes are buffered
//! - read an exact number of bytes
//!
//! This is the lowest layer of keylink. Everything else builds on top of
//! the [`Transport`] trait provided here.

pub mod error;
pub mod memory;
pub mod traits;

#[cfg(feature = "serial")]
pub mod serial;

pub use error::{Result, TransportError};
pub use memory::{pair, MemoryTransport};
pub use traits::{Transport, DEFAULT_BAUD_RATE};

#[cfg(feature = "serial")]
pub use serial::{PortInfo, SerialTransport};
