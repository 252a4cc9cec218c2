//! Handshake and link session management for keylink.
//!
//! This is the "just works" layer. Hand it a transport, it synchronizes
//! with the other end, then sends and polls for key/value payloads.

pub mod error;
pub mod handshake;
pub mod session;

pub use error::{Result, SessionError};
pub use handshake::{
    establish, respond, HandshakeConfig, HandshakeResult, HandshakeRole,
    DEFAULT_HANDSHAKE_INTERVAL, SENTINEL,
};
pub use session::{LinkConfig, LinkSession, CLOSE_NOTIFY};
