//! Keys, values and the payloads that pair them.
//!
//! A key's parity is the only type information on the wire. The parity is
//! read once, when a [`Payload`] is built, and carried as a [`Value`]
//! variant from then on.

use std::fmt;
use std::num::NonZeroU16;

use crate::error::{FrameError, Result};

/// A non-zero 16-bit frame key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(NonZeroU16);

impl Key {
    /// Create a key. Returns `None` for the reserved key 0.
    pub const fn new(raw: u16) -> Option<Self> {
        match NonZeroU16::new(raw) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    /// The raw key value.
    pub const fn get(self) -> u16 {
        self.0.get()
    }

    /// The value type this key carries.
    pub const fn kind(self) -> ValueKind {
        if self.get() % 2 == 0 {
            ValueKind::Integer
        } else {
            ValueKind::Float
        }
    }

    pub const fn is_integer(self) -> bool {
        matches!(self.kind(), ValueKind::Integer)
    }

    pub const fn is_float(self) -> bool {
        matches!(self.kind(), ValueKind::Float)
    }
}

impl TryFrom<u16> for Key {
    type Error = FrameError;

    fn try_from(raw: u16) -> Result<Self> {
        Key::new(raw).ok_or(FrameError::InvalidKey(raw))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Value type selected by key parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Even keys: little-endian `i16`.
    Integer,
    /// Odd keys: little-endian IEEE-754 `f32`.
    Float,
}

impl ValueKind {
    /// Number of value bytes following the key on the wire.
    pub const fn wire_size(self) -> usize {
        match self {
            ValueKind::Integer => 2,
            ValueKind::Float => 4,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A scalar telemetry value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Integer(i16),
    Float(f32),
}

impl Value {
    pub const fn kind(&self) -> ValueKind {
        match self {
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
        }
    }

    pub const fn as_integer(&self) -> Option<i16> {
        match self {
            Value::Integer(v) => Some(*v),
            Value::Float(_) => None,
        }
    }

    pub const fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(_) => None,
        }
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Value::Integer(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
        }
    }
}

/// A key paired with a value of the type its parity demands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Payload {
    key: Key,
    value: Value,
}

impl Payload {
    /// Pair a raw key with a value, checking range and parity.
    pub fn new(key: u16, value: impl Into<Value>) -> Result<Self> {
        let value = value.into();
        let key = Key::try_from(key)?;
        if key.kind() != value.kind() {
            return Err(FrameError::InvalidKeyParity {
                key: key.get(),
                kind: value.kind(),
            });
        }
        Ok(Self { key, value })
    }

    /// An integer payload. `key` must be even.
    pub fn integer(key: u16, value: i16) -> Result<Self> {
        Self::new(key, value)
    }

    /// A float payload. `key` must be odd.
    pub fn float(key: u16, value: f32) -> Result<Self> {
        Self::new(key, value)
    }

    /// Built by the decoder, where the value was read according to `key.kind()`.
    pub(crate) fn from_wire(key: Key, value: Value) -> Self {
        debug_assert_eq!(key.kind(), value.kind());
        Self { key, value }
    }

    pub fn key(&self) -> Key {
        self.key
    }

    pub fn value(&self) -> Value {
        self.value
    }

    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }

    /// Encoded size of this payload in bytes (4 or 6).
    pub fn wire_size(&self) -> usize {
        crate::codec::KEY_SIZE + self.kind().wire_size()
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}
