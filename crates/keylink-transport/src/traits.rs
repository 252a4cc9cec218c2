use crate::error::Result;

/// Line rate used by both ends of the link unless configured otherwise.
pub const DEFAULT_BAUD_RATE: u32 = 19_200;

/// A duplex byte channel the link protocol runs over.
///
/// Implementations are expected to be exclusively owned by one session;
/// sharing a channel between several readers or writers corrupts framing.
pub trait Transport {
    /// Short backend name for diagnostics (`serial`, `memory`, ...).
    fn transport_name(&self) -> &'static str {
        "custom"
    }

    /// Apply the line rate. Transports without a notion of baud rate may
    /// treat this as a no-op.
    fn configure(&mut self, baud_rate: u32) -> Result<()>;

    /// Write the whole buffer or fail.
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Flush buffered outbound bytes.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Number of inbound bytes that can be read without blocking.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Fill `buf` completely, blocking until enough bytes have arrived.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Read a single byte (blocking).
    fn read_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.read_exact(&mut byte)?;
        Ok(byte[0])
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }

    fn configure(&mut self, baud_rate: u32) -> Result<()> {
        (**self).configure(baud_rate)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read_exact(buf)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }

    fn configure(&mut self, baud_rate: u32) -> Result<()> {
        (**self).configure(baud_rate)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read_exact(buf)
    }
}
