//! Random-access byte streams (spec §3, §5).

use std::fmt;
use std::io;

use crate::error::Result;

/// A random-access byte stream a template tree resolves against.
///
/// Implementations decide what happens when a read runs past the end of
/// the underlying data; `ByteStream` below implements both the "backed"
/// (zero-fill) and "real" (raise) variants spec §4.3 distinguishes.
pub trait DataStream: fmt::Debug {
    fn len(&self) -> u64;
    fn read_at(&mut self, address: u64, size: u64) -> Result<Vec<u8>>;
    fn write_at(&mut self, address: u64, bytes: &[u8]) -> Result<()>;
}

/// An in-memory byte buffer. `backed` controls read-past-end behavior:
/// `true` zero-fills (matches a `BytesIO`-style buffer an engine owns and
/// grows on demand); `false` raises (matches an externally supplied,
/// fixed-length data source).
#[derive(Clone)]
pub struct ByteStream {
    buf: Vec<u8>,
    backed: bool,
}

impl fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteStream")
            .field("len", &self.buf.len())
            .field("backed", &self.backed)
            .finish()
    }
}

impl ByteStream {
    pub fn backed(bytes: impl Into<Vec<u8>>) -> Self {
        ByteStream {
            buf: bytes.into(),
            backed: true,
        }
    }

    pub fn real(bytes: impl Into<Vec<u8>>) -> Self {
        ByteStream {
            buf: bytes.into(),
            backed: false,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

impl DataStream for ByteStream {
    fn len(&self) -> u64 {
        self.buf.len() as u64
    }

    fn read_at(&mut self, address: u64, size: u64) -> Result<Vec<u8>> {
        let addr = address as usize;
        let sz = size as usize;
        let end = addr.saturating_add(sz);
        if end <= self.buf.len() {
            return Ok(self.buf[addr..end].to_vec());
        }
        if !self.backed {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "read past end of stream: address={address} size={size} len={}",
                    self.buf.len()
                ),
            )
            .into());
        }
        let mut out = vec![0u8; sz];
        if addr < self.buf.len() {
            let available = &self.buf[addr..];
            let n = available.len().min(sz);
            out[..n].copy_from_slice(&available[..n]);
        }
        Ok(out)
    }

    fn write_at(&mut self, address: u64, bytes: &[u8]) -> Result<()> {
        let addr = address as usize;
        let end = addr + bytes.len();
        if end > self.buf.len() {
            if !self.backed {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "write past end of stream: address={address} size={} len={}",
                        bytes.len(),
                        self.buf.len()
                    ),
                )
                .into());
            }
            self.buf.resize(end, 0);
        }
        self.buf[addr..end].copy_from_slice(bytes);
        Ok(())
    }
}
