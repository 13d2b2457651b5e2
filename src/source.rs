//! Re-readable byte buffers handed to every probe.
//!
//! A [`ByteSource`] is materialised once per classification. Probes never
//! share a cursor: each one asks for its own [`ByteReader`] and starts at
//! offset zero, so the order in which probes run cannot leak state between
//! them.

use std::borrow::Cow;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{DetectError, SourceError};

/// Immutable byte buffer, borrowed or owned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteSource<'a> {
    data: Cow<'a, [u8]>,
}

impl<'a> ByteSource<'a> {
    /// Wrap borrowed bytes without copying
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data: Cow::Borrowed(data),
        }
    }

    /// Take ownership of a buffer
    pub fn owned(data: Vec<u8>) -> ByteSource<'static> {
        ByteSource {
            data: Cow::Owned(data),
        }
    }

    /// Drain a reader into memory, refusing to go past `limit` bytes
    pub fn read_from<R: Read>(
        reader: R,
        origin: &str,
        limit: Option<u64>,
    ) -> Result<ByteSource<'static>, DetectError> {
        let mut data = Vec::new();
        let unavailable = |source| DetectError::InputUnavailable {
            origin: origin.to_string(),
            source,
        };

        match limit {
            Some(limit) => {
                // One byte past the limit is enough to know we are over it
                reader
                    .take(limit.saturating_add(1))
                    .read_to_end(&mut data)
                    .map_err(unavailable)?;
                if data.len() as u64 > limit {
                    return Err(DetectError::InputTooLarge {
                        origin: origin.to_string(),
                        size: data.len() as u64,
                        limit,
                    });
                }
            }
            None => {
                let mut reader = reader;
                reader.read_to_end(&mut data).map_err(unavailable)?;
            }
        }

        Ok(ByteSource::owned(data))
    }

    /// Read a whole file, checking its size against `limit` before reading
    pub fn from_path(path: &Path, limit: Option<u64>) -> Result<ByteSource<'static>, DetectError> {
        let origin = path.display().to_string();
        let unavailable = |source| DetectError::InputUnavailable {
            origin: origin.clone(),
            source,
        };

        let file = File::open(path).map_err(unavailable)?;
        if let Some(limit) = limit {
            let size = file.metadata().map_err(unavailable)?.len();
            if size > limit {
                return Err(DetectError::InputTooLarge { origin, size, limit });
            }
        }

        Self::read_from(file, &origin, limit)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Fresh cursor positioned at offset zero
    pub fn reader(&self) -> ByteReader<'_> {
        ByteReader::new(&self.data)
    }

    /// Borrowed view over the same bytes
    pub fn view(&self) -> ByteSource<'_> {
        ByteSource::new(&self.data)
    }

    /// `len` bytes starting at `offset`
    pub fn slice(&self, offset: usize, len: usize) -> Result<&[u8], SourceError> {
        let end = offset.checked_add(len).filter(|end| *end <= self.data.len());
        match end {
            Some(end) => Ok(&self.data[offset..end]),
            None => Err(SourceError::InsufficientData {
                offset,
                wanted: len,
                available: self.data.len().saturating_sub(offset),
            }),
        }
    }

    pub fn byte_at(&self, offset: usize) -> Result<u8, SourceError> {
        self.slice(offset, 1).map(|b| b[0])
    }
}

/// Forward-only cursor over a byte slice
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Consume the next `n` bytes
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], SourceError> {
        if n > self.remaining() {
            return Err(SourceError::InsufficientData {
                offset: self.pos,
                wanted: n,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), SourceError> {
        self.read_bytes(n).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8, SourceError> {
        self.read_bytes(1).map(|b| b[0])
    }

    pub fn read_u32_be(&mut self) -> Result<u32, SourceError> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, SourceError> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}
