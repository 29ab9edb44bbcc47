// Read-only byte views over ROM content files and extracted container members.
use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::core::error::{Error, ErrorKind};

/// Bounded random-access view over one binary source. No mutation surface;
/// the view lives for a single export run.
#[derive(Debug)]
pub struct ByteSource {
    data: SourceData,
}

#[derive(Debug)]
enum SourceData {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl ByteSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::new(ErrorKind::NotFound)
                .with_message("source file not found")
                .with_path(path));
        }
        let file = File::open(path)
            .map_err(|err| Error::new(ErrorKind::Io).with_path(path).with_source(err))?;
        let mmap = unsafe {
            Mmap::map(&file)
                .map_err(|err| Error::new(ErrorKind::Io).with_path(path).with_source(err))?
        };
        Ok(Self {
            data: SourceData::Mapped(mmap),
        })
    }

    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self {
            data: SourceData::Owned(bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bytes(&self) -> &[u8] {
        match &self.data {
            SourceData::Mapped(mmap) => mmap,
            SourceData::Owned(vec) => vec,
        }
    }

    pub fn read(&self, offset: usize, len: usize) -> Result<&[u8], Error> {
        let end = offset.checked_add(len).ok_or_else(|| {
            Error::new(ErrorKind::OutOfBounds)
                .with_message("read length overflows")
                .with_offset(offset as u64)
        })?;
        if end > self.len() {
            return Err(Error::new(ErrorKind::OutOfBounds)
                .with_message(format!(
                    "read of {len} bytes exceeds source of {} bytes",
                    self.len()
                ))
                .with_offset(offset as u64));
        }
        Ok(&self.bytes()[offset..end])
    }

    pub fn cursor_at(&self, offset: usize) -> Cursor<'_> {
        Cursor {
            source: self,
            pos: offset,
        }
    }
}

/// Sequential reader so callers walking a block do not restate offsets.
pub struct Cursor<'a> {
    source: &'a ByteSource,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.source.len().saturating_sub(self.pos)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], Error> {
        let bytes = self.source.read(self.pos, len)?;
        self.pos += len;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16, Error> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, Error> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn skip(&mut self, len: usize) -> Result<(), Error> {
        self.read_bytes(len).map(|_| ())
    }
}
