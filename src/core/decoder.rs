// Record iteration over one block: termination, truncation, and extent checks
// all live here so block workers never touch raw offsets.
use tracing::trace;

use crate::core::error::{Error, ErrorKind};
use crate::core::layout::{LayoutDescriptor, Termination};
use crate::core::source::ByteSource;

/// Zero-copy window over one record, tagged with its 0-based index and the
/// absolute source offset it was read from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RawRecord<'a> {
    pub index: usize,
    pub offset: usize,
    pub bytes: &'a [u8],
}

pub struct RecordDecoder<'a> {
    source: &'a ByteSource,
    layout: &'a LayoutDescriptor,
}

impl<'a> RecordDecoder<'a> {
    pub fn new(source: &'a ByteSource, layout: &'a LayoutDescriptor) -> Self {
        Self { source, layout }
    }

    /// Fresh lazy pass over the block. Restartable: each call starts over at
    /// `base_offset`.
    pub fn records(&self) -> RecordIter<'a> {
        RecordIter {
            source: self.source,
            layout: self.layout,
            next_offset: self.layout.base_offset,
            index: 0,
            done: false,
        }
    }
}

pub struct RecordIter<'a> {
    source: &'a ByteSource,
    layout: &'a LayoutDescriptor,
    next_offset: usize,
    index: usize,
    done: bool,
}

impl<'a> RecordIter<'a> {
    /// Absolute offset of the next unread byte. After a sentinel stops the
    /// iteration this points past the sentinel record.
    pub fn next_offset(&self) -> usize {
        self.next_offset
    }

    /// End of the declared block: source end, clipped by `max_extent`.
    fn block_end(&self) -> usize {
        match self.layout.max_extent {
            Some(extent) => self
                .source
                .len()
                .min(self.layout.base_offset.saturating_add(extent)),
            None => self.source.len(),
        }
    }

    fn extent_end(&self) -> Option<usize> {
        self.layout
            .max_extent
            .map(|extent| self.layout.base_offset.saturating_add(extent))
    }

    fn fail(&mut self, err: Error) -> Option<Result<RawRecord<'a>, Error>> {
        self.done = true;
        Some(Err(err))
    }

    fn emit(&mut self, offset: usize, bytes: &'a [u8]) -> Option<Result<RawRecord<'a>, Error>> {
        let record = RawRecord {
            index: self.index,
            offset,
            bytes,
        };
        trace!(index = record.index, offset = record.offset, len = bytes.len(), "record");
        self.index += 1;
        Some(Ok(record))
    }

    fn next_fixed(&mut self, count: usize, stride: usize) -> Option<Result<RawRecord<'a>, Error>> {
        if self.index >= count {
            self.done = true;
            return None;
        }
        let offset = self.next_offset;
        let end = offset + stride;
        if let Some(extent_end) = self.extent_end() {
            if end > extent_end {
                return self.fail(
                    Error::new(ErrorKind::BoundsViolation)
                        .with_message(format!(
                            "record {} of {count} crosses the declared block end",
                            self.index
                        ))
                        .with_offset(offset as u64),
                );
            }
        }
        if end > self.source.len() {
            return self.fail(
                Error::new(ErrorKind::Truncated)
                    .with_message(format!(
                        "source ends after {} of {count} declared records",
                        self.index
                    ))
                    .with_offset(offset as u64),
            );
        }
        self.next_offset = end;
        match self.source.read(offset, stride) {
            Ok(bytes) => self.emit(offset, bytes),
            Err(err) => self.fail(err),
        }
    }

    fn next_sentinel(
        &mut self,
        pattern: &[u8],
        stride: usize,
    ) -> Option<Result<RawRecord<'a>, Error>> {
        let offset = self.next_offset;
        let end = offset + stride;
        if end > self.block_end() {
            return self.fail(
                Error::new(ErrorKind::MissingTerminator)
                    .with_message("block exhausted without its sentinel")
                    .with_offset(offset as u64),
            );
        }
        let bytes = match self.source.read(offset, stride) {
            Ok(bytes) => bytes,
            Err(err) => return self.fail(err),
        };
        if bytes == pattern {
            self.next_offset = end;
            self.done = true;
            return None;
        }
        self.next_offset = end;
        self.emit(offset, bytes)
    }

    fn next_length_prefixed(
        &mut self,
        width: usize,
        count: Option<usize>,
    ) -> Option<Result<RawRecord<'a>, Error>> {
        if let Some(count) = count {
            if self.index >= count {
                self.done = true;
                return None;
            }
        }
        let offset = self.next_offset;
        let block_end = self.block_end();
        if offset == block_end && count.is_none() {
            self.done = true;
            return None;
        }
        if offset + width > block_end {
            return self.fail(
                Error::new(ErrorKind::Truncated)
                    .with_message("partial length prefix at block end")
                    .with_offset(offset as u64),
            );
        }
        let prefix = match self.source.read(offset, width) {
            Ok(bytes) => bytes,
            Err(err) => return self.fail(err),
        };
        let mut payload_len = 0usize;
        for (i, byte) in prefix.iter().enumerate() {
            payload_len |= (*byte as usize) << (8 * i);
        }
        let payload_start = offset + width;
        let payload_end = payload_start + payload_len;
        if let Some(extent_end) = self.extent_end() {
            if payload_end > extent_end {
                return self.fail(
                    Error::new(ErrorKind::BoundsViolation)
                        .with_message("length-prefixed record crosses the declared block end")
                        .with_offset(offset as u64),
                );
            }
        }
        if payload_end > self.source.len() {
            return self.fail(
                Error::new(ErrorKind::Truncated)
                    .with_message(format!("payload of {payload_len} bytes ends past source"))
                    .with_offset(offset as u64),
            );
        }
        self.next_offset = payload_end;
        match self.source.read(payload_start, payload_len) {
            Ok(bytes) => self.emit(offset, bytes),
            Err(err) => self.fail(err),
        }
    }
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = Result<RawRecord<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let layout = self.layout;
        match &layout.termination {
            Termination::FixedCount(count) => {
                // Stride presence is enforced at descriptor construction.
                let stride = layout.stride.unwrap_or(0);
                self.next_fixed(*count, stride)
            }
            Termination::Sentinel(pattern) => {
                let stride = layout.stride.unwrap_or(pattern.len());
                self.next_sentinel(pattern, stride)
            }
            Termination::LengthPrefixed { width, count } => {
                self.next_length_prefixed(*width, *count)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RecordDecoder;
    use crate::core::error::ErrorKind;
    use crate::core::layout::{LayoutDescriptor, Termination};
    use crate::core::source::ByteSource;

    fn fixed(base: usize, stride: usize, count: usize) -> LayoutDescriptor {
        LayoutDescriptor::new(base, Some(stride), Vec::new(), Termination::FixedCount(count))
            .expect("layout")
    }

    #[test]
    fn fixed_count_decodes_declared_records() {
        // Worked example: three 4-byte ids at base 0x100.
        let mut data = vec![0u8; 0x100];
        data.extend_from_slice(&[1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0]);
        let source = ByteSource::from_vec(data);
        let layout = fixed(0x100, 4, 3);

        let records: Vec<_> = RecordDecoder::new(&source, &layout)
            .records()
            .collect::<Result<_, _>>()
            .expect("decode");
        assert_eq!(records.len(), 3);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.index, i);
            assert_eq!(record.offset, 0x100 + i * 4);
            assert_eq!(record.bytes[0] as usize, i + 1);
        }
        // Strictly increasing, non-overlapping offsets.
        for pair in records.windows(2) {
            assert!(pair[0].offset + 4 <= pair[1].offset);
        }
    }

    #[test]
    fn fixed_count_truncation_is_an_error() {
        let source = ByteSource::from_vec(vec![0u8; 12]);
        let layout = fixed(0, 4, 5);
        let result: Result<Vec<_>, _> = RecordDecoder::new(&source, &layout).records().collect();
        assert_eq!(result.expect_err("should fail").kind(), ErrorKind::Truncated);
    }

    #[test]
    fn record_crossing_extent_is_a_bounds_violation() {
        let source = ByteSource::from_vec(vec![0u8; 32]);
        let layout = fixed(0, 4, 3).with_max_extent(10);
        let result: Result<Vec<_>, _> = RecordDecoder::new(&source, &layout).records().collect();
        assert_eq!(
            result.expect_err("should fail").kind(),
            ErrorKind::BoundsViolation
        );
    }

    #[test]
    fn sentinel_excludes_terminator_record() {
        let source = ByteSource::from_vec(vec![0x0A, 0x0B, 0xFF, 0xFF]);
        let layout =
            LayoutDescriptor::new(0, Some(1), Vec::new(), Termination::Sentinel(vec![0xFF]))
                .expect("layout");
        let records: Vec<_> = RecordDecoder::new(&source, &layout)
            .records()
            .collect::<Result<_, _>>()
            .expect("decode");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].bytes, &[0x0A]);
        assert_eq!(records[1].bytes, &[0x0B]);
    }

    #[test]
    fn missing_sentinel_is_reported_not_truncated_silently() {
        let source = ByteSource::from_vec(vec![0x0A, 0x0B]);
        let layout =
            LayoutDescriptor::new(0, Some(1), Vec::new(), Termination::Sentinel(vec![0xFF]))
                .expect("layout");
        let result: Result<Vec<_>, _> = RecordDecoder::new(&source, &layout).records().collect();
        assert_eq!(
            result.expect_err("should fail").kind(),
            ErrorKind::MissingTerminator
        );
    }

    #[test]
    fn empty_block_is_valid_and_distinct_from_errors() {
        let source = ByteSource::from_vec(vec![0xFF, 0xFF]);
        let layout = LayoutDescriptor::new(
            0,
            Some(2),
            Vec::new(),
            Termination::Sentinel(vec![0xFF, 0xFF]),
        )
        .expect("layout");
        let records: Vec<_> = RecordDecoder::new(&source, &layout)
            .records()
            .collect::<Result<_, _>>()
            .expect("decode");
        assert!(records.is_empty());

        let fixed_zero = fixed(0, 2, 0);
        let records: Vec<_> = RecordDecoder::new(&source, &fixed_zero)
            .records()
            .collect::<Result<_, _>>()
            .expect("decode");
        assert!(records.is_empty());
    }

    #[test]
    fn decoder_is_restartable() {
        let source = ByteSource::from_vec(vec![1, 2, 3, 4]);
        let layout = fixed(0, 2, 2);
        let decoder = RecordDecoder::new(&source, &layout);
        let first: Vec<_> = decoder.records().collect::<Result<_, _>>().expect("pass 1");
        let second: Vec<_> = decoder.records().collect::<Result<_, _>>().expect("pass 2");
        assert_eq!(first, second);
    }

    #[test]
    fn iterator_is_fused_after_error() {
        let source = ByteSource::from_vec(vec![0u8; 3]);
        let layout = fixed(0, 2, 4);
        let mut iter = RecordDecoder::new(&source, &layout).records();
        assert!(iter.next().expect("first").is_ok());
        assert!(iter.next().expect("second").is_err());
        assert!(iter.next().is_none());
    }

    #[test]
    fn length_prefixed_walks_payload_boundaries() {
        // [len=2][AA BB][len=1][CC]
        let source = ByteSource::from_vec(vec![0x02, 0xAA, 0xBB, 0x01, 0xCC]);
        let layout = LayoutDescriptor::new(
            0,
            None,
            Vec::new(),
            Termination::LengthPrefixed {
                width: 1,
                count: None,
            },
        )
        .expect("layout");
        let records: Vec<_> = RecordDecoder::new(&source, &layout)
            .records()
            .collect::<Result<_, _>>()
            .expect("decode");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].bytes, &[0xAA, 0xBB]);
        assert_eq!(records[0].offset, 0);
        assert_eq!(records[1].bytes, &[0xCC]);
        assert_eq!(records[1].offset, 3);
    }

    #[test]
    fn length_prefixed_short_payload_is_truncated() {
        let source = ByteSource::from_vec(vec![0x04, 0xAA]);
        let layout = LayoutDescriptor::new(
            0,
            None,
            Vec::new(),
            Termination::LengthPrefixed {
                width: 1,
                count: None,
            },
        )
        .expect("layout");
        let result: Result<Vec<_>, _> = RecordDecoder::new(&source, &layout).records().collect();
        assert_eq!(result.expect_err("should fail").kind(), ErrorKind::Truncated);
    }
}
