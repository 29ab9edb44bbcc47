// Declarative block shape: where a block starts, how records end, what fields hold.
use crate::core::error::{Error, ErrorKind};
use crate::core::source::ByteSource;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Encoding {
    /// Little-endian unsigned integer (1, 2 or 4 bytes).
    Unsigned,
    /// Little-endian two's-complement signed integer (1, 2 or 4 bytes).
    Signed,
    /// LSB-first 0/1 flags; `count` flags taken from the field bytes.
    Bitflags(usize),
    /// Fixed-length string, trailing NUL/space padding stripped.
    Ascii,
    /// Must be all zero; omitted from output, non-zero is a warning.
    Padding,
    /// Present in the record but not decoded or validated; omitted from output.
    Opaque,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldDef {
    pub name: &'static str,
    pub width: usize,
    pub encoding: Encoding,
}

impl FieldDef {
    pub const fn new(name: &'static str, width: usize, encoding: Encoding) -> Self {
        Self {
            name,
            width,
            encoding,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Termination {
    /// Exactly `n` consecutive records.
    FixedCount(usize),
    /// A little-endian length field precedes each payload. Stops after `count`
    /// records when declared, otherwise at exact source exhaustion.
    LengthPrefixed { width: usize, count: Option<usize> },
    /// Stride-sized records until the sentinel pattern; the sentinel record is
    /// excluded from output.
    Sentinel(Vec<u8>),
}

#[derive(Clone, Debug)]
pub struct LayoutDescriptor {
    pub base_offset: usize,
    pub stride: Option<usize>,
    pub fields: Vec<FieldDef>,
    pub termination: Termination,
    /// Declared block extent measured from `base_offset`. Records crossing it
    /// are rejected, never clipped.
    pub max_extent: Option<usize>,
}

impl LayoutDescriptor {
    pub fn new(
        base_offset: usize,
        stride: Option<usize>,
        fields: Vec<FieldDef>,
        termination: Termination,
    ) -> Result<Self, Error> {
        let layout = Self {
            base_offset,
            stride,
            fields,
            termination,
            max_extent: None,
        };
        layout.validate()?;
        Ok(layout)
    }

    pub fn with_max_extent(mut self, extent: usize) -> Self {
        self.max_extent = Some(extent);
        self
    }

    fn validate(&self) -> Result<(), Error> {
        if let Some(stride) = self.stride {
            if stride == 0 {
                return Err(Error::new(ErrorKind::LayoutMismatch)
                    .with_message("stride must be non-zero"));
            }
            if !self.fields.is_empty() {
                let total: usize = self.fields.iter().map(|field| field.width).sum();
                if total != stride {
                    return Err(Error::new(ErrorKind::LayoutMismatch).with_message(format!(
                        "field widths sum to {total} but stride is {stride}"
                    )));
                }
            }
        }
        match &self.termination {
            Termination::FixedCount(_) => {
                if self.stride.is_none() {
                    return Err(Error::new(ErrorKind::LayoutMismatch).with_message(
                        "fixed-count blocks need a stride; variable records must be \
                         length-prefixed or sentinel-delimited",
                    ));
                }
            }
            Termination::LengthPrefixed { width, .. } => {
                if !matches!(width, 1 | 2 | 4) {
                    return Err(Error::new(ErrorKind::LayoutMismatch)
                        .with_message("length prefix width must be 1, 2 or 4"));
                }
            }
            Termination::Sentinel(pattern) => {
                let Some(stride) = self.stride else {
                    return Err(Error::new(ErrorKind::LayoutMismatch)
                        .with_message("sentinel termination requires a fixed stride"));
                };
                if pattern.len() != stride {
                    return Err(Error::new(ErrorKind::LayoutMismatch).with_message(format!(
                        "sentinel pattern is {} bytes but stride is {stride}",
                        pattern.len()
                    )));
                }
            }
        }
        for field in &self.fields {
            let width_ok = match field.encoding {
                Encoding::Unsigned | Encoding::Signed => matches!(field.width, 1 | 2 | 4),
                Encoding::Bitflags(count) => count > 0 && count <= field.width * 8,
                Encoding::Ascii | Encoding::Padding | Encoding::Opaque => field.width > 0,
            };
            if !width_ok {
                return Err(Error::new(ErrorKind::LayoutMismatch).with_message(format!(
                    "field '{}' has invalid width {} for its encoding",
                    field.name, field.width
                )));
            }
        }
        Ok(())
    }

    /// Number of whole strides between `base_offset` and the end of the source
    /// (clipped by `max_extent`), for blocks whose count is "whatever fits".
    pub fn fill_count(&self, source: &ByteSource) -> Result<usize, Error> {
        let stride = self.stride.ok_or_else(|| {
            Error::new(ErrorKind::LayoutMismatch)
                .with_message("fill count requires a fixed stride")
        })?;
        let available = source.len().saturating_sub(self.base_offset);
        let available = match self.max_extent {
            Some(extent) => available.min(extent),
            None => available,
        };
        Ok(available / stride)
    }

    /// Rewrite the termination to a fixed count covering every whole stride
    /// that fits, for blocks whose count is defined by the source length.
    pub fn fill_to_end(mut self, source: &ByteSource) -> Result<Self, Error> {
        let count = self.fill_count(source)?;
        self.termination = Termination::FixedCount(count);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{Encoding, FieldDef, LayoutDescriptor, Termination};
    use crate::core::error::ErrorKind;
    use crate::core::source::ByteSource;

    #[test]
    fn field_widths_must_sum_to_stride() {
        let err = LayoutDescriptor::new(
            0,
            Some(4),
            vec![
                FieldDef::new("a", 1, Encoding::Unsigned),
                FieldDef::new("b", 2, Encoding::Unsigned),
            ],
            Termination::FixedCount(1),
        )
        .expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::LayoutMismatch);
    }

    #[test]
    fn variable_stride_rejects_fixed_count() {
        let err = LayoutDescriptor::new(0, None, Vec::new(), Termination::FixedCount(3))
            .expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::LayoutMismatch);
    }

    #[test]
    fn sentinel_must_match_stride() {
        let err = LayoutDescriptor::new(
            0,
            Some(2),
            Vec::new(),
            Termination::Sentinel(vec![0xFF]),
        )
        .expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::LayoutMismatch);

        LayoutDescriptor::new(
            0,
            Some(2),
            Vec::new(),
            Termination::Sentinel(vec![0xFF, 0xFF]),
        )
        .expect("valid layout");
    }

    #[test]
    fn fill_count_clips_to_extent() {
        let layout = LayoutDescriptor::new(
            4,
            Some(4),
            Vec::new(),
            Termination::FixedCount(0),
        )
        .expect("layout")
        .with_max_extent(8);
        let source = ByteSource::from_vec(vec![0u8; 32]);
        assert_eq!(layout.fill_count(&source).expect("count"), 2);
    }

    #[test]
    fn fill_count_ignores_trailing_remainder() {
        let layout =
            LayoutDescriptor::new(0, Some(4), Vec::new(), Termination::FixedCount(0))
                .expect("layout");
        let source = ByteSource::from_vec(vec![0u8; 10]);
        assert_eq!(layout.fill_count(&source).expect("count"), 2);
    }
}
