// Raw record window -> ordered, typed fields ready for tabular export.
use std::fmt;

use crate::core::decoder::RawRecord;
use crate::core::error::{Error, ErrorKind};
use crate::core::layout::{Encoding, LayoutDescriptor};

/// One scalar cell. `Bits` carries unpacked 0/1 flags for blocks that expand
/// them into one column each; `Empty` renders as an empty CSV cell.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value {
    UInt(u64),
    Int(i64),
    Text(String),
    Bits(Vec<u8>),
    Empty,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::UInt(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Text(value) => f.write_str(value),
            Value::Bits(bits) => {
                for bit in bits {
                    write!(f, "{bit}")?;
                }
                Ok(())
            }
            Value::Empty => Ok(()),
        }
    }
}

/// Field-name -> value mapping in field-definition order, tagged with the
/// entity id once the exception policy has resolved it.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedRecord {
    pub id: Option<u16>,
    pub fields: Vec<(&'static str, Value)>,
}

impl DecodedRecord {
    pub fn with_id(mut self, id: u16) -> Self {
        self.id = Some(id);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    pub fn uint(&self, name: &str) -> u64 {
        match self.get(name) {
            Some(Value::UInt(value)) => *value,
            _ => 0,
        }
    }
}

#[derive(Debug)]
pub struct MappedRecord {
    pub record: DecodedRecord,
    /// Non-corrupting anomalies (non-zero padding). Plain messages; the report
    /// layer adds block context and level tags.
    pub warnings: Vec<String>,
}

/// Apply the layout's field encodings to one record window. Padding fields are
/// validated and omitted; anything else lands in the output in declaration
/// order.
pub fn map_record(record: &RawRecord<'_>, layout: &LayoutDescriptor) -> Result<MappedRecord, Error> {
    let mut fields = Vec::with_capacity(layout.fields.len());
    let mut warnings = Vec::new();
    let mut pos = 0usize;

    for field in &layout.fields {
        let end = pos + field.width;
        if end > record.bytes.len() {
            return Err(Error::new(ErrorKind::Truncated)
                .with_message(format!(
                    "field '{}' ends past record {} ({} bytes)",
                    field.name,
                    record.index,
                    record.bytes.len()
                ))
                .with_offset((record.offset + pos) as u64));
        }
        let window = &record.bytes[pos..end];
        match field.encoding {
            Encoding::Unsigned => {
                fields.push((field.name, Value::UInt(uint_le(window))));
            }
            Encoding::Signed => {
                fields.push((field.name, Value::Int(int_le(window))));
            }
            Encoding::Bitflags(count) => {
                fields.push((field.name, Value::Bits(unpack_bits(window, count))));
            }
            Encoding::Ascii => {
                let trimmed = window
                    .iter()
                    .copied()
                    .take_while(|byte| *byte != 0)
                    .collect::<Vec<u8>>();
                let text = String::from_utf8_lossy(&trimmed).trim_end().to_string();
                fields.push((field.name, Value::Text(text)));
            }
            Encoding::Opaque => {}
            Encoding::Padding => {
                if window.iter().any(|byte| *byte != 0) {
                    warnings.push(format!(
                        "non-zero padding at record {} offset 0x{:X} ({})",
                        record.index,
                        record.offset + pos,
                        hex(window)
                    ));
                }
            }
        }
        pos = end;
    }

    Ok(MappedRecord {
        record: DecodedRecord { id: None, fields },
        warnings,
    })
}

pub fn uint_le(bytes: &[u8]) -> u64 {
    let mut value = 0u64;
    for (i, byte) in bytes.iter().enumerate() {
        value |= (*byte as u64) << (8 * i);
    }
    value
}

pub fn int_le(bytes: &[u8]) -> i64 {
    let raw = uint_le(bytes);
    let bits = bytes.len() * 8;
    if bits >= 64 {
        return raw as i64;
    }
    let sign = 1u64 << (bits - 1);
    if raw & sign != 0 {
        (raw as i64) - (1i64 << bits)
    } else {
        raw as i64
    }
}

/// LSB-first flag unpacking, `count` flags from the window.
pub fn unpack_bits(bytes: &[u8], count: usize) -> Vec<u8> {
    bytes
        .iter()
        .flat_map(|byte| (0..8).map(move |bit| (byte >> bit) & 1))
        .take(count)
        .collect()
}

pub fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{byte:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::{int_le, map_record, uint_le, unpack_bits, Value};
    use crate::core::decoder::RawRecord;
    use crate::core::error::ErrorKind;
    use crate::core::layout::{Encoding, FieldDef, LayoutDescriptor, Termination};

    fn layout(fields: Vec<FieldDef>) -> LayoutDescriptor {
        let stride = fields.iter().map(|field| field.width).sum();
        LayoutDescriptor::new(0, Some(stride), fields, Termination::FixedCount(1))
            .expect("layout")
    }

    #[test]
    fn fields_keep_declaration_order() {
        let layout = layout(vec![
            FieldDef::new("power", 1, Encoding::Unsigned),
            FieldDef::new("accuracy", 1, Encoding::Unsigned),
            FieldDef::new("priority", 1, Encoding::Signed),
        ]);
        let record = RawRecord {
            index: 0,
            offset: 0,
            bytes: &[90, 100, 0xFF],
        };
        let mapped = map_record(&record, &layout).expect("map");
        let names: Vec<_> = mapped.record.fields.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["power", "accuracy", "priority"]);
        assert_eq!(mapped.record.fields[2].1, Value::Int(-1));
    }

    #[test]
    fn padding_is_validated_and_omitted() {
        let layout = layout(vec![
            FieldDef::new("id", 2, Encoding::Unsigned),
            FieldDef::new("pad", 2, Encoding::Padding),
        ]);
        let record = RawRecord {
            index: 3,
            offset: 0x10,
            bytes: &[1, 0, 0, 0x7F],
        };
        let mapped = map_record(&record, &layout).expect("map");
        assert_eq!(mapped.record.fields.len(), 1);
        assert_eq!(mapped.warnings.len(), 1);
        assert!(mapped.warnings[0].contains("record 3"));
    }

    #[test]
    fn short_record_fails_truncated() {
        let layout = layout(vec![FieldDef::new("value", 4, Encoding::Unsigned)]);
        let record = RawRecord {
            index: 0,
            offset: 0,
            bytes: &[1, 2],
        };
        let err = map_record(&record, &layout).expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::Truncated);
    }

    #[test]
    fn ascii_strips_trailing_padding() {
        let layout = layout(vec![FieldDef::new("name", 6, Encoding::Ascii)]);
        let record = RawRecord {
            index: 0,
            offset: 0,
            bytes: b"ABRA\0\0",
        };
        let mapped = map_record(&record, &layout).expect("map");
        assert_eq!(mapped.record.fields[0].1, Value::Text("ABRA".to_string()));
    }

    #[test]
    fn integer_decoding_is_little_endian() {
        assert_eq!(uint_le(&[0x34, 0x12]), 0x1234);
        assert_eq!(int_le(&[0xFE]), -2);
        assert_eq!(int_le(&[0x7F]), 127);
    }

    #[test]
    fn bit_unpacking_is_lsb_first() {
        assert_eq!(unpack_bits(&[0b0000_0101], 4), vec![1, 0, 1, 0]);
        assert_eq!(unpack_bits(&[0x00, 0x01], 10), vec![0, 0, 0, 0, 0, 0, 0, 0, 1, 0]);
    }

    #[test]
    fn empty_value_renders_as_empty_cell() {
        assert_eq!(Value::Empty.to_string(), "");
        assert_eq!(Value::UInt(7).to_string(), "7");
    }
}
