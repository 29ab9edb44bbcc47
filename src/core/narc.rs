// DS NARC container extraction: file-allocation (BTAF) ranges into the image
// (GMIF) block. Containers only; member decoding stays with the blocks.
use tracing::debug;

use crate::core::error::{Error, ErrorKind};
use crate::core::source::ByteSource;

const NARC_MAGIC: &[u8; 4] = b"NARC";
const FATB_TAG: &[u8; 4] = b"BTAF";
const FIMG_TAG: &[u8; 4] = b"GMIF";

fn mismatch(message: impl Into<String>, offset: usize) -> Error {
    Error::new(ErrorKind::LayoutMismatch)
        .with_message(message)
        .with_offset(offset as u64)
}

/// Extract every member file of a NARC archive as an owned byte source.
pub fn extract_members(source: &ByteSource) -> Result<Vec<ByteSource>, Error> {
    if source.len() < 16 || source.read(0, 4)? != NARC_MAGIC {
        return Err(mismatch("missing NARC magic", 0));
    }
    let mut header = source.cursor_at(0x0C);
    let header_size = header.read_u16_le()? as usize;
    let block_count = header.read_u16_le()? as usize;
    if header_size < 16 || header_size > source.len() {
        return Err(mismatch("invalid NARC header size", 0x0C));
    }

    let mut fatb: Option<(usize, usize)> = None;
    let mut fimg: Option<(usize, usize)> = None;
    let mut offset = header_size;
    for _ in 0..block_count {
        let mut cursor = source.cursor_at(offset);
        let tag = cursor
            .read_bytes(4)
            .map_err(|_| mismatch("truncated block header", offset))?;
        let size = cursor
            .read_u32_le()
            .map_err(|_| mismatch("truncated block header", offset))? as usize;
        if size < 8 || offset + size > source.len() {
            return Err(mismatch("invalid block size", offset));
        }
        if tag == FATB_TAG {
            fatb = Some((offset, size));
        } else if tag == FIMG_TAG {
            fimg = Some((offset, size));
        }
        offset += size;
    }

    let (fatb_off, fatb_size) =
        fatb.ok_or_else(|| mismatch("missing FATB block", header_size))?;
    let (fimg_off, fimg_size) =
        fimg.ok_or_else(|| mismatch("missing FIMG block", header_size))?;

    let file_count = source.cursor_at(fatb_off + 8).read_u16_le()? as usize;
    let entries_off = fatb_off + 0x0C;
    if entries_off + file_count * 8 > fatb_off + fatb_size {
        return Err(mismatch("FATB entry table truncated", entries_off));
    }
    let fimg_data = source.read(fimg_off + 8, fimg_size - 8)?;

    debug!(file_count, fimg_len = fimg_data.len(), "narc members");

    let mut members = Vec::with_capacity(file_count);
    for index in 0..file_count {
        let mut entry = source.cursor_at(entries_off + index * 8);
        let start = entry.read_u32_le()? as usize;
        let end = entry.read_u32_le()? as usize;
        if end < start || end > fimg_data.len() {
            return Err(mismatch(
                format!("invalid FATB range for member {index}: {start}..{end}"),
                entries_off + index * 8,
            ));
        }
        members.push(ByteSource::from_vec(fimg_data[start..end].to_vec()));
    }
    Ok(members)
}

#[cfg(test)]
pub mod testutil {
    /// Build a minimal NARC archive around the given member payloads.
    pub fn build_narc(members: &[&[u8]]) -> Vec<u8> {
        let mut fimg_data = Vec::new();
        let mut entries = Vec::new();
        for member in members {
            let start = fimg_data.len() as u32;
            fimg_data.extend_from_slice(member);
            let end = fimg_data.len() as u32;
            entries.push((start, end));
        }

        let fatb_size = 0x0C + entries.len() * 8;
        let fimg_size = 8 + fimg_data.len();

        let mut out = Vec::new();
        out.extend_from_slice(b"NARC");
        out.extend_from_slice(&[0xFE, 0xFF, 0x00, 0x01]); // byte order + version
        out.extend_from_slice(&0u32.to_le_bytes()); // total size, unused here
        out.extend_from_slice(&16u16.to_le_bytes()); // header size
        out.extend_from_slice(&2u16.to_le_bytes()); // block count

        out.extend_from_slice(b"BTAF");
        out.extend_from_slice(&(fatb_size as u32).to_le_bytes());
        out.extend_from_slice(&(members.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        for (start, end) in entries {
            out.extend_from_slice(&start.to_le_bytes());
            out.extend_from_slice(&end.to_le_bytes());
        }

        out.extend_from_slice(b"GMIF");
        out.extend_from_slice(&(fimg_size as u32).to_le_bytes());
        out.extend_from_slice(&fimg_data);
        out
    }
}
