// Level-up learnsets: per-species lists of packed u16 entries, each list
// closed by FF FF and padded to 4-byte alignment with a zero word.
use crate::blocks::{BlockRun, ExportContext};
use crate::core::decoder::RecordDecoder;
use crate::core::error::Error;
use crate::core::layout::{LayoutDescriptor, Termination};
use crate::core::policy::{ExceptionPolicy, Verdict};
use crate::core::row::{Value, uint_le};
use crate::report::Report;
use crate::tabular::TableWriter;

pub const NAME: &str = "levelup";

const SOURCE: &str = "data/a/0/3/3";
const BASE_OFFSET: usize = 0x1014;
const SENTINEL: [u8; 2] = [0xFF, 0xFF];

/// Entry word: move id in the low 9 bits, level in the high 7.
fn unpack_entry(value: u64) -> (u64, u64) {
    (value & 0x1FF, value >> 9)
}

pub fn export(ctx: &ExportContext) -> Result<BlockRun, Error> {
    let (source_path, source) = ctx.open_source(SOURCE)?;
    let policy = ExceptionPolicy::species();
    let mut report = Report::new();
    let mut table = TableWriter::create(
        ctx.out("level_up_learnsets.csv"),
        &["species_id", "move_id", "level"],
    )?;

    let mut pos = BASE_OFFSET;
    let mut raw_index: u16 = 0;
    while pos + 2 <= source.len() {
        let layout = LayoutDescriptor::new(
            pos,
            Some(2),
            Vec::new(),
            Termination::Sentinel(SENTINEL.to_vec()),
        )?;
        let decoder = RecordDecoder::new(&source, &layout);
        let mut records = decoder.records();

        let verdict = policy.resolve(raw_index);
        for result in records.by_ref() {
            let record = result?;
            let species_id = match verdict {
                Verdict::Keep(id) => id,
                // Reserved and placeholder lists are walked but not exported.
                Verdict::Skip | Verdict::Alias(_) => continue,
            };
            let (move_id, level) = unpack_entry(uint_le(record.bytes));
            table.write_row(&[
                Value::UInt(species_id as u64),
                Value::UInt(move_id),
                Value::UInt(level),
            ])?;
        }
        pos = records.next_offset();

        // Lists keep 4-byte alignment with a zero word after the sentinel.
        if pos + 2 <= source.len() && source.read(pos, 2)? == [0, 0] {
            pos += 2;
        }
        raw_index += 1;
    }
    if pos < source.len() {
        report.warn(format!(
            "{} stray byte(s) after the last learnset",
            source.len() - pos
        ));
    }

    let outputs = vec![table.finish()?];
    ctx.finish(NAME, report, vec![source_path], outputs)
}
