// Evolution data: seven (method, parameter, target) slots per species; only
// populated slots become rows.
use crate::blocks::{BlockRun, ExportContext};
use crate::core::decoder::RecordDecoder;
use crate::core::error::Error;
use crate::core::layout::{LayoutDescriptor, Termination};
use crate::core::policy::{ExceptionPolicy, Verdict};
use crate::core::row::{Value, uint_le};
use crate::report::Report;
use crate::tabular::TableWriter;

pub const NAME: &str = "evolutions";

const SOURCE: &str = "data/a/0/3/4";
const BASE_OFFSET: usize = 0x1014;
const STRIDE: usize = 44;
const RECORD_COUNT: usize = 508;
const SLOT_COUNT: usize = 7;
const SLOT_WIDTH: usize = 6;

pub fn export(ctx: &ExportContext) -> Result<BlockRun, Error> {
    let (source_path, source) = ctx.open_source(SOURCE)?;
    let mut report = Report::new();

    let available = source.len().saturating_sub(BASE_OFFSET);
    if available != RECORD_COUNT * STRIDE {
        report.warn(format!(
            "expected {} bytes of evolution records, found {available}",
            RECORD_COUNT * STRIDE
        ));
    }

    // Slots are pulled apart by hand below; the layout only frames records.
    let layout = LayoutDescriptor::new(
        BASE_OFFSET,
        Some(STRIDE),
        Vec::new(),
        Termination::FixedCount(RECORD_COUNT.min(available / STRIDE)),
    )?;

    let policy = ExceptionPolicy::species();
    let mut table = TableWriter::create(
        ctx.out("evolutions.csv"),
        &[
            "species_id",
            "evolution_method",
            "evolution_parameter",
            "target_species_id",
        ],
    )?;

    for result in RecordDecoder::new(&source, &layout).records() {
        let record = result?;
        let species_id = match policy.resolve(record.index as u16) {
            Verdict::Keep(id) => id,
            Verdict::Skip | Verdict::Alias(_) => continue,
        };
        for slot in 0..SLOT_COUNT {
            let start = slot * SLOT_WIDTH;
            let method = uint_le(&record.bytes[start..start + 2]);
            let parameter = uint_le(&record.bytes[start + 2..start + 4]);
            let target = uint_le(&record.bytes[start + 4..start + 6]);
            if method == 0 && parameter == 0 && target == 0 {
                continue;
            }
            table.write_row(&[
                Value::UInt(species_id as u64),
                Value::UInt(method),
                Value::UInt(parameter),
                Value::UInt(target),
            ])?;
        }
        // Last two bytes of each record pad the slots to the stride.
    }

    let outputs = vec![table.finish()?];
    ctx.finish(NAME, report, vec![source_path], outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_fixture(dir: &TempDir, records: &[[u8; STRIDE]]) {
        let path = dir.path().join(SOURCE);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut data = vec![0u8; BASE_OFFSET];
        for record in records {
            data.extend_from_slice(record);
        }
        fs::write(path, data).unwrap();
    }

    #[test]
    fn emits_only_populated_slots() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let mut records = vec![[0u8; STRIDE]; 3];
        // species 1: level-up (method 4) at level 16 into species 2
        records[1][..6].copy_from_slice(&[4, 0, 16, 0, 2, 0]);
        // second slot left empty, third populated
        records[1][12..18].copy_from_slice(&[5, 0, 0, 0, 3, 0]);
        write_fixture(&dir, &records);

        let ctx = ExportContext::new(dir.path(), out.path());
        let run = export(&ctx).unwrap();
        let csv = fs::read_to_string(&run.outputs[0]).unwrap();
        let rows: Vec<&str> = csv.lines().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], "1,4,16,2");
        assert_eq!(rows[2], "1,5,0,3");
        // short file (3 of 508 records) is reported
        assert!(run.had_warnings);
    }
}
