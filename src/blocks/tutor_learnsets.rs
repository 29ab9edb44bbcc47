// Tutor learnsets: one 8-byte bitfield per species recording which of the 58
// tutorable moves it can learn. The file carries no ids; rows are matched to
// species in ascending order, with the reserved id gap absent from the data.
use crate::blocks::{BlockRun, ExportContext};
use crate::blocks::tutors::TUTOR_SLOT_COUNT;
use crate::core::decoder::RecordDecoder;
use crate::core::error::Error;
use crate::core::layout::{Encoding, FieldDef, LayoutDescriptor, Termination};
use crate::core::policy::{ExceptionPolicy, Verdict};
use crate::core::row::{Value, map_record};
use crate::report::Report;
use crate::tabular::TableWriter;

pub const NAME: &str = "tutor_learnsets";

const SOURCE: &str = "data/fielddata/wazaoshie/waza_oshie.bin";
const STRIDE: usize = 8;

const FIELDS: &[FieldDef] = &[FieldDef::new(
    "tutor_flags",
    STRIDE,
    Encoding::Bitflags(TUTOR_SLOT_COUNT),
)];

fn header() -> Vec<String> {
    let mut header = vec!["species_id".to_string()];
    header.extend((1..=TUTOR_SLOT_COUNT).map(|i| format!("tutorable_move_{i:02}")));
    header
}

pub fn export(ctx: &ExportContext) -> Result<BlockRun, Error> {
    let (source_path, source) = ctx.open_source(SOURCE)?;
    let mut report = Report::new();
    if source.len() % STRIDE != 0 {
        report.warn(format!(
            "source length {} is not a multiple of {STRIDE}; trailing bytes ignored",
            source.len()
        ));
    }

    let layout = LayoutDescriptor::new(0, Some(STRIDE), FIELDS.to_vec(), Termination::FixedCount(0))?
        .fill_to_end(&source)?;

    let policy = ExceptionPolicy::species();
    report.info("rows are keyed by position; reserved species ids are absent from this file");
    let mut table = TableWriter::create(ctx.out("tutor_learnsets.csv"), &header())?;

    let decoder = RecordDecoder::new(&source, &layout);
    for (result, (species_id, verdict)) in decoder.records().zip(policy.present_ids(1)) {
        let record = result?;
        if let Verdict::Alias(_) = verdict {
            continue;
        }
        let mapped = map_record(&record, &layout)?;
        report.extend_warnings(mapped.warnings);
        let mut row = Vec::with_capacity(TUTOR_SLOT_COUNT + 1);
        row.push(Value::UInt(species_id as u64));
        if let Some(Value::Bits(bits)) = mapped.record.get("tutor_flags") {
            row.extend(bits.iter().map(|bit| Value::UInt(*bit as u64)));
        }
        table.write_row(&row)?;
    }

    let outputs = vec![table.finish()?];
    ctx.finish(NAME, report, vec![source_path], outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn rows_are_positionally_keyed_from_one() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let path = dir.path().join(SOURCE);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        // species 1 learns move slot 1 only; species 2 learns slots 9 and 10
        let mut data = vec![0u8; 16];
        data[0] = 0b0000_0001;
        data[9] = 0b0000_0011;
        fs::write(path, data).unwrap();

        let ctx = ExportContext::new(dir.path(), out.path());
        let run = export(&ctx).unwrap();
        let csv = fs::read_to_string(&run.outputs[0]).unwrap();
        let rows: Vec<&str> = csv.lines().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[1].starts_with("1,1,0,"));
        let second: Vec<&str> = rows[2].split(',').collect();
        assert_eq!(second[0], "2");
        assert_eq!(&second[9..=10], &["1", "1"]);
        assert_eq!(second.len(), 1 + TUTOR_SLOT_COUNT);
    }
}
