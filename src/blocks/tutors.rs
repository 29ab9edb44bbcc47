// Move tutor roster: 58 fixed slots inside an engine overlay, each naming the
// taught move, its cost, and which tutor offers it.
use crate::blocks::{BlockRun, ExportContext};
use crate::core::decoder::RecordDecoder;
use crate::core::error::Error;
use crate::core::layout::{Encoding, FieldDef, LayoutDescriptor, Termination};
use crate::core::row::{Value, map_record};
use crate::report::Report;
use crate::tabular::TableWriter;

pub const NAME: &str = "tutors";

const SOURCE: &str = "overlay/overlay_0001.bin";
const BASE_OFFSET: usize = 0x23AE0;
const STRIDE: usize = 4;
pub const TUTOR_SLOT_COUNT: usize = 58;

const FIELDS: &[FieldDef] = &[
    FieldDef::new("move_id", 2, Encoding::Unsigned),
    FieldDef::new("tutor_cost", 1, Encoding::Unsigned),
    FieldDef::new("tutor_id", 1, Encoding::Unsigned),
];

pub fn export(ctx: &ExportContext) -> Result<BlockRun, Error> {
    let (source_path, source) = ctx.open_source(SOURCE)?;
    let layout = LayoutDescriptor::new(
        BASE_OFFSET,
        Some(STRIDE),
        FIELDS.to_vec(),
        Termination::FixedCount(TUTOR_SLOT_COUNT),
    )?;

    let mut report = Report::new();
    let mut table = TableWriter::create(
        ctx.out("tutors.csv"),
        &["tutorable_move", "move_id", "tutor_cost", "tutor_id"],
    )?;

    for result in RecordDecoder::new(&source, &layout).records() {
        let record = result?;
        let mapped = map_record(&record, &layout)?;
        report.extend_warnings(mapped.warnings);
        let decoded = mapped.record;
        // Slot numbers are 1-based to line up with the learnset columns.
        table.write_row(&[
            Value::UInt(record.index as u64 + 1),
            Value::UInt(decoded.uint("move_id")),
            Value::UInt(decoded.uint("tutor_cost")),
            Value::UInt(decoded.uint("tutor_id")),
        ])?;
    }

    let outputs = vec![table.finish()?];
    ctx.finish(NAME, report, vec![source_path], outputs)
}
