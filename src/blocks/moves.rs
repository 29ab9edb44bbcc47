// Move data: battle parameters for every move, one 16-byte record each.
use crate::blocks::{BlockRun, ExportContext};
use crate::core::decoder::RecordDecoder;
use crate::core::error::Error;
use crate::core::layout::{Encoding, FieldDef, LayoutDescriptor, Termination};
use crate::core::policy::{ExceptionPolicy, Verdict};
use crate::core::row::{Value, map_record};
use crate::report::Report;
use crate::tabular::TableWriter;

pub const NAME: &str = "moves";

const SOURCE: &str = "data/a/0/1/1";
const BASE_OFFSET: usize = 0xEEC;
const STRIDE: usize = 16;

const FIELDS: &[FieldDef] = &[
    FieldDef::new("move_effect_script_id", 2, Encoding::Unsigned),
    FieldDef::new("category", 1, Encoding::Unsigned),
    FieldDef::new("power", 1, Encoding::Unsigned),
    FieldDef::new("type", 1, Encoding::Unsigned),
    FieldDef::new("accuracy", 1, Encoding::Unsigned),
    FieldDef::new("power_points", 1, Encoding::Unsigned),
    FieldDef::new("side_effect_rate", 1, Encoding::Unsigned),
    FieldDef::new("range", 2, Encoding::Unsigned),
    FieldDef::new("priority", 1, Encoding::Signed),
    // Engine-side flag byte (contact, protect, ...); decoded but not part of
    // the table.
    FieldDef::new("flags", 1, Encoding::Opaque),
    FieldDef::new("contest_appeal", 1, Encoding::Unsigned),
    FieldDef::new("contest_condition", 1, Encoding::Unsigned),
    FieldDef::new("unused", 2, Encoding::Padding),
];

const COLUMNS: [&str; 12] = [
    "move_id",
    "move_effect_script_id",
    "category",
    "power",
    "type",
    "accuracy",
    "power_points",
    "side_effect_rate",
    "range",
    "priority",
    "contest_appeal",
    "contest_condition",
];

pub fn export(ctx: &ExportContext) -> Result<BlockRun, Error> {
    let (source_path, source) = ctx.open_source(SOURCE)?;
    let layout = LayoutDescriptor::new(
        BASE_OFFSET,
        Some(STRIDE),
        FIELDS.to_vec(),
        Termination::FixedCount(0),
    )?
    .fill_to_end(&source)?;

    // Record 0 is the null move.
    let policy = ExceptionPolicy::empty().skip(0..=0);
    let mut report = Report::new();
    let mut table = TableWriter::create(ctx.out("moves.csv"), &COLUMNS)?;

    for result in RecordDecoder::new(&source, &layout).records() {
        let record = result?;
        let move_id = match policy.resolve(record.index as u16) {
            Verdict::Keep(id) => id,
            Verdict::Skip | Verdict::Alias(_) => continue,
        };
        let mapped = map_record(&record, &layout)?;
        report.extend_warnings(mapped.warnings);
        let decoded = mapped.record;

        let priority = match decoded.get("priority") {
            Some(Value::Int(value)) => *value,
            _ => 0,
        };
        table.write_row(&[
            Value::UInt(move_id as u64),
            Value::UInt(decoded.uint("move_effect_script_id")),
            Value::UInt(decoded.uint("category")),
            Value::UInt(decoded.uint("power")),
            Value::UInt(decoded.uint("type")),
            Value::UInt(decoded.uint("accuracy")),
            Value::UInt(decoded.uint("power_points")),
            Value::UInt(decoded.uint("side_effect_rate")),
            Value::UInt(decoded.uint("range")),
            Value::Int(priority),
            Value::UInt(decoded.uint("contest_appeal")),
            Value::UInt(decoded.uint("contest_condition")),
        ])?;
    }

    let outputs = vec![table.finish()?];
    ctx.finish(NAME, report, vec![source_path], outputs)
}
