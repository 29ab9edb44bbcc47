// Species weight table: one u16 per species, hectograms.
use crate::blocks::{BlockRun, ExportContext};
use crate::core::decoder::RecordDecoder;
use crate::core::error::Error;
use crate::core::layout::{Encoding, FieldDef, LayoutDescriptor, Termination};
use crate::core::policy::{ExceptionPolicy, Verdict};
use crate::core::row::{Value, map_record};
use crate::report::Report;
use crate::tabular::TableWriter;

pub const NAME: &str = "weight";

const SOURCE: &str = "data/a/2/1/4";
const BASE_OFFSET: usize = 0xB1C;
const STRIDE: usize = 4;
const RECORD_COUNT: usize = 494;

const FIELDS: &[FieldDef] = &[
    FieldDef::new("weight", 2, Encoding::Unsigned),
    FieldDef::new("unused", 2, Encoding::Padding),
];

pub fn export(ctx: &ExportContext) -> Result<BlockRun, Error> {
    let (source_path, source) = ctx.open_source(SOURCE)?;
    let layout = LayoutDescriptor::new(
        BASE_OFFSET,
        Some(STRIDE),
        FIELDS.to_vec(),
        Termination::FixedCount(RECORD_COUNT),
    )?;

    let policy = ExceptionPolicy::species();
    let mut report = Report::new();
    let mut table = TableWriter::create(ctx.out("weight.csv"), &["species_id", "weight"])?;

    for result in RecordDecoder::new(&source, &layout).records() {
        let record = result?;
        let species_id = match policy.resolve(record.index as u16) {
            Verdict::Keep(id) => id,
            Verdict::Skip | Verdict::Alias(_) => continue,
        };
        let mapped = map_record(&record, &layout)?;
        report.extend_warnings(mapped.warnings);
        table.write_row(&[
            Value::UInt(species_id as u64),
            Value::UInt(mapped.record.uint("weight")),
        ])?;
    }

    let outputs = vec![table.finish()?];
    ctx.finish(NAME, report, vec![source_path], outputs)
}
