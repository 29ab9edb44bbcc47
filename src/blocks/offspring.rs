// Breeding offspring table: a bare u16 stream, one base-form species id per
// species. The file carries a container header elsewhere in the game's build,
// but this table reads it as raw records from offset 0.
use crate::blocks::{BlockRun, ExportContext};
use crate::core::decoder::RecordDecoder;
use crate::core::error::Error;
use crate::core::layout::{Encoding, FieldDef, LayoutDescriptor, Termination};
use crate::core::policy::{ExceptionPolicy, Verdict};
use crate::core::row::{Value, map_record};
use crate::report::Report;
use crate::tabular::TableWriter;

pub const NAME: &str = "offspring";

const SOURCE: &str = "data/poketool/personal/pms.narc";

const FIELDS: &[FieldDef] = &[FieldDef::new("offspring_species_id", 2, Encoding::Unsigned)];

pub fn export(ctx: &ExportContext) -> Result<BlockRun, Error> {
    let (source_path, source) = ctx.open_source(SOURCE)?;
    let mut report = Report::new();
    if source.len() % 2 != 0 {
        report.warn(format!(
            "source length {} is not a multiple of 2; trailing byte ignored",
            source.len()
        ));
    }

    let layout = LayoutDescriptor::new(
        0,
        Some(2),
        FIELDS.to_vec(),
        Termination::FixedCount(0),
    )?
    .fill_to_end(&source)?;

    let policy = ExceptionPolicy::species();
    let mut table = TableWriter::create(
        ctx.out("offspring.csv"),
        &["species_id", "offspring_species_id"],
    )?;

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
            Value::UInt(mapped.record.uint("offspring_species_id")),
        ])?;
    }

    let outputs = vec![table.finish()?];
    ctx.finish(NAME, report, vec![source_path], outputs)
}
