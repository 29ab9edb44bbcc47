// Encounter sets for both game versions: 196-byte records holding encounter
// rates, twelve walk slots, and five slots each for surf and the three rods.
// The two sources are processed independently; one version failing does not
// abort the other.
use std::path::PathBuf;

use crate::blocks::{BlockRun, ExportContext};
use crate::core::decoder::RecordDecoder;
use crate::core::error::Error;
use crate::core::layout::{Encoding, FieldDef, LayoutDescriptor, Termination};
use crate::core::row::{Value, map_record};
use crate::report::Report;
use crate::tabular::TableWriter;

pub const NAME: &str = "encounters";

const SOURCE_HG: &str = "data/a/0/3/7";
const SOURCE_SS: &str = "data/a/1/3/6";
const BASE_OFFSET: usize = 0x4A4;
const STRIDE: usize = 196;

use Encoding::Unsigned as U;

const FIELDS: &[FieldDef] = &[
    FieldDef::new("walk_rate", 1, U),
    FieldDef::new("surf_rate", 1, U),
    FieldDef::new("rock_smash_rate", 1, U),
    FieldDef::new("old_rod_rate", 1, U),
    FieldDef::new("good_rod_rate", 1, U),
    FieldDef::new("super_rod_rate", 1, U),
    FieldDef::new("pad", 2, Encoding::Padding),
    FieldDef::new("walk_slot_01_level", 1, U),
    FieldDef::new("walk_slot_02_level", 1, U),
    FieldDef::new("walk_slot_03_level", 1, U),
    FieldDef::new("walk_slot_04_level", 1, U),
    FieldDef::new("walk_slot_05_level", 1, U),
    FieldDef::new("walk_slot_06_level", 1, U),
    FieldDef::new("walk_slot_07_level", 1, U),
    FieldDef::new("walk_slot_08_level", 1, U),
    FieldDef::new("walk_slot_09_level", 1, U),
    FieldDef::new("walk_slot_10_level", 1, U),
    FieldDef::new("walk_slot_11_level", 1, U),
    FieldDef::new("walk_slot_12_level", 1, U),
    FieldDef::new("walk_slot_01_species", 2, U),
    FieldDef::new("walk_slot_02_species", 2, U),
    FieldDef::new("walk_slot_03_species", 2, U),
    FieldDef::new("walk_slot_04_species", 2, U),
    FieldDef::new("walk_slot_05_species", 2, U),
    FieldDef::new("walk_slot_06_species", 2, U),
    FieldDef::new("walk_slot_07_species", 2, U),
    FieldDef::new("walk_slot_08_species", 2, U),
    FieldDef::new("walk_slot_09_species", 2, U),
    FieldDef::new("walk_slot_10_species", 2, U),
    FieldDef::new("walk_slot_11_species", 2, U),
    FieldDef::new("walk_slot_12_species", 2, U),
    FieldDef::new("surf_slot_01_min_level", 1, U),
    FieldDef::new("surf_slot_01_max_level", 1, U),
    FieldDef::new("surf_slot_01_species", 2, U),
    FieldDef::new("surf_slot_02_min_level", 1, U),
    FieldDef::new("surf_slot_02_max_level", 1, U),
    FieldDef::new("surf_slot_02_species", 2, U),
    FieldDef::new("surf_slot_03_min_level", 1, U),
    FieldDef::new("surf_slot_03_max_level", 1, U),
    FieldDef::new("surf_slot_03_species", 2, U),
    FieldDef::new("surf_slot_04_min_level", 1, U),
    FieldDef::new("surf_slot_04_max_level", 1, U),
    FieldDef::new("surf_slot_04_species", 2, U),
    FieldDef::new("surf_slot_05_min_level", 1, U),
    FieldDef::new("surf_slot_05_max_level", 1, U),
    FieldDef::new("surf_slot_05_species", 2, U),
    FieldDef::new("old_rod_slot_01_min_level", 1, U),
    FieldDef::new("old_rod_slot_01_max_level", 1, U),
    FieldDef::new("old_rod_slot_01_species", 2, U),
    FieldDef::new("old_rod_slot_02_min_level", 1, U),
    FieldDef::new("old_rod_slot_02_max_level", 1, U),
    FieldDef::new("old_rod_slot_02_species", 2, U),
    FieldDef::new("old_rod_slot_03_min_level", 1, U),
    FieldDef::new("old_rod_slot_03_max_level", 1, U),
    FieldDef::new("old_rod_slot_03_species", 2, U),
    FieldDef::new("old_rod_slot_04_min_level", 1, U),
    FieldDef::new("old_rod_slot_04_max_level", 1, U),
    FieldDef::new("old_rod_slot_04_species", 2, U),
    FieldDef::new("old_rod_slot_05_min_level", 1, U),
    FieldDef::new("old_rod_slot_05_max_level", 1, U),
    FieldDef::new("old_rod_slot_05_species", 2, U),
    FieldDef::new("good_rod_slot_01_min_level", 1, U),
    FieldDef::new("good_rod_slot_01_max_level", 1, U),
    FieldDef::new("good_rod_slot_01_species", 2, U),
    FieldDef::new("good_rod_slot_02_min_level", 1, U),
    FieldDef::new("good_rod_slot_02_max_level", 1, U),
    FieldDef::new("good_rod_slot_02_species", 2, U),
    FieldDef::new("good_rod_slot_03_min_level", 1, U),
    FieldDef::new("good_rod_slot_03_max_level", 1, U),
    FieldDef::new("good_rod_slot_03_species", 2, U),
    FieldDef::new("good_rod_slot_04_min_level", 1, U),
    FieldDef::new("good_rod_slot_04_max_level", 1, U),
    FieldDef::new("good_rod_slot_04_species", 2, U),
    FieldDef::new("good_rod_slot_05_min_level", 1, U),
    FieldDef::new("good_rod_slot_05_max_level", 1, U),
    FieldDef::new("good_rod_slot_05_species", 2, U),
    FieldDef::new("super_rod_slot_01_min_level", 1, U),
    FieldDef::new("super_rod_slot_01_max_level", 1, U),
    FieldDef::new("super_rod_slot_01_species", 2, U),
    FieldDef::new("super_rod_slot_02_min_level", 1, U),
    FieldDef::new("super_rod_slot_02_max_level", 1, U),
    FieldDef::new("super_rod_slot_02_species", 2, U),
    FieldDef::new("super_rod_slot_03_min_level", 1, U),
    FieldDef::new("super_rod_slot_03_max_level", 1, U),
    FieldDef::new("super_rod_slot_03_species", 2, U),
    FieldDef::new("super_rod_slot_04_min_level", 1, U),
    FieldDef::new("super_rod_slot_04_max_level", 1, U),
    FieldDef::new("super_rod_slot_04_species", 2, U),
    FieldDef::new("super_rod_slot_05_min_level", 1, U),
    FieldDef::new("super_rod_slot_05_max_level", 1, U),
    FieldDef::new("super_rod_slot_05_species", 2, U),
    FieldDef::new("walk_swarm_species", 2, U),
    FieldDef::new("surf_swarm_species", 2, U),
    FieldDef::new("rod_night_species", 2, U),
    FieldDef::new("rod_swarm_species", 2, U),
    // Time-of-day and radio slot data the table does not cover.
    FieldDef::new("unused", 64, Encoding::Opaque),
];

fn header() -> Vec<&'static str> {
    let mut header = vec!["encounterset_id"];
    header.extend(
        FIELDS
            .iter()
            .filter(|field| {
                !matches!(field.encoding, Encoding::Padding | Encoding::Opaque)
            })
            .map(|field| field.name),
    );
    header
}

fn export_one(
    ctx: &ExportContext,
    source_rel: &str,
    output_name: &str,
    report: &mut Report,
) -> Result<(PathBuf, PathBuf), Error> {
    let (source_path, source) = ctx.open_source(source_rel)?;
    let payload = source.len().saturating_sub(BASE_OFFSET);
    if payload % STRIDE != 0 {
        report.warn(format!(
            "{source_rel}: {} trailing byte(s) after the last encounter set ignored",
            payload % STRIDE
        ));
    }

    let layout = LayoutDescriptor::new(
        BASE_OFFSET,
        Some(STRIDE),
        FIELDS.to_vec(),
        Termination::FixedCount(0),
    )?
    .fill_to_end(&source)?;

    let mut table = TableWriter::create(ctx.out(output_name), &header())?;
    for result in RecordDecoder::new(&source, &layout).records() {
        let record = result?;
        let mapped = map_record(&record, &layout)?;
        for warning in mapped.warnings {
            report.warn(format!("{source_rel}: {warning}"));
        }
        let mut row = Vec::with_capacity(FIELDS.len());
        row.push(Value::UInt(record.index as u64));
        for (_, value) in mapped.record.fields {
            row.push(value);
        }
        table.write_row(&row)?;
    }
    Ok((source_path, table.finish()?))
}

pub fn export(ctx: &ExportContext) -> Result<BlockRun, Error> {
    let mut report = Report::new();
    let mut sources = Vec::new();
    let mut outputs = Vec::new();
    let mut first_failure: Option<Error> = None;

    for (source_rel, output_name) in [
        (SOURCE_HG, "encounters_hg.csv"),
        (SOURCE_SS, "encounters_ss.csv"),
    ] {
        match export_one(ctx, source_rel, output_name, &mut report) {
            Ok((source, output)) => {
                sources.push(source);
                outputs.push(output);
            }
            Err(err) => {
                report.warn(format!("{source_rel}: {err}"));
                if first_failure.is_none() {
                    first_failure = Some(err);
                }
            }
        }
    }

    if outputs.is_empty() {
        if let Some(err) = first_failure {
            return Err(err);
        }
    }
    ctx.finish(NAME, report, sources, outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn encounter_set() -> Vec<u8> {
        let mut record = vec![0u8; STRIDE];
        record[0] = 25; // walk_rate
        record[8] = 4; // walk_slot_01_level
        record[20] = 19; // walk_slot_01_species lo
        record
    }

    fn write_source(root: &TempDir, rel: &str, sets: usize) {
        let path = root.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut data = vec![0u8; BASE_OFFSET];
        for _ in 0..sets {
            data.extend_from_slice(&encounter_set());
        }
        fs::write(path, data).unwrap();
    }

    #[test]
    fn field_widths_cover_the_record() {
        let total: usize = FIELDS.iter().map(|f| f.width).sum();
        assert_eq!(total, STRIDE);
    }

    #[test]
    fn exports_both_versions() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_source(&dir, SOURCE_HG, 2);
        write_source(&dir, SOURCE_SS, 1);

        let ctx = ExportContext::new(dir.path(), out.path());
        let run = export(&ctx).unwrap();
        assert_eq!(run.outputs.len(), 2);
        let hg = fs::read_to_string(&run.outputs[0]).unwrap();
        let rows: Vec<&str> = hg.lines().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[1].starts_with("0,25,0,0,0,0,0,4,"));
    }

    #[test]
    fn one_missing_version_still_exports_the_other() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_source(&dir, SOURCE_HG, 1);

        let ctx = ExportContext::new(dir.path(), out.path());
        let run = export(&ctx).unwrap();
        assert_eq!(run.outputs.len(), 1);
        assert!(run.had_warnings);
    }

    #[test]
    fn both_versions_missing_is_an_error() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let ctx = ExportContext::new(dir.path(), out.path());
        assert!(export(&ctx).is_err());
    }
}
