// Constant lookup tables from the expanded text archives: one CSV per table,
// each a plain id/text mapping. Line 1 of every archive repeats the archive
// number and is skipped; record ids are 0-based line positions after that.
use std::fs;
use std::path::PathBuf;

use crate::blocks::{BlockRun, ExportContext};
use crate::core::error::{Error, ErrorKind};
use crate::core::row::Value;
use crate::report::Report;
use crate::tabular::TableWriter;

pub const NAME: &str = "constants";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Transform {
    /// Line used as-is.
    Verbatim,
    /// Strip the `{TRAINER_NAME: ...}` wrapper.
    TrainerName,
    /// Expand the `[PK][MN]` glyph pair.
    TrainerClass,
    /// Four-line move description folded to one line.
    MoveDescription,
    /// Two-line description folded to one line.
    Description,
}

struct TableSpec {
    source: &'static str,
    output: &'static str,
    id_column: &'static str,
    text_column: &'static str,
    transform: Transform,
}

const fn spec(
    source: &'static str,
    output: &'static str,
    id_column: &'static str,
    text_column: &'static str,
    transform: Transform,
) -> TableSpec {
    TableSpec {
        source,
        output,
        id_column,
        text_column,
        transform,
    }
}

const SPECS: [TableSpec; 12] = [
    spec(
        "expanded/textArchives/0222.txt",
        "constants_item_names.csv",
        "item_id",
        "item_name",
        Transform::Verbatim,
    ),
    spec(
        "expanded/textArchives/0237.txt",
        "constants_species_names.csv",
        "species_id",
        "species_name",
        Transform::Verbatim,
    ),
    spec(
        "expanded/textArchives/0720.txt",
        "constants_ability_names.csv",
        "ability_id",
        "ability_name",
        Transform::Verbatim,
    ),
    spec(
        "expanded/textArchives/0729.txt",
        "constants_trainer_names.csv",
        "trainer_id",
        "trainer_name",
        Transform::TrainerName,
    ),
    spec(
        "expanded/textArchives/0730.txt",
        "constants_trainer_class_names.csv",
        "trainer_class_id",
        "trainer_class_name",
        Transform::TrainerClass,
    ),
    spec(
        "expanded/textArchives/0735.txt",
        "constants_type_names.csv",
        "type_id",
        "type_name",
        Transform::Verbatim,
    ),
    spec(
        "expanded/textArchives/0749.txt",
        "constants_move_descriptions.csv",
        "move_id",
        "move_description",
        Transform::MoveDescription,
    ),
    spec(
        "expanded/textArchives/0750.txt",
        "constants_move_names.csv",
        "move_id",
        "move_name",
        Transform::Verbatim,
    ),
    spec(
        "expanded/textArchives/0279.txt",
        "constants_location_names.csv",
        "location_id",
        "location_name",
        Transform::Verbatim,
    ),
    spec(
        "expanded/textArchives/0221.txt",
        "constants_item_descriptions.csv",
        "item_id",
        "item_description",
        Transform::Description,
    ),
    spec(
        "expanded/textArchives/0803.txt",
        "constants_species_descriptions_hg.csv",
        "species_id",
        "species_description",
        Transform::Description,
    ),
    spec(
        "expanded/textArchives/0804.txt",
        "constants_species_descriptions_ss.csv",
        "species_id",
        "species_description",
        Transform::Description,
    ),
];

const BREAK: &str = "\\n";
const TRAINER_NAME_OPEN: &str = "{TRAINER_NAME:";

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fold literal `\n` sequences out of a multi-line description: trailing
/// breaks are dropped, internal ones become spaces.
fn fold_breaks(s: &str) -> String {
    let mut s = s;
    while let Some(stripped) = s.strip_suffix(BREAK) {
        s = stripped;
    }
    collapse_whitespace(&s.replace(BREAK, " "))
}

fn apply_transform(
    transform: Transform,
    line: &str,
    context: &str,
    report: &mut Report,
) -> String {
    match transform {
        Transform::Verbatim => line.to_string(),
        Transform::TrainerName => {
            let inner = line
                .strip_prefix(TRAINER_NAME_OPEN)
                .and_then(|rest| rest.strip_suffix('}'));
            match inner {
                Some(name) => name.trim().to_string(),
                None => {
                    report.info(format!(
                        "{context}: trainer name did not match wrapper; kept raw value"
                    ));
                    line.to_string()
                }
            }
        }
        Transform::TrainerClass => line.replace("[PK][MN]", "Pok\u{e9}mon"),
        Transform::MoveDescription => {
            let count = line.matches(BREAK).count();
            match count {
                4 => {}
                // Vanilla data carries a handful of 3- and 5-line entries.
                3 | 5 => report.info(format!(
                    "{context}: expected 4 literal \\n sequences, found {count}"
                )),
                _ => report.warn(format!(
                    "{context}: expected 4 literal \\n sequences, found {count}"
                )),
            }
            fold_breaks(line)
        }
        Transform::Description => {
            let count = line.matches(BREAK).count();
            if count >= 3 {
                report.warn(format!("{context}: unexpected literal \\n count {count}"));
            }
            fold_breaks(line)
        }
    }
}

/// Archives are UTF-8, possibly with a BOM. A strict decode is tried first;
/// a lossy fallback keeps the export going but is worth a warning.
fn read_archive(path: &PathBuf, report: &mut Report) -> Result<String, Error> {
    let bytes = fs::read(path).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read text archive")
            .with_path(path.clone())
            .with_source(err)
    })?;
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text.to_string()),
        Err(_) => {
            report.warn(format!(
                "{}: strict UTF-8 decode failed; replacement characters used",
                path.display()
            ));
            Ok(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

pub fn export(ctx: &ExportContext) -> Result<BlockRun, Error> {
    // All twelve archives or nothing.
    let missing: Vec<String> = SPECS
        .iter()
        .filter(|spec| !ctx.source_root.join(spec.source).exists())
        .map(|spec| spec.source.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(Error::new(ErrorKind::NotFound)
            .with_message(format!(
                "{} required text archive(s) missing: {}",
                missing.len(),
                missing.join(", ")
            ))
            .with_hint("Export the text archives before running this block."));
    }

    let mut report = Report::new();
    let mut sources = Vec::new();
    let mut outputs = Vec::new();

    for spec in &SPECS {
        let source_path = ctx.source_path(spec.source)?;
        let text = read_archive(&source_path, &mut report)?;
        let mut lines = text.lines();
        let archive_name = source_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if lines.next().is_none() {
            report.warn(format!("{archive_name}: empty archive; no table written"));
            continue;
        }

        let mut table = TableWriter::create(
            ctx.out(spec.output),
            &[spec.id_column, spec.text_column],
        )?;
        let mut wrote = false;
        for (index, line) in lines.enumerate() {
            // raw_line counts from 1 and includes the skipped header line
            let context = format!("{archive_name}:record_index={index},raw_line={}", index + 2);
            let value = apply_transform(spec.transform, line, &context, &mut report);
            table.write_row(&[Value::UInt(index as u64), Value::Text(value)])?;
            wrote = true;
        }
        if !wrote {
            report.warn(format!("{archive_name}: no records after the header line"));
        }
        sources.push(source_path);
        outputs.push(table.finish()?);
    }

    ctx.finish(NAME, report, sources, outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn fold_breaks_drops_trailing_and_joins_internal() {
        assert_eq!(fold_breaks("A strong\\nattack\\n\\n"), "A strong attack");
        assert_eq!(fold_breaks("one line"), "one line");
    }

    #[test]
    fn trainer_name_wrapper_is_stripped() {
        let mut report = Report::new();
        let value = apply_transform(
            Transform::TrainerName,
            "{TRAINER_NAME: Falkner}",
            "test",
            &mut report,
        );
        assert_eq!(value, "Falkner");
        assert!(report.is_empty());

        let raw = apply_transform(Transform::TrainerName, "Falkner", "test", &mut report);
        assert_eq!(raw, "Falkner");
        assert!(!report.is_empty());
    }

    #[test]
    fn move_description_break_counts_are_graded() {
        let mut report = Report::new();
        apply_transform(Transform::MoveDescription, "a\\nb\\nc\\nd\\n", "t", &mut report);
        assert!(report.is_empty());
        apply_transform(Transform::MoveDescription, "a\\nb\\nc\\n", "t", &mut report);
        assert!(!report.has_warnings()); // 3 breaks is informational
        apply_transform(Transform::MoveDescription, "a\\n", "t", &mut report);
        assert!(report.has_warnings());
    }

    #[test]
    fn missing_archive_fails_before_any_output() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let archives = dir.path().join("expanded/textArchives");
        fs::create_dir_all(&archives).unwrap();
        // only one of the twelve archives present
        fs::write(archives.join("0222.txt"), "222\nPotion\n").unwrap();

        let ctx = ExportContext::new(dir.path(), out.path());
        let err = export(&ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn exports_all_archives_with_skipped_header() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let archives = dir.path().join("expanded/textArchives");
        fs::create_dir_all(&archives).unwrap();
        for spec in &SPECS {
            let name = dir.path().join(spec.source);
            fs::write(name, "header\nfirst\nsecond\n").unwrap();
        }
        fs::write(
            archives.join("0729.txt"),
            "729\n{TRAINER_NAME: Joey}\n{TRAINER_NAME: Silver}\n",
        )
        .unwrap();

        let ctx = ExportContext::new(dir.path(), out.path());
        let run = export(&ctx).unwrap();
        assert_eq!(run.outputs.len(), 12);
        let trainers = run
            .outputs
            .iter()
            .find(|p| p.ends_with("constants_trainer_names.csv"))
            .unwrap();
        let csv = fs::read_to_string(trainers).unwrap();
        assert_eq!(
            csv.lines().collect::<Vec<_>>(),
            vec!["trainer_id,trainer_name", "0,Joey", "1,Silver"]
        );
    }
}
