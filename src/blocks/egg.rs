// Egg move learnsets: a single u16 stream where values >= 20000 open a new
// species group (id = value - 20000) and lower values are that group's moves.
use crate::blocks::{BlockRun, ExportContext};
use crate::core::error::Error;
use crate::core::policy::{ExceptionPolicy, Verdict};
use crate::core::row::Value;
use crate::report::Report;
use crate::tabular::TableWriter;

pub const NAME: &str = "egg";

const SOURCE: &str = "data/a/2/2/9";
const BASE_OFFSET: usize = 0x3C;
const GROUP_MARKER_BASE: u16 = 20000;
const STREAM_END: u16 = 0xFFFF;
const MAX_MOVES: usize = 16;

fn header() -> Vec<String> {
    let mut header = vec!["species_id".to_string()];
    header.extend((1..=MAX_MOVES).map(|i| format!("egg_move_{i:02}")));
    header
}

pub fn export(ctx: &ExportContext) -> Result<BlockRun, Error> {
    let (source_path, source) = ctx.open_source(SOURCE)?;
    let policy = ExceptionPolicy::species();
    let mut report = Report::new();
    let mut table = TableWriter::create(ctx.out("egg_learnsets.csv"), &header())?;

    let mut flush = |species: Option<u16>,
                     moves: &mut Vec<u16>,
                     report: &mut Report|
     -> Result<(), Error> {
        let Some(raw_id) = species else {
            moves.clear();
            return Ok(());
        };
        let species_id = match policy.resolve(raw_id) {
            Verdict::Keep(id) => id,
            Verdict::Skip | Verdict::Alias(_) => {
                moves.clear();
                return Ok(());
            }
        };
        if moves.len() > MAX_MOVES {
            report.warn(format!(
                "species {species_id} lists {} egg moves; keeping the first {MAX_MOVES}",
                moves.len()
            ));
            moves.truncate(MAX_MOVES);
        }
        let mut row = Vec::with_capacity(MAX_MOVES + 1);
        row.push(Value::UInt(species_id as u64));
        row.extend(moves.iter().map(|m| Value::UInt(*m as u64)));
        row.resize(MAX_MOVES + 1, Value::Empty);
        moves.clear();
        table.write_row(&row)
    };

    let mut cursor = source.cursor_at(BASE_OFFSET);
    let mut current: Option<u16> = None;
    let mut moves: Vec<u16> = Vec::new();
    while cursor.remaining() >= 2 {
        let value = cursor.read_u16_le()?;
        if value == STREAM_END {
            break;
        }
        if value >= GROUP_MARKER_BASE {
            flush(current, &mut moves, &mut report)?;
            current = Some(value - GROUP_MARKER_BASE);
        } else if current.is_some() {
            moves.push(value);
        } else {
            report.warn(format!("move {value} before any species marker; dropped"));
        }
    }
    flush(current, &mut moves, &mut report)?;

    let outputs = vec![table.finish()?];
    ctx.finish(NAME, report, vec![source_path], outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn u16s(values: &[u16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn groups_moves_under_marker_species() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let path = dir.path().join(SOURCE);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut data = vec![0u8; BASE_OFFSET];
        data.extend(u16s(&[20001, 33, 45, 20004, 7, 0xFFFF]));
        fs::write(path, data).unwrap();

        let ctx = ExportContext::new(dir.path(), out.path());
        let run = export(&ctx).unwrap();
        let csv = fs::read_to_string(&run.outputs[0]).unwrap();
        let rows: Vec<&str> = csv.lines().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[1].starts_with("1,33,45,"));
        assert!(rows[2].starts_with("4,7,"));
        // 16 move columns, empty cells after the listed moves
        assert_eq!(rows[1].split(',').count(), 17);
        assert!(!run.had_warnings);
    }
}
