// Trainer rosters: two parallel containers, one 20-byte properties member and
// one variable-length party member per trainer. Party record width depends on
// the properties' flag byte, so this block decodes with a cursor instead of a
// fixed field table.
use crate::blocks::{BlockRun, ExportContext};
use crate::core::error::{Error, ErrorKind};
use crate::core::narc::extract_members;
use crate::core::row::{Value, hex};
use crate::core::source::ByteSource;
use crate::report::Report;
use crate::tabular::TableWriter;

pub const NAME: &str = "trainers";

const SOURCE_PROPS: &str = "data/a/0/5/5";
const SOURCE_PARTY: &str = "data/a/0/5/6";
const PROPS_SIZE: usize = 20;
const MAX_PARTY: usize = 6;

const AI_FLAGS: [&str; 11] = [
    "ai_flag_00_basic",
    "ai_flag_01_evaluate_attack",
    "ai_flag_02_expert",
    "ai_flag_03_setup",
    "ai_flag_04_risky",
    "ai_flag_05_damage_priority",
    "ai_flag_06_baton_pass",
    "ai_flag_07_tag_strategy",
    "ai_flag_08_check_hp",
    "ai_flag_09_weather",
    "ai_flag_10_harassment",
];

const MEMBER_COLUMNS: [&str; 11] = [
    "dv",
    "ability_slot",
    "gender",
    "level",
    "species_id",
    "held_item",
    "explicit_move_id_1",
    "explicit_move_id_2",
    "explicit_move_id_3",
    "explicit_move_id_4",
    "ball_seal",
];

struct Properties {
    party_flags: u8,
    trainer_class: u8,
    unused: u8,
    party_size: u8,
    items: [u64; 4],
    ai_flags: u64,
    battle_flags: u64,
}

fn parse_properties(member: &ByteSource, trainer_id: usize) -> Result<Properties, Error> {
    if member.len() != PROPS_SIZE {
        return Err(Error::new(ErrorKind::LayoutMismatch).with_message(format!(
            "trainer {trainer_id}: properties member is {} bytes, expected {PROPS_SIZE}",
            member.len()
        )));
    }
    let mut cursor = member.cursor_at(0);
    let party_flags = cursor.read_u8()?;
    let trainer_class = cursor.read_u8()?;
    let unused = cursor.read_u8()?;
    let party_size = cursor.read_u8()?;
    let mut items = [0u64; 4];
    for item in &mut items {
        *item = cursor.read_u16_le()? as u64;
    }
    let ai_flags = cursor.read_u32_le()? as u64;
    let battle_flags = cursor.read_u32_le()? as u64;
    Ok(Properties {
        party_flags,
        trainer_class,
        unused,
        party_size,
        items,
        ai_flags,
        battle_flags,
    })
}

struct PartyMember {
    dv: u64,
    attr: u8,
    level: u64,
    species: u64,
    held_item: Option<u64>,
    moves: Option<[u64; 4]>,
    ball_seal: u64,
}

impl PartyMember {
    fn gender(&self) -> &'static str {
        match self.attr & 0x03 {
            0x01 => "explicit_male",
            0x02 => "explicit_female",
            _ => "auto",
        }
    }

    fn ability_slot(&self) -> &'static str {
        match self.attr & 0x30 {
            0x10 => "explicit_1",
            0x20 => "explicit_2",
            _ => "auto",
        }
    }
}

fn parse_party(
    member: &ByteSource,
    props: &Properties,
    trainer_id: usize,
    report: &mut Report,
) -> Result<Vec<PartyMember>, Error> {
    let moves_on = props.party_flags & 0x01 != 0;
    let items_on = props.party_flags & 0x02 != 0;
    let per_mon = 8 + if moves_on { 8 } else { 0 } + if items_on { 2 } else { 0 };
    let party_size = props.party_size as usize;
    let expected = party_size * per_mon;
    let actual = member.len();

    if actual < expected {
        return Err(Error::new(ErrorKind::Truncated).with_message(format!(
            "trainer {trainer_id}: party member holds {actual} bytes, needs {expected} \
             (flags 0x{:02X}, size {party_size}, preview {})",
            props.party_flags,
            hex(member.read(0, actual.min(32))?)
        )));
    }
    classify_trailing(trainer_id, per_mon, expected, member, report)?;

    let mut cursor = member.cursor_at(0);
    let mut mons = Vec::with_capacity(party_size);
    for _ in 0..party_size {
        let dv = cursor.read_u8()? as u64;
        let attr = cursor.read_u8()?;
        let level = cursor.read_u16_le()? as u64;
        let species = cursor.read_u16_le()? as u64;
        let held_item = if items_on {
            Some(cursor.read_u16_le()? as u64)
        } else {
            None
        };
        let moves = if moves_on {
            let mut moves = [0u64; 4];
            for slot in &mut moves {
                *slot = cursor.read_u16_le()? as u64;
            }
            Some(moves)
        } else {
            None
        };
        let ball_seal = cursor.read_u16_le()? as u64;
        mons.push(PartyMember {
            dv,
            attr,
            level,
            species,
            held_item,
            moves,
            ball_seal,
        });
    }
    Ok(mons)
}

fn align4(n: usize) -> usize {
    (n + 3) & !3
}

/// Party members whose payload runs past `party_size * per_mon`: a lone
/// 2-byte tail restoring 4-byte alignment is expected, whole extra records
/// are phantom members, anything else is an irregular tail.
fn classify_trailing(
    trainer_id: usize,
    per_mon: usize,
    expected: usize,
    member: &ByteSource,
    report: &mut Report,
) -> Result<(), Error> {
    let actual = member.len();
    let extra = actual.saturating_sub(expected);
    if extra > 0 {
        if expected % 4 == 2 && actual == align4(expected) && extra == 2 {
            report.info(format!(
                "trainer {trainer_id}: alignment padding detected (ignored), \
                 expected_len={expected} actual_len={actual}"
            ));
        } else if per_mon > 0 && extra % per_mon == 0 {
            let preview = member.read(expected, per_mon.min(16).min(extra))?;
            report.warn(format!(
                "trainer {trainer_id}: phantom party member data detected (ignored), \
                 expected_len={expected} actual_len={actual} \
                 inferred_extra_members={} preview={}",
                extra / per_mon,
                hex(preview)
            ));
        } else {
            let preview = member.read(expected, extra.min(16))?;
            report.warn(format!(
                "trainer {trainer_id}: unexpected trailing bytes beyond alignment \
                 region (ignored), expected_len={expected} actual_len={actual} \
                 extra_len={extra} preview={}",
                hex(preview)
            ));
        }
    }

    // Bytes inside the alignment window are zero in well-formed data.
    let pad_end = actual.min(align4(expected));
    if pad_end > expected {
        let pad = member.read(expected, pad_end - expected)?;
        if pad.iter().all(|b| *b == 0x00) {
            // silent
        } else if pad.iter().all(|b| *b == 0xFF) {
            report.info(format!(
                "trainer {trainer_id}: alignment-region bytes use 0xFF ({})",
                hex(pad)
            ));
        } else {
            report.warn(format!(
                "trainer {trainer_id}: unexpected bytes in alignment region after \
                 payload: {}",
                hex(pad)
            ));
        }
    }
    Ok(())
}

fn header() -> Vec<String> {
    let mut header = vec![
        "trainer_id".to_string(),
        "party_flag_explicit_moves".to_string(),
        "party_flag_enable_held_items".to_string(),
        "trainer_class_id".to_string(),
        "party_size".to_string(),
    ];
    header.extend((1..=4).map(|i| format!("trainer_item_id_{i}")));
    header.extend(AI_FLAGS.iter().map(|name| name.to_string()));
    header.push("battle_flag_doubles".to_string());
    for member in 1..=MAX_PARTY {
        header.extend(
            MEMBER_COLUMNS
                .iter()
                .map(|column| format!("party_member_{member}_{column}")),
        );
    }
    header
}

pub fn export(ctx: &ExportContext) -> Result<BlockRun, Error> {
    let (props_path, props_source) = ctx.open_source(SOURCE_PROPS)?;
    let (party_path, party_source) = ctx.open_source(SOURCE_PARTY)?;
    let prop_members = extract_members(&props_source)?;
    let party_members = extract_members(&party_source)?;
    if prop_members.len() != party_members.len() {
        return Err(Error::new(ErrorKind::LayoutMismatch).with_message(format!(
            "properties/party member count mismatch: {} vs {}",
            prop_members.len(),
            party_members.len()
        )));
    }

    let mut report = Report::new();
    let mut table = TableWriter::create(ctx.out("trainers.csv"), &header())?;

    for (trainer_id, (prop_member, party_member)) in
        prop_members.iter().zip(&party_members).enumerate()
    {
        let props = parse_properties(prop_member, trainer_id)?;
        if props.party_flags & !0x03 != 0 {
            return Err(Error::new(ErrorKind::LayoutMismatch).with_message(format!(
                "trainer {trainer_id}: unsupported party flags 0x{:02X}",
                props.party_flags
            )));
        }
        if props.unused != 0 {
            report.warn(format!(
                "trainer {trainer_id}: expected unused byte 0x00 but found 0x{:02X}",
                props.unused
            ));
        }

        // Trainer 0 is the null entry: empty party, 8 zero bytes of payload.
        let mons = if trainer_id == 0 {
            if props.party_size != 0 {
                return Err(Error::new(ErrorKind::LayoutMismatch).with_message(format!(
                    "trainer 0: expected party_size 0 but found {}",
                    props.party_size
                )));
            }
            if party_member.bytes() != [0u8; 8] {
                return Err(Error::new(ErrorKind::LayoutMismatch).with_message(format!(
                    "trainer 0: expected 8 zero bytes but found {}",
                    hex(party_member.bytes())
                )));
            }
            continue;
        } else {
            if !(1..=MAX_PARTY).contains(&(props.party_size as usize)) {
                return Err(Error::new(ErrorKind::LayoutMismatch).with_message(format!(
                    "trainer {trainer_id}: party_size {} outside expected range 1..6",
                    props.party_size
                )));
            }
            parse_party(party_member, &props, trainer_id, &mut report)?
        };

        let moves_on = props.party_flags & 0x01 != 0;
        let items_on = props.party_flags & 0x02 != 0;
        let mut row = Vec::with_capacity(21 + MAX_PARTY * MEMBER_COLUMNS.len());
        row.push(Value::UInt(trainer_id as u64));
        row.push(Value::UInt(moves_on as u64));
        row.push(Value::UInt(items_on as u64));
        row.push(Value::UInt(props.trainer_class as u64));
        row.push(Value::UInt(props.party_size as u64));
        for item in props.items {
            row.push(Value::UInt(item));
        }
        for bit in 0..AI_FLAGS.len() {
            row.push(Value::UInt((props.ai_flags >> bit) & 1));
        }
        row.push(Value::UInt((props.battle_flags >> 1) & 1));

        for slot in 0..MAX_PARTY {
            match mons.get(slot) {
                Some(mon) => {
                    row.push(Value::UInt(mon.dv));
                    row.push(Value::Text(mon.ability_slot().to_string()));
                    row.push(Value::Text(mon.gender().to_string()));
                    row.push(Value::UInt(mon.level));
                    row.push(Value::UInt(mon.species));
                    row.push(match mon.held_item {
                        Some(item) => Value::UInt(item),
                        None => Value::Empty,
                    });
                    match mon.moves {
                        Some(moves) => row.extend(moves.iter().map(|m| Value::UInt(*m))),
                        None => row.extend(std::iter::repeat_n(Value::Empty, 4)),
                    }
                    row.push(Value::UInt(mon.ball_seal));
                }
                None => row.extend(std::iter::repeat_n(Value::Empty, MEMBER_COLUMNS.len())),
            }
        }
        table.write_row(&row)?;
    }

    let outputs = vec![table.finish()?];
    ctx.finish(NAME, report, vec![props_path, party_path], outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::narc::testutil::build_narc;
    use std::fs;
    use tempfile::TempDir;

    fn props(party_flags: u8, class: u8, size: u8) -> Vec<u8> {
        let mut block = vec![party_flags, class, 0, size];
        block.extend_from_slice(&[0u8; 8]); // items
        block.extend_from_slice(&1u32.to_le_bytes()); // ai_flags: basic
        block.extend_from_slice(&2u32.to_le_bytes()); // battle_flags: doubles
        block
    }

    fn write_sources(root: &TempDir, props_members: &[&[u8]], party_members: &[&[u8]]) {
        for (rel, members) in [(SOURCE_PROPS, props_members), (SOURCE_PARTY, party_members)] {
            let path = root.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, build_narc(members)).unwrap();
        }
    }

    #[test]
    fn exports_parties_with_flag_dependent_width() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        // trainer 1: moves+items on, one member of 18 bytes
        let mut mon = vec![
            7,    // dv
            0x11, // attr: explicit_male, explicit_1
        ];
        mon.extend_from_slice(&30u16.to_le_bytes()); // level
        mon.extend_from_slice(&155u16.to_le_bytes()); // species
        mon.extend_from_slice(&211u16.to_le_bytes()); // held item
        for m in [52u16, 108, 0, 0] {
            mon.extend_from_slice(&m.to_le_bytes());
        }
        mon.extend_from_slice(&0u16.to_le_bytes()); // ball seal
        mon.extend_from_slice(&[0, 0]); // alignment word

        let p0 = props(0, 0, 0);
        let p1 = props(0x03, 5, 1);
        write_sources(&dir, &[&p0, &p1], &[&[0u8; 8], &mon]);

        let ctx = ExportContext::new(dir.path(), out.path());
        let run = export(&ctx).unwrap();
        let csv = fs::read_to_string(&run.outputs[0]).unwrap();
        let rows: Vec<&str> = csv.lines().collect();
        // trainer 0 validated but skipped
        assert_eq!(rows.len(), 2);
        let cells: Vec<&str> = rows[1].split(',').collect();
        assert_eq!(cells[0], "1"); // trainer_id
        assert_eq!(cells[1], "1"); // explicit moves
        assert_eq!(cells[2], "1"); // held items
        assert_eq!(cells[3], "5"); // class
        assert_eq!(cells[9], "1"); // ai_flag_00_basic
        assert_eq!(cells[20], "1"); // battle_flag_doubles
        assert_eq!(cells[21], "7"); // dv
        assert_eq!(cells[22], "explicit_1");
        assert_eq!(cells[23], "explicit_male");
        assert_eq!(cells[24], "30");
        assert_eq!(cells[25], "155");
        assert_eq!(cells[26], "211");
        assert_eq!(cells[27], "52");
        // member 2 columns are empty
        assert_eq!(cells[32], "");
    }

    #[test]
    fn bad_party_flags_abort_the_block() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let p0 = props(0, 0, 0);
        let p1 = props(0x80, 0, 1);
        write_sources(&dir, &[&p0, &p1], &[&[0u8; 8], &[0u8; 8]]);

        let ctx = ExportContext::new(dir.path(), out.path());
        let err = export(&ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LayoutMismatch);
    }

    #[test]
    fn member_count_mismatch_is_an_error() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let p0 = props(0, 0, 0);
        write_sources(&dir, &[&p0], &[&[0u8; 8], &[0u8; 8]]);

        let ctx = ExportContext::new(dir.path(), out.path());
        assert!(export(&ctx).is_err());
    }

    #[test]
    fn short_party_payload_is_truncated() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let p0 = props(0, 0, 0);
        let p1 = props(0, 0, 2); // two 8-byte members expected
        write_sources(&dir, &[&p0, &p1], &[&[0u8; 8], &[0u8; 8]]);

        let ctx = ExportContext::new(dir.path(), out.path());
        let err = export(&ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Truncated);
    }
}
