// Species personal data: base stats, typing, breeding data, and the packed
// machine-learnset flags, all in one 44-byte record per species.
use crate::blocks::{BlockRun, ExportContext};
use crate::core::decoder::RecordDecoder;
use crate::core::error::Error;
use crate::core::layout::{Encoding, FieldDef, LayoutDescriptor, Termination};
use crate::core::policy::{ExceptionPolicy, Verdict};
use crate::core::row::{Value, map_record};
use crate::report::Report;
use crate::tabular::TableWriter;

pub const NAME: &str = "personal";

const SOURCE: &str = "data/a/0/0/2";
const BASE_OFFSET: usize = 0x1014;
const STRIDE: usize = 44;
const MACHINE_COUNT: usize = 100;

const FIELDS: &[FieldDef] = &[
    FieldDef::new("base_stat_hp", 1, Encoding::Unsigned),
    FieldDef::new("base_stat_atk", 1, Encoding::Unsigned),
    FieldDef::new("base_stat_def", 1, Encoding::Unsigned),
    FieldDef::new("base_stat_spd", 1, Encoding::Unsigned),
    FieldDef::new("base_stat_spatk", 1, Encoding::Unsigned),
    FieldDef::new("base_stat_spdef", 1, Encoding::Unsigned),
    FieldDef::new("type_1", 1, Encoding::Unsigned),
    FieldDef::new("type_2", 1, Encoding::Unsigned),
    FieldDef::new("catch_rate", 1, Encoding::Unsigned),
    FieldDef::new("base_exp_yield", 1, Encoding::Unsigned),
    FieldDef::new("ev_yield", 2, Encoding::Unsigned),
    FieldDef::new("held_item_1", 2, Encoding::Unsigned),
    FieldDef::new("held_item_2", 2, Encoding::Unsigned),
    FieldDef::new("gender_ratio", 1, Encoding::Unsigned),
    FieldDef::new("hatch_steps_rate", 1, Encoding::Unsigned),
    FieldDef::new("base_friendship", 1, Encoding::Unsigned),
    FieldDef::new("growth_rate", 1, Encoding::Unsigned),
    FieldDef::new("egg_group_1", 1, Encoding::Unsigned),
    FieldDef::new("egg_group_2", 1, Encoding::Unsigned),
    FieldDef::new("ability_1", 1, Encoding::Unsigned),
    FieldDef::new("ability_2", 1, Encoding::Unsigned),
    FieldDef::new("flee_rate", 1, Encoding::Unsigned),
    FieldDef::new("colour", 1, Encoding::Unsigned),
    FieldDef::new("unused", 2, Encoding::Opaque),
    FieldDef::new("machine_flags", 16, Encoding::Bitflags(MACHINE_COUNT)),
];

const PERSONAL_HEADER: [&str; 29] = [
    "species_id",
    "base_stat_hp",
    "base_stat_atk",
    "base_stat_def",
    "base_stat_spd",
    "base_stat_spatk",
    "base_stat_spdef",
    "type_1",
    "type_2",
    "catch_rate",
    "base_exp_yield",
    "ev_yield_hp",
    "ev_yield_atk",
    "ev_yield_def",
    "ev_yield_spd",
    "ev_yield_spatk",
    "ev_yield_spdef",
    "held_item_1",
    "held_item_2",
    "gender_ratio",
    "hatch_steps_rate",
    "base_friendship",
    "growth_rate",
    "egg_group_1",
    "egg_group_2",
    "ability_1",
    "ability_2",
    "flee_rate",
    "colour",
];

/// The 2-byte EV yield packs six stats as 2-bit values in an interleaved bit
/// order: special attack/defense sit in the low nibble, the rest start at
/// bit 8.
fn ev_yield_stats(packed: u64) -> [u64; 6] {
    let pair = |low: u32, high: u32| ((packed >> low) & 1) + ((packed >> high) & 1) * 2;
    [
        pair(8, 9),   // hp
        pair(10, 11), // atk
        pair(12, 13), // def
        pair(14, 15), // spd
        pair(0, 1),   // spatk
        pair(2, 3),   // spdef
    ]
}

fn machine_header() -> Vec<String> {
    let mut header = vec!["species_id".to_string()];
    header.extend((1..=MACHINE_COUNT).map(|i| format!("machine_{i:03}")));
    header
}

pub fn export(ctx: &ExportContext) -> Result<BlockRun, Error> {
    let (source_path, source) = ctx.open_source(SOURCE)?;
    let layout = LayoutDescriptor::new(
        BASE_OFFSET,
        Some(STRIDE),
        FIELDS.to_vec(),
        Termination::FixedCount(0),
    )?
    .fill_to_end(&source)?;

    let policy = ExceptionPolicy::species();
    let mut report = Report::new();

    let mut personal = TableWriter::create(ctx.out("personal_data.csv"), &PERSONAL_HEADER)?;
    let mut machines = TableWriter::create(ctx.out("machine_learnsets.csv"), &machine_header())?;

    for result in RecordDecoder::new(&source, &layout).records() {
        let record = result?;
        let species_id = match policy.resolve(record.index as u16) {
            Verdict::Keep(id) => id,
            // Alias placeholders duplicate their base species; dropped.
            Verdict::Skip | Verdict::Alias(_) => continue,
        };
        let mapped = map_record(&record, &layout)?;
        report.extend_warnings(mapped.warnings);
        let decoded = mapped.record.with_id(species_id);

        let mut row = Vec::with_capacity(PERSONAL_HEADER.len());
        row.push(Value::UInt(species_id as u64));
        for name in [
            "base_stat_hp",
            "base_stat_atk",
            "base_stat_def",
            "base_stat_spd",
            "base_stat_spatk",
            "base_stat_spdef",
            "type_1",
            "type_2",
            "catch_rate",
            "base_exp_yield",
        ] {
            row.push(Value::UInt(decoded.uint(name)));
        }
        for stat in ev_yield_stats(decoded.uint("ev_yield")) {
            row.push(Value::UInt(stat));
        }
        for name in [
            "held_item_1",
            "held_item_2",
            "gender_ratio",
            "hatch_steps_rate",
            "base_friendship",
            "growth_rate",
            "egg_group_1",
            "egg_group_2",
            "ability_1",
            "ability_2",
            "flee_rate",
            "colour",
        ] {
            row.push(Value::UInt(decoded.uint(name)));
        }
        personal.write_row(&row)?;

        let mut machine_row = Vec::with_capacity(MACHINE_COUNT + 1);
        machine_row.push(Value::UInt(species_id as u64));
        if let Some(Value::Bits(bits)) = decoded.get("machine_flags") {
            machine_row.extend(bits.iter().map(|bit| Value::UInt(*bit as u64)));
        }
        machines.write_row(&machine_row)?;
    }

    let outputs = vec![personal.finish()?, machines.finish()?];
    ctx.finish(NAME, report, vec![source_path], outputs)
}

#[cfg(test)]
mod tests {
    use super::ev_yield_stats;

    #[test]
    fn ev_yield_unpacks_interleaved_pairs() {
        // hp=1 (bit 8), spatk=2 (bit 1), spdef=3 (bits 2+3)
        let packed = (1 << 8) | (1 << 1) | 0b1100;
        assert_eq!(ev_yield_stats(packed), [1, 0, 0, 0, 2, 3]);
    }

    #[test]
    fn zero_yield_is_all_zero() {
        assert_eq!(ev_yield_stats(0), [0; 6]);
    }
}
