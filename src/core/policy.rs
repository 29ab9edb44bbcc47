// Shared reserved-id handling. Every species-keyed block resolves raw ids
// through one policy value so no two exports disagree on a reserved range.
use std::ops::RangeInclusive;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Verdict {
    Keep(u16),
    Skip,
    Alias(u16),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Action {
    Skip,
    Alias(u16),
}

/// What a block does with `Alias` verdicts. A per-block configuration, not an
/// engine rule.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AliasMode {
    /// Drop the record; placeholder entries duplicate their base species.
    #[default]
    Drop,
    /// Emit the record keyed by the alias target.
    KeepTarget,
}

/// Pure id → verdict mapping built from ordered range rules; first match wins,
/// unmatched ids are kept as-is. No state, safe to call repeatedly or out of
/// order.
#[derive(Clone, Debug, Default)]
pub struct ExceptionPolicy {
    rules: Vec<(RangeInclusive<u16>, Action)>,
}

/// Start of the reserved species block (Egg, Bad Egg, alternate-form
/// placeholders).
pub const RESERVED_SPECIES_START: u16 = 494;
pub const RESERVED_SPECIES_END: u16 = 507;

/// Alternate-form placeholder ids and the base species each one duplicates,
/// in personal-archive order: Deoxys forms, Wormadam cloaks, Giratina Origin,
/// Shaymin Sky, Rotom appliances.
const ALT_FORM_BASES: [(u16, u16); 12] = [
    (496, 386),
    (497, 386),
    (498, 386),
    (499, 413),
    (500, 413),
    (501, 487),
    (502, 492),
    (503, 479),
    (504, 479),
    (505, 479),
    (506, 479),
    (507, 479),
];

impl ExceptionPolicy {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn skip(mut self, range: RangeInclusive<u16>) -> Self {
        self.rules.push((range, Action::Skip));
        self
    }

    pub fn alias(mut self, id: u16, target: u16) -> Self {
        self.rules.push((id..=id, Action::Alias(target)));
        self
    }

    /// The one policy every species-keyed block uses: id 0 is a placeholder
    /// record, 494/495 are Egg and Bad Egg, 496-507 alias to base species.
    pub fn species() -> Self {
        let mut policy = Self::empty().skip(0..=0).skip(494..=495);
        for (id, base) in ALT_FORM_BASES {
            policy = policy.alias(id, base);
        }
        policy
    }

    pub fn resolve(&self, raw_id: u16) -> Verdict {
        for (range, action) in &self.rules {
            if range.contains(&raw_id) {
                return match action {
                    Action::Skip => Verdict::Skip,
                    Action::Alias(target) => Verdict::Alias(*target),
                };
            }
        }
        Verdict::Keep(raw_id)
    }

    /// Ascending ids from `start` whose records are physically present
    /// (everything but `Skip`), paired with their verdicts. For blocks whose
    /// data omits reserved ids entirely, so row N belongs to the Nth present id.
    pub fn present_ids(&self, start: u16) -> impl Iterator<Item = (u16, Verdict)> + '_ {
        (start..=u16::MAX).filter_map(|id| match self.resolve(id) {
            Verdict::Skip => None,
            verdict => Some((id, verdict)),
        })
    }
}
