//! Decide, per codepoint, which source keeps its glyph.

use font_source::{Codepoint, FontSource};
use log::{debug, info};

/// What happens to a Latin glyph whose codepoint falls in a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Drop the Latin glyph when the ideographic source can render the codepoint.
    PreferIdeographic,
    /// Always drop the Latin glyph.
    DeleteLatin,
    /// Always keep the Latin glyph.
    KeepLatin,
}

/// An inclusive codepoint range with its policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnicodeRange {
    pub start: u32,
    pub end: u32,
    pub policy: Policy,
}

impl UnicodeRange {
    const fn new(start: u32, end: u32, policy: Policy) -> Self {
        Self { start, end, policy }
    }

    const fn single(cp: u32, policy: Policy) -> Self {
        Self::new(cp, cp, policy)
    }

    pub const fn contains(&self, cp: u32) -> bool {
        self.start <= cp && cp <= self.end
    }
}

/// Range rules, first match wins.
pub const RANGE_RULES: &[UnicodeRange] = &[
    // Blocks where wide glyphs win when available.
    UnicodeRange::new(0x2190, 0x21FF, Policy::PreferIdeographic), // Arrows
    UnicodeRange::new(0x2200, 0x22FF, Policy::PreferIdeographic), // Mathematical Operators
    UnicodeRange::new(0x2000, 0x206F, Policy::PreferIdeographic), // General Punctuation
    UnicodeRange::new(0x2100, 0x214F, Policy::PreferIdeographic), // Letterlike Symbols
    // Editors draw whitespace markers with these.
    UnicodeRange::single(0x2022, Policy::KeepLatin),
    UnicodeRange::single(0x00B7, Policy::KeepLatin),
    UnicodeRange::single(0x2024, Policy::KeepLatin),
    UnicodeRange::single(0x2219, Policy::KeepLatin),
    UnicodeRange::single(0x25D8, Policy::KeepLatin),
    UnicodeRange::single(0x25E6, Policy::KeepLatin),
    UnicodeRange::single(0x00AB, Policy::KeepLatin),
    UnicodeRange::single(0x00BB, Policy::KeepLatin),
    UnicodeRange::single(0x00A6, Policy::KeepLatin),
    UnicodeRange::new(0x0300, 0x0328, Policy::KeepLatin), // Combining diacritics
    UnicodeRange::single(0x00D7, Policy::DeleteLatin),
    UnicodeRange::single(0x00F7, Policy::DeleteLatin),
    UnicodeRange::new(0x2500, 0x257F, Policy::DeleteLatin), // Box Drawing
];

/// The policy for `cp`, if any rule covers it.
pub fn policy_for(cp: u32) -> Option<Policy> {
    RANGE_RULES.iter().find(|range| range.contains(cp)).map(|range| range.policy)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArbitrationReport {
    pub latin_deleted: usize,
    pub ideographic_deleted: usize,
}

/// Apply the range rules (skipped in console mode) and then the global
/// de-duplication pass.
///
/// Afterwards no codepoint has a live glyph in both sources.
pub fn arbitrate(jp: &mut FontSource, latin: &mut FontSource, console: bool) -> ArbitrationReport {
    let mut report = ArbitrationReport::default();
    if !console {
        report.latin_deleted += apply_range_rules(jp, latin);
    }
    let (latin_deleted, ideographic_deleted) = deduplicate(jp, latin);
    report.latin_deleted += latin_deleted;
    report.ideographic_deleted += ideographic_deleted;
    info!(
        "arbitration removed {} Latin and {} ideographic glyphs",
        report.latin_deleted, report.ideographic_deleted
    );
    report
}

fn apply_range_rules(jp: &FontSource, latin: &mut FontSource) -> usize {
    let mut deleted = 0;
    for cp in latin.live_codepoints() {
        let delete = match policy_for(cp.to_u32()) {
            Some(Policy::PreferIdeographic) => jp.live_glyph(cp).is_some(),
            Some(Policy::DeleteLatin) => true,
            Some(Policy::KeepLatin) | None => false,
        };
        if delete && let Some(key) = latin.live_key(cp) {
            debug!("{cp}: removing Latin glyph '{}'", latin.glyph(key).map_or("", |g| g.name.as_str()));
            if latin.clear(key) {
                deleted += 1;
            }
        }
    }
    deleted
}

/// Remove Latin glyphs shadowed by live ideographic glyphs, then any
/// ideographic glyph still colliding with a surviving Latin glyph.
fn deduplicate(jp: &mut FontSource, latin: &mut FontSource) -> (usize, usize) {
    let mut latin_deleted = 0;
    for cp in jp.live_codepoints().into_iter().filter(|cp| cp.to_u32() > 0) {
        if let Some(key) = latin.live_key(cp)
            && latin.clear(key)
        {
            latin_deleted += 1;
        }
    }

    let mut ideographic_deleted = 0;
    for cp in latin.live_codepoints() {
        if let Some(key) = jp.live_key(cp)
            && jp.clear(key)
        {
            debug!("{cp}: removing ideographic duplicate");
            ideographic_deleted += 1;
        }
    }
    (latin_deleted, ideographic_deleted)
}

/// Codepoints that are live in both sources.
pub fn shared_live_codepoints(jp: &FontSource, latin: &FontSource) -> Vec<Codepoint> {
    jp.live_codepoints().into_iter().filter(|cp| latin.live_key(*cp).is_some()).collect()
}

#[cfg(test)]
mod tests {
    use font_source::{AltUnicode, FontTables, Glyph, Outline, OutlinePoint};

    use super::*;

    fn source(cps: &[u32]) -> FontSource {
        let mut source = FontSource::new(FontTables::new(880, 120));
        for &cp in cps {
            source.add_glyph(Glyph::new(
                format!("uni{cp:04X}"),
                Some(Codepoint::new(cp)),
                Outline::new(vec![vec![
                    OutlinePoint::on(0.0, 0.0),
                    OutlinePoint::on(0.0, 500.0),
                    OutlinePoint::on(400.0, 500.0),
                ]]),
                500,
            ));
        }
        source
    }

    fn live(source: &FontSource, cp: u32) -> bool {
        source.live_glyph(Codepoint::new(cp)).is_some()
    }

    #[test]
    fn test_policy_lookup() {
        assert_eq!(policy_for(0x2192), Some(Policy::PreferIdeographic));
        // Inside General Punctuation, so the block rule matches first.
        assert_eq!(policy_for(0x2022), Some(Policy::PreferIdeographic));
        assert_eq!(policy_for(0x00B7), Some(Policy::KeepLatin));
        assert_eq!(policy_for(0x0301), Some(Policy::KeepLatin));
        assert_eq!(policy_for(0x00D7), Some(Policy::DeleteLatin));
        assert_eq!(policy_for(0x2510), Some(Policy::DeleteLatin));
        assert_eq!(policy_for(0x0041), None);
    }

    #[test]
    fn test_range_rules() {
        let mut jp = source(&[0x2192, 0x3042]);
        let mut latin = source(&[0x41, 0x2192, 0x2194, 0x00D7, 0x00B7, 0x2500]);

        arbitrate(&mut jp, &mut latin, false);

        assert!(live(&jp, 0x2192));
        assert!(!live(&latin, 0x2192));
        // No ideographic glyph, so the Latin arrow stays.
        assert!(live(&latin, 0x2194));
        assert!(!live(&latin, 0x00D7));
        assert!(!live(&latin, 0x2500));
        assert!(live(&latin, 0x00B7));
        assert!(live(&latin, 0x41));
    }

    #[test]
    fn test_console_runs_only_dedup() {
        let mut jp = source(&[0x3042]);
        let mut latin = source(&[0x00D7, 0x2500]);
        let report = arbitrate(&mut jp, &mut latin, true);
        assert_eq!(report, ArbitrationReport::default());
        assert!(live(&latin, 0x00D7));
        assert!(live(&latin, 0x2500));
    }

    #[test]
    fn test_no_shared_codepoints_remain() {
        let mut jp = source(&[0x41, 0x42, 0x2018, 0x2192, 0x3000, 0x4E00]);
        let mut latin = source(&[0x41, 0x43, 0x2018, 0x2192, 0x00B7]);
        // An alias on the Latin side collides as well.
        let key = latin.key_for(Codepoint::new(0x43)).unwrap();
        latin.glyph_mut(key).unwrap().aliases.push(AltUnicode::nominal(Codepoint::new(0x4E00)));
        latin.reindex();

        for console in [false, true] {
            let (mut jp, mut latin) = (jp.clone(), latin.clone());
            arbitrate(&mut jp, &mut latin, console);
            assert!(shared_live_codepoints(&jp, &latin).is_empty());
        }

        let report = arbitrate(&mut jp, &mut latin, false);
        assert!(report.latin_deleted >= 3);
        assert!(live(&jp, 0x41));
        assert!(!live(&latin, 0x41));
    }

    #[test]
    fn test_dedup_symmetric_half() {
        // Codepoint zero is skipped by the first half, so only the second
        // half can resolve it.
        let mut jp = source(&[0x0000, 0x3042]);
        let mut latin = source(&[0x0000, 0x41]);
        let report = arbitrate(&mut jp, &mut latin, true);
        assert_eq!(report, ArbitrationReport { latin_deleted: 0, ideographic_deleted: 1 });
        assert!(live(&latin, 0x0000));
        assert!(!live(&jp, 0x0000));
        assert!(shared_live_codepoints(&jp, &latin).is_empty());
    }
}
