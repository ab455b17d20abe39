//! Supplemental symbol glyphs and the visible ideographic space.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

use anyhow::Result;
use font_source::{Codepoint, Error, FontSource, Glyph};
use kurbo::Affine;
use log::{debug, info};

use crate::geometry::center_in;

const IDEOGRAPHIC_SPACE: Codepoint = Codepoint::new(0x3000);

const POWERLINE_START: u32 = 0xE0B0;
const POWERLINE_END: u32 = 0xE0D4;

/// Right-pointing powerline glyphs drawn off their cell.
const POWERLINE_SHIFTS: [(u32, f64); 5] =
    [(0xE0B2, -353.0), (0xE0B6, -414.0), (0xE0C5, -137.0), (0xE0C7, -214.0), (0xE0D4, -314.0)];

const POWERLINE_HEIGHT_SCALE: f64 = 1.14;
const POWERLINE_RAISE: f64 = 21.0;

/// Glyphs narrower than this share of the em are centered in the cell.
const NARROW_SHARE: f64 = 0.6;

/// Loads the supplemental set once and shares it between variants.
#[derive(Debug, Default)]
pub struct SupplementalCache {
    slot: Mutex<Option<Arc<FontSource>>>,
}

impl SupplementalCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached set, running `init` on first use.
    ///
    /// Concurrent callers wait for the first initialization instead of
    /// loading the set again. A failed `init` leaves the cache empty.
    pub fn get_or_init(&self, init: impl FnOnce() -> Result<FontSource>) -> Result<Arc<FontSource>> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(source) = slot.as_ref() {
            return Ok(Arc::clone(source));
        }
        let source = Arc::new(init()?);
        *slot = Some(Arc::clone(&source));
        Ok(source)
    }
}

/// Rescale, rename and fit a freshly loaded supplemental set.
pub fn prepare_supplemental(mut source: FontSource, units_per_em: u16, half: u16) -> FontSource {
    source.set_units_per_em(units_per_em);

    let mut names: HashSet<String> = HashSet::with_capacity(source.len());
    let keys: Vec<_> = source.keys().collect();
    for key in keys {
        let Some(glyph) = source.glyph_mut(key) else {
            continue;
        };
        let mut name = format!("{}-nf", glyph.name);
        if names.contains(&name) {
            name = format!("{name}-{}", key.slot());
        }
        names.insert(name.clone());
        glyph.name = name;
        fit_glyph(glyph, units_per_em, half);
    }
    source
}

/// Fit one supplemental glyph into a half-width cell.
pub fn fit_glyph(glyph: &mut Glyph, units_per_em: u16, half: u16) {
    let half = f64::from(half);
    let cp = glyph.codepoint.map(Codepoint::to_u32);

    match cp {
        Some(cp @ POWERLINE_START..=POWERLINE_END) => {
            if let Some((_, dx)) = POWERLINE_SHIFTS.iter().find(|(shifted, _)| *shifted == cp) {
                glyph.translate(*dx, 0.0);
            }
            let width = f64::from(glyph.advance);
            if width < half {
                glyph.translate((half - width) / 2.0, 0.0);
            } else if width > half {
                glyph.transform(Affine::scale_non_uniform(half / width, 1.0));
            }
            glyph.transform(Affine::scale_non_uniform(1.0, POWERLINE_HEIGHT_SCALE));
            glyph.translate(0.0, POWERLINE_RAISE);
        }
        _ if f64::from(glyph.advance) < f64::from(units_per_em) * NARROW_SHARE => {
            glyph.translate((half - f64::from(glyph.advance)) / 2.0, 0.0);
        }
        _ => {}
    }
    glyph.advance = half as u16;
}

/// Merge every encoded supplemental glyph into `jp`.
///
/// Glyphs in either target that share a codepoint with an incoming glyph are
/// cleared first. Returns the number of glyphs merged.
pub fn merge_supplemental(
    jp: &mut FontSource,
    latin: &mut FontSource,
    supplemental: &FontSource,
) -> usize {
    let incoming: Vec<&Glyph> = supplemental
        .iter()
        .map(|(_, glyph)| glyph)
        .filter(|glyph| glyph.codepoint.is_some() && glyph.is_worth_outputting())
        .collect();

    for glyph in &incoming {
        for cp in glyph.nominal_codepoints() {
            clear_codepoint(jp, cp);
            clear_codepoint(latin, cp);
        }
    }

    let merged = incoming.into_iter().filter_map(|glyph| jp.merge_glyph(glyph.clone())).count();
    info!("merged {merged} supplemental glyphs");
    merged
}

fn clear_codepoint(source: &mut FontSource, cp: Codepoint) {
    while let Some(key) = source.live_key(cp) {
        source.clear(key);
    }
}

/// Replace U+3000 with the visible glyph from `space`, keeping the width
/// U+3000 had before. `fallback_width` is used when `jp` has no live U+3000.
pub fn visualize_ideographic_space(
    jp: &mut FontSource,
    space: &FontSource,
    fallback_width: u16,
) -> Result<(), Error> {
    let incoming = space.live_glyph(IDEOGRAPHIC_SPACE).ok_or(Error::MissingGlyph(IDEOGRAPHIC_SPACE))?;
    let width = jp.live_glyph(IDEOGRAPHIC_SPACE).map_or(fallback_width, |g| g.advance);

    clear_codepoint(jp, IDEOGRAPHIC_SPACE);
    let Some(key) = jp.merge_glyph(incoming.clone()) else {
        return Ok(());
    };
    if let Some(glyph) = jp.glyph_mut(key) {
        debug!("ideographic space {} -> {width}", glyph.advance);
        center_in(glyph, width);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{sync::atomic::{AtomicUsize, Ordering}, thread};

    use font_source::{FontTables, Outline, OutlinePoint};

    use super::*;

    fn block(x0: f64, x1: f64) -> Outline {
        Outline::new(vec![vec![
            OutlinePoint::on(x0, 0.0),
            OutlinePoint::on(x0, 700.0),
            OutlinePoint::on(x1, 700.0),
            OutlinePoint::on(x1, 0.0),
        ]])
    }

    fn glyph(name: &str, cp: u32, x0: f64, x1: f64, advance: u16) -> Glyph {
        Glyph::new(name, Some(Codepoint::new(cp)), block(x0, x1), advance)
    }

    #[test]
    fn test_cache_initializes_once() {
        let cache = SupplementalCache::new();
        let calls = AtomicUsize::new(0);
        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    cache
                        .get_or_init(|| {
                            calls.fetch_add(1, Ordering::SeqCst);
                            Ok(FontSource::new(FontTables::new(880, 120)))
                        })
                        .unwrap();
                });
            }
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cache_retries_after_failure() {
        let cache = SupplementalCache::new();
        assert!(cache.get_or_init(|| anyhow::bail!("missing")).is_err());
        assert!(cache.get_or_init(|| Ok(FontSource::new(FontTables::new(880, 120)))).is_ok());
    }

    #[test]
    fn test_fit_narrow_glyph_is_centered() {
        let mut g = glyph("uniF015", 0xF015, 0.0, 300.0, 300);
        fit_glyph(&mut g, 1000, 500);
        assert_eq!(g.advance, 500);
        assert!((g.bounds().unwrap().x0 - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_wide_glyph_keeps_position() {
        let mut g = glyph("uniF300", 0xF300, 0.0, 700.0, 700);
        fit_glyph(&mut g, 1000, 500);
        assert_eq!(g.advance, 500);
        assert_eq!(g.bounds().unwrap().x0, 0.0);
    }

    #[test]
    fn test_fit_powerline() {
        // Wider than the cell: squeezed horizontally, stretched vertically.
        let mut g = glyph("uniE0B0", 0xE0B0, 0.0, 600.0, 600);
        fit_glyph(&mut g, 1000, 500);
        let bounds = g.bounds().unwrap();
        assert!((bounds.width() - 500.0).abs() < 1e-9);
        assert!((bounds.y1 - (700.0 * 1.14 + 21.0)).abs() < 1e-9);
        assert_eq!(g.advance, 500);

        // Shifted back into the cell, then centered.
        let mut g = glyph("uniE0B2", 0xE0B2, 353.0, 753.0, 400);
        fit_glyph(&mut g, 1000, 500);
        assert!((g.bounds().unwrap().x0 - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_prepare_renames_and_rescales() {
        let mut source = FontSource::new(FontTables::new(1638, 410));
        source.add_glyph(glyph("home", 0xF015, 0.0, 1024.0, 1024));
        source.add_glyph(glyph("home", 0xF016, 0.0, 1024.0, 1024));
        let prepared = prepare_supplemental(source, 1000, 500);

        let names: Vec<_> = prepared.iter().map(|(_, g)| g.name.as_str()).collect();
        assert_eq!(names, vec!["home-nf", "home-nf-1"]);
        assert_eq!(prepared.units_per_em(), 1000);
        assert!(prepared.iter().all(|(_, g)| g.advance == 500));
    }

    #[test]
    fn test_merge_clears_collisions() {
        let mut jp = FontSource::new(FontTables::new(880, 120));
        jp.add_glyph(glyph("uni3042", 0x3042, 80.0, 920.0, 1000));
        let jp_slot = jp.add_glyph(glyph("uniE0A0", 0xE0A0, 0.0, 900.0, 1000));
        let mut latin = FontSource::new(FontTables::new(880, 120));
        latin.add_glyph(glyph("uniF015", 0xF015, 0.0, 400.0, 500));

        let mut supplemental = FontSource::new(FontTables::new(880, 120));
        supplemental.add_glyph(glyph("branch-nf", 0xE0A0, 100.0, 400.0, 500));
        supplemental.add_glyph(glyph("home-nf", 0xF015, 100.0, 400.0, 500));
        supplemental.add_glyph(Glyph::new("extra-nf", None, block(0.0, 10.0), 500));

        assert_eq!(merge_supplemental(&mut jp, &mut latin, &supplemental), 2);
        assert!(latin.live_glyph(Codepoint::new(0xF015)).is_none());
        assert_eq!(jp.live_key(Codepoint::new(0xE0A0)), Some(jp_slot));
        assert_eq!(jp.glyph(jp_slot).unwrap().name, "branch-nf");
        assert_eq!(jp.live_glyph(Codepoint::new(0xF015)).unwrap().name, "home-nf");
        assert_eq!(jp.len(), 3);
    }

    #[test]
    fn test_ideographic_space_keeps_old_width() {
        let mut jp = FontSource::new(FontTables::new(880, 120));
        jp.add_glyph(Glyph::new("uni3000", Some(IDEOGRAPHIC_SPACE), Outline::default(), 1000));
        let mut space = FontSource::new(FontTables::new(880, 120));
        space.add_glyph(glyph("uni3000", 0x3000, 50.0, 650.0, 700));

        visualize_ideographic_space(&mut jp, &space, 1000).unwrap();

        let visible = jp.live_glyph(IDEOGRAPHIC_SPACE).unwrap();
        assert_eq!(visible.advance, 1000);
        assert!((visible.bounds().unwrap().x0 - 200.0).abs() < 1e-9);
        assert_eq!(jp.len(), 1);
    }

    #[test]
    fn test_ideographic_space_resource_must_have_glyph() {
        let mut jp = FontSource::new(FontTables::new(880, 120));
        let space = FontSource::new(FontTables::new(880, 120));
        let err = visualize_ideographic_space(&mut jp, &space, 1000).unwrap_err();
        assert!(matches!(err, Error::MissingGlyph(cp) if cp == IDEOGRAPHIC_SPACE));
    }
}
