//! Monospace width grid and center-preserving glyph adjustments.

use font_source::{Codepoint, FontSource, Glyph};
use kurbo::Affine;
use log::debug;

use crate::config::{BuildConfig, Modifiers};

/// Hiragana A, whose advance is the ideographic full width.
const FULL_WIDTH_REFERENCE: Codepoint = Codepoint::new(0x3042);

const OPENING_BRACKETS: [u32; 3] = [0xFF08, 0xFF3B, 0xFF5B];
const CLOSING_BRACKETS: [u32; 3] = [0xFF09, 0xFF3D, 0xFF5D];
const BRACKET_SHIFT: f64 = 180.0;

const HORIZONTAL_ARROWS: [u32; 8] = [0x2190, 0x2192, 0x2194, 0x21D0, 0x21D2, 0x21D4, 0x21DA, 0x21DB];
const VERTICAL_ARROWS: [u32; 5] = [0x2191, 0x2193, 0x2195, 0x21D1, 0x21D3];
const ARROW_SCALE: f64 = 1.3;

/// The advance widths every ideographic glyph is snapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub half: u16,
    pub full: u16,
    /// Widths below this snap to `half`, widths above it to `full`.
    pub threshold: u16,
    pub narrow: bool,
}

impl Grid {
    pub fn new(config: &BuildConfig, modifiers: Modifiers) -> Self {
        Self {
            half: if modifiers.narrow { config.narrow_half_width } else { config.half_width },
            full: config.full_width,
            threshold: config.half_width,
            narrow: modifiers.narrow,
        }
    }

    /// The grid width for `width`, or `None` when it stays as it is.
    ///
    /// Zero widths, widths already on the grid and widths of a full cell or
    /// more are left alone, so applying the grid twice changes nothing.
    pub fn quantized_width(&self, width: u16) -> Option<u16> {
        let target = if width == 0 || width == self.half || width >= self.full {
            return None;
        } else if width < self.threshold || (self.narrow && width == self.threshold) {
            self.half
        } else if width > self.threshold {
            self.full
        } else {
            return None;
        };
        (target != width).then_some(target)
    }
}

/// Move the glyph to the middle of a cell of `width` and set that advance.
pub fn center_in(glyph: &mut Glyph, width: u16) {
    let dx = (f64::from(width) - f64::from(glyph.advance)) / 2.0;
    glyph.translate(dx, 0.0);
    glyph.advance = width;
}

/// Snap every ideographic glyph's advance to the grid, keeping it centered.
///
/// Returns the number of glyphs changed.
pub fn quantize_widths(source: &mut FontSource, grid: Grid) -> usize {
    let keys: Vec<_> = source.keys().collect();
    let mut changed = 0;
    for key in keys {
        let Some(glyph) = source.glyph_mut(key) else {
            continue;
        };
        if !glyph.is_worth_outputting() {
            continue;
        }
        if let Some(width) = grid.quantized_width(glyph.advance) {
            center_in(glyph, width);
            changed += 1;
        }
    }
    debug!("quantized {changed} advance widths");
    changed
}

/// Scale the outline by (`sx`, `sy`) while keeping its bounding-box center
/// and advance width.
pub fn scale_about_center(glyph: &mut Glyph, sx: f64, sy: f64) {
    let advance = glyph.advance;
    let Some(before) = glyph.bounds() else {
        return;
    };
    glyph.transform(Affine::scale_non_uniform(sx, sy));
    if let Some(after) = glyph.bounds() {
        let (b, a) = (before.center(), after.center());
        glyph.translate(b.x - a.x, b.y - a.y);
    }
    glyph.advance = advance;
}

fn scale_codepoint(source: &mut FontSource, cp: u32, sx: f64, sy: f64) {
    match source.live_key(Codepoint::new(cp)).and_then(|key| source.glyph_mut(key)) {
        Some(glyph) => scale_about_center(glyph, sx, sy),
        None => debug!("{} not present, skipping scale", Codepoint::new(cp)),
    }
}

fn translate_codepoint(source: &mut FontSource, cp: u32, dx: f64, width: u16) {
    match source.live_key(Codepoint::new(cp)).and_then(|key| source.glyph_mut(key)) {
        Some(glyph) => {
            glyph.translate(dx, 0.0);
            glyph.advance = width;
        }
        None => debug!("{} not present, skipping shift", Codepoint::new(cp)),
    }
}

/// Per-glyph shape fixes applied before the width grid.
pub fn adjust_shapes(jp: &mut FontSource, latin: &mut FontSource, grid: Grid) {
    let full_width = jp.live_glyph(FULL_WIDTH_REFERENCE).map_or(grid.full, |g| g.advance);

    // Open up full-width brackets.
    for cp in OPENING_BRACKETS {
        translate_codepoint(jp, cp, -BRACKET_SHIFT, full_width);
    }
    for cp in CLOSING_BRACKETS {
        translate_codepoint(jp, cp, BRACKET_SHIFT, full_width);
    }

    // Quotation marks take a full cell.
    for cp in 0x2018..=0x201F {
        match jp.live_key(Codepoint::new(cp)).and_then(|key| jp.glyph_mut(key)) {
            Some(glyph) => center_in(glyph, full_width),
            None => debug!("{} not present, skipping widen", Codepoint::new(cp)),
        }
    }

    for cp in HORIZONTAL_ARROWS {
        scale_codepoint(latin, cp, 1.0, ARROW_SCALE);
    }
    for cp in VERTICAL_ARROWS {
        scale_codepoint(latin, cp, ARROW_SCALE, 1.0);
    }

    // Keep consecutive underscores apart.
    let underscore = if grid.narrow { 0.8666 } else { 0.84 };
    scale_codepoint(latin, 0x005F, underscore, 1.0);

    if !grid.narrow {
        scale_codepoint(latin, 0x0023, 1.15, 1.0);
        scale_codepoint(latin, 0x002A, 1.2, 1.2);
        match latin.live_key(Codepoint::new(0xA788)).and_then(|key| latin.glyph_mut(key)) {
            Some(glyph) => glyph.advance = 500,
            None => debug!("U+A788 not present, skipping width fix"),
        }
    }
}
