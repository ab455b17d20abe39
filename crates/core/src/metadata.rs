//! Vertical metrics, style bits and naming applied to each output font.

use font_source::{Codepoint, Error, FontSource, FontTables};
use font_types::{FWord, Fixed, Tag};
use log::debug;
use write_fonts::tables::{
    head::MacStyle,
    os2::{Os2, SelectionFlags},
};

use crate::{config::BuildConfig, naming::FontNaming, styles::Weight};

const CAP_HEIGHT_REFERENCE: Codepoint = Codepoint::new(0x0048);
const X_HEIGHT_REFERENCE: Codepoint = Codepoint::new(0x0078);

/// Cap height and x-height measured from the Latin outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceHeights {
    pub cap_height: i16,
    pub x_height: i16,
}

/// Top of `H` and `x` in `latin`.
pub fn reference_heights(latin: &FontSource) -> Result<ReferenceHeights, Error> {
    let top = |cp: Codepoint| {
        latin
            .live_glyph(cp)
            .and_then(|glyph| glyph.bounds())
            .map(|bounds| bounds.y1.round() as i16)
            .ok_or(Error::MissingGlyph(cp))
    };
    Ok(ReferenceHeights { cap_height: top(CAP_HEIGHT_REFERENCE)?, x_height: top(X_HEIGHT_REFERENCE)? })
}

/// `"1.2.3"` becomes revision 1.2; anything unparsable becomes 1.0.
fn font_revision(version: &str) -> Fixed {
    let mut parts = version.split('.');
    let major = parts.next().and_then(|p| p.parse::<u16>().ok());
    let minor = parts.next().unwrap_or("0");
    match major {
        Some(major) => format!("{major}.{minor}")
            .parse::<f64>()
            .map(Fixed::from_f64)
            .unwrap_or(Fixed::from_f64(f64::from(major))),
        None => Fixed::from_f64(1.0),
    }
}

fn vendor_tag(vendor: &str) -> Tag {
    let mut bytes = [b' '; 4];
    for (slot, byte) in bytes.iter_mut().zip(vendor.bytes().filter(u8::is_ascii_graphic)) {
        *slot = byte;
    }
    Tag::new(&bytes)
}

/// Rescale to the build em and write metrics, style bits and names.
pub fn apply_metadata(
    source: &mut FontSource,
    config: &BuildConfig,
    naming: &FontNaming,
    heights: ReferenceHeights,
) {
    source.set_units_per_em(config.units_per_em());
    let weight = naming.weight;
    let tables = &mut source.tables;
    tables.ascent = config.em_ascent;
    tables.descent = config.em_descent;

    let ascent = config.os2_ascent.min(i16::MAX as u16) as i16;
    let descent = config.os2_descent.min(i16::MAX as u16) as i16;

    tables.hhea.ascender = FWord::new(ascent);
    tables.hhea.descender = FWord::new(-descent);
    tables.hhea.line_gap = FWord::new(0);

    if tables.os2.is_none() {
        tables.os2 = FontTables::new(config.em_ascent, config.em_descent).os2;
    }
    if let Some(os2) = tables.os2.as_mut() {
        apply_os2(os2, config, weight, heights);
    }

    tables.head.mac_style.remove(MacStyle::BOLD);
    if weight.is_bold() {
        tables.head.mac_style.insert(MacStyle::BOLD);
    }
    tables.head.font_revision = font_revision(&config.version);

    if source.remove_table(Tag::new(b"BASE")) {
        debug!("removed BASE table");
    }
    source.tables.names = naming.records(config);
}

fn apply_os2(os2: &mut Os2, config: &BuildConfig, weight: Weight, heights: ReferenceHeights) {
    let ascent = config.os2_ascent.min(i16::MAX as u16) as i16;
    let descent = config.os2_descent.min(i16::MAX as u16) as i16;
    os2.us_win_ascent = config.os2_ascent;
    os2.us_win_descent = config.os2_descent;
    os2.s_typo_ascender = ascent;
    os2.s_typo_descender = -descent;
    os2.s_typo_line_gap = 0;
    os2.sx_height = Some(heights.x_height);
    os2.s_cap_height = Some(heights.cap_height);
    os2.us_weight_class = weight.class();
    os2.ach_vend_id = vendor_tag(&config.vendor);

    os2.fs_selection.remove(SelectionFlags::BOLD | SelectionFlags::REGULAR);
    // Every non-Bold weight is the regular style of its own family.
    if weight.is_bold() {
        os2.fs_selection.insert(SelectionFlags::BOLD);
    } else {
        os2.fs_selection.insert(SelectionFlags::REGULAR);
    }
}
