//! The in-memory font source every pipeline stage edits.

use std::{
    collections::{BTreeMap, btree_map::Entry},
    ops::RangeInclusive,
};

use font_types::{Fixed, FWord, LongDateTime, Tag, UfWord, Version16Dot16};
use kurbo::Affine;
use log::debug;
use write_fonts::tables::{
    head::{Flags, Head, MacStyle},
    hhea::Hhea,
    maxp::Maxp,
    os2::{Os2, SelectionFlags},
    post::Post,
};

use crate::{
    glyph::Glyph,
    types::{Codepoint, GlyphKey},
};

/// Name IDs read and written by the pipeline.
pub mod name_id {
    pub const COPYRIGHT: u16 = 0;
    pub const FAMILY: u16 = 1;
    pub const SUBFAMILY: u16 = 2;
    pub const UNIQUE_ID: u16 = 3;
    pub const FULL_NAME: u16 = 4;
    pub const VERSION: u16 = 5;
    pub const POSTSCRIPT_NAME: u16 = 6;
    pub const LICENSE: u16 = 13;
    pub const LICENSE_URL: u16 = 14;
    pub const TYPOGRAPHIC_FAMILY: u16 = 16;
    pub const TYPOGRAPHIC_SUBFAMILY: u16 = 17;
}

/// Header, metric and naming tables that are rebuilt on serialization, plus
/// tables carried through untouched.
#[derive(Clone, Debug)]
pub struct FontTables {
    pub head: Head,
    pub hhea: Hhea,
    pub maxp: Maxp,
    pub os2: Option<Os2>,
    pub post: Post,
    /// Windows/English name records by name ID.
    pub names: BTreeMap<u16, String>,
    /// Em-level ascent; `ascent + descent` is the em size.
    pub ascent: i16,
    /// Em-level descent, positive downwards.
    pub descent: i16,
    pub(crate) raw: BTreeMap<Tag, Vec<u8>>,
}

impl FontTables {
    /// Minimal tables for a source assembled in memory.
    pub fn new(ascent: i16, descent: i16) -> Self {
        let units_per_em = (i32::from(ascent) + i32::from(descent)).clamp(16, 16384) as u16;
        let head = Head {
            font_revision: Fixed::from_f64(1.0),
            checksum_adjustment: 0,
            magic_number: 0x5F0F3CF5,
            flags: Flags::empty(),
            units_per_em,
            created: LongDateTime::new(0),
            modified: LongDateTime::new(0),
            x_min: 0,
            y_min: descent.saturating_neg(),
            x_max: units_per_em as i16,
            y_max: ascent,
            mac_style: MacStyle::empty(),
            lowest_rec_ppem: 8,
            font_direction_hint: 2,
            index_to_loc_format: 0,
        };

        let hhea = Hhea {
            ascender: FWord::new(ascent),
            descender: FWord::new(descent.saturating_neg()),
            line_gap: FWord::new(0),
            advance_width_max: UfWord::new(units_per_em),
            min_left_side_bearing: FWord::new(0),
            min_right_side_bearing: FWord::new(0),
            x_max_extent: FWord::new(units_per_em as i16),
            caret_slope_rise: 1,
            caret_slope_run: 0,
            caret_offset: 0,
            number_of_h_metrics: 0,
        };

        let maxp = Maxp {
            num_glyphs: 0,
            max_points: Some(0),
            max_contours: Some(0),
            max_composite_points: Some(0),
            max_composite_contours: Some(0),
            max_zones: Some(1),
            max_twilight_points: Some(0),
            max_storage: Some(0),
            max_function_defs: Some(0),
            max_instruction_defs: Some(0),
            max_stack_elements: Some(0),
            max_size_of_instructions: Some(0),
            max_component_elements: Some(0),
            max_component_depth: Some(0),
        };

        let post = Post {
            version: Version16Dot16::VERSION_3_0,
            italic_angle: Fixed::from_f64(0.0),
            underline_position: FWord::new(-100),
            underline_thickness: FWord::new(50),
            is_fixed_pitch: 0,
            min_mem_type42: 0,
            max_mem_type42: 0,
            min_mem_type1: 0,
            max_mem_type1: 0,
            num_glyphs: None,
            glyph_name_index: None,
            string_data: None,
        };

        let os2 = Os2 {
            x_avg_char_width: 500,
            us_weight_class: 400,
            us_width_class: 5,
            fs_type: 0,
            y_subscript_x_size: 650,
            y_subscript_y_size: 600,
            y_subscript_x_offset: 0,
            y_subscript_y_offset: 75,
            y_superscript_x_size: 650,
            y_superscript_y_size: 600,
            y_superscript_x_offset: 0,
            y_superscript_y_offset: 350,
            y_strikeout_size: 50,
            y_strikeout_position: 300,
            s_family_class: 0,
            panose_10: [0; 10],
            ul_unicode_range_1: 0,
            ul_unicode_range_2: 0,
            ul_unicode_range_3: 0,
            ul_unicode_range_4: 0,
            ach_vend_id: Tag::new(b"NONE"),
            fs_selection: SelectionFlags::REGULAR,
            us_first_char_index: 0x20,
            us_last_char_index: 0x7E,
            s_typo_ascender: ascent,
            s_typo_descender: descent.saturating_neg(),
            s_typo_line_gap: 0,
            us_win_ascent: ascent.max(0) as u16,
            us_win_descent: descent.max(0) as u16,
            ul_code_page_range_1: Some(0),
            ul_code_page_range_2: Some(0),
            sx_height: Some(0),
            s_cap_height: Some(0),
            us_default_char: Some(0),
            us_break_char: Some(0x20),
            us_max_context: Some(0),
            us_lower_optical_point_size: None,
            us_upper_optical_point_size: None,
        };

        Self {
            head,
            hhea,
            maxp,
            os2: Some(os2),
            post,
            names: BTreeMap::new(),
            ascent,
            descent,
            raw: BTreeMap::new(),
        }
    }
}

/// A named collection of glyphs keyed by [`GlyphKey`], plus font-wide tables.
#[derive(Clone, Debug)]
pub struct FontSource {
    glyphs: Vec<Glyph>,
    cmap: BTreeMap<Codepoint, Vec<GlyphKey>>,
    pub tables: FontTables,
}

impl FontSource {
    pub fn new(tables: FontTables) -> Self {
        Self { glyphs: Vec::new(), cmap: BTreeMap::new(), tables }
    }

    pub(crate) fn from_parts(glyphs: Vec<Glyph>, tables: FontTables) -> Self {
        let mut source = Self { glyphs, cmap: BTreeMap::new(), tables };
        source.reindex();
        source
    }

    /// Typographic family name, falling back to the legacy family name.
    pub fn family_name(&self) -> &str {
        self.tables
            .names
            .get(&name_id::TYPOGRAPHIC_FAMILY)
            .or_else(|| self.tables.names.get(&name_id::FAMILY))
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn units_per_em(&self) -> u16 {
        self.tables.head.units_per_em
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = GlyphKey> + use<> {
        (0..self.glyphs.len()).map(GlyphKey::new)
    }

    /// All glyphs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (GlyphKey, &Glyph)> {
        self.glyphs.iter().enumerate().map(|(slot, glyph)| (GlyphKey::new(slot), glyph))
    }

    pub fn glyph(&self, key: GlyphKey) -> Option<&Glyph> {
        self.glyphs.get(key.slot())
    }

    pub fn glyph_mut(&mut self, key: GlyphKey) -> Option<&mut Glyph> {
        self.glyphs.get_mut(key.slot())
    }

    /// The glyph reached by `cp`, preferring one that is worth outputting.
    pub fn key_for(&self, cp: Codepoint) -> Option<GlyphKey> {
        let claimants = self.cmap.get(&cp)?;
        claimants
            .iter()
            .copied()
            .find(|key| self.glyphs[key.slot()].is_worth_outputting())
            .or_else(|| claimants.first().copied())
    }

    /// The live glyph at `cp`, if any.
    pub fn live_key(&self, cp: Codepoint) -> Option<GlyphKey> {
        self.key_for(cp).filter(|key| self.glyphs[key.slot()].is_worth_outputting())
    }

    pub fn live_glyph(&self, cp: Codepoint) -> Option<&Glyph> {
        self.live_key(cp).map(|key| &self.glyphs[key.slot()])
    }

    pub fn glyph_by_codepoint(&self, cp: Codepoint) -> Option<&Glyph> {
        self.key_for(cp).map(|key| &self.glyphs[key.slot()])
    }

    pub fn glyph_by_codepoint_mut(&mut self, cp: Codepoint) -> Option<&mut Glyph> {
        let key = self.key_for(cp)?;
        self.glyphs.get_mut(key.slot())
    }

    /// Keys of the live glyphs reached by any codepoint in `range`.
    pub fn live_keys_in_range(&self, range: RangeInclusive<u32>) -> Vec<GlyphKey> {
        let range = Codepoint::new(*range.start())..=Codepoint::new(*range.end());
        let mut keys: Vec<GlyphKey> =
            self.cmap.range(range).filter_map(|(cp, _)| self.live_key(*cp)).collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// Every codepoint currently mapped to a live glyph.
    pub fn live_codepoints(&self) -> Vec<Codepoint> {
        self.cmap.keys().copied().filter(|cp| self.live_key(*cp).is_some()).collect()
    }

    /// Append a glyph in a new slot.
    pub fn add_glyph(&mut self, glyph: Glyph) -> GlyphKey {
        let key = GlyphKey::new(self.glyphs.len());
        self.glyphs.push(glyph);
        self.index_glyph(key);
        key
    }

    /// Clear the glyph in `key`. Returns whether a live glyph was deleted.
    pub fn clear(&mut self, key: GlyphKey) -> bool {
        match self.glyphs.get_mut(key.slot()) {
            Some(glyph) if glyph.is_worth_outputting() => {
                glyph.clear();
                true
            }
            Some(glyph) => {
                glyph.clear();
                false
            }
            None => false,
        }
    }

    /// Add an incoming glyph unless a live glyph already owns its codepoint.
    ///
    /// An existing cleared glyph whose primary codepoint matches is overwritten
    /// in place; otherwise the glyph gets a new slot. Unencoded glyphs are
    /// always added.
    pub fn merge_glyph(&mut self, incoming: Glyph) -> Option<GlyphKey> {
        let Some(cp) = incoming.codepoint else {
            return Some(self.add_glyph(incoming));
        };

        match self.key_for(cp) {
            Some(key) if self.glyphs[key.slot()].is_worth_outputting() => {
                debug!("{cp} already present as '{}', not merged", self.glyphs[key.slot()].name);
                None
            }
            Some(key) if self.glyphs[key.slot()].codepoint == Some(cp) => {
                let glyph = &mut self.glyphs[key.slot()];
                glyph.name = incoming.name;
                glyph.aliases = incoming.aliases;
                glyph.set_contents(incoming.outline, incoming.advance);
                self.index_glyph(key);
                Some(key)
            }
            _ => Some(self.add_glyph(incoming)),
        }
    }

    /// Rebuild the codepoint index from the glyphs' own codepoint data.
    pub fn reindex(&mut self) {
        self.cmap.clear();
        for slot in 0..self.glyphs.len() {
            self.index_glyph(GlyphKey::new(slot));
        }
    }

    fn index_glyph(&mut self, key: GlyphKey) {
        let codepoints: Vec<Codepoint> = self.glyphs[key.slot()].nominal_codepoints().collect();
        for cp in codepoints {
            let claimants = self.cmap.entry(cp).or_default();
            if !claimants.contains(&key) {
                claimants.push(key);
            }
        }
    }

    /// Codepoint → glyph assignment for serialization.
    ///
    /// Only live glyphs are mapped. When two live glyphs claim a codepoint the
    /// indexed claimant wins, else the lower slot.
    pub fn nominal_mappings(&self) -> BTreeMap<Codepoint, GlyphKey> {
        let mut mappings: BTreeMap<Codepoint, GlyphKey> = BTreeMap::new();
        for (key, glyph) in self.iter().filter(|(_, g)| g.is_worth_outputting()) {
            for cp in glyph.nominal_codepoints() {
                match mappings.entry(cp) {
                    Entry::Vacant(slot) => {
                        slot.insert(key);
                    }
                    Entry::Occupied(mut slot) => {
                        if self.key_for(cp) == Some(key) {
                            slot.insert(key);
                        }
                    }
                }
            }
        }
        mappings
    }

    /// Change the em size, scaling every outline, advance and vertical metric.
    pub fn set_units_per_em(&mut self, units_per_em: u16) {
        let current = self.units_per_em();
        if current == units_per_em || current == 0 {
            return;
        }
        let factor = f64::from(units_per_em) / f64::from(current);
        let scale = Affine::scale(factor);
        for glyph in &mut self.glyphs {
            glyph.transform(scale);
            glyph.advance = (f64::from(glyph.advance) * factor).round() as u16;
        }
        let tables = &mut self.tables;
        tables.ascent = (f64::from(tables.ascent) * factor).round() as i16;
        tables.descent = i16::try_from(units_per_em).unwrap_or(i16::MAX) - tables.ascent;
        tables.head.units_per_em = units_per_em;
        debug!("rescaled em from {current} to {units_per_em}");
    }

    pub fn has_table(&self, tag: Tag) -> bool {
        self.tables.raw.contains_key(&tag)
    }

    /// Drop a pass-through table. Returns whether it was present.
    pub fn remove_table(&mut self, tag: Tag) -> bool {
        self.tables.raw.remove(&tag).is_some()
    }

    pub fn set_raw_table(&mut self, tag: Tag, data: Vec<u8>) {
        self.tables.raw.insert(tag, data);
    }

    pub fn raw_tables(&self) -> impl Iterator<Item = (Tag, &[u8])> {
        self.tables.raw.iter().map(|(tag, data)| (*tag, data.as_slice()))
    }
}
