//! Serialize a [`FontSource`] back into a TrueType binary.

use std::{collections::BTreeMap, fs, path::Path};

use font_types::{FWord, GlyphId, NameId, UfWord, Uint24};
use log::debug;
use write_fonts::{
    FontBuilder,
    tables::{
        cmap::{
            Cmap, Cmap14, CmapSubtable, DefaultUvs, EncodingRecord, NonDefaultUvs, PlatformId,
            UnicodeRange, UvsMapping, VariationSelector,
        },
        glyf::{Bbox, GlyfLocaBuilder, Glyph as WriteGlyph},
        hmtx::{Hmtx, LongMetric},
        loca::LocaFormat,
        name::{Name, NameRecord},
        post::Post,
    },
};

use crate::{
    error::{Error, Result},
    source::FontSource,
    types::{Codepoint, GlyphKey},
};

/// Unicode platform encoding for variation sequences.
const UNICODE_VARIATION_ENCODING: u16 = 5;

/// Running totals for the metric tables.
#[derive(Default)]
struct Extents {
    bbox: Option<Bbox>,
    advance_max: u16,
    min_lsb: Option<i16>,
    min_rsb: Option<i16>,
    x_max_extent: Option<i16>,
    max_points: u16,
    max_contours: u16,
}

impl Extents {
    fn update(&mut self, bbox: Bbox, advance: u16, points: usize, contours: usize) {
        self.bbox = Some(match self.bbox {
            None => bbox,
            Some(b) => Bbox {
                x_min: b.x_min.min(bbox.x_min),
                y_min: b.y_min.min(bbox.y_min),
                x_max: b.x_max.max(bbox.x_max),
                y_max: b.y_max.max(bbox.y_max),
            },
        });
        let rsb = (i32::from(advance) - i32::from(bbox.x_max)).clamp(-32768, 32767) as i16;
        self.min_lsb = Some(self.min_lsb.map_or(bbox.x_min, |v| v.min(bbox.x_min)));
        self.min_rsb = Some(self.min_rsb.map_or(rsb, |v| v.min(rsb)));
        self.x_max_extent = Some(self.x_max_extent.map_or(bbox.x_max, |v| v.max(bbox.x_max)));
        self.max_points = self.max_points.max(points.min(u16::MAX as usize) as u16);
        self.max_contours = self.max_contours.max(contours.min(u16::MAX as usize) as u16);
    }
}

impl FontSource {
    /// Serialize to a TrueType font.
    ///
    /// Every glyph slot becomes the glyph ID of the same index, so tables
    /// carried through untouched keep referring to the right glyphs.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let num_glyphs = self.len();
        if num_glyphs > usize::from(u16::MAX) {
            return Err(Error::TooManyGlyphs(num_glyphs));
        }

        let mut glyf_builder = GlyfLocaBuilder::new();
        let mut metrics = Vec::with_capacity(num_glyphs);
        let mut extents = Extents::default();

        for (_, glyph) in self.iter() {
            let simple =
                if glyph.is_worth_outputting() { glyph.outline.to_simple_glyph() } else { None };
            let advance = if glyph.is_worth_outputting() { glyph.advance } else { 0 };
            extents.advance_max = extents.advance_max.max(advance);

            let side_bearing = match simple {
                Some(simple) => {
                    let bbox = simple.bbox;
                    extents.update(
                        bbox,
                        advance,
                        glyph.outline.num_points(),
                        glyph.outline.contours().len(),
                    );
                    glyf_builder.add_glyph(&WriteGlyph::Simple(simple))?;
                    bbox.x_min
                }
                None => {
                    glyf_builder.add_glyph(&WriteGlyph::Empty)?;
                    0
                }
            };
            metrics.push(LongMetric { advance, side_bearing });
        }

        let (glyf, loca, loca_format) = glyf_builder.build();
        let hmtx = Hmtx::new(metrics, vec![]);
        let bbox = extents.bbox.unwrap_or(Bbox { x_min: 0, y_min: 0, x_max: 0, y_max: 0 });

        let mut head = self.tables.head.clone();
        head.x_min = bbox.x_min;
        head.y_min = bbox.y_min;
        head.x_max = bbox.x_max;
        head.y_max = bbox.y_max;
        head.index_to_loc_format = match loca_format {
            LocaFormat::Short => 0,
            LocaFormat::Long => 1,
        };

        let mut hhea = self.tables.hhea.clone();
        hhea.advance_width_max = UfWord::new(extents.advance_max);
        hhea.min_left_side_bearing = FWord::new(extents.min_lsb.unwrap_or(0));
        hhea.min_right_side_bearing = FWord::new(extents.min_rsb.unwrap_or(0));
        hhea.x_max_extent = FWord::new(extents.x_max_extent.unwrap_or(0));
        hhea.number_of_h_metrics = num_glyphs as u16;

        let mut maxp = self.tables.maxp.clone();
        maxp.num_glyphs = num_glyphs as u16;
        if maxp.max_points.is_some() {
            maxp.max_points = Some(extents.max_points);
            maxp.max_contours = Some(extents.max_contours);
            maxp.max_composite_points = Some(0);
            maxp.max_composite_contours = Some(0);
            maxp.max_component_elements = Some(0);
            maxp.max_component_depth = Some(0);
            maxp.max_size_of_instructions = Some(0);
        }

        let post = self.build_post();
        let cmap = self.build_cmap()?;
        let name = self.build_name();

        let mut builder = FontBuilder::new();
        for (tag, data) in self.raw_tables() {
            builder.add_raw(tag, data);
        }
        builder.add_table(&head)?;
        builder.add_table(&hhea)?;
        builder.add_table(&maxp)?;
        builder.add_table(&hmtx)?;
        builder.add_table(&glyf)?;
        builder.add_table(&loca)?;
        builder.add_table(&cmap)?;
        builder.add_table(&post)?;
        builder.add_table(&name)?;
        if let Some(os2) = self.build_os2() {
            builder.add_table(&os2)?;
        }

        Ok(builder.build())
    }

    /// Serialize and write to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = self.to_bytes()?;
        fs::write(path.as_ref(), &data)?;
        debug!("wrote {} ({} bytes)", path.as_ref().display(), data.len());
        Ok(())
    }

    fn build_post(&self) -> Post {
        let names: Vec<&str> = self.iter().map(|(_, glyph)| glyph.name.as_str()).collect();
        let template = &self.tables.post;
        let mut post = Post::new_v2(names);
        post.italic_angle = template.italic_angle;
        post.underline_position = template.underline_position;
        post.underline_thickness = template.underline_thickness;
        post.is_fixed_pitch = template.is_fixed_pitch;
        post.min_mem_type42 = template.min_mem_type42;
        post.max_mem_type42 = template.max_mem_type42;
        post.min_mem_type1 = template.min_mem_type1;
        post.max_mem_type1 = template.max_mem_type1;
        post
    }

    fn build_cmap(&self) -> Result<Cmap> {
        let nominal = self.nominal_mappings();
        let mappings: Vec<(char, GlyphId)> = nominal
            .iter()
            .filter_map(|(cp, key)| Some((cp.to_char()?, GlyphId::new(key.slot() as u32))))
            .collect();
        let mut cmap = Cmap::from_mappings(mappings).map_err(|e| Error::Cmap(format!("{e:?}")))?;
        if let Some(cmap14) = self.build_cmap14(&nominal) {
            // Records stay sorted by (platform, encoding): Unicode/5 follows Unicode/3 and /4.
            let at = cmap
                .encoding_records
                .iter()
                .position(|record| record.platform_id != PlatformId::Unicode)
                .unwrap_or(cmap.encoding_records.len());
            cmap.encoding_records.insert(
                at,
                EncodingRecord::new(
                    PlatformId::Unicode,
                    UNICODE_VARIATION_ENCODING,
                    CmapSubtable::Format14(cmap14),
                ),
            );
        }
        Ok(cmap)
    }

    /// Variation sequences of live glyphs. A sequence landing on the glyph
    /// the base character maps to anyway goes in the default table.
    fn build_cmap14(&self, nominal: &BTreeMap<Codepoint, GlyphKey>) -> Option<Cmap14> {
        let mut by_selector: BTreeMap<u32, (Vec<u32>, Vec<(u32, u16)>)> = BTreeMap::new();
        for (key, glyph) in self.iter().filter(|(_, g)| g.is_worth_outputting()) {
            for alias in &glyph.aliases {
                let Some(selector) = alias.selector else {
                    continue;
                };
                let (defaults, variants) = by_selector.entry(selector).or_default();
                if nominal.get(&alias.codepoint) == Some(&key) {
                    defaults.push(alias.codepoint.to_u32());
                } else {
                    variants.push((alias.codepoint.to_u32(), key.slot() as u16));
                }
            }
        }
        if by_selector.is_empty() {
            return None;
        }

        // format + length + record count, then 11 bytes per selector record.
        let mut length = 10 + 11 * by_selector.len() as u32;
        let records: Vec<VariationSelector> = by_selector
            .into_iter()
            .map(|(selector, (mut defaults, mut variants))| {
                defaults.sort_unstable();
                defaults.dedup();
                variants.sort_unstable();
                variants.dedup_by_key(|(cp, _)| *cp);

                let default_uvs = (!defaults.is_empty()).then(|| {
                    length += 4 + 4 * defaults.len() as u32;
                    let ranges: Vec<UnicodeRange> = defaults
                        .iter()
                        .map(|cp| UnicodeRange::new(Uint24::new(*cp), 0))
                        .collect();
                    DefaultUvs::new(ranges.len() as u32, ranges)
                });
                let non_default_uvs = (!variants.is_empty()).then(|| {
                    length += 4 + 5 * variants.len() as u32;
                    let mappings: Vec<UvsMapping> = variants
                        .iter()
                        .map(|(cp, gid)| UvsMapping::new(Uint24::new(*cp), *gid))
                        .collect();
                    NonDefaultUvs::new(mappings.len() as u32, mappings)
                });
                VariationSelector::new(Uint24::new(selector), default_uvs, non_default_uvs)
            })
            .collect();

        Some(Cmap14::new(length, records.len() as u32, records))
    }

    fn build_name(&self) -> Name {
        let records: Vec<NameRecord> = self
            .tables
            .names
            .iter()
            .map(|(id, string)| NameRecord::new(3, 1, 0x409, NameId::new(*id), string.clone().into()))
            .collect();
        Name::new(records)
    }

    fn build_os2(&self) -> Option<write_fonts::tables::os2::Os2> {
        let mut os2 = self.tables.os2.clone()?;
        let codepoints = self.live_codepoints();
        if let (Some(first), Some(last)) = (codepoints.first(), codepoints.last()) {
            os2.us_first_char_index = first.to_u32().min(0xFFFF) as u16;
            os2.us_last_char_index = last.to_u32().min(0xFFFF) as u16;
        }

        let advances: Vec<u32> = self
            .iter()
            .filter(|(_, glyph)| glyph.is_worth_outputting() && glyph.advance > 0)
            .map(|(_, glyph)| u32::from(glyph.advance))
            .collect();
        if !advances.is_empty() {
            let average = advances.iter().sum::<u32>() / advances.len() as u32;
            os2.x_avg_char_width = average.min(i16::MAX as u32) as i16;
        }
        Some(os2)
    }
}
