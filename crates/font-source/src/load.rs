//! Parse a TrueType font into a [`FontSource`].

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
};

use font_types::{GlyphId, GlyphId16, Tag};
use kurbo::Affine;
use log::{debug, warn};
use read_fonts::{
    FontRef, TableProvider,
    tables::{
        cmap::{Cmap, CmapSubtable, MapVariant, PlatformId},
        glyf::{Anchor, Glyf, Glyph as ReadGlyph},
        loca::Loca,
    },
};
use write_fonts::from_obj::ToOwnedTable;

use crate::{
    error::{Error, Result},
    glyph::Glyph,
    outline::Outline,
    source::{FontSource, FontTables},
    types::{AltUnicode, Codepoint},
};

const NONCHARACTER_FFFF: u32 = 0xFFFF;

/// Composite nesting deeper than this is treated as a malformed font.
const MAX_COMPONENT_DEPTH: usize = 16;

/// Tables rebuilt from the glyph model on every write.
pub(crate) const REGENERATED_TABLES: [Tag; 10] = [
    Tag::new(b"glyf"),
    Tag::new(b"loca"),
    Tag::new(b"hmtx"),
    Tag::new(b"hhea"),
    Tag::new(b"maxp"),
    Tag::new(b"cmap"),
    Tag::new(b"post"),
    Tag::new(b"head"),
    Tag::new(b"OS/2"),
    Tag::new(b"name"),
];

/// Tables that go stale once outlines, advances or glyph programs change.
const STALE_TABLES: [Tag; 18] = [
    Tag::new(b"hdmx"),
    Tag::new(b"LTSH"),
    Tag::new(b"VDMX"),
    Tag::new(b"vhea"),
    Tag::new(b"vmtx"),
    Tag::new(b"VORG"),
    Tag::new(b"DSIG"),
    Tag::new(b"CFF "),
    Tag::new(b"CFF2"),
    Tag::new(b"fpgm"),
    Tag::new(b"prep"),
    Tag::new(b"cvt "),
    Tag::new(b"fvar"),
    Tag::new(b"gvar"),
    Tag::new(b"avar"),
    Tag::new(b"cvar"),
    Tag::new(b"HVAR"),
    Tag::new(b"MVAR"),
];

impl FontSource {
    /// Read and parse the font at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)
            .map_err(|source| Error::ReadFont { path: path.to_path_buf(), source })?;
        Self::from_bytes(&data)
            .map_err(|e| Error::ParseFont { path: path.to_path_buf(), source: Box::new(e) })
    }

    /// Parse a font from memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let font = FontRef::new(data)?;

        let head = font.head()?;
        let hhea = font.hhea()?;
        let maxp = font.maxp()?;
        let hmtx = font.hmtx()?;
        let glyf = font.glyf().map_err(|_| Error::MissingTable("glyf"))?;
        let loca = font.loca(None).map_err(|_| Error::MissingTable("loca"))?;
        let post = font.post().ok();
        let os2 = font.os2().ok();

        let num_glyphs = maxp.num_glyphs();
        let mut decomposer = Decomposer { glyf: &glyf, loca: &loca, cache: HashMap::new() };
        let mut glyphs = Vec::with_capacity(num_glyphs as usize);

        for gid in 0..num_glyphs {
            let name = post
                .as_ref()
                .and_then(|post| post.glyph_name(GlyphId16::new(gid)))
                .map(str::to_string)
                .unwrap_or_else(|| format!("glyph{gid:05}"));
            let outline = decomposer.outline(u32::from(gid), 0)?;
            let advance = hmtx.advance(GlyphId::new(u32::from(gid))).unwrap_or(0);
            glyphs.push(Glyph::new(name, None, outline, advance));
        }

        if let Ok(cmap) = font.cmap() {
            assign_codepoints(&cmap, &mut glyphs);
        }

        let names = read_names(&font);
        let (ascent, descent) = match &os2 {
            Some(os2) => (os2.s_typo_ascender(), -os2.s_typo_descender()),
            None => (hhea.ascender().to_i16(), -hhea.descender().to_i16()),
        };

        let mut raw = BTreeMap::new();
        for record in font.table_directory.table_records() {
            let tag = record.tag();
            if !REGENERATED_TABLES.contains(&tag)
                && !STALE_TABLES.contains(&tag)
                && let Some(data) = font.table_data(tag)
            {
                raw.insert(tag, data.as_bytes().to_vec());
            } else if STALE_TABLES.contains(&tag) {
                debug!("dropping table '{tag}'");
            }
        }

        let tables = FontTables {
            head: head.to_owned_table(),
            hhea: hhea.to_owned_table(),
            maxp: maxp.to_owned_table(),
            os2: os2.map(|os2| os2.to_owned_table()),
            post: match &post {
                Some(post) => post.to_owned_table(),
                None => FontTables::new(ascent, descent).post,
            },
            names,
            ascent,
            descent,
            raw,
        };

        Ok(FontSource::from_parts(glyphs, tables))
    }
}

/// Flattens composite glyphs into plain contours.
struct Decomposer<'a> {
    glyf: &'a Glyf<'a>,
    loca: &'a Loca<'a>,
    cache: HashMap<u32, Outline>,
}

impl Decomposer<'_> {
    fn outline(&mut self, gid: u32, depth: usize) -> Result<Outline> {
        if let Some(outline) = self.cache.get(&gid) {
            return Ok(outline.clone());
        }
        if depth > MAX_COMPONENT_DEPTH {
            return Err(Error::ComponentDepth { glyph: gid, limit: MAX_COMPONENT_DEPTH });
        }

        let outline = match self.loca.get_glyf(GlyphId::new(gid), self.glyf)? {
            None => Outline::default(),
            Some(ReadGlyph::Simple(simple)) => Outline::from_simple(&simple),
            Some(ReadGlyph::Composite(composite)) => {
                let mut outline = Outline::default();
                for component in composite.components() {
                    let (dx, dy) = match component.anchor {
                        Anchor::Offset { x, y } => (f64::from(x), f64::from(y)),
                        Anchor::Point { base, component: point } => {
                            debug!("glyph {gid}: point-matched component ({base}, {point}) placed at origin");
                            (0.0, 0.0)
                        }
                    };
                    let t = &component.transform;
                    let affine = Affine::new([
                        f64::from(t.xx.to_f32()),
                        f64::from(t.yx.to_f32()),
                        f64::from(t.xy.to_f32()),
                        f64::from(t.yy.to_f32()),
                        dx,
                        dy,
                    ]);
                    let mut part = self.outline(component.glyph.to_u32(), depth + 1)?;
                    part.transform(affine);
                    outline.extend(part);
                }
                outline
            }
        };

        self.cache.insert(gid, outline.clone());
        Ok(outline)
    }
}

fn find_best_subtable<'a>(cmap: &Cmap<'a>) -> Option<CmapSubtable<'a>> {
    let records = cmap.encoding_records();
    let is_unicode = |platform: PlatformId, encoding: u16, full: bool| {
        platform == PlatformId::Unicode
            || (platform == PlatformId::Windows && encoding == if full { 10 } else { 1 })
    };

    let find = |full: bool| {
        records.iter().find_map(|record| {
            if !is_unicode(record.platform_id(), record.encoding_id(), full) {
                return None;
            }
            let subtable = record.subtable(cmap.offset_data()).ok()?;
            let matches = if full {
                matches!(subtable, CmapSubtable::Format12(_))
            } else {
                matches!(subtable, CmapSubtable::Format4(_))
            };
            matches.then_some(subtable)
        })
    };

    find(true).or_else(|| find(false))
}

/// Attach cmap codepoints to glyphs: the lowest codepoint of each glyph
/// becomes its primary codepoint, the rest become aliases.
fn assign_codepoints(cmap: &Cmap, glyphs: &mut [Glyph]) {
    let Some(subtable) = find_best_subtable(cmap) else {
        warn!("font has no usable Unicode cmap subtable");
        return;
    };

    let mut by_glyph: BTreeMap<usize, Vec<u32>> = BTreeMap::new();
    let mut nominal: HashMap<u32, usize> = HashMap::new();
    for (cp, gid) in subtable.iter() {
        // Format 4 ends with a U+FFFF segment pointing at .notdef.
        if cp == NONCHARACTER_FFFF || gid.to_u32() == 0 {
            continue;
        }
        let slot = gid.to_u32() as usize;
        by_glyph.entry(slot).or_default().push(cp);
        nominal.entry(cp).or_insert(slot);
    }

    for (slot, mut cps) in by_glyph {
        let Some(glyph) = glyphs.get_mut(slot) else {
            continue;
        };
        cps.sort_unstable();
        cps.dedup();
        let mut cps = cps.into_iter().map(Codepoint::new);
        glyph.codepoint = cps.next();
        glyph.aliases.extend(cps.map(AltUnicode::nominal));
    }

    let variations = cmap.encoding_records().iter().find_map(|record| {
        match record.subtable(cmap.offset_data()).ok()? {
            CmapSubtable::Format14(cmap14) => Some(cmap14),
            _ => None,
        }
    });
    if let Some(cmap14) = variations {
        for (cp, selector, variant) in cmap14.iter() {
            let slot = match variant {
                MapVariant::Variant(gid) => Some(gid.to_u32() as usize),
                MapVariant::UseDefault => nominal.get(&cp).copied(),
            };
            if let Some(glyph) = slot.and_then(|slot| glyphs.get_mut(slot)) {
                glyph.aliases.push(AltUnicode::variation(Codepoint::new(cp), selector));
            }
        }
    }
}

/// Windows English name strings by name ID, falling back to any readable
/// record for IDs without one.
fn read_names(font: &FontRef) -> BTreeMap<u16, String> {
    let mut names = BTreeMap::new();
    let Ok(name) = font.name() else {
        return names;
    };
    let string_data = name.string_data();

    let mut records: Vec<_> = name.name_record().iter().collect();
    // Windows English first so it wins over other platforms.
    records.sort_by_key(|r| !(r.platform_id() == 3 && r.language_id() == 0x409));

    for record in records {
        let Ok(string) = record.string(string_data) else {
            continue;
        };
        names.entry(record.name_id().to_u16()).or_insert_with(|| string.to_string());
    }
    names
}
