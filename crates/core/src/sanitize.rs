//! Output-table hygiene: layout lookups and glyph names.

use std::collections::HashSet;

use font_source::FontSource;
use font_types::Tag;
use log::debug;

const LOOKUP_TABLES: [Tag; 2] = [Tag::new(b"GSUB"), Tag::new(b"GPOS")];

/// Drop every substitution and positioning lookup.
///
/// Returns the number of tables removed.
pub fn strip_lookups(source: &mut FontSource) -> usize {
    let removed = LOOKUP_TABLES.into_iter().filter(|tag| source.remove_table(*tag)).count();
    if removed > 0 {
        debug!("removed {removed} lookup tables");
    }
    removed
}

/// Rename glyphs whose names were already taken by an earlier slot.
///
/// A colliding glyph becomes `{name}_{slot}`, with `_{slot}` appended again
/// until the name is free. Returns the number of glyphs renamed.
pub fn resolve_duplicate_names(source: &mut FontSource) -> usize {
    let mut seen: HashSet<String> = HashSet::with_capacity(source.len());
    let mut renamed = 0;
    let keys: Vec<_> = source.keys().collect();

    for key in keys {
        let Some(glyph) = source.glyph_mut(key) else {
            continue;
        };
        if seen.insert(glyph.name.clone()) {
            continue;
        }
        let mut candidate = format!("{}_{}", glyph.name, key.slot());
        while seen.contains(&candidate) {
            candidate = format!("{candidate}_{}", key.slot());
        }
        debug!("renaming duplicate glyph '{}' to '{candidate}'", glyph.name);
        glyph.name = candidate.clone();
        seen.insert(candidate);
        renamed += 1;
    }
    renamed
}
