use std::collections::HashMap;

use log::debug;

use crate::{
    glyph::Glyph,
    source::FontSource,
    types::{AltUnicode, Codepoint, GlyphKey},
};

/// Turn transparent alias codepoints into glyphs of their own.
///
/// Each alias without a variation selector is replaced by a copy of the
/// owning glyph's outline and advance: into the glyph whose primary codepoint
/// is the alias codepoint when one exists, else into a new glyph named
/// `uni{HEX}copy`. An alias identical to the one before it is skipped.
/// Variation-sequence aliases are left alone.
///
/// Returns the number of aliases flattened. The source should be committed
/// and reloaded afterwards so the new encoding takes effect everywhere.
pub fn flatten_aliases(source: &mut FontSource) -> usize {
    let mut primaries: HashMap<Codepoint, GlyphKey> = HashMap::new();
    for (key, glyph) in source.iter() {
        if let Some(cp) = glyph.codepoint {
            primaries.entry(cp).or_insert(key);
        }
    }

    let mut copies = Vec::new();
    let keys: Vec<GlyphKey> = source.keys().collect();
    for key in keys {
        let Some(glyph) = source.glyph_mut(key) else {
            continue;
        };

        let mut targets = Vec::new();
        let mut previous: Option<AltUnicode> = None;
        for alias in &glyph.aliases {
            if alias.is_transparent() && previous != Some(*alias) {
                targets.push(alias.codepoint);
            }
            previous = Some(*alias);
        }
        if targets.is_empty() {
            continue;
        }

        glyph.aliases.retain(|alias| !alias.is_transparent());
        for cp in targets {
            copies.push((cp, glyph.outline.clone(), glyph.advance));
        }
    }

    let flattened = copies.len();
    for (cp, outline, advance) in copies {
        match primaries.get(&cp).copied().and_then(|key| source.glyph_mut(key)) {
            Some(target) => target.set_contents(outline, advance),
            None => {
                let name = format!("uni{:X}copy", cp.to_u32());
                let key = source.add_glyph(Glyph::new(name, Some(cp), outline, advance));
                primaries.insert(cp, key);
            }
        }
    }

    source.reindex();
    debug!("flattened {flattened} alias codepoints");
    flattened
}
