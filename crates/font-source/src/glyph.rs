use kurbo::{Affine, Rect};

use crate::{
    outline::Outline,
    types::{AltUnicode, Codepoint},
};

/// One glyph of a [`FontSource`](crate::FontSource).
#[derive(Clone, Debug, PartialEq)]
pub struct Glyph {
    pub name: String,
    /// Primary codepoint.
    pub codepoint: Option<Codepoint>,
    /// Further codepoints that reach this glyph.
    pub aliases: Vec<AltUnicode>,
    pub outline: Outline,
    pub advance: u16,
    cleared: bool,
}

impl Glyph {
    pub fn new(
        name: impl Into<String>,
        codepoint: Option<Codepoint>,
        outline: Outline,
        advance: u16,
    ) -> Self {
        Self { name: name.into(), codepoint, aliases: Vec::new(), outline, advance, cleared: false }
    }

    /// Whether the glyph has content worth writing out.
    ///
    /// Cleared glyphs and empty zero-width placeholders are not.
    pub fn is_worth_outputting(&self) -> bool {
        !self.cleared && (!self.outline.is_empty() || self.advance > 0)
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    /// Delete the glyph's content. The slot and its codepoint stay, but the
    /// glyph is no longer mapped or drawn.
    pub fn clear(&mut self) {
        self.outline = Outline::default();
        self.advance = 0;
        self.cleared = true;
    }

    /// Replace outline and advance, reviving a cleared glyph.
    pub fn set_contents(&mut self, outline: Outline, advance: u16) {
        self.outline = outline;
        self.advance = advance;
        self.cleared = false;
    }

    /// Primary codepoint followed by every transparent alias.
    pub fn nominal_codepoints(&self) -> impl Iterator<Item = Codepoint> + '_ {
        self.codepoint.into_iter().chain(
            self.aliases.iter().filter(|alias| alias.is_transparent()).map(|alias| alias.codepoint),
        )
    }

    pub fn has_codepoint(&self, cp: Codepoint) -> bool {
        self.nominal_codepoints().any(|c| c == cp)
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.outline.bounds()
    }

    /// Apply an affine transform to the outline. The advance is unchanged.
    pub fn transform(&mut self, affine: Affine) {
        self.outline.transform(affine);
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.transform(Affine::translate((dx, dy)));
    }
}
