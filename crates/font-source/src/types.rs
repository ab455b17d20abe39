//! Small identifier types shared across the glyph model.

use std::fmt::{Display, Formatter, Result};

/// A Unicode codepoint
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Codepoint(pub u32);

impl Codepoint {
    pub const fn new(cp: u32) -> Self {
        Self(cp)
    }

    pub const fn to_u32(self) -> u32 {
        self.0
    }

    /// Convert to a Rust char if valid
    pub fn to_char(self) -> Option<char> {
        char::from_u32(self.0)
    }
}

impl From<u32> for Codepoint {
    fn from(cp: u32) -> Self {
        Self(cp)
    }
}

impl From<char> for Codepoint {
    fn from(ch: char) -> Self {
        Self(ch as u32)
    }
}

impl From<Codepoint> for u32 {
    fn from(cp: Codepoint) -> Self {
        cp.0
    }
}

impl Display for Codepoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "U+{:04X}", self.0)
    }
}

/// Identity of a glyph inside one [`FontSource`](crate::FontSource).
///
/// This is the glyph's slot in the source's glyph order, which becomes its
/// glyph ID on serialization. Slots are never reused or removed.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphKey(pub usize);

impl GlyphKey {
    pub const fn new(slot: usize) -> Self {
        Self(slot)
    }

    pub const fn slot(self) -> usize {
        self.0
    }
}

impl Display for GlyphKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "GID{}", self.0)
    }
}

/// An additional codepoint that reaches a glyph.
///
/// Without a selector the alias is a plain nominal mapping; with one it is a
/// Unicode variation sequence (`codepoint` followed by `selector`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AltUnicode {
    pub codepoint: Codepoint,
    pub selector: Option<u32>,
}

impl AltUnicode {
    pub const fn nominal(codepoint: Codepoint) -> Self {
        Self { codepoint, selector: None }
    }

    pub const fn variation(codepoint: Codepoint, selector: u32) -> Self {
        Self { codepoint, selector: Some(selector) }
    }

    pub const fn is_transparent(&self) -> bool {
        self.selector.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codepoint() {
        let cp = Codepoint::new(0x0041);
        assert_eq!(cp.to_char(), Some('A'));
        assert_eq!(format!("{}", cp), "U+0041");
        assert_eq!(format!("{}", Codepoint::new(0x1F600)), "U+1F600");
    }

    #[test]
    fn test_glyph_key() {
        let key = GlyphKey::new(42);
        assert_eq!(key.slot(), 42);
        assert_eq!(format!("{}", key), "GID42");
    }

    #[test]
    fn test_alt_unicode() {
        assert!(AltUnicode::nominal(Codepoint::new(0x3402)).is_transparent());
        assert!(!AltUnicode::variation(Codepoint::new(0x845B), 0xE0100).is_transparent());
    }
}
