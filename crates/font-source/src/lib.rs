//! Editable TrueType font sources.
//!
//! A [`FontSource`] holds decomposed quadratic outlines, advances and
//! codepoint assignments for every glyph, plus the font-wide tables needed to
//! write it back out. Glyphs are addressed by [`GlyphKey`]; deleting a glyph
//! clears it in place so keys stay valid for the lifetime of the source.

mod alias;
mod error;
mod glyph;
mod load;
mod outline;
mod source;
mod store;
mod types;
mod write;

pub use alias::flatten_aliases;
pub use error::{Error, Result};
pub use glyph::Glyph;
pub use outline::{Outline, OutlinePoint};
pub use source::{FontSource, FontTables, name_id};
pub use store::{InMemoryStore, ScratchFileStore, SourceStore};
pub use types::{AltUnicode, Codepoint, GlyphKey};
