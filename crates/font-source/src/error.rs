use std::{io, path::PathBuf, result};

use read_fonts::ReadError;
use write_fonts::{BuilderError, error};

use crate::types::Codepoint;

/// Errors raised while loading, editing or serializing a font source.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The font resource could not be read from disk.
    #[error("Failed to read font file '{path}': {source}")]
    ReadFont { path: PathBuf, source: io::Error },

    /// The font resource exists but could not be parsed.
    #[error("Failed to parse font '{path}': {source}")]
    ParseFont { path: PathBuf, source: Box<Error> },

    #[error("failed to parse font: {0}")]
    Parse(#[from] ReadError),

    #[error("failed to write font: {0}")]
    Write(#[from] error::Error),

    #[error("failed to build font: {0}")]
    Builder(#[from] BuilderError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("required table '{0}' not found")]
    MissingTable(&'static str),

    /// A reference glyph that later stages cannot do without is absent.
    #[error("required glyph {0} not found")]
    MissingGlyph(Codepoint),

    #[error("composite glyph {glyph} nests components deeper than {limit} levels")]
    ComponentDepth { glyph: u32, limit: usize },

    #[error("font has {0} glyphs, more than a TrueType font can address")]
    TooManyGlyphs(usize),

    #[error("failed to build cmap table: {0}")]
    Cmap(String),
}

pub type Result<T> = result::Result<T, Error>;

impl Error {
    /// Whether this error means the resource itself was missing or unreadable.
    pub fn is_load_failure(&self) -> bool {
        matches!(self, Error::ReadFont { .. } | Error::ParseFont { .. })
    }
}
