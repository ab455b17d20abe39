//! Commit a source to storage and read it back.
//!
//! Some edits (flattening alias codepoints into real glyphs) only become
//! visible to later stages once the font has been serialized and parsed
//! again; a [`SourceStore`] performs that round trip.

use std::{io::Write, path::PathBuf};

use log::debug;
use tempfile::Builder;

use crate::{error::Result, source::FontSource};

pub trait SourceStore {
    /// Persist `source` and return the freshly reloaded result.
    fn commit_and_reload(&self, source: FontSource) -> Result<FontSource>;
}

/// Round-trips through serialization without touching the filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct InMemoryStore;

impl SourceStore for InMemoryStore {
    fn commit_and_reload(&self, source: FontSource) -> Result<FontSource> {
        FontSource::from_bytes(&source.to_bytes()?)
    }
}

/// Round-trips through a uniquely named scratch file.
///
/// The file is removed when the round trip finishes, whether or not it
/// succeeded.
#[derive(Clone, Debug)]
pub struct ScratchFileStore {
    dir: PathBuf,
}

impl ScratchFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SourceStore for ScratchFileStore {
    fn commit_and_reload(&self, source: FontSource) -> Result<FontSource> {
        let mut file = Builder::new().prefix("scratch-").suffix(".ttf").tempfile_in(&self.dir)?;
        file.write_all(&source.to_bytes()?)?;
        file.flush()?;
        debug!("committed source to {}", file.path().display());
        FontSource::load(file.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        glyph::Glyph,
        outline::{Outline, OutlinePoint},
        source::FontTables,
        types::Codepoint,
    };

    fn sample() -> FontSource {
        let mut source = FontSource::new(FontTables::new(880, 120));
        source.add_glyph(Glyph::new(".notdef", None, Outline::default(), 500));
        source.add_glyph(Glyph::new(
            "A",
            Some(Codepoint::new(0x41)),
            Outline::new(vec![vec![
                OutlinePoint::on(50.0, 0.0),
                OutlinePoint::on(250.0, 700.0),
                OutlinePoint::on(450.0, 0.0),
            ]]),
            500,
        ));
        source
    }

    #[test]
    fn test_in_memory_round_trip() {
        let reloaded = InMemoryStore.commit_and_reload(sample()).unwrap();
        let glyph = reloaded.glyph_by_codepoint(Codepoint::new(0x41)).unwrap();
        assert_eq!(glyph.name, "A");
        assert_eq!(glyph.advance, 500);
    }

    #[test]
    fn test_scratch_file_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScratchFileStore::new(dir.path());
        let reloaded = store.commit_and_reload(sample()).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
