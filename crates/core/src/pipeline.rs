//! Variant driver: build one output pair per weight.

use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{Context, Result};
use font_source::{FontSource, ScratchFileStore, SourceStore, flatten_aliases};
use log::info;
use rayon::{ThreadPoolBuilder, prelude::*};

use crate::{
    arbitration::arbitrate,
    config::{BuildConfig, Modifiers, NERD_FONT_PATH},
    geometry::{Grid, adjust_shapes, quantize_widths},
    io::{check_results, load_font, reset_build_dir, save_font},
    metadata::{apply_metadata, reference_heights},
    naming::{FontNaming, Role, output_file_name},
    sanitize::{resolve_duplicate_names, strip_lookups},
    styles::{BUILD_WEIGHTS, Weight},
    supplemental::{
        SupplementalCache, merge_supplemental, prepare_supplemental, visualize_ideographic_space,
    },
};

/// Per-run flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    pub modifiers: Modifiers,
    /// Build Regular only.
    pub debug: bool,
    pub keep_build_dir: bool,
    /// Worker threads; `None` builds variants one after another.
    pub jobs: Option<usize>,
}

/// One weight under the run's modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantSpec {
    pub weight: Weight,
    pub modifiers: Modifiers,
}

impl VariantSpec {
    pub fn weight_class(&self) -> u16 {
        self.weight.class()
    }
}

/// The two fonts written for one variant.
#[derive(Debug, Clone)]
pub struct OutputFontPair {
    pub ideographic: FontSource,
    pub latin: FontSource,
}

/// Pipeline execution context
#[derive(Debug)]
pub struct PipelineContext {
    pub config: BuildConfig,
    pub options: BuildOptions,
    supplemental: SupplementalCache,
}

impl PipelineContext {
    pub fn new(config: BuildConfig, options: BuildOptions) -> Self {
        Self { config, options, supplemental: SupplementalCache::new() }
    }

    pub fn jp_source_path(&self, weight: Weight) -> PathBuf {
        self.config.source_dir.join(format!("{}{weight}.ttf", self.config.jp_font))
    }

    pub fn latin_source_path(&self, weight: Weight) -> PathBuf {
        let stem = if self.options.modifiers.narrow {
            &self.config.eng_font_narrow
        } else {
            &self.config.eng_font
        };
        self.config.source_dir.join(format!("{stem}{weight}.ttf"))
    }

    pub fn supplemental_path(&self) -> PathBuf {
        self.config.source_dir.join(NERD_FONT_PATH)
    }

    pub fn ideographic_space_path(&self) -> PathBuf {
        self.config.source_dir.join(&self.config.ideographic_space)
    }

    pub fn output_path(&self, weight: Weight, role: Role) -> PathBuf {
        self.config
            .build_dir
            .join(output_file_name(&self.config, self.options.modifiers, weight, role))
    }

    /// Weights this run builds.
    pub fn weights(&self) -> &'static [Weight] {
        if self.options.debug { &BUILD_WEIGHTS[..1] } else { BUILD_WEIGHTS }
    }

    fn grid(&self) -> Grid {
        Grid::new(&self.config, self.options.modifiers)
    }

    fn supplemental(&self) -> Result<std::sync::Arc<FontSource>> {
        self.supplemental.get_or_init(|| {
            let path = self.supplemental_path();
            info!("Loading supplemental glyphs from {}", path.display());
            let source = load_font(&path)?;
            Ok(prepare_supplemental(source, self.config.units_per_em(), self.grid().half))
        })
    }
}

/// Run a named step with timing
fn run_step<T>(name: &str, variant: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let start = Instant::now();
    let value = f().with_context(|| format!("{variant}: {name}"))?;
    info!("  {variant}: {name} ({:.2}s)", start.elapsed().as_secs_f64());
    Ok(value)
}

/// Compose both sources for one variant in memory.
pub fn compose_variant(ctx: &PipelineContext, variant: VariantSpec) -> Result<OutputFontPair> {
    let VariantSpec { weight, modifiers } = variant;
    let label = format!("{weight}");
    let grid = ctx.grid();

    let (mut jp, mut latin) = run_step("load", &label, || {
        let mut jp = load_font(&ctx.jp_source_path(weight))?;
        if flatten_aliases(&mut jp) > 0 {
            jp = ScratchFileStore::new(&ctx.config.build_dir)
                .commit_and_reload(jp)
                .context("Failed to reload flattened ideographic source")?;
        }
        let latin = load_font(&ctx.latin_source_path(weight))?;
        Ok((jp, latin))
    })?;

    run_step("arbitrate", &label, || {
        arbitrate(&mut jp, &mut latin, modifiers.console);
        Ok(())
    })?;

    run_step("normalize", &label, || {
        adjust_shapes(&mut jp, &mut latin, grid);
        quantize_widths(&mut jp, grid);
        strip_lookups(&mut jp);
        Ok(())
    })?;

    if !modifiers.hidden_space {
        run_step("ideographic space", &label, || {
            let space = load_font(&ctx.ideographic_space_path())?;
            visualize_ideographic_space(&mut jp, &space, grid.full)?;
            Ok(())
        })?;
    }

    if modifiers.nerd_font {
        run_step("supplemental glyphs", &label, || {
            let supplemental = ctx.supplemental()?;
            merge_supplemental(&mut jp, &mut latin, &supplemental);
            Ok(())
        })?;
    }

    run_step("metadata", &label, || {
        strip_lookups(&mut jp);
        resolve_duplicate_names(&mut jp);
        resolve_duplicate_names(&mut latin);

        // Heights are measured at the output em.
        jp.set_units_per_em(ctx.config.units_per_em());
        latin.set_units_per_em(ctx.config.units_per_em());
        let heights = reference_heights(&latin)?;
        let naming = FontNaming::new(&ctx.config, modifiers, weight);
        apply_metadata(&mut jp, &ctx.config, &naming, heights);
        apply_metadata(&mut latin, &ctx.config, &naming, heights);
        Ok(())
    })?;

    Ok(OutputFontPair { ideographic: jp, latin })
}

/// Compose and write one variant. Returns the written paths.
pub fn generate_variant(ctx: &PipelineContext, weight: Weight) -> Result<[PathBuf; 2]> {
    let variant = VariantSpec { weight, modifiers: ctx.options.modifiers };
    info!("Generating {weight} (class {})", variant.weight_class());
    let start = Instant::now();

    let pair = compose_variant(ctx, variant)?;
    let latin_path = ctx.output_path(weight, Role::Latin);
    let jp_path = ctx.output_path(weight, Role::Ideographic);
    save_font(&pair.latin, &latin_path)?;
    save_font(&pair.ideographic, &jp_path)?;

    info!("Finished {weight} ({:.2}s)", start.elapsed().as_secs_f64());
    Ok([latin_path, jp_path])
}

/// Build every variant of the run.
pub fn build_all(ctx: &PipelineContext) -> Result<Vec<PathBuf>> {
    let build_dir: &Path = &ctx.config.build_dir;
    if ctx.options.keep_build_dir {
        std::fs::create_dir_all(build_dir)
            .with_context(|| format!("Failed to create directory: {}", build_dir.display()))?;
    } else {
        reset_build_dir(build_dir)?;
    }

    let weights = ctx.weights();
    info!("Building {} weights into {}", weights.len(), build_dir.display());
    let start = Instant::now();

    let results: Vec<Result<[PathBuf; 2]>> = match ctx.options.jobs {
        Some(jobs) => {
            let pool = ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .context("Failed to start worker pool")?;
            pool.install(|| weights.par_iter().map(|w| generate_variant(ctx, *w)).collect())
        }
        None => weights.iter().map(|w| generate_variant(ctx, *w)).collect(),
    };

    check_results(&results, "build")?;
    let written: Vec<PathBuf> = results.into_iter().flatten().flatten().collect();
    info!("Wrote {} fonts ({:.2}s)", written.len(), start.elapsed().as_secs_f64());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use font_source::{Codepoint, FontTables, Glyph, Outline, OutlinePoint, name_id};
    use font_types::Tag;

    use super::*;

    fn block(x0: f64, x1: f64, top: f64) -> Outline {
        Outline::new(vec![vec![
            OutlinePoint::on(x0, 0.0),
            OutlinePoint::on(x0, top),
            OutlinePoint::on(x1, top),
            OutlinePoint::on(x1, 0.0),
        ]])
    }

    fn encoded(name: &str, cp: u32, outline: Outline, advance: u16) -> Glyph {
        Glyph::new(name, Some(Codepoint::new(cp)), outline, advance)
    }

    /// Writes a Regular ideographic source, a Latin source on a 2000 em and
    /// an ideographic space source into `dir`.
    fn write_sources(config: &BuildConfig, dir: &Path) {
        let mut jp = FontSource::new(FontTables::new(880, 120));
        jp.add_glyph(Glyph::new(".notdef", None, block(100.0, 900.0, 800.0), 1000));
        jp.add_glyph(encoded("A", 0x41, block(50.0, 550.0, 700.0), 600));
        jp.add_glyph(encoded("uni3042", 0x3042, block(100.0, 900.0, 800.0), 1000));
        jp.add_glyph(encoded("uni3000", 0x3000, Outline::default(), 1000));
        jp.add_glyph(Glyph::new("ligature", None, block(100.0, 900.0, 800.0), 1000));
        jp.add_glyph(Glyph::new("ligature", None, block(200.0, 800.0, 800.0), 1000));
        jp.set_raw_table(Tag::new(b"GSUB"), vec![0, 1, 0, 0, 0, 10, 0, 12, 0, 14, 0, 0, 0, 0, 0, 0]);
        jp.set_raw_table(Tag::new(b"GPOS"), vec![0, 1, 0, 0, 0, 10, 0, 12, 0, 14, 0, 0, 0, 0, 0, 0]);
        jp.save(dir.join(format!("{}Regular.ttf", config.jp_font))).unwrap();

        let mut latin = FontSource::new(FontTables::new(1600, 400));
        latin.add_glyph(Glyph::new(".notdef", None, block(100.0, 900.0, 1400.0), 1000));
        latin.add_glyph(encoded("H", 0x48, block(100.0, 900.0, 1428.0), 1000));
        latin.add_glyph(encoded("x", 0x78, block(100.0, 900.0, 1070.0), 1000));
        latin.add_glyph(encoded("A", 0x41, block(100.0, 900.0, 1428.0), 1000));
        latin.save(dir.join(format!("{}Regular.ttf", config.eng_font))).unwrap();

        let mut space = FontSource::new(FontTables::new(880, 120));
        space.add_glyph(Glyph::new(".notdef", None, Outline::default(), 500));
        space.add_glyph(encoded("uni3000", 0x3000, block(100.0, 900.0, 800.0), 1000));
        space.save(dir.join(&config.ideographic_space)).unwrap();
    }

    fn context(modifiers: Modifiers, debug: bool) -> PipelineContext {
        let config = BuildConfig {
            source_dir: PathBuf::from("src-fonts"),
            build_dir: PathBuf::from("out"),
            ..Default::default()
        };
        PipelineContext::new(config, BuildOptions { modifiers, debug, ..Default::default() })
    }

    #[test]
    fn test_source_paths() {
        let ctx = context(Modifiers::default(), false);
        assert_eq!(ctx.jp_source_path(Weight::Bold), Path::new("src-fonts/NotoSansJP-Bold.ttf"));
        assert_eq!(ctx.latin_source_path(Weight::Thin), Path::new("src-fonts/NotoSansMono-Thin.ttf"));
        assert_eq!(
            ctx.supplemental_path(),
            Path::new("src-fonts/nerd-fonts/SymbolsNerdFont-Regular.ttf")
        );

        let ctx = context(Modifiers { narrow: true, ..Default::default() }, false);
        assert_eq!(
            ctx.latin_source_path(Weight::Regular),
            Path::new("src-fonts/NotoSansMono_SemiCondensed-Regular.ttf")
        );
        assert_eq!(
            ctx.output_path(Weight::Regular, Role::Ideographic),
            Path::new("out/NOTONOTO35-Regular-jp.ttf")
        );
    }

    #[test]
    fn test_debug_builds_regular_only() {
        assert_eq!(context(Modifiers::default(), true).weights(), &[Weight::Regular]);
        assert_eq!(context(Modifiers::default(), false).weights().len(), 9);
    }

    #[test]
    fn test_missing_sources_fail_the_build() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig {
            source_dir: dir.path().join("missing"),
            build_dir: dir.path().join("build"),
            ..Default::default()
        };
        let ctx = PipelineContext::new(config, BuildOptions { debug: true, ..Default::default() });
        let err = build_all(&ctx).unwrap_err();
        assert_eq!(err.to_string(), "build failed for 1 variants");
        assert!(dir.path().join("build").is_dir());
    }

    #[test]
    fn test_build_regular_pair() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig {
            source_dir: dir.path().join("source"),
            build_dir: dir.path().join("build"),
            ..Default::default()
        };
        std::fs::create_dir_all(&config.source_dir).unwrap();
        write_sources(&config, &config.source_dir);

        let ctx = PipelineContext::new(config, BuildOptions { debug: true, ..Default::default() });
        let written = build_all(&ctx).unwrap();
        assert_eq!(written.len(), 2);

        let jp = FontSource::load(ctx.output_path(Weight::Regular, Role::Ideographic)).unwrap();
        let latin = FontSource::load(ctx.output_path(Weight::Regular, Role::Latin)).unwrap();

        for cp in jp.live_codepoints() {
            assert!(latin.live_glyph(cp).is_none(), "{cp} is live in both outputs");
        }
        assert!(jp.live_glyph(Codepoint::new(0x41)).is_some());
        assert!(latin.live_glyph(Codepoint::new(0x41)).is_none());
        assert!(latin.live_glyph(Codepoint::new(0x48)).is_some());
        assert!(latin.live_glyph(Codepoint::new(0x78)).is_some());

        assert!(!jp.has_table(Tag::new(b"GSUB")));
        assert!(!jp.has_table(Tag::new(b"GPOS")));

        for font in [&jp, &latin] {
            let mut names: Vec<&str> = font.iter().map(|(_, glyph)| glyph.name.as_str()).collect();
            let count = names.len();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), count);

            assert_eq!(font.units_per_em(), 1000);
            for id in [name_id::FAMILY, name_id::SUBFAMILY, name_id::FULL_NAME] {
                assert!(!font.tables.names[&id].is_empty());
            }
            assert_eq!(font.tables.names[&name_id::SUBFAMILY], "Regular");
        }

        let (_, notdef) = latin.iter().next().unwrap();
        assert_eq!(notdef.name, ".notdef");
        assert!(notdef.is_worth_outputting());
        assert_eq!(notdef.advance, 500);

        let space = jp.live_glyph(Codepoint::new(0x3000)).unwrap();
        assert!(!space.outline.is_empty());
        assert_eq!(space.advance, 1000);

        // Reference heights follow the Latin source down to the output em.
        for font in [&jp, &latin] {
            let os2 = font.tables.os2.as_ref().unwrap();
            assert_eq!(os2.s_cap_height, Some(714));
            assert_eq!(os2.sx_height, Some(535));
        }
    }

    #[test]
    fn test_variant_spec_class() {
        let variant = VariantSpec { weight: Weight::Thin, modifiers: Modifiers::default() };
        assert_eq!(variant.weight_class(), 200);
    }
}
