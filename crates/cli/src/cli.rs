//! CLI definitions.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;

use notonoto_core::{BuildConfig, BuildOptions, Modifiers, PipelineContext, build_all};

#[derive(Parser, Debug)]
#[command(name = "notonoto")]
#[command(about = "Build NOTONOTO fonts from Noto Sans JP and Noto Sans Mono sources")]
pub struct Cli {
    /// Use the semi-condensed Latin source and a 3:5 width ratio
    #[arg(long = "35")]
    pub narrow: bool,

    /// Keep the Latin source's symbols and box drawing
    #[arg(long)]
    pub console: bool,

    /// Merge Nerd Fonts symbols
    #[arg(long)]
    pub nerd_font: bool,

    /// Leave the ideographic space blank
    #[arg(long)]
    pub hidden_zenkaku_space: bool,

    /// Build the Regular weight only
    #[arg(long)]
    pub debug: bool,

    #[arg(long)]
    pub do_not_delete_build_dir: bool,

    #[arg(long, default_value = "source")]
    pub source_dir: PathBuf,

    #[arg(long, default_value = "build")]
    pub build_dir: PathBuf,

    /// Version written to the name table
    #[arg(short, long)]
    pub version: Option<String>,

    /// Build weights in parallel on this many threads
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

impl Cli {
    pub fn modifiers(&self) -> Modifiers {
        Modifiers {
            narrow: self.narrow,
            console: self.console,
            nerd_font: self.nerd_font,
            hidden_space: self.hidden_zenkaku_space,
        }
    }

    pub fn config(&self) -> BuildConfig {
        let defaults = BuildConfig::default();
        BuildConfig {
            source_dir: self.source_dir.clone(),
            build_dir: self.build_dir.clone(),
            version: self.version.clone().unwrap_or(defaults.version.clone()),
            ..defaults
        }
    }

    pub fn options(&self) -> BuildOptions {
        BuildOptions {
            modifiers: self.modifiers(),
            debug: self.debug,
            keep_build_dir: self.do_not_delete_build_dir,
            jobs: self.jobs,
        }
    }

    pub fn run(self) -> Result<()> {
        let ctx = PipelineContext::new(self.config(), self.options());
        let written = build_all(&ctx)?;
        for path in &written {
            info!("Wrote {}", path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["notonoto"]).unwrap();
        assert_eq!(cli.modifiers(), Modifiers::default());
        let config = cli.config();
        assert_eq!(config.source_dir, PathBuf::from("source"));
        assert_eq!(config.version, BuildConfig::default().version);
        assert!(!cli.options().keep_build_dir);
        assert_eq!(cli.options().jobs, None);
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::try_parse_from([
            "notonoto",
            "--35",
            "--console",
            "--nerd-font",
            "--hidden-zenkaku-space",
            "--debug",
            "--do-not-delete-build-dir",
            "--build-dir",
            "out",
            "--version",
            "1.2.0",
            "--jobs",
            "4",
        ])
        .unwrap();

        let modifiers = cli.modifiers();
        assert!(modifiers.narrow && modifiers.console && modifiers.nerd_font && modifiers.hidden_space);
        let options = cli.options();
        assert!(options.debug);
        assert!(options.keep_build_dir);
        assert_eq!(options.jobs, Some(4));
        let config = cli.config();
        assert_eq!(config.build_dir, PathBuf::from("out"));
        assert_eq!(config.version, "1.2.0");
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["notonoto", "--wide"]).is_err());
    }
}
