//! Build configuration for NOTONOTO fonts.

use std::path::PathBuf;

/// Sub-path of the symbol font inside the source directory.
pub const NERD_FONT_PATH: &str = "nerd-fonts/SymbolsNerdFont-Regular.ttf";

const COPYRIGHT: &str = "[Noto]
Copyright 2022 The Noto Project Authors https://github.com/notofonts/latin-greek-cyrillic

[Nerd Fonts]
Copyright (c) 2014, Ryan L McIntyre https://ryanlmcintyre.com

[NOTONOTO]
Copyright 2024 Yuko Otawara
";

const LICENSE: &str = "This Font Software is licensed under the SIL Open Font License,
Version 1.1. This license is available with a FAQ
at: http://scripts.sil.org/OFL";

const LICENSE_URL: &str = "http://scripts.sil.org/OFL";

/// Everything a build needs to know besides the per-run flags.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub font_name: String,
    /// Prepended to every output file name.
    pub file_prefix: String,
    /// File stem of the ideographic source; the weight name is appended.
    pub jp_font: String,
    /// File stem of the Latin source.
    pub eng_font: String,
    /// File stem of the Latin source used in narrow mode.
    pub eng_font_narrow: String,
    /// Font file holding the visible ideographic-space glyph.
    pub ideographic_space: String,
    pub vendor: String,
    pub version: String,
    pub copyright: String,
    pub license: String,
    pub license_url: String,
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub em_ascent: i16,
    pub em_descent: i16,
    pub os2_ascent: u16,
    pub os2_descent: u16,
    pub half_width: u16,
    pub narrow_half_width: u16,
    pub full_width: u16,
    pub narrow_label: String,
    pub hidden_space_label: String,
    pub console_label: String,
    pub nerd_font_label: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            font_name: "NOTONOTO".to_string(),
            file_prefix: String::new(),
            jp_font: "NotoSansJP-".to_string(),
            eng_font: "NotoSansMono-".to_string(),
            eng_font_narrow: "NotoSansMono_SemiCondensed-".to_string(),
            ideographic_space: "IdeographicSpace.ttf".to_string(),
            vendor: "NTNT".to_string(),
            version: "0.1.0".to_string(),
            copyright: COPYRIGHT.to_string(),
            license: LICENSE.to_string(),
            license_url: LICENSE_URL.to_string(),
            source_dir: PathBuf::from("source"),
            build_dir: PathBuf::from("build"),
            em_ascent: 880,
            em_descent: 120,
            os2_ascent: 950,
            os2_descent: 225,
            half_width: 500,
            narrow_half_width: 600,
            full_width: 1000,
            narrow_label: "35".to_string(),
            hidden_space_label: "HS".to_string(),
            console_label: "Console".to_string(),
            nerd_font_label: "NF".to_string(),
        }
    }
}

impl BuildConfig {
    /// Em size every output font is scaled to.
    pub fn units_per_em(&self) -> u16 {
        (i32::from(self.em_ascent) + i32::from(self.em_descent)).clamp(16, 16384) as u16
    }
}

/// Feature modifiers selected for a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Use the narrow Latin source and the wider half-width grid.
    pub narrow: bool,
    /// Keep the Latin source's symbols instead of preferring wide ones.
    pub console: bool,
    /// Merge the supplemental symbol set.
    pub nerd_font: bool,
    /// Leave U+3000 blank.
    pub hidden_space: bool,
}

impl Modifiers {
    /// Variant labels in the order they appear in names.
    pub fn labels<'a>(&self, config: &'a BuildConfig) -> Vec<&'a str> {
        [
            (self.console, config.console_label.as_str()),
            (self.hidden_space, config.hidden_space_label.as_str()),
            (self.nerd_font, config.nerd_font_label.as_str()),
        ]
        .into_iter()
        .filter_map(|(active, label)| active.then_some(label))
        .collect()
    }

    /// Active variant labels joined by spaces, e.g. `"Console NF"`.
    pub fn variant(&self, config: &BuildConfig) -> String {
        self.labels(config).join(" ").trim().to_string()
    }

    /// The narrow marker when narrow mode is active.
    pub fn narrow_marker<'a>(&self, config: &'a BuildConfig) -> &'a str {
        if self.narrow { &config.narrow_label } else { "" }
    }
}
