//! Weight definitions for font generation.

use std::{convert::Infallible, fmt, str::FromStr};

/// A font weight produced by the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weight {
    Thin,
    ExtraLight,
    Light,
    Regular,
    Medium,
    SemiBold,
    Bold,
    ExtraBold,
    Black,
}

/// Weight name and OS/2 weight class (usWeightClass).
const WEIGHT_TABLE: &[(Weight, &str, u16)] = &[
    (Weight::Thin, "Thin", 200),
    (Weight::ExtraLight, "ExtraLight", 250),
    (Weight::Light, "Light", 300),
    (Weight::Regular, "Regular", 400),
    (Weight::Medium, "Medium", 500),
    (Weight::SemiBold, "SemiBold", 600),
    (Weight::Bold, "Bold", 700),
    (Weight::ExtraBold, "ExtraBold", 800),
    (Weight::Black, "Black", 900),
];

/// Build order: Regular first, so a debug build stops after one variant.
pub const BUILD_WEIGHTS: &[Weight] = &[
    Weight::Regular,
    Weight::Thin,
    Weight::ExtraLight,
    Weight::Light,
    Weight::Medium,
    Weight::SemiBold,
    Weight::Bold,
    Weight::ExtraBold,
    Weight::Black,
];

impl Weight {
    fn entry(self) -> &'static (Weight, &'static str, u16) {
        WEIGHT_TABLE.iter().find(|(w, _, _)| *w == self).unwrap_or(&WEIGHT_TABLE[3])
    }

    pub fn name(self) -> &'static str {
        self.entry().1
    }

    pub fn class(self) -> u16 {
        self.entry().2
    }

    /// Regular and Bold are named as styles of the base family; every other
    /// weight gets a family of its own.
    pub const fn is_ribbi(self) -> bool {
        matches!(self, Weight::Regular | Weight::Bold)
    }

    pub const fn is_bold(self) -> bool {
        matches!(self, Weight::Bold)
    }
}

impl FromStr for Weight {
    type Err = Infallible;

    /// Unrecognized names fall back to Regular.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(WEIGHT_TABLE
            .iter()
            .find(|(_, name, _)| *name == s)
            .map(|(weight, _, _)| *weight)
            .unwrap_or(Weight::Regular))
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
