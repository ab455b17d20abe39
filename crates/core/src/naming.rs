//! Family, style and file naming for each output variant.

use std::collections::BTreeMap;

use font_source::name_id;

use crate::{
    config::{BuildConfig, Modifiers},
    styles::Weight,
};

/// Which source of the output pair a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Latin,
    Ideographic,
}

impl Role {
    pub const fn suffix(self) -> &'static str {
        match self {
            Role::Latin => "eng",
            Role::Ideographic => "jp",
        }
    }
}

/// Names for one (weight, modifier set) variant.
#[derive(Debug, Clone)]
pub struct FontNaming {
    /// Base family, e.g. `NOTONOTO35 Console NF`.
    pub family: String,
    pub weight: Weight,
}

impl FontNaming {
    pub fn new(config: &BuildConfig, modifiers: Modifiers, weight: Weight) -> Self {
        let mut family = format!("{}{}", config.font_name, modifiers.narrow_marker(config));
        let variant = modifiers.variant(config);
        if !variant.is_empty() {
            family.push(' ');
            family.push_str(&variant);
        }
        Self { family: family.trim().to_string(), weight }
    }

    /// Legacy family name (name ID 1).
    pub fn family_name(&self) -> String {
        if self.weight.is_ribbi() {
            self.family.clone()
        } else {
            format!("{} {}", self.family, self.weight)
        }
    }

    /// Legacy subfamily name (name ID 2).
    pub fn subfamily_name(&self) -> &'static str {
        if self.weight.is_ribbi() { self.weight.name() } else { "Regular" }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.family, self.weight)
    }

    pub fn postscript_name(&self) -> String {
        format!("{}-{}", self.family, self.weight).replace(' ', "")
    }

    pub fn unique_id(&self, config: &BuildConfig) -> String {
        format!("{};{};{}", config.version, config.vendor.trim(), self.postscript_name())
    }

    /// The complete name table for the variant, keyed by name ID.
    pub fn records(&self, config: &BuildConfig) -> BTreeMap<u16, String> {
        let mut names = BTreeMap::from([
            (name_id::COPYRIGHT, config.copyright.clone()),
            (name_id::FAMILY, self.family_name()),
            (name_id::SUBFAMILY, self.subfamily_name().to_string()),
            (name_id::UNIQUE_ID, self.unique_id(config)),
            (name_id::FULL_NAME, self.full_name()),
            (name_id::VERSION, format!("Version {}", config.version)),
            (name_id::POSTSCRIPT_NAME, self.postscript_name()),
            (name_id::LICENSE, config.license.clone()),
            (name_id::LICENSE_URL, config.license_url.clone()),
        ]);
        if !self.weight.is_ribbi() {
            names.insert(name_id::TYPOGRAPHIC_FAMILY, self.family.clone());
            names.insert(name_id::TYPOGRAPHIC_SUBFAMILY, self.weight.name().to_string());
        }
        names
    }
}

/// `{prefix}{font}{narrow}{variant}-{weight}-{role}.ttf` with spaces removed.
pub fn output_file_name(
    config: &BuildConfig,
    modifiers: Modifiers,
    weight: Weight,
    role: Role,
) -> String {
    format!(
        "{}{}{}{}-{}-{}.ttf",
        config.file_prefix,
        config.font_name,
        modifiers.narrow_marker(config),
        modifiers.variant(config),
        weight,
        role.suffix()
    )
    .replace(' ', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naming(weight: Weight, modifiers: Modifiers) -> FontNaming {
        FontNaming::new(&BuildConfig::default(), modifiers, weight)
    }

    #[test]
    fn test_bold_is_a_style_of_the_family() {
        let naming = naming(Weight::Bold, Modifiers::default());
        assert_eq!(naming.family_name(), "NOTONOTO");
        assert!(!naming.family_name().contains("Bold"));
        assert_eq!(naming.subfamily_name(), "Bold");
        assert_eq!(naming.full_name(), "NOTONOTO Bold");
        assert_eq!(naming.postscript_name(), "NOTONOTO-Bold");

        let records = naming.records(&BuildConfig::default());
        assert!(!records.contains_key(&name_id::TYPOGRAPHIC_FAMILY));
    }

    #[test]
    fn test_medium_gets_its_own_family() {
        let naming = naming(Weight::Medium, Modifiers::default());
        assert_eq!(naming.family_name(), "NOTONOTO Medium");
        assert_eq!(naming.subfamily_name(), "Regular");

        let records = naming.records(&BuildConfig::default());
        assert_eq!(records[&name_id::TYPOGRAPHIC_FAMILY], "NOTONOTO");
        assert_eq!(records[&name_id::TYPOGRAPHIC_SUBFAMILY], "Medium");
    }

    #[test]
    fn test_variant_names() {
        let modifiers = Modifiers { narrow: true, console: true, ..Default::default() };
        let naming = naming(Weight::Regular, modifiers);
        assert_eq!(naming.family, "NOTONOTO35 Console");
        assert_eq!(naming.postscript_name(), "NOTONOTO35Console-Regular");
        assert_eq!(
            naming.unique_id(&BuildConfig::default()),
            "0.1.0;NTNT;NOTONOTO35Console-Regular"
        );
    }

    #[test]
    fn test_output_file_name() {
        let config = BuildConfig { font_name: "Example Mono".to_string(), ..Default::default() };
        let modifiers = Modifiers { console: true, nerd_font: true, ..Default::default() };
        assert_eq!(
            output_file_name(&config, modifiers, Weight::Bold, Role::Latin),
            "ExampleMonoConsoleNF-Bold-eng.ttf"
        );
        assert_eq!(
            output_file_name(&config, Modifiers::default(), Weight::Thin, Role::Ideographic),
            "ExampleMono-Thin-jp.ttf"
        );
    }
}
