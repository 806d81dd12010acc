//! Named journal defaults that fill the journal section in one step.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named set of journal field values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalPreset {
    /// Preset name (matched case-insensitively)
    pub name: String,

    /// Journal field values keyed by schema key
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl JournalPreset {
    /// Create a preset from `(key, value)` pairs
    pub fn new<'a>(name: &str, fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            name: name.to_string(),
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &String)> + '_ {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Presets shipped with the tool
pub fn builtin_presets() -> Vec<JournalPreset> {
    vec![
        JournalPreset::new(
            "JIDS",
            [
                ("title", "Journal of Isfahan Dental School"),
                ("title_fa", "مجله دانکشده دندانپزشکی"),
                ("short_title", "JIDS"),
                ("subject", "Medical Sciences"),
                ("web_url", "http://jids.ir"),
                ("journal_id_issn", "1735-255X"),
                ("language", "fa"),
            ],
        ),
        JournalPreset::new(
            "JZMS",
            [
                ("title", "Journal of Zabol Medical school"),
                ("title_fa", "مجمله دانشگاه زابل"),
                ("short_title", "ZJMS"),
                ("subject", "Engineering"),
                ("web_url", "http://jzms.ir"),
                ("journal_id_issn", "2645-880X"),
                ("journal_id_issn_online", "2645-7180"),
                ("language", "en"),
                ("volume", "20"),
                ("number", "2"),
            ],
        ),
    ]
}

/// Built-in presets merged with configured ones.
///
/// A configured preset replaces a built-in preset of the same name.
#[derive(Debug, Clone)]
pub struct PresetRegistry {
    presets: Vec<JournalPreset>,
}

impl PresetRegistry {
    /// Registry with only the built-in presets
    pub fn new() -> Self {
        Self {
            presets: builtin_presets(),
        }
    }

    /// Registry with configured presets layered over the built-ins
    pub fn with_configured(configured: &[JournalPreset]) -> Self {
        let mut registry = Self::new();
        for preset in configured {
            registry.insert(preset.clone());
        }
        registry
    }

    /// Add or replace a preset
    pub fn insert(&mut self, preset: JournalPreset) {
        match self
            .presets
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(&preset.name))
        {
            Some(existing) => *existing = preset,
            None => self.presets.push(preset),
        }
    }

    /// Look up a preset by name, ignoring case
    pub fn get(&self, name: &str) -> Option<&JournalPreset> {
        self.presets
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &JournalPreset> {
        self.presets.iter()
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::new()
    }
}
