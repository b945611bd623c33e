//! Campaign draft model.
//!
//! A draft is the immutable, user-authored description of one campaign
//! variant: which sections appear in which order, which theme presets to
//! apply, and the per-section, per-locale content those sections render.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::DraftError;

/// One campaign variant as authored in the wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDraft {
    pub id: String,
    #[serde(default)]
    pub layout: Vec<LayoutSection>,
    #[serde(default)]
    pub theme: ThemeConfig,
    /// Content keyed by section content key, then by locale.
    #[serde(default)]
    pub content: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
    pub metadata: CampaignMetadata,
}

/// A single entry of the page layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSection {
    /// Section type name, e.g. `Hero` or `FeaturesSection`.
    pub name: String,
}

/// Theme selection: preset references plus a free-form override tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fonts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radii: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub overrides: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub default_locale: String,
    pub locales: Vec<String>,
}

impl CampaignDraft {
    /// Parse a draft from JSON text. Does not validate.
    pub fn from_json(src: &str) -> Result<Self, DraftError> {
        serde_json::from_str(src).map_err(|e| DraftError::new("$", e.to_string()))
    }

    /// Check the draft's structural invariants.
    ///
    /// Section names are only checked for syntax here: a well-formed name
    /// that matches no known section type is skipped later at render time.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.id.is_empty() {
            return Err(DraftError::new("id", "must not be empty"));
        }
        if !is_path_safe(&self.id) {
            return Err(DraftError::new("id", unsafe_name_message(&self.id)));
        }

        for (i, section) in self.layout.iter().enumerate() {
            if !is_section_name(&section.name) {
                return Err(DraftError::new(
                    format!("layout[{}].name", i),
                    format!("'{}' is not a PascalCase identifier", section.name),
                ));
            }
        }

        for (field, preset) in [
            ("theme.colors", &self.theme.colors),
            ("theme.fonts", &self.theme.fonts),
            ("theme.radii", &self.theme.radii),
        ] {
            if let Some(name) = preset {
                if !is_path_safe(name) {
                    return Err(DraftError::new(field, unsafe_name_message(name)));
                }
            }
        }

        if !self.theme.overrides.is_null() && !self.theme.overrides.is_object() {
            return Err(DraftError::new("theme.overrides", "must be an object"));
        }

        let meta = &self.metadata;
        if meta.name.trim().is_empty() {
            return Err(DraftError::new("metadata.name", "must not be empty"));
        }
        if meta.locales.is_empty() {
            return Err(DraftError::new(
                "metadata.locales",
                "at least one locale is required",
            ));
        }
        if !meta.locales.contains(&meta.default_locale) {
            return Err(DraftError::new(
                "metadata.defaultLocale",
                format!("'{}' is not listed in locales", meta.default_locale),
            ));
        }

        Ok(())
    }

    /// Distinct section names in first-appearance order.
    pub fn distinct_sections(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.layout
            .iter()
            .map(|s| s.name.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Layout section names in their original order, duplicates included.
    pub fn layout_names(&self) -> Vec<&str> {
        self.layout.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Non-empty and limited to ASCII letters, digits, `-` and `_`, so the name
/// can be used as a single path component.
pub fn is_path_safe(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn unsafe_name_message(name: &str) -> String {
    format!(
        "'{}' may only contain ASCII letters, digits, '-' and '_'",
        name
    )
}

/// `Hero`, `FeaturesSection`, `Faq2`: an uppercase ASCII letter followed by
/// ASCII alphanumerics.
fn is_section_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => chars.all(|c| c.is_ascii_alphanumeric()),
        _ => false,
    }
}

/// Key under which a section's content lives: the type name with its first
/// character lower-cased (`FeaturesSection` → `featuresSection`).
pub fn content_key(section_name: &str) -> String {
    let mut chars = section_name.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_lowercase().collect::<String>() + chars.as_str(),
    }
}
