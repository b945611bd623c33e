//! Serialized content, theme, and campaign metadata.

use forja_core::{AssembledTheme, CampaignDraft};
use serde_json::json;

use crate::CodegenError;

/// Generate src/data/content.json: section content key → locale → data.
pub fn content_json(draft: &CampaignDraft) -> Result<String, CodegenError> {
    Ok(serde_json::to_string_pretty(&draft.content)? + "\n")
}

/// Generate src/data/theme.json: the assembled theme, verbatim.
pub fn theme_json(theme: &AssembledTheme) -> Result<String, CodegenError> {
    Ok(serde_json::to_string_pretty(theme.as_value())? + "\n")
}

/// Generate src/data/campaign.json: metadata read by the layout and pages.
pub fn campaign_json(draft: &CampaignDraft) -> Result<String, CodegenError> {
    let meta = &draft.metadata;
    let value = json!({
        "id": draft.id,
        "name": meta.name,
        "description": meta.description,
        "defaultLocale": meta.default_locale,
        "locales": meta.locales,
        "layout": draft.layout_names(),
    });
    Ok(serde_json::to_string_pretty(&value)? + "\n")
}
