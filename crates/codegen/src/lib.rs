//! forja-codegen: source, config, and data generators for the campaign
//! web project.
//!
//! Every generator is a pure function from the draft, the assembled theme,
//! and the set of section types in use to the text of one file. Writing the
//! files is left to the caller. The generated project is a statically
//! exported Next.js application whose `@/` alias maps to `./src`.

pub mod app;
pub mod config;
pub mod data;
pub mod manifest;
pub mod sections;
pub mod stylesheet;

use std::fmt;

use forja_core::{AssembledTheme, CampaignDraft};

pub use manifest::ManifestOptions;
pub use sections::{section_specifier, SectionPlan};

/// Paths of generated files, relative to the project root.
pub mod paths {
    pub const PACKAGE_JSON: &str = "package.json";
    pub const NEXT_CONFIG: &str = "next.config.mjs";
    pub const TSCONFIG: &str = "tsconfig.json";
    pub const GLOBALS_CSS: &str = "src/app/globals.css";
    pub const ROOT_LAYOUT: &str = "src/app/layout.tsx";
    pub const ROOT_PAGE: &str = "src/app/page.tsx";
    pub const LOCALE_PAGE: &str = "src/app/[locale]/page.tsx";
    pub const SECTION_RENDERER: &str = "src/components/forja/SectionRenderer.tsx";
    pub const CONTENT_JSON: &str = "src/data/content.json";
    pub const THEME_JSON: &str = "src/data/theme.json";
    pub const CAMPAIGN_JSON: &str = "src/data/campaign.json";
    /// Directory the `@/` alias points at.
    pub const SOURCE_DIR: &str = "src";
    /// Where `next build` writes the static export.
    pub const BUILD_OUTPUT_DIR: &str = "out";
}

/// Error type for code generation operations.
#[derive(Debug, Clone)]
pub enum CodegenError {
    /// The draft or theme holds a value that cannot be emitted safely.
    InvalidInput(String),
    /// Serializing generated data failed.
    EmitError(String),
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodegenError::InvalidInput(msg) => write!(f, "invalid generator input: {}", msg),
            CodegenError::EmitError(msg) => write!(f, "emit error: {}", msg),
        }
    }
}

impl std::error::Error for CodegenError {}

impl From<serde_json::Error> for CodegenError {
    fn from(e: serde_json::Error) -> Self {
        CodegenError::EmitError(e.to_string())
    }
}

/// One generated file: project-relative path plus contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: &'static str,
    pub content: String,
}

impl GeneratedFile {
    fn new(path: &'static str, content: String) -> Self {
        GeneratedFile { path, content }
    }
}

/// Everything the generators read.
#[derive(Debug, Clone, Copy)]
pub struct ProjectInput<'a> {
    pub draft: &'a CampaignDraft,
    pub theme: &'a AssembledTheme,
    /// Distinct section types in use, in first-appearance order. Layout
    /// entries not listed here are skipped when rendering.
    pub sections: &'a [String],
    pub manifest: &'a ManifestOptions,
}

/// Package manifest, build-tool config, and TypeScript config.
pub fn config_files(input: &ProjectInput<'_>) -> Result<Vec<GeneratedFile>, CodegenError> {
    Ok(vec![
        GeneratedFile::new(
            paths::PACKAGE_JSON,
            manifest::package_json(&input.draft.id, input.manifest)?,
        ),
        GeneratedFile::new(paths::NEXT_CONFIG, config::next_config()),
        GeneratedFile::new(paths::TSCONFIG, config::tsconfig_json()),
    ])
}

/// Stylesheet, root layout, and serialized content/theme/campaign data.
pub fn presentation_files(input: &ProjectInput<'_>) -> Result<Vec<GeneratedFile>, CodegenError> {
    Ok(vec![
        GeneratedFile::new(paths::GLOBALS_CSS, stylesheet::globals_css(input.theme)?),
        GeneratedFile::new(paths::ROOT_LAYOUT, app::root_layout()),
        GeneratedFile::new(paths::CONTENT_JSON, data::content_json(input.draft)?),
        GeneratedFile::new(paths::THEME_JSON, data::theme_json(input.theme)?),
        GeneratedFile::new(paths::CAMPAIGN_JSON, data::campaign_json(input.draft)?),
    ])
}

/// Section renderer and page entrypoints.
pub fn entrypoint_files(input: &ProjectInput<'_>) -> Result<Vec<GeneratedFile>, CodegenError> {
    let plan = SectionPlan::new(&input.draft.layout_names(), input.sections);
    Ok(vec![
        GeneratedFile::new(paths::SECTION_RENDERER, plan.emit()),
        GeneratedFile::new(paths::ROOT_PAGE, app::root_page()),
        GeneratedFile::new(paths::LOCALE_PAGE, app::locale_page()),
    ])
}

/// Convert an identifier such as `Spring_Sale 2025` to `spring-sale-2025`.
pub(crate) fn to_kebab(s: &str) -> String {
    let mut out = String::new();
    let mut prev_dash = true;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            prev_dash = false;
        } else if !prev_dash {
            out.push('-');
            prev_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kebab_case() {
        assert_eq!(to_kebab("Spring_Sale 2025"), "spring-sale-2025");
        assert_eq!(to_kebab("--x--"), "x");
        assert_eq!(to_kebab("abc"), "abc");
    }
}
