//! `package.json` for the generated project.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{to_kebab, CodegenError};

const DEPENDENCIES: &[(&str, &str)] = &[
    ("next", "^15.5.0"),
    ("react", "^19.2.0"),
    ("react-dom", "^19.2.0"),
];

const DEV_DEPENDENCIES: &[(&str, &str)] = &[
    ("@types/node", "^22.0.0"),
    ("@types/react", "^19.2.0"),
    ("@types/react-dom", "^19.2.0"),
    ("typescript", "^5.9.0"),
];

/// Extra packages the copied section components need, on top of the
/// framework baseline. Entries here win over the baseline versions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestOptions {
    pub dependencies: BTreeMap<String, String>,
    pub dev_dependencies: BTreeMap<String, String>,
}

/// Generate package.json content. The package name is derived from the
/// draft id.
pub fn package_json(draft_id: &str, options: &ManifestOptions) -> Result<String, CodegenError> {
    let name = to_kebab(draft_id);
    if name.is_empty() {
        return Err(CodegenError::InvalidInput(format!(
            "draft id '{}' yields an empty package name",
            draft_id
        )));
    }

    let deps = with_baseline(DEPENDENCIES, &options.dependencies);
    let dev_deps = with_baseline(DEV_DEPENDENCIES, &options.dev_dependencies);

    let manifest = json!({
        "name": format!("campaign-{}", name),
        "version": "0.1.0",
        "private": true,
        "scripts": {
            "dev": "next dev",
            "build": "next build",
            "start": "next start"
        },
        "dependencies": deps,
        "devDependencies": dev_deps,
    });
    Ok(serde_json::to_string_pretty(&manifest)? + "\n")
}

fn with_baseline(
    baseline: &[(&str, &str)],
    extra: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged: BTreeMap<String, String> = baseline
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    merged.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}
