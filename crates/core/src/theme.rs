//! Theme assembly.
//!
//! A theme is built from reusable fragments stored in category buckets
//! (`base/`, `colors/`, `fonts/`, `radii/`). Fragments are deep-merged in a
//! fixed order, the draft's explicit overrides are applied last, and the
//! result is validated against the embedded theme schema. Either a complete,
//! schema-valid theme comes out or an error does; there is no partial theme.

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::draft::{is_path_safe, ThemeConfig};
use crate::error::ThemeError;

/// Embedded JSON Schema every assembled theme must satisfy.
pub const THEME_SCHEMA_STR: &str = include_str!("../schema/theme.schema.json");

/// Default name of the fragment in `base/` that every theme starts from.
pub const DEFAULT_BASE_FRAGMENT: &str = "global";

/// The bucket a fragment lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentCategory {
    Base,
    Colors,
    Fonts,
    Radii,
}

impl FragmentCategory {
    pub fn dir_name(self) -> &'static str {
        match self {
            FragmentCategory::Base => "base",
            FragmentCategory::Colors => "colors",
            FragmentCategory::Fonts => "fonts",
            FragmentCategory::Radii => "radii",
        }
    }
}

impl fmt::Display for FragmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Loads individually named fragment files from a fragments directory.
#[derive(Debug, Clone)]
pub struct FragmentStore {
    root: PathBuf,
}

impl FragmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FragmentStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `<root>/<category>/<name>.json`.
    pub fn fragment_path(&self, category: FragmentCategory, name: &str) -> PathBuf {
        self.root
            .join(category.dir_name())
            .join(format!("{}.json", name))
    }

    /// Load one fragment. The fragment must be a JSON object.
    pub async fn load(&self, category: FragmentCategory, name: &str) -> Result<Value, ThemeError> {
        if !is_path_safe(name) {
            return Err(ThemeError::InvalidName {
                category: category.to_string(),
                name: name.to_string(),
            });
        }
        let path = self.fragment_path(category, name);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ThemeError::FragmentNotFound {
                    category: category.to_string(),
                    name: name.to_string(),
                    path,
                });
            }
            Err(source) => return Err(ThemeError::Io { path, source }),
        };

        let value: Value = serde_json::from_str(&text).map_err(|e| ThemeError::Malformed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        if !value.is_object() {
            return Err(ThemeError::Malformed {
                path,
                message: "fragment must be a JSON object".to_string(),
            });
        }
        Ok(value)
    }
}

/// Merge `layer` into `target`.
///
/// Two objects merge key by key, recursively. In every other case the layer
/// value replaces the target value outright; arrays are never concatenated.
pub fn deep_merge(target: &mut Value, layer: Value) {
    match (target, layer) {
        (Value::Object(into), Value::Object(from)) => {
            for (key, value) in from {
                match into.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        into.insert(key, value);
                    }
                }
            }
        }
        (target, layer) => *target = layer,
    }
}

/// Fold layers left to right over an empty object. `null` layers are absent
/// layers and contribute nothing.
pub fn merge_layers(layers: impl IntoIterator<Item = Value>) -> Value {
    let mut merged = Value::Object(Map::new());
    for layer in layers {
        if !layer.is_null() {
            deep_merge(&mut merged, layer);
        }
    }
    merged
}

/// A merged theme that has passed schema validation.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledTheme(Value);

impl AssembledTheme {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// A top-level token group such as `colors`, if present.
    pub fn group(&self, name: &str) -> Option<&Map<String, Value>> {
        self.0.get(name).and_then(Value::as_object)
    }
}

/// Loads, merges, and validates themes.
pub struct ThemeAssembler {
    store: FragmentStore,
    base_fragment: String,
    validator: jsonschema::Validator,
}

impl ThemeAssembler {
    pub fn new(store: FragmentStore, base_fragment: impl Into<String>) -> Result<Self, ThemeError> {
        let schema: Value =
            serde_json::from_str(THEME_SCHEMA_STR).map_err(|e| ThemeError::Schema {
                path: "(schema)".to_string(),
                message: format!("embedded theme schema is not valid JSON: {}", e),
            })?;
        let validator = jsonschema::validator_for(&schema).map_err(|e| ThemeError::Schema {
            path: "(schema)".to_string(),
            message: format!("failed to compile theme schema: {}", e),
        })?;
        Ok(ThemeAssembler {
            store,
            base_fragment: base_fragment.into(),
            validator,
        })
    }

    /// Assemble the theme a draft asks for.
    ///
    /// Order: base, colors preset, fonts preset, radii preset, overrides.
    pub async fn assemble(&self, config: &ThemeConfig) -> Result<AssembledTheme, ThemeError> {
        let mut layers = Vec::with_capacity(5);
        layers.push(
            self.store
                .load(FragmentCategory::Base, &self.base_fragment)
                .await?,
        );
        for (category, preset) in [
            (FragmentCategory::Colors, &config.colors),
            (FragmentCategory::Fonts, &config.fonts),
            (FragmentCategory::Radii, &config.radii),
        ] {
            let layer = match preset {
                Some(name) => self.store.load(category, name).await?,
                None => Value::Object(Map::new()),
            };
            layers.push(layer);
        }
        layers.push(config.overrides.clone());

        let merged = merge_layers(layers);
        self.validate(&merged)?;
        tracing::debug!(base = %self.base_fragment, "theme assembled");
        Ok(AssembledTheme(merged))
    }

    /// Validate an already merged theme document and wrap it.
    pub fn from_value(&self, value: Value) -> Result<AssembledTheme, ThemeError> {
        self.validate(&value)?;
        Ok(AssembledTheme(value))
    }

    /// Validate a merged theme, reporting the first failing field path.
    pub fn validate(&self, theme: &Value) -> Result<(), ThemeError> {
        match self.validator.iter_errors(theme).next() {
            None => Ok(()),
            Some(error) => Err(ThemeError::Schema {
                path: pointer_to_field_path(&error.instance_path().to_string()),
                message: error.to_string(),
            }),
        }
    }
}

/// `/fonts/body/family/0` → `fonts.body.family[0]`; the empty pointer is `$`.
fn pointer_to_field_path(pointer: &str) -> String {
    let mut out = String::new();
    for segment in pointer.split('/').filter(|s| !s.is_empty()) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        if segment.chars().all(|c| c.is_ascii_digit()) {
            out.push_str(&format!("[{}]", segment));
        } else {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(&segment);
        }
    }
    if out.is_empty() {
        "$".to_string()
    } else {
        out
    }
}
