//! Forge configuration (`forja.toml`).
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. Relative paths are resolved against the directory the
//! config file lives in.
//!
//! # Example
//!
//! ```toml
//! source_root = "src"
//! fragments_dir = "themes"
//! work_dir = ".forja/builds"
//! base_fragment = "global"
//! extra_entries = ["@/lib/analytics"]
//!
//! [build]
//! package_manager = "pnpm"
//! script = "build"
//! install = false
//! timeout_secs = 600
//!
//! [manifest.dependencies]
//! framer-motion = "^11.0.0"
//!
//! [storage]
//! kind = "http"
//! url = "https://uploads.example.com/campaigns"
//! public_url = "https://cdn.example.com/campaigns"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use forja_codegen::ManifestOptions;
use forja_core::{DEFAULT_ALIAS, DEFAULT_BASE_FRAGMENT};
use forja_storage::{ArtifactStore, HttpArtifactStore, LocalArtifactStore};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::process::PackageManager;

/// Name of the config file looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = "forja.toml";

pub const ENV_WORK_DIR: &str = "FORJA_WORK_DIR";
pub const ENV_STORE_URL: &str = "FORJA_STORE_URL";
pub const ENV_STORE_TOKEN: &str = "FORJA_STORE_TOKEN";
pub const ENV_PACKAGE_MANAGER: &str = "FORJA_PACKAGE_MANAGER";

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForgeConfig {
    /// Host source tree the import alias maps to.
    pub source_root: PathBuf,
    /// Directory holding the `base/`, `colors/`, `fonts/`, `radii/` buckets.
    pub fragments_dir: PathBuf,
    /// Parent of the per-draft build directories. Keep it inside the host
    /// project so the build tool finds the host's installed packages.
    pub work_dir: PathBuf,
    pub base_fragment: String,
    pub alias: String,
    /// Aliased modules copied into every project in addition to sections.
    pub extra_entries: Vec<String>,
    pub manifest: ManifestOptions,
    pub build: BuildSettings,
    pub storage: StorageSettings,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        ForgeConfig {
            source_root: PathBuf::from("src"),
            fragments_dir: PathBuf::from("themes"),
            work_dir: PathBuf::from(".forja/builds"),
            base_fragment: DEFAULT_BASE_FRAGMENT.to_string(),
            alias: DEFAULT_ALIAS.to_string(),
            extra_entries: Vec::new(),
            manifest: ManifestOptions::default(),
            build: BuildSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

/// `[build]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildSettings {
    /// `npm`, `pnpm`, `yarn`, or `bun`. Detected from the environment when
    /// unset.
    pub package_manager: Option<String>,
    pub script: String,
    /// Run `<pm> install` in the generated project before building.
    pub install: bool,
    pub timeout_secs: Option<u64>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        BuildSettings {
            package_manager: None,
            script: "build".to_string(),
            install: false,
            timeout_secs: None,
        }
    }
}

impl BuildSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// The configured package manager, or the one the host is running under.
    pub fn package_manager(&self) -> Result<PackageManager, ConfigError> {
        match &self.package_manager {
            Some(name) => name.parse().map_err(ConfigError::Invalid),
            None => Ok(PackageManager::detect()),
        }
    }
}

/// `[storage]` section: where finished archives are uploaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StorageSettings {
    Local {
        dir: PathBuf,
        #[serde(default)]
        public_url: Option<String>,
    },
    Http {
        url: String,
        #[serde(default)]
        public_url: Option<String>,
        #[serde(default)]
        token: Option<String>,
    },
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings::Local {
            dir: PathBuf::from(".forja/artifacts"),
            public_url: None,
        }
    }
}

impl StorageSettings {
    pub fn build_store(&self) -> Arc<dyn ArtifactStore> {
        match self {
            StorageSettings::Local { dir, public_url } => {
                Arc::new(LocalArtifactStore::new(dir, public_url.as_deref()))
            }
            StorageSettings::Http {
                url,
                public_url,
                token,
            } => Arc::new(HttpArtifactStore::new(
                url,
                public_url.as_deref(),
                token.as_deref(),
            )),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl ForgeConfig {
    /// Parse a config document. Paths are left as written.
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Read a config file and resolve its relative paths against the file's
    /// directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&text, path)?;
        if let Some(dir) = path.parent() {
            config.resolve_relative(dir);
        }
        Ok(config)
    }

    /// `path` if given, else `./forja.toml` if it exists, else defaults.
    /// Environment overrides are applied last.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::load(p)?,
            None => {
                let default = Path::new(CONFIG_FILE_NAME);
                if default.is_file() {
                    Self::load(default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `FORJA_*` overrides using `lookup` to read variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(ENV_WORK_DIR) {
            self.work_dir = PathBuf::from(dir);
        }
        if let Some(pm) = lookup(ENV_PACKAGE_MANAGER) {
            self.build.package_manager = Some(pm);
        }
        let token = lookup(ENV_STORE_TOKEN);
        if let Some(url) = lookup(ENV_STORE_URL) {
            let (public_url, existing_token) = match &self.storage {
                StorageSettings::Http {
                    public_url, token, ..
                } => (public_url.clone(), token.clone()),
                StorageSettings::Local { .. } => (None, None),
            };
            self.storage = StorageSettings::Http {
                url,
                public_url,
                token: token.or(existing_token),
            };
        } else if let (Some(new_token), StorageSettings::Http { token, .. }) =
            (token, &mut self.storage)
        {
            *token = Some(new_token);
        }
    }

    /// Make every relative path absolute with respect to `base`.
    pub fn resolve_relative(&mut self, base: &Path) {
        for path in [
            &mut self.source_root,
            &mut self.fragments_dir,
            &mut self.work_dir,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        if let StorageSettings::Local { dir, .. } = &mut self.storage {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }
}
