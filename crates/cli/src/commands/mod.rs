//! Subcommand implementations. Each reports its own errors and exits with
//! status 1 on failure.

pub(crate) mod generate;
pub(crate) mod package;
pub(crate) mod theme;

use std::path::Path;
use std::process;

use forja_core::CampaignDraft;
use forja_pipeline::ForgeConfig;

use crate::{report_error, OutputFormat};

/// Global options every subcommand sees.
pub(crate) struct CommandContext<'a> {
    pub config_path: Option<&'a Path>,
    pub output: OutputFormat,
    pub quiet: bool,
}

impl CommandContext<'_> {
    /// Report `msg` and exit with status 1.
    pub(crate) fn fail(&self, msg: &str) -> ! {
        report_error(msg, self.output, self.quiet);
        process::exit(1);
    }

    pub(crate) fn load_config(&self) -> ForgeConfig {
        match ForgeConfig::discover(self.config_path) {
            Ok(config) => config,
            Err(e) => self.fail(&e.to_string()),
        }
    }

    /// Read and parse a draft file. Validation happens in the forge.
    pub(crate) fn load_draft(&self, path: &Path) -> CampaignDraft {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => self.fail(&format!("error reading file '{}': {}", path.display(), e)),
        };
        match CampaignDraft::from_json(&text) {
            Ok(draft) => draft,
            Err(e) => self.fail(&format!("error parsing draft '{}': {}", path.display(), e)),
        }
    }
}
