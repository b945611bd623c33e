use std::path::{Path, PathBuf};
use std::process;

use forja_pipeline::Forge;

use super::CommandContext;
use crate::{report_forge_error, OutputFormat};

/// Flags that override `[build]` and `work_dir` from the config file.
pub(crate) struct BuildOverrides {
    pub work_dir: Option<PathBuf>,
    pub package_manager: Option<String>,
    pub install: bool,
    pub timeout: Option<u64>,
}

pub(crate) async fn cmd_package(ctx: &CommandContext<'_>, draft_path: &Path, overrides: BuildOverrides) {
    let mut config = ctx.load_config();
    if let Some(dir) = overrides.work_dir {
        config.work_dir = dir;
    }
    if let Some(pm) = overrides.package_manager {
        config.build.package_manager = Some(pm);
    }
    if overrides.install {
        config.build.install = true;
    }
    if let Some(secs) = overrides.timeout {
        config.build.timeout_secs = Some(secs);
    }

    let draft = ctx.load_draft(draft_path);
    let forge = match Forge::from_config(&config) {
        Ok(f) => f,
        Err(e) => {
            report_forge_error(&e, ctx.output, ctx.quiet);
            process::exit(1);
        }
    };

    match forge.package_campaign(draft).await {
        Ok(artifact) => match ctx.output {
            OutputFormat::Text => println!("{}", artifact.url),
            OutputFormat::Json => println!(
                "{}",
                serde_json::json!({
                    "key": artifact.key,
                    "url": artifact.url,
                    "size": artifact.size,
                })
            ),
        },
        Err(e) => {
            report_forge_error(&e, ctx.output, ctx.quiet);
            process::exit(1);
        }
    }
}
