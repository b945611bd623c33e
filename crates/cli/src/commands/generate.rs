use std::path::Path;
use std::process;

use forja_pipeline::Forge;

use super::CommandContext;
use crate::{report_forge_error, OutputFormat};

pub(crate) async fn cmd_generate(ctx: &CommandContext<'_>, draft_path: &Path, out_dir: &Path) {
    let config = ctx.load_config();
    let draft = ctx.load_draft(draft_path);

    let result = match Forge::from_config(&config) {
        Ok(forge) => forge.generate(draft, out_dir).await,
        Err(e) => Err(e),
    };
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            report_forge_error(&e, ctx.output, ctx.quiet);
            process::exit(1);
        }
    };

    match ctx.output {
        OutputFormat::Text => {
            if !ctx.quiet {
                println!(
                    "Generated project in {} ({} modules copied, {} warnings)",
                    out_dir.display(),
                    report.copied.len(),
                    report.warning_count()
                );
                for unresolved in &report.unresolved {
                    println!(
                        "  unresolved: {} (imported by {})",
                        unresolved.specifier,
                        unresolved.importer.display()
                    );
                }
            }
        }
        OutputFormat::Json => {
            let copied: Vec<String> = report
                .copied
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
            let unresolved: Vec<_> = report
                .unresolved
                .iter()
                .map(|u| {
                    serde_json::json!({
                        "specifier": u.specifier,
                        "importer": u.importer.to_string_lossy(),
                    })
                })
                .collect();
            let parse_failures: Vec<_> = report
                .parse_failures
                .iter()
                .map(|f| {
                    serde_json::json!({
                        "path": f.path.to_string_lossy(),
                        "line": f.error.line,
                        "message": f.error.message,
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::json!({
                    "out": out_dir.to_string_lossy(),
                    "copied": copied,
                    "unresolved": unresolved,
                    "parse_failures": parse_failures,
                })
            );
        }
    }
}
