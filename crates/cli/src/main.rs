mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use forja_pipeline::ForgeError;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Campaign landing-page build pipeline.
#[derive(Parser)]
#[command(name = "forja", version, about = "Campaign landing-page build pipeline")]
struct Cli {
    /// Path to forja.toml (default: ./forja.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a draft into a static site archive and upload it
    Package {
        /// Path to the campaign draft JSON file
        draft: PathBuf,
        /// Parent directory for build directories (overrides config)
        #[arg(long)]
        work_dir: Option<PathBuf>,
        /// Package manager to build with: npm, pnpm, yarn, or bun
        #[arg(long)]
        package_manager: Option<String>,
        /// Run `<pm> install` in the generated project before building
        #[arg(long)]
        install: bool,
        /// Kill the build after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Generate the project source for a draft without building it
    Generate {
        /// Path to the campaign draft JSON file
        draft: PathBuf,
        /// Directory to generate into
        #[arg(long)]
        out: PathBuf,
    },

    /// Print the assembled theme for a draft
    Theme {
        /// Path to the campaign draft JSON file
        draft: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            report_error(
                &format!("failed to create tokio runtime: {}", e),
                cli.output,
                cli.quiet,
            );
            process::exit(1);
        }
    };

    let ctx = commands::CommandContext {
        config_path: cli.config.as_deref(),
        output: cli.output,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Package {
            draft,
            work_dir,
            package_manager,
            install,
            timeout,
        } => {
            let overrides = commands::package::BuildOverrides {
                work_dir,
                package_manager,
                install,
                timeout,
            };
            rt.block_on(commands::package::cmd_package(&ctx, &draft, overrides));
        }
        Commands::Generate { draft, out } => {
            rt.block_on(commands::generate::cmd_generate(&ctx, &draft, &out));
        }
        Commands::Theme { draft } => {
            rt.block_on(commands::theme::cmd_theme(&ctx, &draft));
        }
    }
}

/// Log to stderr. `RUST_LOG` wins; otherwise `info`, or `warn` when quiet.
fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("error: {}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}

/// Like [`report_error`], with the failure kind and task in JSON output.
pub(crate) fn report_forge_error(err: &ForgeError, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("error: {}", err),
        OutputFormat::Json => {
            eprintln!(
                "{}",
                serde_json::json!({
                    "error": err.to_string(),
                    "kind": err.kind(),
                    "task": err.task(),
                })
            );
        }
    }
}
