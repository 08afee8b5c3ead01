use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tankgauge_core::ExtractorConfig;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;
mod outcome;
mod prompt;

use outcome::Outcome;

#[derive(Parser, Debug)]
#[command(author, version, about = "Extract tank gauging records into CSV reports", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Default)]
struct GlobalArgs {
    /// Directory searched recursively for source database files
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// TOML file with extractor settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path of the combined export
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Directory the per-grade reports are written to
    #[arg(long, global = true)]
    report_dir: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Combine every source file into one export
    Combine,
    /// Combine, then write one wide report per selected grade
    Report(ReportArgs),
    /// List the tables of a single source file
    Tables {
        file: PathBuf,
    },
    /// Print the first combined readings as a table
    Preview {
        #[arg(long, default_value_t = 10)]
        rows: usize,
    },
}

#[derive(Args, Debug, Default)]
struct ReportArgs {
    /// Comma separated grade codes (1=DIESEL, 2=ULP, 3=KERO, 4=JET A1, 5=ALL); prompts when omitted
    #[arg(long)]
    grades: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.global.json);

    match run(cli) {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            error!("tankgauge failed: {err:#}");
            eprintln!("Error: {err:#}");
            Outcome::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<Outcome> {
    let config = resolve_config(&cli.global)?;

    match cli.command {
        Command::Combine => commands::combine(&config),
        Command::Report(args) => commands::report(&config, args.grades.as_deref()),
        Command::Tables { file } => commands::tables(&config, &file),
        Command::Preview { rows } => commands::preview(&config, rows),
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn resolve_config(args: &GlobalArgs) -> Result<ExtractorConfig> {
    dotenvy::dotenv().ok();
    layer_config(args, |key| std::env::var(key).ok())
}

/// Defaults, then the config file, then `env`, then command-line flags.
fn layer_config<F>(args: &GlobalArgs, env: F) -> Result<ExtractorConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match &args.config {
        Some(path) => ExtractorConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ExtractorConfig::default(),
    };
    config.apply_overrides(env);

    if let Some(root) = &args.root {
        config.root = root.clone();
    }
    if let Some(output) = &args.output {
        config.combined_output = output.clone();
    }
    if let Some(dir) = &args.report_dir {
        config.report_dir = dir.clone();
    }

    config.validate()?;
    Ok(config)
}
