mod commands;

use anyhow::Result;
use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, Subcommand};
use commands::Context;
use skillbook_core::{CommandError, SkillbookConfig};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "skills",
    about = "List, search, show, validate, and install skill documents",
    version,
    author,
    arg_required_else_help = true
)]
struct Cli {
    /// Skill repository root (default: config `root`, then the current directory)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Path to config file (default: ~/.config/skillbook/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List skills grouped by category
    List,

    /// Print a skill's descriptor file
    Show {
        /// Skill name (its directory)
        name: String,
    },

    /// Find skills whose descriptor mentions a keyword (case-insensitive)
    Search {
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        keyword: String,
    },

    /// Show repository counts
    Stats,

    /// Check every skill's frontmatter
    Validate {
        /// Also warn about naming and consistency problems
        #[arg(long)]
        strict: bool,
    },

    /// Copy a skill into the install directory, replacing any existing copy
    Install {
        /// Skill name (its directory)
        name: String,
        /// Install root override (default: config `install.dir`)
        #[arg(long)]
        dest: Option<PathBuf>,
        /// Show what would be copied without touching the filesystem
        #[arg(long)]
        dry_run: bool,
    },

    /// Test a skill (not implemented yet)
    Test {
        /// Skill name (its directory)
        name: String,
    },

    /// Show or manage configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Initialize default configuration file
    Init,
    /// Print config file path
    Path,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up tracing. Logs go to stderr so stdout stays clean for `show` and `--json`.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "skillbook=info,skillbook_catalog=info,warn".into()),
        )
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err
                .downcast_ref::<CommandError>()
                .map(CommandError::exit_code)
                .unwrap_or(1);
            eprintln!("Error: {:#}", err);
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // Load config.
    let config = match &cli.config {
        Some(path) => SkillbookConfig::load_from(path),
        None => SkillbookConfig::load(),
    }
    .map_err(|e| CommandError::Config(format!("{:#}", e)))?;

    let ctx = Context::new(config, cli.root.as_deref(), cli.json);
    tracing::debug!("Skills root: {:?}", ctx.indexer.root());

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::List => commands::list(&ctx, &mut out)?,
        Commands::Show { name } => commands::show(&ctx, &name, &mut out)?,
        Commands::Search { keyword } => commands::search(&ctx, &keyword, &mut out)?,
        Commands::Stats => commands::stats(&ctx, &mut out)?,
        Commands::Validate { strict } => commands::validate(&ctx, strict, &mut out)?,
        Commands::Install {
            name,
            dest,
            dry_run,
        } => commands::install(&ctx, &name, dest, dry_run, &mut out)?,
        Commands::Test { name } => commands::test(&ctx, &name, &mut out)?,
        Commands::Config { action } => {
            handle_config_command(action, &ctx.config, cli.config, &mut out)?
        }
    }

    out.flush()?;
    Ok(())
}

fn handle_config_command(
    action: Option<ConfigAction>,
    config: &SkillbookConfig,
    config_path: Option<PathBuf>,
    out: &mut dyn Write,
) -> Result<()> {
    let path = config_path.unwrap_or_else(SkillbookConfig::default_path);
    match action {
        Some(ConfigAction::Show) | None => {
            let toml_str = toml::to_string_pretty(config)?;
            writeln!(out, "{}", toml_str)?;
        }
        Some(ConfigAction::Init) => {
            if path.exists() {
                writeln!(out, "Config already exists at: {}", path.display())?;
            } else {
                config.save_to(&path)?;
                writeln!(out, "Created default config at: {}", path.display())?;
            }
        }
        Some(ConfigAction::Path) => {
            writeln!(out, "{}", path.display())?;
        }
    }
    Ok(())
}
