// docscript CLI entry point.

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use docscript::config::{Overrides, Settings, SettingsBuilder};
use docscript::render::PandocRenderer;
use docscript::vault::Project;
use docscript::workflow::{self, ConversionMode};
use docscript::{Error, scaffold};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "docscript", version, about = "Combine Markdown notes and render them with pandoc")]
struct Cli {
    /// Folder holding `vault/` or `bank/`
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a vault skeleton
    InitVault,
    /// Create a collaborative bank skeleton
    InitBank,
    /// Create a note from the start template, e.g. `algebra/main.algebra.groups.md`
    StartNote { note: String },
    /// Rebuild the bank's main.md from collaborator.md
    UpdateBank,
    /// Convert a single note, looked up by file name
    ConvertOne {
        note: String,
        output: String,
        #[command(flatten)]
        overrides: OverrideArgs,
    },
    /// Convert the notes of one macro-topic listed in main.md
    ConvertGroup {
        argument: String,
        output: String,
        #[command(flatten)]
        overrides: OverrideArgs,
    },
    /// Convert everything listed in main.md
    ConvertAll {
        output: String,
        #[command(flatten)]
        overrides: OverrideArgs,
    },
    /// Convert everything listed in custom.md
    ConvertCustom {
        output: String,
        #[command(flatten)]
        overrides: OverrideArgs,
    },
}

#[derive(Args, Default)]
struct OverrideArgs {
    /// YAML file whose front matter heads the document
    #[arg(long)]
    yaml: Option<PathBuf>,
    /// LaTeX template
    #[arg(long)]
    template: Option<PathBuf>,
    /// Lua filter
    #[arg(long)]
    lua: Option<PathBuf>,
    /// pandoc defaults file
    #[arg(long)]
    pandoc: Option<PathBuf>,
}

impl From<OverrideArgs> for Overrides {
    fn from(args: OverrideArgs) -> Self {
        Overrides {
            yaml: args.yaml,
            template: args.template,
            lua: args.lua,
            pandoc: args.pandoc,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return if error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn settings(root: &std::path::Path, overrides: OverrideArgs) -> Result<Settings, Error> {
    let project = Project::detect(root)?;
    Ok(SettingsBuilder::new(project)
        .with_config_file()?
        .with_overrides(&overrides.into())?
        .build())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let root = std::path::absolute(&cli.root)
        .with_context(|| format!("invalid root {}", cli.root.display()))?;

    let (mode, output, overrides) = match cli.command {
        Command::InitVault => {
            scaffold::init_vault(&root)?;
            return Ok(());
        }
        Command::InitBank => {
            scaffold::init_bank(&root)?;
            return Ok(());
        }
        Command::StartNote { note } => {
            let settings = settings(&root, OverrideArgs::default())?;
            scaffold::start_note(&settings, &note)?;
            return Ok(());
        }
        Command::UpdateBank => {
            let settings = settings(&root, OverrideArgs::default())?;
            workflow::update_bank(&settings)?;
            return Ok(());
        }
        Command::ConvertOne { note, output, overrides } => {
            (ConversionMode::One { note }, output, overrides)
        }
        Command::ConvertGroup { argument, output, overrides } => {
            (ConversionMode::Group { argument }, output, overrides)
        }
        Command::ConvertAll { output, overrides } => (ConversionMode::All, output, overrides),
        Command::ConvertCustom { output, overrides } => {
            (ConversionMode::Custom, output, overrides)
        }
    };

    let settings = settings(&root, overrides)?;
    let artifact = workflow::convert(&settings, &PandocRenderer::new(), &mode, &output)?;
    println!("{}", artifact.display());
    Ok(())
}
