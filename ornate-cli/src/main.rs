use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ornate_cli::{render_cmd, tree_cmd, Options};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ornate", version, about = "Render ornate HTML templates")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Common {
    /// JSON file used as the root scope
    #[arg(long)]
    scope: Option<PathBuf>,
    /// Directory remote templates and includes are read from
    #[arg(long)]
    base_dir: Option<PathBuf>,
    /// Directive prefix (default: orn-)
    #[arg(long)]
    prefix: Option<String>,
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Emit template diagnostics
    #[arg(long)]
    debug: bool,
}

impl From<Common> for Options {
    fn from(c: Common) -> Self {
        Options {
            scope: c.scope,
            base_dir: c.base_dir,
            prefix: c.prefix,
            config: c.config,
            debug: c.debug,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template to HTML.
    Render {
        template: PathBuf,
        /// Write the HTML here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        #[command(flatten)]
        common: Common,
    },
    /// Print the structural tree of a template.
    Tree {
        template: PathBuf,
        #[command(flatten)]
        common: Common,
    },
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Render {
            template,
            out,
            common,
        } => {
            init_tracing(common.debug);
            let options = Options::from(common);
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to start runtime")?;
            let local = tokio::task::LocalSet::new();
            let html = local.block_on(&runtime, render_cmd(&template, out.as_deref(), &options))?;
            if out.is_none() {
                println!("{html}");
            }
        }
        Commands::Tree { template, common } => {
            init_tracing(common.debug);
            print!("{}", tree_cmd(&template, &Options::from(common))?);
        }
    }
    Ok(())
}
