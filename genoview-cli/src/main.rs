use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod error;

use commands::SessionOptions;
use config::Config;
use error::{print_error_and_exit, CliError};

#[derive(Parser)]
#[command(name = "genoview")]
#[command(about = "genoview - coordinate-synchronized multi-track genome viewer")]
#[command(version)]
#[command(long_about = "
genoview renders genes, mutations, signal, reads, junctions and sample
matrices against one shared genomic viewport, and round-trips the view
state through a shareable URL query string.

Examples:
  genoview render --data demos/tp53.json --out tp53.svg
  genoview render --data demos/tp53.json --out zoom.svg --locus chr17:7,576,001-7,580,000
  genoview state --data demos/tp53.json --state '?chr=17&start=7576000&end=7580000&samples=S002'
  genoview config --example > genoview.toml
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of worker threads for fetches and preparation
    #[arg(short, long, global = true)]
    pub threads: Option<usize>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load the view and export it to SVG
    Render {
        /// JSON feature fixture ({"sources": {...}})
        #[arg(long, required = true)]
        data: PathBuf,

        /// Output SVG file
        #[arg(short, long, required = true)]
        out: PathBuf,

        /// URL state to restore, e.g. '?chr=17&start=7565097&end=7590856'
        #[arg(long)]
        state: Option<String>,

        /// Initial locus, overriding the configured one
        #[arg(long)]
        locus: Option<String>,

        /// View width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Title drawn above the ruler
        #[arg(long)]
        title: Option<String>,

        /// Omit the timestamped footer (byte-reproducible output)
        #[arg(long)]
        no_footer: bool,
    },

    /// Restore a URL state and print its normalized form
    State {
        /// JSON feature fixture
        #[arg(long, required = true)]
        data: PathBuf,

        /// URL state to restore
        #[arg(long)]
        state: Option<String>,

        /// Initial locus, overriding the configured one
        #[arg(long)]
        locus: Option<String>,

        /// Print a JSON report with selection, filters and visible features
        #[arg(long)]
        json: bool,
    },

    /// Configuration helpers
    Config {
        /// Print an example genoview.toml
        #[arg(long)]
        example: bool,

        /// Write the example configuration to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn setup_logging(verbose: u8, quiet: bool) -> Result<()> {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(())
}

fn build_runtime(threads: usize) -> Result<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if threads > 0 {
        builder.worker_threads(threads);
    }
    builder.build().context("Failed to start async runtime")
}

async fn run(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Render {
            data,
            out,
            state,
            locus,
            width,
            title,
            no_footer,
        } => {
            let options = SessionOptions { locus, width, state };
            commands::render::execute(&config, data, out, options, title, no_footer).await?;
        }

        Commands::State {
            data,
            state,
            locus,
            json,
        } => {
            let options = SessionOptions {
                locus,
                width: None,
                state,
            };
            commands::state::execute(&config, data, options, json).await?;
        }

        Commands::Config { example, out } => {
            if !example && out.is_none() {
                return Err(CliError::config("nothing to do; pass --example or --out").into());
            }
            match out {
                Some(path) => {
                    Config::default().save_to_file(&path)?;
                    log::info!("Wrote example configuration to {}", path.display());
                }
                None => print!("{}", Config::example_toml()?),
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet)?;

    let config = Config::load(cli.config.as_deref())?;

    let threads = cli.threads.unwrap_or(config.general.threads);
    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to set thread count")?;
    }

    let runtime = build_runtime(threads)?;
    let result = runtime.block_on(run(cli.command, config));

    if let Err(err) = &result {
        if let Some(cli_err) = err.downcast_ref::<CliError>() {
            print_error_and_exit(cli_err);
        }
    }
    result
}
