//! monodocs CLI - scoped SCSS module compiler.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "monodocs")]
#[command(about = "Compile SCSS modules into scoped CSS and class-name tokens")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to monodocs.toml config file
    #[arg(short, long, default_value = "monodocs.toml", global = true)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default monodocs.toml
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },

    /// Compile a single stylesheet and print the result
    Compile {
        /// Stylesheet to compile
        file: PathBuf,

        /// What to print
        #[arg(short, long, value_enum, default_value_t = Format::Css)]
        format: Format,
    },

    /// Build every stylesheet in the styles directory
    Build {
        /// Output directory (defaults to config or "dist")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip minification
        #[arg(long)]
        no_minify: bool,
    },

    /// Rebuild whenever the styles directory changes
    Watch {
        /// Output directory (defaults to config or "dist")
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Output format of `monodocs compile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Compiled CSS
    Css,
    /// Tokens, CSS and file mappings as JSON
    Json,
    /// CommonJS module
    Module,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(&cli.config, yes).await?;
        }
        Commands::Compile { file, format } => {
            commands::compile::run(&cli.config, &file, format).await?;
        }
        Commands::Build { output, no_minify } => {
            let minify = if no_minify { Some(false) } else { None };
            commands::build::run(&cli.config, output, minify).await?;
        }
        Commands::Watch { output } => {
            commands::watch::run(&cli.config, output).await?;
        }
    }

    Ok(())
}
