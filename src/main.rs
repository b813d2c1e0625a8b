//! live2d-build command-line interface
//!
//! Builds the Live2D model wrapper library with `CMake` and stages it into
//! the Python package

use clap::{Args, Parser, Subcommand};
use live2d_build::HostPlatform;
use std::path::PathBuf;
use std::process;

/// Display an error with optional backtrace information
fn display_error(err: &anyhow::Error, backtrace_enabled: bool) {
    eprintln!("error: {err}");

    // Show error chain
    let mut source = err.source();
    while let Some(err) = source {
        eprintln!("caused by: {err}");
        source = err.source();
    }

    // Show backtrace if enabled
    if backtrace_enabled {
        let backtrace = err.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            eprintln!("\nBacktrace:");
            eprintln!("{backtrace}");
        }
    }
}

#[derive(Parser)]
#[command(name = "live2d-build")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build the Live2D native extension for Python", long_about = None)]
#[command(disable_version_flag = true)]
pub(crate) struct Cli {
    /// Print version
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    _version: Option<bool>,

    /// Print debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Show stack backtrace on errors
    #[arg(long, global = true)]
    backtrace: bool,

    /// Path to a config file (overrides .live2d-build.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Ignore all config files
    #[arg(long, global = true, conflicts_with = "config")]
    no_config: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Inputs shared by `build` and `plan`
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct BuildArgs {
    /// Directory containing the top-level CMakeLists.txt
    #[arg(long, value_name = "DIR")]
    pub(crate) source_dir: Option<PathBuf>,

    /// Scratch directory for the CMake build tree
    #[arg(long, value_name = "DIR")]
    pub(crate) build_dir: Option<PathBuf>,

    /// Package directory that receives the native module
    #[arg(long, value_name = "DIR")]
    pub(crate) output_dir: Option<PathBuf>,

    /// Number of parallel native build jobs
    #[arg(long, short = 'j')]
    pub(crate) jobs: Option<usize>,

    /// Python interpreter to build against
    #[arg(long)]
    pub(crate) python: Option<String>,

    /// CMake executable
    #[arg(long)]
    pub(crate) cmake: Option<String>,

    /// Compose flags and staging rules for another platform (windows, macos, linux)
    #[arg(long)]
    pub(crate) platform: Option<HostPlatform>,

    /// CMake build type / configuration
    #[arg(long)]
    pub(crate) build_type: Option<String>,

    /// Minimum macOS version for the built library
    #[arg(long)]
    pub(crate) osx_deployment_target: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure, build and stage the native module
    Build {
        #[command(flatten)]
        args: BuildArgs,

        /// Stream CMake output instead of showing a spinner
        #[arg(long)]
        verbose: bool,

        /// Suppress all output except errors
        #[arg(long, short, conflicts_with = "verbose")]
        quiet: bool,
    },

    /// Show the CMake invocations and staging rule without building
    Plan {
        #[command(flatten)]
        args: BuildArgs,
    },

    /// Display toolchain and environment information
    Env,

    /// Remove the scratch build directory
    Clean {
        /// Scratch directory to remove
        #[arg(long, value_name = "DIR")]
        build_dir: Option<PathBuf>,

        /// Package directory holding the staged module
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Also remove the staged native module
        #[arg(long)]
        all: bool,

        /// Show what would be removed without removing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize debug mode
    live2d_build::init_debug(cli.debug);

    let backtrace = cli.backtrace;
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Build {
            args,
            verbose,
            quiet,
        } => commands::build::run(&args, config_path, cli.no_config, verbose, quiet),
        Commands::Plan { args } => commands::plan::run(&args, config_path, cli.no_config),
        Commands::Env => commands::env::run(config_path, cli.no_config),
        Commands::Clean {
            build_dir,
            output_dir,
            all,
            dry_run,
        } => commands::clean::run(
            build_dir.as_deref(),
            output_dir.as_deref(),
            config_path,
            cli.no_config,
            all,
            dry_run,
        ),
        Commands::Completion { shell } => commands::completion::run(shell),
    };

    if let Err(e) = result {
        // Display error with formatting
        display_error(&e, backtrace);
        process::exit(1);
    }
}

mod commands;
