//! Build command
//!
//! Configure and build the native library, then stage it into the package

use crate::BuildArgs;
use anyhow::Result;
use live2d_build::{ExtensionBuilder, Verbosity};
use std::path::Path;

/// Run the full native build
pub(crate) fn run(
    args: &BuildArgs,
    config_path: Option<&Path>,
    no_config: bool,
    verbose: bool,
    quiet: bool,
) -> Result<()> {
    let cfg = super::load_config(config_path, no_config)?;
    let verbosity = Verbosity::from_flags(verbose, quiet);
    let options = super::build_options(args, &cfg, verbosity)?;

    let mut builder = ExtensionBuilder::new(options);
    let report = match builder.run() {
        Ok(report) => report,
        Err(e) => {
            // CMake output was captured behind the spinner; show it now
            if let Some(output) = e.step_output() {
                eprintln!("{}", output.trim_end());
            }
            return Err(e.into());
        }
    };

    if !verbosity.is_quiet() {
        println!();
        println!(
            "Staged {} for {} ({} bytes)",
            report.artifact.destination.display(),
            report.platform,
            report.artifact.size
        );
        println!("  sha256 {}", report.artifact.sha256);
        println!(
            "Built {} with CMake {} in {:.2}s",
            report.extension,
            report.cmake_version,
            report.duration.as_secs_f64()
        );
    }

    Ok(())
}
