//! Plan command
//!
//! Show what `build` would run, without running `CMake`

use crate::BuildArgs;
use anyhow::Result;
use live2d_build::Verbosity;
use live2d_build::paths::has_cmake_project;
use std::path::Path;

/// Print the resolved build plan
pub(crate) fn run(args: &BuildArgs, config_path: Option<&Path>, no_config: bool) -> Result<()> {
    let cfg = super::load_config(config_path, no_config)?;
    let options = super::build_options(args, &cfg, Verbosity::Normal)?;
    let plan = options.plan()?;

    println!("## Build plan");
    println!();
    println!("Extension    {}", options.extension);
    println!("Platform     {}", options.platform);
    if let Some(arch) = plan.config.architecture {
        println!("Arch         {arch}");
    }
    println!("Python       {}", plan.interpreter.version);
    println!("Interpreter  {}", plan.interpreter.executable.display());
    println!("Python root  {}", plan.config.python_root.display());
    println!("Jobs         {}", plan.config.jobs);
    println!();

    let source_note = if has_cmake_project(&plan.source_dir) {
        ""
    } else {
        " (no CMakeLists.txt)"
    };
    println!("Source dir   {}{source_note}", plan.source_dir.display());
    println!("Build dir    {}", plan.build_dir.display());
    println!("Output dir   {}", plan.output_dir.display());
    println!();

    println!("## Commands");
    println!();
    println!("{} {}", options.cmake, plan.configure_args.join(" "));
    println!("{} {}", options.cmake, plan.build_args.join(" "));
    println!();

    println!("## Staging");
    println!();
    let destination = plan.stage_rule.destination(&plan.output_dir);
    for candidate in &plan.stage_rule.candidates {
        println!("{} -> {}", candidate.display(), destination.display());
    }

    Ok(())
}
