//! Subcommand implementations

pub(crate) mod build;
pub(crate) mod clean;
pub(crate) mod completion;
pub(crate) mod env;
pub(crate) mod plan;

use crate::BuildArgs;
use anyhow::Result;
use live2d_build::{BuildOptions, Config, FlagOptions, HostPlatform, Verbosity, config};
use std::path::Path;

/// Load the config file selected by the global flags
pub(crate) fn load_config(config_path: Option<&Path>, no_config: bool) -> Result<Config> {
    Config::load_with_options(config_path, no_config)
}

/// Resolve every build input: CLI flag -> environment -> config -> default
pub(crate) fn build_options(
    args: &BuildArgs,
    cfg: &Config,
    verbosity: Verbosity,
) -> Result<BuildOptions> {
    let virtual_env = live2d_build::env_vars::virtual_env();

    let flags = FlagOptions {
        jobs: config::jobs(args.jobs, cfg)?,
        build_type: config::build_type(args.build_type.as_deref(), cfg),
        osx_deployment_target: config::osx_deployment_target(
            args.osx_deployment_target.as_deref(),
            cfg,
        ),
    };

    Ok(BuildOptions {
        extension: config::extension_name(cfg),
        source_dir: config::source_dir(args.source_dir.as_deref(), cfg),
        build_dir: config::build_dir(args.build_dir.as_deref(), cfg),
        output_dir: config::output_dir(args.output_dir.as_deref(), cfg),
        platform: args.platform.unwrap_or_else(HostPlatform::current),
        cmake: config::cmake_executable(args.cmake.as_deref(), cfg),
        python: config::python_interpreter(args.python.as_deref(), cfg, virtual_env.as_deref()),
        virtual_env,
        flags,
        verbosity,
    })
}
