//! Env Command
//!
//! Displays toolchain and environment information useful for debugging
//! native build issues.

use anyhow::Result;
use live2d_build::extensions::{CMakeExtensionBuilder, Verbosity};
use live2d_build::{HostPlatform, PythonInterpreter, config, resolve_python_installation_root};
use std::env;
use std::path::Path;

/// Environment variables that affect the build
const RELEVANT_VARS: &[&str] = &[
    "VIRTUAL_ENV",
    "CMAKE",
    "PYTHON",
    "LIVE2D_BUILD_JOBS",
    "LIVE2D_BUILD_CONFIG",
    "LIVE2D_BUILD_DEBUG",
    "CC",
    "CXX",
    "CFLAGS",
    "CXXFLAGS",
    "LDFLAGS",
];

/// Display environment information
pub(crate) fn run(config_path: Option<&Path>, no_config: bool) -> Result<()> {
    let cfg = super::load_config(config_path, no_config)?;
    let virtual_env = live2d_build::env_vars::virtual_env();

    println!("## Environment");
    println!();
    println!("live2d-build {}", env!("CARGO_PKG_VERSION"));
    println!();

    // CMake
    let cmake = config::cmake_executable(None, &cfg);
    let builder = CMakeExtensionBuilder::new(cmake.clone(), Verbosity::Quiet);
    match builder.resolve_version(&[config::extension_name(&cfg)]) {
        Ok(version) => println!("CMake        {version} ({cmake})"),
        Err(e) => println!("CMake        not available: {e}"),
    }

    // Python
    let python = config::python_interpreter(None, &cfg, virtual_env.as_deref());
    match PythonInterpreter::query(&python) {
        Ok(interpreter) => {
            println!("Python       {}", interpreter.version);
            println!("Executable   {}", interpreter.executable.display());
            println!("Compiler     {}", interpreter.compiler);
            match resolve_python_installation_root(
                virtual_env.as_deref(),
                &interpreter.executable,
            ) {
                Ok(root) => println!("Python root  {}", root.display()),
                Err(e) => println!("Python root  {e}"),
            }
        }
        Err(e) => println!("Python       not available: {e}"),
    }
    println!();

    // Platform
    println!("## Platform");
    println!();
    println!("Platform     {}", HostPlatform::current());
    println!("OS           {}", env::consts::OS);
    println!("Arch         {}", env::consts::ARCH);
    println!();

    // Relevant environment variables
    println!("## Environment Variables");
    println!();
    for var in RELEVANT_VARS {
        if let Ok(value) = env::var(var) {
            println!("{var:<20} {value}");
        }
    }

    Ok(())
}
