//! Clean command
//!
//! Remove the scratch build directory, and optionally the staged module

use anyhow::{Context, Result};
use live2d_build::HostPlatform;
use live2d_build::config;
use live2d_build::extensions::StageRule;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Remove build outputs
pub(crate) fn run(
    build_dir_override: Option<&Path>,
    output_dir_override: Option<&Path>,
    config_path: Option<&Path>,
    no_config: bool,
    all: bool,
    dry_run: bool,
) -> Result<()> {
    let cfg = super::load_config(config_path, no_config)?;
    let build_dir = config::build_dir(build_dir_override, &cfg);

    if dry_run {
        println!("Dry run mode - nothing will be removed\n");
    }

    let mut space_freed: u64 = 0;

    if build_dir.is_dir() {
        let size = calculate_dir_size(&build_dir);
        if dry_run {
            println!("Would remove: {} ({})", build_dir.display(), format_bytes(size));
        } else {
            println!("Removing {} ({})", build_dir.display(), format_bytes(size));
            fs::remove_dir_all(&build_dir).with_context(|| {
                format!("Failed to remove build directory: {}", build_dir.display())
            })?;
        }
        space_freed += size;
    } else {
        println!("No build directory found at {}", build_dir.display());
    }

    if all {
        let output_dir = config::output_dir(output_dir_override, &cfg);
        let rule = StageRule::for_platform(
            HostPlatform::current(),
            &config::extension_name(&cfg),
            &config::build_type(None, &cfg),
        );
        let module = rule.destination(&output_dir);

        if let Ok(metadata) = fs::metadata(&module) {
            if dry_run {
                println!("Would remove: {}", module.display());
            } else {
                println!("Removing {}", module.display());
                fs::remove_file(&module).with_context(|| {
                    format!("Failed to remove staged module: {}", module.display())
                })?;
            }
            space_freed += metadata.len();
        }
    }

    println!();
    if dry_run {
        println!("Would free {} of disk space", format_bytes(space_freed));
    } else {
        println!("Done");
        println!("   Freed {} of disk space", format_bytes(space_freed));
    }

    Ok(())
}

/// Calculate total size of a directory recursively using walkdir
fn calculate_dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .sum()
}

/// Format bytes into human-readable string
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut scaled = bytes;
    let mut unit = "KB";
    for next in UNITS {
        unit = next;
        if scaled < 1024 * 1024 {
            break;
        }
        scaled /= 1024;
    }

    // One decimal place, computed in integers
    let tenths = scaled * 10 / 1024;
    format!("{}.{} {unit}", tenths / 10, tenths % 10)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests can panic")]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1024 * 1024 * 3), "3.0 MB");
        assert_eq!(format_bytes(1024 * 1024 * 1024 * 2), "2.0 GB");
    }

    #[test]
    fn dir_size_counts_nested_files() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("lib/Release")).unwrap();
        fs::write(temp.path().join("CMakeCache.txt"), [0_u8; 100]).unwrap();
        fs::write(temp.path().join("lib/Release/libLAppModelWrapper.so"), [0_u8; 28]).unwrap();

        assert_eq!(calculate_dir_size(temp.path()), 128);
    }

    #[test]
    fn clean_removes_build_dir() {
        let temp = TempDir::new().unwrap();
        let build = temp.path().join("build/native");
        fs::create_dir_all(&build).unwrap();
        fs::write(build.join("CMakeCache.txt"), "cache").unwrap();

        run(Some(&build), None, None, true, false, false).unwrap();

        assert!(!build.exists());
    }

    #[test]
    fn dry_run_keeps_everything() {
        let temp = TempDir::new().unwrap();
        let build = temp.path().join("build/native");
        let output = temp.path().join("package/live2d/v3");
        fs::create_dir_all(&build).unwrap();
        fs::create_dir_all(&output).unwrap();
        let module = StageRule::for_platform(HostPlatform::current(), "LAppModelWrapper", "Release")
            .destination(&output);
        fs::write(&module, "module").unwrap();

        run(Some(&build), Some(&output), None, true, true, true).unwrap();

        assert!(build.exists());
        assert!(module.exists());
    }

    #[test]
    fn all_removes_staged_module() {
        let temp = TempDir::new().unwrap();
        let build = temp.path().join("build/native");
        let output = temp.path().join("package/live2d/v3");
        fs::create_dir_all(&output).unwrap();
        let module = StageRule::for_platform(HostPlatform::current(), "LAppModelWrapper", "Release")
            .destination(&output);
        fs::write(&module, "module").unwrap();

        run(Some(&build), Some(&output), None, true, true, false).unwrap();

        assert!(!module.exists());
        assert!(output.exists());
    }
}
