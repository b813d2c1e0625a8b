//! Artifact staging
//!
//! Copies the library produced by the native build from the scratch
//! directory into the package tree under the module name Python imports.
//!
//! | Platform | Looked up (first match wins) | Staged as |
//! |----------|------------------------------|-----------|
//! | macOS    | `lib/Release/libLAppModelWrapper.dylib`, `lib/libLAppModelWrapper.dylib` | `live2d.so` |
//! | Windows  | `lib/Release/LAppModelWrapper.pyd`, `lib/Release/LAppModelWrapper.dll` | `live2d.pyd` |
//! | Linux    | `lib/Release/libLAppModelWrapper.so`, `lib/libLAppModelWrapper.so` | `live2d.so` |
//!
//! The copy lands in a temporary file next to the destination and is renamed
//! into place only once its checksum matches the source, so a failed stage
//! never leaves a partial module behind.

use crate::config::DEFAULT_BUILD_TYPE;
use crate::platform::HostPlatform;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use walkdir::WalkDir;

/// Library target built by the native project
pub const WRAPPER_LIBRARY: &str = crate::DEFAULT_EXTENSION;

/// Module name Python imports from the package directory
pub const MODULE_NAME: &str = "live2d";

/// File extensions that look like a built shared library
const LIBRARY_EXTENSIONS: [&str; 4] = ["so", "dylib", "pyd", "dll"];

/// Errors raised while staging the built library
#[derive(Debug, Error)]
pub enum StagingError {
    #[error(
        "Failed to copy library file: no {platform} artifact in {} (looked for {}{})",
        scratch_dir.display(),
        display_paths(searched),
        found_suffix(found)
    )]
    NoArtifact {
        platform: HostPlatform,
        scratch_dir: PathBuf,
        searched: Vec<PathBuf>,
        found: Vec<PathBuf>,
    },

    #[error("Failed to copy library file {} to {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to copy library file: checksum mismatch for {} (expected {expected}, got {actual})", path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn found_suffix(found: &[PathBuf]) -> String {
    if found.is_empty() {
        String::new()
    } else {
        format!("; libraries present: {}", display_paths(found))
    }
}

/// Where to find the built library on one platform and what to call it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRule {
    /// Platform the rule applies to
    pub platform: HostPlatform,
    /// Candidate paths relative to the scratch directory, in lookup order
    pub candidates: Vec<PathBuf>,
    /// File name inside the package directory
    pub destination_name: String,
}

impl StageRule {
    /// Staging rule for `library` on `platform`
    ///
    /// `configuration` is the build type passed to `--config`; multi-config
    /// generators place their output in `lib/<configuration>/`.
    #[must_use]
    pub fn for_platform(platform: HostPlatform, library: &str, configuration: &str) -> Self {
        let release = Path::new("lib").join(configuration);
        let lib = Path::new("lib");

        let (candidates, extension) = match platform {
            HostPlatform::MacOs => (
                vec![
                    release.join(format!("lib{library}.dylib")),
                    lib.join(format!("lib{library}.dylib")),
                ],
                "so",
            ),
            HostPlatform::Windows => (
                vec![
                    release.join(format!("{library}.pyd")),
                    release.join(format!("{library}.dll")),
                ],
                "pyd",
            ),
            HostPlatform::Linux => (
                vec![
                    release.join(format!("lib{library}.so")),
                    lib.join(format!("lib{library}.so")),
                ],
                "so",
            ),
        };

        Self {
            platform,
            candidates,
            destination_name: format!("{MODULE_NAME}.{extension}"),
        }
    }

    /// First candidate that exists as a file below `scratch_dir`
    #[must_use]
    pub fn locate(&self, scratch_dir: &Path) -> Option<PathBuf> {
        self.candidates
            .iter()
            .map(|candidate| scratch_dir.join(candidate))
            .find(|path| path.is_file())
    }

    /// Destination path inside `destination_dir`
    #[must_use]
    pub fn destination(&self, destination_dir: &Path) -> PathBuf {
        destination_dir.join(&self.destination_name)
    }
}

/// A library copied into the package tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedArtifact {
    /// Library in the scratch directory
    pub source: PathBuf,
    /// Module in the package directory
    pub destination: PathBuf,
    /// SHA-256 of the staged file
    pub sha256: String,
    /// Size in bytes
    pub size: u64,
}

/// Stage the wrapper library for `platform`.
pub fn stage_artifact(
    platform: HostPlatform,
    scratch_dir: &Path,
    destination_dir: &Path,
) -> Result<StagedArtifact, StagingError> {
    stage_with_rule(
        &StageRule::for_platform(platform, WRAPPER_LIBRARY, DEFAULT_BUILD_TYPE),
        scratch_dir,
        destination_dir,
    )
}

/// Stage the library described by `rule`.
///
/// `destination_dir` must already exist; it is not modified unless the
/// whole copy succeeds.
pub fn stage_with_rule(
    rule: &StageRule,
    scratch_dir: &Path,
    destination_dir: &Path,
) -> Result<StagedArtifact, StagingError> {
    let Some(source) = rule.locate(scratch_dir) else {
        return Err(StagingError::NoArtifact {
            platform: rule.platform,
            scratch_dir: scratch_dir.to_path_buf(),
            searched: rule.candidates.clone(),
            found: find_libraries(scratch_dir),
        });
    };

    let destination = rule.destination(destination_dir);
    crate::debug!(
        "Staging {} -> {}",
        source.display(),
        destination.display()
    );

    let copy_error = |source_err: io::Error| StagingError::Copy {
        from: source.clone(),
        to: destination.clone(),
        source: source_err,
    };

    let mut staged = NamedTempFile::new_in(destination_dir).map_err(copy_error)?;
    let mut input = File::open(&source).map_err(copy_error)?;
    let size = io::copy(&mut input, staged.as_file_mut()).map_err(copy_error)?;
    staged.as_file().sync_all().map_err(copy_error)?;

    let permissions = fs::metadata(&source).map_err(copy_error)?.permissions();
    fs::set_permissions(staged.path(), permissions).map_err(copy_error)?;

    let expected = compute_checksum(&source).map_err(copy_error)?;
    let actual = compute_checksum(staged.path()).map_err(copy_error)?;
    if expected != actual {
        return Err(StagingError::ChecksumMismatch {
            path: destination.clone(),
            expected,
            actual,
        });
    }

    staged
        .persist(&destination)
        .map_err(|err| copy_error(err.error))?;

    Ok(StagedArtifact {
        source,
        destination,
        sha256: actual,
        size,
    })
}

/// Compute SHA256 checksum of a file
pub fn compute_checksum(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0; 8192];

    loop {
        let count = file.read(&mut buffer)?;
        if count == 0 {
            break;
        }
        hasher.update(buffer.get(..count).unwrap_or(&[]));
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Shared libraries anywhere below `scratch_dir`, for error reports
fn find_libraries(scratch_dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(scratch_dir)
        .max_depth(4)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| LIBRARY_EXTENSIONS.contains(&ext))
        })
        .map(|entry| {
            entry
                .path()
                .strip_prefix(scratch_dir)
                .map_or_else(|_| entry.path().to_path_buf(), Path::to_path_buf)
        })
        .collect()
}
