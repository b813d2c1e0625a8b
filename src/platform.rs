//! Platform detection
//!
//! Identifies the host operating system family (the three the native build
//! knows how to drive) and derives the Windows architecture selector from
//! the interpreter's compiler description.

use std::env;
use std::fmt;
use std::str::FromStr;

/// Operating system family the native build targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostPlatform {
    /// Windows (MSVC generators, `.pyd` modules)
    Windows,
    /// macOS (`.dylib` renamed to `.so`)
    MacOs,
    /// Linux and any other POSIX system
    Linux,
}

impl HostPlatform {
    /// Platform of the running process
    #[must_use]
    pub fn current() -> Self {
        Self::from_os(env::consts::OS)
    }

    /// Map a Rust `target_os` string to a platform family.
    ///
    /// Everything that is neither Windows nor macOS is treated as POSIX.
    #[must_use]
    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" => Self::Windows,
            "macos" | "darwin" => Self::MacOs,
            _ => Self::Linux,
        }
    }

    /// Get platform name as string
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::MacOs => "macos",
            Self::Linux => "linux",
        }
    }

    /// Whether the build uses a multi-config Visual Studio generator
    #[inline]
    pub const fn is_windows(self) -> bool {
        matches!(self, Self::Windows)
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostPlatform {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_lowercase().as_str() {
            "windows" | "win32" | "win" => Ok(Self::Windows),
            "macos" | "darwin" | "osx" | "mac" => Ok(Self::MacOs),
            "linux" | "posix" | "unix" => Ok(Self::Linux),
            other => Err(format!(
                "unknown platform '{other}' (expected windows, macos or linux)"
            )),
        }
    }
}

/// Target architecture of the Windows build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    /// 64-bit interpreter
    X64,
    /// 32-bit interpreter
    X86,
}

impl Architecture {
    /// Derive the architecture from `platform.python_compiler()` output.
    ///
    /// Only the `64 bit` marker counts: MSVC version numbers such as
    /// `v.1964` contain `64` on 32-bit interpreters too.
    ///
    /// Examples: `"MSC v.1937 64 bit (AMD64)"` -> x64,
    /// `"MSC v.1964 32 bit (Intel)"` -> x86
    #[must_use]
    pub fn from_compiler_description(compiler: &str) -> Self {
        if compiler.contains("64 bit") {
            Self::X64
        } else {
            Self::X86
        }
    }

    /// Short architecture name (`x64` / `x86`)
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X64 => "x64",
            Self::X86 => "x86",
        }
    }

    /// Value for CMake's `-A` platform selector
    #[inline]
    pub const fn cmake_platform(self) -> &'static str {
        match self {
            Self::X64 => "x64",
            Self::X86 => "Win32",
        }
    }

    /// Bit width, for progress messages
    #[inline]
    pub const fn bits(self) -> u8 {
        match self {
            Self::X64 => 64,
            Self::X86 => 32,
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
