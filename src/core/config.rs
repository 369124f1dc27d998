//! Build configuration.
//!
//! A [`BuildConfig`] is constructed once from the CLI option set and is
//! read-only for the rest of the invocation.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use directories::ProjectDirs;
use thiserror::Error;

use crate::util::fs::normalize_path;

/// Project directories for Drydock
static PROJECT_DIRS: LazyLock<Option<ProjectDirs>> =
    LazyLock::new(|| ProjectDirs::from("com", "drydock", "drydock"));

/// The source root was missing before any command was issued.
///
/// This is a distinct precondition failure: the process exits with
/// code 2 and no external commands are run.
#[derive(Debug, Error)]
#[error("source directory does not exist: {}", .0.display())]
pub struct SourceRootMissing(pub PathBuf);

/// Target platform for the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Macos,
    /// Placeholder: reuses the host Unix toolchain and produces no
    /// Windows binaries.
    Windows,
    Emscripten,
}

impl Platform {
    /// The CMake generator used for this platform.
    pub fn generator(&self) -> &'static str {
        match self {
            Platform::Emscripten => "Ninja",
            _ => "Unix Makefiles",
        }
    }

    /// Whether configure must be wrapped with the Emscripten CMake wrapper.
    pub fn uses_emcmake(&self) -> bool {
        matches!(self, Platform::Emscripten)
    }

    /// Whether build artifacts can be executed directly on the host.
    pub fn is_native(&self) -> bool {
        !matches!(self, Platform::Emscripten)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Macos => "macos",
            Platform::Windows => "windows",
            Platform::Emscripten => "emscripten",
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linux" => Ok(Platform::Linux),
            "macos" => Ok(Platform::Macos),
            "windows" => Ok(Platform::Windows),
            "emscripten" => Ok(Platform::Emscripten),
            _ => Err(format!(
                "invalid platform '{}'; expected 'linux', 'macos', 'windows', or 'emscripten'",
                s
            )),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable configuration for one build invocation.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Target platform
    pub platform: Platform,

    /// Repository root of the project being built
    pub source: PathBuf,

    /// Out-of-source build directory
    pub build_dir: PathBuf,

    /// Install prefix
    pub install_dir: PathBuf,

    /// Parallel build jobs
    pub jobs: usize,

    /// Print commands without executing them
    pub dry_run: bool,

    /// Extra flags appended to the configure command
    pub cmake_extra: Vec<String>,

    /// EMSDK version to install when platform is Emscripten
    pub emsdk_version: String,

    /// Cache directory for downloaded toolchains
    pub cache_dir: PathBuf,

    /// Print a GPU report after a successful build
    pub use_gpu: bool,

    /// GPU report requested (also enables the post-build report)
    pub detect_gpu: bool,

    /// Build and run the smoke test after the main build
    pub smoke_test: bool,

    /// Print browser instructions for Emscripten smoke tests
    pub smoke_test_browser: bool,
}

impl BuildConfig {
    /// Normalize the filesystem roots.
    ///
    /// Paths that do not exist yet (build/install dirs before their
    /// first run) are kept as given.
    pub fn resolve_paths(mut self) -> Self {
        self.source = normalize_path(&self.source);
        self.build_dir = normalize_path(&self.build_dir);
        self.install_dir = normalize_path(&self.install_dir);
        self
    }
}

/// Split the opaque `--cmake-extra` string into argument form.
///
/// Commands are exec'd as argument vectors rather than shell strings,
/// so the extra flags are split on whitespace.
pub fn split_extra_flags(extra: &str) -> Vec<String> {
    extra.split_whitespace().map(str::to_string).collect()
}

/// Default cache directory for downloaded tools like EMSDK.
pub fn default_cache_dir() -> PathBuf {
    if let Some(dirs) = PROJECT_DIRS.as_ref() {
        dirs.cache_dir().to_path_buf()
    } else {
        // Fallback to ~/.drydock
        directories::BaseDirs::new()
            .map(|b| b.home_dir().join(".drydock"))
            .unwrap_or_else(|| PathBuf::from(".drydock"))
    }
}

/// Check the source-root precondition.
pub fn check_source_root(source: &Path) -> Result<(), SourceRootMissing> {
    if source.exists() {
        Ok(())
    } else {
        Err(SourceRootMissing(source.to_path_buf()))
    }
}
