//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;

use drydock::core::config::{default_cache_dir, split_extra_flags, BuildConfig};
use drydock::emsdk::DEFAULT_EMSDK_VERSION;
use drydock::Platform;

/// Drydock - build a CMake project from a container or host
#[derive(Parser)]
#[command(name = "drydock")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Target platform for the build (affects cmake flags and generator)
    #[arg(long, default_value = "linux")]
    pub platform: Platform,

    /// Path to the repository root
    #[arg(long, default_value = ".")]
    pub source: PathBuf,

    /// Path for the out-of-source build directory
    #[arg(long, default_value = "build")]
    pub build_dir: PathBuf,

    /// Path to the install prefix
    #[arg(long, default_value = "install")]
    pub install_dir: PathBuf,

    /// Parallel build jobs
    #[arg(short, long, default_value_t = 4, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub jobs: usize,

    /// Print commands but don't execute them
    #[arg(long)]
    pub dry_run: bool,

    /// Print a GPU report after a successful build
    #[arg(long)]
    pub use_gpu: bool,

    /// Detect and print GPU details; alone, this skips the build entirely
    #[arg(long)]
    pub detect_gpu: bool,

    /// Extra flags to pass to CMake (quoted, whitespace-separated)
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub cmake_extra: String,

    /// EMSDK version to install when --platform emscripten
    #[arg(long, default_value = DEFAULT_EMSDK_VERSION)]
    pub emsdk_version: String,

    /// Cache directory for downloaded tools like EMSDK
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Build and run the smoke test after the main build
    #[arg(long)]
    pub smoke_test: bool,

    /// For Emscripten builds, print a URL to open the smoke test in a browser
    #[arg(long)]
    pub smoke_test_browser: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Whether `--detect-gpu` was the sole argument, selecting the
    /// standalone report instead of the build pipeline.
    pub fn detect_gpu_only(&self) -> bool {
        self.detect_gpu && std::env::args_os().len() == 2
    }

    /// Build the immutable per-invocation configuration.
    pub fn into_config(self) -> BuildConfig {
        BuildConfig {
            platform: self.platform,
            source: self.source,
            build_dir: self.build_dir,
            install_dir: self.install_dir,
            jobs: self.jobs,
            dry_run: self.dry_run,
            cmake_extra: split_extra_flags(&self.cmake_extra),
            emsdk_version: self.emsdk_version,
            cache_dir: self.cache_dir.unwrap_or_else(default_cache_dir),
            use_gpu: self.use_gpu,
            detect_gpu: self.detect_gpu,
            smoke_test: self.smoke_test,
            smoke_test_browser: self.smoke_test_browser,
        }
        .resolve_paths()
    }
}
