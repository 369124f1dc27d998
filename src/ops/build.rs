//! The build pipeline.
//!
//! One linear pipeline per invocation:
//! verify source root → ensure build/install dirs → (EMSDK bootstrap for
//! Emscripten) → configure → build → install → (GPU report) →
//! (smoke test). Each step runs only if the previous one succeeded.

use std::collections::HashMap;

use anyhow::{Context, Result};

use crate::builder::plan::BuildPlan;
use crate::builder::smoke;
use crate::core::config::{check_source_root, BuildConfig, Platform};
use crate::core::gpu;
use crate::emsdk::{self, EmsdkCache};
use crate::ops::detect_gpu;
use crate::util::fs::ensure_dir;
use crate::util::process::{find_executable, Executor, ProcessBuilder};

/// Run the full build pipeline for one configuration.
pub fn run(config: &BuildConfig) -> Result<()> {
    check_source_root(&config.source)?;

    if !config.dry_run {
        ensure_dir(&config.build_dir)?;
        ensure_dir(&config.install_dir)?;
    }

    if config.platform == Platform::Windows {
        tracing::warn!(
            "the windows platform is a placeholder: the host Unix toolchain is \
             reused and no Windows binaries are produced"
        );
    }

    let executor = Executor::new(config.dry_run);

    let env = if config.platform == Platform::Emscripten {
        resolve_emscripten_env(config)?
    } else {
        HashMap::new()
    };

    let plan = BuildPlan::new(config.clone(), env);

    executor.run(&plan.configure())?;
    executor.run(&plan.build())?;
    executor.run(&plan.install())?;

    if config.use_gpu || config.detect_gpu {
        println!();
        println!("Checking GPU status...");
        detect_gpu::report(&gpu::try_detect());
    }

    println!();
    println!(
        "Build finished. Install tree is at: {}",
        config.install_dir.display()
    );

    if config.smoke_test {
        smoke::run(&plan, &executor)?;
    }

    Ok(())
}

/// Resolve the Emscripten toolchain environment.
///
/// A working system install is preferred; otherwise the EMSDK is
/// bootstrapped into the cache and its activation output becomes the
/// environment-override map for every later step. A dry-run bootstrap
/// yields no overrides since no real SDK exists to activate.
fn resolve_emscripten_env(config: &BuildConfig) -> Result<HashMap<String, String>> {
    if let Some(emcc) = find_executable("emcc") {
        let works = ProcessBuilder::new(emcc)
            .arg("--version")
            .exec()
            .map(|output| output.status.success())
            .unwrap_or(false);
        if works {
            println!("Using system Emscripten install");
            return Ok(HashMap::new());
        }
    }

    println!("System Emscripten not found, bootstrapping EMSDK...");
    let cache = EmsdkCache::new(&config.cache_dir);
    let sdk_root = cache
        .ensure(&config.emsdk_version, config.dry_run)
        .context("EMSDK bootstrap failed")?;

    if config.dry_run {
        return Ok(HashMap::new());
    }

    emsdk::activation_env(&sdk_root, &config.emsdk_version)
        .context("EMSDK activation failed")
}
