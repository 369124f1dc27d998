//! Post-install smoke test.
//!
//! Configures and builds the nested smoke-test project against the
//! freshly installed tree. Native platforms run the resulting binary;
//! the Emscripten build cannot be executed directly, so the runner
//! prints manual run instructions instead when the browser hint is set.

use anyhow::{Context, Result};

use crate::builder::plan::BuildPlan;
use crate::util::fs::ensure_dir;
use crate::util::process::{Executor, ProcessBuilder};

/// Name of the smoke-test target produced by its CMake project.
const SMOKE_TARGET: &str = "smoke_test";

/// Build (and, for native platforms, run) the smoke test.
///
/// Failures carry the causing command and exit status; the main install
/// tree is never modified here.
pub fn run(plan: &BuildPlan, executor: &Executor) -> Result<()> {
    let cfg = plan.config();

    println!();
    println!("Running smoke test...");

    let smoke_src = cfg.source.join("tests").join("smoke");
    let smoke_build = cfg.build_dir.join("smoke");
    if !executor.is_dry_run() {
        ensure_dir(&smoke_build)?;
    }

    let configure = plan.configure_nested(&smoke_src, &smoke_build, &cfg.install_dir);
    executor
        .run(&configure)
        .context("smoke test configure failed")?;
    executor
        .run(&plan.build_nested(&smoke_build))
        .context("smoke test build failed")?;

    if cfg.platform.is_native() {
        let binary = smoke_build.join(SMOKE_TARGET);
        executor
            .run(&ProcessBuilder::new(&binary).envs(plan.env()))
            .context("smoke test run failed")?;
        println!("Smoke test passed!");
    } else if cfg.smoke_test_browser {
        println!();
        println!("Smoke test built. To run, start a web server and open:");
        println!(
            "http://localhost:8080/{}/{}.html",
            smoke_build.display(),
            SMOKE_TARGET
        );
        println!();
        println!("Quick test server: python3 -m http.server 8080");
    }

    Ok(())
}
