//! Emscripten SDK bootstrapping and caching.
//!
//! The SDK is installed once per cache directory and reused by later
//! invocations. Installation is staged in a temporary directory under
//! the cache root and renamed into place only after the clone, install,
//! and activate steps all succeed, so the final cache path never holds
//! a partially-installed entry. A failed install cleans up after itself
//! when the staging directory drops.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use git2::Repository;

use crate::util::fs::ensure_dir;
use crate::util::process::ProcessBuilder;

/// Pinned EMSDK version installed when none is requested.
pub const DEFAULT_EMSDK_VERSION: &str = "3.1.45";

/// Placeholder path returned for dry-run cache misses, where no real
/// filesystem state exists to return.
pub const DRY_RUN_SDK_ROOT: &str = "/dry-run/emsdk";

const EMSDK_REPO_URL: &str = "https://github.com/emscripten-core/emsdk.git";

/// Version-keyed EMSDK installations under a persistent cache root.
#[derive(Debug, Clone)]
pub struct EmsdkCache {
    root: PathBuf,
    repo_url: String,
}

impl EmsdkCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        EmsdkCache {
            root: root.into(),
            repo_url: EMSDK_REPO_URL.to_string(),
        }
    }

    /// Override the repository the SDK is cloned from (mirrors, tests).
    pub fn with_repo_url(mut self, url: impl Into<String>) -> Self {
        self.repo_url = url.into();
        self
    }

    /// Final on-disk location of the SDK.
    pub fn sdk_dir(&self) -> PathBuf {
        self.root.join("emsdk")
    }

    /// Ensure the SDK is present, installing it on first use.
    ///
    /// Returns the SDK root. A cache hit returns immediately with no
    /// network or install activity. A dry-run miss performs no work and
    /// returns the [`DRY_RUN_SDK_ROOT`] placeholder.
    pub fn ensure(&self, version: &str, dry_run: bool) -> Result<PathBuf> {
        let sdk_dir = self.sdk_dir();
        if sdk_dir.exists() {
            tracing::info!("using cached EMSDK at {}", sdk_dir.display());
            return Ok(sdk_dir);
        }

        if dry_run {
            println!(
                "[dry-run] would install EMSDK {} to {}",
                version,
                sdk_dir.display()
            );
            return Ok(PathBuf::from(DRY_RUN_SDK_ROOT));
        }

        ensure_dir(&self.root)?;

        // Stage under the cache root so the final rename stays on one
        // filesystem. The unique name also keeps concurrent first-time
        // installs from trampling each other.
        let staging = tempfile::Builder::new()
            .prefix(".emsdk-staging-")
            .tempdir_in(&self.root)
            .with_context(|| format!("failed to create staging dir in {}", self.root.display()))?;

        install_into(staging.path(), &self.repo_url, version)?;

        // Only a fully-installed tree is moved into the final path.
        let staged = staging.keep();
        if let Err(err) = fs::rename(&staged, &sdk_dir) {
            let _ = fs::remove_dir_all(&staged);
            if sdk_dir.exists() {
                // A concurrent invocation won the install race.
                tracing::info!("EMSDK appeared at {} during install", sdk_dir.display());
                return Ok(sdk_dir);
            }
            return Err(err).with_context(|| {
                format!("failed to move EMSDK into cache at {}", sdk_dir.display())
            });
        }

        Ok(sdk_dir)
    }
}

/// Clone, install, and activate the SDK inside the staging directory.
fn install_into(dir: &Path, repo_url: &str, version: &str) -> Result<()> {
    tracing::info!("cloning {}", repo_url);
    Repository::clone(repo_url, dir)
        .with_context(|| format!("failed to clone {}", repo_url))?;

    run_emsdk_tool(dir, &["install", version])?;
    run_emsdk_tool(dir, &["activate", version])?;
    Ok(())
}

/// Run the SDK's own `emsdk` tool, streaming its output.
fn run_emsdk_tool(sdk_dir: &Path, args: &[&str]) -> Result<()> {
    let tool = sdk_dir.join("emsdk");
    let cmd = ProcessBuilder::new(&tool).args(args).cwd(sdk_dir);
    let status = cmd.status()?;
    if !status.success() {
        bail!(
            "`{}` failed with exit code {:?}",
            cmd.display_command(),
            status.code()
        );
    }
    Ok(())
}

/// Harvest environment overrides from the SDK's activation step.
///
/// Activation is run a second time in embedded mode, which prints the
/// `KEY=VALUE` pairs the toolchain needs, and those are merged into the
/// environment of every subsequent build step.
pub fn activation_env(sdk_dir: &Path, version: &str) -> Result<HashMap<String, String>> {
    run_emsdk_tool(sdk_dir, &["activate", version])?;

    let tool = sdk_dir.join("emsdk");
    let cmd = ProcessBuilder::new(&tool)
        .args(["activate", version, "--embedded"])
        .cwd(sdk_dir);
    let output = cmd.exec()?;
    if !output.status.success() {
        bail!(
            "`{}` failed with exit code {:?}",
            cmd.display_command(),
            output.status.code()
        );
    }

    Ok(parse_activation_output(&String::from_utf8_lossy(
        &output.stdout,
    )))
}

/// Parse `KEY=VALUE` lines from embedded activation output. Lines
/// without `=` are chatter and are skipped.
fn parse_activation_output(stdout: &str) -> HashMap<String, String> {
    stdout
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cache_hit_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let sdk_dir = tmp.path().join("emsdk");
        fs::create_dir_all(&sdk_dir).unwrap();
        fs::write(sdk_dir.join("marker"), "v1").unwrap();

        let cache = EmsdkCache::new(tmp.path());
        let resolved = cache.ensure("3.1.45", false).unwrap();

        assert_eq!(resolved, sdk_dir);
        // The existing entry is untouched.
        assert_eq!(fs::read_to_string(sdk_dir.join("marker")).unwrap(), "v1");
    }

    #[test]
    fn test_dry_run_miss_touches_nothing() {
        let tmp = TempDir::new().unwrap();
        let cache_root = tmp.path().join("cache");

        let cache = EmsdkCache::new(&cache_root);
        let resolved = cache.ensure("3.1.45", true).unwrap();

        assert_eq!(resolved, PathBuf::from(DRY_RUN_SDK_ROOT));
        assert!(!cache_root.exists());
    }

    #[test]
    fn test_failed_install_leaves_no_cache_entry() {
        let tmp = TempDir::new().unwrap();

        // The clone fails up front; nothing may appear at the final
        // cache path and the staging directory must clean itself up.
        let cache = EmsdkCache::new(tmp.path()).with_repo_url("file:///no/such/repo");
        let result = cache.ensure("3.1.45", false);

        assert!(result.is_err());
        assert!(!tmp.path().join("emsdk").exists());
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_parse_activation_output() {
        let stdout = "Setting up EMSDK environment\n\
                      PATH=/opt/emsdk:/usr/bin\n\
                      EMSDK=/opt/emsdk\n\
                      EMSDK_NODE=/opt/emsdk/node/bin/node\n\
                      Done.\n";
        let env = parse_activation_output(stdout);

        assert_eq!(env.len(), 3);
        assert_eq!(env["EMSDK"], "/opt/emsdk");
        assert_eq!(env["PATH"], "/opt/emsdk:/usr/bin");
        assert_eq!(env["EMSDK_NODE"], "/opt/emsdk/node/bin/node");
    }

    #[test]
    fn test_parse_activation_output_empty() {
        assert!(parse_activation_output("no pairs here\n").is_empty());
    }
}
