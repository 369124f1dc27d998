//! NVIDIA GPU capability detection.
//!
//! GPU presence is advisory context, not a build requirement, so every
//! probe failure (tool missing, non-zero exit, malformed output) is
//! mapped to "no GPU" rather than surfaced as an error.

use std::path::Path;

use crate::util::process::{find_executable, ProcessBuilder};

/// Filesystem marker Docker leaves in containers.
const CONTAINER_MARKER: &str = "/.dockerenv";

/// Result of probing the host for an NVIDIA GPU.
#[derive(Debug, Clone, Default)]
pub struct GpuReport {
    /// True only if at least one device was parsed from the query output.
    pub has_gpu: bool,

    /// Driver version; the last device's version when multiple are present.
    pub driver_version: Option<String>,

    /// CUDA toolkit version, if `nvcc` is available.
    pub cuda_version: Option<String>,

    /// Detected device names, in query order.
    pub gpu_names: Vec<String>,

    /// Whether the process is running inside a container.
    pub in_container: bool,
}

/// Probe the host for an NVIDIA GPU. Never fails.
pub fn try_detect() -> GpuReport {
    let mut report = GpuReport {
        in_container: Path::new(CONTAINER_MARKER).exists(),
        ..GpuReport::default()
    };

    let Some(nvidia_smi) = find_executable("nvidia-smi") else {
        return report;
    };

    let query = ProcessBuilder::new(nvidia_smi)
        .arg("--query-gpu=gpu_name,driver_version")
        .arg("--format=csv,noheader");

    let output = match query.exec() {
        Ok(output) if output.status.success() => output,
        _ => return report,
    };

    let devices = parse_query_output(&String::from_utf8_lossy(&output.stdout));
    if devices.is_empty() {
        return report;
    }

    report.has_gpu = true;
    for (name, driver) in devices {
        report.gpu_names.push(name);
        // Last one wins if multiple GPUs are present.
        report.driver_version = Some(driver);
    }

    report.cuda_version = probe_cuda_version();
    report
}

/// Best-effort CUDA toolkit version from `nvcc --version`.
fn probe_cuda_version() -> Option<String> {
    let nvcc = find_executable("nvcc")?;
    let output = ProcessBuilder::new(nvcc).arg("--version").exec().ok()?;
    if !output.status.success() {
        return None;
    }
    parse_nvcc_release(&String::from_utf8_lossy(&output.stdout))
}

/// Parse `nvidia-smi --query-gpu=gpu_name,driver_version --format=csv,noheader`
/// output into (name, driver) pairs. Malformed lines are skipped.
fn parse_query_output(stdout: &str) -> Vec<(String, String)> {
    stdout
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let (name, driver) = line.split_once(',')?;
            Some((name.trim().to_string(), driver.trim().to_string()))
        })
        .collect()
}

/// Extract the toolkit version from `nvcc --version` output: the text
/// following the `release` marker, up to the next comma.
fn parse_nvcc_release(stdout: &str) -> Option<String> {
    let (line, idx) = stdout
        .lines()
        .find_map(|line| find_release_marker(line).map(|idx| (line, idx)))?;
    let tail = &line[idx + RELEASE_MARKER.len()..];
    let version = tail.split(',').next()?.trim();
    if version.is_empty() {
        None
    } else {
        Some(version.to_string())
    }
}

const RELEASE_MARKER: &[u8] = b"release";

/// Case-insensitive search for the `release` marker, byte-wise on the
/// original string. The marker is pure ASCII, so a match index is
/// always a char boundary and safe to slice at, even when the line
/// holds multi-byte characters.
fn find_release_marker(line: &str) -> Option<usize> {
    line.as_bytes()
        .windows(RELEASE_MARKER.len())
        .position(|window| window.eq_ignore_ascii_case(RELEASE_MARKER))
}
