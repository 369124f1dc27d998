//! Standalone GPU report.

use anyhow::Result;

use crate::core::gpu::{self, GpuReport};

/// Probe the host and print the GPU report. Always exits cleanly; a
/// missing or broken driver is an answer, not an error.
pub fn run() -> Result<()> {
    println!();
    println!("Checking GPU status...");
    report(&gpu::try_detect());
    Ok(())
}

/// Print a human-readable GPU report, with container-runtime hints when
/// applicable.
pub fn report(info: &GpuReport) {
    if info.has_gpu {
        println!("✓ NVIDIA GPU detected:");
        for name in &info.gpu_names {
            println!("  - {}", name);
        }
        if let Some(driver) = &info.driver_version {
            println!("  Driver version: {}", driver);
        }
        if let Some(cuda) = &info.cuda_version {
            println!("  CUDA version: {}", cuda);
        }

        if info.in_container {
            println!();
            println!("Running inside container - ensure proper GPU access:");
            println!("  - Docker: use '--gpus all' or '--runtime=nvidia'");
            println!("  - Apptainer/Singularity: use '--nv'");
        }
    } else {
        println!("✗ No NVIDIA GPU detected or drivers not accessible.");
        if info.in_container {
            println!();
            println!("If you have an NVIDIA GPU, ensure:");
            println!("1. NVIDIA Container Toolkit is installed on the host");
            println!("2. Container is run with GPU access flags");
            println!("3. Using a CUDA-enabled base image");
        }
    }
}
