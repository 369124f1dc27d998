//! Drydock - a container-friendly build orchestrator for CMake projects
//!
//! This crate provides the core library functionality for Drydock,
//! including build plan resolution, Emscripten SDK bootstrapping, and
//! GPU capability detection.

pub mod builder;
pub mod core;
pub mod emsdk;
pub mod ops;
pub mod util;

pub use crate::core::config::{BuildConfig, Platform};
pub use crate::core::gpu::GpuReport;
pub use crate::util::process::{CommandFailed, Executor, ProcessBuilder};
