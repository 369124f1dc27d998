//! Entry operations invoked by the CLI.

pub mod build;
pub mod detect_gpu;
