//! Core types: build configuration and GPU capability reports.

pub mod config;
pub mod gpu;
