//! Build plan resolution and the post-install smoke test.

pub mod plan;
pub mod smoke;

pub use plan::BuildPlan;
