//! Domain layer for the Risk Analysis subsystem

pub mod heuristics;
pub mod window;

pub use heuristics::*;
pub use window::{RecentWindow, SubmissionFingerprint};
