//! Ports layer for the Risk Analysis subsystem

pub mod inbound;

pub use inbound::RiskAnalysisApi;
