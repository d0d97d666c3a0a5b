pub mod aggregator;
pub mod analyzers;
pub mod audit;
pub mod config;
pub mod coordinator;
pub mod crawler;
pub mod discovery;
pub mod selection;

pub use audit::{AuditReport, AuditStats, Auditor};
pub use config::{AuditConfig, ScoringConfig};
