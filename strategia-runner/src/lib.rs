//! Strategia Runner — engine orchestration, audit persistence, replay, export.
//!
//! This crate builds on `strategia-core` to provide:
//! - `StrategicEngine`: evaluate, dry-run, latest/history queries, rule swap
//! - Append-only audit stores (JSONL file, in-memory) behind `AuditStore`
//! - Bounded-time persistence with retry of transient failures
//! - Engine configuration from TOML
//! - Parallel replay of stored decisions against a rule set
//! - JSON and CSV history export

pub mod audit;
pub mod config;
pub mod engine;
pub mod export;
pub mod replay;

pub use audit::{
    AuditStore, DecisionRecord, InMemoryAuditStore, JsonlAuditStore, PersistenceError,
    PersistencePolicy, StoredDecision,
};
pub use config::{AuditConfig, ConfigError, EngineConfig, RulesConfig};
pub use engine::{EngineError, Evaluation, PersistenceOutcome, StrategicEngine};
pub use export::{export_history_csv, export_history_json, import_history_json};
pub use replay::{replay, DecisionSummary, ReplayDiff, ReplayReport};
