//! # Mindora Core Library
//!
//! Core logic for Mindora's guided breathing exercises. The CLI binary is a
//! thin host over this crate.
//!
//! ## Architecture
//!
//! - **Breathing Engine**: a tick-driven four-phase state machine
//!   (inhale, hold, exhale, hold) that persists its position after every change
//! - **Storage**: a string key-value store abstraction with in-memory and
//!   SQLite implementations, plus TOML configuration
//! - **History**: append-only completion log and CSV progress report
//!
//! ## Key Components
//!
//! - [`BreathingEngine`]: Session state machine
//! - [`KeyValueStore`]: Persistence seam for snapshots and logs
//! - [`CompletionLog`]: Finished-session history
//! - [`Config`]: Application configuration management

pub mod breathing;
pub mod error;
pub mod events;
pub mod history;
pub mod storage;

pub use breathing::{
    catalog, BreathPattern, BreathingEngine, Exercise, Phase, SessionSnapshot, SessionState,
    Termination,
};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use history::{build_report_csv, CompletionLog, LogEntry, ReportPeriod, SessionSummary};
pub use storage::{Config, Database, KeyValueStore, MemoryStore};
