//! bevy-migrate - Bevy version migration engine
//!
//! Upgrades a Bevy project's source tree from one engine version to another.
//! Migrations are data: each version step is a unit of structural rewrite
//! rules, applied in priority order through a pattern matcher that understands
//! `$NAME` and `$$$NAME` metavariables.
//!
//! # Architecture
//!
//! ```text
//! CLI -> MigrationEngine -> resolve plan -> per unit: scan + rewrite (in memory)
//!                        -> bump Cargo.toml -> snapshot -> persist
//! ```
//!
//! Multi-hop upgrades chain entirely in memory; the project directory is only
//! written in the final persist phase, so an aborted run changes nothing.
//!
//! # Custom rule sets
//!
//! Extra migration units load from YAML:
//!
//! ```yaml
//! from: "0.17"
//! to: "0.18"
//! part: 9
//! description: "project-local renames"
//! rules:
//!   - id: my-plugin-rename
//!     pattern: "MyPlugin::legacy($ARGS)"
//!     replacement: "MyPlugin::current($ARGS)"
//!     priority: 50
//! ```

pub mod backup;
pub mod catalog;
pub mod chain;
pub mod detect;
pub mod engine;
pub mod error;
pub mod files;
pub mod pattern;
pub mod rewrite;
pub mod rule;

// Re-export main types
pub use backup::{BackupHandle, FsBackup, FsPersist, Persist, Snapshot};
pub use chain::{MigrationPlan, MigrationSet};
pub use detect::detect_version;
pub use engine::{FileReport, MigrationEngine, MigrationOptions, MigrationReport};
pub use error::{MigrateError, TransformError};
pub use files::FileScanner;
pub use pattern::{MatchSpan, Pattern, PatternError};
pub use rewrite::{AppliedTransform, RewriteExecutor, RewriteResult};
pub use rule::{CallbackRegistry, Captures, MigrationUnit, Rule, RuleCallback};
