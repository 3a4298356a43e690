//! Snapshot directory management for snapkeep.
//!
//! This crate provides:
//! - Filesystem trait with real and in-memory implementations
//! - Snapshot labels per granularity
//! - Idempotent snapshot creation
//! - Count-based rotation per granularity prefix

pub mod creator;
pub mod filesystem;
pub mod label;
pub mod rotation;

pub use creator::{ensure_snapshot, CreateError, CreateOutcome};
pub use filesystem::{EntryKind, Filesystem, FsError, MockFilesystem, RealFilesystem, DIR_MODE};
pub use label::{parse_snapshot_label, snapshot_label, Granularity, LabelZone};
pub use rotation::{removal_candidates, rotate_snapshots, RemovalFailure, RotationResult};
