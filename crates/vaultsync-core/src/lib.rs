//! vaultsync-core - Core library for vaultsync
//!
//! Pure synchronization logic shared by the sync service and the CLI: vector
//! clock comparison, the per-file sync diff engine, conflict copy naming, and
//! storage quota estimation. Nothing in this crate performs I/O.

pub mod clock;
pub mod commit;
pub mod conflict_name;
pub mod diff;
pub mod error;
pub mod manifest;
pub mod models;
pub mod quota;
pub mod transfer;
pub mod util;

pub use clock::{compare, ClockRelation, VectorClock};
pub use diff::{compute_sync_actions, ActionSummary};
pub use error::{Error, Result};
pub use models::{LocalFile, RemoteFile, SyncAction, SyncActionKind};
pub use quota::{compute_upload_quota_stats, QuotaLimits, QuotaStats};
