pub mod entity;
pub mod record;
pub mod snapshot;

pub use entity::{BidSnapshot, TenderSnapshot};
pub use record::{
    apply_edit, apply_rollback, check_target_version, initial_snapshot, parse_target_version,
    FieldPatch, HistoryError, Versioned,
};
pub use snapshot::{is_contiguous, Snapshot, VersionLog};
