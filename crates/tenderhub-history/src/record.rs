use chrono::{DateTime, Utc};
use std::fmt::Debug;
use thiserror::Error;
use uuid::Uuid;

use crate::snapshot::Snapshot;

/// Errors from version bookkeeping
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("invalid version number: {0}")]
    InvalidVersion(String),

    #[error("version {0} not found")]
    VersionNotFound(i64),

    #[error("snapshot of entity {found} cannot be applied to entity {expected}")]
    ForeignSnapshot { expected: Uuid, found: Uuid },

    #[error("snapshot version {found} does not follow version {latest}")]
    OutOfSequence { latest: i32, found: i32 },
}

/// Partial update over a record's versioned fields
pub trait FieldPatch<F> {
    /// True when the patch would not change anything
    fn is_empty(&self) -> bool;

    /// Overwrite the present fields of `fields`
    fn apply_to(&self, fields: &mut F);
}

/// A record whose content fields are tracked by an append-only version history.
///
/// Only the content exposed through [`Versioned::fields`] is versioned;
/// lifecycle state such as status never enters a snapshot.
pub trait Versioned {
    type Fields: Clone + PartialEq + Debug + Send + Sync;
    type Patch: FieldPatch<Self::Fields>;

    fn record_id(&self) -> Uuid;

    fn version(&self) -> i32;

    fn fields(&self) -> Self::Fields;

    fn restore(&mut self, fields: Self::Fields);

    /// Move the record to `version`, stamping the modification time
    fn advance(&mut self, version: i32, now: DateTime<Utc>);
}

/// Snapshot written together with a freshly created record
pub fn initial_snapshot<R: Versioned>(record: &R, now: DateTime<Utc>) -> Snapshot<R::Fields> {
    Snapshot::new(record.record_id(), record.version(), record.fields(), now)
}

/// Apply `patch` to `record` and return the snapshot of the new version.
///
/// The caller persists the mutated record and the returned snapshot in one
/// atomic unit.
pub fn apply_edit<R: Versioned>(
    record: &mut R,
    patch: &R::Patch,
    now: DateTime<Utc>,
) -> Snapshot<R::Fields> {
    let mut fields = record.fields();
    patch.apply_to(&mut fields);
    record.restore(fields);
    record.advance(record.version() + 1, now);
    Snapshot::new(record.record_id(), record.version(), record.fields(), now)
}

/// Restore the content of `target` onto `record` as a brand new version.
///
/// Rollback always moves forward: the record ends at `current + 1`, never at
/// the target's version number, and no snapshot is removed.
pub fn apply_rollback<R: Versioned>(
    record: &mut R,
    target: &Snapshot<R::Fields>,
    now: DateTime<Utc>,
) -> Result<Snapshot<R::Fields>, HistoryError> {
    if target.record_id != record.record_id() {
        return Err(HistoryError::ForeignSnapshot {
            expected: record.record_id(),
            found: target.record_id,
        });
    }
    if target.version > record.version() {
        return Err(HistoryError::VersionNotFound(i64::from(target.version)));
    }

    record.restore(target.fields.clone());
    record.advance(record.version() + 1, now);
    Ok(Snapshot::new(
        record.record_id(),
        record.version(),
        record.fields(),
        now,
    ))
}

/// Parse a rollback target taken from a request path
pub fn parse_target_version(raw: &str) -> Result<i32, HistoryError> {
    let version: i64 = raw
        .trim()
        .parse()
        .map_err(|_| HistoryError::InvalidVersion(raw.to_string()))?;
    check_target_version(version)
}

/// Versions start at 1; anything beyond `i32` can never have been written
pub fn check_target_version(version: i64) -> Result<i32, HistoryError> {
    if version < 1 {
        return Err(HistoryError::InvalidVersion(version.to_string()));
    }
    i32::try_from(version).map_err(|_| HistoryError::VersionNotFound(version))
}
