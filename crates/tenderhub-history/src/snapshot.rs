use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::record::HistoryError;

/// Immutable copy of a record's versioned fields at one version
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot<F> {
    pub record_id: Uuid,
    pub version: i32,
    #[serde(flatten)]
    pub fields: F,
    pub created_at: DateTime<Utc>,
}

impl<F> Snapshot<F> {
    pub fn new(record_id: Uuid, version: i32, fields: F, created_at: DateTime<Utc>) -> Self {
        Self {
            record_id,
            version,
            fields,
            created_at,
        }
    }
}

/// Append-only history of one record.
///
/// Holds exactly one snapshot per version from 1 up to the latest, with no
/// gaps. Snapshots are never replaced or removed.
#[derive(Debug, Clone)]
pub struct VersionLog<F> {
    snapshots: Vec<Snapshot<F>>,
}

impl<F: Clone> VersionLog<F> {
    /// Start a history from the record's first snapshot
    pub fn start(first: Snapshot<F>) -> Result<Self, HistoryError> {
        if first.version != 1 {
            return Err(HistoryError::OutOfSequence {
                latest: 0,
                found: first.version,
            });
        }
        Ok(Self {
            snapshots: vec![first],
        })
    }

    /// Append the snapshot of the next version
    pub fn append(&mut self, snapshot: Snapshot<F>) -> Result<(), HistoryError> {
        let latest = self.latest();
        if snapshot.record_id != latest.record_id {
            return Err(HistoryError::ForeignSnapshot {
                expected: latest.record_id,
                found: snapshot.record_id,
            });
        }
        if snapshot.version != latest.version + 1 {
            return Err(HistoryError::OutOfSequence {
                latest: latest.version,
                found: snapshot.version,
            });
        }
        self.snapshots.push(snapshot);
        Ok(())
    }

    /// Look up the snapshot for `version`
    pub fn get(&self, version: i32) -> Option<&Snapshot<F>> {
        // versions are dense and start at 1
        let index = usize::try_from(version).ok()?.checked_sub(1)?;
        self.snapshots.get(index)
    }

    pub fn latest(&self) -> &Snapshot<F> {
        // never empty: `start` seeds the first snapshot
        &self.snapshots[self.snapshots.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn to_vec(&self) -> Vec<Snapshot<F>> {
        self.snapshots.clone()
    }
}

/// Check that `versions` (in any order) form the unbroken sequence `1..=latest`
pub fn is_contiguous(versions: impl IntoIterator<Item = i32>, latest: i32) -> bool {
    let mut versions: Vec<i32> = versions.into_iter().collect();
    versions.sort_unstable();
    versions.len() == latest.max(0) as usize
        && versions.iter().zip(1..).all(|(v, expected)| *v == expected)
}
