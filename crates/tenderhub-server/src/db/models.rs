use chrono::{DateTime, Utc};
use tenderhub_core::{
    Bid, BidFeedback, BidFields, CoreError, Tender, TenderFields, User,
};
use tenderhub_history::{BidSnapshot, Snapshot, TenderSnapshot};
use uuid::Uuid;

use crate::error::AppError;

/// User database model
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tender database model
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TenderRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub service_type: String,
    pub status: String,
    pub organization_id: Uuid,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tender snapshot database model
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TenderVersionRow {
    pub tender_id: Uuid,
    pub version: i32,
    pub name: String,
    pub description: String,
    pub service_type: String,
    pub created_at: DateTime<Utc>,
}

/// Bid database model
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BidRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: String,
    pub tender_id: Uuid,
    pub author_type: String,
    pub author_id: Uuid,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Bid snapshot database model
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BidVersionRow {
    pub bid_id: Uuid,
    pub version: i32,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Bid feedback database model
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BidFeedbackRow {
    pub id: Uuid,
    pub bid_id: Uuid,
    pub feedback: String,
    pub created_at: DateTime<Utc>,
}

// Enum columns are plain varchar; a value the domain does not know means the
// table was written by something else.
fn corrupt(err: CoreError) -> AppError {
    AppError::Internal(format!("unreadable row: {}", err))
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl TryFrom<TenderRow> for Tender {
    type Error = AppError;

    fn try_from(row: TenderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            service_type: row.service_type.parse().map_err(corrupt)?,
            status: row.status.parse().map_err(corrupt)?,
            organization_id: row.organization_id,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<TenderVersionRow> for TenderSnapshot {
    type Error = AppError;

    fn try_from(row: TenderVersionRow) -> Result<Self, Self::Error> {
        let fields = TenderFields {
            name: row.name,
            description: row.description,
            service_type: row.service_type.parse().map_err(corrupt)?,
        };
        Ok(Snapshot::new(row.tender_id, row.version, fields, row.created_at))
    }
}

impl TryFrom<BidRow> for Bid {
    type Error = AppError;

    fn try_from(row: BidRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            status: row.status.parse().map_err(corrupt)?,
            tender_id: row.tender_id,
            author_type: row.author_type.parse().map_err(corrupt)?,
            author_id: row.author_id,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<BidVersionRow> for BidSnapshot {
    fn from(row: BidVersionRow) -> Self {
        let fields = BidFields {
            name: row.name,
            description: row.description,
        };
        Snapshot::new(row.bid_id, row.version, fields, row.created_at)
    }
}

impl From<BidFeedbackRow> for BidFeedback {
    fn from(row: BidFeedbackRow) -> Self {
        Self {
            id: row.id,
            bid_id: row.bid_id,
            feedback: row.feedback,
            created_at: row.created_at,
        }
    }
}
