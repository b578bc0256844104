pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use tenderhub_core::{
    Bid, BidDecision, BidFeedback, BidPatch, BidStatus, Page, ServiceType, Tender, TenderPatch,
    TenderStatus, User,
};
use tenderhub_history::{BidSnapshot, TenderSnapshot};
use uuid::Uuid;

use crate::error::AppError;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// The set of authors a user speaks for: themselves and every organization
/// they are responsible for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorScope {
    pub user_id: Uuid,
    pub organization_ids: Vec<Uuid>,
}

/// Durable storage for tenders, bids, their version histories and the
/// membership facts used for authorization.
///
/// Every write that touches a record's versioned fields also writes the
/// matching snapshot inside the same atomic unit, so a record's `version`
/// never points at a missing snapshot.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn is_responsible(&self, user_id: Uuid, organization_id: Uuid)
        -> Result<bool, AppError>;

    /// Organizations the user is responsible for
    async fn organizations_of(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError>;

    /// Insert a version-1 tender together with its first snapshot
    async fn create_tender(&self, tender: &Tender) -> Result<(), AppError>;

    async fn get_tender(&self, id: Uuid) -> Result<Option<Tender>, AppError>;

    /// Published tenders ordered by name; an empty filter matches every service type
    async fn list_published_tenders(
        &self,
        service_types: &[ServiceType],
        page: Page,
    ) -> Result<Vec<Tender>, AppError>;

    async fn list_tenders_of_organizations(
        &self,
        organization_ids: &[Uuid],
        page: Page,
    ) -> Result<Vec<Tender>, AppError>;

    async fn set_tender_status(
        &self,
        id: Uuid,
        status: TenderStatus,
    ) -> Result<Option<Tender>, AppError>;

    async fn edit_tender(&self, id: Uuid, patch: &TenderPatch) -> Result<Tender, AppError>;

    async fn rollback_tender(&self, id: Uuid, version: i32) -> Result<Tender, AppError>;

    /// Snapshot history ordered by version
    async fn tender_versions(&self, id: Uuid) -> Result<Vec<TenderSnapshot>, AppError>;

    /// Insert a version-1 bid together with its first snapshot
    async fn create_bid(&self, bid: &Bid) -> Result<(), AppError>;

    async fn get_bid(&self, id: Uuid) -> Result<Option<Bid>, AppError>;

    async fn list_bids_by_authors(
        &self,
        scope: &AuthorScope,
        page: Page,
    ) -> Result<Vec<Bid>, AppError>;

    async fn list_bids_for_tender(&self, tender_id: Uuid, page: Page)
        -> Result<Vec<Bid>, AppError>;

    async fn set_bid_status(&self, id: Uuid, status: BidStatus) -> Result<Option<Bid>, AppError>;

    async fn edit_bid(&self, id: Uuid, patch: &BidPatch) -> Result<Bid, AppError>;

    async fn rollback_bid(&self, id: Uuid, version: i32) -> Result<Bid, AppError>;

    async fn bid_versions(&self, id: Uuid) -> Result<Vec<BidSnapshot>, AppError>;

    /// Record a decision on a bid; an approval closes the parent tender in the
    /// same atomic unit
    async fn apply_decision(
        &self,
        bid_id: Uuid,
        decision: BidDecision,
    ) -> Result<(Bid, Tender), AppError>;

    async fn add_feedback(&self, feedback: &BidFeedback) -> Result<(), AppError>;

    /// Feedback on every bid authored within `scope`, newest first
    async fn feedback_for_authors(
        &self,
        scope: &AuthorScope,
        page: Page,
    ) -> Result<Vec<BidFeedback>, AppError>;
}

pub(crate) fn tender_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Tender {} not found", id))
}

pub(crate) fn bid_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Bid {} not found", id))
}

pub(crate) fn version_not_found(version: i32) -> AppError {
    AppError::NotFound(format!("Version {} not found", version))
}
