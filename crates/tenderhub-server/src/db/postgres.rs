use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use tenderhub_core::{
    AuthorType, Bid, BidDecision, BidFeedback, BidPatch, BidStatus, Page, ServiceType, Tender,
    TenderPatch, TenderStatus, User,
};
use tenderhub_history::{
    apply_edit, apply_rollback, initial_snapshot, is_contiguous, BidSnapshot, Snapshot,
    TenderSnapshot,
};
use uuid::Uuid;

use super::models::{
    BidFeedbackRow, BidRow, BidVersionRow, TenderRow, TenderVersionRow, UserRow,
};
use super::{bid_not_found, tender_not_found, version_not_found, AuthorScope, Store};
use crate::error::AppError;

const TENDER_COLUMNS: &str =
    "id, name, description, service_type, status, organization_id, version, created_at, updated_at";

const BID_COLUMNS: &str =
    "id, name, description, status, tender_id, author_type, author_id, version, created_at, updated_at";

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn lock_tender(
        tx: &mut Transaction<'static, Postgres>,
        id: Uuid,
    ) -> Result<Tender, AppError> {
        let row = sqlx::query_as::<_, TenderRow>(&format!(
            "SELECT {} FROM tenders WHERE id = $1 FOR UPDATE",
            TENDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| tender_not_found(id))?;

        row.try_into()
    }

    async fn lock_bid(tx: &mut Transaction<'static, Postgres>, id: Uuid) -> Result<Bid, AppError> {
        let row = sqlx::query_as::<_, BidRow>(&format!(
            "SELECT {} FROM bids WHERE id = $1 FOR UPDATE",
            BID_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| bid_not_found(id))?;

        row.try_into()
    }

    /// Persist a tender's new content and the snapshot describing it
    async fn write_tender_version(
        tx: &mut Transaction<'static, Postgres>,
        tender: &Tender,
        snapshot: &TenderSnapshot,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"UPDATE tenders
               SET name = $1, description = $2, service_type = $3, version = $4, updated_at = $5
               WHERE id = $6"#,
        )
        .bind(&tender.name)
        .bind(&tender.description)
        .bind(tender.service_type.as_str())
        .bind(tender.version)
        .bind(tender.updated_at)
        .bind(tender.id)
        .execute(&mut **tx)
        .await?;

        insert_tender_snapshot(tx, snapshot).await
    }

    async fn write_bid_version(
        tx: &mut Transaction<'static, Postgres>,
        bid: &Bid,
        snapshot: &BidSnapshot,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"UPDATE bids
               SET name = $1, description = $2, version = $3, updated_at = $4
               WHERE id = $5"#,
        )
        .bind(&bid.name)
        .bind(&bid.description)
        .bind(bid.version)
        .bind(bid.updated_at)
        .bind(bid.id)
        .execute(&mut **tx)
        .await?;

        insert_bid_snapshot(tx, snapshot).await
    }
}

async fn insert_tender_snapshot(
    tx: &mut Transaction<'static, Postgres>,
    snapshot: &TenderSnapshot,
) -> Result<(), AppError> {
    sqlx::query(
        r#"INSERT INTO tender_versions (id, tender_id, version, name, description, service_type, created_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
    )
    .bind(Uuid::new_v4())
    .bind(snapshot.record_id)
    .bind(snapshot.version)
    .bind(&snapshot.fields.name)
    .bind(&snapshot.fields.description)
    .bind(snapshot.fields.service_type.as_str())
    .bind(snapshot.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn insert_bid_snapshot(
    tx: &mut Transaction<'static, Postgres>,
    snapshot: &BidSnapshot,
) -> Result<(), AppError> {
    sqlx::query(
        r#"INSERT INTO bid_versions (id, bid_id, version, name, description, created_at)
           VALUES ($1, $2, $3, $4, $5, $6)"#,
    )
    .bind(Uuid::new_v4())
    .bind(snapshot.record_id)
    .bind(snapshot.version)
    .bind(&snapshot.fields.name)
    .bind(&snapshot.fields.description)
    .bind(snapshot.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Refuse to hand out a history with a missing or repeated version
fn ensure_contiguous<F>(record_id: Uuid, history: &[Snapshot<F>]) -> Result<(), AppError> {
    let latest = history.last().map_or(0, |s| s.version);
    if is_contiguous(history.iter().map(|s| s.version), latest) {
        return Ok(());
    }
    Err(AppError::Internal(format!(
        "version history of {} is not contiguous",
        record_id
    )))
}

fn tenders_from_rows(rows: Vec<TenderRow>) -> Result<Vec<Tender>, AppError> {
    rows.into_iter().map(Tender::try_from).collect()
}

fn bids_from_rows(rows: Vec<BidRow>) -> Result<Vec<Bid>, AppError> {
    rows.into_iter().map(Bid::try_from).collect()
}

#[async_trait]
impl Store for PgStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"SELECT id, username, first_name, last_name, created_at, updated_at
               FROM users WHERE username = $1"#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user.map(User::from))
    }

    async fn is_responsible(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"SELECT EXISTS (
                 SELECT 1 FROM organization_responsibles
                 WHERE organization_id = $1 AND user_id = $2
               )"#,
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn organizations_of(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT organization_id FROM organization_responsibles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn create_tender(&self, tender: &Tender) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!(
            "INSERT INTO tenders ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            TENDER_COLUMNS
        ))
        .bind(tender.id)
        .bind(&tender.name)
        .bind(&tender.description)
        .bind(tender.service_type.as_str())
        .bind(tender.status.as_str())
        .bind(tender.organization_id)
        .bind(tender.version)
        .bind(tender.created_at)
        .bind(tender.updated_at)
        .execute(&mut *tx)
        .await?;

        insert_tender_snapshot(&mut tx, &initial_snapshot(tender, tender.created_at)).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_tender(&self, id: Uuid) -> Result<Option<Tender>, AppError> {
        let row = sqlx::query_as::<_, TenderRow>(&format!(
            "SELECT {} FROM tenders WHERE id = $1",
            TENDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Tender::try_from).transpose()
    }

    async fn list_published_tenders(
        &self,
        service_types: &[ServiceType],
        page: Page,
    ) -> Result<Vec<Tender>, AppError> {
        let kinds: Vec<&str> = service_types.iter().map(|s| s.as_str()).collect();
        let rows = sqlx::query_as::<_, TenderRow>(&format!(
            r#"SELECT {} FROM tenders
               WHERE status = $1 AND (cardinality($2::text[]) = 0 OR service_type = ANY($2))
               ORDER BY name ASC
               LIMIT $3 OFFSET $4"#,
            TENDER_COLUMNS
        ))
        .bind(TenderStatus::Published.as_str())
        .bind(&kinds)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        tenders_from_rows(rows)
    }

    async fn list_tenders_of_organizations(
        &self,
        organization_ids: &[Uuid],
        page: Page,
    ) -> Result<Vec<Tender>, AppError> {
        let rows = sqlx::query_as::<_, TenderRow>(&format!(
            r#"SELECT {} FROM tenders
               WHERE organization_id = ANY($1)
               ORDER BY name ASC
               LIMIT $2 OFFSET $3"#,
            TENDER_COLUMNS
        ))
        .bind(organization_ids)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        tenders_from_rows(rows)
    }

    async fn set_tender_status(
        &self,
        id: Uuid,
        status: TenderStatus,
    ) -> Result<Option<Tender>, AppError> {
        let row = sqlx::query_as::<_, TenderRow>(&format!(
            "UPDATE tenders SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            TENDER_COLUMNS
        ))
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Tender::try_from).transpose()
    }

    async fn edit_tender(&self, id: Uuid, patch: &TenderPatch) -> Result<Tender, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut tender = Self::lock_tender(&mut tx, id).await?;

        let snapshot = apply_edit(&mut tender, patch, Utc::now());
        Self::write_tender_version(&mut tx, &tender, &snapshot).await?;

        tx.commit().await?;
        Ok(tender)
    }

    async fn rollback_tender(&self, id: Uuid, version: i32) -> Result<Tender, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut tender = Self::lock_tender(&mut tx, id).await?;

        let target: TenderSnapshot = sqlx::query_as::<_, TenderVersionRow>(
            r#"SELECT tender_id, version, name, description, service_type, created_at
               FROM tender_versions WHERE tender_id = $1 AND version = $2"#,
        )
        .bind(id)
        .bind(version)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| version_not_found(version))?
        .try_into()?;

        let snapshot = apply_rollback(&mut tender, &target, Utc::now())?;
        Self::write_tender_version(&mut tx, &tender, &snapshot).await?;

        tx.commit().await?;
        Ok(tender)
    }

    async fn tender_versions(&self, id: Uuid) -> Result<Vec<TenderSnapshot>, AppError> {
        let rows = sqlx::query_as::<_, TenderVersionRow>(
            r#"SELECT tender_id, version, name, description, service_type, created_at
               FROM tender_versions WHERE tender_id = $1 ORDER BY version ASC"#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let history = rows
            .into_iter()
            .map(TenderSnapshot::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        ensure_contiguous(id, &history)?;
        Ok(history)
    }

    async fn create_bid(&self, bid: &Bid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!(
            "INSERT INTO bids ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            BID_COLUMNS
        ))
        .bind(bid.id)
        .bind(&bid.name)
        .bind(&bid.description)
        .bind(bid.status.as_str())
        .bind(bid.tender_id)
        .bind(bid.author_type.as_str())
        .bind(bid.author_id)
        .bind(bid.version)
        .bind(bid.created_at)
        .bind(bid.updated_at)
        .execute(&mut *tx)
        .await?;

        insert_bid_snapshot(&mut tx, &initial_snapshot(bid, bid.created_at)).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_bid(&self, id: Uuid) -> Result<Option<Bid>, AppError> {
        let row = sqlx::query_as::<_, BidRow>(&format!(
            "SELECT {} FROM bids WHERE id = $1",
            BID_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Bid::try_from).transpose()
    }

    async fn list_bids_by_authors(
        &self,
        scope: &AuthorScope,
        page: Page,
    ) -> Result<Vec<Bid>, AppError> {
        let rows = sqlx::query_as::<_, BidRow>(&format!(
            r#"SELECT {} FROM bids
               WHERE (author_type = $1 AND author_id = $2)
                  OR (author_type = $3 AND author_id = ANY($4))
               ORDER BY name ASC
               LIMIT $5 OFFSET $6"#,
            BID_COLUMNS
        ))
        .bind(AuthorType::User.as_str())
        .bind(scope.user_id)
        .bind(AuthorType::Organization.as_str())
        .bind(&scope.organization_ids)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        bids_from_rows(rows)
    }

    async fn list_bids_for_tender(
        &self,
        tender_id: Uuid,
        page: Page,
    ) -> Result<Vec<Bid>, AppError> {
        let rows = sqlx::query_as::<_, BidRow>(&format!(
            r#"SELECT {} FROM bids WHERE tender_id = $1
               ORDER BY name ASC
               LIMIT $2 OFFSET $3"#,
            BID_COLUMNS
        ))
        .bind(tender_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        bids_from_rows(rows)
    }

    async fn set_bid_status(&self, id: Uuid, status: BidStatus) -> Result<Option<Bid>, AppError> {
        let row = sqlx::query_as::<_, BidRow>(&format!(
            "UPDATE bids SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            BID_COLUMNS
        ))
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Bid::try_from).transpose()
    }

    async fn edit_bid(&self, id: Uuid, patch: &BidPatch) -> Result<Bid, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut bid = Self::lock_bid(&mut tx, id).await?;

        let snapshot = apply_edit(&mut bid, patch, Utc::now());
        Self::write_bid_version(&mut tx, &bid, &snapshot).await?;

        tx.commit().await?;
        Ok(bid)
    }

    async fn rollback_bid(&self, id: Uuid, version: i32) -> Result<Bid, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut bid = Self::lock_bid(&mut tx, id).await?;

        let target: BidSnapshot = sqlx::query_as::<_, BidVersionRow>(
            r#"SELECT bid_id, version, name, description, created_at
               FROM bid_versions WHERE bid_id = $1 AND version = $2"#,
        )
        .bind(id)
        .bind(version)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| version_not_found(version))?
        .into();

        let snapshot = apply_rollback(&mut bid, &target, Utc::now())?;
        Self::write_bid_version(&mut tx, &bid, &snapshot).await?;

        tx.commit().await?;
        Ok(bid)
    }

    async fn bid_versions(&self, id: Uuid) -> Result<Vec<BidSnapshot>, AppError> {
        let rows = sqlx::query_as::<_, BidVersionRow>(
            r#"SELECT bid_id, version, name, description, created_at
               FROM bid_versions WHERE bid_id = $1 ORDER BY version ASC"#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let history: Vec<BidSnapshot> = rows.into_iter().map(BidSnapshot::from).collect();
        ensure_contiguous(id, &history)?;
        Ok(history)
    }

    async fn apply_decision(
        &self,
        bid_id: Uuid,
        decision: BidDecision,
    ) -> Result<(Bid, Tender), AppError> {
        let mut tx = self.pool.begin().await?;
        let mut bid = Self::lock_bid(&mut tx, bid_id).await?;
        let mut tender = Self::lock_tender(&mut tx, bid.tender_id).await?;

        let now = Utc::now();
        bid.status = decision.resulting_status();
        bid.updated_at = now;
        sqlx::query("UPDATE bids SET status = $1, updated_at = $2 WHERE id = $3")
            .bind(bid.status.as_str())
            .bind(now)
            .bind(bid.id)
            .execute(&mut *tx)
            .await?;

        if decision.closes_tender() {
            tender.status = TenderStatus::Closed;
            tender.updated_at = now;
            sqlx::query("UPDATE tenders SET status = $1, updated_at = $2 WHERE id = $3")
                .bind(tender.status.as_str())
                .bind(now)
                .bind(tender.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok((bid, tender))
    }

    async fn add_feedback(&self, feedback: &BidFeedback) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO bid_feedbacks (id, bid_id, feedback, created_at)
               VALUES ($1, $2, $3, $4)"#,
        )
        .bind(feedback.id)
        .bind(feedback.bid_id)
        .bind(&feedback.feedback)
        .bind(feedback.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn feedback_for_authors(
        &self,
        scope: &AuthorScope,
        page: Page,
    ) -> Result<Vec<BidFeedback>, AppError> {
        let rows = sqlx::query_as::<_, BidFeedbackRow>(
            r#"SELECT f.id, f.bid_id, f.feedback, f.created_at
               FROM bid_feedbacks f
               JOIN bids b ON f.bid_id = b.id
               WHERE (b.author_type = $1 AND b.author_id = $2)
                  OR (b.author_type = $3 AND b.author_id = ANY($4))
               ORDER BY f.created_at DESC
               LIMIT $5 OFFSET $6"#,
        )
        .bind(AuthorType::User.as_str())
        .bind(scope.user_id)
        .bind(AuthorType::Organization.as_str())
        .bind(&scope.organization_ids)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(BidFeedback::from).collect())
    }
}
