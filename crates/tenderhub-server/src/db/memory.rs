use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tenderhub_core::{
    AuthorType, Bid, BidDecision, BidFeedback, BidFields, BidPatch, BidStatus, Organization,
    OrganizationResponsible, Page, ServiceType, Tender, TenderFields, TenderPatch, TenderStatus,
    User,
};
use tenderhub_history::{
    apply_edit, apply_rollback, initial_snapshot, BidSnapshot, TenderSnapshot, VersionLog,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{bid_not_found, tender_not_found, version_not_found, AuthorScope, Store};
use crate::error::AppError;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    organizations: HashMap<Uuid, Organization>,
    responsibles: HashSet<OrganizationResponsible>,
    tenders: HashMap<Uuid, Tender>,
    tender_versions: HashMap<Uuid, VersionLog<TenderFields>>,
    bids: HashMap<Uuid, Bid>,
    bid_versions: HashMap<Uuid, VersionLog<BidFields>>,
    feedback: Vec<BidFeedback>,
}

/// Users, organizations and memberships to preload into a [`MemoryStore`]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seed {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub organizations: Vec<Organization>,
    #[serde(default)]
    pub responsibles: Vec<OrganizationResponsible>,
}

/// Process-local store.
///
/// All tables sit behind one lock, so every write (record plus snapshot, or
/// bid plus tender) happens in a single critical section.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a seed file
    pub async fn from_seed_file(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        let seed: Seed = serde_json::from_str(&raw)?;
        let store = Self::new();
        store.load(seed).await;
        Ok(store)
    }

    pub async fn load(&self, seed: Seed) {
        let mut tables = self.tables.write().await;
        for user in seed.users {
            tables.users.insert(user.id, user);
        }
        for org in seed.organizations {
            tables.organizations.insert(org.id, org);
        }
        tables.responsibles.extend(seed.responsibles);
    }

    pub async fn add_user(&self, username: &str) -> User {
        let user = User::new(username);
        self.tables
            .write()
            .await
            .users
            .insert(user.id, user.clone());
        user
    }

    pub async fn add_organization(&self, name: &str) -> Organization {
        let org = Organization::new(name, None);
        self.tables
            .write()
            .await
            .organizations
            .insert(org.id, org.clone());
        org
    }

    pub async fn add_responsible(&self, organization_id: Uuid, user_id: Uuid) {
        self.tables
            .write()
            .await
            .responsibles
            .insert(OrganizationResponsible {
                organization_id,
                user_id,
            });
    }

    /// Number of snapshots kept for a tender
    pub async fn tender_version_count(&self, id: Uuid) -> usize {
        self.tables
            .read()
            .await
            .tender_versions
            .get(&id)
            .map_or(0, |log| log.len())
    }

    /// Number of snapshots kept for a bid
    pub async fn bid_version_count(&self, id: Uuid) -> usize {
        self.tables
            .read()
            .await
            .bid_versions
            .get(&id)
            .map_or(0, |log| log.len())
    }
}

fn in_scope(bid: &Bid, scope: &AuthorScope) -> bool {
    match bid.author_type {
        AuthorType::User => bid.author_id == scope.user_id,
        AuthorType::Organization => scope.organization_ids.contains(&bid.author_id),
    }
}

fn sorted_by_name<T>(mut items: Vec<T>, name: impl Fn(&T) -> &str) -> Vec<T> {
    items.sort_by(|a, b| name(a).cmp(name(b)));
    items
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn is_responsible(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> Result<bool, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.responsibles.contains(&OrganizationResponsible {
            organization_id,
            user_id,
        }))
    }

    async fn organizations_of(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .responsibles
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.organization_id)
            .collect())
    }

    async fn create_tender(&self, tender: &Tender) -> Result<(), AppError> {
        let log = VersionLog::start(initial_snapshot(tender, tender.created_at))?;
        let mut tables = self.tables.write().await;
        tables.tender_versions.insert(tender.id, log);
        tables.tenders.insert(tender.id, tender.clone());
        Ok(())
    }

    async fn get_tender(&self, id: Uuid) -> Result<Option<Tender>, AppError> {
        Ok(self.tables.read().await.tenders.get(&id).cloned())
    }

    async fn list_published_tenders(
        &self,
        service_types: &[ServiceType],
        page: Page,
    ) -> Result<Vec<Tender>, AppError> {
        let tables = self.tables.read().await;
        let matching: Vec<Tender> = tables
            .tenders
            .values()
            .filter(|t| t.status == TenderStatus::Published)
            .filter(|t| service_types.is_empty() || service_types.contains(&t.service_type))
            .cloned()
            .collect();
        Ok(page.apply(sorted_by_name(matching, |t| t.name.as_str())))
    }

    async fn list_tenders_of_organizations(
        &self,
        organization_ids: &[Uuid],
        page: Page,
    ) -> Result<Vec<Tender>, AppError> {
        let tables = self.tables.read().await;
        let matching: Vec<Tender> = tables
            .tenders
            .values()
            .filter(|t| organization_ids.contains(&t.organization_id))
            .cloned()
            .collect();
        Ok(page.apply(sorted_by_name(matching, |t| t.name.as_str())))
    }

    async fn set_tender_status(
        &self,
        id: Uuid,
        status: TenderStatus,
    ) -> Result<Option<Tender>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.tenders.get_mut(&id).map(|tender| {
            tender.status = status;
            tender.updated_at = Utc::now();
            tender.clone()
        }))
    }

    async fn edit_tender(&self, id: Uuid, patch: &TenderPatch) -> Result<Tender, AppError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        let mut tender = tables.tenders.get(&id).cloned().ok_or_else(|| tender_not_found(id))?;
        let log = tables
            .tender_versions
            .get_mut(&id)
            .ok_or_else(|| AppError::Internal(format!("tender {} has no history", id)))?;

        let snapshot = apply_edit(&mut tender, patch, Utc::now());
        log.append(snapshot)?;
        tables.tenders.insert(id, tender.clone());
        Ok(tender)
    }

    async fn rollback_tender(&self, id: Uuid, version: i32) -> Result<Tender, AppError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        let mut tender = tables.tenders.get(&id).cloned().ok_or_else(|| tender_not_found(id))?;
        let log = tables
            .tender_versions
            .get_mut(&id)
            .ok_or_else(|| AppError::Internal(format!("tender {} has no history", id)))?;
        let target = log
            .get(version)
            .cloned()
            .ok_or_else(|| version_not_found(version))?;

        let snapshot = apply_rollback(&mut tender, &target, Utc::now())?;
        log.append(snapshot)?;
        tables.tenders.insert(id, tender.clone());
        Ok(tender)
    }

    async fn tender_versions(&self, id: Uuid) -> Result<Vec<TenderSnapshot>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tender_versions
            .get(&id)
            .map(|log| log.to_vec())
            .unwrap_or_default())
    }

    async fn create_bid(&self, bid: &Bid) -> Result<(), AppError> {
        let log = VersionLog::start(initial_snapshot(bid, bid.created_at))?;
        let mut tables = self.tables.write().await;
        tables.bid_versions.insert(bid.id, log);
        tables.bids.insert(bid.id, bid.clone());
        Ok(())
    }

    async fn get_bid(&self, id: Uuid) -> Result<Option<Bid>, AppError> {
        Ok(self.tables.read().await.bids.get(&id).cloned())
    }

    async fn list_bids_by_authors(
        &self,
        scope: &AuthorScope,
        page: Page,
    ) -> Result<Vec<Bid>, AppError> {
        let tables = self.tables.read().await;
        let matching: Vec<Bid> = tables
            .bids
            .values()
            .filter(|b| in_scope(b, scope))
            .cloned()
            .collect();
        Ok(page.apply(sorted_by_name(matching, |b| b.name.as_str())))
    }

    async fn list_bids_for_tender(
        &self,
        tender_id: Uuid,
        page: Page,
    ) -> Result<Vec<Bid>, AppError> {
        let tables = self.tables.read().await;
        let matching: Vec<Bid> = tables
            .bids
            .values()
            .filter(|b| b.tender_id == tender_id)
            .cloned()
            .collect();
        Ok(page.apply(sorted_by_name(matching, |b| b.name.as_str())))
    }

    async fn set_bid_status(&self, id: Uuid, status: BidStatus) -> Result<Option<Bid>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.bids.get_mut(&id).map(|bid| {
            bid.status = status;
            bid.updated_at = Utc::now();
            bid.clone()
        }))
    }

    async fn edit_bid(&self, id: Uuid, patch: &BidPatch) -> Result<Bid, AppError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        let mut bid = tables.bids.get(&id).cloned().ok_or_else(|| bid_not_found(id))?;
        let log = tables
            .bid_versions
            .get_mut(&id)
            .ok_or_else(|| AppError::Internal(format!("bid {} has no history", id)))?;

        let snapshot = apply_edit(&mut bid, patch, Utc::now());
        log.append(snapshot)?;
        tables.bids.insert(id, bid.clone());
        Ok(bid)
    }

    async fn rollback_bid(&self, id: Uuid, version: i32) -> Result<Bid, AppError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        let mut bid = tables.bids.get(&id).cloned().ok_or_else(|| bid_not_found(id))?;
        let log = tables
            .bid_versions
            .get_mut(&id)
            .ok_or_else(|| AppError::Internal(format!("bid {} has no history", id)))?;
        let target = log
            .get(version)
            .cloned()
            .ok_or_else(|| version_not_found(version))?;

        let snapshot = apply_rollback(&mut bid, &target, Utc::now())?;
        log.append(snapshot)?;
        tables.bids.insert(id, bid.clone());
        Ok(bid)
    }

    async fn bid_versions(&self, id: Uuid) -> Result<Vec<BidSnapshot>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .bid_versions
            .get(&id)
            .map(|log| log.to_vec())
            .unwrap_or_default())
    }

    async fn apply_decision(
        &self,
        bid_id: Uuid,
        decision: BidDecision,
    ) -> Result<(Bid, Tender), AppError> {
        let mut tables = self.tables.write().await;
        let mut bid = tables
            .bids
            .get(&bid_id)
            .cloned()
            .ok_or_else(|| bid_not_found(bid_id))?;
        let mut tender = tables
            .tenders
            .get(&bid.tender_id)
            .cloned()
            .ok_or_else(|| tender_not_found(bid.tender_id))?;

        let now = Utc::now();
        bid.status = decision.resulting_status();
        bid.updated_at = now;
        if decision.closes_tender() {
            tender.status = TenderStatus::Closed;
            tender.updated_at = now;
            tables.tenders.insert(tender.id, tender.clone());
        }
        tables.bids.insert(bid.id, bid.clone());
        Ok((bid, tender))
    }

    async fn add_feedback(&self, feedback: &BidFeedback) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if !tables.bids.contains_key(&feedback.bid_id) {
            return Err(bid_not_found(feedback.bid_id));
        }
        tables.feedback.push(feedback.clone());
        Ok(())
    }

    async fn feedback_for_authors(
        &self,
        scope: &AuthorScope,
        page: Page,
    ) -> Result<Vec<BidFeedback>, AppError> {
        let tables = self.tables.read().await;
        let mut matching: Vec<BidFeedback> = tables
            .feedback
            .iter()
            .filter(|f| {
                tables
                    .bids
                    .get(&f.bid_id)
                    .is_some_and(|bid| in_scope(bid, scope))
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page.apply(matching))
    }
}
