use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::CoreError;
use crate::status::{AuthorType, BidStatus};

/// A proposal submitted against a tender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: BidStatus,
    pub tender_id: Uuid,
    pub author_type: AuthorType,
    /// Organization id or user id, depending on `author_type`
    pub author_id: Uuid,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The versioned content of a bid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidFields {
    pub name: String,
    pub description: String,
}

/// Request body for submitting a bid
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewBid {
    #[validate(length(min = 1, max = 100, message = "name must be 1 to 100 characters"))]
    pub name: String,
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: String,
    #[serde(default)]
    pub status: Option<BidStatus>,
    pub tender_id: Uuid,
    #[serde(default)]
    pub author_type: AuthorType,
    /// Required when the bid is submitted on behalf of an organization
    #[serde(default)]
    pub organization_id: Option<Uuid>,
    pub creator_username: String,
}

/// Partial update of a bid's versioned fields
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BidPatch {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "name must be 1 to 100 characters"))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: Option<String>,
}

/// Append-only reviewer note attached to a bid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidFeedback {
    pub id: Uuid,
    pub bid_id: Uuid,
    pub feedback: String,
    pub created_at: DateTime<Utc>,
}

pub const MAX_FEEDBACK_LEN: usize = 1000;

impl Bid {
    /// Build a fresh bid at version 1 authored by `author_id`
    pub fn new(input: &NewBid, author_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            description: input.description.clone(),
            status: input.status.unwrap_or(BidStatus::Created),
            tender_id: input.tender_id,
            author_type: input.author_type,
            author_id,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn fields(&self) -> BidFields {
        BidFields {
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }

    pub fn set_fields(&mut self, fields: BidFields) {
        self.name = fields.name;
        self.description = fields.description;
    }
}

impl NewBid {
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()?;
        if self.author_type == AuthorType::Organization && self.organization_id.is_none() {
            return Err(CoreError::Validation(
                "organizationId is required for organization bids".to_string(),
            ));
        }
        Ok(())
    }
}

impl BidPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }

    pub fn check(&self) -> Result<(), CoreError> {
        if self.is_empty() {
            return Err(CoreError::EmptyPatch);
        }
        self.validate()?;
        Ok(())
    }

    pub fn apply(&self, fields: &mut BidFields) {
        if let Some(name) = &self.name {
            fields.name = name.clone();
        }
        if let Some(description) = &self.description {
            fields.description = description.clone();
        }
    }
}

impl BidFeedback {
    pub fn new(bid_id: Uuid, feedback: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            bid_id,
            feedback: feedback.into(),
            created_at: now,
        }
    }
}

/// Feedback text must be non-blank and within the column limit
pub fn check_feedback(text: &str) -> Result<(), CoreError> {
    if text.trim().is_empty() {
        return Err(CoreError::Validation("feedback must not be empty".to_string()));
    }
    if text.chars().count() > MAX_FEEDBACK_LEN {
        return Err(CoreError::Validation(format!(
            "feedback must be at most {} characters",
            MAX_FEEDBACK_LEN
        )));
    }
    Ok(())
}
