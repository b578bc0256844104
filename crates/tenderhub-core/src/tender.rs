use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::CoreError;
use crate::status::{ServiceType, TenderStatus};

/// A request for work published by an organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tender {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub service_type: ServiceType,
    pub status: TenderStatus,
    pub organization_id: Uuid,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The versioned content of a tender
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenderFields {
    pub name: String,
    pub description: String,
    pub service_type: ServiceType,
}

/// Request body for publishing a new tender
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTender {
    #[validate(length(min = 1, max = 100, message = "name must be 1 to 100 characters"))]
    pub name: String,
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: String,
    pub service_type: ServiceType,
    #[serde(default)]
    pub status: Option<TenderStatus>,
    pub organization_id: Uuid,
    pub creator_username: String,
}

/// Partial update of a tender's versioned fields; absent fields stay as they are
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TenderPatch {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "name must be 1 to 100 characters"))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: Option<String>,
    #[serde(default)]
    pub service_type: Option<ServiceType>,
}

impl Tender {
    /// Build a fresh tender at version 1
    pub fn new(input: &NewTender, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            description: input.description.clone(),
            service_type: input.service_type,
            status: input.status.unwrap_or(TenderStatus::Created),
            organization_id: input.organization_id,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn fields(&self) -> TenderFields {
        TenderFields {
            name: self.name.clone(),
            description: self.description.clone(),
            service_type: self.service_type,
        }
    }

    pub fn set_fields(&mut self, fields: TenderFields) {
        self.name = fields.name;
        self.description = fields.description;
        self.service_type = fields.service_type;
    }
}

impl NewTender {
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()?;
        Ok(())
    }
}

impl TenderPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.service_type.is_none()
    }

    /// Reject empty patches and out-of-range field values
    pub fn check(&self) -> Result<(), CoreError> {
        if self.is_empty() {
            return Err(CoreError::EmptyPatch);
        }
        self.validate()?;
        Ok(())
    }

    pub fn apply(&self, fields: &mut TenderFields) {
        if let Some(name) = &self.name {
            fields.name = name.clone();
        }
        if let Some(description) = &self.description {
            fields.description = description.clone();
        }
        if let Some(service_type) = self.service_type {
            fields.service_type = service_type;
        }
    }
}
