use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Lifecycle state of a tender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TenderStatus {
    Created,
    Published,
    Closed,
}

impl TenderStatus {
    pub const ALL: [TenderStatus; 3] = [Self::Created, Self::Published, Self::Closed];

    pub fn as_str(&self) -> &'static str {
        match self {
            TenderStatus::Created => "Created",
            TenderStatus::Published => "Published",
            TenderStatus::Closed => "Closed",
        }
    }
}

impl FromStr for TenderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::InvalidTenderStatus(s.to_string()))
    }
}

/// Lifecycle state of a bid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BidStatus {
    Created,
    Published,
    Canceled,
    Approved,
    Rejected,
}

impl BidStatus {
    pub const ALL: [BidStatus; 5] = [
        Self::Created,
        Self::Published,
        Self::Canceled,
        Self::Approved,
        Self::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BidStatus::Created => "Created",
            BidStatus::Published => "Published",
            BidStatus::Canceled => "Canceled",
            BidStatus::Approved => "Approved",
            BidStatus::Rejected => "Rejected",
        }
    }
}

impl FromStr for BidStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::InvalidBidStatus(s.to_string()))
    }
}

/// Kind of work a tender asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    Construction,
    Delivery,
    Manufacture,
}

impl ServiceType {
    pub const ALL: [ServiceType; 3] = [Self::Construction, Self::Delivery, Self::Manufacture];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Construction => "Construction",
            ServiceType::Delivery => "Delivery",
            ServiceType::Manufacture => "Manufacture",
        }
    }
}

impl FromStr for ServiceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CoreError::InvalidServiceType(s.to_string()))
    }
}

/// Outcome a tender owner hands down on a bid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BidDecision {
    Approved,
    Rejected,
}

impl BidDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            BidDecision::Approved => "Approved",
            BidDecision::Rejected => "Rejected",
        }
    }

    /// Bid status the decision moves the bid into
    pub fn resulting_status(&self) -> BidStatus {
        match self {
            BidDecision::Approved => BidStatus::Approved,
            BidDecision::Rejected => BidStatus::Rejected,
        }
    }

    /// Whether the decision also closes the parent tender
    pub fn closes_tender(&self) -> bool {
        matches!(self, BidDecision::Approved)
    }
}

impl FromStr for BidDecision {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Approved" => Ok(BidDecision::Approved),
            "Rejected" => Ok(BidDecision::Rejected),
            other => Err(CoreError::InvalidDecision(other.to_string())),
        }
    }
}

/// Who a bid was submitted on behalf of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AuthorType {
    #[default]
    Organization,
    User,
}

impl AuthorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorType::Organization => "Organization",
            AuthorType::User => "User",
        }
    }
}

impl FromStr for AuthorType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Organization" => Ok(AuthorType::Organization),
            "User" => Ok(AuthorType::User),
            other => Err(CoreError::InvalidAuthorType(other.to_string())),
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(TenderStatus, BidStatus, ServiceType, BidDecision, AuthorType);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tender_status_parse() {
        assert_eq!("Published".parse::<TenderStatus>(), Ok(TenderStatus::Published));
        assert_eq!(
            "published".parse::<TenderStatus>(),
            Err(CoreError::InvalidTenderStatus("published".to_string()))
        );
        for status in TenderStatus::ALL {
            assert_eq!(status.to_string().parse::<TenderStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_bid_status_parse() {
        assert_eq!("Canceled".parse::<BidStatus>(), Ok(BidStatus::Canceled));
        assert!("Closed".parse::<BidStatus>().is_err());
    }

    #[test]
    fn test_decision_effects() {
        let approved: BidDecision = "Approved".parse().unwrap();
        assert_eq!(approved.resulting_status(), BidStatus::Approved);
        assert!(approved.closes_tender());

        let rejected: BidDecision = "Rejected".parse().unwrap();
        assert_eq!(rejected.resulting_status(), BidStatus::Rejected);
        assert!(!rejected.closes_tender());

        assert!("Published".parse::<BidDecision>().is_err());
    }

    #[test]
    fn test_serde_uses_variant_names() {
        let json = serde_json::to_string(&ServiceType::Manufacture).unwrap();
        assert_eq!(json, "\"Manufacture\"");
        let back: AuthorType = serde_json::from_str("\"User\"").unwrap();
        assert_eq!(back, AuthorType::User);
    }
}
