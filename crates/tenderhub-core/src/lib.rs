pub mod bid;
pub mod error;
pub mod organization;
pub mod pagination;
pub mod status;
pub mod tender;

pub use bid::{check_feedback, Bid, BidFeedback, BidFields, BidPatch, NewBid, MAX_FEEDBACK_LEN};
pub use error::CoreError;
pub use organization::{Organization, OrganizationResponsible, OrganizationType, User};
pub use pagination::Page;
pub use status::{AuthorType, BidDecision, BidStatus, ServiceType, TenderStatus};
pub use tender::{NewTender, Tender, TenderFields, TenderPatch};
