use chrono::{DateTime, Utc};
use tenderhub_core::{Bid, BidFields, BidPatch, Tender, TenderFields, TenderPatch};
use uuid::Uuid;

use crate::record::{FieldPatch, Versioned};

impl FieldPatch<TenderFields> for TenderPatch {
    fn is_empty(&self) -> bool {
        TenderPatch::is_empty(self)
    }

    fn apply_to(&self, fields: &mut TenderFields) {
        self.apply(fields);
    }
}

impl Versioned for Tender {
    type Fields = TenderFields;
    type Patch = TenderPatch;

    fn record_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn fields(&self) -> TenderFields {
        Tender::fields(self)
    }

    fn restore(&mut self, fields: TenderFields) {
        self.set_fields(fields);
    }

    fn advance(&mut self, version: i32, now: DateTime<Utc>) {
        self.version = version;
        self.updated_at = now;
    }
}

impl FieldPatch<BidFields> for BidPatch {
    fn is_empty(&self) -> bool {
        BidPatch::is_empty(self)
    }

    fn apply_to(&self, fields: &mut BidFields) {
        self.apply(fields);
    }
}

impl Versioned for Bid {
    type Fields = BidFields;
    type Patch = BidPatch;

    fn record_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn fields(&self) -> BidFields {
        Bid::fields(self)
    }

    fn restore(&mut self, fields: BidFields) {
        self.set_fields(fields);
    }

    fn advance(&mut self, version: i32, now: DateTime<Utc>) {
        self.version = version;
        self.updated_at = now;
    }
}

/// Snapshot type stored for tenders
pub type TenderSnapshot = crate::Snapshot<TenderFields>;

/// Snapshot type stored for bids
pub type BidSnapshot = crate::Snapshot<BidFields>;
