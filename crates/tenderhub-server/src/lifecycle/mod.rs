//! Tender and bid operations.
//!
//! Each operation resolves the acting user, loads the target record, checks
//! the caller's authority over it and only then validates the request
//! payload. The first failing check ends the operation before anything is
//! written.

pub mod access;
pub mod bids;
pub mod tenders;
