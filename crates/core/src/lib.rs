//! Display models and pure normalization logic for the intranet homepage.
//!
//! Everything in this crate is free of network access: the client crates
//! fetch raw JSON and hand it here to be reconciled into stable records.

pub mod calendar;
pub mod carousel;
pub mod error;
pub mod list_item;
pub mod praise;
pub mod task;
pub mod types;
pub mod weather;
