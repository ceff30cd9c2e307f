//! SharePoint list access for the homepage carousel.
//!
//! [`api::SharePointApi`] talks to the site REST endpoints; the
//! [`carousel`] pipeline turns a card configuration into at most two
//! normalized items, and [`discovery`] lists the lists and columns a card
//! can be pointed at.

pub mod api;
pub mod carousel;
pub mod discovery;

pub use api::{ListSource, SharePointApi, SharePointError};
pub use carousel::{fetch_all_cards, fetch_carousel_items};
