//! Microsoft Graph pipelines: the unified task board, task mutations, the
//! praise feed, and month calendar events.
//!
//! Every read pipeline returns a plain value and absorbs failures (logged
//! at `warn`). Mutations return [`GraphError`] so the host can report them.

pub mod api;
pub mod calendar;
pub mod mutations;
pub mod odata;
pub mod praise;
pub mod tasks;

pub use api::{ApiVersion, GraphApi, GraphClient, GraphError};
pub use calendar::fetch_month_events;
pub use mutations::{create_task, get_task_details, update_task_progress};
pub use praise::fetch_praises;
pub use tasks::aggregate;
