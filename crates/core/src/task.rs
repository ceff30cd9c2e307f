//! Unified task model over the team board and the private to-do lists.
//!
//! Team tasks use a 0–10 priority directly; private tasks carry a
//! three-level importance that is mapped onto the same scale. Identifiers
//! are prefixed by source so a task can be routed back to its API from the
//! id alone.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use chrono::{NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::types::{parse_timestamp, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const TEAM_ID_PREFIX: &str = "PLANNER_";
pub const PRIVATE_ID_PREFIX: &str = "TODO_";

/// Pseudo-plan that groups every private task.
pub const PRIVATE_PLAN_ID: &str = "TODO_PRIVATE";
pub const PRIVATE_PLAN_NAME: &str = "My Tasks (Private)";

pub const PRIORITY_HIGH: u8 = 1;
pub const PRIORITY_NORMAL: u8 = 5;
pub const PRIORITY_LOW: u8 = 9;
pub const MAX_PRIORITY: u8 = 10;

/// Team priorities at or below this become `high` importance privately.
pub const HIGH_IMPORTANCE_CUTOFF: u8 = 3;

pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_NOT_STARTED: &str = "notStarted";

pub const UNTITLED_TASK: &str = "Untitled Task";

// ---------------------------------------------------------------------------
// Source routing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSource {
    Team,
    Private,
}

/// A unified id split back into its source and the id the source API knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRef<'a> {
    pub source: TaskSource,
    pub native_id: &'a str,
}

impl<'a> TaskRef<'a> {
    /// Split a unified id. Ids without a known prefix are rejected.
    pub fn parse(id: &'a str) -> Result<Self, CoreError> {
        if let Some(native_id) = id.strip_prefix(PRIVATE_ID_PREFIX) {
            Ok(Self { source: TaskSource::Private, native_id })
        } else if let Some(native_id) = id.strip_prefix(TEAM_ID_PREFIX) {
            Ok(Self { source: TaskSource::Team, native_id })
        } else {
            Err(CoreError::Validation(format!("Task id '{id}' has no source prefix")))
        }
    }
}

pub fn team_task_id(native_id: &str) -> String {
    format!("{TEAM_ID_PREFIX}{native_id}")
}

pub fn private_task_id(native_id: &str) -> String {
    format!("{PRIVATE_ID_PREFIX}{native_id}")
}

// ---------------------------------------------------------------------------
// Unified record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedTask {
    pub id: String,
    pub title: String,
    pub due_date_time: Option<String>,
    /// 0–10, lower is more urgent.
    pub priority: u8,
    pub percent_complete: u8,
    pub has_description: bool,
    pub assignments: Value,
    pub plan_id: String,
    pub bucket_id: String,
    pub created_date_time: Option<String>,
}

impl UnifiedTask {
    pub fn source(&self) -> TaskSource {
        if self.id.starts_with(PRIVATE_ID_PREFIX) {
            TaskSource::Private
        } else {
            TaskSource::Team
        }
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

/// Team board task as returned by the task-list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamTask {
    pub id: String,
    pub title: Option<String>,
    pub due_date_time: Option<String>,
    pub priority: Option<i64>,
    pub percent_complete: Option<i64>,
    pub has_description: bool,
    pub assignments: Value,
    pub plan_id: String,
    pub bucket_id: String,
    pub created_date_time: Option<String>,
    #[serde(rename = "@odata.etag")]
    pub etag: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DateTimeTimeZone {
    pub date_time: String,
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemBody {
    pub content: Option<String>,
    pub content_type: Option<String>,
}

/// Private to-do task.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrivateTask {
    pub id: String,
    pub title: Option<String>,
    pub due_date_time: Option<DateTimeTimeZone>,
    pub importance: Option<String>,
    pub status: Option<String>,
    pub body: Option<ItemBody>,
    pub created_date_time: Option<String>,
    #[serde(rename = "@odata.etag")]
    pub etag: Option<String>,
}

impl PrivateTask {
    pub fn is_completed(&self) -> bool {
        self.status.as_deref() == Some(STATUS_COMPLETED)
    }
}

/// A private to-do list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskList {
    pub id: String,
    pub display_name: String,
    pub wellknown_list_name: Option<String>,
}

/// The list new private tasks go into: the well-known default list, else
/// the first list.
pub fn default_list(lists: &[TaskList]) -> Option<&TaskList> {
    lists
        .iter()
        .find(|l| l.wellknown_list_name.as_deref() == Some("defaultList"))
        .or_else(|| lists.first())
}

// ---------------------------------------------------------------------------
// Priority mapping
// ---------------------------------------------------------------------------

/// Map private-list importance onto the team priority scale.
pub fn importance_to_priority(importance: Option<&str>) -> u8 {
    match importance {
        Some("high") => PRIORITY_HIGH,
        Some("low") => PRIORITY_LOW,
        _ => PRIORITY_NORMAL,
    }
}

/// Map a team priority onto private-list importance.
pub fn priority_to_importance(priority: u8) -> &'static str {
    if priority <= HIGH_IMPORTANCE_CUTOFF {
        "high"
    } else {
        "normal"
    }
}

/// Private tasks only know done / not done.
pub fn progress_to_status(percent: u8) -> &'static str {
    if percent >= 100 {
        STATUS_COMPLETED
    } else {
        STATUS_NOT_STARTED
    }
}

fn clamp_u8(value: Option<i64>, default: u8, max: u8) -> u8 {
    value
        .map(|v| v.clamp(0, i64::from(max)) as u8)
        .unwrap_or(default)
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

pub fn from_team(task: TeamTask) -> UnifiedTask {
    UnifiedTask {
        id: team_task_id(&task.id),
        title: task.title.filter(|t| !t.is_empty()).unwrap_or_else(|| UNTITLED_TASK.into()),
        due_date_time: task.due_date_time.filter(|d| !d.is_empty()),
        priority: clamp_u8(task.priority, PRIORITY_NORMAL, MAX_PRIORITY),
        percent_complete: clamp_u8(task.percent_complete, 0, 100),
        has_description: task.has_description,
        assignments: task.assignments,
        plan_id: task.plan_id,
        bucket_id: task.bucket_id,
        created_date_time: task.created_date_time,
    }
}

/// Map a private task from `list_id`. Completed tasks are dropped.
pub fn from_private(list_id: &str, task: PrivateTask) -> Option<UnifiedTask> {
    if task.is_completed() {
        return None;
    }
    let has_description = task
        .body
        .as_ref()
        .and_then(|b| b.content.as_deref())
        .is_some_and(|c| !c.trim().is_empty());

    Some(UnifiedTask {
        id: private_task_id(&task.id),
        title: task.title.filter(|t| !t.is_empty()).unwrap_or_else(|| UNTITLED_TASK.into()),
        due_date_time: task
            .due_date_time
            .map(|d| d.date_time)
            .filter(|d| !d.is_empty()),
        priority: importance_to_priority(task.importance.as_deref()),
        percent_complete: 0,
        has_description,
        assignments: Value::Object(Default::default()),
        plan_id: PRIVATE_PLAN_ID.into(),
        bucket_id: list_id.into(),
        created_date_time: task.created_date_time,
    })
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

fn due_key(task: &UnifiedTask) -> Option<Timestamp> {
    task.due_date_time.as_deref().and_then(parse_timestamp)
}

fn created_key(task: &UnifiedTask) -> Option<Timestamp> {
    task.created_date_time.as_deref().and_then(parse_timestamp)
}

/// Dated tasks first by ascending due date; undated tasks after, newest
/// created first. Undated tasks without a creation time go last.
pub fn compare_tasks(a: &UnifiedTask, b: &UnifiedTask) -> Ordering {
    match (due_key(a), due_key(b)) {
        (Some(da), Some(db)) => da.cmp(&db),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => created_key(b).cmp(&created_key(a)),
    }
}

/// Stable sort; ties keep fetch order.
pub fn sort_tasks(tasks: &mut [UnifiedTask]) {
    tasks.sort_by(compare_tasks);
}

/// Concatenate team then private tasks, drop repeated ids (first wins),
/// and sort.
pub fn merge_tasks(team: Vec<UnifiedTask>, private: Vec<UnifiedTask>) -> Vec<UnifiedTask> {
    let mut seen = HashSet::new();
    let mut merged: Vec<UnifiedTask> = team
        .into_iter()
        .chain(private)
        .filter(|t| seen.insert(t.id.clone()))
        .collect();
    sort_tasks(&mut merged);
    merged
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// Merged task view plus the plan-id → display-name side mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskBoard {
    pub tasks: Vec<UnifiedTask>,
    pub plans: BTreeMap<String, String>,
}

impl TaskBoard {
    /// An empty board still lists the private pseudo-plan.
    pub fn new(tasks: Vec<UnifiedTask>, mut plans: BTreeMap<String, String>) -> Self {
        plans.insert(PRIVATE_PLAN_ID.into(), PRIVATE_PLAN_NAME.into());
        Self { tasks, plans }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), BTreeMap::new())
    }

    pub fn plan_name(&self, plan_id: &str) -> Option<&str> {
        self.plans.get(plan_id).map(String::as_str)
    }

    pub fn find(&self, id: &str) -> Option<&UnifiedTask> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Tasks whose title or plan name contains `query`, ignoring case. A
    /// blank query matches everything.
    pub fn search(&self, query: &str) -> Vec<&UnifiedTask> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.tasks.iter().collect();
        }
        self.tasks
            .iter()
            .filter(|t| {
                t.title.to_lowercase().contains(&query)
                    || self
                        .plan_name(&t.plan_id)
                        .is_some_and(|p| p.to_lowercase().contains(&query))
            })
            .collect()
    }
}

pub fn priority_label(priority: u8) -> &'static str {
    if priority <= HIGH_IMPORTANCE_CUTOFF {
        "High"
    } else {
        "Normal"
    }
}

pub fn progress_label(percent: u8) -> &'static str {
    match percent {
        100.. => "Completed",
        1..=99 => "In Progress",
        0 => "Not Started",
    }
}

/// Distinct plan ids in first-seen order.
pub fn distinct_plan_ids(tasks: &[TeamTask]) -> Vec<String> {
    let mut seen = HashSet::new();
    tasks
        .iter()
        .filter(|t| !t.plan_id.is_empty() && seen.insert(t.plan_id.as_str()))
        .map(|t| t.plan_id.clone())
        .collect()
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// Input for creating a task on either source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    /// A team plan id, or [`PRIVATE_PLAN_ID`].
    pub plan_id: String,
    pub due_date: Option<NaiveDate>,
    pub priority: u8,
    pub progress: u8,
    pub description: Option<String>,
}

impl NewTask {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.title.trim().is_empty() {
            return Err(CoreError::Validation("Task title is required".into()));
        }
        if self.plan_id.trim().is_empty() {
            return Err(CoreError::Validation("A plan must be selected".into()));
        }
        if self.priority > MAX_PRIORITY {
            return Err(CoreError::Validation(format!(
                "Priority must be between 0 and {MAX_PRIORITY}, got {}",
                self.priority
            )));
        }
        validate_progress(self.progress)
    }

    pub fn is_private(&self) -> bool {
        self.plan_id == PRIVATE_PLAN_ID
    }

    /// Due date as midnight UTC in RFC 3339.
    pub fn due_timestamp(&self) -> Option<String> {
        self.due_date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| Utc.from_utc_datetime(&naive).to_rfc3339())
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().map(str::trim).filter(|d| !d.is_empty())
    }
}

pub fn validate_progress(percent: u8) -> Result<(), CoreError> {
    if percent > 100 {
        return Err(CoreError::Validation(format!(
            "Progress must be between 0 and 100, got {percent}"
        )));
    }
    Ok(())
}

/// What the task detail view shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetails {
    pub id: String,
    pub title: String,
    pub description: String,
    pub percent_complete: u8,
    pub due_date_time: Option<String>,
    /// Concurrency token required when updating a team task.
    pub etag: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
