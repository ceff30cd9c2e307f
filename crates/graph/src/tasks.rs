//! Task board aggregation over team plans and private to-do lists.

use std::collections::BTreeMap;

use futures::future::join_all;
use homepage_core::task::{
    distinct_plan_ids, from_private, from_team, merge_tasks, PrivateTask, TaskBoard, TaskList,
    TeamTask, UnifiedTask,
};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::api::{get_as, get_collection, ApiVersion, GraphApi, GraphError};
use crate::odata::ODataQuery;

pub const TEAM_TASK_FIELDS: &str =
    "id,title,dueDateTime,priority,percentComplete,hasDescription,assignments,planId,bucketId,createdDateTime";
pub const MAX_TEAM_TASKS: u32 = 100;
pub const MAX_TASKS_PER_LIST: u32 = 50;

#[derive(Debug, Deserialize)]
struct Plan {
    id: String,
    #[serde(default)]
    title: String,
}

/// Fetch both sources and merge them.
///
/// The two sources fail independently: a failed source contributes no
/// tasks, and so does a failed plan-name lookup or to-do list. A cancelled
/// aggregation returns an empty board.
pub async fn aggregate<G>(api: &G, cancel: &CancellationToken) -> TaskBoard
where
    G: GraphApi + ?Sized,
{
    let (team, private) = tokio::join!(fetch_team_board(api), fetch_private_tasks(api));
    let (team, plans) = team;

    if cancel.is_cancelled() {
        return TaskBoard::empty();
    }

    let board = TaskBoard::new(merge_tasks(team, private), plans);
    tracing::info!(tasks = board.tasks.len(), plans = board.plans.len(), "Aggregated task board");
    board
}

/// Team tasks plus the names of the plans they belong to.
async fn fetch_team_board<G>(api: &G) -> (Vec<UnifiedTask>, BTreeMap<String, String>)
where
    G: GraphApi + ?Sized,
{
    let path = ODataQuery::new()
        .select(TEAM_TASK_FIELDS)
        .top(MAX_TEAM_TASKS)
        .apply("/me/planner/tasks");

    let raw: Vec<TeamTask> = match get_collection(api, ApiVersion::V1, &path).await {
        Ok(tasks) => tasks,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch team tasks");
            return (Vec::new(), BTreeMap::new());
        }
    };

    let plans = fetch_plan_names(api, &distinct_plan_ids(&raw)).await;
    (raw.into_iter().map(from_team).collect(), plans)
}

/// Plan id → display name for every plan that could be looked up.
pub async fn fetch_plan_names<G>(api: &G, plan_ids: &[String]) -> BTreeMap<String, String>
where
    G: GraphApi + ?Sized,
{
    let lookups = plan_ids.iter().map(|plan_id| async move {
        let path = ODataQuery::new()
            .select("id,title")
            .apply(&format!("/planner/plans/{plan_id}"));
        match get_as::<_, Plan>(api, &path).await {
            Ok(plan) => Some((plan.id, plan.title)),
            Err(e) => {
                tracing::warn!(plan_id = %plan_id, error = %e, "Failed to fetch plan name");
                None
            }
        }
    });

    join_all(lookups).await.into_iter().flatten().collect()
}

/// The signed-in user's to-do lists.
pub async fn fetch_task_lists<G>(api: &G) -> Result<Vec<TaskList>, GraphError>
where
    G: GraphApi + ?Sized,
{
    get_collection(api, ApiVersion::V1, "/me/todo/lists").await
}

/// Open tasks across every to-do list, in list order.
async fn fetch_private_tasks<G>(api: &G) -> Vec<UnifiedTask>
where
    G: GraphApi + ?Sized,
{
    let lists = match fetch_task_lists(api).await {
        Ok(lists) => lists,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch to-do lists");
            return Vec::new();
        }
    };

    let per_list = lists.iter().map(|list| async move {
        let path = ODataQuery::new()
            .top(MAX_TASKS_PER_LIST)
            .apply(&format!("/me/todo/lists/{}/tasks", list.id));
        match get_collection::<_, PrivateTask>(api, ApiVersion::V1, &path).await {
            Ok(tasks) => {
                tracing::debug!(list = %list.display_name, count = tasks.len(), "Fetched to-do tasks");
                tasks
                    .into_iter()
                    .filter_map(|t| from_private(&list.id, t))
                    .collect::<Vec<_>>()
            }
            Err(e) => {
                tracing::warn!(list_id = %list.id, error = %e, "Failed to fetch to-do list tasks");
                Vec::new()
            }
        }
    });

    join_all(per_list).await.into_iter().flatten().collect()
}
