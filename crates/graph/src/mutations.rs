//! Task writes. Each successful write re-runs the full aggregation and
//! returns the fresh board.

use homepage_core::error::CoreError;
use homepage_core::task::{
    default_list, priority_to_importance, private_task_id, progress_to_status, team_task_id,
    validate_progress, NewTask, PrivateTask, TaskBoard, TaskDetails, TaskRef, TaskSource, TeamTask,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::api::{get_as, get_collection, ApiVersion, GraphApi, GraphError};
use crate::tasks::{aggregate, fetch_task_lists};

#[derive(Debug, Deserialize)]
struct Bucket {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TeamTaskDetails {
    description: Option<String>,
    #[serde(rename = "@odata.etag")]
    etag: Option<String>,
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Create a task on the source `new.plan_id` selects, then re-aggregate.
pub async fn create_task<G>(
    api: &G,
    new: &NewTask,
    cancel: &CancellationToken,
) -> Result<TaskBoard, GraphError>
where
    G: GraphApi + ?Sized,
{
    new.validate()?;

    if new.is_private() {
        create_private_task(api, new).await?;
    } else {
        create_team_task(api, new).await?;
    }

    Ok(aggregate(api, cancel).await)
}

/// Request body for a new private task.
pub fn private_task_body(new: &NewTask) -> Value {
    let mut body = json!({
        "title": new.title.trim(),
        "importance": priority_to_importance(new.priority),
    });
    if let Some(due) = new.due_timestamp() {
        body["dueDateTime"] = json!({ "dateTime": due, "timeZone": "UTC" });
    }
    if let Some(description) = new.description() {
        body["body"] = json!({ "content": description, "contentType": "text" });
    }
    body
}

/// Request body for a new team task.
pub fn team_task_body(new: &NewTask, bucket_id: &str) -> Value {
    let mut body = json!({
        "planId": new.plan_id,
        "bucketId": bucket_id,
        "title": new.title.trim(),
        "priority": new.priority,
    });
    if let Some(due) = new.due_timestamp() {
        body["dueDateTime"] = json!(due);
    }
    body
}

async fn create_private_task<G>(api: &G, new: &NewTask) -> Result<(), GraphError>
where
    G: GraphApi + ?Sized,
{
    let lists = fetch_task_lists(api).await?;
    let list = default_list(&lists).ok_or_else(|| CoreError::NotFound {
        entity: "to-do list",
        id: "default".into(),
    })?;

    api.post(&format!("/me/todo/lists/{}/tasks", list.id), &private_task_body(new))
        .await?;
    tracing::info!(list_id = %list.id, "Created private task");
    Ok(())
}

async fn create_team_task<G>(api: &G, new: &NewTask) -> Result<(), GraphError>
where
    G: GraphApi + ?Sized,
{
    let buckets: Vec<Bucket> =
        get_collection(api, ApiVersion::V1, &format!("/planner/plans/{}/buckets", new.plan_id)).await?;
    let bucket = buckets.first().ok_or_else(|| CoreError::NotFound {
        entity: "bucket",
        id: new.plan_id.clone(),
    })?;

    let created: TeamTask =
        serde_json::from_value(api.post("/planner/tasks", &team_task_body(new, &bucket.id)).await?)?;
    tracing::info!(plan_id = %new.plan_id, task_id = %created.id, "Created team task");

    if created.id.is_empty() {
        return Ok(());
    }

    // Follow-up patches are best-effort; the task already exists.
    if new.progress > 0 {
        let result = api
            .patch(
                &format!("/planner/tasks/{}", created.id),
                &json!({ "percentComplete": new.progress }),
                created.etag.as_deref(),
            )
            .await;
        if let Err(e) = result {
            tracing::warn!(task_id = %created.id, error = %e, "Could not set initial progress");
        }
    }

    if let Some(description) = new.description() {
        if let Err(e) = set_team_description(api, &created.id, description).await {
            tracing::warn!(task_id = %created.id, error = %e, "Could not set task description");
        }
    }

    Ok(())
}

async fn set_team_description<G>(api: &G, task_id: &str, description: &str) -> Result<(), GraphError>
where
    G: GraphApi + ?Sized,
{
    let path = format!("/planner/tasks/{task_id}/details");
    let details: TeamTaskDetails = get_as(api, &path).await?;
    api.patch(&path, &json!({ "description": description }), details.etag.as_deref())
        .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Set a task's progress, then re-aggregate.
///
/// Private tasks only know done / not done, so anything below 100 marks
/// them not started. Team tasks need the concurrency token read with the
/// task.
pub async fn update_task_progress<G>(
    api: &G,
    task_id: &str,
    percent: u8,
    etag: Option<&str>,
    cancel: &CancellationToken,
) -> Result<TaskBoard, GraphError>
where
    G: GraphApi + ?Sized,
{
    validate_progress(percent)?;
    let target = TaskRef::parse(task_id)?;

    match target.source {
        TaskSource::Private => {
            let body = json!({ "status": progress_to_status(percent) });
            let lists = fetch_task_lists(api).await?;
            let mut updated = false;
            for list in &lists {
                let path = format!("/me/todo/lists/{}/tasks/{}", list.id, target.native_id);
                match api.patch(&path, &body, None).await {
                    Ok(_) => {
                        updated = true;
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(list_id = %list.id, error = %e, "Task not in list");
                    }
                }
            }
            if !updated {
                return Err(CoreError::NotFound { entity: "task", id: task_id.to_string() }.into());
            }
        }
        TaskSource::Team => {
            let etag = etag.filter(|e| !e.is_empty()).ok_or_else(|| {
                CoreError::Validation("Updating a team task requires its concurrency token".into())
            })?;
            api.patch(
                &format!("/planner/tasks/{}", target.native_id),
                &json!({ "percentComplete": percent }),
                Some(etag),
            )
            .await?;
        }
    }

    tracing::info!(task_id = %task_id, percent, "Updated task progress");
    Ok(aggregate(api, cancel).await)
}

// ---------------------------------------------------------------------------
// Details
// ---------------------------------------------------------------------------

/// Everything the detail view shows for one task.
pub async fn get_task_details<G>(api: &G, task_id: &str) -> Result<TaskDetails, GraphError>
where
    G: GraphApi + ?Sized,
{
    let target = TaskRef::parse(task_id)?;
    match target.source {
        TaskSource::Private => private_details(api, task_id, target.native_id).await,
        TaskSource::Team => team_details(api, target.native_id).await,
    }
}

async fn private_details<G>(api: &G, task_id: &str, native_id: &str) -> Result<TaskDetails, GraphError>
where
    G: GraphApi + ?Sized,
{
    for list in fetch_task_lists(api).await? {
        let path = format!("/me/todo/lists/{}/tasks/{native_id}", list.id);
        let task: PrivateTask = match get_as(api, &path).await {
            Ok(task) => task,
            Err(e) => {
                tracing::debug!(list_id = %list.id, error = %e, "Task not in list");
                continue;
            }
        };
        return Ok(TaskDetails {
            id: private_task_id(&task.id),
            title: task.title.clone().unwrap_or_default(),
            description: task
                .body
                .as_ref()
                .and_then(|b| b.content.clone())
                .unwrap_or_default(),
            percent_complete: if task.is_completed() { 100 } else { 0 },
            due_date_time: task.due_date_time.as_ref().map(|d| d.date_time.clone()),
            etag: task.etag.clone(),
        });
    }
    Err(CoreError::NotFound { entity: "task", id: task_id.to_string() }.into())
}

async fn team_details<G>(api: &G, native_id: &str) -> Result<TaskDetails, GraphError>
where
    G: GraphApi + ?Sized,
{
    let task_path = format!("/planner/tasks/{native_id}");
    let details_path = format!("{task_path}/details");
    let (task, details) = tokio::join!(
        get_as::<_, TeamTask>(api, &task_path),
        get_as::<_, TeamTaskDetails>(api, &details_path),
    );
    let task = task?;
    let details = details?;

    Ok(TaskDetails {
        id: team_task_id(&task.id),
        title: task.title.unwrap_or_default(),
        description: details.description.unwrap_or_default(),
        percent_complete: task.percent_complete.map(|p| p.clamp(0, 100) as u8).unwrap_or(0),
        due_date_time: task.due_date_time,
        etag: task.etag,
    })
}
