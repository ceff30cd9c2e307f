//! Integration tests for task aggregation and task mutations.

mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use common::{FakeGraph, Method};
use homepage_core::error::CoreError;
use homepage_core::task::{NewTask, PRIVATE_PLAN_ID, PRIVATE_PLAN_NAME};
use homepage_graph::{aggregate, create_task, get_task_details, update_task_progress, GraphError};
use serde_json::json;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn with_board(graph: FakeGraph) -> FakeGraph {
    graph
        .on(
            Method::Get,
            "/me/planner/tasks",
            json!({ "value": [
                { "id": "A", "title": "Ship release", "dueDateTime": "2024-06-01T00:00:00Z",
                  "priority": 3, "percentComplete": 50, "planId": "plan-1", "bucketId": "b1",
                  "createdDateTime": "2024-01-10T00:00:00Z", "assignments": {} },
                { "id": "B", "title": "Tidy wiki", "priority": 5, "planId": "plan-1",
                  "bucketId": "b1", "createdDateTime": "2024-01-01T00:00:00Z" }
            ] }),
        )
        .on(Method::Get, "/planner/plans/plan-1", json!({ "id": "plan-1", "title": "Launch" }))
        .on(
            Method::Get,
            "/me/todo/lists",
            json!({ "value": [
                { "id": "L1", "displayName": "Tasks", "wellknownListName": "defaultList" },
                { "id": "L2", "displayName": "Errands", "wellknownListName": "none" }
            ] }),
        )
        .on(
            Method::Get,
            "/me/todo/lists/L1/tasks",
            json!({ "value": [
                { "id": "C", "title": "Renew badge", "importance": "high", "status": "notStarted",
                  "dueDateTime": { "dateTime": "2024-05-01T00:00:00.0000000", "timeZone": "UTC" },
                  "createdDateTime": "2024-01-05T00:00:00Z" },
                { "id": "X", "title": "Done already", "importance": "low", "status": "completed",
                  "createdDateTime": "2024-01-06T00:00:00Z" }
            ] }),
        )
        .on(
            Method::Get,
            "/me/todo/lists/L2/tasks",
            json!({ "value": [
                { "id": "D", "title": "Buy stamps", "importance": "low", "status": "notStarted",
                  "createdDateTime": "2024-02-01T00:00:00Z" }
            ] }),
        )
}

fn new_task(plan_id: &str) -> NewTask {
    NewTask {
        title: "Book venue".into(),
        plan_id: plan_id.into(),
        due_date: NaiveDate::from_ymd_opt(2024, 8, 1),
        priority: 5,
        progress: 25,
        description: Some("Two rooms".into()),
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn aggregate_merges_sorts_and_names_plans() {
    let graph = with_board(FakeGraph::new());
    let board = aggregate(&graph, &CancellationToken::new()).await;

    let ids: Vec<&str> = board.tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["TODO_C", "PLANNER_A", "TODO_D", "PLANNER_B"]);

    assert_eq!(board.plan_name("plan-1"), Some("Launch"));
    assert_eq!(board.plan_name(PRIVATE_PLAN_ID), Some(PRIVATE_PLAN_NAME));

    let c = board.find("TODO_C").unwrap();
    assert_eq!(c.priority, 1);
    assert_eq!(c.bucket_id, "L1");
    assert_eq!(board.find("TODO_D").unwrap().priority, 9);
    assert!(board.find("TODO_X").is_none());
}

#[tokio::test]
async fn aggregate_with_every_call_failing_is_empty() {
    let board = aggregate(&FakeGraph::new(), &CancellationToken::new()).await;
    assert!(board.tasks.is_empty());
    assert_eq!(board.plans.len(), 1);
}

#[tokio::test]
async fn failed_source_does_not_hide_the_other() {
    let graph = FakeGraph::new()
        .fail(Method::Get, "/me/planner/tasks", 403)
        .on(Method::Get, "/me/todo/lists", json!({ "value": [ { "id": "L2", "displayName": "Errands" } ] }))
        .on(
            Method::Get,
            "/me/todo/lists/L2/tasks",
            json!({ "value": [ { "id": "D", "title": "Buy stamps", "status": "notStarted" } ] }),
        );
    let board = aggregate(&graph, &CancellationToken::new()).await;
    assert_eq!(board.tasks.len(), 1);
    assert_eq!(board.tasks[0].id, "TODO_D");
}

#[tokio::test]
async fn failed_plan_lookup_keeps_tasks() {
    let graph = FakeGraph::new().on(
        Method::Get,
        "/me/planner/tasks",
        json!({ "value": [ { "id": "A", "title": "Ship", "planId": "gone" } ] }),
    );
    let board = aggregate(&graph, &CancellationToken::new()).await;
    assert_eq!(board.tasks.len(), 1);
    assert_eq!(board.plan_name("gone"), None);
}

#[tokio::test]
async fn cancelled_aggregate_is_empty() {
    let graph = with_board(FakeGraph::new());
    let cancel = CancellationToken::new();
    cancel.cancel();
    assert!(aggregate(&graph, &cancel).await.tasks.is_empty());
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_private_task_posts_to_default_list_and_reaggregates() {
    let graph = with_board(FakeGraph::new()).on(Method::Post, "/me/todo/lists/L1/tasks", json!({ "id": "N" }));

    let board = create_task(&graph, &new_task(PRIVATE_PLAN_ID), &CancellationToken::new())
        .await
        .unwrap();

    let posts = graph.calls_to(Method::Post, "/me/todo/lists/L1/tasks");
    assert_eq!(posts.len(), 1);
    let body = posts[0].body.as_ref().unwrap();
    assert_eq!(body["importance"], "normal");
    assert_eq!(body["dueDateTime"]["timeZone"], "UTC");
    assert_eq!(body["body"]["content"], "Two rooms");

    assert_eq!(graph.calls_to(Method::Get, "/me/planner/tasks").len(), 1);
    assert_eq!(board.tasks.len(), 4);
}

#[tokio::test]
async fn create_private_task_without_lists_fails() {
    let graph = FakeGraph::new().on(Method::Get, "/me/todo/lists", json!({ "value": [] }));
    let result = create_task(&graph, &new_task(PRIVATE_PLAN_ID), &CancellationToken::new()).await;
    assert_matches!(result, Err(GraphError::Core(CoreError::NotFound { .. })));
}

#[tokio::test]
async fn create_team_task_patches_progress_and_description() {
    let graph = with_board(FakeGraph::new())
        .on(Method::Get, "/planner/plans/plan-1/buckets", json!({ "value": [ { "id": "b1" }, { "id": "b2" } ] }))
        .on(
            Method::Post,
            "/planner/tasks",
            json!({ "id": "NEW", "planId": "plan-1", "@odata.etag": "W/\"task-etag\"" }),
        )
        .on(Method::Patch, "/planner/tasks/NEW", json!(null))
        .on(Method::Get, "/planner/tasks/NEW/details", json!({ "@odata.etag": "W/\"details-etag\"" }))
        .on(Method::Patch, "/planner/tasks/NEW/details", json!(null));

    create_task(&graph, &new_task("plan-1"), &CancellationToken::new())
        .await
        .unwrap();

    let post = &graph.calls_to(Method::Post, "/planner/tasks")[0];
    let body = post.body.as_ref().unwrap();
    assert_eq!(body["bucketId"], "b1");
    assert_eq!(body["priority"], 5);
    assert_eq!(body["dueDateTime"], "2024-08-01T00:00:00+00:00");

    let progress = &graph.calls_to(Method::Patch, "/planner/tasks/NEW")[0];
    assert_eq!(progress.if_match.as_deref(), Some("W/\"task-etag\""));
    assert_eq!(progress.body.as_ref().unwrap()["percentComplete"], 25);

    let details = &graph.calls_to(Method::Patch, "/planner/tasks/NEW/details")[0];
    assert_eq!(details.if_match.as_deref(), Some("W/\"details-etag\""));
    assert_eq!(details.body.as_ref().unwrap()["description"], "Two rooms");
}

#[tokio::test]
async fn create_team_task_survives_failed_follow_up_patches() {
    let graph = FakeGraph::new()
        .on(Method::Get, "/planner/plans/plan-1/buckets", json!({ "value": [ { "id": "b1" } ] }))
        .on(Method::Post, "/planner/tasks", json!({ "id": "NEW" }))
        .fail(Method::Patch, "/planner/tasks/NEW", 412);

    let result = create_task(&graph, &new_task("plan-1"), &CancellationToken::new()).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn create_team_task_without_buckets_fails() {
    let graph = FakeGraph::new().on(Method::Get, "/planner/plans/plan-1/buckets", json!({ "value": [] }));
    let result = create_task(&graph, &new_task("plan-1"), &CancellationToken::new()).await;
    assert_matches!(result, Err(GraphError::Core(CoreError::NotFound { entity: "bucket", .. })));
    assert!(graph.calls_to(Method::Post, "/planner/tasks").is_empty());
}

#[tokio::test]
async fn invalid_new_task_issues_no_request() {
    let invalid = NewTask { title: "".into(), ..new_task("plan-1") };
    let graph = FakeGraph::new();
    let result = create_task(&graph, &invalid, &CancellationToken::new()).await;
    assert_matches!(result, Err(GraphError::Core(CoreError::Validation(_))));
    assert!(graph.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

#[tokio::test]
async fn private_progress_tries_lists_until_one_accepts() {
    let graph = with_board(FakeGraph::new())
        .fail(Method::Patch, "/me/todo/lists/L1/tasks/D", 404)
        .on(Method::Patch, "/me/todo/lists/L2/tasks/D", json!({ "id": "D", "status": "completed" }));

    update_task_progress(&graph, "TODO_D", 100, None, &CancellationToken::new())
        .await
        .unwrap();

    let patch = &graph.calls_to(Method::Patch, "/me/todo/lists/L2/tasks/D")[0];
    assert_eq!(patch.body.as_ref().unwrap()["status"], "completed");
    assert_eq!(graph.calls_to(Method::Get, "/me/planner/tasks").len(), 1);
}

#[tokio::test]
async fn private_progress_below_100_is_not_started() {
    let graph = with_board(FakeGraph::new()).on(Method::Patch, "/me/todo/lists/L1/tasks/C", json!(null));
    update_task_progress(&graph, "TODO_C", 60, None, &CancellationToken::new())
        .await
        .unwrap();
    let patch = &graph.calls_to(Method::Patch, "/me/todo/lists/L1/tasks/C")[0];
    assert_eq!(patch.body.as_ref().unwrap()["status"], "notStarted");
}

#[tokio::test]
async fn private_progress_in_no_list_is_not_found() {
    let graph = with_board(FakeGraph::new());
    let result = update_task_progress(&graph, "TODO_missing", 100, None, &CancellationToken::new()).await;
    assert_matches!(result, Err(GraphError::Core(CoreError::NotFound { entity: "task", .. })));
}

#[tokio::test]
async fn team_progress_sends_concurrency_token() {
    let graph = with_board(FakeGraph::new()).on(Method::Patch, "/planner/tasks/A", json!(null));
    update_task_progress(&graph, "PLANNER_A", 75, Some("W/\"etag-a\""), &CancellationToken::new())
        .await
        .unwrap();

    let patch = &graph.calls_to(Method::Patch, "/planner/tasks/A")[0];
    assert_eq!(patch.if_match.as_deref(), Some("W/\"etag-a\""));
    assert_eq!(patch.body.as_ref().unwrap()["percentComplete"], 75);
}

#[tokio::test]
async fn team_progress_without_token_is_rejected() {
    let graph = FakeGraph::new();
    let result = update_task_progress(&graph, "PLANNER_A", 75, None, &CancellationToken::new()).await;
    assert_matches!(result, Err(GraphError::Core(CoreError::Validation(_))));
    assert!(graph.calls().is_empty());
}

#[tokio::test]
async fn failed_team_patch_propagates() {
    let graph = FakeGraph::new().fail(Method::Patch, "/planner/tasks/A", 412);
    let result = update_task_progress(&graph, "PLANNER_A", 75, Some("stale"), &CancellationToken::new()).await;
    assert_matches!(result, Err(GraphError::ApiError { status: 412, .. }));
}

#[tokio::test]
async fn unprefixed_id_is_rejected() {
    let result = update_task_progress(&FakeGraph::new(), "A", 10, Some("e"), &CancellationToken::new()).await;
    assert_matches!(result, Err(GraphError::Core(CoreError::Validation(_))));
}

// ---------------------------------------------------------------------------
// Details
// ---------------------------------------------------------------------------

#[tokio::test]
async fn team_details_combine_task_and_details() {
    let graph = FakeGraph::new()
        .on(
            Method::Get,
            "/planner/tasks/A",
            json!({ "id": "A", "title": "Ship release", "percentComplete": 50, "@odata.etag": "W/\"a\"" }),
        )
        .on(Method::Get, "/planner/tasks/A/details", json!({ "description": "Cut the tag" }));

    let details = get_task_details(&graph, "PLANNER_A").await.unwrap();
    assert_eq!(details.id, "PLANNER_A");
    assert_eq!(details.description, "Cut the tag");
    assert_eq!(details.percent_complete, 50);
    assert_eq!(details.etag.as_deref(), Some("W/\"a\""));
}

#[tokio::test]
async fn private_details_search_lists() {
    let graph = with_board(FakeGraph::new()).on(
        Method::Get,
        "/me/todo/lists/L2/tasks/D",
        json!({ "id": "D", "title": "Buy stamps", "status": "completed", "body": { "content": "First class" } }),
    );

    let details = get_task_details(&graph, "TODO_D").await.unwrap();
    assert_eq!(details.id, "TODO_D");
    assert_eq!(details.description, "First class");
    assert_eq!(details.percent_complete, 100);
    assert_eq!(graph.calls_to(Method::Get, "/me/todo/lists/L1/tasks/D").len(), 1);
}
