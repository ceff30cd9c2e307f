//! Integration tests for the carousel card pipeline against an in-process
//! list source.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use homepage_core::carousel::CarouselCardConfig;
use homepage_sharepoint::discovery::{fetch_columns, fetch_lists};
use homepage_sharepoint::{fetch_all_cards, fetch_carousel_items, ListSource, SharePointError};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Fake
// ---------------------------------------------------------------------------

enum Reply {
    Ok(Value),
    Status(u16),
    Malformed,
}

/// Replies are consumed in order; once exhausted every call is rejected.
struct ScriptedSource {
    replies: Mutex<VecDeque<Reply>>,
    urls: Mutex<Vec<String>>,
}

impl ScriptedSource {
    fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            urls: Mutex::new(Vec::new()),
        }
    }

    fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ListSource for ScriptedSource {
    async fn get_json(&self, url: &str) -> Result<Value, SharePointError> {
        self.urls.lock().unwrap().push(url.to_string());
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Ok(v)) => Ok(v),
            Some(Reply::Malformed) => Err(SharePointError::Payload(
                serde_json::from_str::<Value>("not json").unwrap_err(),
            )),
            Some(Reply::Status(status)) => Err(SharePointError::ApiError {
                status,
                body: "rejected".into(),
            }),
            None => Err(SharePointError::ApiError {
                status: 400,
                body: "no more replies".into(),
            }),
        }
    }
}

fn card(list: &str) -> CarouselCardConfig {
    CarouselCardConfig {
        site_url: "https://tenant.sharepoint.com/sites/hub/".into(),
        list_name: list.into(),
        card_label: "News".into(),
        image_column: "Banner".into(),
        ..Default::default()
    }
}

fn two_items() -> Value {
    json!({
        "value": [
            {
                "Id": 7,
                "Title": "Quarterly results",
                "Body": "<p>Revenue is <b>up</b></p>",
                "Created": "2024-05-01T08:00:00Z",
                "Banner": "{\"fileName\":\"Reserved_ImageAttachment_[1]_banner.png\"}",
                "AttachmentFiles": [
                    { "FileName": "Reserved_ImageAttachment_[1]_banner.png",
                      "ServerRelativeUrl": "/sites/hub/Lists/News/Attachments/7/banner.png" },
                    { "FileName": "report.pdf",
                      "ServerRelativeUrl": "/sites/hub/Lists/News/Attachments/7/report.pdf" }
                ]
            },
            { "Id": 6, "Title": "Welcome", "Body": "Hello", "Created": "2024-04-01T08:00:00Z" },
            { "Id": 5, "Title": "Ignored", "Body": "", "Created": "2024-03-01T08:00:00Z" }
        ]
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_accepted_query_wins() {
    let source = ScriptedSource::new(vec![Reply::Ok(two_items())]);
    let items = fetch_carousel_items(&source, &card("News"), &CancellationToken::new()).await;

    assert_eq!(source.urls().len(), 1);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, 7);
    assert_eq!(items[0].content, "Revenue is up");
    assert_eq!(
        items[0].image_url,
        "https://tenant.sharepoint.com/sites/hub/Lists/News/Attachments/7/banner.png"
    );
    assert_eq!(
        items[0].attachment_url,
        "https://tenant.sharepoint.com/sites/hub/Lists/News/Attachments/7/report.pdf"
    );
    assert_eq!(items[1].image_url, "");
}

#[tokio::test]
async fn rejected_queries_fall_back_to_simpler_shapes() {
    let source = ScriptedSource::new(vec![Reply::Status(400), Reply::Status(400), Reply::Ok(two_items())]);
    let items = fetch_carousel_items(&source, &card("News"), &CancellationToken::new()).await;

    let urls = source.urls();
    assert_eq!(urls.len(), 3);
    assert!(urls[0].contains("$orderby=Created desc"));
    assert!(urls[1].contains("$expand=AttachmentFiles&$orderby=Modified desc"));
    assert!(!urls[2].contains("$expand"));
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn every_query_rejected_yields_empty() {
    let source = ScriptedSource::new(vec![]);
    let items = fetch_carousel_items(&source, &card("News"), &CancellationToken::new()).await;
    assert!(items.is_empty());
    assert_eq!(source.urls().len(), 3);
}

#[tokio::test]
async fn malformed_payload_stops_the_chain() {
    let source = ScriptedSource::new(vec![Reply::Malformed, Reply::Ok(two_items())]);
    let items = fetch_carousel_items(&source, &card("News"), &CancellationToken::new()).await;
    assert!(items.is_empty());
    assert_eq!(source.urls().len(), 1);
}

#[tokio::test]
async fn response_without_value_array_yields_empty() {
    let source = ScriptedSource::new(vec![Reply::Ok(json!({ "d": [] }))]);
    let items = fetch_carousel_items(&source, &card("News"), &CancellationToken::new()).await;
    assert!(items.is_empty());
}

#[tokio::test]
async fn unconfigured_card_issues_no_request() {
    let source = ScriptedSource::new(vec![Reply::Ok(two_items())]);
    let items = fetch_carousel_items(&source, &card("  "), &CancellationToken::new()).await;
    assert!(items.is_empty());
    assert!(source.urls().is_empty());
}

#[tokio::test]
async fn cancelled_fetch_discards_results() {
    let source = ScriptedSource::new(vec![Reply::Ok(two_items())]);
    let cancel = CancellationToken::new();
    cancel.cancel();
    let items = fetch_carousel_items(&source, &card("News"), &cancel).await;
    assert!(items.is_empty());
}

#[tokio::test]
async fn all_cards_keep_their_slot() {
    let source = ScriptedSource::new(vec![Reply::Ok(two_items())]);
    let cards = vec![card(""), card("News")];
    let results = fetch_all_cards(&source, &cards, &CancellationToken::new()).await;
    assert_eq!(results.len(), 2);
    assert!(results[0].is_empty());
    assert_eq!(results[1].len(), 2);
}

#[tokio::test]
async fn discovery_filters_system_fields() {
    let source = ScriptedSource::new(vec![
        Reply::Ok(json!({ "value": [ { "Title": "News", "Id": "abc", "BaseTemplate": 100 } ] })),
        Reply::Ok(json!({ "value": [
            { "InternalName": "Title", "Title": "Title", "TypeAsString": "Text" },
            { "InternalName": "DocIcon", "Title": "Type", "TypeAsString": "Computed" }
        ] })),
    ]);

    let lists = fetch_lists(&source, "").await;
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].title, "News");

    let columns = fetch_columns(&source, "", "News").await;
    assert_eq!(columns.len(), 1);
    assert_eq!(columns[0].internal_name, "Title");
}

#[tokio::test]
async fn discovery_failure_yields_empty() {
    let source = ScriptedSource::new(vec![]);
    assert!(fetch_lists(&source, "https://x/sites/a").await.is_empty());
    assert!(fetch_columns(&source, "https://x/sites/a", "News").await.is_empty());
    assert!(fetch_columns(&source, "https://x/sites/a", "").await.is_empty());
}
