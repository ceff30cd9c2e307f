//! Praise feed: candidate sources tried in priority order.

use futures::future::join_all;
use homepage_core::praise::{
    praise_from_post, praise_from_recognition_email, praise_from_scanned_message, CommunityPost,
    Message, PraiseRecord, MAX_PRAISES,
};
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::api::{get_collection, ApiVersion, GraphApi, GraphError};
use crate::odata::ODataQuery;

/// Server-side pre-filter for recognition notification mail.
pub const RECOGNITION_FILTER: &str = "(contains(subject, 'praise') or contains(subject, 'recognition') \
or contains(subject, 'badge') or contains(from/emailAddress/address, 'insights') \
or contains(from/emailAddress/address, 'viva'))";

pub const MAX_RECOGNITION_EMAILS: u32 = 30;
pub const MAX_COMMUNITIES: u32 = 10;
/// Communities whose posts are read.
pub const COMMUNITIES_SCANNED: usize = 3;
pub const MAX_POSTS_PER_COMMUNITY: u32 = 20;
pub const MAX_SCANNED_MESSAGES: u32 = 20;

/// One place praise may come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PraiseSource {
    /// Mail matching [`RECOGNITION_FILTER`].
    RecognitionEmail,
    /// Beta insights endpoint. Only probes availability; yields nothing.
    InsightsProbe,
    /// Posts in the first few employee communities.
    CommunityPosts,
    /// Keyword scan over high-importance mail.
    HighImportanceScan,
}

/// Tried in order until one yields at least one record.
pub const PRAISE_SOURCES: [PraiseSource; 4] = [
    PraiseSource::RecognitionEmail,
    PraiseSource::InsightsProbe,
    PraiseSource::CommunityPosts,
    PraiseSource::HighImportanceScan,
];

#[derive(Debug, Deserialize)]
struct Community {
    id: String,
    #[serde(default, rename = "displayName")]
    display_name: String,
}

/// Up to [`MAX_PRAISES`] records from the first source that yields any.
/// Empty when every source fails or yields nothing.
pub async fn fetch_praises<G>(api: &G, cancel: &CancellationToken) -> Vec<PraiseRecord>
where
    G: GraphApi + ?Sized,
{
    for source in PRAISE_SOURCES {
        if cancel.is_cancelled() {
            return Vec::new();
        }
        match collect(api, source).await {
            Ok(mut records) if !records.is_empty() => {
                if cancel.is_cancelled() {
                    return Vec::new();
                }
                records.truncate(MAX_PRAISES);
                tracing::info!(?source, count = records.len(), "Loaded praise");
                return records;
            }
            Ok(_) => {
                tracing::debug!(?source, "Praise source yielded nothing");
            }
            Err(e) => {
                tracing::warn!(?source, error = %e, "Praise source unavailable");
            }
        }
    }
    Vec::new()
}

/// Records from a single source.
pub async fn collect<G>(api: &G, source: PraiseSource) -> Result<Vec<PraiseRecord>, GraphError>
where
    G: GraphApi + ?Sized,
{
    match source {
        PraiseSource::RecognitionEmail => {
            let path = ODataQuery::new()
                .select("id,subject,from,body,bodyPreview,receivedDateTime,toRecipients")
                .filter(RECOGNITION_FILTER)
                .orderby("receivedDateTime desc")
                .top(MAX_RECOGNITION_EMAILS)
                .apply("/me/messages");
            let messages: Vec<Message> = get_collection(api, ApiVersion::V1, &path).await?;
            Ok(messages.iter().filter_map(praise_from_recognition_email).collect())
        }
        PraiseSource::InsightsProbe => {
            let path = ODataQuery::new().top(10).apply("/me/insights/shared");
            let _: Value = api.get(ApiVersion::Beta, &path).await?;
            tracing::debug!("Insights endpoint available");
            Ok(Vec::new())
        }
        PraiseSource::CommunityPosts => collect_community_posts(api).await,
        PraiseSource::HighImportanceScan => {
            let path = ODataQuery::new()
                .select("id,subject,from,bodyPreview,receivedDateTime,importance")
                .filter("importance eq 'high'")
                .orderby("receivedDateTime desc")
                .top(MAX_SCANNED_MESSAGES)
                .apply("/me/messages");
            let messages: Vec<Message> = get_collection(api, ApiVersion::V1, &path).await?;
            Ok(messages.iter().filter_map(praise_from_scanned_message).collect())
        }
    }
}

async fn collect_community_posts<G>(api: &G) -> Result<Vec<PraiseRecord>, GraphError>
where
    G: GraphApi + ?Sized,
{
    let path = ODataQuery::new()
        .select("id,displayName,description")
        .top(MAX_COMMUNITIES)
        .apply("/employeeExperience/communities");
    let communities: Vec<Community> = get_collection(api, ApiVersion::V1, &path).await?;

    let per_community = communities.iter().take(COMMUNITIES_SCANNED).map(|community| async move {
        let path = ODataQuery::new()
            .select("id,content,author,createdDateTime")
            .orderby("createdDateTime desc")
            .top(MAX_POSTS_PER_COMMUNITY)
            .apply(&format!("/employeeExperience/communities/{}/posts", community.id));
        match get_collection::<_, CommunityPost>(api, ApiVersion::V1, &path).await {
            Ok(posts) => posts.iter().filter_map(praise_from_post).collect::<Vec<_>>(),
            Err(e) => {
                tracing::warn!(community = %community.display_name, error = %e, "Could not fetch community posts");
                Vec::new()
            }
        }
    });

    Ok(join_all(per_community).await.into_iter().flatten().collect())
}
