//! Carousel card pipeline: query a list with progressively simpler query
//! shapes and normalize whatever the first accepted query returns.

use futures::future::join_all;
use homepage_core::carousel::{CarouselCardConfig, CarouselItem, ITEMS_PER_CARD};
use homepage_core::list_item::normalize_response;
use tokio_util::sync::CancellationToken;

use crate::api::{list_endpoint, ListSource};

/// Column the fallback queries order by when the configured date column
/// may not exist.
pub const FALLBACK_ORDER_COLUMN: &str = "Modified";

/// Which column a query orders by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    /// The card's configured date column.
    DateColumn,
    /// [`FALLBACK_ORDER_COLUMN`].
    Modified,
}

/// One query variant in the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryShape {
    pub expand_attachments: bool,
    pub order_by: OrderBy,
}

/// Tried in order; the first one the server accepts wins.
pub const QUERY_STRATEGIES: [QueryShape; 3] = [
    QueryShape { expand_attachments: true, order_by: OrderBy::DateColumn },
    QueryShape { expand_attachments: true, order_by: OrderBy::Modified },
    QueryShape { expand_attachments: false, order_by: OrderBy::Modified },
];

impl QueryShape {
    /// Full items URL for `cfg`, which must already be resolved.
    ///
    /// No `$select` is sent: configured column names may not exist on the
    /// list, and selecting a missing column fails the whole query.
    pub fn url(&self, cfg: &CarouselCardConfig) -> String {
        let mut url = format!(
            "{}/items?$top={ITEMS_PER_CARD}",
            list_endpoint(&cfg.site_url, &cfg.list_name)
        );
        if self.expand_attachments {
            url.push_str("&$expand=AttachmentFiles");
        }
        let column = match self.order_by {
            OrderBy::DateColumn => urlencoding::encode(&cfg.date_column).into_owned(),
            OrderBy::Modified => FALLBACK_ORDER_COLUMN.to_string(),
        };
        url.push_str(&format!("&$orderby={column} desc"));
        url
    }
}

/// Fetch and normalize up to [`ITEMS_PER_CARD`] items for one card.
///
/// Never fails: an unconfigured card, a transport failure, every query
/// variant being rejected, an unexpected payload, or cancellation all
/// yield an empty list.
pub async fn fetch_carousel_items<S>(
    source: &S,
    card: &CarouselCardConfig,
    cancel: &CancellationToken,
) -> Vec<CarouselItem>
where
    S: ListSource + ?Sized,
{
    let cfg = card.resolved();
    if !cfg.is_configured() {
        return Vec::new();
    }

    let mut body = None;
    for shape in QUERY_STRATEGIES {
        if cancel.is_cancelled() {
            return Vec::new();
        }
        match source.get_json(&shape.url(&cfg)).await {
            Ok(value) => {
                body = Some(value);
                break;
            }
            Err(e) if e.is_rejected_query() => {
                tracing::debug!(list = %cfg.list_name, ?shape, error = %e, "List query rejected, trying next shape");
            }
            Err(e) => {
                tracing::warn!(list = %cfg.list_name, error = %e, "Failed to fetch carousel items");
                return Vec::new();
            }
        }
    }

    let Some(body) = body else {
        tracing::warn!(list = %cfg.list_name, "Every list query shape was rejected");
        return Vec::new();
    };

    let items = match normalize_response(&body, &cfg) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(list = %cfg.list_name, error = %e, "Unexpected list response");
            return Vec::new();
        }
    };

    if cancel.is_cancelled() {
        return Vec::new();
    }
    tracing::debug!(list = %cfg.list_name, count = items.len(), "Fetched carousel items");
    items
}

/// Fetch every card concurrently. `result[i]` belongs to `cards[i]`.
pub async fn fetch_all_cards<S>(
    source: &S,
    cards: &[CarouselCardConfig],
    cancel: &CancellationToken,
) -> Vec<Vec<CarouselItem>>
where
    S: ListSource + ?Sized,
{
    join_all(cards.iter().map(|card| fetch_carousel_items(source, card, cancel))).await
}
