//! Carousel display records, card configuration, and rotation state.
//!
//! A carousel is fed by up to three configured list sources. Each source
//! contributes at most [`ITEMS_PER_CARD`] items; the flattened sequence is
//! rotated on a timer by the host.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Site used when a card has no site URL configured.
pub const DEFAULT_SITE_URL: &str = "https://contoso.sharepoint.com/sites/intranet";

pub const DEFAULT_TITLE_COLUMN: &str = "Title";
pub const DEFAULT_CONTENT_COLUMN: &str = "Body";
pub const DEFAULT_DATE_COLUMN: &str = "Created";

/// Maximum number of items taken from each configured list.
pub const ITEMS_PER_CARD: usize = 2;

/// Default labels for the three card slots, in slot order.
pub const DEFAULT_CARD_LABELS: [&str; 3] = ["Updates", "News", "Announcements"];

/// Interval between automatic carousel advances.
pub const CAROUSEL_ROTATE_INTERVAL: Duration = Duration::from_secs(7);

/// Interval between automatic weather-city advances.
pub const WEATHER_ROTATE_INTERVAL: Duration = Duration::from_secs(8);

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One normalized list item, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselItem {
    pub id: i64,
    pub title: String,
    /// Plain text; markup has already been stripped.
    pub content: String,
    /// Absolute URL or empty.
    pub image_url: String,
    /// Absolute URL or empty.
    pub attachment_url: String,
    pub date_uploaded: String,
}

/// Where a card reads its items from and which columns map to which field.
///
/// Column names are whatever the site owner configured and may not exist
/// on the remote list. Empty strings mean "unset".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CarouselCardConfig {
    pub site_url: String,
    pub list_name: String,
    pub card_label: String,
    pub title_column: String,
    pub content_column: String,
    pub image_column: String,
    pub attachment_column: String,
    pub date_column: String,
}

impl CarouselCardConfig {
    /// Return a copy with defaults filled in for every unset column and the
    /// site URL stripped of trailing slashes.
    pub fn resolved(&self) -> Self {
        fn or_default(value: &str, default: &str) -> String {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                default.to_string()
            } else {
                trimmed.to_string()
            }
        }

        let site = or_default(&self.site_url, DEFAULT_SITE_URL);

        Self {
            site_url: site.trim_end_matches('/').to_string(),
            list_name: self.list_name.trim().to_string(),
            card_label: self.card_label.clone(),
            title_column: or_default(&self.title_column, DEFAULT_TITLE_COLUMN),
            content_column: or_default(&self.content_column, DEFAULT_CONTENT_COLUMN),
            image_column: self.image_column.trim().to_string(),
            attachment_column: self.attachment_column.trim().to_string(),
            date_column: or_default(&self.date_column, DEFAULT_DATE_COLUMN),
        }
    }

    /// A card without a list name never produces items.
    pub fn is_configured(&self) -> bool {
        !self.list_name.trim().is_empty()
    }
}

/// An item paired with the label of the card it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabeledItem {
    pub label: String,
    pub item: CarouselItem,
}

/// Flatten per-card results into the rotation sequence.
///
/// `results[i]` belongs to `cards[i]`; missing result slots count as empty.
pub fn flatten_cards(cards: &[CarouselCardConfig], results: &[Vec<CarouselItem>]) -> Vec<LabeledItem> {
    cards
        .iter()
        .enumerate()
        .flat_map(|(i, card)| {
            results
                .get(i)
                .map(|items| items.as_slice())
                .unwrap_or_default()
                .iter()
                .take(ITEMS_PER_CARD)
                .map(move |item| LabeledItem {
                    label: card.card_label.clone(),
                    item: item.clone(),
                })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Rotation
// ---------------------------------------------------------------------------

/// Where a card sits relative to the active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardPosition {
    Center,
    Left,
    Right,
    Hidden,
}

/// Index state for a wrapping rotation over `len` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rotation {
    len: usize,
    active: usize,
    /// Auto-rotation only runs when `len` exceeds this.
    auto_threshold: usize,
}

impl Rotation {
    /// Rotation for carousel cards: auto-rotates with more than one item.
    pub fn carousel(len: usize) -> Self {
        Self { len, active: 0, auto_threshold: 1 }
    }

    /// Rotation for weather cities: two are shown at once, so it only
    /// auto-rotates with more than two.
    pub fn weather(len: usize) -> Self {
        Self { len, active: 0, auto_threshold: 2 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn auto_rotates(&self) -> bool {
        self.len > self.auto_threshold
    }

    /// Move to the next entry, wrapping at the end.
    pub fn advance(&mut self) -> usize {
        if self.len > 0 {
            self.active = (self.active + 1) % self.len;
        }
        self.active
    }

    /// Move to the previous entry, wrapping at the start.
    pub fn previous(&mut self) -> usize {
        if self.len > 0 {
            self.active = (self.active + self.len - 1) % self.len;
        }
        self.active
    }

    /// Jump to `index`. Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.len {
            self.active = index;
            true
        } else {
            false
        }
    }

    /// Replace the entry count after a refetch, resetting the active index
    /// when it no longer points at an entry.
    pub fn resize(&mut self, len: usize) {
        self.len = len;
        if self.active >= len {
            self.active = 0;
        }
    }

    /// Position of `index` relative to the active entry.
    pub fn position_of(&self, index: usize) -> CardPosition {
        if self.len == 0 {
            return CardPosition::Hidden;
        }
        let diff = (index % self.len + self.len - self.active) % self.len;
        if diff == 0 {
            CardPosition::Center
        } else if diff == 1 {
            CardPosition::Right
        } else if diff == self.len - 1 {
            CardPosition::Left
        } else {
            CardPosition::Hidden
        }
    }

    /// Indices of the (primary, secondary) entries shown side by side.
    pub fn visible_pair(&self) -> Vec<usize> {
        match self.len {
            0 => Vec::new(),
            1 => vec![0],
            2 => vec![0, 1],
            len => vec![self.active % len, (self.active + 1) % len],
        }
    }
}

// ---------------------------------------------------------------------------
// Greeting
// ---------------------------------------------------------------------------

/// Time-of-day greeting for a local hour in `0..24`.
pub fn greeting(hour: u32) -> &'static str {
    if hour < 12 {
        "Good morning"
    } else if hour < 17 {
        "Good afternoon"
    } else {
        "Good evening"
    }
}

/// First whitespace-separated word of a display name.
pub fn first_name(display_name: &str) -> &str {
    display_name.split_whitespace().next().unwrap_or("")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
