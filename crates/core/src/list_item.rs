//! List-item normalization: raw list JSON to [`CarouselItem`].
//!
//! Image and attachment columns arrive in several encodings depending on
//! the column type the site owner picked. [`ColumnValue::decode`] sniffs
//! the shape once; [`ColumnValue::resolve`] turns any shape into an
//! absolute URL or an empty string. Nothing in this module fails on a
//! single item: unknown shapes degrade to empty fields.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::carousel::{CarouselCardConfig, CarouselItem, ITEMS_PER_CARD};
use crate::error::CoreError;

/// Filename prefix the server gives files that back an image column.
pub const RESERVED_IMAGE_PREFIX: &str = "Reserved_ImageAttachment_";

static MARKUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

static ORIGIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(https?://[^/]+)").expect("valid regex"));

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

/// One entry of an item's expanded `AttachmentFiles` collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AttachmentFile {
    #[serde(rename = "FileName", default)]
    pub file_name: String,
    #[serde(rename = "ServerRelativeUrl", default)]
    pub server_relative_url: String,
}

impl AttachmentFile {
    pub fn is_reserved_image(&self) -> bool {
        self.file_name.starts_with(RESERVED_IMAGE_PREFIX)
    }
}

/// Read the `AttachmentFiles` array of an item, skipping malformed entries.
pub fn attachments_of(item: &Value) -> Vec<AttachmentFile> {
    item.get("AttachmentFiles")
        .and_then(Value::as_array)
        .map(|files| {
            files
                .iter()
                .filter_map(|f| AttachmentFile::deserialize(f).ok())
                .collect()
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Column value shapes
// ---------------------------------------------------------------------------

/// URL-bearing object as stored by thumbnail, image and hyperlink columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlObject {
    pub server_url: Option<String>,
    pub server_relative_url: Option<String>,
    pub url: Option<String>,
}

impl UrlObject {
    fn from_map(map: &serde_json::Map<String, Value>) -> Self {
        let text = |key: &str| {
            map.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            server_url: text("serverUrl"),
            server_relative_url: text("serverRelativeUrl"),
            url: text("Url").or_else(|| text("url")),
        }
    }
}

/// The encodings an image or attachment column can carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnValue {
    /// Column missing, null, or empty.
    Absent,
    /// JSON naming a reserved attachment file that holds the actual bytes.
    ReservedAttachment { file_name: String },
    /// JSON object with an absolute or relative URL.
    UrlObject(UrlObject),
    /// A bare URL string.
    PlainUrl(String),
}

impl ColumnValue {
    /// Classify a raw column value.
    pub fn decode(raw: Option<&Value>) -> Self {
        match raw {
            None | Some(Value::Null) => Self::Absent,
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Self::Absent;
                }
                match serde_json::from_str::<Value>(trimmed) {
                    Ok(Value::Object(map)) => Self::from_object(&map),
                    _ => Self::PlainUrl(trimmed.to_string()),
                }
            }
            Some(Value::Object(map)) => Self::from_object(map),
            Some(_) => Self::Absent,
        }
    }

    fn from_object(map: &serde_json::Map<String, Value>) -> Self {
        match map.get("fileName").and_then(Value::as_str) {
            Some(name) if !name.is_empty() => Self::ReservedAttachment {
                file_name: name.to_string(),
            },
            _ => Self::UrlObject(UrlObject::from_map(map)),
        }
    }

    /// Resolve to an absolute URL, or an empty string when that is not
    /// possible.
    pub fn resolve(&self, site_url: &str, attachments: &[AttachmentFile]) -> String {
        let origin = site_origin(site_url);
        let candidate = match self {
            Self::Absent => String::new(),
            Self::ReservedAttachment { file_name } => attachments
                .iter()
                .find(|a| &a.file_name == file_name)
                .map(|a| join_origin(origin, &a.server_relative_url))
                .unwrap_or_default(),
            Self::UrlObject(obj) => match (&obj.server_url, &obj.server_relative_url, &obj.url) {
                (Some(server), Some(rel), _) => format!("{server}{rel}"),
                (None, Some(rel), _) => resolve_url(rel, site_url),
                (_, _, Some(url)) => resolve_url(url, site_url),
                _ => String::new(),
            },
            Self::PlainUrl(url) => resolve_url(url, site_url),
        };
        absolute_or_empty(candidate)
    }
}

// ---------------------------------------------------------------------------
// URL helpers
// ---------------------------------------------------------------------------

/// `scheme://host` portion of a site URL.
pub fn site_origin(site_url: &str) -> Option<&str> {
    ORIGIN_RE
        .captures(site_url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Resolve a server-relative path against the site origin. Absolute URLs
/// pass through; other relative forms are returned unchanged.
pub fn resolve_url(url: &str, site_url: &str) -> String {
    let url = url.trim();
    if url.is_empty() || is_absolute(url) {
        return url.to_string();
    }
    if url.starts_with('/') {
        if let Some(origin) = site_origin(site_url) {
            return format!("{origin}{url}");
        }
    }
    url.to_string()
}

fn join_origin(origin: Option<&str>, relative: &str) -> String {
    match origin {
        Some(origin) if !relative.is_empty() => format!("{origin}{relative}"),
        _ => String::new(),
    }
}

fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn absolute_or_empty(url: String) -> String {
    if is_absolute(&url) {
        url
    } else {
        String::new()
    }
}

// ---------------------------------------------------------------------------
// Item mapping
// ---------------------------------------------------------------------------

/// Remove every `<...>` tag from `text`.
pub fn strip_markup(text: &str) -> String {
    MARKUP_RE.replace_all(text, "").into_owned()
}

/// Display text of a scalar field; objects and arrays read as empty.
fn scalar_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn column<'a>(item: &'a Value, name: &str) -> Option<&'a Value> {
    if name.is_empty() {
        None
    } else {
        item.get(name)
    }
}

/// Pick the attachment URL: the configured column when it resolves,
/// otherwise the first attachment that does not back an image column.
fn attachment_url(item: &Value, cfg: &CarouselCardConfig, files: &[AttachmentFile]) -> String {
    let configured = ColumnValue::decode(column(item, &cfg.attachment_column));
    let url = configured.resolve(&cfg.site_url, files);
    if !url.is_empty() {
        return url;
    }

    files
        .iter()
        .find(|f| !f.is_reserved_image())
        .map(|f| absolute_or_empty(join_origin(site_origin(&cfg.site_url), &f.server_relative_url)))
        .unwrap_or_default()
}

/// Map one raw list item. `cfg` must already be [`resolved`](CarouselCardConfig::resolved).
pub fn normalize_item(item: &Value, cfg: &CarouselCardConfig) -> CarouselItem {
    let files = attachments_of(item);

    let image = ColumnValue::decode(column(item, &cfg.image_column));
    let image_url = image.resolve(&cfg.site_url, &files);

    CarouselItem {
        id: item
            .get("Id")
            .or_else(|| item.get("ID"))
            .and_then(Value::as_i64)
            .unwrap_or_default(),
        title: scalar_text(column(item, &cfg.title_column)),
        content: strip_markup(&scalar_text(column(item, &cfg.content_column))),
        image_url,
        attachment_url: attachment_url(item, cfg, &files),
        date_uploaded: scalar_text(column(item, &cfg.date_column)),
    }
}

/// Map a list-items query response (`{"value": [...]}`), keeping at most
/// [`ITEMS_PER_CARD`] items.
pub fn normalize_response(body: &Value, cfg: &CarouselCardConfig) -> Result<Vec<CarouselItem>, CoreError> {
    let items = body
        .get("value")
        .and_then(Value::as_array)
        .ok_or_else(|| CoreError::Validation("list response has no `value` array".into()))?;

    Ok(items
        .iter()
        .take(ITEMS_PER_CARD)
        .map(|item| normalize_item(item, cfg))
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
