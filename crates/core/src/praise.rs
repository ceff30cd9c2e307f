//! Heuristic recognition ("praise") classification.
//!
//! Messages and community posts are scanned for recognition keywords. The
//! badge rules are checked in a fixed order and the first match wins, so a
//! message that says both "thanks" and "awesome" is a Thank You.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::list_item::strip_markup;

/// Longest message kept on a record.
pub const MAX_MESSAGE_CHARS: usize = 150;

/// Longest excerpt kept from a community post.
pub const MAX_POST_CHARS: usize = 100;

/// Records kept from the first source that yields any.
pub const MAX_PRAISES: usize = 5;

pub const DEFAULT_MESSAGE: &str = "Thank you for your great work!";
pub const DEFAULT_GIVER: &str = "Colleague";

/// Shortest first sentence accepted as a message excerpt.
const MIN_SENTENCE_CHARS: usize = 20;

/// Shortest quoted span accepted as a message excerpt.
const MIN_QUOTE_CHARS: usize = 10;

static LABELED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)message:\s*(.+?)(?:\n|$)").expect("valid regex"));

static FOLLOW_ON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:sent you praise|received praise)[:\s]+(.+?)(?:\n|$)").expect("valid regex")
});

static QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["“”](.+?)["“”]|'(.+?)'"#).expect("valid regex"));

static SENTENCE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("valid regex"));

static SENDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:from|by)\s+([^<\n]+)").expect("valid regex"));

// ---------------------------------------------------------------------------
// Badges
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BadgeType {
    #[serde(rename = "Thank You")]
    ThankYou,
    Awesome,
    #[serde(rename = "Great Job")]
    GreatJob,
    Kudos,
    #[serde(rename = "Badge Earned")]
    BadgeEarned,
    Appreciation,
    Recognition,
}

impl BadgeType {
    pub fn label(self) -> &'static str {
        match self {
            Self::ThankYou => "Thank You",
            Self::Awesome => "Awesome",
            Self::GreatJob => "Great Job",
            Self::Kudos => "Kudos",
            Self::BadgeEarned => "Badge Earned",
            Self::Appreciation => "Appreciation",
            Self::Recognition => "Recognition",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::ThankYou => "#FFB900",
            Self::Awesome => "#00B294",
            Self::GreatJob => "#E74856",
            Self::Kudos => "#8764B8",
            Self::BadgeEarned => "#CA5010",
            Self::Appreciation => "#0078D4",
            Self::Recognition => "#00A4EF",
        }
    }
}

/// Badge rules in priority order.
const BADGE_RULES: &[(&[&str], BadgeType)] = &[
    (&["thank"], BadgeType::ThankYou),
    (&["awesome", "amazing"], BadgeType::Awesome),
    (&["great", "excellent", "well done"], BadgeType::GreatJob),
    (&["kudos"], BadgeType::Kudos),
    (&["badge", "award"], BadgeType::BadgeEarned),
    (&["appreciate"], BadgeType::Appreciation),
];

/// Classify a subject/body pair.
pub fn classify(subject: &str, body: &str) -> BadgeType {
    let text = format!("{subject} {body}").to_lowercase();
    BADGE_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| text.contains(k)))
        .map(|(_, badge)| *badge)
        .unwrap_or(BadgeType::Recognition)
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PraiseGiver {
    pub display_name: String,
    pub id: String,
    pub photo_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PraiseRecord {
    pub id: String,
    /// Badge label shown as the card title.
    pub display_name: String,
    pub given_by: PraiseGiver,
    pub message: String,
    pub badge_type: BadgeType,
    pub background_color: String,
}

impl PraiseRecord {
    pub fn new(id: String, given_by: PraiseGiver, message: String, badge: BadgeType) -> Self {
        Self {
            id,
            display_name: badge.label().to_string(),
            given_by,
            message: truncate_chars(&message, MAX_MESSAGE_CHARS),
            badge_type: badge,
            background_color: badge.color().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmailAddress {
    pub name: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Recipient {
    pub email_address: EmailAddress,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MessageBody {
    pub content: Option<String>,
}

/// Mailbox message as returned by the message-search endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Message {
    pub id: String,
    pub subject: Option<String>,
    pub from: Option<Recipient>,
    pub body: Option<MessageBody>,
    pub body_preview: Option<String>,
}

impl Message {
    fn sender_address(&self) -> String {
        self.from
            .as_ref()
            .and_then(|f| f.email_address.address.clone())
            .unwrap_or_default()
    }

    fn sender_name(&self) -> Option<String> {
        self.from
            .as_ref()
            .and_then(|f| f.email_address.name.clone())
            .filter(|n| !n.is_empty())
    }

    fn preview_or_body(&self) -> String {
        self.body_preview
            .clone()
            .filter(|p| !p.is_empty())
            .or_else(|| self.body.as_ref().and_then(|b| b.content.clone()))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostAuthor {
    pub display_name: Option<String>,
    pub id: Option<String>,
    pub mail: Option<String>,
}

/// Community post.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommunityPost {
    pub id: String,
    pub content: Option<String>,
    pub author: Option<PostAuthor>,
}

// ---------------------------------------------------------------------------
// Source heuristics
// ---------------------------------------------------------------------------

const RECOGNITION_SUBJECT_MARKERS: &[&str] = &["received praise", "sent you praise", "recognized you"];
const RECOGNITION_SENDER_MARKERS: &[&str] = &["viva", "insights"];
const POST_KEYWORDS: &[&str] = &["praise", "badge", "kudos", "recognition", "thank", "appreciate"];

/// Keywords for the broad scan over high-importance mail. No negative
/// filtering is applied.
pub const SCAN_KEYWORDS: &[&str] = &[
    "praise",
    "thank",
    "recognition",
    "kudos",
    "appreciate",
    "great job",
    "well done",
    "excellent",
    "awesome",
];

/// Whether a message from the recognition search is a recognition event.
pub fn is_recognition_email(message: &Message) -> bool {
    let subject = message.subject.as_deref().unwrap_or("").to_lowercase();
    let sender = message
        .sender_name()
        .unwrap_or_else(|| message.sender_address())
        .to_lowercase();
    let body = message.preview_or_body().to_lowercase();

    RECOGNITION_SUBJECT_MARKERS.iter().any(|m| subject.contains(m))
        || RECOGNITION_SENDER_MARKERS.iter().any(|m| sender.contains(m))
        || body.contains("viva insights")
        || subject.contains("praise")
        || subject.contains("recognition")
}

pub fn is_praise_post(post: &CommunityPost) -> bool {
    let content = post.content.as_deref().unwrap_or("").to_lowercase();
    POST_KEYWORDS.iter().any(|k| content.contains(k))
}

pub fn matches_scan_keywords(message: &Message) -> bool {
    let subject = message.subject.as_deref().unwrap_or("").to_lowercase();
    let preview = message.body_preview.as_deref().unwrap_or("").to_lowercase();
    SCAN_KEYWORDS
        .iter()
        .any(|k| subject.contains(k) || preview.contains(k))
}

/// Name of the person who gave the praise: a `from X` / `by X` subject
/// fragment wins over the message sender.
pub fn extract_giver_name(subject: &str, fallback: &str) -> String {
    SENDER_RE
        .captures(subject)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Pull the praise text out of a message body.
pub fn extract_message(body: &str) -> String {
    if body.is_empty() {
        return DEFAULT_MESSAGE.to_string();
    }
    let text = strip_markup(body);

    for re in [&*LABELED_RE, &*FOLLOW_ON_RE] {
        if let Some(m) = re.captures(&text).and_then(|c| c.get(1)) {
            return truncate_chars(m.as_str().trim(), MAX_MESSAGE_CHARS);
        }
    }

    if let Some(caps) = QUOTED_RE.captures(&text) {
        if let Some(m) = caps.get(1).or_else(|| caps.get(2)) {
            if m.as_str().chars().count() > MIN_QUOTE_CHARS {
                return truncate_chars(m.as_str().trim(), MAX_MESSAGE_CHARS);
            }
        }
    }

    if let Some(sentence) = SENTENCE_SPLIT_RE
        .split(&text)
        .find(|s| s.trim().chars().count() > MIN_SENTENCE_CHARS)
    {
        return truncate_chars(sentence.trim(), MAX_MESSAGE_CHARS);
    }

    let fallback = truncate_chars(text.trim(), MAX_MESSAGE_CHARS);
    if fallback.is_empty() {
        DEFAULT_MESSAGE.to_string()
    } else {
        fallback
    }
}

pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

// ---------------------------------------------------------------------------
// Record builders
// ---------------------------------------------------------------------------

/// Record for a message from the recognition search, or `None` when the
/// message does not look like recognition.
pub fn praise_from_recognition_email(message: &Message) -> Option<PraiseRecord> {
    if !is_recognition_email(message) {
        return None;
    }
    let subject = message.subject.as_deref().unwrap_or("");
    let body = message.preview_or_body();
    let address = message.sender_address();
    let sender = message.sender_name().unwrap_or_else(|| address.clone());

    Some(PraiseRecord::new(
        message.id.clone(),
        PraiseGiver {
            display_name: extract_giver_name(subject, &sender),
            id: address,
            photo_url: String::new(),
        },
        extract_message(&body),
        classify(subject, &body),
    ))
}

pub fn praise_from_post(post: &CommunityPost) -> Option<PraiseRecord> {
    if !is_praise_post(post) {
        return None;
    }
    let content = post.content.as_deref().unwrap_or("");
    let author = post.author.clone().unwrap_or_default();

    Some(PraiseRecord::new(
        post.id.clone(),
        PraiseGiver {
            display_name: author
                .display_name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| DEFAULT_GIVER.into()),
            id: author.id.unwrap_or_default(),
            photo_url: String::new(),
        },
        truncate_chars(content, MAX_POST_CHARS),
        classify("", content),
    ))
}

pub fn praise_from_scanned_message(message: &Message) -> Option<PraiseRecord> {
    if !matches_scan_keywords(message) {
        return None;
    }
    let subject = message.subject.as_deref().unwrap_or("");
    let preview = message.body_preview.as_deref().unwrap_or("");

    Some(PraiseRecord::new(
        message.id.clone(),
        PraiseGiver {
            display_name: message.sender_name().unwrap_or_else(|| DEFAULT_GIVER.into()),
            id: message.sender_address(),
            photo_url: String::new(),
        },
        if preview.is_empty() {
            DEFAULT_MESSAGE.to_string()
        } else {
            preview.to_string()
        },
        classify(subject, preview),
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
