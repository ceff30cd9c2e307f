//! Site lists and list columns, for choosing what a carousel card reads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use homepage_core::carousel::DEFAULT_SITE_URL;

use crate::api::{list_endpoint, ListSource};

/// System fields never offered as a column choice.
pub const EXCLUDED_FIELDS: &[&str] = &[
    "ContentType",
    "Compliance_x0020_Asset_x0020_Id",
    "_ComplianceFlags",
    "_ComplianceTag",
    "_ComplianceTagWrittenTime",
    "_ComplianceTagUserId",
    "_IsRecord",
    "Edit",
    "DocIcon",
    "ItemChildCount",
    "FolderChildCount",
    "_UIVersionString",
    "AppAuthor",
    "AppEditor",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListInfo {
    pub title: String,
    pub id: String,
    #[serde(default)]
    pub base_template: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FieldInfo {
    pub internal_name: String,
    pub title: String,
    pub type_as_string: String,
}

impl FieldInfo {
    /// Dropdown text: display title, the internal name in parentheses when
    /// it differs, then the field type.
    pub fn label(&self) -> String {
        if self.title == self.internal_name {
            format!("{} \u{2014} {}", self.internal_name, self.type_as_string)
        } else {
            format!("{} ({}) \u{2014} {}", self.title, self.internal_name, self.type_as_string)
        }
    }
}

fn site_or_default(site_url: &str) -> &str {
    let trimmed = site_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_SITE_URL
    } else {
        trimmed
    }
}

fn parse_values<T: serde::de::DeserializeOwned>(body: Value) -> Result<Vec<T>, serde_json::Error> {
    #[derive(Deserialize)]
    struct Collection<T> {
        value: Vec<T>,
    }
    serde_json::from_value::<Collection<T>>(body).map(|c| c.value)
}

/// Visible lists on a site, ordered by title. Empty on any failure.
pub async fn fetch_lists<S>(source: &S, site_url: &str) -> Vec<ListInfo>
where
    S: ListSource + ?Sized,
{
    let site = site_or_default(site_url);
    let url = format!(
        "{site}/_api/web/lists?$filter=Hidden eq false&$select=Title,Id,BaseTemplate&$orderby=Title"
    );

    match source.get_json(&url).await.map(parse_values::<ListInfo>) {
        Ok(Ok(lists)) => lists,
        Ok(Err(e)) => {
            tracing::warn!(site = %site, error = %e, "Unexpected lists payload");
            Vec::new()
        }
        Err(e) => {
            tracing::warn!(site = %site, error = %e, "Failed to fetch site lists");
            Vec::new()
        }
    }
}

/// Visible columns of a list, minus [`EXCLUDED_FIELDS`]. Empty when no list
/// is named or on any failure.
pub async fn fetch_columns<S>(source: &S, site_url: &str, list_name: &str) -> Vec<FieldInfo>
where
    S: ListSource + ?Sized,
{
    if list_name.trim().is_empty() {
        return Vec::new();
    }
    let url = format!(
        "{}/fields?$filter=Hidden eq false&$select=InternalName,Title,TypeAsString,ReadOnlyField&$orderby=Title",
        list_endpoint(site_or_default(site_url), list_name)
    );

    match source.get_json(&url).await.map(parse_values::<FieldInfo>) {
        Ok(Ok(fields)) => fields
            .into_iter()
            .filter(|f| !EXCLUDED_FIELDS.contains(&f.internal_name.as_str()))
            .collect(),
        Ok(Err(e)) => {
            tracing::warn!(list = %list_name, error = %e, "Unexpected fields payload");
            Vec::new()
        }
        Err(e) => {
            tracing::warn!(list = %list_name, error = %e, "Failed to fetch list columns");
            Vec::new()
        }
    }
}
