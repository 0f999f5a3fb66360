use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum MangaStatus {
    Ongoing,
    Completed,
    Hiatus,
    Cancelled,
    #[default]
    Unknown,
}

impl MangaStatus {
    /// Lenient parse: anything unrecognised is `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "ongoing" => MangaStatus::Ongoing,
            "completed" => MangaStatus::Completed,
            "hiatus" => MangaStatus::Hiatus,
            "cancelled" | "canceled" => MangaStatus::Cancelled,
            _ => MangaStatus::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for MangaStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(MangaStatus::parse).unwrap_or_default())
    }
}

/// Treats an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn null_as_default_language<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|l| !l.is_empty())
        .unwrap_or_else(default_language))
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Manga {
    pub id: Option<String>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub alt_titles: Vec<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub authors: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub artists: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub status: MangaStatus,
    pub cover: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub covers: Vec<String>,
    // ISO-8601
    pub last_updated: Option<String>,
    // 0-10
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub views: u64,
    pub source: Option<String>,
    pub source_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: Option<String>,
    pub manga_id: Option<String>,
    pub title: Option<String>,
    pub chapter_number: Option<f64>,
    pub volume: Option<i64>,
    #[serde(default = "default_language", deserialize_with = "null_as_default_language")]
    pub language: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pages: u32,
    pub published: Option<String>,
    /// Scanlation group name, or its id when the name is unavailable.
    pub group: Option<String>,
    pub source: Option<String>,
    pub source_id: Option<String>,
}

impl Default for Chapter {
    fn default() -> Self {
        Self {
            id: None,
            manga_id: None,
            title: None,
            chapter_number: None,
            volume: None,
            language: default_language(),
            pages: 0,
            published: None,
            group: None,
            source: None,
            source_id: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub url: String,
    pub index: usize,
    pub chapter_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct Genre {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
}

pub type Tag = Genre;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ExtensionInfo {
    pub name: String,
    pub version: String,
    pub icon: Option<String>,
    pub lang: Vec<String>,
}

/// One entry of a free-form filter bag. Which keys mean anything is up to the adapter.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum FilterValue {
    Number(i64),
    Text(String),
    List(Vec<String>),
}

impl FilterValue {
    pub fn as_text(&self) -> Option<String> {
        match self {
            FilterValue::Number(n) => Some(n.to_string()),
            FilterValue::Text(s) => Some(s.clone()),
            FilterValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Vec<String> {
        match self {
            FilterValue::Number(n) => vec![n.to_string()],
            FilterValue::Text(s) => vec![s.clone()],
            FilterValue::List(items) => items.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Number(_) => false,
            FilterValue::Text(s) => s.is_empty(),
            FilterValue::List(items) => items.is_empty(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Text(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        FilterValue::Number(n)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(items: Vec<String>) -> Self {
        FilterValue::List(items)
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(items: Vec<&str>) -> Self {
        FilterValue::List(items.into_iter().map(String::from).collect())
    }
}

pub type Filters = BTreeMap<String, FilterValue>;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ListOptions {
    /// 1-based
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub filters: Filters,
    pub order: Option<SortOrder>,
    /// Restricts facade listing/search to a single source.
    pub source: Option<String>,
}

impl ListOptions {
    pub fn for_source(name: impl Into<String>) -> Self {
        Self {
            source: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn filter(&self, key: &str) -> Option<&FilterValue> {
        self.filters.get(key).filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum LanguageFilter {
    One(String),
    Many(Vec<String>),
}

impl LanguageFilter {
    pub fn codes(&self) -> Vec<String> {
        match self {
            LanguageFilter::One(code) => vec![code.clone()],
            LanguageFilter::Many(codes) => codes.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ChapterOptions {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub translated_language: Option<LanguageFilter>,
}
