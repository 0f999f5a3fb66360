use crate::error::{Error, Result};
use crate::extension::{ActiveFlag, Extension};
use crate::helpers::{format_date_value, pick_localized};
use crate::http_client::{FetchOptions, Transport};
use crate::models::{
    Chapter, ChapterOptions, ExtensionInfo, Genre, ListOptions, Manga, Page, SortDirection,
};
use crate::normalize::{normalize_chapter, normalize_manga, Mapping};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub const NAME: &str = "MangaDex";
pub const BASE_URL: &str = "https://api.mangadex.org";
pub const COVER_BASE_URL: &str = "https://uploads.mangadex.org/covers";
const ICON: &str = "https://mangadex.org/favicon.ico";
const VERSION: &str = "1.0.0";
const LANGUAGES: &[&str] = &["en", "ja", "ko", "zh", "fr", "de", "es", "pt", "ru", "it"];

const PREFERRED_LANGUAGES: &[&str] = &["en", "ja", "ko"];

const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_CHAPTER_LIMIT: u32 = 100;
const MANGA_INCLUDES: &[&str] = &["cover_art", "author", "artist"];
const CONTENT_RATINGS: &[&str] = &["safe", "suggestive", "erotica", "pornographic"];
const DEFAULT_ORDER_FIELD: &str = "updatedAt";
// at-home quality folder; "data-saver" holds the compressed set
const PAGE_QUALITY: &str = "data";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AtHomeResponse {
    base_url: String,
    chapter: AtHomeChapter,
}

#[derive(Deserialize)]
struct AtHomeChapter {
    hash: String,
    data: Vec<String>,
}

#[derive(Deserialize)]
struct TagData {
    id: String,
    attributes: TagAttributes,
}

#[derive(Deserialize)]
struct TagAttributes {
    #[serde(default)]
    name: Value,
    group: Option<String>,
}

pub struct MangaDex {
    transport: Arc<dyn Transport>,
    base_url: String,
    active: ActiveFlag,
    manga_mapping: Mapping,
    chapter_mapping: Mapping,
}

impl MangaDex {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_base_url(transport, BASE_URL)
    }

    pub fn with_base_url(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            active: ActiveFlag::default(),
            manga_mapping: manga_mapping(),
            chapter_mapping: chapter_mapping(),
        }
    }

    async fn fetch(&self, path: &str, params: Vec<(String, String)>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let body = self
            .transport
            .fetch(&url, FetchOptions::get().with_params(params))
            .await?;
        check_error_body(&body, &url)?;
        Ok(body)
    }
}

/// Query parameters for `GET /manga`. Unknown filter keys are dropped.
pub fn manga_list_params(options: &ListOptions) -> Vec<(String, String)> {
    let limit = options.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = options
        .page
        .map(|p| p.saturating_sub(1).saturating_mul(limit))
        .unwrap_or(0);

    let mut params = vec![
        ("limit".to_string(), limit.to_string()),
        ("offset".to_string(), offset.to_string()),
    ];
    push_list(&mut params, "includes[]", MANGA_INCLUDES.iter().map(|s| s.to_string()));

    match options.filter("contentRating") {
        Some(ratings) => push_list(&mut params, "contentRating[]", ratings.as_list()),
        None => push_list(&mut params, "contentRating[]", CONTENT_RATINGS.iter().map(|s| s.to_string())),
    }

    let (field, direction) = options
        .order
        .as_ref()
        .map(|o| (o.field.as_str(), o.direction))
        .unwrap_or((DEFAULT_ORDER_FIELD, SortDirection::Desc));
    params.push((format!("order[{}]", field), direction.as_str().to_string()));

    if let Some(title) = options.filter("title").and_then(|v| v.as_text()) {
        params.push(("title".to_string(), title));
    }
    if let Some(year) = options.filter("year").and_then(|v| v.as_text()) {
        params.push(("year".to_string(), year));
    }
    for key in ["authors", "artists", "status", "originalLanguage"] {
        if let Some(values) = options.filter(key) {
            push_list(&mut params, &format!("{}[]", key), values.as_list());
        }
    }
    for (key, default_mode) in [("includedTags", "AND"), ("excludedTags", "OR")] {
        if let Some(tags) = options.filter(key) {
            push_list(&mut params, &format!("{}[]", key), tags.as_list());
            let mode_key = format!("{}Mode", key);
            let mode = options
                .filter(&mode_key)
                .and_then(|v| v.as_text())
                .unwrap_or_else(|| default_mode.to_string());
            params.push((mode_key, mode));
        }
    }
    params
}

/// Query parameters for `GET /chapter`.
pub fn chapter_list_params(manga_id: &str, options: &ChapterOptions) -> Vec<(String, String)> {
    let mut params = vec![
        ("manga".to_string(), manga_id.to_string()),
        ("limit".to_string(), options.limit.unwrap_or(DEFAULT_CHAPTER_LIMIT).to_string()),
        ("offset".to_string(), options.offset.unwrap_or(0).to_string()),
        ("includes[]".to_string(), "scanlation_group".to_string()),
        ("order[chapter]".to_string(), "desc".to_string()),
    ];
    if let Some(languages) = &options.translated_language {
        push_list(&mut params, "translatedLanguage[]", languages.codes());
    }
    params
}

fn push_list(params: &mut Vec<(String, String)>, key: &str, values: impl IntoIterator<Item = String>) {
    params.extend(values.into_iter().map(|v| (key.to_string(), v)));
}

/// MangaDex can answer 200 with `{"result": "error", "errors": [...]}`.
fn check_error_body(body: &Value, url: &str) -> Result<()> {
    if body["result"].as_str() != Some("error") {
        return Ok(());
    }
    let first = &body["errors"][0];
    if first["status"].as_u64() == Some(404) {
        return Err(Error::NotFound(url.to_string()));
    }
    Err(Error::Shape(format!(
        "{} answered with error: {}",
        url,
        first["detail"].as_str().unwrap_or("no detail")
    )))
}

fn data_array(body: &Value) -> Result<&Vec<Value>> {
    body["data"]
        .as_array()
        .ok_or_else(|| Error::Shape("expected a `data` array".to_string()))
}

fn data_object(body: &Value) -> Result<&Value> {
    match &body["data"] {
        data @ Value::Object(_) => Ok(data),
        _ => Err(Error::Shape("expected a `data` object".to_string())),
    }
}

fn relationships<'a>(record: &'a Value, rel_type: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
    record["relationships"]
        .as_array()
        .into_iter()
        .flatten()
        .filter(move |rel| rel["type"].as_str() == Some(rel_type))
}

fn localized_or_empty(map: &Value) -> Value {
    Value::String(pick_localized(map, PREFERRED_LANGUAGES).unwrap_or_default())
}

fn tag_name(tag: &Value) -> String {
    pick_localized(&tag["attributes"]["name"], &["en"])
        .or_else(|| tag["id"].as_str().map(str::to_string))
        .unwrap_or_default()
}

fn cover_url(manga: &Value) -> Option<String> {
    let id = manga["id"].as_str()?;
    relationships(manga, "cover_art")
        .find_map(|rel| rel["attributes"]["fileName"].as_str())
        .map(|file| format!("{}/{}/{}", COVER_BASE_URL, id, file))
}

fn extract_creators(manga: &Value, role: &str) -> Value {
    let names: Vec<String> = relationships(manga, role)
        .filter_map(|rel| {
            rel["attributes"]["name"]
                .as_str()
                .or_else(|| rel["id"].as_str())
                .map(str::to_string)
        })
        .collect();
    json!(names)
}

fn extract_alt_titles(manga: &Value) -> Value {
    let titles: Vec<&str> = manga["attributes"]["altTitles"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .flat_map(|entry| entry.values().filter_map(Value::as_str))
        .collect();
    json!(titles)
}

fn manga_tags(manga: &Value) -> impl Iterator<Item = &Value> {
    manga["attributes"]["tags"].as_array().into_iter().flatten()
}

fn extract_genres(manga: &Value) -> Value {
    let genres: Vec<String> = manga_tags(manga)
        .filter(|tag| tag["attributes"]["group"].as_str() == Some("genre"))
        .map(tag_name)
        .collect();
    json!(genres)
}

fn extract_tags(manga: &Value) -> Value {
    let tags: Vec<Value> = manga_tags(manga)
        .map(|tag| {
            json!({
                "id": tag["id"].as_str().unwrap_or_default(),
                "name": tag_name(tag),
                "group": tag["attributes"]["group"],
            })
        })
        .collect();
    json!(tags)
}

/// Record id as text; numeric ids are rendered, other shapes pass through
/// and fail normalization for that record only.
fn id_text(record: &Value) -> Value {
    match &record["id"] {
        Value::Number(n) => Value::String(n.to_string()),
        other => other.clone(),
    }
}

/// Normalize every record of a list, dropping the ones that do not fit.
fn normalize_each<T>(records: &[Value], normalize: impl Fn(&Value) -> Result<T>) -> Vec<T> {
    records
        .iter()
        .filter_map(|record| match normalize(record) {
            Ok(item) => Some(item),
            Err(e) => {
                log::warn!("Skipping {} record {}: {}", NAME, record["id"], e);
                None
            }
        })
        .collect()
}

/// MangaDex sends chapter and volume numbers as strings.
fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn manga_mapping() -> Mapping {
    Mapping::new()
        .derive("id", id_text)
        .derive("sourceId", id_text)
        .derive("title", |m| localized_or_empty(&m["attributes"]["title"]))
        .derive("altTitles", extract_alt_titles)
        .derive("description", |m| localized_or_empty(&m["attributes"]["description"]))
        .derive("authors", |m| extract_creators(m, "author"))
        .derive("artists", |m| extract_creators(m, "artist"))
        .derive("genres", extract_genres)
        .derive("tags", extract_tags)
        .derive("status", |m| {
            m["attributes"]["status"]
                .as_str()
                .map(|s| json!(s))
                .unwrap_or_else(|| json!("unknown"))
        })
        .derive("cover", |m| json!(cover_url(m)))
        .derive("covers", |m| json!(cover_url(m).into_iter().collect::<Vec<_>>()))
        .derive("lastUpdated", |m| format_date_value(&m["attributes"]["updatedAt"]))
        .derive("source", |_| json!(NAME))
}

pub fn chapter_mapping() -> Mapping {
    Mapping::new()
        .derive("id", id_text)
        .derive("sourceId", id_text)
        .derive("mangaId", |c| {
            json!(relationships(c, "manga").find_map(|rel| rel["id"].as_str()))
        })
        .derive("title", |c| json!(c["attributes"]["title"].as_str().unwrap_or_default()))
        .derive("chapterNumber", |c| json!(parse_number(&c["attributes"]["chapter"])))
        .derive("volume", |c| {
            json!(parse_number(&c["attributes"]["volume"]).map(|v| v.trunc() as i64))
        })
        .derive("language", |c| c["attributes"]["translatedLanguage"].clone())
        .derive("pages", |c| json!(c["attributes"]["pages"].as_u64().unwrap_or(0)))
        .derive("published", |c| format_date_value(&c["attributes"]["publishAt"]))
        .derive("group", |c| {
            json!(relationships(c, "scanlation_group").find_map(|rel| {
                rel["attributes"]["name"].as_str().or_else(|| rel["id"].as_str())
            }))
        })
        .derive("source", |_| json!(NAME))
}

#[async_trait]
impl Extension for MangaDex {
    fn info(&self) -> ExtensionInfo {
        ExtensionInfo {
            name: NAME.to_string(),
            version: VERSION.to_string(),
            icon: Some(ICON.to_string()),
            lang: LANGUAGES.iter().map(|l| l.to_string()).collect(),
        }
    }

    fn active_flag(&self) -> &ActiveFlag {
        &self.active
    }

    async fn get_all_manga(&self, options: &ListOptions) -> Result<Vec<Manga>> {
        let body = self.fetch("/manga", manga_list_params(options)).await?;
        Ok(normalize_each(data_array(&body)?, |record| {
            normalize_manga(record, &self.manga_mapping)
        }))
    }

    async fn get_manga(&self, id: &str) -> Result<Manga> {
        let mut params = Vec::new();
        push_list(&mut params, "includes[]", MANGA_INCLUDES.iter().map(|s| s.to_string()));
        let body = self.fetch(&format!("/manga/{}", id), params).await?;
        normalize_manga(data_object(&body)?, &self.manga_mapping)
    }

    async fn get_chapters(&self, manga_id: &str, options: &ChapterOptions) -> Result<Vec<Chapter>> {
        let body = self
            .fetch("/chapter", chapter_list_params(manga_id, options))
            .await?;
        Ok(normalize_each(data_array(&body)?, |record| {
            normalize_chapter(record, &self.chapter_mapping)
        }))
    }

    async fn get_pages(&self, chapter_id: &str) -> Result<Vec<Page>> {
        let body = self
            .fetch(&format!("/at-home/server/{}", chapter_id), Vec::new())
            .await?;
        let at_home: AtHomeResponse = serde_json::from_value(body)
            .map_err(|e| Error::Shape(format!("at-home response: {}", e)))?;
        let base_url = at_home.base_url.trim_end_matches('/');

        Ok(at_home
            .chapter
            .data
            .iter()
            .enumerate()
            .map(|(index, file)| Page {
                url: format!("{}/{}/{}/{}", base_url, PAGE_QUALITY, at_home.chapter.hash, file),
                index,
                chapter_id: Some(chapter_id.to_string()),
            })
            .collect())
    }

    async fn get_genres(&self) -> Result<Vec<Genre>> {
        let body = self.fetch("/manga/tag", Vec::new()).await?;
        let tags: Vec<TagData> = serde_json::from_value(Value::Array(data_array(&body)?.clone()))
            .map_err(|e| Error::Shape(format!("tag list: {}", e)))?;
        Ok(tags
            .into_iter()
            .map(|tag| {
                let name = pick_localized(&tag.attributes.name, &["en"]).unwrap_or_else(|| tag.id.clone());
                Genre {
                    id: tag.id,
                    name,
                    group: tag.attributes.group,
                }
            })
            .collect())
    }
}
