/// MangaDex adapter tests against canned API payloads.
/// No network access: every request goes through `StubTransport`.
use async_trait::async_trait;
use manga_extensions::sources::mangadex::{self, MangaDex};
use manga_extensions::{
    bootstrap_with_transport, ChapterOptions, Config, Error, Extension, FetchOptions,
    LanguageFilter, ListOptions, MangaStatus, Result, Transport,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

enum Reply {
    Json(Value),
    Status(u16),
}

#[derive(Default)]
struct StubTransport {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl StubTransport {
    fn with(self, path: &str, reply: Reply) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(format!("{}{}", mangadex::BASE_URL, path), reply);
        self
    }

    fn last_params(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().last().map(|(_, p)| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn fetch(&self, url: &str, options: FetchOptions) -> Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), options.params.clone()));
        match self.replies.lock().unwrap().get(url) {
            Some(Reply::Json(body)) => Ok(body.clone()),
            Some(Reply::Status(404)) | None => Err(Error::NotFound(url.to_string())),
            Some(Reply::Status(status)) => Err(Error::Http {
                status: *status,
                url: url.to_string(),
            }),
        }
    }
}

fn manga_record(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "type": "manga",
        "attributes": {
            "title": { "en": title },
            "altTitles": [],
            "description": { "en": format!("About {}", title) },
            "status": "completed",
            "updatedAt": "2022-08-10T00:00:00+00:00",
            "tags": []
        },
        "relationships": [
            { "id": "cov", "type": "cover_art", "attributes": { "fileName": format!("{}.png", id) } }
        ]
    })
}

fn adapter(transport: StubTransport) -> (Arc<StubTransport>, MangaDex) {
    let transport = Arc::new(transport);
    let extension = MangaDex::new(transport.clone());
    (transport, extension)
}

fn has(params: &[(String, String)], key: &str, value: &str) -> bool {
    params.iter().any(|(k, v)| k == key && v == value)
}

#[tokio::test]
async fn test_get_all_manga_normalizes_each_record() {
    let (transport, md) = adapter(StubTransport::default().with(
        "/manga",
        Reply::Json(json!({
            "result": "ok",
            "data": [manga_record("m1", "Pluto"), manga_record("m2", "Monster")]
        })),
    ));

    let manga = md
        .get_all_manga(&ListOptions {
            page: Some(2),
            ..ListOptions::default()
        })
        .await
        .unwrap();
    assert_eq!(manga.len(), 2);
    assert_eq!(manga[0].title.as_deref(), Some("Pluto"));
    assert_eq!(manga[1].status, MangaStatus::Completed);
    assert_eq!(
        manga[1].cover.as_deref(),
        Some("https://uploads.mangadex.org/covers/m2/m2.png")
    );

    let params = transport.last_params();
    assert!(has(&params, "offset", "20"));
    assert!(has(&params, "includes[]", "author"));
}

#[tokio::test]
async fn test_malformed_record_does_not_sink_the_list() {
    let mut numeric = manga_record("unused", "Numeric");
    numeric["id"] = json!(42);
    let mut broken = manga_record("unused", "Broken");
    broken["id"] = json!({ "nested": true });

    let (_, md) = adapter(StubTransport::default().with(
        "/manga",
        Reply::Json(json!({ "data": [numeric, broken, manga_record("m1", "Pluto")] })),
    ));
    let manga = md.get_all_manga(&ListOptions::default()).await.unwrap();
    let ids: Vec<&str> = manga.iter().filter_map(|m| m.id.as_deref()).collect();
    assert_eq!(ids, vec!["42", "m1"]);
}

#[tokio::test]
async fn test_search_sends_title_filter() {
    let (transport, md) = adapter(
        StubTransport::default().with("/manga", Reply::Json(json!({ "data": [] }))),
    );
    let results = md
        .search("20th century boys", &ListOptions::default().with_filter("mood", "grim"))
        .await
        .unwrap();
    assert!(results.is_empty());

    let params = transport.last_params();
    assert!(has(&params, "title", "20th century boys"));
    assert!(!params.iter().any(|(k, _)| k.contains("mood")));
}

#[tokio::test]
async fn test_missing_data_is_shape_error() {
    let (_, md) = adapter(
        StubTransport::default().with("/manga", Reply::Json(json!({ "result": "ok" }))),
    );
    let err = md.get_all_manga(&ListOptions::default()).await.unwrap_err();
    assert!(matches!(err, Error::Shape(_)));
}

#[tokio::test]
async fn test_get_manga_and_not_found() {
    let (_, md) = adapter(
        StubTransport::default()
            .with("/manga/m1", Reply::Json(json!({ "data": manga_record("m1", "Pluto") })))
            .with(
                "/manga/gone",
                Reply::Json(json!({ "result": "error", "errors": [{ "status": 404 }] })),
            ),
    );
    let manga = md.get_manga("m1").await.unwrap();
    assert_eq!(manga.source_id.as_deref(), Some("m1"));
    assert_eq!(manga.description.as_deref(), Some("About Pluto"));

    assert!(matches!(md.get_manga("gone").await, Err(Error::NotFound(_))));
    assert!(matches!(md.get_manga("never").await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_transport_errors_propagate() {
    let (_, md) = adapter(StubTransport::default().with("/manga/tag", Reply::Status(503)));
    assert!(matches!(
        md.get_genres().await,
        Err(Error::Http { status: 503, .. })
    ));
}

#[tokio::test]
async fn test_get_chapters_with_language_filter() {
    let (transport, md) = adapter(StubTransport::default().with(
        "/chapter",
        Reply::Json(json!({
            "data": [{
                "id": "c1",
                "attributes": { "chapter": "1", "translatedLanguage": "es", "pages": 30 },
                "relationships": [{ "id": "m1", "type": "manga" }]
            }]
        })),
    ));
    let options = ChapterOptions {
        translated_language: Some(LanguageFilter::Many(vec!["es".into(), "en".into()])),
        ..ChapterOptions::default()
    };
    let chapters = md.get_chapters("m1", &options).await.unwrap();
    assert_eq!(chapters.len(), 1);
    assert_eq!(chapters[0].manga_id.as_deref(), Some("m1"));
    assert_eq!(chapters[0].chapter_number, Some(1.0));
    assert_eq!(chapters[0].language, "es");

    let params = transport.last_params();
    assert!(has(&params, "manga", "m1"));
    assert!(has(&params, "translatedLanguage[]", "es"));
    assert!(has(&params, "translatedLanguage[]", "en"));
}

#[tokio::test]
async fn test_get_pages_are_indexed_in_order() {
    let (_, md) = adapter(StubTransport::default().with(
        "/at-home/server/c1",
        Reply::Json(json!({
            "result": "ok",
            "baseUrl": "https://node.mangadex.network/",
            "chapter": { "hash": "h4sh", "data": ["1.png", "2.png", "3.png"], "dataSaver": [] }
        })),
    ));
    let pages = md.get_pages("c1").await.unwrap();
    let indices: Vec<usize> = pages.iter().map(|p| p.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert_eq!(pages[2].url, "https://node.mangadex.network/data/h4sh/3.png");
    assert!(pages.iter().all(|p| p.chapter_id.as_deref() == Some("c1")));
}

#[tokio::test]
async fn test_malformed_at_home_is_shape_error() {
    let (_, md) = adapter(StubTransport::default().with(
        "/at-home/server/c1",
        Reply::Json(json!({ "baseUrl": "https://node.invalid" })),
    ));
    assert!(matches!(md.get_pages("c1").await, Err(Error::Shape(_))));
}

#[tokio::test]
async fn test_get_genres() {
    let (_, md) = adapter(StubTransport::default().with(
        "/manga/tag",
        Reply::Json(json!({
            "data": [
                { "id": "t1", "attributes": { "name": { "en": "Action" }, "group": "genre" } },
                { "id": "t2", "attributes": { "name": { "ja": "日常" }, "group": "theme" } },
                { "id": "t3", "attributes": { "name": {} } }
            ]
        })),
    ));
    let genres = md.get_genres().await.unwrap();
    assert_eq!(genres.len(), 3);
    assert_eq!(genres[0].name, "Action");
    assert_eq!(genres[1].name, "日常");
    assert_eq!(genres[2].name, "t3");
    assert_eq!(genres[2].group, None);
}

#[tokio::test]
async fn test_info_is_static() {
    let (transport, md) = adapter(StubTransport::default());
    let info = md.info();
    assert_eq!(info.name, "MangaDex");
    assert!(info.lang.contains(&"ja".to_string()));
    assert!(transport.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_bootstrap_honours_inactive_config() {
    let transport: Arc<StubTransport> = Arc::new(
        StubTransport::default()
            .with("/manga", Reply::Json(json!({ "data": [manga_record("m1", "Pluto")] })))
            .with("/manga/m1", Reply::Json(json!({ "data": manga_record("m1", "Pluto") }))),
    );
    let config = Config::from_toml("[sources]\ninactive = [\"MangaDex\", \"Unknown\"]").unwrap();
    let mut api = bootstrap_with_transport(&config, transport.clone());

    assert_eq!(api.extensions().len(), 1);
    assert!(api.active_extensions().is_empty());
    assert!(api.get_all_manga(&ListOptions::default()).await.is_empty());
    assert!(api.get_manga("MangaDex", "m1").await.is_some());
    assert!(api.get_manga("MangaDex", "nope").await.is_none());

    api.set_extension_active("MangaDex", true);
    let manga = api.get_all_manga(&ListOptions::default()).await;
    assert_eq!(manga.len(), 1);
    assert_eq!(manga[0].source.as_deref(), Some("MangaDex"));
}
