// Library interface for manga_extensions
// Registry, normalizer and fan-out aggregator over manga source APIs

pub mod api;
pub mod config;
pub mod error;
pub mod extension;
pub mod helpers;
pub mod http_client;
pub mod models;
pub mod normalize;
pub mod registry;
pub mod sources;

pub use api::MangaApi;
pub use config::Config;
pub use error::{Error, Result};
pub use extension::{ActiveFlag, Extension};
pub use http_client::{FetchOptions, HttpClient, Transport};
pub use models::{
    Chapter, ChapterOptions, ExtensionInfo, FilterValue, Filters, Genre, LanguageFilter,
    ListOptions, Manga, MangaStatus, Page, SortDirection, SortOrder, Tag,
};
pub use registry::Registry;

use std::sync::Arc;

/// Build the facade over the built-in sources using the HTTP transport from `config`.
pub fn bootstrap(config: &Config) -> Result<MangaApi> {
    let transport: Arc<dyn Transport> = Arc::new(config.http.create_http_client()?);
    Ok(bootstrap_with_transport(config, transport))
}

/// Same as [`bootstrap`] with a caller-supplied transport.
pub fn bootstrap_with_transport(config: &Config, transport: Arc<dyn Transport>) -> MangaApi {
    let mut api = MangaApi::with_extensions(sources::builtin_extensions(transport));
    for name in api.registry().names() {
        if config.is_inactive(&name) {
            api.set_extension_active(&name, false);
        }
    }
    for name in &config.sources.inactive {
        if !api.registry().contains(name) {
            log::warn!("Unknown source '{}' in [sources].inactive", name);
        }
    }
    api
}
