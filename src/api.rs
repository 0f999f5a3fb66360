//! Facade over the registered extensions
//!
//! `MangaApi` owns the [`Registry`] and the list of active extension names.
//! Listing, search and genre calls fan out over the active set concurrently;
//! a source that fails is logged and left out, it never aborts its siblings.
//! Lookups addressed to one source (`get_manga`, `get_chapters`, `get_pages`,
//! `get_genres`) ignore the active flag, while listing and search honour it
//! even when a single source is named in [`ListOptions::source`].
//!
//! Nothing here returns an error: failures are logged and surface as `None`
//! or an empty collection.

use crate::error::{Error, Result};
use crate::extension::Extension;
use crate::models::{Chapter, ChapterOptions, ExtensionInfo, Genre, ListOptions, Manga, Page};
use crate::registry::Registry;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;

#[derive(Default)]
pub struct MangaApi {
    registry: Registry,
    /// Names eligible for fan-out, in activation order
    active: Vec<String>,
}

impl MangaApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extensions(extensions: impl IntoIterator<Item = Arc<dyn Extension>>) -> Self {
        let mut api = Self::new();
        for extension in extensions {
            api.register_extension(extension);
        }
        api
    }

    pub fn register_extension(&mut self, extension: Arc<dyn Extension>) {
        let name = extension.name();
        if name.trim().is_empty() {
            log::error!("Invalid extension provided: empty name");
            return;
        }

        let active = extension.is_active();
        self.registry.register(extension);
        self.active.retain(|n| n != &name);
        if active {
            self.active.push(name.clone());
        }
        log::info!("Registered extension '{}' (active: {})", name, active);
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn extensions(&self) -> Vec<ExtensionInfo> {
        self.registry
            .names()
            .iter()
            .filter_map(|name| self.registry.get_by_name(name))
            .map(|ext| ext.info())
            .collect()
    }

    pub fn extension(&self, name: &str) -> Option<Arc<dyn Extension>> {
        self.registry.get_by_name(name)
    }

    /// Returns the resulting active state, or `false` for an unknown name.
    pub fn set_extension_active(&mut self, name: &str, active: bool) -> bool {
        let Some(extension) = self.registry.get_by_name(name) else {
            log::error!("Extension '{}' not found", name);
            return false;
        };

        let state = extension.set_active(active);
        if state {
            if !self.active.iter().any(|n| n == name) {
                self.active.push(name.to_string());
            }
        } else {
            self.active.retain(|n| n != name);
        }
        log::info!("Extension '{}' active: {}", name, state);
        state
    }

    pub fn active_names(&self) -> &[String] {
        &self.active
    }

    pub fn active_extensions(&self) -> Vec<ExtensionInfo> {
        self.active
            .iter()
            .filter_map(|name| self.registry.get_by_name(name))
            .map(|ext| ext.info())
            .collect()
    }

    /// All manga from every active source, or from `options.source` alone.
    pub async fn get_all_manga(&self, options: &ListOptions) -> Vec<Manga> {
        if let Some(source) = &options.source {
            let Some(extension) = self.active_target(source) else {
                return Vec::new();
            };
            return extension.get_all_manga(options).await.unwrap_or_else(|e| {
                log::error!("Error fetching manga from {}: {}", source, e);
                Vec::new()
            });
        }

        let options = options.clone();
        let outcomes = self
            .fan_out(move |ext| {
                let options = options.clone();
                async move { ext.get_all_manga(&options).await }
            })
            .await;
        concat_successes("fetching manga", outcomes)
    }

    /// Same source selection as [`MangaApi::get_all_manga`], applied to `search`.
    pub async fn search(&self, query: &str, options: &ListOptions) -> Vec<Manga> {
        if let Some(source) = &options.source {
            let Some(extension) = self.active_target(source) else {
                return Vec::new();
            };
            return extension.search(query, options).await.unwrap_or_else(|e| {
                log::error!("Error searching manga from {}: {}", source, e);
                Vec::new()
            });
        }

        let options = options.clone();
        let query = query.to_string();
        let outcomes = self
            .fan_out(move |ext| {
                let options = options.clone();
                let query = query.clone();
                async move { ext.search(&query, &options).await }
            })
            .await;
        concat_successes("searching manga", outcomes)
    }

    pub async fn get_manga(&self, source: &str, id: &str) -> Option<Manga> {
        let extension = self.lookup(source)?;
        match extension.get_manga(id).await {
            Ok(manga) => Some(manga),
            Err(e) => {
                log::error!("Error fetching manga {} from {}: {}", id, source, e);
                None
            }
        }
    }

    pub async fn get_chapters(&self, source: &str, manga_id: &str, options: &ChapterOptions) -> Vec<Chapter> {
        let Some(extension) = self.lookup(source) else {
            return Vec::new();
        };
        extension
            .get_chapters(manga_id, options)
            .await
            .unwrap_or_else(|e| {
                log::error!("Error fetching chapters for manga {} from {}: {}", manga_id, source, e);
                Vec::new()
            })
    }

    pub async fn get_pages(&self, source: &str, chapter_id: &str) -> Vec<Page> {
        let Some(extension) = self.lookup(source) else {
            return Vec::new();
        };
        extension.get_pages(chapter_id).await.unwrap_or_else(|e| {
            log::error!("Error fetching pages for chapter {} from {}: {}", chapter_id, source, e);
            Vec::new()
        })
    }

    pub async fn get_genres(&self, source: &str) -> Vec<Genre> {
        let Some(extension) = self.lookup(source) else {
            return Vec::new();
        };
        extension.get_genres().await.unwrap_or_else(|e| {
            log::error!("Error fetching genres from {}: {}", source, e);
            Vec::new()
        })
    }

    /// Genres per active source; a failing source maps to an empty list.
    pub async fn get_all_genres(&self) -> HashMap<String, Vec<Genre>> {
        self.fan_out(|ext| async move { ext.get_genres().await })
            .await
            .into_iter()
            .map(|(name, outcome)| {
                let genres = outcome.unwrap_or_else(|e| {
                    log::error!("Error fetching genres from {}: {}", name, e);
                    Vec::new()
                });
                (name, genres)
            })
            .collect()
    }

    fn lookup(&self, source: &str) -> Option<Arc<dyn Extension>> {
        let extension = self.registry.get_by_name(source);
        if extension.is_none() {
            log::error!("Extension '{}' not found", source);
        }
        extension
    }

    fn active_target(&self, source: &str) -> Option<Arc<dyn Extension>> {
        match self.registry.get_by_name(source) {
            Some(extension) if extension.is_active() => Some(extension),
            _ => {
                log::error!("Extension '{}' not found or not active", source);
                None
            }
        }
    }

    /// Runs `op` once per active extension, each on its own task, and waits
    /// for every one of them. Outcomes come back in active-list order.
    async fn fan_out<T, F, Fut>(&self, op: F) -> Vec<(String, Result<T>)>
    where
        F: Fn(Arc<dyn Extension>) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let handles: Vec<(String, JoinHandle<Result<T>>)> = self
            .active
            .iter()
            .filter_map(|name| {
                self.registry
                    .get_by_name(name)
                    .map(|ext| (name.clone(), tokio::spawn(op(ext))))
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let outcome = match handle.await {
                Ok(result) => result,
                Err(e) => Err(Error::Task(e.to_string())),
            };
            outcomes.push((name, outcome));
        }
        outcomes
    }
}

fn concat_successes<T>(what: &str, outcomes: Vec<(String, Result<Vec<T>>)>) -> Vec<T> {
    let mut results = Vec::new();
    for (name, outcome) in outcomes {
        match outcome {
            Ok(items) => results.extend(items),
            Err(e) => log::error!("Error {} from {}: {}", what, name, e),
        }
    }
    results
}
