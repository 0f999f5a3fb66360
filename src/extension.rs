//! The capability contract every manga source implements.
//!
//! Network operations have provided defaults that fail with
//! [`Error::NotImplemented`]; an adapter overrides the ones its upstream
//! supports. `search` is provided in terms of `get_all_manga`.

use crate::error::{Error, Result};
use crate::models::{Chapter, ChapterOptions, ExtensionInfo, Genre, ListOptions, Manga, Page};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

/// An adapter's own active switch. Extensions start active.
#[derive(Debug)]
pub struct ActiveFlag(AtomicBool);

impl ActiveFlag {
    pub fn new(active: bool) -> Self {
        Self(AtomicBool::new(active))
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Returns the resulting state.
    pub fn set(&self, active: bool) -> bool {
        self.0.store(active, Ordering::SeqCst);
        active
    }
}

impl Default for ActiveFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
pub trait Extension: Send + Sync {
    /// Static metadata; `name` is the registry key.
    fn info(&self) -> ExtensionInfo;

    fn active_flag(&self) -> &ActiveFlag;

    fn name(&self) -> String {
        self.info().name
    }

    fn is_active(&self) -> bool {
        self.active_flag().get()
    }

    fn set_active(&self, active: bool) -> bool {
        self.active_flag().set(active)
    }

    /// Paginated listing; `options.filters` keys the adapter does not know are ignored.
    async fn get_all_manga(&self, _options: &ListOptions) -> Result<Vec<Manga>> {
        Err(Error::NotImplemented("get_all_manga"))
    }

    async fn get_manga(&self, _id: &str) -> Result<Manga> {
        Err(Error::NotImplemented("get_manga"))
    }

    async fn get_chapters(&self, _manga_id: &str, _options: &ChapterOptions) -> Result<Vec<Chapter>> {
        Err(Error::NotImplemented("get_chapters"))
    }

    /// Pages in reading order, indexed from 0, with absolute URLs.
    async fn get_pages(&self, _chapter_id: &str) -> Result<Vec<Page>> {
        Err(Error::NotImplemented("get_pages"))
    }

    /// `get_all_manga` with the query injected as the `title` filter.
    async fn search(&self, query: &str, options: &ListOptions) -> Result<Vec<Manga>> {
        let options = options.clone().with_filter("title", query);
        self.get_all_manga(&options).await
    }

    async fn get_genres(&self) -> Result<Vec<Genre>> {
        Err(Error::NotImplemented("get_genres"))
    }
}
