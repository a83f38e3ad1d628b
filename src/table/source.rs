//! Data sources injected into a table.
//!
//! A rejected future is the only error signal; "no results" is an empty page.
//! The table never looks inside the error, it only logs it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::draft::Draft;
use super::filters::Filters;
use super::row::{Row, RowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub offset: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub items: Vec<Row>,
    #[serde(default, rename = "hasMore")]
    pub has_more: bool,
}

/// Payload for `update_rows`; `ids` is never empty
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateRequest {
    pub ids: Vec<RowId>,
    pub filters: Filters,
    #[serde(rename = "data")]
    pub update_data: Draft,
}

#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, request: PageRequest) -> anyhow::Result<Page>;
}

#[async_trait]
pub trait FilteredPageSource: Send + Sync {
    async fn fetch_filtered_page(&self, filters: &Filters, request: PageRequest) -> anyhow::Result<Page>;
}

#[async_trait]
pub trait RowUpdater: Send + Sync {
    /// The resolved value is ignored: the table always reloads afterwards
    async fn update_rows(&self, request: &UpdateRequest) -> anyhow::Result<()>;
}

#[async_trait]
pub trait RowCreator: Send + Sync {
    async fn create_row(&self, data: &Draft) -> anyhow::Result<()>;
}

/// The callbacks a page wires into a table; only `pages` is required
#[derive(Clone)]
pub struct TableSources {
    pub pages: Arc<dyn PageSource>,
    pub filtered: Option<Arc<dyn FilteredPageSource>>,
    pub updater: Option<Arc<dyn RowUpdater>>,
    pub creator: Option<Arc<dyn RowCreator>>,
}

impl TableSources {
    pub fn new(pages: Arc<dyn PageSource>) -> Self {
        Self { pages, filtered: None, updater: None, creator: None }
    }

    pub fn filtered(mut self, source: Arc<dyn FilteredPageSource>) -> Self {
        self.filtered = Some(source);
        self
    }

    pub fn updater(mut self, updater: Arc<dyn RowUpdater>) -> Self {
        self.updater = Some(updater);
        self
    }

    pub fn creator(mut self, creator: Arc<dyn RowCreator>) -> Self {
        self.creator = Some(creator);
        self
    }

    /// Wire one value that implements every source
    pub fn all<S>(source: Arc<S>) -> Self
    where
        S: PageSource + FilteredPageSource + RowUpdater + RowCreator + 'static,
    {
        Self {
            pages: source.clone(),
            filtered: Some(source.clone()),
            updater: Some(source.clone()),
            creator: Some(source),
        }
    }
}
