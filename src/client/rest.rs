//! Table sources backed by the back office REST endpoints.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{AdminClient, ClientError};
use crate::table::{Draft, FilteredPageSource, Filters, Page, PageRequest, PageSource, Row, RowCreator, RowUpdater, TableSources, UpdateRequest};

/// Paths of one resource; only `table` is required
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub table: String,
    pub filter: Option<String>,
    pub bulk_update: Option<String>,
    pub create: Option<String>,
}

impl Endpoints {
    pub fn read_only(table: impl Into<String>) -> Self {
        Self { table: table.into(), filter: None, bulk_update: None, create: None }
    }

    /// The `get/table`, `get/filter`, `bulk-update` trio under `prefix`
    pub fn resource(prefix: &str) -> Self {
        let prefix = prefix.trim_end_matches('/');
        Self {
            table: format!("{}/get/table", prefix),
            filter: Some(format!("{}/get/filter", prefix)),
            bulk_update: Some(format!("{}/bulk-update", prefix)),
            create: None,
        }
    }

    pub fn with_bulk_update(mut self, path: impl Into<String>) -> Self {
        self.bulk_update = Some(path.into());
        self
    }

    pub fn with_create(mut self, path: impl Into<String>) -> Self {
        self.create = Some(path.into());
        self
    }
}

#[derive(Clone)]
pub struct RestTable {
    client: AdminClient,
    endpoints: Endpoints,
    params: Vec<(String, String)>,
}

impl RestTable {
    pub fn new(client: AdminClient, endpoints: Endpoints) -> Self {
        Self { client, endpoints, params: Vec::new() }
    }

    /// Fixed query parameter sent with every fetch (e.g. `role=user`)
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Wire only the sources this resource has endpoints for
    pub fn into_sources(self) -> TableSources {
        let rest = Arc::new(self);
        let mut sources = TableSources::new(rest.clone());
        if rest.endpoints.filter.is_some() {
            sources = sources.filtered(rest.clone());
        }
        if rest.endpoints.bulk_update.is_some() {
            sources = sources.updater(rest.clone());
        }
        if rest.endpoints.create.is_some() {
            sources = sources.creator(rest);
        }
        sources
    }

    fn page_query(&self, request: PageRequest) -> Vec<(String, String)> {
        let mut query = self.params.clone();
        query.push(("offset".into(), request.offset.to_string()));
        query.push(("limit".into(), request.limit.to_string()));
        query
    }

    /// Filters first, then paging, so paging always wins a key clash
    fn filtered_query(&self, filters: &Filters, request: PageRequest) -> Vec<(String, String)> {
        let mut query = self.params.clone();
        query.extend(
            filters
                .iter()
                .filter(|(k, _)| k.as_str() != "offset" && k.as_str() != "limit")
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        query.push(("offset".into(), request.offset.to_string()));
        query.push(("limit".into(), request.limit.to_string()));
        query
    }
}

/// JSON body of a draft; file values need multipart encoding, which is not
/// offered
fn json_body(draft: &Draft) -> Result<serde_json::Map<String, Value>, ClientError> {
    draft
        .to_json()
        .map_err(|key| ClientError::Unsupported(format!("uploading a file for '{}' is not supported", key)))
}

/// `{ items, hasMore }`; missing or null parts read as empty
pub(crate) fn parse_page(body: Value) -> Page {
    let items = match body.get("items") {
        Some(Value::Array(items)) => items.iter().filter_map(|v| v.as_object().cloned()).collect::<Vec<Row>>(),
        _ => Vec::new(),
    };
    let has_more = match body.get("hasMore") {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        Some(Value::Null) | None => false,
    };
    Page { items, has_more }
}

#[async_trait]
impl PageSource for RestTable {
    async fn fetch_page(&self, request: PageRequest) -> anyhow::Result<Page> {
        let body: Value = self.client.get_json(&self.endpoints.table, &self.page_query(request)).await?;
        Ok(parse_page(body))
    }
}

#[async_trait]
impl FilteredPageSource for RestTable {
    async fn fetch_filtered_page(&self, filters: &Filters, request: PageRequest) -> anyhow::Result<Page> {
        let path = self
            .endpoints
            .filter
            .as_deref()
            .ok_or_else(|| ClientError::Unsupported(format!("{} has no filter endpoint", self.endpoints.table)))?;
        let body: Value = self.client.get_json(path, &self.filtered_query(filters, request)).await?;
        Ok(parse_page(body))
    }
}

#[async_trait]
impl RowUpdater for RestTable {
    async fn update_rows(&self, request: &UpdateRequest) -> anyhow::Result<()> {
        let path = self
            .endpoints
            .bulk_update
            .as_deref()
            .ok_or_else(|| ClientError::Unsupported(format!("{} has no update endpoint", self.endpoints.table)))?;
        let data = json_body(&request.update_data)?;
        let body = json!({ "ids": request.ids, "filters": request.filters, "data": data });
        let _: Value = self.client.post_json(path, &body).await?;
        Ok(())
    }
}

#[async_trait]
impl RowCreator for RestTable {
    async fn create_row(&self, data: &Draft) -> anyhow::Result<()> {
        let path = self
            .endpoints
            .create
            .as_deref()
            .ok_or_else(|| ClientError::Unsupported(format!("{} has no create endpoint", self.endpoints.table)))?;
        let body = json_body(data)?;
        let _: Value = self.client.post_json(path, &body).await?;
        Ok(())
    }
}
