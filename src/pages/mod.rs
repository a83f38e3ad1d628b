//! The admin pages: which tables each route shows and how they are wired.

pub mod login;
pub mod orders;
pub mod products;
pub mod users;

use clap::ValueEnum;
use serde::Serialize;
use url::Url;

use crate::client::AdminClient;
use crate::config::{self, ApiConfig};
use crate::session::guard::Route;
use crate::session::SessionContext;
use crate::table::{DataTable, RenderContext, TableOptions};

/// Every table the back office exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Orders,
    Products,
    Laminates,
    Carvings,
    Superusers,
    Users,
}

impl TableKind {
    pub fn route(&self) -> Route {
        match self {
            TableKind::Orders => Route::Orders,
            TableKind::Products | TableKind::Laminates | TableKind::Carvings => Route::Products,
            TableKind::Superusers | TableKind::Users => Route::Users,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            TableKind::Orders => "Orders",
            TableKind::Products => "Finished Products list",
            TableKind::Laminates => "Laminates list",
            TableKind::Carvings => "Carvings list",
            TableKind::Superusers => "Superusers",
            TableKind::Users => "Users",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TableKind::Orders => "orders",
            TableKind::Products => "products",
            TableKind::Laminates => "laminates",
            TableKind::Carvings => "carvings",
            TableKind::Superusers => "superusers",
            TableKind::Users => "users",
        }
    }

    /// Tables shown on a route, in page order
    pub fn on_route(route: Route) -> Vec<TableKind> {
        match route {
            Route::Login => Vec::new(),
            Route::Orders => vec![TableKind::Orders],
            Route::Products => vec![TableKind::Products, TableKind::Laminates, TableKind::Carvings],
            Route::Users => vec![TableKind::Superusers, TableKind::Users],
        }
    }
}

/// What every page needs to build its tables
#[derive(Clone)]
pub struct PageContext {
    pub client: AdminClient,
    pub authorized: bool,
    pub render: RenderContext,
    pub page_size: u32,
    pub initial_offset: u32,
    pub option_limit: u32,
}

/// Where relative image paths resolve: the configured asset host, else the API
fn asset_base(api: &ApiConfig, api_base: &Url) -> String {
    match &api.asset_base_url {
        Some(base) => base.clone(),
        None => api_base.as_str().to_string(),
    }
}

impl PageContext {
    pub fn new(client: AdminClient, session: &SessionContext) -> Self {
        let config = config::config();
        let table = &config.table;
        let render = RenderContext::new(asset_base(&config.api, client.base_url()));
        Self {
            client,
            authorized: session.can_manage_tables(),
            render,
            page_size: table.page_size,
            initial_offset: table.initial_offset,
            option_limit: table.option_limit,
        }
    }

    pub fn options(&self, name: &str) -> TableOptions {
        TableOptions {
            name: name.to_string(),
            page_size: self.page_size,
            initial_offset: self.initial_offset,
            authorized: self.authorized,
            render: self.render.clone(),
            ..TableOptions::default()
        }
    }

    /// Build one table, unmounted
    pub async fn table(&self, kind: TableKind) -> DataTable {
        match kind {
            TableKind::Orders => orders::table(self),
            TableKind::Products => {
                let options = products::WrapOptions::load(&self.client, self.option_limit).await;
                products::products_table(self, &options)
            }
            TableKind::Laminates => products::laminates_table(self),
            TableKind::Carvings => products::carvings_table(self),
            TableKind::Superusers => users::table(self, users::Tier::Superuser),
            TableKind::Users => users::table(self, users::Tier::User),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_lives_on_its_route() {
        for route in [Route::Orders, Route::Products, Route::Users] {
            for kind in TableKind::on_route(route) {
                assert_eq!(kind.route(), route);
            }
        }
        assert!(TableKind::on_route(Route::Login).is_empty());
    }

    #[test]
    fn images_resolve_against_the_asset_host_when_configured() {
        let api_base = Url::parse("http://127.0.0.1:3000/").unwrap();
        let mut api = ApiConfig {
            base_url: "http://127.0.0.1:3000".into(),
            request_timeout_secs: 5,
            enable_request_logging: false,
            asset_base_url: None,
        };
        assert_eq!(RenderContext::new(asset_base(&api, &api_base)).asset_url("uploads/oak.png"), "http://127.0.0.1:3000/uploads/oak.png");

        api.asset_base_url = Some("https://cdn.example.com".into());
        assert_eq!(RenderContext::new(asset_base(&api, &api_base)).asset_url("/uploads/oak.png"), "https://cdn.example.com/uploads/oak.png");
    }

    #[test]
    fn value_names_match_cli_spelling() {
        for kind in TableKind::value_variants() {
            assert_eq!(TableKind::from_str(kind.name(), true).ok(), Some(*kind));
        }
    }
}
