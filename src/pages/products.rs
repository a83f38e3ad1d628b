//! Finished products, laminates and carvings.

use super::PageContext;
use crate::client::{AdminClient, Endpoints, RestTable};
use crate::table::column::plain;
use crate::table::{Column, DataTable, EditKind, FieldRef, FilterKind, Page, PageRequest, PageSource, Render, SelectOption};

pub const PRODUCTS: &str = "/admin/product";
pub const LAMINATES: &str = "/admin/product/laminate";
pub const CARVINGS: &str = "/admin/product/carving";

/// Select options for the wrap and carving editors of the products table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WrapOptions {
    pub laminates: Vec<SelectOption>,
    pub carvings: Vec<SelectOption>,
}

impl WrapOptions {
    /// Load both option lists concurrently; a failed list stays empty
    pub async fn load(client: &AdminClient, limit: u32) -> Self {
        let request = PageRequest { offset: 0, limit };
        let laminates = RestTable::new(client.clone(), Endpoints::read_only(format!("{}/get/table", LAMINATES)));
        let carvings = RestTable::new(client.clone(), Endpoints::read_only(format!("{}/get/table", CARVINGS)));
        let (laminates, carvings) = futures::join!(laminates.fetch_page(request), carvings.fetch_page(request));
        Self { laminates: options_from("laminate", laminates), carvings: options_from("carving", carvings) }
    }
}

/// Options keyed and labelled by `name`
fn options_from(kind: &str, page: anyhow::Result<Page>) -> Vec<SelectOption> {
    match page {
        Ok(page) => page
            .items
            .iter()
            .filter_map(|row| row.get("name").map(plain))
            .filter(|name| !name.is_empty())
            .map(|name| SelectOption::new(name.clone(), name))
            .collect(),
        Err(e) => {
            tracing::error!(kind, "failed loading {} options: {:#}", kind, e);
            Vec::new()
        }
    }
}

fn wrap_column(key: &str, header: &str, options: &[SelectOption]) -> Column {
    Column::new(key, header)
        .render(Render::Image { src: FieldRef::Key(format!("{}_image", key)), label: FieldRef::Value })
        .edit(EditKind::Select(options.to_vec()))
}

pub fn product_columns(options: &WrapOptions) -> Vec<Column> {
    vec![
        Column::new("product_id", "Product ID"),
        Column::new("name", "Name"),
        Column::new("mrp", "MRP").render(Render::Decimal2),
        Column::new("price", "Price").render(Render::Decimal2),
        wrap_column("front_wrap", "Front Wrap", &options.laminates),
        wrap_column("back_wrap", "Back Wrap", &options.laminates),
        wrap_column("front_carving", "Front Carving", &options.carvings),
        wrap_column("back_carving", "Back Carving", &options.carvings),
        Column::new("width_in", "Width (in)").render(Render::Decimal2),
        Column::new("height_in", "Height (in)").render(Render::Decimal2),
        Column::new("created_at", "Created At").render(Render::DateTime),
        Column::new("updated_at", "Updated At").render(Render::DateTime),
    ]
}

pub fn laminate_columns() -> Vec<Column> {
    vec![
        Column::new("id", "Laminate ID"),
        Column::new("name", "Name"),
        Column::new("image_path", "Image")
            .render(Render::Image { src: FieldRef::Value, label: FieldRef::Key("name".into()) })
            .no_filter()
            .edit(EditKind::File)
            .image("image_path"),
        Column::new("price", "Price").render(Render::Decimal2),
        Column::new("discount_perc", "Discount (%)").render(Render::Percent2),
        Column::new("active", "Active")
            .render(Render::Flag)
            .filter(FilterKind::Select(vec![
                SelectOption::new("", "All"),
                SelectOption::new("1", "Active"),
                SelectOption::new("0", "Inactive"),
            ]))
            .edit(EditKind::Checkbox),
    ]
}

/// Same as laminates, with the identifier header renamed
pub fn carving_columns() -> Vec<Column> {
    laminate_columns()
        .into_iter()
        .map(|c| if c.key == "id" { c.with_header("Carving ID") } else { c })
        .collect()
}

pub fn products_table(ctx: &PageContext, options: &WrapOptions) -> DataTable {
    let sources = RestTable::new(ctx.client.clone(), Endpoints::resource(PRODUCTS)).into_sources();
    DataTable::new(product_columns(options), sources, ctx.options("products"))
}

pub fn laminates_table(ctx: &PageContext) -> DataTable {
    let sources = RestTable::new(ctx.client.clone(), Endpoints::resource(LAMINATES)).into_sources();
    DataTable::new(laminate_columns(), sources, ctx.options("laminates"))
}

pub fn carvings_table(ctx: &PageContext) -> DataTable {
    let sources = RestTable::new(ctx.client.clone(), Endpoints::resource(CARVINGS)).into_sources();
    DataTable::new(carving_columns(), sources, ctx.options("carvings"))
}
