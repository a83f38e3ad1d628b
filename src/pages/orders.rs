use super::PageContext;
use crate::client::{Endpoints, RestTable};
use crate::table::{Column, DataTable, Render};

pub const TABLE: &str = "/admin/order/get/table";

/// Read-only: no filters, no editing
pub fn columns() -> Vec<Column> {
    vec![
        Column::new("id", "ID"),
        Column::new("user_id", "User ID"),
        Column::new("total_amount", "Amount").render(Render::Decimal2),
        Column::new("currency", "CCY"),
        Column::new("order_status", "Order Status"),
        Column::new("payment_status", "Payment Status"),
        Column::new("payment_method", "Method"),
        Column::new("shipping_address_id", "Ship Addr ID"),
        Column::new("billing_address_id", "Bill Addr ID"),
        Column::new("tracking_id", "Tracking"),
        Column::new("expected_delivery", "Expected").render(Render::Date),
        Column::new("order_date", "Order Date").render(Render::DateTime),
        Column::new("updated_at", "Updated").render(Render::DateTime),
    ]
}

pub fn table(ctx: &PageContext) -> DataTable {
    let sources = RestTable::new(ctx.client.clone(), Endpoints::read_only(TABLE)).into_sources();
    DataTable::new(columns(), sources, ctx.options("orders"))
}
