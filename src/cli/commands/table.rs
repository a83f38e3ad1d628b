use clap::{Args, Subcommand};
use serde_json::json;

use crate::cli::utils::{edit_kind_of, field_value, output_success, output_view, parse_assignment};
use crate::cli::{Connection, OutputFormat};
use crate::pages::TableKind;
use crate::table::{DataTable, FieldValue, Mode, RowId};

#[derive(Args, Debug, Clone)]
pub struct Selection {
    #[arg(long, default_value_t = 1, help = "Page to open (1-based)")]
    pub page: u32,
    #[arg(long = "filter", value_name = "KEY=VALUE", help = "Column filter; repeatable")]
    pub filters: Vec<String>,
}

#[derive(Subcommand)]
pub enum TableCommands {
    #[command(about = "Show one page of a table")]
    List {
        #[arg(value_enum)]
        table: TableKind,
        #[command(flatten)]
        selection: Selection,
    },

    #[command(about = "Apply the same values to several rows on a page")]
    Update {
        #[arg(value_enum)]
        table: TableKind,
        #[arg(long, value_delimiter = ',', required = true, help = "Row ids on the chosen page")]
        ids: Vec<String>,
        #[arg(long = "set", value_name = "KEY=VALUE", required = true, help = "Value to apply; repeatable")]
        values: Vec<String>,
        #[command(flatten)]
        selection: Selection,
    },

    #[command(about = "Edit a single row")]
    Edit {
        #[arg(value_enum)]
        table: TableKind,
        #[arg(help = "Row id")]
        id: String,
        #[arg(long = "set", value_name = "KEY=VALUE", required = true, help = "Value to change; repeatable")]
        values: Vec<String>,
        #[command(flatten)]
        selection: Selection,
    },

    #[command(about = "Create a record")]
    Create {
        #[arg(value_enum)]
        table: TableKind,
        #[arg(long = "set", value_name = "KEY=VALUE", help = "Field value; repeatable")]
        values: Vec<String>,
    },
}

/// Error shown inside the open form or bulk toolbar, if any
pub(crate) fn mode_error(table: &DataTable) -> Option<String> {
    match table.state().mode() {
        Mode::Viewing => None,
        Mode::BulkEditing(bulk) => bulk.error.clone(),
        Mode::EditingRow(editor) => editor.error.clone(),
        Mode::Creating(form) => form.error.clone(),
    }
}

/// Typed value for `key`, honouring the column's input kind
pub(crate) fn value_for(table: &DataTable, key: &str, raw: &str, create: bool) -> FieldValue {
    match edit_kind_of(table.state().columns(), key, create) {
        Some(kind) => field_value(kind, raw),
        None => FieldValue::text(raw),
    }
}

/// Which open form `--set` values go into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    Bulk,
    Row,
    Create,
}

/// Put every `--set` value into the open form; a key the form refuses is an error
pub fn fill(table: &mut DataTable, kind: TableKind, form: Form, values: &[(String, String)]) -> anyhow::Result<()> {
    for (key, raw) in values {
        let value = value_for(table, key, raw, form == Form::Create);
        let accepted = match form {
            Form::Bulk => table.set_bulk_value(key, value),
            Form::Row => table.set_row_value(key, value),
            Form::Create => table.set_create_value(key, value),
        };
        if !accepted {
            return Err(anyhow::anyhow!("column '{}' is not editable on {}", key, kind.title()));
        }
    }
    Ok(())
}

/// Apply filters, then step forward to `page`
async fn select(table: &mut DataTable, selection: &Selection) -> anyhow::Result<()> {
    for filter in &selection.filters {
        let (key, value) = parse_assignment(filter)?;
        if table.state().column(&key).is_none() {
            return Err(anyhow::anyhow!("unknown column '{}'", key));
        }
        table.set_filter(&key, &value).await;
    }
    while table.state().current_page() < selection.page && table.state().can_go_next() {
        table.next_page().await;
    }
    if let Some(error) = table.state().error() {
        return Err(anyhow::anyhow!(error.to_string()));
    }
    if table.state().current_page() < selection.page {
        return Err(anyhow::anyhow!("page {} is past the last page ({})", selection.page, table.state().current_page()));
    }
    Ok(())
}

fn assignments(values: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    values.iter().map(|v| parse_assignment(v)).collect()
}

pub async fn handle(cmd: TableCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let conn = Connection::open().await?;
    match cmd {
        TableCommands::List { table: kind, selection } => {
            let mut table = conn.table(kind).await?;
            select(&mut table, &selection).await?;
            output_view(&output_format, kind.title(), &table.view())
        }
        TableCommands::Update { table: kind, ids, values, selection } => {
            let values = assignments(&values)?;
            let mut table = conn.table(kind).await?;
            select(&mut table, &selection).await?;
            if !table.toggle_bulk_edit() {
                return Err(anyhow::anyhow!("bulk edit is not available on {}", kind.title()));
            }
            let ids: Vec<RowId> = ids.iter().map(|id| RowId::parse(id)).collect();
            for id in &ids {
                if !table.toggle_selection_by_id(id) {
                    return Err(anyhow::anyhow!("row {} is not on page {}", id, table.state().current_page()));
                }
            }
            fill(&mut table, kind, Form::Bulk, &values)?;
            table.apply_bulk().await;
            if let Some(error) = mode_error(&table) {
                return Err(anyhow::anyhow!(error));
            }
            output_success(
                &output_format,
                &format!("Updated {} row(s) in {}", ids.len(), kind.title()),
                Some(json!({ "ids": ids })),
            )
        }
        TableCommands::Edit { table: kind, id, values, selection } => {
            let values = assignments(&values)?;
            let mut table = conn.table(kind).await?;
            select(&mut table, &selection).await?;
            let id = RowId::parse(&id);
            if !table.open_row_editor_by_id(&id) {
                return Err(anyhow::anyhow!("row {} cannot be edited on page {}", id, table.state().current_page()));
            }
            fill(&mut table, kind, Form::Row, &values)?;
            table.save_row().await;
            if let Some(error) = mode_error(&table) {
                return Err(anyhow::anyhow!(error));
            }
            output_success(&output_format, &format!("Saved row {} in {}", id, kind.title()), Some(json!({ "id": id })))
        }
        TableCommands::Create { table: kind, values } => {
            let values = assignments(&values)?;
            let mut table = conn.table(kind).await?;
            if !table.open_create() {
                return Err(anyhow::anyhow!("{} does not support creating records", kind.title()));
            }
            fill(&mut table, kind, Form::Create, &values)?;
            table.save_create().await;
            if let Some(error) = mode_error(&table) {
                return Err(anyhow::anyhow!(error));
            }
            output_success(&output_format, &format!("Created a record in {}", kind.title()), None)
        }
    }
}
