//! `backoffice browse <table>`: drive one table interactively from stdin.

use tokio::io::{AsyncBufReadExt, BufReader};

use super::table::value_for;
use crate::cli::utils::{output_error, output_view};
use crate::cli::{Connection, OutputFormat};
use crate::pages::TableKind;
use crate::table::{DataTable, Mode, RowId};

const HELP: &str = "\
n | p                 next / previous page
f <key> [value]       set a column filter (no value clears it)
clear                 clear all filters
r                     reload the current page
edit                  toggle bulk edit
sel <id>              toggle a row in the bulk selection
all                   select or unselect every row on the page
set <key> <value>     bulk value for a column
apply                 apply bulk values to the selection
open <id>             edit one row
new                   open the create form
field <key> <value>   set a value in the open form
save | cancel         save or close the open form
q                     quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Next,
    Prev,
    Filter { key: String, value: String },
    ClearFilters,
    Reload,
    ToggleBulk,
    Select(RowId),
    SelectAll,
    BulkValue { key: String, value: String },
    Apply,
    Open(RowId),
    New,
    Field { key: String, value: String },
    Save,
    Cancel,
    Help,
    Quit,
}

/// Split off the first word; the rest is kept verbatim (minus outer spaces)
fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim();
    match input.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (input, ""),
    }
}

fn key_value(args: &str, usage: &str) -> Result<(String, String), String> {
    let (key, value) = split_word(args);
    if key.is_empty() {
        return Err(format!("usage: {}", usage));
    }
    Ok((key.to_string(), value.to_string()))
}

fn row_id(args: &str, usage: &str) -> Result<RowId, String> {
    let (id, _) = split_word(args);
    if id.is_empty() {
        return Err(format!("usage: {}", usage));
    }
    Ok(RowId::parse(id))
}

pub fn parse(line: &str) -> Result<BrowseCommand, String> {
    let (word, args) = split_word(line);
    let command = match word {
        "n" | "next" => BrowseCommand::Next,
        "p" | "prev" => BrowseCommand::Prev,
        "f" | "filter" => {
            let (key, value) = key_value(args, "f <key> [value]")?;
            BrowseCommand::Filter { key, value }
        }
        "clear" => BrowseCommand::ClearFilters,
        "r" | "reload" => BrowseCommand::Reload,
        "edit" => BrowseCommand::ToggleBulk,
        "sel" => BrowseCommand::Select(row_id(args, "sel <id>")?),
        "all" => BrowseCommand::SelectAll,
        "set" => {
            let (key, value) = key_value(args, "set <key> <value>")?;
            BrowseCommand::BulkValue { key, value }
        }
        "apply" => BrowseCommand::Apply,
        "open" => BrowseCommand::Open(row_id(args, "open <id>")?),
        "new" => BrowseCommand::New,
        "field" => {
            let (key, value) = key_value(args, "field <key> <value>")?;
            BrowseCommand::Field { key, value }
        }
        "save" => BrowseCommand::Save,
        "cancel" => BrowseCommand::Cancel,
        "h" | "help" | "?" => BrowseCommand::Help,
        "q" | "quit" | "exit" => BrowseCommand::Quit,
        other => return Err(format!("unknown command '{}' (h for help)", other)),
    };
    Ok(command)
}

/// Run one command; returns a message when the table refused it
async fn apply(table: &mut DataTable, command: BrowseCommand) -> Option<String> {
    let accepted = match command {
        BrowseCommand::Next => {
            let ok = table.state().can_go_next();
            table.next_page().await;
            ok
        }
        BrowseCommand::Prev => {
            let ok = table.state().can_go_prev();
            table.prev_page().await;
            ok
        }
        BrowseCommand::Filter { key, value } => {
            if table.state().column(&key).is_none() {
                return Some(format!("unknown column '{}'", key));
            }
            table.set_filter(&key, &value).await;
            true
        }
        BrowseCommand::ClearFilters => {
            table.clear_filters().await;
            true
        }
        BrowseCommand::Reload => {
            table.refresh().await;
            true
        }
        BrowseCommand::ToggleBulk => table.toggle_bulk_edit(),
        BrowseCommand::Select(id) => table.toggle_selection_by_id(&id),
        BrowseCommand::SelectAll => table.toggle_select_all(),
        BrowseCommand::BulkValue { key, value } => {
            let value = value_for(table, &key, &value, false);
            table.set_bulk_value(&key, value)
        }
        BrowseCommand::Apply => {
            table.apply_bulk().await;
            true
        }
        BrowseCommand::Open(id) => table.open_row_editor_by_id(&id),
        BrowseCommand::New => table.open_create(),
        BrowseCommand::Field { key, value } => {
            let creating = matches!(table.state().mode(), Mode::Creating(_));
            let value = value_for(table, &key, &value, creating);
            if creating {
                table.set_create_value(&key, value)
            } else {
                table.set_row_value(&key, value)
            }
        }
        BrowseCommand::Save => {
            if matches!(table.state().mode(), Mode::Creating(_)) {
                table.save_create().await;
            } else {
                table.save_row().await;
            }
            true
        }
        BrowseCommand::Cancel => table.cancel_modal(),
        BrowseCommand::Help | BrowseCommand::Quit => true,
    };
    (!accepted).then(|| "not available right now".to_string())
}

pub async fn handle(kind: TableKind, output_format: OutputFormat) -> anyhow::Result<()> {
    let conn = Connection::open().await?;
    let mut table = conn.table(kind).await?;
    output_view(&output_format, kind.title(), &table.view())?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse(&line) {
            Ok(command) => command,
            Err(message) => {
                output_error(&output_format, &message, Some("BAD_COMMAND"))?;
                continue;
            }
        };
        match command {
            BrowseCommand::Quit => break,
            BrowseCommand::Help => {
                println!("{}", HELP);
                continue;
            }
            command => {
                if let Some(message) = apply(&mut table, command).await {
                    output_error(&output_format, &message, None)?;
                }
            }
        }
        output_view(&output_format, kind.title(), &table.view())?;
    }
    Ok(())
}
