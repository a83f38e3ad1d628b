//! Plain-text rendering of a [`TableView`] for the terminal.

use crate::table::view::{FieldInput, FieldView, FilterInput, ModalKind, ModalView, Preview};
use crate::table::TableView;

/// Maximum column width before truncation
const MAX_COLUMN_WIDTH: usize = 32;

fn truncate_value(value: &str, max_width: usize) -> String {
    if value.chars().count() <= max_width {
        value.to_string()
    } else if max_width <= 3 {
        value.chars().take(max_width).collect()
    } else {
        format!("{}...", value.chars().take(max_width - 3).collect::<String>())
    }
}

fn pad(value: &str, width: usize) -> String {
    let len = value.chars().count();
    format!("{}{}", value, " ".repeat(width.saturating_sub(len)))
}

fn border(widths: &[usize], left: char, mid: char, right: char) -> String {
    let mut line = String::new();
    line.push(left);
    for (idx, width) in widths.iter().enumerate() {
        line.push_str(&"─".repeat(width + 2));
        line.push(if idx == widths.len() - 1 { right } else { mid });
    }
    line
}

fn line(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::from("│");
    for (cell, width) in cells.iter().zip(widths) {
        line.push(' ');
        line.push_str(&pad(&truncate_value(cell, *width), *width));
        line.push_str(" │");
    }
    line
}

fn filter_label(filter: &FilterInput) -> String {
    match filter {
        FilterInput::Text { value, .. } if value.is_empty() => "…".into(),
        FilterInput::Text { value, .. } => format!("~{}", value),
        FilterInput::Select { options, value, .. } => options
            .iter()
            .find(|o| &o.value == value)
            .map(|o| o.label.clone())
            .unwrap_or_else(|| value.clone()),
        FilterInput::Checkbox { value, .. } => match value.as_str() {
            "1" => "[x]".into(),
            "0" => "[ ]".into(),
            _ => "any".into(),
        },
    }
}

fn field_label(field: &FieldView) -> String {
    let value = match &field.input {
        FieldInput::Text { value } => value.clone(),
        FieldInput::Checkbox { checked } => (if *checked { "[x]" } else { "[ ]" }).to_string(),
        FieldInput::Select { selected, placeholder, .. } if selected.is_empty() => format!("<{}>", placeholder),
        FieldInput::Select { selected, .. } => selected.clone(),
        FieldInput::File { preview } => match preview {
            Preview::Chosen(path) => format!("new file {}", path.display()),
            Preview::Existing(url) => url.clone(),
            Preview::None => "(no file)".into(),
        },
    };
    let lock = if field.disabled { " (read only)" } else { "" };
    format!("  {}: {}{}", field.label, value, lock)
}

fn render_modal(modal: &ModalView, out: &mut Vec<String>) {
    out.push(match &modal.kind {
        ModalKind::Edit { id } => format!("Editing row {}", id),
        ModalKind::Create => "New record".to_string(),
    });
    out.extend(modal.fields.iter().map(field_label));
    if modal.saving {
        out.push("  saving...".into());
    }
    if let Some(error) = &modal.error {
        out.push(format!("  ! {}", error));
    }
}

/// Boxed table followed by the toolbar, pager and any open form
pub fn render_view(view: &TableView) -> String {
    let bulk = view.toolbar.bulk_active;
    let mut headers: Vec<String> = view.headers.iter().map(|h| h.header.clone()).collect();
    let mut filters: Vec<String> =
        view.headers.iter().map(|h| h.filter.as_ref().map(filter_label).unwrap_or_default()).collect();
    if bulk {
        headers.insert(0, "Sel".into());
        filters.insert(0, String::new());
    }

    let rows: Vec<Vec<String>> = view
        .rows
        .iter()
        .map(|row| {
            let mut cells = row.cells.clone();
            if bulk {
                cells.insert(0, if row.selected { "[x]" } else { "[ ]" }.into());
            }
            cells
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for cells in rows.iter().chain(std::iter::once(&filters)) {
        for (i, cell) in cells.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count()).min(MAX_COLUMN_WIDTH);
            }
        }
    }

    let mut out = vec![border(&widths, '┌', '┬', '┐'), line(&headers, &widths)];
    if filters.iter().any(|f| !f.is_empty()) {
        out.push(line(&filters, &widths));
    }
    out.push(border(&widths, '├', '┼', '┤'));
    if view.empty {
        let inner: usize = widths.iter().map(|w| w + 3).sum::<usize>().saturating_sub(1);
        out.push(format!("│{}│", pad(&format!(" {}", crate::table::view::EMPTY_MESSAGE), inner)));
    }
    out.extend(rows.iter().map(|cells| line(cells, &widths)));
    out.push(border(&widths, '└', '┴', '┘'));

    let mut status = vec![format!("page {}", view.pager.page)];
    if view.pager.prev_enabled {
        status.push("[p]rev".into());
    }
    if view.pager.next_enabled {
        status.push("[n]ext".into());
    }
    if bulk {
        status.push(format!("{} selected", view.toolbar.selected));
    }
    if view.loading {
        status.push("loading...".into());
    }
    out.push(status.join("  "));

    if let Some(inputs) = &view.bulk_inputs {
        out.push("Bulk values".into());
        out.extend(inputs.iter().map(field_label));
    }
    if let Some(error) = &view.toolbar.bulk_error {
        out.push(format!("! {}", error));
    }
    if let Some(error) = &view.error {
        out.push(format!("! {}", error));
    }
    if let Some(modal) = &view.modal {
        render_modal(modal, &mut out);
    }
    out.join("\n")
}
