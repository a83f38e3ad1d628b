//! Render-ready snapshot of a table.
//!
//! Front ends (the terminal browser, JSON output) draw a [`TableView`] and
//! never read [`TableState`] directly, so the rules about what is enabled,
//! padded or hidden live in one place.

use serde::Serialize;
use std::path::PathBuf;

use super::column::{is_checked, plain, Column, EditKind, FilterKind, SelectOption};
use super::draft::{Draft, FieldValue};
use super::row::{Row, RowId};
use super::state::{Mode, TableState};

pub const EMPTY_MESSAGE: &str = "No records";
pub const SELECT_ALL: &str = "Select All (this page)";
pub const UNSELECT_ALL: &str = "Unselect All (this page)";

#[derive(Debug, Clone, Serialize)]
pub struct TableView {
    pub headers: Vec<HeaderCell>,
    /// One input per column while bulk editing
    pub bulk_inputs: Option<Vec<FieldView>>,
    pub rows: Vec<RowView>,
    /// Blank rows appended so the grid keeps `page_size` rows
    pub padding: usize,
    pub empty: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub pager: Pager,
    pub toolbar: Toolbar,
    pub modal: Option<ModalView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeaderCell {
    pub key: String,
    pub header: String,
    pub filter: Option<FilterInput>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterInput {
    Text { value: String, enabled: bool },
    Select { options: Vec<SelectOption>, value: String, enabled: bool },
    /// Tri-state: "" any, "1" checked, "0" unchecked
    Checkbox { value: String, enabled: bool },
}

#[derive(Debug, Clone, Serialize)]
pub struct RowView {
    pub id: Option<RowId>,
    pub cells: Vec<String>,
    pub selectable: bool,
    pub selected: bool,
    pub editable: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Pager {
    pub page: u32,
    pub prev_enabled: bool,
    pub next_enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Toolbar {
    pub bulk_toggle: bool,
    pub bulk_active: bool,
    pub select_all_label: Option<&'static str>,
    pub selected: usize,
    pub apply_enabled: bool,
    pub create: bool,
    pub bulk_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModalKind {
    Edit { id: RowId },
    Create,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModalView {
    pub kind: ModalKind,
    pub fields: Vec<FieldView>,
    pub error: Option<String>,
    pub saving: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub key: String,
    pub label: String,
    pub input: FieldInput,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldInput {
    Text { value: String },
    Checkbox { checked: bool },
    Select { options: Vec<SelectOption>, placeholder: String, selected: String },
    File { preview: Preview },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "source", rename_all = "snake_case")]
pub enum Preview {
    /// A newly chosen local file
    Chosen(PathBuf),
    /// The row's current image URL
    Existing(String),
    None,
}

impl TableState {
    pub fn view(&self) -> TableView {
        let busy = self.is_busy();
        let ctx = &self.options.render;
        let selection = self.selection();
        let bulk_active = matches!(self.mode, Mode::BulkEditing(_));
        let can_edit = self.can_edit() && matches!(self.mode, Mode::Viewing);

        let headers = self
            .columns
            .iter()
            .map(|column| HeaderCell {
                key: column.key.clone(),
                header: column.header.clone(),
                filter: if self.caps.filter { self.filter_input(column, !busy) } else { None },
            })
            .collect();

        let rows: Vec<RowView> = self
            .rows
            .iter()
            .map(|row| {
                let id = RowId::of(row);
                RowView {
                    cells: self.columns.iter().map(|c| c.display(row, ctx)).collect(),
                    selectable: bulk_active && id.is_some(),
                    selected: id.as_ref().map(|id| selection.contains(id)).unwrap_or(false),
                    editable: can_edit && id.is_some(),
                    id,
                }
            })
            .collect();

        let bulk_inputs = match &self.mode {
            Mode::BulkEditing(bulk) => Some(
                self.columns
                    .iter()
                    .map(|column| {
                        let mut field = self.field_view(column, &column.edit, &bulk.draft, None);
                        // checkbox inputs default to whatever the filter asks for
                        if let (FieldInput::Checkbox { checked }, false) =
                            (&mut field.input, bulk.draft.contains(&column.key))
                        {
                            *checked = self.filters.active_value(&column.key).map(|v| v.trim() == "1").unwrap_or(false);
                        }
                        field.disabled |= busy;
                        field
                    })
                    .collect(),
            ),
            _ => None,
        };

        let (bulk_error, selected) = match &self.mode {
            Mode::BulkEditing(bulk) => (bulk.error.clone(), bulk.selection.len()),
            _ => (None, 0),
        };

        let toolbar = Toolbar {
            bulk_toggle: self.can_bulk_edit() && !busy && matches!(self.mode, Mode::Viewing | Mode::BulkEditing(_)),
            bulk_active,
            select_all_label: bulk_active.then(|| if self.all_selected_on_page() { UNSELECT_ALL } else { SELECT_ALL }),
            selected,
            apply_enabled: bulk_active && !busy,
            create: self.can_create() && !busy && matches!(self.mode, Mode::Viewing),
            bulk_error,
        };

        TableView {
            headers,
            bulk_inputs,
            padding: (self.options.page_size as usize).saturating_sub(rows.len()),
            empty: rows.is_empty() && !busy,
            rows,
            loading: busy,
            error: self.error.clone(),
            pager: Pager { page: self.current_page(), prev_enabled: self.can_go_prev(), next_enabled: self.can_go_next() },
            toolbar,
            modal: self.modal_view(),
        }
    }

    fn filter_input(&self, column: &Column, enabled: bool) -> Option<FilterInput> {
        let value = self.filters.get(&column.key).to_string();
        match &column.filter {
            FilterKind::Text => Some(FilterInput::Text { value, enabled }),
            FilterKind::Checkbox => Some(FilterInput::Checkbox { value, enabled }),
            FilterKind::Select(options) => {
                let mut options = options.clone();
                if !options.iter().any(|o| o.value.is_empty()) {
                    options.insert(0, SelectOption::new("", "All"));
                }
                Some(FilterInput::Select { options, value, enabled })
            }
            FilterKind::Disabled => None,
        }
    }

    fn modal_view(&self) -> Option<ModalView> {
        let saving = self.is_busy();
        match &self.mode {
            Mode::EditingRow(editor) => Some(ModalView {
                kind: ModalKind::Edit { id: editor.id.clone() },
                fields: self
                    .columns
                    .iter()
                    .map(|column| {
                        let mut field = self.field_view(column, &column.edit, &editor.draft, Some(&editor.row));
                        field.disabled |= saving;
                        field
                    })
                    .collect(),
                error: editor.error.clone(),
                saving,
            }),
            Mode::Creating(form) => Some(ModalView {
                kind: ModalKind::Create,
                fields: self
                    .columns
                    .iter()
                    .filter(|column| column.editable())
                    .map(|column| {
                        let mut field = self.field_view(column, column.create_kind(), &form.draft, None);
                        field.disabled |= saving;
                        field
                    })
                    .collect(),
                error: form.error.clone(),
                saving,
            }),
            _ => None,
        }
    }

    fn field_view(&self, column: &Column, kind: &EditKind, draft: &Draft, row: Option<&Row>) -> FieldView {
        let current = draft.get(&column.key);
        let text = || current.and_then(FieldValue::as_value).map(plain).unwrap_or_default();
        let input = match kind {
            EditKind::Text => FieldInput::Text { value: text() },
            EditKind::Checkbox => FieldInput::Checkbox {
                checked: current.and_then(FieldValue::as_value).map(is_checked).unwrap_or(false),
            },
            EditKind::Select(options) => FieldInput::Select {
                options: options.clone(),
                placeholder: format!("Select {}", column.header),
                selected: text(),
            },
            EditKind::File => FieldInput::File {
                preview: match current {
                    Some(FieldValue::File(path)) => Preview::Chosen(path.clone()),
                    _ => row
                        .and_then(|row| column.existing_image(row, &self.options.render))
                        .map(Preview::Existing)
                        .unwrap_or(Preview::None),
                },
            },
        };
        FieldView { key: column.key.clone(), label: column.header.clone(), input, disabled: !column.editable() }
    }
}
