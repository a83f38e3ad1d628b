//! The table's state machine.
//!
//! User intents go in as method calls and come out as an [`Effect`] to run
//! against the data sources; the outcome is fed back with
//! [`TableState::page_loaded`] or [`TableState::mutation_settled`]. While an
//! effect is outstanding every trigger is a no-op, which is the only
//! concurrency control the table has.

use super::column::{Column, EditKind, FilterKind, RenderContext};
use super::draft::{Draft, FieldValue};
use super::filters::{FilterState, Filters};
use super::row::{Row, RowId};
use super::source::{Page, PageRequest, UpdateRequest};

pub const LOAD_FAILED: &str = "Failed to load data.";
pub const FILTERED_LOAD_FAILED: &str = "Failed to load filtered data";
pub const BULK_UPDATE_FAILED: &str = "Failed to apply updates.";
pub const ROW_UPDATE_FAILED: &str = "Failed to save changes.";
pub const CREATE_FAILED: &str = "Failed to create record.";
pub const NO_ROWS_SELECTED: &str = "No rows selected.";
pub const NO_CHANGES: &str = "No changes to apply.";
pub const EMPTY_RECORD: &str = "Please fill at least one field.";
pub const MISSING_IDENTIFIER: &str = "Row has no identifier.";

#[derive(Debug, Clone)]
pub struct TableOptions {
    /// Used in diagnostics only
    pub name: String,
    pub page_size: u32,
    pub initial_offset: u32,
    /// Pages may allow single-row edit while forbidding bulk edit
    pub bulk_edit: bool,
    /// Whether the signed-in role may edit or create rows
    pub authorized: bool,
    pub render: RenderContext,
    /// Extra local check for new records; the message is shown in the form
    pub validate_create: Option<fn(&Draft) -> Result<(), String>>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            name: "table".to_string(),
            page_size: 10,
            initial_offset: 0,
            bulk_edit: true,
            authorized: false,
            render: RenderContext::default(),
            validate_create: None,
        }
    }
}

/// Which optional sources were wired in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub filter: bool,
    pub update: bool,
    pub create: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Unfiltered,
    Filtered,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BulkEdit {
    pub selection: Vec<RowId>,
    pub draft: Draft,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowEditor {
    pub id: RowId,
    pub row: Row,
    pub draft: Draft,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateForm {
    pub draft: Draft,
    pub error: Option<String>,
}

/// UI modes; a modal and bulk edit can never be open together
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Viewing,
    BulkEditing(BulkEdit),
    EditingRow(RowEditor),
    Creating(CreateForm),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    Load(ViewMode),
    BulkUpdate,
    RowUpdate,
    Create,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch(PageRequest),
    FetchFiltered { filters: Filters, request: PageRequest },
    Update { request: UpdateRequest, pending: Pending },
    Create(Draft),
}

#[derive(Debug, Clone)]
pub struct TableState {
    pub(super) columns: Vec<Column>,
    pub(super) options: TableOptions,
    pub(super) caps: Capabilities,
    pub(super) rows: Vec<Row>,
    pub(super) has_more: bool,
    pub(super) error: Option<String>,
    pub(super) filters: FilterState,
    pub(super) page: u32,
    pub(super) filtered_page: u32,
    pub(super) view: ViewMode,
    pub(super) mode: Mode,
    pub(super) pending: Option<Pending>,
}

impl TableState {
    pub fn new(columns: Vec<Column>, options: TableOptions, caps: Capabilities) -> Self {
        let page_size = options.page_size.max(1);
        Self {
            columns,
            options: TableOptions { page_size, ..options },
            caps,
            rows: Vec::new(),
            has_more: true,
            error: None,
            filters: FilterState::new(),
            page: 1,
            filtered_page: 1,
            view: ViewMode::Unfiltered,
            mode: Mode::Viewing,
            pending: None,
        }
    }

    // ---- accessors ----

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<Pending> {
        self.pending
    }

    /// Cursor of the mode currently shown
    pub fn current_page(&self) -> u32 {
        match self.view {
            ViewMode::Unfiltered => self.page,
            ViewMode::Filtered => self.filtered_page,
        }
    }

    pub fn unfiltered_page(&self) -> u32 {
        self.page
    }

    pub fn filtered_page(&self) -> u32 {
        self.filtered_page
    }

    pub fn can_go_next(&self) -> bool {
        !self.is_busy() && self.has_more
    }

    pub fn can_go_prev(&self) -> bool {
        !self.is_busy() && self.current_page() > 1
    }

    pub fn can_edit(&self) -> bool {
        self.options.authorized && self.caps.update
    }

    pub fn can_bulk_edit(&self) -> bool {
        self.can_edit() && self.options.bulk_edit
    }

    pub fn can_create(&self) -> bool {
        self.options.authorized && self.caps.create
    }

    pub fn is_filterable(&self) -> bool {
        self.caps.filter
    }

    pub fn column(&self, key: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn row_index_of(&self, id: &RowId) -> Option<usize> {
        self.rows.iter().position(|row| RowId::of(row).as_ref() == Some(id))
    }

    pub fn selection(&self) -> &[RowId] {
        match &self.mode {
            Mode::BulkEditing(bulk) => &bulk.selection,
            _ => &[],
        }
    }

    // ---- pagination ----

    pub fn mount(&mut self) -> Option<Effect> {
        if self.is_busy() {
            return None;
        }
        self.load(self.view, self.current_page())
    }

    /// Reload the current page of the current mode
    pub fn reload(&mut self) -> Option<Effect> {
        self.mount()
    }

    pub fn next_page(&mut self) -> Option<Effect> {
        if !self.can_go_next() {
            return None;
        }
        let next = self.current_page() + 1;
        self.set_cursor(next);
        self.load(self.view, next)
    }

    pub fn prev_page(&mut self) -> Option<Effect> {
        if !self.can_go_prev() {
            return None;
        }
        let prev = self.current_page() - 1;
        self.set_cursor(prev);
        self.load(self.view, prev)
    }

    fn set_cursor(&mut self, page: u32) {
        match self.view {
            ViewMode::Unfiltered => self.page = page,
            ViewMode::Filtered => self.filtered_page = page,
        }
    }

    fn load(&mut self, view: ViewMode, page: u32) -> Option<Effect> {
        let request = PageRequest {
            offset: (page.max(1) - 1).saturating_mul(self.options.page_size).saturating_add(self.options.initial_offset),
            limit: self.options.page_size,
        };
        let effect = match view {
            ViewMode::Unfiltered => Effect::Fetch(request),
            ViewMode::Filtered => {
                if !self.caps.filter {
                    return None;
                }
                Effect::FetchFiltered { filters: self.filters.active(), request }
            }
        };
        self.error = None;
        self.pending = Some(Pending::Load(view));
        Some(effect)
    }

    /// Outcome of a `Fetch` or `FetchFiltered` effect
    pub fn page_loaded(&mut self, result: anyhow::Result<Page>) -> Option<Effect> {
        let view = match self.pending.take() {
            Some(Pending::Load(view)) => view,
            other => {
                tracing::warn!(table = %self.options.name, pending = ?other, "page result without a pending load");
                self.pending = other;
                return None;
            }
        };
        match result {
            Ok(page) => {
                self.rows = page.items;
                self.has_more = page.has_more;
            }
            Err(e) => {
                tracing::error!(table = %self.options.name, ?view, "page load failed: {:#}", e);
                self.error = Some(
                    match view {
                        ViewMode::Unfiltered => LOAD_FAILED,
                        ViewMode::Filtered => FILTERED_LOAD_FAILED,
                    }
                    .to_string(),
                );
            }
        }
        None
    }

    // ---- filters ----

    /// Update one filter input; fetches only when the active set changes
    pub fn set_filter(&mut self, key: &str, value: &str) -> Option<Effect> {
        if self.is_busy() || !self.caps.filter {
            return None;
        }
        match self.column(key).map(|c| &c.filter) {
            None | Some(FilterKind::Disabled) => return None,
            Some(_) => {}
        }
        let before = self.filters.active();
        self.filters.set(key, value);
        if self.filters.active() == before {
            return None;
        }
        self.apply_filter_change()
    }

    pub fn clear_filters(&mut self) -> Option<Effect> {
        if self.is_busy() || !self.filters.has_active() {
            return None;
        }
        self.filters.clear();
        self.apply_filter_change()
    }

    fn apply_filter_change(&mut self) -> Option<Effect> {
        if self.filters.has_active() {
            self.view = ViewMode::Filtered;
            self.filtered_page = 1;
            self.load(ViewMode::Filtered, 1)
        } else {
            // restore the position the user had before filtering
            self.view = ViewMode::Unfiltered;
            self.load(ViewMode::Unfiltered, self.page)
        }
    }

    // ---- bulk edit ----

    /// Enter or leave bulk edit; leaving discards selection and draft
    pub fn toggle_bulk_edit(&mut self) -> bool {
        if self.is_busy() {
            return false;
        }
        match self.mode {
            Mode::Viewing if self.can_bulk_edit() => {
                self.mode = Mode::BulkEditing(BulkEdit { selection: Vec::new(), draft: Draft::new(), error: None });
                true
            }
            Mode::BulkEditing(_) => {
                self.mode = Mode::Viewing;
                true
            }
            _ => false,
        }
    }

    /// Toggle selection of the row at `index` on the current page
    pub fn toggle_selection(&mut self, index: usize) -> bool {
        if self.is_busy() {
            return false;
        }
        let Some(id) = self.rows.get(index).and_then(RowId::of) else {
            return false;
        };
        let Mode::BulkEditing(bulk) = &mut self.mode else {
            return false;
        };
        match bulk.selection.iter().position(|s| *s == id) {
            Some(pos) => {
                bulk.selection.remove(pos);
            }
            None => bulk.selection.push(id),
        }
        true
    }

    /// Select every identifiable row on this page, or unselect them all if
    /// they already are
    pub fn toggle_select_all(&mut self) -> bool {
        if self.is_busy() {
            return false;
        }
        let page_ids: Vec<RowId> = self.rows.iter().filter_map(RowId::of).collect();
        let Mode::BulkEditing(bulk) = &mut self.mode else {
            return false;
        };
        if page_ids.is_empty() {
            return false;
        }
        let all_selected = page_ids.iter().all(|id| bulk.selection.contains(id));
        if all_selected {
            bulk.selection.retain(|id| !page_ids.contains(id));
        } else {
            for id in page_ids {
                if !bulk.selection.contains(&id) {
                    bulk.selection.push(id);
                }
            }
        }
        true
    }

    pub fn all_selected_on_page(&self) -> bool {
        let selection = self.selection();
        let mut ids = self.rows.iter().filter_map(RowId::of).peekable();
        ids.peek().is_some() && ids.all(|id| selection.contains(&id))
    }

    pub fn set_bulk_value(&mut self, key: &str, value: FieldValue) -> bool {
        if self.is_busy() || !self.column(key).map(Column::editable).unwrap_or(false) {
            return false;
        }
        let Mode::BulkEditing(bulk) = &mut self.mode else {
            return false;
        };
        bulk.draft.set(key, value);
        true
    }

    /// Values a bulk apply would send: non-blank draft entries plus the active
    /// filter sentinel of checkbox columns the draft leaves alone
    pub fn bulk_update_data(&self) -> Draft {
        let Mode::BulkEditing(bulk) = &self.mode else {
            return Draft::new();
        };
        let mut data = bulk.draft.sanitized();
        for column in self.columns.iter().filter(|c| c.editable() && c.edit == EditKind::Checkbox) {
            if bulk.draft.contains(&column.key) {
                continue;
            }
            if let Some(sentinel) = self.filters.active_value(&column.key) {
                data.set(&column.key, FieldValue::text(sentinel.trim()));
            }
        }
        data
    }

    pub fn apply_bulk(&mut self) -> Option<Effect> {
        if self.is_busy() {
            return None;
        }
        let update_data = self.bulk_update_data();
        let filters = self.filters.active();
        let Mode::BulkEditing(bulk) = &mut self.mode else {
            return None;
        };
        bulk.error = None;
        if bulk.selection.is_empty() {
            bulk.error = Some(NO_ROWS_SELECTED.to_string());
            return None;
        }
        if update_data.is_empty() {
            bulk.error = Some(NO_CHANGES.to_string());
            return None;
        }
        let request = UpdateRequest { ids: bulk.selection.clone(), filters, update_data };
        self.pending = Some(Pending::BulkUpdate);
        Some(Effect::Update { request, pending: Pending::BulkUpdate })
    }

    // ---- single-row edit ----

    /// Open the edit modal for the row at `index`; rows without an
    /// identifier cannot be edited
    pub fn open_row_editor(&mut self, index: usize) -> bool {
        if self.is_busy() || !self.can_edit() || !matches!(self.mode, Mode::Viewing) {
            return false;
        }
        let Some(row) = self.rows.get(index) else {
            return false;
        };
        let Some(id) = RowId::of(row) else {
            return false;
        };
        self.mode = Mode::EditingRow(RowEditor { id, row: row.clone(), draft: Draft::from_row(row), error: None });
        true
    }

    pub fn set_row_value(&mut self, key: &str, value: FieldValue) -> bool {
        if self.is_busy() || !self.column(key).map(Column::editable).unwrap_or(false) {
            return false;
        }
        let Mode::EditingRow(editor) = &mut self.mode else {
            return false;
        };
        editor.draft.set(key, value);
        true
    }

    pub fn save_row(&mut self) -> Option<Effect> {
        if self.is_busy() {
            return None;
        }
        let filters = self.filters.active();
        let Mode::EditingRow(editor) = &mut self.mode else {
            return None;
        };
        editor.error = None;
        let Some(id) = RowId::of(&editor.row) else {
            editor.error = Some(MISSING_IDENTIFIER.to_string());
            return None;
        };
        let request = UpdateRequest { ids: vec![id], filters, update_data: editor.draft.sanitized() };
        self.pending = Some(Pending::RowUpdate);
        Some(Effect::Update { request, pending: Pending::RowUpdate })
    }

    /// Close whichever modal is open, discarding its draft
    pub fn cancel_modal(&mut self) -> bool {
        match self.mode {
            Mode::EditingRow(_) | Mode::Creating(_) => {
                self.mode = Mode::Viewing;
                true
            }
            _ => false,
        }
    }

    // ---- create ----

    pub fn open_create(&mut self) -> bool {
        if self.is_busy() || !self.can_create() || !matches!(self.mode, Mode::Viewing) {
            return false;
        }
        self.mode = Mode::Creating(CreateForm { draft: Draft::new(), error: None });
        true
    }

    pub fn set_create_value(&mut self, key: &str, value: FieldValue) -> bool {
        if self.is_busy() || !self.column(key).map(Column::editable).unwrap_or(false) {
            return false;
        }
        let Mode::Creating(form) = &mut self.mode else {
            return false;
        };
        form.draft.set(key, value);
        true
    }

    pub fn save_create(&mut self) -> Option<Effect> {
        if self.is_busy() {
            return None;
        }
        let Mode::Creating(form) = &mut self.mode else {
            return None;
        };
        form.error = None;
        let data = form.draft.sanitized();
        if data.is_empty() {
            form.error = Some(EMPTY_RECORD.to_string());
            return None;
        }
        if let Some(validate) = self.options.validate_create {
            if let Err(message) = validate(&data) {
                form.error = Some(message);
                return None;
            }
        }
        self.pending = Some(Pending::Create);
        Some(Effect::Create(data))
    }

    /// Outcome of an `Update` or `Create` effect; success yields the reload
    pub fn mutation_settled(&mut self, result: anyhow::Result<()>) -> Option<Effect> {
        let pending = match self.pending.take() {
            Some(p @ (Pending::BulkUpdate | Pending::RowUpdate | Pending::Create)) => p,
            other => {
                tracing::warn!(table = %self.options.name, pending = ?other, "mutation result without a pending mutation");
                self.pending = other;
                return None;
            }
        };

        if let Err(e) = result {
            tracing::error!(table = %self.options.name, ?pending, "mutation failed: {:#}", e);
            match (&mut self.mode, pending) {
                (Mode::BulkEditing(bulk), Pending::BulkUpdate) => bulk.error = Some(BULK_UPDATE_FAILED.to_string()),
                (Mode::EditingRow(editor), Pending::RowUpdate) => editor.error = Some(ROW_UPDATE_FAILED.to_string()),
                (Mode::Creating(form), Pending::Create) => form.error = Some(CREATE_FAILED.to_string()),
                _ => {}
            }
            return None;
        }

        match pending {
            Pending::BulkUpdate => {
                if matches!(self.mode, Mode::BulkEditing(_)) {
                    self.mode = Mode::Viewing;
                }
                self.reload()
            }
            Pending::RowUpdate => {
                if matches!(self.mode, Mode::EditingRow(_)) {
                    self.mode = Mode::Viewing;
                }
                self.reload()
            }
            _ => {
                if matches!(self.mode, Mode::Creating(_)) {
                    self.mode = Mode::Viewing;
                }
                if self.filters.has_active() && self.caps.filter {
                    self.view = ViewMode::Filtered;
                    self.filtered_page = 1;
                    self.load(ViewMode::Filtered, 1)
                } else {
                    self.view = ViewMode::Unfiltered;
                    self.page = 1;
                    self.load(ViewMode::Unfiltered, 1)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn columns() -> Vec<Column> {
        vec![
            Column::new("id", "ID"),
            Column::new("name", "Name"),
            Column::new("image_path", "Image").edit(EditKind::File).no_filter(),
            Column::new("active", "Active")
                .filter(FilterKind::Select(vec![]))
                .edit(EditKind::Checkbox),
            Column::new("updated_at", "Updated"),
        ]
    }

    fn table() -> TableState {
        let options = TableOptions { authorized: true, ..TableOptions::default() };
        TableState::new(columns(), options, Capabilities { filter: true, update: true, create: true })
    }

    fn rows(ids: &[i64]) -> Vec<Row> {
        ids.iter()
            .map(|id| json!({"id": id, "name": format!("row {}", id), "active": 1}).as_object().cloned().unwrap())
            .collect()
    }

    fn page(ids: &[i64], has_more: bool) -> anyhow::Result<Page> {
        Ok(Page { items: rows(ids), has_more })
    }

    fn request(offset: u32, limit: u32) -> PageRequest {
        PageRequest { offset, limit }
    }

    /// A mounted table showing rows 1..=10 with more pages available
    fn mounted() -> TableState {
        let mut t = table();
        assert!(t.mount().is_some());
        t.page_loaded(page(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10], true));
        t
    }

    #[test]
    fn mount_fetches_first_page_once() {
        let mut t = table();
        assert_eq!(t.mount(), Some(Effect::Fetch(request(0, 10))));
        assert!(t.is_busy());
        assert_eq!(t.mount(), None, "no second fetch while one is pending");
    }

    #[test]
    fn initial_offset_shifts_every_page() {
        let options = TableOptions { initial_offset: 5, page_size: 20, ..TableOptions::default() };
        let mut t = TableState::new(columns(), options, Capabilities::default());
        assert_eq!(t.mount(), Some(Effect::Fetch(request(5, 20))));
        t.page_loaded(page(&[1], true));
        assert_eq!(t.next_page(), Some(Effect::Fetch(request(25, 20))));
    }

    #[test]
    fn huge_initial_offset_saturates_instead_of_overflowing() {
        let options = TableOptions { initial_offset: u32::MAX - 3, ..TableOptions::default() };
        let mut t = TableState::new(columns(), options, Capabilities::default());
        assert_eq!(t.mount(), Some(Effect::Fetch(request(u32::MAX - 3, 10))));
        t.page_loaded(page(&[1], true));
        assert_eq!(t.next_page(), Some(Effect::Fetch(request(u32::MAX, 10))));
    }

    #[test]
    fn next_after_full_first_page_requests_offset_ten() {
        let mut t = mounted();
        assert_eq!(t.next_page(), Some(Effect::Fetch(request(10, 10))));
        assert_eq!(t.current_page(), 2);
    }

    #[test]
    fn navigation_is_disabled_while_pending_and_at_page_one() {
        let mut t = table();
        t.mount();
        assert!(!t.can_go_next());
        assert!(!t.can_go_prev());
        assert_eq!(t.next_page(), None);
        t.page_loaded(page(&[1], true));
        assert!(t.can_go_next());
        assert!(!t.can_go_prev(), "page one has no previous page");
        assert_eq!(t.prev_page(), None);
        t.next_page();
        assert!(!t.can_go_prev(), "pending fetch disables previous");
        t.page_loaded(page(&[11], false));
        assert!(t.can_go_prev());
        assert!(!t.can_go_next(), "no next page when has_more is false");
        assert_eq!(t.prev_page(), Some(Effect::Fetch(request(0, 10))));
    }

    #[test]
    fn fetch_result_replaces_rows() {
        let mut t = mounted();
        t.next_page();
        t.page_loaded(page(&[11, 12], false));
        assert_eq!(t.rows().len(), 2);
        assert!(!t.has_more());
    }

    #[test]
    fn failed_fetch_keeps_previous_rows_and_has_more() {
        let mut t = mounted();
        t.next_page();
        t.page_loaded(Err(anyhow::anyhow!("connection reset")));
        assert_eq!(t.rows().len(), 10);
        assert!(t.has_more());
        assert_eq!(t.error(), Some(LOAD_FAILED));
        assert!(!t.is_busy());
    }

    #[test]
    fn failed_filtered_fetch_has_its_own_message() {
        let mut t = mounted();
        t.set_filter("name", "oak");
        t.page_loaded(Err(anyhow::anyhow!("boom")));
        assert_eq!(t.error(), Some(FILTERED_LOAD_FAILED));
        // the message must not leak the underlying error
        assert!(!t.error().unwrap().contains("boom"));
    }

    #[test]
    fn first_filter_switches_to_filtered_page_one() {
        let mut t = mounted();
        let effect = t.set_filter("name", "oak");
        let expected: Filters = [("name".to_string(), "oak".to_string())].into_iter().collect();
        assert_eq!(effect, Some(Effect::FetchFiltered { filters: expected, request: request(0, 10) }));
        assert_eq!(t.view_mode(), ViewMode::Filtered);
        assert_eq!(t.filtered_page(), 1);
    }

    #[test]
    fn whitespace_filter_does_not_fetch() {
        let mut t = mounted();
        assert_eq!(t.set_filter("name", "   "), None);
        assert_eq!(t.view_mode(), ViewMode::Unfiltered);
    }

    #[test]
    fn disabled_and_unknown_filters_are_ignored() {
        let mut t = mounted();
        assert_eq!(t.set_filter("image_path", "x"), None);
        assert_eq!(t.set_filter("nope", "x"), None);
        assert!(!t.filters().has_active());
    }

    #[test]
    fn clearing_all_filters_restores_unfiltered_cursor() {
        let mut t = mounted();
        t.next_page();
        t.page_loaded(page(&[11], true));
        t.next_page();
        t.page_loaded(page(&[21], true));
        assert_eq!(t.unfiltered_page(), 3);

        t.set_filter("name", "oak");
        t.page_loaded(page(&[1], true));
        t.next_page();
        t.page_loaded(page(&[2], false));
        assert_eq!(t.filtered_page(), 2);

        let effect = t.set_filter("name", "");
        assert_eq!(effect, Some(Effect::Fetch(request(20, 10))), "back to page 3, not page 1");
        assert_eq!(t.view_mode(), ViewMode::Unfiltered);
        assert_eq!(t.current_page(), 3);
    }

    #[test]
    fn clearing_one_of_two_filters_stays_filtered() {
        let mut t = mounted();
        t.set_filter("name", "oak");
        t.page_loaded(page(&[1], true));
        t.set_filter("active", "1");
        t.page_loaded(page(&[1], true));
        t.next_page();
        t.page_loaded(page(&[2], true));

        let effect = t.set_filter("name", "");
        let expected: Filters = [("active".to_string(), "1".to_string())].into_iter().collect();
        assert_eq!(effect, Some(Effect::FetchFiltered { filters: expected, request: request(0, 10) }));
        assert_eq!(t.view_mode(), ViewMode::Filtered);
        assert_eq!(t.filtered_page(), 1);
    }

    #[test]
    fn filters_are_ignored_without_filtered_source() {
        let options = TableOptions::default();
        let mut t = TableState::new(columns(), options, Capabilities::default());
        t.mount();
        t.page_loaded(page(&[1], true));
        assert_eq!(t.set_filter("name", "oak"), None);
        assert!(!t.is_filterable());
    }

    #[test]
    fn bulk_edit_requires_authorization_and_updater() {
        let mut t1 = TableState::new(columns(), TableOptions::default(), Capabilities { filter: true, update: true, create: true });
        assert!(!t1.toggle_bulk_edit(), "unauthorized");

        let options = TableOptions { authorized: true, bulk_edit: false, ..TableOptions::default() };
        let mut t2 = TableState::new(columns(), options, Capabilities { filter: true, update: true, create: true });
        assert!(!t2.toggle_bulk_edit(), "bulk edit disabled by page");

        let options = TableOptions { authorized: true, ..TableOptions::default() };
        let mut t3 = TableState::new(columns(), options, Capabilities { filter: true, update: false, create: true });
        assert!(!t3.toggle_bulk_edit(), "no updater");
    }

    #[test]
    fn toggling_bulk_edit_off_discards_state() {
        let mut t = mounted();
        assert!(t.toggle_bulk_edit());
        t.toggle_selection(0);
        t.set_bulk_value("name", FieldValue::text("x"));
        assert!(t.toggle_bulk_edit());
        assert_eq!(t.mode(), &Mode::Viewing);
        assert!(t.toggle_bulk_edit());
        assert!(t.selection().is_empty());
        assert_eq!(t.mode(), &Mode::BulkEditing(BulkEdit { selection: vec![], draft: Draft::new(), error: None }));
    }

    #[test]
    fn bulk_apply_with_empty_selection_never_calls() {
        let mut t = mounted();
        t.toggle_bulk_edit();
        t.set_bulk_value("name", FieldValue::text("Teak"));
        assert_eq!(t.apply_bulk(), None);
        assert!(!t.is_busy());
        match t.mode() {
            Mode::BulkEditing(bulk) => assert_eq!(bulk.error.as_deref(), Some(NO_ROWS_SELECTED)),
            other => panic!("unexpected mode {:?}", other),
        }
    }

    #[test]
    fn bulk_apply_with_empty_payload_never_calls() {
        let mut t = mounted();
        t.toggle_bulk_edit();
        t.toggle_selection(2);
        t.set_bulk_value("name", FieldValue::text("  "));
        assert_eq!(t.apply_bulk(), None);
        match t.mode() {
            Mode::BulkEditing(bulk) => assert_eq!(bulk.error.as_deref(), Some(NO_CHANGES)),
            other => panic!("unexpected mode {:?}", other),
        }
    }

    #[test]
    fn bulk_draft_overrides_checkbox_filter() {
        let mut t = table();
        t.mount();
        t.page_loaded(Ok(Page { items: rows(&[3, 5, 7]), has_more: false }));
        t.set_filter("active", "1");
        t.page_loaded(Ok(Page { items: rows(&[3, 5, 7]), has_more: false }));

        t.toggle_bulk_edit();
        t.toggle_selection(0);
        t.toggle_selection(2);
        t.set_bulk_value("active", FieldValue::text("0"));
        let effect = t.apply_bulk().expect("update effect");
        let Effect::Update { request: update, pending } = effect else { panic!("expected update") };
        assert_eq!(pending, Pending::BulkUpdate);
        assert_eq!(update.ids, vec![RowId::Int(3), RowId::Int(7)]);
        assert_eq!(serde_json::to_value(&update.update_data).unwrap(), json!({"active": "0"}));
        assert_eq!(update.filters.get("active").map(String::as_str), Some("1"));
    }

    #[test]
    fn bulk_payload_inherits_checkbox_filter_when_draft_is_silent() {
        let mut t = mounted();
        t.set_filter("active", "0");
        t.page_loaded(page(&[1, 2], false));
        t.toggle_bulk_edit();
        t.toggle_selection(0);
        t.set_bulk_value("name", FieldValue::text("Walnut"));
        let data = t.bulk_update_data();
        assert_eq!(serde_json::to_value(&data).unwrap(), json!({"active": "0", "name": "Walnut"}));
    }

    #[test]
    fn bulk_success_reloads_current_page_and_returns_to_viewing() {
        let mut t = mounted();
        t.next_page();
        t.page_loaded(page(&[11, 12], true));
        t.toggle_bulk_edit();
        t.toggle_selection(1);
        t.set_bulk_value("name", FieldValue::text("Ash"));
        assert!(t.apply_bulk().is_some());
        assert!(!t.can_go_next(), "controls disabled during mutation");

        let reload = t.mutation_settled(Ok(()));
        assert_eq!(reload, Some(Effect::Fetch(request(10, 10))));
        assert_eq!(t.mode(), &Mode::Viewing);
        assert!(t.selection().is_empty());
    }

    #[test]
    fn bulk_failure_keeps_selection_and_draft() {
        let mut t = mounted();
        t.toggle_bulk_edit();
        t.toggle_selection(0);
        t.set_bulk_value("name", FieldValue::text("Ash"));
        t.apply_bulk();
        assert_eq!(t.mutation_settled(Err(anyhow::anyhow!("500"))), None);
        match t.mode() {
            Mode::BulkEditing(bulk) => {
                assert_eq!(bulk.selection, vec![RowId::Int(1)]);
                assert_eq!(bulk.draft.get("name"), Some(&FieldValue::text("Ash")));
                assert_eq!(bulk.error.as_deref(), Some(BULK_UPDATE_FAILED));
            }
            other => panic!("unexpected mode {:?}", other),
        }
        // retry without re-entering data
        assert!(t.apply_bulk().is_some());
    }

    #[test]
    fn non_editable_columns_reject_bulk_values() {
        let mut t = mounted();
        t.toggle_bulk_edit();
        assert!(!t.set_bulk_value("id", FieldValue::text("9")));
        assert!(!t.set_bulk_value("updated_at", FieldValue::text("now")));
        assert!(t.set_bulk_value("name", FieldValue::text("ok")));
    }

    #[test]
    fn select_all_toggles_the_whole_page() {
        let mut t = mounted();
        t.toggle_bulk_edit();
        t.toggle_selection(0);
        assert!(t.toggle_select_all());
        assert_eq!(t.selection().len(), 10);
        assert!(t.all_selected_on_page());
        assert!(t.toggle_select_all());
        assert!(t.selection().is_empty());
    }

    #[test]
    fn rows_without_identifier_are_inert() {
        let mut t = table();
        t.mount();
        let anonymous = json!({"name": "ghost"}).as_object().cloned().unwrap();
        t.page_loaded(Ok(Page { items: vec![anonymous], has_more: false }));
        assert!(!t.open_row_editor(0), "cannot single-edit");
        t.toggle_bulk_edit();
        assert!(!t.toggle_selection(0), "cannot select");
        assert!(t.selection().is_empty());
        assert!(!t.toggle_select_all());
    }

    #[test]
    fn single_edit_sends_sanitized_draft_and_reloads_same_page() {
        let mut t = mounted();
        t.set_filter("name", "row");
        t.page_loaded(page(&[1, 2, 3], true));
        t.next_page();
        t.page_loaded(page(&[4, 5], false));

        assert!(t.open_row_editor(1));
        t.set_row_value("name", FieldValue::text("Renamed"));
        t.set_row_value("active", FieldValue::Value(Value::Null));
        let Some(Effect::Update { request: update, pending }) = t.save_row() else { panic!("expected update") };
        assert_eq!(pending, Pending::RowUpdate);
        assert_eq!(update.ids, vec![RowId::Int(5)]);
        assert_eq!(serde_json::to_value(&update.update_data).unwrap(), json!({"id": 5, "name": "Renamed"}));

        let reload = t.mutation_settled(Ok(()));
        let expected: Filters = [("name".to_string(), "row".to_string())].into_iter().collect();
        assert_eq!(reload, Some(Effect::FetchFiltered { filters: expected, request: request(10, 10) }));
        assert_eq!(t.mode(), &Mode::Viewing);
    }

    #[test]
    fn single_edit_failure_keeps_modal_open() {
        let mut t = mounted();
        t.open_row_editor(0);
        t.save_row();
        t.mutation_settled(Err(anyhow::anyhow!("timeout")));
        match t.mode() {
            Mode::EditingRow(editor) => assert_eq!(editor.error.as_deref(), Some(ROW_UPDATE_FAILED)),
            other => panic!("unexpected mode {:?}", other),
        }
        assert!(t.cancel_modal());
        assert_eq!(t.mode(), &Mode::Viewing);
    }

    #[test]
    fn single_edit_unavailable_while_bulk_editing() {
        let mut t = mounted();
        t.toggle_bulk_edit();
        assert!(!t.open_row_editor(0));
        assert!(!t.open_create());
    }

    #[test]
    fn non_editable_fields_stay_fixed_in_row_editor() {
        let mut t = mounted();
        t.open_row_editor(0);
        assert!(!t.set_row_value("id", FieldValue::text("99")));
        let Some(Effect::Update { request: update, .. }) = t.save_row() else { panic!("expected update") };
        assert_eq!(update.ids, vec![RowId::Int(1)]);
    }

    #[test]
    fn create_requires_a_value() {
        let mut t = mounted();
        assert!(t.open_create());
        t.set_create_value("name", FieldValue::text(" "));
        assert_eq!(t.save_create(), None);
        match t.mode() {
            Mode::Creating(form) => assert_eq!(form.error.as_deref(), Some(EMPTY_RECORD)),
            other => panic!("unexpected mode {:?}", other),
        }
        assert!(!t.set_create_value("id", FieldValue::text("1")), "identifier is not part of the form");
    }

    #[test]
    fn create_success_shows_unfiltered_page_one() {
        let mut t = mounted();
        t.next_page();
        t.page_loaded(page(&[11], true));
        t.open_create();
        t.set_create_value("name", FieldValue::text("Cherry"));
        assert_eq!(t.save_create().map(|e| matches!(e, Effect::Create(_))), Some(true));
        assert_eq!(t.mutation_settled(Ok(())), Some(Effect::Fetch(request(0, 10))));
        assert_eq!(t.current_page(), 1);
        assert_eq!(t.mode(), &Mode::Viewing);
    }

    #[test]
    fn create_success_with_filters_shows_filtered_page_one() {
        let mut t = mounted();
        t.set_filter("name", "ch");
        t.page_loaded(page(&[1], true));
        t.next_page();
        t.page_loaded(page(&[2], false));
        t.open_create();
        t.set_create_value("name", FieldValue::text("Cherry"));
        t.save_create();
        let reload = t.mutation_settled(Ok(()));
        assert!(matches!(reload, Some(Effect::FetchFiltered { request: PageRequest { offset: 0, .. }, .. })));
        assert_eq!(t.filtered_page(), 1);
    }

    #[test]
    fn create_failure_keeps_draft() {
        let mut t = mounted();
        t.open_create();
        t.set_create_value("name", FieldValue::text("Cherry"));
        t.save_create();
        t.mutation_settled(Err(anyhow::anyhow!("409")));
        match t.mode() {
            Mode::Creating(form) => {
                assert_eq!(form.error.as_deref(), Some(CREATE_FAILED));
                assert_eq!(form.draft.get("name"), Some(&FieldValue::text("Cherry")));
            }
            other => panic!("unexpected mode {:?}", other),
        }
    }

    #[test]
    fn create_validator_blocks_the_call() {
        fn needs_name(draft: &Draft) -> Result<(), String> {
            if draft.contains("name") { Ok(()) } else { Err("Name is required.".into()) }
        }
        let options = TableOptions { authorized: true, validate_create: Some(needs_name), ..TableOptions::default() };
        let mut t = TableState::new(columns(), options, Capabilities { filter: false, update: false, create: true });
        t.open_create();
        t.set_create_value("active", FieldValue::checkbox(true));
        assert_eq!(t.save_create(), None);
        match t.mode() {
            Mode::Creating(form) => assert_eq!(form.error.as_deref(), Some("Name is required.")),
            other => panic!("unexpected mode {:?}", other),
        }
        t.set_create_value("name", FieldValue::text("Elm"));
        assert!(t.save_create().is_some());
    }

    #[test]
    fn create_requires_authorization() {
        let mut t = TableState::new(columns(), TableOptions::default(), Capabilities { filter: false, update: false, create: true });
        assert!(!t.open_create());
    }
}
