//! Async driver that runs a [`TableState`]'s effects against its sources.

use super::column::Column;
use super::draft::{Draft, FieldValue};
use super::row::RowId;
use super::source::TableSources;
use super::state::{Capabilities, Effect, TableOptions, TableState};
use super::view::TableView;

pub struct DataTable {
    state: TableState,
    sources: TableSources,
}

impl DataTable {
    pub fn new(columns: Vec<Column>, sources: TableSources, options: TableOptions) -> Self {
        let caps = Capabilities {
            filter: sources.filtered.is_some(),
            update: sources.updater.is_some(),
            create: sources.creator.is_some(),
        };
        Self { state: TableState::new(columns, options, caps), sources }
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn view(&self) -> TableView {
        self.state.view()
    }

    pub async fn mount(&mut self) {
        let effect = self.state.mount();
        self.run(effect).await;
    }

    pub async fn refresh(&mut self) {
        let effect = self.state.reload();
        self.run(effect).await;
    }

    pub async fn next_page(&mut self) {
        let effect = self.state.next_page();
        self.run(effect).await;
    }

    pub async fn prev_page(&mut self) {
        let effect = self.state.prev_page();
        self.run(effect).await;
    }

    pub async fn set_filter(&mut self, key: &str, value: &str) {
        let effect = self.state.set_filter(key, value);
        self.run(effect).await;
    }

    pub async fn clear_filters(&mut self) {
        let effect = self.state.clear_filters();
        self.run(effect).await;
    }

    pub fn toggle_bulk_edit(&mut self) -> bool {
        self.state.toggle_bulk_edit()
    }

    pub fn toggle_selection(&mut self, index: usize) -> bool {
        self.state.toggle_selection(index)
    }

    /// Toggle the row with this identifier, if it is on the current page
    pub fn toggle_selection_by_id(&mut self, id: &RowId) -> bool {
        match self.state.row_index_of(id) {
            Some(index) => self.state.toggle_selection(index),
            None => false,
        }
    }

    pub fn toggle_select_all(&mut self) -> bool {
        self.state.toggle_select_all()
    }

    pub fn set_bulk_value(&mut self, key: &str, value: FieldValue) -> bool {
        self.state.set_bulk_value(key, value)
    }

    pub async fn apply_bulk(&mut self) {
        let effect = self.state.apply_bulk();
        self.run(effect).await;
    }

    pub fn open_row_editor(&mut self, index: usize) -> bool {
        self.state.open_row_editor(index)
    }

    pub fn open_row_editor_by_id(&mut self, id: &RowId) -> bool {
        match self.state.row_index_of(id) {
            Some(index) => self.state.open_row_editor(index),
            None => false,
        }
    }

    pub fn set_row_value(&mut self, key: &str, value: FieldValue) -> bool {
        self.state.set_row_value(key, value)
    }

    pub async fn save_row(&mut self) {
        let effect = self.state.save_row();
        self.run(effect).await;
    }

    pub fn cancel_modal(&mut self) -> bool {
        self.state.cancel_modal()
    }

    pub fn open_create(&mut self) -> bool {
        self.state.open_create()
    }

    pub fn set_create_value(&mut self, key: &str, value: FieldValue) -> bool {
        self.state.set_create_value(key, value)
    }

    pub async fn save_create(&mut self) {
        let effect = self.state.save_create();
        self.run(effect).await;
    }

    /// Execute effects until the state machine settles
    async fn run(&mut self, mut effect: Option<Effect>) {
        while let Some(current) = effect.take() {
            effect = match current {
                Effect::Fetch(request) => {
                    tracing::debug!(table = %self.state.options().name, offset = request.offset, limit = request.limit, "fetching page");
                    let result = self.sources.pages.fetch_page(request).await;
                    self.state.page_loaded(result)
                }
                Effect::FetchFiltered { filters, request } => {
                    tracing::debug!(table = %self.state.options().name, ?filters, offset = request.offset, "fetching filtered page");
                    let result = match &self.sources.filtered {
                        Some(source) => source.fetch_filtered_page(&filters, request).await,
                        None => Err(anyhow::anyhow!("no filtered source configured")),
                    };
                    self.state.page_loaded(result)
                }
                Effect::Update { request, .. } => {
                    tracing::info!(table = %self.state.options().name, ids = request.ids.len(), "updating rows");
                    let result = match &self.sources.updater {
                        Some(updater) => updater.update_rows(&request).await,
                        None => Err(anyhow::anyhow!("no updater configured")),
                    };
                    self.state.mutation_settled(result)
                }
                Effect::Create(data) => {
                    tracing::info!(table = %self.state.options().name, fields = data.len(), "creating row");
                    let result = self.create(&data).await;
                    self.state.mutation_settled(result)
                }
            };
        }
    }

    async fn create(&self, data: &Draft) -> anyhow::Result<()> {
        match &self.sources.creator {
            Some(creator) => creator.create_row(data).await,
            None => Err(anyhow::anyhow!("no creator configured")),
        }
    }
}
