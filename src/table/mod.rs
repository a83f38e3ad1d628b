//! Generic paginated, filterable, editable data table.
//!
//! A page describes its columns and wires in data sources; the table owns
//! pagination, filter state, selection and edit drafts.

pub mod column;
pub mod draft;
pub mod driver;
pub mod filters;
pub mod row;
pub mod source;
pub mod state;
pub mod view;

pub use column::{Column, EditKind, FieldRef, FilterKind, Render, RenderContext, SelectOption};
pub use draft::{Draft, FieldValue};
pub use driver::DataTable;
pub use filters::{FilterState, Filters};
pub use row::{Row, RowId};
pub use source::{FilteredPageSource, Page, PageRequest, PageSource, RowCreator, RowUpdater, TableSources, UpdateRequest};
pub use state::{Capabilities, Effect, Mode, TableOptions, TableState, ViewMode};
pub use view::TableView;
