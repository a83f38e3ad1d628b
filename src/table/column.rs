//! Column descriptors and the per-column strategies (render, filter, edit).
//!
//! Every per-column behaviour is a closed enum dispatched with `match`, so a
//! page configures a table purely with data.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use super::row::Row;

/// Identifier and timestamp keys: shown but never edited
pub const NON_EDITABLE_KEYS: [&str; 5] = ["id", "product_id", "_id", "created_at", "updated_at"];

pub fn is_non_editable(key: &str) -> bool {
    NON_EDITABLE_KEYS.contains(&key)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self { value: value.into(), label: label.into() }
    }
}

/// Where a cell value comes from: the column's own value or another row field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRef {
    Value,
    Key(String),
}

impl FieldRef {
    fn resolve<'a>(&self, value: Option<&'a Value>, row: &'a Row) -> Option<&'a Value> {
        match self {
            FieldRef::Value => value,
            FieldRef::Key(key) => row.get(key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Render {
    Plain,
    /// Two decimal places
    Decimal2,
    /// Two decimal places with a percent sign; missing renders `0.00%`
    Percent2,
    Date,
    DateTime,
    /// Boolean-ish flag rendered as a check mark or a cross
    Flag,
    /// Never show the stored value (passwords)
    Masked,
    /// Image path resolved against the asset base, shown with a label
    Image { src: FieldRef, label: FieldRef },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterKind {
    Text,
    /// Dropdown; the empty-valued "All" option clears the filter
    Select(Vec<SelectOption>),
    /// Tri-state: "" (any), "1", "0"
    Checkbox,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditKind {
    Text,
    Select(Vec<SelectOption>),
    Checkbox,
    File,
}

/// Resolves a row's existing image for file-field previews
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub key: String,
}

#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    /// Prefix for relative image paths returned by the API
    pub asset_base: String,
}

impl RenderContext {
    pub fn new(asset_base: impl Into<String>) -> Self {
        Self { asset_base: asset_base.into().trim_end_matches('/').to_string() }
    }

    pub fn asset_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") || self.asset_base.is_empty() {
            return path.to_string();
        }
        format!("{}/{}", self.asset_base, path.trim_start_matches('/'))
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    pub key: String,
    pub header: String,
    pub render: Render,
    pub filter: FilterKind,
    pub edit: EditKind,
    pub create: Option<EditKind>,
    pub image: Option<ImageSource>,
}

impl Column {
    pub fn new(key: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            header: header.into(),
            render: Render::Plain,
            filter: FilterKind::Text,
            edit: EditKind::Text,
            create: None,
            image: None,
        }
    }

    pub fn render(mut self, render: Render) -> Self {
        self.render = render;
        self
    }

    pub fn filter(mut self, filter: FilterKind) -> Self {
        self.filter = filter;
        self
    }

    pub fn no_filter(self) -> Self {
        self.filter(FilterKind::Disabled)
    }

    pub fn edit(mut self, edit: EditKind) -> Self {
        self.edit = edit;
        self
    }

    pub fn create(mut self, create: EditKind) -> Self {
        self.create = Some(create);
        self
    }

    pub fn image(mut self, key: impl Into<String>) -> Self {
        self.image = Some(ImageSource { key: key.into() });
        self
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    pub fn editable(&self) -> bool {
        !is_non_editable(&self.key)
    }

    pub fn create_kind(&self) -> &EditKind {
        self.create.as_ref().unwrap_or(&self.edit)
    }

    /// Render the cell for `row`; absent keys render empty
    pub fn display(&self, row: &Row, ctx: &RenderContext) -> String {
        let value = row.get(&self.key);
        match &self.render {
            Render::Plain => value.map(plain).unwrap_or_default(),
            Render::Decimal2 => match value.filter(|v| !v.is_null()) {
                Some(v) => fixed2(v),
                None => String::new(),
            },
            Render::Percent2 => match value.filter(|v| !v.is_null()) {
                Some(v) => format!("{}%", fixed2(v)),
                None => "0.00%".to_string(),
            },
            Render::Date => value.and_then(|v| format_timestamp(v, "%Y-%m-%d")).unwrap_or_default(),
            Render::DateTime => value
                .and_then(|v| format_timestamp(v, "%Y-%m-%d %H:%M:%S"))
                .unwrap_or_default(),
            Render::Flag => {
                if value.map(is_checked).unwrap_or(false) { "✅".to_string() } else { "❌".to_string() }
            }
            Render::Masked => "••••••".to_string(),
            Render::Image { src, label } => {
                let label = label.resolve(value, row).map(plain).unwrap_or_default();
                let src = src
                    .resolve(value, row)
                    .map(plain)
                    .filter(|s| !s.is_empty())
                    .map(|path| ctx.asset_url(&path));
                match src {
                    Some(url) if label.is_empty() => format!("[{}]", url),
                    Some(url) => format!("{} [{}]", label, url),
                    None => label,
                }
            }
        }
    }

    /// Existing image for a file field, if the column knows where to find it
    pub fn existing_image(&self, row: &Row, ctx: &RenderContext) -> Option<String> {
        let source = self.image.as_ref()?;
        row.get(&source.key)
            .map(plain)
            .filter(|s| !s.trim().is_empty())
            .map(|path| ctx.asset_url(&path))
    }
}

/// `String(value ?? "")`
pub fn plain(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Checkbox semantics: true, non-zero numbers, "1" and "true" are checked
pub fn is_checked(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => matches!(s.trim(), "1" | "true"),
        _ => false,
    }
}

fn decimal_of(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Decimal::from(i)),
            None => n.as_f64().and_then(Decimal::from_f64),
        },
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        Value::Bool(b) => Some(Decimal::from(*b as i64)),
        _ => None,
    }
}

fn fixed2(value: &Value) -> String {
    match decimal_of(value) {
        Some(d) => format!("{:.2}", d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)),
        None => "NaN".to_string(),
    }
}

fn format_timestamp(value: &Value, pattern: &str) -> Option<String> {
    let raw = match value {
        Value::String(s) if !s.trim().is_empty() => s.trim(),
        _ => return None,
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).format(pattern).to_string());
    }
    for layout in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, layout) {
            return Some(dt.format(pattern).to_string());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.format(pattern).to_string())
        .or_else(|| Some(raw.to_string()))
}
