use serde_json::{json, Value};

use crate::cli::format::render_view;
use crate::cli::OutputFormat;
use crate::table::column::Column;
use crate::table::{EditKind, FieldValue, TableView};

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Print a rendered table: boxed text or the view as JSON
pub fn output_view(output_format: &OutputFormat, title: &str, view: &TableView) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(view)?),
        OutputFormat::Text => {
            println!("{}", title);
            println!("{}", render_view(view));
        }
    }
    Ok(())
}

/// `key=value`; the value may itself contain `=`
pub fn parse_assignment(input: &str) -> anyhow::Result<(String, String)> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("expected key=value, got '{}'", input))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow::anyhow!("missing key in '{}'", input));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Turn typed text into a field value for `kind`: checkboxes take
/// yes/no spellings and file fields take `@path`
pub fn field_value(kind: &EditKind, raw: &str) -> FieldValue {
    match kind {
        EditKind::Checkbox => {
            FieldValue::checkbox(matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on" | "y"))
        }
        EditKind::File => match raw.strip_prefix('@') {
            Some(path) => FieldValue::File(path.into()),
            None => FieldValue::text(raw),
        },
        EditKind::Text | EditKind::Select(_) => FieldValue::text(raw),
    }
}

/// Edit kind for `key` on an existing row (`create` false) or a new one
pub fn edit_kind_of<'a>(columns: &'a [Column], key: &str, create: bool) -> Option<&'a EditKind> {
    columns
        .iter()
        .find(|c| c.key == key)
        .map(|c| if create { c.create_kind() } else { &c.edit })
}
