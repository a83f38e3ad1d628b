//! Superusers and users. Admin only; single-row edit, no bulk edit.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::PageContext;
use crate::client::{AdminClient, Endpoints, RestTable};
use crate::table::column::{is_checked, plain};
use crate::table::{Column, DataTable, Draft, EditKind, FieldValue, Render, RowCreator};

pub const LIST: &str = "/admin/user/list";
pub const BULK_UPDATE: &str = "/admin/user/bulk-update";
pub const SIGNUP: &str = "/admin/user/signup";

pub const MISSING_FIELDS: &str = "Username, password and role are required.";

/// Which accounts a table lists; admins are never listed or created here
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Superuser,
    User,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Superuser => "superuser",
            Tier::User => "user",
        }
    }
}

pub fn columns() -> Vec<Column> {
    vec![
        Column::new("id", "ID"),
        Column::new("username", "Username"),
        Column::new("phone", "Phone"),
        Column::new("email", "Email"),
        Column::new("password", "Password").render(Render::Masked),
        Column::new("is_active", "Active").render(Render::Flag).edit(EditKind::Checkbox),
    ]
}

fn text_of(draft: &Draft, key: &str) -> String {
    draft.get(key).and_then(FieldValue::as_value).map(plain).unwrap_or_default()
}

/// Username and password are mandatory; the role comes from the table
pub fn validate_new_user(draft: &Draft) -> Result<(), String> {
    if text_of(draft, "username").trim().is_empty() || text_of(draft, "password").is_empty() {
        return Err(MISSING_FIELDS.to_string());
    }
    Ok(())
}

/// Posts sign-ups with the table's role as `usertype`
pub struct UserCreator {
    client: AdminClient,
    tier: Tier,
}

impl UserCreator {
    pub fn new(client: AdminClient, tier: Tier) -> Self {
        Self { client, tier }
    }

    pub fn body(&self, draft: &Draft) -> Value {
        let active = draft.get("is_active").and_then(FieldValue::as_value).map(is_checked).unwrap_or(true);
        json!({
            "username": text_of(draft, "username").trim(),
            "password": text_of(draft, "password"),
            "usertype": self.tier.as_str(),
            "phone": text_of(draft, "phone"),
            "email": text_of(draft, "email"),
            "is_active": if active { 1 } else { 0 },
        })
    }
}

#[async_trait]
impl RowCreator for UserCreator {
    async fn create_row(&self, data: &Draft) -> anyhow::Result<()> {
        validate_new_user(data).map_err(anyhow::Error::msg)?;
        let _: Value = self.client.post_json(SIGNUP, &self.body(data)).await?;
        tracing::info!(usertype = self.tier.as_str(), "user created");
        Ok(())
    }
}

pub fn table(ctx: &PageContext, tier: Tier) -> DataTable {
    let endpoints = Endpoints::read_only(LIST).with_bulk_update(BULK_UPDATE);
    let sources = RestTable::new(ctx.client.clone(), endpoints)
        .param("role", tier.as_str())
        .into_sources()
        .creator(Arc::new(UserCreator::new(ctx.client.clone(), tier)));
    let mut options = ctx.options(tier.as_str());
    options.bulk_edit = false;
    options.validate_create = Some(validate_new_user);
    DataTable::new(columns(), sources, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn draft(pairs: &[(&str, FieldValue)]) -> Draft {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn username_and_password_are_required() {
        assert_eq!(validate_new_user(&draft(&[("username", FieldValue::text("ana"))])), Err(MISSING_FIELDS.into()));
        assert!(validate_new_user(&draft(&[
            ("username", FieldValue::text("ana")),
            ("password", FieldValue::text("pw")),
        ]))
        .is_ok());
    }

    #[test]
    fn signup_body_carries_usertype_and_numeric_flag() {
        let client = AdminClient::new("http://localhost:3000", Duration::from_secs(1)).unwrap();
        let creator = UserCreator::new(client, Tier::Superuser);
        let body = creator.body(&draft(&[
            ("username", FieldValue::text(" ana ")),
            ("password", FieldValue::text("pw")),
            ("is_active", FieldValue::checkbox(false)),
        ]));
        assert_eq!(body["usertype"], "superuser");
        assert_eq!(body["username"], "ana");
        assert_eq!(body["is_active"], 0);
        assert_eq!(body["email"], "");
    }

    #[test]
    fn new_users_default_to_active() {
        let client = AdminClient::new("http://localhost:3000", Duration::from_secs(1)).unwrap();
        let body = UserCreator::new(client, Tier::User).body(&Draft::new());
        assert_eq!(body["is_active"], 1);
        assert_eq!(body["usertype"], "user");
    }

    #[test]
    fn password_is_never_shown() {
        let row = json!({"password": "secret"}).as_object().cloned().unwrap();
        let password = columns().into_iter().find(|c| c.key == "password").unwrap();
        assert_eq!(password.display(&row, &Default::default()), "••••••");
    }
}
