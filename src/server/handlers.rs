//! Route handlers for the fixture back office.

use axum::{
    extract::{Query, State},
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};

use super::auth::SessionUser;
use super::error::{ApiError, ApiResult};
use super::store::{NewUser, Resource, StoreError};
use super::AppState;
use crate::session::Role;
use crate::table::column::is_checked;
use crate::table::{Page, Row, RowId};

/// Largest page a single request may ask for
const MAX_LIMIT: usize = 500;
const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl PageQuery {
    fn bounds(&self) -> (usize, usize) {
        (self.offset.unwrap_or(0), self.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT))
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkUpdateBody {
    #[serde(default)]
    pub ids: Vec<RowId>,
    /// Filters the client had active; informational only
    #[serde(default)]
    pub filters: Option<Value>,
    #[serde(default)]
    pub data: Row,
}

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub role: Option<Role>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SignupBody {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub usertype: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_active: Option<Value>,
}

fn page_response(items: Vec<Row>, has_more: bool) -> Json<Page> {
    Json(Page { items, has_more })
}

/// POST /admin/user/login
pub async fn login(State(state): State<AppState>, Json(body): Json<Credentials>) -> ApiResult<impl IntoResponse> {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }
    let user = state
        .store
        .authenticate(body.username.trim(), &body.password)
        .await
        .ok_or_else(|| ApiError::unauthorized("Invalid username or password"))?;
    let token = state.keys.issue(&user)?;
    tracing::info!(username = %user.username, role = %user.role, "login");
    Ok((
        AppendHeaders([(SET_COOKIE, state.keys.session_cookie(&token))]),
        Json(json!({ "success": true, "user": user })),
    ))
}

/// GET /admin/user/auth
pub async fn current_user(SessionUser(user): SessionUser) -> Json<Value> {
    Json(json!({ "success": true, "user": user }))
}

/// POST /admin/user/logout; always succeeds and always clears the cookie
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (AppendHeaders([(SET_COOKIE, state.keys.cleared_cookie())]), Json(json!({ "success": true })))
}

/// GET {prefix}/get/table
pub async fn table(
    State(state): State<AppState>,
    _session: SessionUser,
    Query(query): Query<PageQuery>,
    resource: Resource,
) -> Json<Page> {
    let (offset, limit) = query.bounds();
    let (items, has_more) = state.store.page(resource, offset, limit).await;
    page_response(items, has_more)
}

/// GET {prefix}/get/filter; every parameter other than paging is a filter
pub async fn filter(
    State(state): State<AppState>,
    _session: SessionUser,
    Query(mut params): Query<HashMap<String, String>>,
    resource: Resource,
) -> ApiResult<Json<Page>> {
    let mut paging = |key: &str| -> ApiResult<Option<usize>> {
        params
            .remove(key)
            .map(|v| v.parse::<usize>().map_err(|_| ApiError::bad_request(format!("{} must be a number", key))))
            .transpose()
    };
    let query = PageQuery { offset: paging("offset")?, limit: paging("limit")? };
    let (offset, limit) = query.bounds();
    let filters: BTreeMap<String, String> = params.into_iter().filter(|(_, v)| !v.trim().is_empty()).collect();
    tracing::debug!(?resource, ?filters, "filter");
    let (items, has_more) = state.store.filter(resource, &filters, offset, limit).await;
    Ok(page_response(items, has_more))
}

/// POST {prefix}/bulk-update
pub async fn bulk_update(
    State(state): State<AppState>,
    session: SessionUser,
    Json(body): Json<BulkUpdateBody>,
    resource: Resource,
) -> ApiResult<Json<Value>> {
    session.require_table_manager()?;
    if body.ids.is_empty() {
        return Err(ApiError::bad_request("ids must not be empty"));
    }
    if body.data.is_empty() {
        return Err(ApiError::bad_request("data must not be empty"));
    }
    let updated = state.store.bulk_update(resource, &body.ids, &body.data).await;
    tracing::info!(?resource, updated, by = %session.0.username, "bulk update");
    Ok(Json(json!({ "success": true, "updated": updated })))
}

/// GET /admin/user/list
pub async fn list_users(
    State(state): State<AppState>,
    session: SessionUser,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<Page>> {
    session.require_admin()?;
    let (offset, limit) = PageQuery { offset: query.offset, limit: query.limit }.bounds();
    let (items, has_more) = state.store.users(query.role.as_ref(), offset, limit).await;
    Ok(page_response(items, has_more))
}

/// POST /admin/user/bulk-update
pub async fn update_users(
    State(state): State<AppState>,
    session: SessionUser,
    Json(body): Json<BulkUpdateBody>,
) -> ApiResult<Json<Value>> {
    session.require_admin()?;
    if body.ids.is_empty() {
        return Err(ApiError::bad_request("ids must not be empty"));
    }
    let updated = state.store.update_users(&body.ids, &body.data).await;
    tracing::info!(updated, by = %session.0.username, "user update");
    Ok(Json(json!({ "success": true, "updated": updated })))
}

/// POST /admin/user/signup
pub async fn signup(
    State(state): State<AppState>,
    session: SessionUser,
    Json(body): Json<SignupBody>,
) -> ApiResult<Json<Value>> {
    session.require_admin()?;
    let username = body.username.trim().to_string();
    if username.is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request("Username, password and role are required"));
    }
    let role = match body.usertype.as_str() {
        "user" => Role::User,
        "superuser" => Role::Superuser,
        other => return Err(ApiError::bad_request(format!("usertype '{}' cannot be created here", other))),
    };
    let new = NewUser {
        username,
        password: body.password,
        role,
        phone: body.phone,
        email: body.email,
        is_active: body.is_active.as_ref().map(is_checked).unwrap_or(true),
    };
    let id = state.store.create_user(new).await.map_err(|e| match e {
        StoreError::DuplicateUsername(_) => ApiError::conflict(e.to_string()),
    })?;
    tracing::info!(id, usertype = %body.usertype, "user created");
    Ok(Json(json!({ "success": true, "id": id })))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
