//! In-memory data behind the fixture back office.

use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::RwLock;

use super::auth::hash_password;
use crate::session::{Role, User};
use crate::table::column::{is_checked, is_non_editable, plain};
use crate::table::{Row, RowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Orders,
    Products,
    Laminates,
    Carvings,
}

impl Resource {
    pub const ALL: [Resource; 4] = [Resource::Orders, Resource::Products, Resource::Laminates, Resource::Carvings];

    /// Columns holding 1/0 flags; filtered by exact match
    fn flags(&self) -> &'static [&'static str] {
        match self {
            Resource::Laminates | Resource::Carvings => &["active"],
            _ => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub phone: String,
    pub email: String,
    pub is_active: bool,
}

impl UserRecord {
    /// Public shape; the password never leaves the store
    fn to_row(&self) -> Row {
        let value = json!({
            "id": self.id,
            "username": self.username,
            "phone": self.phone,
            "email": self.email,
            "role": self.role,
            "is_active": if self.is_active { 1 } else { 0 },
        });
        value.as_object().cloned().unwrap_or_default()
    }

    fn user(&self) -> User {
        User { username: self.username.clone(), role: self.role.clone() }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub phone: String,
    pub email: String,
    pub is_active: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("username '{0}' is already taken")]
    DuplicateUsername(String),
}

pub struct Store {
    tables: RwLock<HashMap<Resource, Vec<Row>>>,
    users: RwLock<Vec<UserRecord>>,
}

/// One page of `rows` plus whether anything follows it
fn paginate(rows: Vec<Row>, offset: usize, limit: usize) -> (Vec<Row>, bool) {
    let total = rows.len();
    let page: Vec<Row> = rows.into_iter().skip(offset).take(limit).collect();
    let has_more = offset + page.len() < total;
    (page, has_more)
}

fn id_set(ids: &[RowId]) -> HashSet<String> {
    ids.iter().map(RowId::to_string).collect()
}

fn row_matches(row: &Row, filters: &BTreeMap<String, String>, flags: &[&str]) -> bool {
    filters.iter().all(|(key, wanted)| {
        let wanted = wanted.trim();
        let Some(value) = row.get(key) else {
            return false;
        };
        if flags.contains(&key.as_str()) {
            is_checked(value) == (wanted == "1" || wanted.eq_ignore_ascii_case("true"))
        } else {
            plain(value).to_lowercase().contains(&wanted.to_lowercase())
        }
    })
}

impl Store {
    pub fn new(tables: HashMap<Resource, Vec<Row>>, users: Vec<UserRecord>) -> Self {
        Self { tables: RwLock::new(tables), users: RwLock::new(users) }
    }

    /// Store seeded with a small but realistic catalogue
    pub fn seeded() -> Self {
        let tables = Resource::ALL.into_iter().map(|r| (r, fixtures::rows(r))).collect();
        Self::new(tables, fixtures::users())
    }

    pub async fn page(&self, resource: Resource, offset: usize, limit: usize) -> (Vec<Row>, bool) {
        let tables = self.tables.read().await;
        let rows = tables.get(&resource).cloned().unwrap_or_default();
        paginate(rows, offset, limit)
    }

    pub async fn filter(
        &self,
        resource: Resource,
        filters: &BTreeMap<String, String>,
        offset: usize,
        limit: usize,
    ) -> (Vec<Row>, bool) {
        let tables = self.tables.read().await;
        let rows = tables
            .get(&resource)
            .map(|rows| rows.iter().filter(|row| row_matches(row, filters, resource.flags())).cloned().collect())
            .unwrap_or_default();
        paginate(rows, offset, limit)
    }

    /// Apply `data` to every row whose identifier is in `ids`; returns the
    /// number of rows touched
    pub async fn bulk_update(&self, resource: Resource, ids: &[RowId], data: &Row) -> usize {
        let wanted = id_set(ids);
        let flags = resource.flags();
        let now = Utc::now().to_rfc3339();
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(&resource) else {
            return 0;
        };
        let mut updated = 0;
        for row in rows.iter_mut() {
            if !RowId::of(row).map(|id| wanted.contains(&id.to_string())).unwrap_or(false) {
                continue;
            }
            for (key, value) in data.iter().filter(|(k, _)| !is_non_editable(k)) {
                let value = if flags.contains(&key.as_str()) { json!(if is_checked(value) { 1 } else { 0 }) } else { value.clone() };
                row.insert(key.clone(), value);
            }
            if row.contains_key("updated_at") {
                row.insert("updated_at".into(), Value::String(now.clone()));
            }
            updated += 1;
        }
        updated
    }

    pub async fn users(&self, role: Option<&Role>, offset: usize, limit: usize) -> (Vec<Row>, bool) {
        let users = self.users.read().await;
        let rows = users
            .iter()
            .filter(|u| role.map(|r| &u.role == r).unwrap_or(true))
            .map(UserRecord::to_row)
            .collect();
        paginate(rows, offset, limit)
    }

    pub async fn update_users(&self, ids: &[RowId], data: &Row) -> usize {
        let wanted = id_set(ids);
        let mut users = self.users.write().await;
        let mut updated = 0;
        for user in users.iter_mut().filter(|u| wanted.contains(&u.id.to_string())) {
            for (key, value) in data {
                match key.as_str() {
                    "username" => user.username = plain(value),
                    "phone" => user.phone = plain(value),
                    "email" => user.email = plain(value),
                    "is_active" => user.is_active = is_checked(value),
                    "password" if !plain(value).is_empty() => user.password_hash = hash_password(&plain(value)),
                    _ => {}
                }
            }
            updated += 1;
        }
        updated
    }

    pub async fn create_user(&self, new: NewUser) -> Result<i64, StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.username.eq_ignore_ascii_case(&new.username)) {
            return Err(StoreError::DuplicateUsername(new.username));
        }
        let id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        users.push(UserRecord {
            id,
            username: new.username,
            password_hash: hash_password(&new.password),
            role: new.role,
            phone: new.phone,
            email: new.email,
            is_active: new.is_active,
        });
        Ok(id)
    }

    /// The user if the credentials match an active account
    pub async fn authenticate(&self, username: &str, password: &str) -> Option<User> {
        let digest = hash_password(password);
        let users = self.users.read().await;
        users
            .iter()
            .find(|u| u.is_active && u.username == username && u.password_hash == digest)
            .map(UserRecord::user)
    }

    pub async fn active_user(&self, username: &str) -> Option<User> {
        let users = self.users.read().await;
        users.iter().find(|u| u.is_active && u.username == username).map(UserRecord::user)
    }
}

/// Seed data. Passwords: `admin`/`admin123`, `clerk`/`clerk123`,
/// `viewer`/`viewer123`.
pub mod fixtures {
    use super::*;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap_or_default()
    }

    fn timestamp(days: i64) -> String {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).single().unwrap_or_else(Utc::now);
        (base + Duration::days(days)).to_rfc3339()
    }

    const LAMINATES: [(&str, f64, f64); 12] = [
        ("Teak", 420.0, 5.0),
        ("Walnut", 510.5, 0.0),
        ("Oak", 380.0, 10.0),
        ("Maple", 355.25, 0.0),
        ("Cherry", 460.0, 7.5),
        ("Ash", 300.0, 0.0),
        ("Birch", 290.0, 2.5),
        ("Mahogany", 620.0, 12.0),
        ("Rosewood", 700.0, 0.0),
        ("Pine", 210.0, 0.0),
        ("Cedar", 330.0, 4.0),
        ("Ebony", 890.0, 15.0),
    ];

    const CARVINGS: [&str; 8] = ["Floral", "Lattice", "Paisley", "Vine", "Mandala", "Peacock", "Chevron", "Lotus"];

    pub fn rows(resource: Resource) -> Vec<Row> {
        match resource {
            Resource::Orders => orders(),
            Resource::Products => products(),
            Resource::Laminates => laminates(),
            Resource::Carvings => carvings(),
        }
    }

    fn orders() -> Vec<Row> {
        let statuses = ["placed", "packed", "shipped", "delivered"];
        let methods = ["card", "upi", "cod"];
        (1..=25)
            .map(|i: i64| {
                let status = statuses[(i as usize) % statuses.len()];
                row(json!({
                    "id": i,
                    "user_id": 100 + (i % 7),
                    "total_amount": 1250.0 + (i as f64) * 37.5,
                    "currency": "INR",
                    "order_status": status,
                    "payment_status": if status == "placed" { "pending" } else { "paid" },
                    "payment_method": methods[(i as usize) % methods.len()],
                    "shipping_address_id": 500 + i,
                    "billing_address_id": 500 + i,
                    "tracking_id": if status == "shipped" || status == "delivered" { json!(format!("TRK{:06}", i * 97)) } else { Value::Null },
                    "expected_delivery": timestamp(i + 7),
                    "order_date": timestamp(i),
                    "updated_at": timestamp(i + 1),
                }))
            })
            .collect()
    }

    fn products() -> Vec<Row> {
        (1..=15)
            .map(|i: i64| {
                let front = LAMINATES[(i as usize) % LAMINATES.len()].0;
                let back = LAMINATES[(i as usize + 3) % LAMINATES.len()].0;
                let carving = CARVINGS[(i as usize) % CARVINGS.len()];
                row(json!({
                    "product_id": format!("P-{:03}", i),
                    "name": format!("{} Door {}", front, i),
                    "mrp": 18000.0 + (i as f64) * 750.0,
                    "price": 15500.0 + (i as f64) * 700.0,
                    "front_wrap": front,
                    "front_wrap_image": format!("uploads/laminates/{}.png", front.to_lowercase()),
                    "back_wrap": back,
                    "back_wrap_image": format!("uploads/laminates/{}.png", back.to_lowercase()),
                    "front_carving": carving,
                    "front_carving_image": format!("uploads/carvings/{}.png", carving.to_lowercase()),
                    "back_carving": Value::Null,
                    "back_carving_image": Value::Null,
                    "width_in": 32.0 + (i % 3) as f64 * 2.0,
                    "height_in": 78.0 + (i % 2) as f64 * 6.0,
                    "created_at": timestamp(i),
                    "updated_at": timestamp(i + 2),
                }))
            })
            .collect()
    }

    fn laminates() -> Vec<Row> {
        LAMINATES
            .iter()
            .enumerate()
            .map(|(i, (name, price, discount))| {
                row(json!({
                    "id": i as i64 + 1,
                    "name": name,
                    "image_path": format!("uploads/laminates/{}.png", name.to_lowercase()),
                    "price": price,
                    "discount_perc": discount,
                    "active": if i % 4 == 3 { 0 } else { 1 },
                }))
            })
            .collect()
    }

    fn carvings() -> Vec<Row> {
        CARVINGS
            .iter()
            .enumerate()
            .map(|(i, name)| {
                row(json!({
                    "id": i as i64 + 1,
                    "name": name,
                    "image_path": format!("uploads/carvings/{}.png", name.to_lowercase()),
                    "price": 150.0 + i as f64 * 25.0,
                    "discount_perc": Value::Null,
                    "active": if i == 5 { 0 } else { 1 },
                }))
            })
            .collect()
    }

    pub fn users() -> Vec<UserRecord> {
        let mut users = vec![
            ("admin", "admin123", Role::Admin),
            ("clerk", "clerk123", Role::Superuser),
            ("viewer", "viewer123", Role::User),
        ];
        let extra: Vec<(String, Role)> = (1..=12)
            .map(|i| (format!("customer{:02}", i), Role::User))
            .chain((1..=3).map(|i| (format!("manager{}", i), Role::Superuser)))
            .collect();
        let mut records: Vec<UserRecord> = users
            .drain(..)
            .map(|(name, password, role)| (name.to_string(), password.to_string(), role))
            .chain(extra.into_iter().map(|(name, role)| (name.clone(), format!("{}-pw", name), role)))
            .enumerate()
            .map(|(i, (username, password, role))| UserRecord {
                id: i as i64 + 1,
                phone: format!("98450{:05}", i * 131),
                email: format!("{}@example.com", username),
                password_hash: hash_password(&password),
                username,
                role,
                is_active: true,
            })
            .collect();
        // one dormant account to exercise the active flag
        if let Some(last) = records.last_mut() {
            last.is_active = false;
        }
        records
    }
}
