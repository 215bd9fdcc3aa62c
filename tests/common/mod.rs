#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode},
    routing::get,
};
use chrono::NaiveDateTime;
use datatable::{
    DataTable, DataTableConfig, DataTableError, DataTableParams, Mode, PageResponse, Profile,
    SearchColumn, SearchOperator,
};
use sea_orm::{ActiveValue::Set, Database, DatabaseConnection, DbErr, EntityTrait};
use sea_orm_migration::prelude::*;
use std::sync::Arc;
use tower::ServiceExt;
use tracing_subscriber::EnvFilter;

pub mod contact_entity;

use contact_entity::{ActiveModel as ContactActiveModel, Entity as Contact};

/// Route `tracing` output through the test harness; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    init_tracing();
    let db = Database::connect("sqlite::memory:").await?;

    // Run migrations
    Migrator::up(&db, None).await?;

    Ok(db)
}

pub struct SeedContact {
    pub name: &'static str,
    pub email: &'static str,
    pub status: &'static str,
    pub score: i32,
    pub owner_id: Option<i32>,
    pub created_at: &'static str,
}

/// A small, hand-picked set of contacts that the API tests reason about.
pub const CONTACTS: &[SeedContact] = &[
    SeedContact {
        name: "Ann Lee",
        email: "ann@example.com",
        status: "active",
        score: 90,
        owner_id: Some(1),
        created_at: "2024-03-01 23:59:59",
    },
    SeedContact {
        name: "Bob Stone",
        email: "bob@example.com",
        status: "pending",
        score: 40,
        owner_id: Some(2),
        created_at: "2024-03-02 00:00:00",
    },
    SeedContact {
        name: "Cara Lee",
        email: "cara@example.org",
        status: "active",
        score: 75,
        owner_id: None,
        created_at: "2024-02-28 12:00:00",
    },
    SeedContact {
        name: "Dan_Price",
        email: "dan@example.com",
        status: "inactive",
        score: 0,
        owner_id: Some(1),
        created_at: "2024-03-01 00:00:00",
    },
    SeedContact {
        name: "Eve 100% Real",
        email: "eve@example.net",
        status: "pending",
        score: 55,
        owner_id: Some(3),
        created_at: "2024-01-15 08:30:00",
    },
];

fn timestamp(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").unwrap()
}

pub async fn seed_contacts(db: &DatabaseConnection) {
    let models = CONTACTS.iter().map(|c| ContactActiveModel {
        name: Set(c.name.to_string()),
        email: Set(c.email.to_string()),
        status: Set(c.status.to_string()),
        score: Set(c.score),
        owner_id: Set(c.owner_id),
        created_at: Set(timestamp(c.created_at)),
        ..Default::default()
    });
    Contact::insert_many(models).exec(db).await.unwrap();
}

/// `count` uniform contacts, ids `1..=count`.
pub async fn seed_many(db: &DatabaseConnection, count: usize) {
    let models = (1..=count).map(|i| ContactActiveModel {
        name: Set(format!("Contact {i:03}")),
        email: Set(format!("contact{i}@example.com")),
        status: Set("active".to_string()),
        score: Set(<i32 as TryFrom<usize>>::try_from(i).unwrap()),
        owner_id: Set(None),
        created_at: Set(timestamp("2024-01-01 00:00:00")),
        ..Default::default()
    });
    Contact::insert_many(models).exec(db).await.unwrap();
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub table: Arc<DataTable>,
}

async fn list_contacts(
    State(state): State<AppState>,
    Query(params): Query<DataTableParams>,
) -> Result<PageResponse<contact_entity::Model>, DataTableError> {
    state.table.get_data(state.db.as_ref(), &params, Contact).await
}

fn route(path: &str, db: &Arc<DatabaseConnection>, table: DataTable) -> Router {
    Router::new()
        .route(path, get(list_contacts))
        .with_state(AppState {
            db: db.clone(),
            table: Arc::new(table),
        })
}

/// `/contacts` legacy profile, `/contacts/safe` safe profile, `/contacts/native`
/// sea-orm's own pagination.
pub fn setup_test_app(db: DatabaseConnection) -> Router {
    let backend = db.get_database_backend();
    let db = Arc::new(db);

    let legacy = DataTable::new(
        DataTableConfig::new(backend).with_search_columns(["name", "email"]),
    );
    let safe = DataTable::new(
        DataTableConfig::new(backend)
            .with_profile(Profile::Safe)
            .with_search_config(vec![
                SearchColumn::new("name", SearchOperator::Contains),
                SearchColumn::new("email", SearchOperator::StartsWith),
                SearchColumn::new("id", SearchOperator::Equals),
            ])
            .with_search_delimiters([","]),
    );
    let native = DataTable::new(
        DataTableConfig::new(backend)
            .with_search_columns(["name"])
            .with_mode(Mode::Standard),
    );

    let api = route("/contacts", &db, legacy)
        .merge(route("/contacts/safe", &db, safe))
        .merge(route("/contacts/native", &db, native));

    Router::new().nest("/api/v1", api)
}

/// GET `uri` and return the status with the JSON body.
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Build a `?filters=` query string value from a JSON document.
pub fn filters_param(filters: &serde_json::Value) -> String {
    url_escape::encode_component(&filters.to_string()).to_string()
}

/// Names of the rows in a response body, in order.
pub fn names(body: &serde_json::Value) -> Vec<String> {
    body["data"]
        .as_array()
        .expect("response has a data array")
        .iter()
        .map(|row| row["name"].as_str().unwrap().to_string())
        .collect()
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateContactTable)]
    }
}

pub struct CreateContactTable;

#[async_trait::async_trait]
impl MigrationName for CreateContactTable {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_contact_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateContactTable {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(ContactTable)
            .if_not_exists()
            .col(
                ColumnDef::new(ContactColumn::Id)
                    .integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .col(ColumnDef::new(ContactColumn::Name).string().not_null())
            .col(ColumnDef::new(ContactColumn::Email).string().not_null())
            .col(ColumnDef::new(ContactColumn::Status).string().not_null())
            .col(
                ColumnDef::new(ContactColumn::Score)
                    .integer()
                    .not_null()
                    .default(0),
            )
            .col(ColumnDef::new(ContactColumn::OwnerId).integer().null())
            .col(ColumnDef::new(ContactColumn::CreatedAt).date_time().not_null())
            .to_owned();

        manager.create_table(table).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ContactTable).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Debug)]
pub enum ContactColumn {
    Id,
    Name,
    Email,
    Status,
    Score,
    OwnerId,
    CreatedAt,
}

impl Iden for ContactColumn {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(
            s,
            "{}",
            match self {
                Self::Id => "id",
                Self::Name => "name",
                Self::Email => "email",
                Self::Status => "status",
                Self::Score => "score",
                Self::OwnerId => "owner_id",
                Self::CreatedAt => "created_at",
            }
        )
        .unwrap();
    }
}

#[derive(Debug)]
pub struct ContactTable;

impl Iden for ContactTable {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(s, "contacts").unwrap();
    }
}
