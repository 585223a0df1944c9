use super::{BodyWrite, StoreError, User, VaultStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keeper_protocol::{Record, RecordSummary, RecordType};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

pub struct PgStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    name: String,
    password_hash: String,
    deleted: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            password_hash: row.password_hash,
            deleted: row.deleted,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    id: String,
    name: Vec<u8>,
    #[sqlx(rename = "type")]
    record_type: String,
    description: Vec<u8>,
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: String,
    user_id: String,
    #[sqlx(rename = "type")]
    record_type: String,
    name: Vec<u8>,
    description: Vec<u8>,
    body: Vec<u8>,
    deleted: bool,
    date: DateTime<Utc>,
}

fn parse_type(id: &str, raw: &str) -> Result<RecordType, StoreError> {
    raw.parse().map_err(|reason| StoreError::Corrupt {
        id: id.to_string(),
        reason,
    })
}

impl TryFrom<SummaryRow> for RecordSummary {
    type Error = StoreError;

    fn try_from(row: SummaryRow) -> Result<Self, Self::Error> {
        Ok(RecordSummary {
            record_type: parse_type(&row.id, &row.record_type)?,
            id: row.id,
            name: row.name,
            description: row.description,
        })
    }
}

impl TryFrom<RecordRow> for Record {
    type Error = StoreError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        Ok(Record {
            record_type: parse_type(&row.id, &row.record_type)?,
            id: row.id,
            name: row.name,
            user_id: row.user_id,
            deleted: row.deleted,
            date: Some(row.date),
            body: row.body,
            description: row.description,
            part: 0,
        })
    }
}

impl PgStore {
    /// Connects and provisions the schema.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!("Connected to database.");

        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl VaultStore for PgStore {
    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO users (id, name, password_hash, deleted) VALUES ($1, $2, $3, $4)",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.deleted)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::AlreadyExists(user.name.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn user_by_name(&self, name: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, password_hash, deleted FROM users WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, password_hash, deleted FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn list_records(&self, user_id: &str) -> Result<Vec<RecordSummary>, StoreError> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            "SELECT id, name, type, description FROM datas \
             WHERE user_id = $1 AND NOT deleted ORDER BY seq",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(RecordSummary::try_from).collect()
    }

    async fn get_record(&self, id: &str) -> Result<Option<Record>, StoreError> {
        let row = sqlx::query_as::<_, RecordRow>(
            "SELECT id, user_id, type, name, description, body, deleted, date \
             FROM datas WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Record::try_from).transpose()
    }

    async fn record_type(&self, id: &str) -> Result<Option<RecordType>, StoreError> {
        let kind: Option<String> = sqlx::query_scalar("SELECT type FROM datas WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        kind.map(|kind| parse_type(id, &kind)).transpose()
    }

    async fn save_record(&self, record: &Record, body: BodyWrite) -> Result<(), StoreError> {
        let date = record.date.unwrap_or_else(Utc::now);
        sqlx::query(
            "INSERT INTO datas (id, user_id, type, name, description, body, deleted, date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (id) DO UPDATE SET \
                user_id = EXCLUDED.user_id, \
                type = EXCLUDED.type, \
                name = EXCLUDED.name, \
                description = EXCLUDED.description, \
                body = CASE WHEN $9 THEN datas.body || EXCLUDED.body ELSE EXCLUDED.body END, \
                deleted = EXCLUDED.deleted, \
                date = EXCLUDED.date",
        )
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(record.record_type.as_str())
        .bind(&record.name)
        .bind(&record.description)
        .bind(&record.body)
        .bind(record.deleted)
        .bind(date)
        .bind(body == BodyWrite::Append)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
