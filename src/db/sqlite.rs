use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    QueryBuilder, Sqlite, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use super::{RecordStore, StoreError, StoreResult};
use crate::models::{Filter, Patch, Record};

const SCHEMA: &str = r#"
create table if not exists urls (
    id integer primary key autoincrement,
    url text not null unique,
    short_code text not null unique,
    created_at text not null,
    updated_at text not null,
    access_count integer not null default 0
)
"#;

const COLUMNS: &str = "id, url, short_code, created_at, updated_at, access_count";

#[derive(sqlx::FromRow)]
struct UrlRow {
    id: i64,
    url: String,
    short_code: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    access_count: i64,
}

impl From<UrlRow> for Record {
    fn from(row: UrlRow) -> Self {
        Record {
            id: row.id.to_string(),
            url: row.url,
            short_code: row.short_code,
            created_at: row.created_at,
            updated_at: row.updated_at,
            access_count: row.access_count,
        }
    }
}

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connects to `database_url`, creating the database file and the `urls`
    /// table when missing.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // every connection to an in-memory database sees its own database
        let in_memory = database_url.contains(":memory:");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> StoreResult<Self> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }
}

/// Appends the dual-key condition for `filter`. An empty filter compiles to a
/// condition that matches no row.
fn push_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: &Filter) {
    if filter.is_empty() {
        query.push("0");
        return;
    }

    query.push("(");
    {
        let mut clauses = query.separated(" or ");
        if let Some(url) = filter.url() {
            clauses.push("url = ").push_bind_unseparated(url.to_owned());
        }
        if let Some(code) = filter.short_code() {
            clauses
                .push("short_code = ")
                .push_bind_unseparated(code.to_owned());
        }
    }
    query.push(")");
}

/// Narrows `filter` to a single row id so writes touch at most one record.
fn push_target(query: &mut QueryBuilder<'_, Sqlite>, filter: &Filter) {
    query.push(" where id = (select id from urls where ");
    push_filter(query, filter);
    query.push(" order by id limit 1)");
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn insert(&self, record: &Record) -> StoreResult<String> {
        let result = sqlx::query(
            "insert into urls (url, short_code, created_at, updated_at, access_count) values ($1, $2, $3, $4, $5)",
        )
        .bind(&record.url)
        .bind(&record.short_code)
        .bind(record.created_at)
        .bind(record.updated_at)
        .bind(record.access_count)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid().to_string())
    }

    async fn find_one(&self, filter: &Filter) -> StoreResult<Record> {
        let mut query = QueryBuilder::<Sqlite>::new(format!("select {COLUMNS} from urls where "));
        push_filter(&mut query, filter);
        query.push(" order by id limit 1");

        let row = query
            .build_query_as::<UrlRow>()
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn update_one(&self, filter: &Filter, patch: &Patch) -> StoreResult<()> {
        if patch.is_empty() {
            return self.find_one(filter).await.map(|_| ());
        }

        let mut query = QueryBuilder::<Sqlite>::new("update urls set ");
        {
            let mut assignments = query.separated(", ");
            if let Some(url) = &patch.url {
                assignments.push("url = ").push_bind_unseparated(url.clone());
            }
            if let Some(short_code) = &patch.short_code {
                assignments
                    .push("short_code = ")
                    .push_bind_unseparated(short_code.clone());
            }
            if let Some(created_at) = patch.created_at {
                assignments
                    .push("created_at = ")
                    .push_bind_unseparated(created_at);
            }
            if let Some(updated_at) = patch.updated_at {
                assignments
                    .push("updated_at = ")
                    .push_bind_unseparated(updated_at);
            }
            if let Some(access_count) = patch.access_count {
                assignments
                    .push("access_count = ")
                    .push_bind_unseparated(access_count);
            }
        }
        push_target(&mut query, filter);

        let result = query.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn delete_one(&self, filter: &Filter) -> StoreResult<()> {
        let mut query = QueryBuilder::<Sqlite>::new("delete from urls");
        push_target(&mut query, filter);

        let result = query.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn find_many(&self, limit: usize) -> StoreResult<Vec<Record>> {
        let sql = format!("select {COLUMNS} from urls order by id limit $1");
        let rows = sqlx::query_as::<_, UrlRow>(&sql)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Record::from).collect())
    }
}
