//! SQLite record store: one `visitors` table

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{
    sqlite::{SqlitePoolOptions, SqliteRow},
    Executor, FromRow, Pool, Sqlite,
};

use crate::{
    error::{AppError, AppResult},
    models::visitor::VisitorRecord,
};

use super::RecordStore;

const SELECT_ALL: &str = r#"
    SELECT arrival, departure, first_name, last_name, company, reason, host, phone, signature
    FROM visitors
    ORDER BY id
"#;

#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Connect to `url` and make sure the table exists
    pub async fn connect(url: &str) -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;
        tracing::info!("Connected to register database");
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: Pool<Sqlite>) -> AppResult<Self> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

async fn insert<'e, E>(executor: E, record: &VisitorRecord) -> AppResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO visitors (arrival, departure, first_name, last_name, company, reason, host, phone, signature)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(record.arrival)
    .bind(record.departure)
    .bind(&record.first_name)
    .bind(&record.last_name)
    .bind(&record.company)
    .bind(&record.reason)
    .bind(&record.host)
    .bind(&record.phone)
    .bind(&record.signature)
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn load_all(&self) -> AppResult<Vec<VisitorRecord>> {
        let rows: Vec<SqliteRow> = sqlx::query(SELECT_ALL).fetch_all(&self.pool).await?;

        rows.iter()
            .enumerate()
            .map(|(index, row)| {
                VisitorRecord::from_row(row).map_err(|e| match e {
                    sqlx::Error::ColumnDecode { index: column, source } => {
                        AppError::CorruptRecord {
                            index,
                            reason: format!("column {}: {}", column, source),
                        }
                    }
                    other => AppError::Database(other),
                })
            })
            .collect()
    }

    async fn save_all(&self, records: &[VisitorRecord]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM visitors").execute(&mut *tx).await?;
        for record in records {
            insert(&mut *tx, record).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn append(&self, record: VisitorRecord) -> AppResult<()> {
        insert(&self.pool, &record).await
    }

    async fn mark_departure(
        &self,
        arrival: NaiveDateTime,
        at: NaiveDateTime,
    ) -> AppResult<bool> {
        if at <= arrival {
            return Err(AppError::Validation(
                "Departure must be later than arrival".to_string(),
            ));
        }

        let result = sqlx::query(
            r#"
            UPDATE visitors SET departure = $1
            WHERE id = (
                SELECT id FROM visitors
                WHERE arrival = $2 AND departure IS NULL
                ORDER BY id LIMIT 1
            )
            "#,
        )
        .bind(at)
        .bind(arrival)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
