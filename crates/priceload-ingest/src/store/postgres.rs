//! PostgreSQL store
//!
//! `PgStore` wraps one transaction on one connection. There is no pool: a
//! run opens a connection, does its work, and closes it.
//!
//! Tables live in the `prices_schema` schema created by the migrations in
//! `migrations/`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use priceload_common::{JournalEntry, PriceRow};
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, PgConnection, Postgres, QueryBuilder, Transaction};
use tracing::debug;

use super::PriceStore;
use crate::error::StoreResult;

/// Embedded schema migrations
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// PostgreSQL caps bind parameters per statement at 65 535.
pub const MAX_BIND_PARAMS: usize = 65_535;

/// Columns bound per price row.
const PRICE_COLUMNS: usize = 3;

/// Rows that fit in one INSERT statement.
pub const MAX_ROWS_PER_STATEMENT: usize = MAX_BIND_PARAMS / PRICE_COLUMNS;

/// Open a single connection
pub async fn connect(options: &PgConnectOptions) -> StoreResult<PgConnection> {
    let conn = PgConnection::connect_with(options).await?;
    debug!("Database connection opened");
    Ok(conn)
}

/// Apply pending migrations
pub async fn migrate(conn: &mut PgConnection) -> Result<(), MigrateError> {
    MIGRATOR.run(conn).await
}

/// Read the whole price table outside of an ingestion run
pub async fn select_prices(conn: &mut PgConnection) -> StoreResult<Vec<PriceRow>> {
    let rows: Vec<(String, f64, NaiveDateTime)> =
        sqlx::query_as("SELECT id, price, eff_from FROM prices_schema.prices")
            .fetch_all(conn)
            .await?;

    Ok(rows.into_iter().map(PriceRow::from).collect())
}

/// Every journal entry, oldest run first
pub async fn select_journal(conn: &mut PgConnection) -> StoreResult<Vec<JournalEntry>> {
    let rows: Vec<(String, String, DateTime<Utc>, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT process_id, file_name, start_ts, end_ts
        FROM prices_schema.process_journal
        ORDER BY start_ts, process_id
        "#,
    )
    .fetch_all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(process_id, file_name, start_ts, end_ts)| JournalEntry {
            process_id,
            file_name,
            start_ts,
            end_ts,
        })
        .collect())
}

/// One ingestion run's transaction
pub struct PgStore<'c> {
    tx: Transaction<'c, Postgres>,
}

impl<'c> PgStore<'c> {
    /// Begin a transaction on `conn`
    pub async fn begin(conn: &'c mut PgConnection) -> StoreResult<Self> {
        let tx = conn.begin().await?;
        Ok(Self { tx })
    }
}

#[async_trait]
impl<'c> PriceStore for PgStore<'c> {
    async fn journal_contains(&mut self, process_id: &str) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM prices_schema.process_journal WHERE process_id = $1)",
        )
        .bind(process_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(exists)
    }

    async fn server_time(&mut self) -> StoreResult<DateTime<Utc>> {
        // clock_timestamp() advances inside a transaction, CURRENT_TIMESTAMP does not
        let now: DateTime<Utc> = sqlx::query_scalar("SELECT date_trunc('second', clock_timestamp())")
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(now)
    }

    async fn insert_prices(&mut self, rows: &[PriceRow]) -> StoreResult<u64> {
        let mut inserted = 0;

        for chunk in rows.chunks(MAX_ROWS_PER_STATEMENT) {
            let mut query_builder =
                QueryBuilder::<Postgres>::new("INSERT INTO prices_schema.prices (id, price, eff_from) ");

            query_builder.push_values(chunk.iter(), |mut b, row| {
                b.push_bind(row.id.as_str())
                    .push_bind(row.price)
                    .push_bind(row.eff_from);
            });

            inserted += query_builder
                .build()
                .execute(&mut *self.tx)
                .await?
                .rows_affected();
        }

        Ok(inserted)
    }

    async fn fetch_prices(&mut self) -> StoreResult<Vec<PriceRow>> {
        select_prices(&mut self.tx).await
    }

    async fn insert_journal(&mut self, entry: &JournalEntry) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO prices_schema.process_journal (process_id, file_name, start_ts, end_ts)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&entry.process_id)
        .bind(&entry.file_name)
        .bind(entry.start_ts)
        .bind(entry.end_ts)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
