use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use courtlist_model::{
    ArtifactRef, CourtCentreId, CourtListId, CourtListType, NewStatusRecord,
    StatusRecord, TrackStatus, TransitionRequest,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::fmt;
use tracing::{debug, info};
use uuid::Uuid;

use super::{StatusStore, UpsertOutcome, not_found};
use crate::error::{PublicationError, Result};

const RECORD_COLUMNS: &str = r#"
    court_list_id,
    court_centre_id,
    court_list_type,
    publish_date,
    publish_status,
    file_status,
    file_url,
    publish_error_message,
    file_error_message,
    created_at,
    last_updated
"#;

/// Status store backed by the `court_list_publish_status` table.
///
/// Transitions run inside a transaction that holds the row lock
/// (`SELECT ... FOR UPDATE`) while the state machine is evaluated.
#[derive(Clone)]
pub struct PostgresStatusStore {
    pool: PgPool,
}

impl fmt::Debug for PostgresStatusStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresStatusStore")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

fn db_error(
    context: &str,
) -> impl FnOnce(sqlx::Error) -> PublicationError + '_ {
    move |e| PublicationError::Database(format!("{context}: {e}"))
}

impl PostgresStatusStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect, apply pending migrations, and return a ready store.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(db_error("Failed to connect to Postgres"))?;
        crate::MIGRATOR.run(&pool).await.map_err(|e| {
            PublicationError::Database(format!(
                "Failed to apply migrations: {e}"
            ))
        })?;
        info!("Status store connected to Postgres");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_row(row: &PgRow) -> Result<StatusRecord> {
        let court_list_id: Uuid = row
            .try_get("court_list_id")
            .map_err(db_error("Failed to read court_list_id"))?;
        let court_centre_id: Uuid = row
            .try_get("court_centre_id")
            .map_err(db_error("Failed to read court_centre_id"))?;
        let court_list_type: String = row
            .try_get("court_list_type")
            .map_err(db_error("Failed to read court_list_type"))?;
        let publish_date: NaiveDate = row
            .try_get("publish_date")
            .map_err(db_error("Failed to read publish_date"))?;
        let publish_status: String = row
            .try_get("publish_status")
            .map_err(db_error("Failed to read publish_status"))?;
        let file_status: String = row
            .try_get("file_status")
            .map_err(db_error("Failed to read file_status"))?;
        let file_url: Option<String> = row
            .try_get("file_url")
            .map_err(db_error("Failed to read file_url"))?;
        let publish_error_message: Option<String> = row
            .try_get("publish_error_message")
            .map_err(db_error("Failed to read publish_error_message"))?;
        let file_error_message: Option<String> = row
            .try_get("file_error_message")
            .map_err(db_error("Failed to read file_error_message"))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(db_error("Failed to read created_at"))?;
        let last_updated: DateTime<Utc> = row
            .try_get("last_updated")
            .map_err(db_error("Failed to read last_updated"))?;

        Ok(StatusRecord {
            court_list_id: CourtListId(court_list_id),
            court_centre_id: CourtCentreId(court_centre_id),
            court_list_type: CourtListType::new(&court_list_type)?,
            publish_date,
            publish_status: parse_status(&publish_status)?,
            file_status: parse_status(&file_status)?,
            file_url: file_url.map(ArtifactRef::new),
            publish_error_message,
            file_error_message,
            created_at,
            last_updated,
        })
    }
}

fn parse_status(raw: &str) -> Result<TrackStatus> {
    raw.parse().map_err(|e| {
        PublicationError::Database(format!("Corrupt status column: {e}"))
    })
}

#[async_trait]
impl StatusStore for PostgresStatusStore {
    async fn upsert(&self, new: NewStatusRecord) -> Result<UpsertOutcome> {
        let inserted = sqlx::query(&format!(
            r#"
            INSERT INTO court_list_publish_status (
                court_list_id, court_centre_id, court_list_type, publish_date,
                created_at, last_updated
            )
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (court_list_id) DO NOTHING
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(new.court_list_id.to_uuid())
        .bind(new.court_centre_id.to_uuid())
        .bind(new.court_list_type.as_str())
        .bind(new.publish_date)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to upsert status record"))?;

        if let Some(row) = inserted {
            return Ok(UpsertOutcome {
                record: Self::map_row(&row)?,
                created: true,
            });
        }

        Ok(UpsertOutcome {
            record: self.get(new.court_list_id).await?,
            created: false,
        })
    }

    async fn get(&self, id: CourtListId) -> Result<StatusRecord> {
        let row = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM court_list_publish_status WHERE court_list_id = $1"
        ))
        .bind(id.to_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to load status record"))?;

        match row {
            Some(row) => Self::map_row(&row),
            None => Err(not_found(id)),
        }
    }

    async fn list_by_court_centre(
        &self,
        court_centre_id: CourtCentreId,
    ) -> Result<Vec<StatusRecord>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM court_list_publish_status
            WHERE court_centre_id = $1
            ORDER BY publish_date, court_list_id
            "#
        ))
        .bind(court_centre_id.to_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list status records"))?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn transition(
        &self,
        id: CourtListId,
        request: TransitionRequest,
    ) -> Result<StatusRecord> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transition"))?;

        let row = sqlx::query(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM court_list_publish_status
            WHERE court_list_id = $1
            FOR UPDATE
            "#
        ))
        .bind(id.to_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to lock status record"))?;

        let current = match row {
            Some(row) => Self::map_row(&row)?,
            None => return Err(not_found(id)),
        };

        // Rejections drop `tx`, rolling back and releasing the lock.
        let next = current.apply(&request, Utc::now())?;

        sqlx::query(
            r#"
            UPDATE court_list_publish_status
            SET publish_status = $2,
                file_status = $3,
                file_url = $4,
                publish_error_message = $5,
                file_error_message = $6,
                last_updated = $7
            WHERE court_list_id = $1
            "#,
        )
        .bind(id.to_uuid())
        .bind(next.publish_status.as_str())
        .bind(next.file_status.as_str())
        .bind(next.file_url.as_ref().map(ArtifactRef::as_str))
        .bind(next.publish_error_message.as_deref())
        .bind(next.file_error_message.as_deref())
        .bind(next.last_updated)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to persist transition"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transition"))?;

        debug!(
            court_list_id = %id,
            track = %request.track,
            status = %request.to,
            "status transition persisted"
        );
        Ok(next)
    }
}
