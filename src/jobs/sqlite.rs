//! SQLite-backed job store.

use super::{JobRepository, JobStatus, TranscriptionJob};
use crate::error::{HuskError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS transcription_jobs (
        id TEXT PRIMARY KEY,
        status TEXT NOT NULL,
        transcript TEXT,
        summary TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_jobs_status ON transcription_jobs(status);
"#;

const INGESTIBLE: &str =
    "status = 'completed' AND transcript IS NOT NULL AND transcript != ''";

/// SQLite job store.
pub struct SqliteJobStore {
    conn: Mutex<Connection>,
}

impl SqliteJobStore {
    /// Open (or create) a job database at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode so the transcription system can write concurrently
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened job store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory job store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| HuskError::Config(format!("Failed to acquire job store lock: {}", e)))
    }

    fn row_to_job(row: &Row<'_>) -> rusqlite::Result<TranscriptionJob> {
        let status: String = row.get(1)?;
        let created_at: String = row.get(4)?;
        let updated_at: String = row.get(5)?;

        Ok(TranscriptionJob {
            id: row.get(0)?,
            status: status.parse().map_err(|e: String| {
                rusqlite::Error::FromSqlConversionFailure(
                    1,
                    rusqlite::types::Type::Text,
                    e.into(),
                )
            })?,
            transcript: row.get(2)?,
            summary: row.get(3)?,
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[async_trait]
impl JobRepository for SqliteJobStore {
    async fn get(&self, id: &str) -> Result<Option<TranscriptionJob>> {
        let conn = self.lock()?;
        let job = conn
            .query_row(
                "SELECT id, status, transcript, summary, created_at, updated_at
                 FROM transcription_jobs WHERE id = ?1",
                params![id],
                Self::row_to_job,
            )
            .optional()?;
        Ok(job)
    }

    #[instrument(skip(self))]
    async fn list_ingestible(&self) -> Result<Vec<TranscriptionJob>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, status, transcript, summary, created_at, updated_at
             FROM transcription_jobs WHERE {} ORDER BY created_at, id",
            INGESTIBLE
        ))?;

        let jobs = stmt
            .query_map([], Self::row_to_job)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!("Found {} ingestible jobs", jobs.len());
        Ok(jobs)
    }

    async fn count_ingestible(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM transcription_jobs WHERE {}", INGESTIBLE),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    #[instrument(skip(self, summary))]
    async fn save_summary(&self, id: &str, summary: &str) -> Result<()> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE transcription_jobs SET summary = ?1, updated_at = ?2 WHERE id = ?3",
            params![summary, Utc::now().to_rfc3339(), id],
        )?;

        if updated == 0 {
            return Err(HuskError::NotFound(format!("transcription job {}", id)));
        }
        Ok(())
    }

    async fn upsert(&self, job: &TranscriptionJob) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO transcription_jobs
            (id, status, transcript, summary, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                job.id,
                job.status.as_str(),
                job.transcript,
                job.summary,
                job.created_at.to_rfc3339(),
                job.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}
