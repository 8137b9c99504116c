//! `SQLite` storage for interview records and queue snapshots.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::trigger::InterviewOutcome;

use super::error::AnalyticsError;
use super::schema::SCHEMA;
use super::types::{InterviewRecord, PruneReport, QueueSnapshot, Stats};

const RECORD_COLUMNS: &str = "id, channel, nick, started_at, queue_length_at_start, outcome, outcome_at, outcome_message";

/// Interview statistics store.
///
/// Uses `SQLite` for persistent storage with async operations via `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct AnalyticsStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

fn ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(column: &'static str, value: &str) -> Result<DateTime<Utc>, AnalyticsError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AnalyticsError::Corrupt {
            column,
            value: value.to_string(),
        })
}

/// Raw column values of one `interviews` row.
struct RawRecord {
    id: String,
    channel: String,
    nick: String,
    started_at: String,
    queue_length_at_start: Option<u32>,
    outcome: Option<String>,
    outcome_at: Option<String>,
    outcome_message: Option<String>,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            channel: row.get(1)?,
            nick: row.get(2)?,
            started_at: row.get(3)?,
            queue_length_at_start: row.get(4)?,
            outcome: row.get(5)?,
            outcome_at: row.get(6)?,
            outcome_message: row.get(7)?,
        })
    }

    fn decode(self) -> Result<InterviewRecord, AnalyticsError> {
        let id = Uuid::parse_str(&self.id).map_err(|_| AnalyticsError::Corrupt {
            column: "id",
            value: self.id.clone(),
        })?;
        let outcome = self
            .outcome
            .map(|o| {
                InterviewOutcome::from_db(&o).ok_or(AnalyticsError::Corrupt {
                    column: "outcome",
                    value: o,
                })
            })
            .transpose()?;
        let outcome_at = self
            .outcome_at
            .as_deref()
            .map(|v| parse_ts("outcome_at", v))
            .transpose()?;

        Ok(InterviewRecord {
            id,
            channel: self.channel,
            nick: self.nick,
            started_at: parse_ts("started_at", &self.started_at)?,
            queue_length_at_start: self.queue_length_at_start,
            outcome,
            outcome_at,
            outcome_message: self.outcome_message,
        })
    }
}

fn query_records(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<InterviewRecord>, AnalyticsError> {
    let mut stmt = conn.prepare(sql)?;
    let raw = stmt
        .query_map(params, RawRecord::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    raw.into_iter().map(RawRecord::decode).collect()
}

fn limit_param(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

impl AnalyticsStore {
    /// Open a store at the specified path.
    ///
    /// Creates parent directories if they don't exist and initializes the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema cannot be applied.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, AnalyticsError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await.map_err(|source| {
                    AnalyticsError::CreateDir {
                        path: parent.to_path_buf(),
                        source,
                    }
                })?;
            }
        }

        let path_clone = path.clone();
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection, AnalyticsError> {
            let conn =
                Connection::open(&path_clone).map_err(|source| AnalyticsError::DatabaseOpen {
                    path: path_clone,
                    source,
                })?;
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        })
        .await
        .map_err(|_| AnalyticsError::TaskCancelled)??;

        tracing::debug!(path = %path.display(), "Opened statistics database");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path),
        })
    }

    /// Open an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or the schema cannot be applied.
    pub async fn open_in_memory() -> Result<Self, AnalyticsError> {
        let conn = tokio::task::spawn_blocking(|| -> Result<Connection, AnalyticsError> {
            let conn = Connection::open_in_memory()?;
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        })
        .await
        .map_err(|_| AnalyticsError::TaskCancelled)??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Returns the path to the database, if opened from a file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, AnalyticsError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, AnalyticsError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.blocking_lock();
            f(&mut conn)
        })
        .await
        .map_err(|_| AnalyticsError::TaskCancelled)?
    }

    /// Insert or replace a full interview record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    pub async fn save_interview(&self, record: &InterviewRecord) -> Result<(), AnalyticsError> {
        let id = record.id.to_string();
        let channel = record.channel.clone();
        let nick = record.nick.clone();
        let started_at = ts(record.started_at);
        let queue = record.queue_length_at_start;
        let outcome = record.outcome.map(|o| o.as_str());
        let outcome_at = record.outcome_at.map(ts);
        let message = record.outcome_message.clone();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO interviews (id, channel, nick, started_at, queue_length_at_start, outcome, outcome_at, outcome_message)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![id, channel, nick, started_at, queue, outcome, outcome_at, message],
            )?;
            Ok(())
        })
        .await
    }

    /// Record a queue length sample.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    pub async fn save_snapshot(&self, snapshot: &QueueSnapshot) -> Result<(), AnalyticsError> {
        let id = Uuid::new_v4().to_string();
        let channel = snapshot.channel.clone();
        let timestamp = ts(snapshot.timestamp);
        let queue_length = snapshot.queue_length;

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO queue_snapshots (id, channel, timestamp, queue_length) VALUES (?1, ?2, ?3, ?4)",
                params![id, channel, timestamp, queue_length],
            )?;
            Ok(())
        })
        .await
    }

    /// All interviews still waiting for an outcome, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn pending_interviews(&self) -> Result<Vec<InterviewRecord>, AnalyticsError> {
        self.with_conn(|conn| {
            query_records(
                conn,
                &format!(
                    "SELECT {RECORD_COLUMNS} FROM interviews WHERE outcome IS NULL ORDER BY started_at ASC"
                ),
                [],
            )
        })
        .await
    }

    /// Interviews started at or after `since`, optionally for one channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn interviews_since(
        &self,
        since: DateTime<Utc>,
        channel: Option<&str>,
    ) -> Result<Vec<InterviewRecord>, AnalyticsError> {
        let since = ts(since);
        let channel = channel.map(String::from);
        self.with_conn(move |conn| {
            query_records(
                conn,
                &format!(
                    "SELECT {RECORD_COLUMNS} FROM interviews
                     WHERE started_at >= ?1 AND (?2 IS NULL OR channel = ?2)
                     ORDER BY started_at ASC"
                ),
                params![since, channel],
            )
        })
        .await
    }

    /// Statistics for interviews started at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn stats(
        &self,
        since: DateTime<Utc>,
        channel: Option<&str>,
    ) -> Result<Stats, AnalyticsError> {
        let records = self.interviews_since(since, channel).await?;
        Ok(Stats::compute(&records, since, channel))
    }

    /// Most recent interviews, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn recent_interviews(
        &self,
        limit: usize,
        channel: Option<&str>,
    ) -> Result<Vec<InterviewRecord>, AnalyticsError> {
        let channel = channel.map(String::from);
        self.with_conn(move |conn| {
            query_records(
                conn,
                &format!(
                    "SELECT {RECORD_COLUMNS} FROM interviews
                     WHERE (?1 IS NULL OR channel = ?1)
                     ORDER BY started_at DESC LIMIT ?2"
                ),
                params![channel, limit_param(limit)],
            )
        })
        .await
    }

    /// Interviews of one nick across all channels, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn user_history(
        &self,
        nick: &str,
        limit: usize,
    ) -> Result<Vec<InterviewRecord>, AnalyticsError> {
        let nick = nick.to_string();
        self.with_conn(move |conn| {
            query_records(
                conn,
                &format!(
                    "SELECT {RECORD_COLUMNS} FROM interviews
                     WHERE nick = ?1 COLLATE NOCASE
                     ORDER BY started_at DESC LIMIT ?2"
                ),
                params![nick, limit_param(limit)],
            )
        })
        .await
    }

    /// Queue length samples at or after `since`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn queue_trends(
        &self,
        since: DateTime<Utc>,
        channel: Option<&str>,
    ) -> Result<Vec<QueueSnapshot>, AnalyticsError> {
        let since = ts(since);
        let channel = channel.map(String::from);
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT channel, timestamp, queue_length FROM queue_snapshots
                 WHERE timestamp >= ?1 AND (?2 IS NULL OR channel = ?2)
                 ORDER BY timestamp ASC",
            )?;
            let rows = stmt
                .query_map(params![since, channel], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, u32>(2)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            rows.into_iter()
                .map(|(channel, timestamp, queue_length)| {
                    Ok(QueueSnapshot {
                        channel,
                        timestamp: parse_ts("timestamp", &timestamp)?,
                        queue_length,
                    })
                })
                .collect()
        })
        .await
    }

    /// Delete interviews and snapshots older than `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion fails.
    pub async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<PruneReport, AnalyticsError> {
        let cutoff = ts(cutoff);
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let interviews = tx.execute(
                "DELETE FROM interviews WHERE started_at < ?1",
                params![cutoff],
            )?;
            let snapshots = tx.execute(
                "DELETE FROM queue_snapshots WHERE timestamp < ?1",
                params![cutoff],
            )?;
            tx.commit()?;
            Ok(PruneReport {
                interviews: interviews as u64,
                snapshots: snapshots as u64,
            })
        })
        .await
    }

    /// Count all interview rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count_interviews(&self) -> Result<u64, AnalyticsError> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM interviews", [], |row| row.get(0))?;
            Ok(count.unsigned_abs())
        })
        .await
    }
}
