//! Database schema for interview statistics.

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// SQL schema for the statistics database.
///
/// Timestamps are RFC 3339 UTC strings with millisecond precision, so string
/// comparison orders them chronologically.
pub const SCHEMA: &str = r"
PRAGMA journal_mode = WAL;

-- One row per observed interview. outcome is NULL while pending.
CREATE TABLE IF NOT EXISTS interviews (
    id TEXT PRIMARY KEY NOT NULL,
    channel TEXT NOT NULL,
    nick TEXT NOT NULL,
    started_at TEXT NOT NULL,
    queue_length_at_start INTEGER,
    outcome TEXT,
    outcome_at TEXT,
    outcome_message TEXT
);

CREATE TABLE IF NOT EXISTS queue_snapshots (
    id TEXT PRIMARY KEY NOT NULL,
    channel TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    queue_length INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

INSERT OR IGNORE INTO schema_version (version) VALUES (1);

CREATE INDEX IF NOT EXISTS idx_interviews_started_at ON interviews(started_at);
CREATE INDEX IF NOT EXISTS idx_interviews_channel ON interviews(channel);
CREATE INDEX IF NOT EXISTS idx_interviews_nick ON interviews(nick);
CREATE INDEX IF NOT EXISTS idx_interviews_outcome ON interviews(outcome);
CREATE INDEX IF NOT EXISTS idx_snapshots_timestamp ON queue_snapshots(timestamp);
";
