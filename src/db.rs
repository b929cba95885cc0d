use std::path::Path;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_DB_PATH: &str = "data/upwork_jobs.sqlite";

/// Same shape as SQLite's CURRENT_TIMESTAMP.
const TS_WRITE: &str = "%Y-%m-%d %H:%M:%S";
/// Also accepts the fractional seconds older rows were written with.
const TS_READ: &str = "%Y-%m-%d %H:%M:%S%.f";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job {0} is already stored")]
    Integrity(String),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("job_tags is not a JSON array: {0}")]
    Tags(#[from] serde_json::Error),
    #[error("unreadable timestamp {0:?} in jobs table")]
    Timestamp(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// One posting as parsed from the feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    pub job_id: String,
    pub job_url: Option<String>,
    pub job_title: String,
    pub posted_date: Option<DateTime<Utc>>,
    pub job_description: String,
    pub job_tags: Vec<String>,
    pub job_proposals: String,
}

pub fn connect(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS jobs (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            job_id          TEXT NOT NULL,
            job_url         TEXT,
            job_title       TEXT NOT NULL,
            posted_date     DATETIME,
            job_description TEXT NOT NULL,
            job_tags        TEXT,
            job_proposals   TEXT,
            updated_at      DATETIME DEFAULT CURRENT_TIMESTAMP
        );
        CREATE INDEX IF NOT EXISTS idx_jobs_job_id ON jobs(job_id);
        ",
    )?;

    // Tables from the first scraper release have no posted_date.
    if !has_column(conn, "jobs", "posted_date")? {
        conn.execute_batch("ALTER TABLE jobs ADD COLUMN posted_date DATETIME;")?;
    }
    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names.iter().any(|n| n == column))
}

// ── Upsert ──

pub fn job_exists(conn: &Connection, job_id: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM jobs WHERE job_id = ?1",
        [job_id],
        |r| r.get(0),
    )?;
    Ok(count > 0)
}

/// Insert a new job. Callers check [`job_exists`] first; a second insert for
/// the same id is refused with [`StoreError::Integrity`].
pub fn insert_job(conn: &Connection, job: &JobRecord, now: DateTime<Utc>) -> Result<()> {
    let tags = serde_json::to_string(&job.job_tags)?;
    let inserted = conn.execute(
        "INSERT INTO jobs
         (job_id, job_url, job_title, posted_date, job_description, job_tags, job_proposals, updated_at)
         SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8
         WHERE NOT EXISTS (SELECT 1 FROM jobs WHERE job_id = ?1)",
        rusqlite::params![
            job.job_id,
            job.job_url,
            job.job_title,
            job.posted_date.map(format_ts),
            job.job_description,
            tags,
            job.job_proposals,
            format_ts(now),
        ],
    )?;
    if inserted == 0 {
        return Err(StoreError::Integrity(job.job_id.clone()));
    }
    Ok(())
}

/// Refresh the mutable fields of a stored job. A `None` url keeps the stored
/// one. Returns the number of rows touched.
pub fn update_proposals(
    conn: &Connection,
    job_id: &str,
    proposals: &str,
    url: Option<&str>,
    now: DateTime<Utc>,
) -> Result<usize> {
    let n = conn.execute(
        "UPDATE jobs
         SET job_proposals = ?1, updated_at = ?2, job_url = COALESCE(?3, job_url)
         WHERE job_id = ?4",
        rusqlite::params![proposals, format_ts(now), url, job_id],
    )?;
    Ok(n)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

pub fn upsert_job(conn: &Connection, job: &JobRecord, now: DateTime<Utc>) -> Result<Upsert> {
    if job_exists(conn, &job.job_id)? {
        update_proposals(
            conn,
            &job.job_id,
            &job.job_proposals,
            job.job_url.as_deref(),
            now,
        )?;
        Ok(Upsert::Updated)
    } else {
        insert_job(conn, job, now)?;
        Ok(Upsert::Inserted)
    }
}

// ── Reads ──

#[derive(Debug, Clone, Serialize)]
pub struct StoredJob {
    pub id: i64,
    pub job: JobRecord,
    pub updated_at: Option<DateTime<Utc>>,
}

pub fn fetch_job(conn: &Connection, job_id: &str) -> Result<Option<StoredJob>> {
    let raw = conn
        .query_row(
            "SELECT id, job_id, job_url, job_title, posted_date, job_description,
                    job_tags, COALESCE(job_proposals, ''), updated_at
             FROM jobs WHERE job_id = ?1
             ORDER BY id LIMIT 1",
            [job_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, Option<String>>(8)?,
                ))
            },
        )
        .optional()?;

    let Some((id, job_id, job_url, job_title, posted, job_description, tags, job_proposals, updated)) =
        raw
    else {
        return Ok(None);
    };

    let job_tags = match tags.as_deref() {
        Some(t) if !t.is_empty() => serde_json::from_str(t)?,
        _ => Vec::new(),
    };

    Ok(Some(StoredJob {
        id,
        job: JobRecord {
            job_id,
            job_url,
            job_title,
            posted_date: posted.as_deref().map(parse_ts).transpose()?,
            job_description,
            job_tags,
            job_proposals,
        },
        updated_at: updated.as_deref().map(parse_ts).transpose()?,
    }))
}

// ── Recent ──

pub struct RecentRow {
    pub job_id: String,
    pub title: String,
    pub posted_date: String,
    pub proposals: String,
    pub url: String,
    pub tags: String,
    pub updated_at: String,
}

pub fn fetch_recent(conn: &Connection, limit: usize) -> Result<Vec<RecentRow>> {
    let mut stmt = conn.prepare(
        "SELECT job_id, job_title, COALESCE(posted_date, ''), COALESCE(job_proposals, ''),
                COALESCE(job_url, ''), COALESCE(job_tags, '[]'), COALESCE(updated_at, '')
         FROM jobs
         ORDER BY updated_at DESC, id DESC
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([limit as i64], |row| {
            Ok(RecentRow {
                job_id: row.get(0)?,
                title: row.get(1)?,
                posted_date: row.get(2)?,
                proposals: row.get(3)?,
                url: row.get(4)?,
                tags: row.get(5)?,
                updated_at: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub total: usize,
    pub with_url: usize,
    pub with_posted_date: usize,
    pub updated_last_day: usize,
}

pub fn get_stats(conn: &Connection, now: DateTime<Utc>) -> Result<Stats> {
    let total: usize = conn.query_row("SELECT COUNT(*) FROM jobs", [], |r| r.get(0))?;
    let with_url: usize = conn.query_row(
        "SELECT COUNT(*) FROM jobs WHERE job_url IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let with_posted_date: usize = conn.query_row(
        "SELECT COUNT(*) FROM jobs WHERE posted_date IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let since = format_ts(now - TimeDelta::days(1));
    let updated_last_day: usize = conn.query_row(
        "SELECT COUNT(*) FROM jobs WHERE updated_at >= ?1",
        [since],
        |r| r.get(0),
    )?;
    Ok(Stats {
        total,
        with_url,
        with_posted_date,
        updated_last_day,
    })
}

fn format_ts(at: DateTime<Utc>) -> String {
    at.format(TS_WRITE).to_string()
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, TS_READ)
        .map(|naive| naive.and_utc())
        .map_err(|_| StoreError::Timestamp(raw.to_string()))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::job_id_for_title;
    use chrono::TimeZone;

    fn mem() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 20, h, 0, 0).unwrap()
    }

    fn job(title: &str, proposals: &str) -> JobRecord {
        JobRecord {
            job_id: job_id_for_title(title),
            job_url: Some("https://www.upwork.com/jobs/~01aa".into()),
            job_title: title.into(),
            posted_date: Some(at(9)),
            job_description: "Landing page in React.".into(),
            job_tags: vec!["React".into(), "CSS".into()],
            job_proposals: proposals.into(),
        }
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = mem();
        init_schema(&conn).unwrap();
        assert!(has_column(&conn, "jobs", "posted_date").unwrap());
    }

    #[test]
    fn old_schema_gains_posted_date() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_id TEXT NOT NULL,
                job_url TEXT,
                job_title TEXT NOT NULL,
                job_description TEXT NOT NULL,
                job_tags TEXT,
                job_proposals TEXT,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            INSERT INTO jobs (job_id, job_title, job_description, job_tags, job_proposals)
            VALUES ('abc', 'Old job', 'desc', '[]', '5 to 10');",
        )
        .unwrap();

        init_schema(&conn).unwrap();
        assert!(has_column(&conn, "jobs", "posted_date").unwrap());

        let old = fetch_job(&conn, "abc").unwrap().unwrap();
        assert_eq!(old.job.job_title, "Old job");
        assert_eq!(old.job.posted_date, None);
        assert!(old.updated_at.is_some());
    }

    #[test]
    fn insert_then_fetch() {
        let conn = mem();
        let j = job("Build a Website", "5 to 10");
        assert!(!job_exists(&conn, &j.job_id).unwrap());
        insert_job(&conn, &j, at(10)).unwrap();
        assert!(job_exists(&conn, &j.job_id).unwrap());

        let stored = fetch_job(&conn, &j.job_id).unwrap().unwrap();
        assert_eq!(stored.job, j);
        assert_eq!(stored.updated_at, Some(at(10)));
    }

    #[test]
    fn duplicate_insert_is_integrity_error() {
        let conn = mem();
        let j = job("Build a Website", "5 to 10");
        insert_job(&conn, &j, at(10)).unwrap();
        let err = insert_job(&conn, &j, at(11)).unwrap_err();
        assert!(matches!(err, StoreError::Integrity(id) if id == j.job_id));
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM jobs", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn empty_tags_stored_as_json_array() {
        let conn = mem();
        let mut j = job("No skills", "Less than 5");
        j.job_tags.clear();
        insert_job(&conn, &j, at(10)).unwrap();
        let raw: String = conn
            .query_row("SELECT job_tags FROM jobs WHERE job_id = ?1", [&j.job_id], |r| r.get(0))
            .unwrap();
        assert_eq!(raw, "[]");
    }

    #[test]
    fn upsert_only_touches_mutable_fields() {
        let conn = mem();
        let first = job("Build a Website", "5 to 10");
        assert_eq!(upsert_job(&conn, &first, at(10)).unwrap(), Upsert::Inserted);

        let mut again = job("BUILD A WEBSITE", "20 to 50");
        again.job_description = "Different text".into();
        again.job_tags = vec!["Go".into()];
        again.posted_date = Some(at(1));
        again.job_url = Some("https://www.upwork.com/jobs/~02bb".into());
        assert_eq!(upsert_job(&conn, &again, at(14)).unwrap(), Upsert::Updated);

        let stored = fetch_job(&conn, &first.job_id).unwrap().unwrap();
        assert_eq!(stored.job.job_title, first.job_title);
        assert_eq!(stored.job.job_description, first.job_description);
        assert_eq!(stored.job.job_tags, first.job_tags);
        assert_eq!(stored.job.posted_date, first.posted_date);
        assert_eq!(stored.job.job_proposals, "20 to 50");
        assert_eq!(stored.job.job_url.as_deref(), Some("https://www.upwork.com/jobs/~02bb"));
        assert_eq!(stored.updated_at, Some(at(14)));
    }

    #[test]
    fn update_without_url_keeps_url() {
        let conn = mem();
        let j = job("Logo design", "5 to 10");
        insert_job(&conn, &j, at(10)).unwrap();
        assert_eq!(update_proposals(&conn, &j.job_id, "10 to 15", None, at(12)).unwrap(), 1);
        let stored = fetch_job(&conn, &j.job_id).unwrap().unwrap();
        assert_eq!(stored.job.job_url, j.job_url);
        assert_eq!(stored.job.job_proposals, "10 to 15");
    }

    #[test]
    fn update_unknown_id_touches_nothing() {
        let conn = mem();
        assert_eq!(update_proposals(&conn, "missing", "1", None, at(12)).unwrap(), 0);
        assert!(fetch_job(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn reads_fractional_timestamps() {
        assert_eq!(parse_ts("2024-05-20 09:00:00").unwrap(), at(9));
        assert_eq!(
            parse_ts("2024-05-20 09:00:00.250000").unwrap(),
            at(9) + TimeDelta::milliseconds(250)
        );
        assert!(matches!(parse_ts("yesterday"), Err(StoreError::Timestamp(_))));
    }

    #[test]
    fn stats_and_recent() {
        let conn = mem();
        insert_job(&conn, &job("Old gig", "50+"), at(1)).unwrap();
        let mut no_url = job("Fresh gig", "Less than 5");
        no_url.job_url = None;
        insert_job(&conn, &no_url, at(12)).unwrap();

        let s = get_stats(&conn, at(12) + TimeDelta::hours(20)).unwrap();
        assert_eq!(s.total, 2);
        assert_eq!(s.with_url, 1);
        assert_eq!(s.with_posted_date, 2);
        assert_eq!(s.updated_last_day, 1);

        let recent = fetch_recent(&conn, 10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].title, "Fresh gig");
        assert_eq!(recent[0].url, "");
        assert_eq!(recent[1].tags, r#"["React","CSS"]"#);
        assert_eq!(fetch_recent(&conn, 1).unwrap().len(), 1);
    }
}
