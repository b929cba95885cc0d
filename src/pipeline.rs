//! One ingest cycle: snapshot in, rows upserted, report out.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::{self, Upsert};
use crate::observe::{Event, Observer};
use crate::parser::{self, PageOptions};
use crate::snapshot::Snapshot;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub blocks: usize,
    pub parsed: usize,
    pub skipped: usize,
    pub inserted: usize,
    pub updated: usize,
}

/// Parse a snapshot and upsert every posting.
///
/// Each write commits on its own; a store error aborts the cycle but leaves
/// the rows written so far in place.
pub fn run_cycle(
    conn: &Connection,
    snapshot: &Snapshot,
    opts: &PageOptions,
    now: DateTime<Utc>,
    observer: &dyn Observer,
) -> db::Result<CycleReport> {
    let page = parser::process_page(&snapshot.text, &snapshot.links, opts, now, observer);

    let mut report = CycleReport {
        blocks: page.blocks,
        parsed: page.jobs.len(),
        skipped: page.skipped,
        ..Default::default()
    };

    for job in &page.jobs {
        match db::upsert_job(conn, job, now)? {
            Upsert::Inserted => {
                report.inserted += 1;
                observer.observe(Event::Inserted { job });
            }
            Upsert::Updated => {
                report.updated += 1;
                observer.observe(Event::Updated { job });
            }
        }
    }

    observer.observe(Event::CycleFinished { report: &report });
    Ok(report)
}
