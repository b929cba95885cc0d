//! Pipeline events and the sinks that consume them.

use tracing::{debug, info, warn};

use crate::db::JobRecord;
use crate::parser::job::ParseError;
use crate::parser::posted::TimeParseError;
use crate::pipeline::CycleReport;

#[derive(Debug)]
pub enum Event<'a> {
    BlockSkipped {
        index: usize,
        error: &'a ParseError,
    },
    PostedFallback {
        phrase: &'a str,
        error: &'a TimeParseError,
    },
    Inserted {
        job: &'a JobRecord,
    },
    Updated {
        job: &'a JobRecord,
    },
    CycleFinished {
        report: &'a CycleReport,
    },
}

pub trait Observer {
    fn observe(&self, event: Event<'_>);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn observe(&self, event: Event<'_>) {
        match event {
            Event::BlockSkipped { index, error } => {
                warn!(block = index, %error, "Skipping posting block");
            }
            Event::PostedFallback { phrase, error } => {
                warn!(phrase = phrase.trim(), %error, "Posted date unresolved, using now");
            }
            Event::Inserted { job } => {
                info!(job_id = %job.job_id, title = %job.job_title, "Storing job");
                debug!(
                    proposals = %job.job_proposals,
                    tags = ?job.job_tags,
                    url = ?job.job_url,
                    "Stored job details"
                );
            }
            Event::Updated { job } => {
                info!(
                    job_id = %job.job_id,
                    proposals = %job.job_proposals,
                    "Job already exists, updating proposals"
                );
            }
            Event::CycleFinished { report } => {
                info!(
                    blocks = report.blocks,
                    inserted = report.inserted,
                    updated = report.updated,
                    skipped = report.skipped,
                    "Cycle finished"
                );
            }
        }
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct Recorder {
    events: std::cell::RefCell<Vec<String>>,
}

#[cfg(test)]
impl Recorder {
    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events.borrow().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

#[cfg(test)]
impl Observer for Recorder {
    fn observe(&self, event: Event<'_>) {
        let line = match event {
            Event::BlockSkipped { index, .. } => format!("skipped: {}", index),
            Event::PostedFallback { phrase, .. } => format!("posted_fallback: {}", phrase.trim()),
            Event::Inserted { job } => format!("inserted: {}", job.job_title),
            Event::Updated { job } => format!("updated: {}", job.job_title),
            Event::CycleFinished { report } => {
                format!("finished: {}/{}/{}", report.inserted, report.updated, report.skipped)
            }
        };
        self.events.borrow_mut().push(line);
    }
}
