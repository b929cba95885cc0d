use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{posted, skills};
use crate::db::JobRecord;
use crate::observe::{Event, Observer};
use crate::utils::job_id_for_title;

const PROPOSALS_LABEL: &str = "Proposals: ";
const FREELANCERS_MARKER: &str = "freelancers";
// "Number of freelancers needed", glued to the count
const FREELANCERS_CUTOFF: &str = " Nu";
const LOAD_MORE: &str = "Load More Jobs";

/// Line positions of one posting in the rendered feed text.
///
/// Bump `version` whenever the marketplace layout shifts and the offsets
/// below are edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineLayout {
    pub version: u32,
    pub posted: usize,
    pub title: usize,
    pub description: usize,
    /// Counted from the end (2 = second-to-last).
    pub proposals_from_end: usize,
    pub skills_start: usize,
    /// Fixed lines after the skill run.
    pub skills_trailer: usize,
}

impl LineLayout {
    pub const V1: LineLayout = LineLayout {
        version: 1,
        posted: 0,
        title: 1,
        description: 5,
        proposals_from_end: 2,
        skills_start: 6,
        skills_trailer: 6,
    };

    /// Shortest block every position above can be read from.
    pub fn min_lines(&self) -> usize {
        [
            self.skills_start.saturating_add(self.skills_trailer),
            self.posted + 1,
            self.title + 1,
            self.description + 1,
            self.proposals_from_end,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    /// Reject offsets that would index outside any block.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.proposals_from_end == 0 {
            return Err(LayoutError::ZeroProposalsOffset);
        }
        self.skills_start
            .checked_add(self.skills_trailer)
            .ok_or(LayoutError::Overflow {
                start: self.skills_start,
                trailer: self.skills_trailer,
            })?;
        Ok(())
    }
}

impl Default for LineLayout {
    fn default() -> Self {
        Self::V1
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("proposals_from_end must be at least 1")]
    ZeroProposalsOffset,
    #[error("skills_start {start} + skills_trailer {trailer} overflows")]
    Overflow { start: usize, trailer: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed block: {lines} lines, layout v{version} needs at least {required}")]
    MalformedBlock {
        lines: usize,
        required: usize,
        version: u32,
    },
    #[error("malformed block: {0} line is blank")]
    BlankField(&'static str),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Parse the lines of one posting block into a record without a URL.
pub fn parse<S: AsRef<str>>(
    lines: &[S],
    layout: &LineLayout,
    now: DateTime<Utc>,
    observer: &dyn Observer,
) -> Result<JobRecord, ParseError> {
    layout.validate()?;
    let required = layout.min_lines();
    if lines.len() < required {
        return Err(ParseError::MalformedBlock {
            lines: lines.len(),
            required,
            version: layout.version,
        });
    }

    let title = lines[layout.title].as_ref();
    if title.trim().is_empty() {
        return Err(ParseError::BlankField("title"));
    }
    let description = lines[layout.description].as_ref();
    if description.trim().is_empty() {
        return Err(ParseError::BlankField("description"));
    }

    let phrase = lines[layout.posted].as_ref();
    let posted_date = match posted::try_resolve(phrase, now) {
        Ok(at) => at,
        Err(error) => {
            observer.observe(Event::PostedFallback {
                phrase,
                error: &error,
            });
            now
        }
    };

    let proposals = clean_proposals(lines[lines.len() - layout.proposals_from_end].as_ref());
    let tags = skills::sanitize(&lines[layout.skills_start..lines.len() - layout.skills_trailer]);

    Ok(JobRecord {
        job_id: job_id_for_title(title),
        job_url: None,
        job_title: title.to_string(),
        posted_date: Some(posted_date),
        job_description: description.to_string(),
        job_tags: tags,
        job_proposals: proposals,
    })
}

/// "Proposals: 20 to 50" -> "20 to 50".
///
/// Lines mentioning freelancers carry the "Number of freelancers needed"
/// label glued on; everything from its start is dropped instead.
pub fn clean_proposals(line: &str) -> String {
    let stripped = line.replace(PROPOSALS_LABEL, "");
    let cleaned = if line.contains(FREELANCERS_MARKER) {
        stripped
            .split(FREELANCERS_CUTOFF)
            .next()
            .unwrap_or_default()
            .to_string()
    } else {
        stripped.replace(LOAD_MORE, "")
    };
    cleaned.trim().to_string()
}
