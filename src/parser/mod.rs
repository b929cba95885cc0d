pub mod job;
pub mod links;
pub mod posted;
pub mod skills;
pub mod split;

use chrono::{DateTime, Utc};

use crate::db::JobRecord;
use crate::observe::{Event, Observer};
use job::LineLayout;

/// Account- and layout-specific knobs for reading one feed page.
#[derive(Debug, Clone)]
pub struct PageOptions {
    pub viewer_name: String,
    pub header_marker: String,
    pub layout: LineLayout,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            viewer_name: String::new(),
            header_marker: split::DEFAULT_HEADER_MARKER.to_string(),
            layout: LineLayout::default(),
        }
    }
}

pub struct ParsedPage {
    pub blocks: usize,
    pub jobs: Vec<JobRecord>,
    pub skipped: usize,
}

/// Feed text + anchor hrefs → job records with canonical URLs attached.
///
/// Block `i` takes the `i`-th job link; skipped blocks still consume theirs
/// so later postings stay aligned.
pub fn process_page<S: AsRef<str>>(
    text: &str,
    hrefs: &[S],
    opts: &PageOptions,
    now: DateTime<Utc>,
    observer: &dyn Observer,
) -> ParsedPage {
    let blocks = split::split_posts(text, &opts.viewer_name, &opts.header_marker);
    let urls = links::filter_job_links(hrefs);

    let mut jobs = Vec::with_capacity(blocks.len());
    let mut skipped = 0;
    for (index, block) in blocks.iter().enumerate() {
        let lines = split::block_lines(block);
        match job::parse(&lines, &opts.layout, now, observer) {
            Ok(mut job) => {
                job.job_url = urls.get(index).map(|u| links::canonical_url(u));
                jobs.push(job);
            }
            Err(error) => {
                skipped += 1;
                observer.observe(Event::BlockSkipped {
                    index,
                    error: &error,
                });
            }
        }
    }

    ParsedPage {
        blocks: blocks.len(),
        jobs,
        skipped,
    }
}
