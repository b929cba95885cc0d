/// Anchors that point at job pages but are not postings in the feed.
const EXCLUDED: &[&str] = &["ontology_skill_uid", "search/saved", "search/jobs/saved"];

/// Keep the hrefs that belong to feed postings, in page order.
pub fn filter_job_links<S: AsRef<str>>(hrefs: &[S]) -> Vec<String> {
    hrefs
        .iter()
        .map(|h| h.as_ref().trim())
        .filter(|h| h.contains("/jobs/"))
        .filter(|h| !EXCLUDED.iter().any(|x| h.contains(x)))
        .map(str::to_string)
        .collect()
}

/// Strip the tracking query from a job link.
///
/// `.../jobs/~01ab/?referrer=x` becomes `.../jobs/~01ab`; a bare `?` without
/// the slash is cut as well.
pub fn canonical_url(href: &str) -> String {
    let cut = href
        .split_once("/?")
        .or_else(|| href.split_once('?'))
        .map_or(href, |(base, _)| base);
    cut.to_string()
}
