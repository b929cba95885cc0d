/// Feed header that precedes the first posting.
pub const DEFAULT_HEADER_MARKER: &str = "Ordered by most relevant.";

/// Every posting starts with "Posted <relative time>".
const POSTING_BOUNDARY: &str = "Posted";

/// Cut a feed text dump into one raw block per posting.
///
/// Text from the first `viewer_marker` onwards is the profile side panel and
/// is dropped (an empty marker keeps everything). Text up to the last
/// `header_marker` is page chrome. What remains is split on "Posted"; the
/// fragment before the first boundary is not a posting.
pub fn split_posts<'a>(full_text: &'a str, viewer_marker: &str, header_marker: &str) -> Vec<&'a str> {
    let body = if viewer_marker.is_empty() {
        full_text
    } else {
        full_text
            .split_once(viewer_marker)
            .map_or(full_text, |(before, _)| before)
    };

    let body = if header_marker.is_empty() {
        body
    } else {
        body.rsplit_once(header_marker)
            .map_or(body, |(_, after)| after)
    };

    body.split(POSTING_BOUNDARY).skip(1).collect()
}

/// Split a raw block into the lines the job parser indexes into.
pub fn block_lines(block: &str) -> Vec<&str> {
    block.split('\n').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = "Jobs you might like\nBest Matches\nOrdered by most relevant.\
Posted 3 hours ago\nJobA\ndetails\n\
Posted yesterday\nJobB\ndetails\n\
Jane Doe\nAvailable now\nPosted profile 2 days ago";

    #[test]
    fn drops_header_and_viewer_panel() {
        let blocks = split_posts(FEED, "Jane Doe", DEFAULT_HEADER_MARKER);
        assert_eq!(blocks, vec![" 3 hours ago\nJobA\ndetails\n", " yesterday\nJobB\ndetails\n"]);
    }

    #[test]
    fn viewer_panel_kept_without_marker() {
        let blocks = split_posts(FEED, "", DEFAULT_HEADER_MARKER);
        assert_eq!(blocks.len(), 3);
    }

    #[test]
    fn missing_header_keeps_text() {
        let text = "Posted 1 hour ago\nA\nPosted 2 hours ago\nB\n";
        assert_eq!(split_posts(text, "Nobody", DEFAULT_HEADER_MARKER).len(), 2);
    }

    #[test]
    fn last_header_occurrence_wins() {
        let text = "Ordered by most relevant.Posted junk\nOrdered by most relevant.Posted 1 hour ago\nA\n";
        assert_eq!(split_posts(text, "", DEFAULT_HEADER_MARKER), vec![" 1 hour ago\nA\n"]);
    }

    #[test]
    fn no_boundary_no_blocks() {
        assert!(split_posts("Ordered by most relevant.\nnothing here", "", DEFAULT_HEADER_MARKER).is_empty());
        assert!(split_posts("", "Jane", DEFAULT_HEADER_MARKER).is_empty());
    }

    #[test]
    fn lines_keep_trailing_empty() {
        assert_eq!(block_lines(" 1 hour ago\nA\n"), vec![" 1 hour ago", "A", ""]);
    }
}
