//! Common helpers shared by the parser, the store and the CLI.

use md5::{Digest, Md5};

/// Stable dedup key for a posting: MD5 hex of the lower-cased title.
///
/// Two postings whose titles differ only by case map to the same id and are
/// treated as one job.
pub fn job_id_for_title(title: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(title.to_lowercase().as_bytes());
    hex::encode(hasher.finalize())
}

/// Single-line cell for the `recent` table: whitespace runs (titles and
/// proposals can carry newlines) collapse to one space, then cut at `max`.
pub fn truncate(s: &str, max: usize) -> String {
    let flat = s.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max) {
        None => flat,
        Some((cut, _)) => format!("{}...", &flat[..cut]),
    }
}

/// Elapsed time for cycle logs: "1.5s", "2m 5s", "1h 2m".
pub fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    match (secs / 3600, (secs % 3600) / 60, secs % 60) {
        (0, 0, _) => format!("{:.1}s", d.as_secs_f64()),
        (0, m, s) => format!("{}m {}s", m, s),
        (h, m, _) => format!("{}h {}m", h, m),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_id_ignores_case() {
        let a = job_id_for_title("Build a Website");
        assert_eq!(a, job_id_for_title("build a website"));
        assert_eq!(a, job_id_for_title("BUILD A WEBSITE"));
        assert_ne!(a, job_id_for_title("Build a Website!"));
    }

    #[test]
    fn job_id_is_md5_hex() {
        let id = job_id_for_title("Build a Website");
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(job_id_for_title(""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Développeur senior", 5), "Dével...");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
    }

    #[test]
    fn truncate_flattens_multiline_titles() {
        assert_eq!(truncate("Rust  CLI\ntool\r\n", 20), "Rust CLI tool");
        assert_eq!(truncate("Rust\n\nCLI tool", 6), "Rust C...");
    }

    #[test]
    fn format_duration_buckets() {
        use std::time::Duration;
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m");
    }
}
