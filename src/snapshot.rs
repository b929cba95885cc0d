//! Page snapshots from the browser session: a JSON file with `text`,
//! `links` and `captured_at`, or a directory with `page.txt` and an
//! optional `links.txt` (one href per line).

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

const PAGE_FILE: &str = "page.txt";
const LINKS_FILE: &str = "links.txt";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("reading snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("decoding snapshot {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    pub text: String,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub captured_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Snapshot, SnapshotError> {
        if path.is_dir() {
            return Self::load_dir(path);
        }
        let raw = read(path)?;
        serde_json::from_str(&raw).map_err(|source| SnapshotError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    fn load_dir(dir: &Path) -> Result<Snapshot, SnapshotError> {
        let text = read(&dir.join(PAGE_FILE))?;
        let links_path = dir.join(LINKS_FILE);
        let links = if links_path.exists() {
            read(&links_path)?
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()
        } else {
            Vec::new()
        };
        Ok(Snapshot {
            text,
            links,
            captured_at: None,
        })
    }
}

fn read(path: &Path) -> Result<String, SnapshotError> {
    fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })
}
