use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::db::DEFAULT_DB_PATH;
use crate::parser::job::LineLayout;
use crate::parser::split::DEFAULT_HEADER_MARKER;
use crate::parser::PageOptions;

const CONFIG_FILE: &str = "upwork_scraper";
const ENV_PREFIX: &str = "UPWORK";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub db_path: PathBuf,
    /// Display name shown in the profile panel next to the feed.
    pub viewer_name: String,
    pub header_marker: String,
    pub refresh_hours: f64,
    pub snapshot: PathBuf,
    #[serde(default)]
    pub layout: LineLayout,
}

impl Settings {
    /// Defaults, then `upwork_scraper.toml` if present, then `UPWORK_*`
    /// variables (`UPWORK_LAYOUT__DESCRIPTION=4` for nested keys).
    pub fn load() -> Result<Settings> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name(CONFIG_FILE).required(false))
                .add_source(
                    Environment::with_prefix(ENV_PREFIX)
                        .prefix_separator("_")
                        .separator("__")
                        .try_parsing(true),
                ),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Settings> {
        let settings: Settings = builder
            .set_default("db_path", DEFAULT_DB_PATH)?
            .set_default("viewer_name", "")?
            .set_default("header_marker", DEFAULT_HEADER_MARKER)?
            .set_default("refresh_hours", 4.0)?
            .set_default("snapshot", "data/best_matches.json")?
            .build()
            .context("Failed to build settings")?
            .try_deserialize()
            .context("Invalid settings")?;
        settings
            .layout
            .validate()
            .with_context(|| format!("Invalid layout v{}", settings.layout.version))?;
        Ok(settings)
    }

    pub fn page_options(&self) -> PageOptions {
        PageOptions {
            viewer_name: self.viewer_name.clone(),
            header_marker: self.header_marker.clone(),
            layout: self.layout,
        }
    }
}
