//! Style Check core engine.
//! Counts loose coding-style constructs in a document with three lexical
//! patterns, buckets the total into a tier and renders the tier's image.
//! Editor integration is expressed through the [`Host`] and [`Panel`] traits
//! so the same commands drive the terminal front end and the language server.

use std::{fs, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub mod commands;
pub mod counter;
pub mod host;
pub mod render;
pub mod tier;

pub use commands::{
    CheckReport, CommandError, CommandHandler, CommandOutcome, CommandRegistry, StyleCheck,
    IMAGES_UPDATED, NO_ACTIVE_EDITOR, RUN_CHECK, SET_IMAGES,
};
pub use counter::{count, MatchCounts};
pub use host::{Host, ImagePrompt, Panel, IMAGE_EXTENSIONS};
pub use render::{render_html, resolve_image, PanelOptions, PanelSpec};
pub use tier::{select_tier, Tier};

/// Image reference shown for each tier.
///
/// A reference is either an `http(s)://` URL or a local filesystem path.
/// Nothing here checks that the reference points at a real image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ImageSettings {
    #[serde(alias = "noMatches")]
    pub no_matches: String,
    #[serde(alias = "lessThanFive")]
    pub less_than_five: String,
    #[serde(alias = "fiveOrMore")]
    pub five_or_more: String,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            no_matches: "https://via.placeholder.com/150/FF0000/FFFFFF?text=No+Matches".into(),
            less_than_five: "https://via.placeholder.com/150/00FF00/000000?text=Keep+Improving"
                .into(),
            five_or_more: "https://via.placeholder.com/150/0000FF/FFFFFF?text=Great+Style".into(),
        }
    }
}

impl ImageSettings {
    /// Reference configured for `tier`.
    pub fn reference(&self, tier: Tier) -> &str {
        match tier {
            Tier::Low => &self.no_matches,
            Tier::Mid => &self.less_than_five,
            Tier::High => &self.five_or_more,
        }
    }

    /// Mutable slot for `tier`, used when a picked image replaces the reference.
    pub fn reference_mut(&mut self, tier: Tier) -> &mut String {
        match tier {
            Tier::Low => &mut self.no_matches,
            Tier::Mid => &mut self.less_than_five,
            Tier::High => &mut self.five_or_more,
        }
    }
}

/// Top-level configuration read from `stylecheck.yml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub images: ImageSettings,
}

impl Config {
    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(text).context("Failed to parse YAML")?;
        if value.is_null() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_value(value).context("Invalid config structure")?;
        Ok(cfg)
    }

    /// Load the config at `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Apply a `key=value` override such as `images.no_matches=/tmp/a.png`.
    /// Unknown keys are logged and skipped.
    pub fn apply_override(&mut self, assignment: &str) {
        let mut parts = assignment.splitn(2, '=');
        let key = parts.next().unwrap_or("").trim();
        let val = parts.next().unwrap_or("").trim();
        if key.is_empty() {
            return;
        }
        let tier = match key {
            "images.no_matches" | "images.noMatches" => Tier::Low,
            "images.less_than_five" | "images.lessThanFive" => Tier::Mid,
            "images.five_or_more" | "images.fiveOrMore" => Tier::High,
            _ => {
                tracing::warn!(key, "ignoring unknown config override");
                return;
            }
        };
        *self.images.reference_mut(tier) = val.to_string();
    }
}
