//! The two user-invokable commands and the table that dispatches them.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    count,
    host::{Host, ImagePrompt, Panel},
    render::{render_html, resolve_image, PanelSpec},
    select_tier, Config, ImageSettings, MatchCounts, Tier,
};

pub const SET_IMAGES: &str = "styleCheck.setImages";
pub const RUN_CHECK: &str = "styleCheck.runCheck";

pub const IMAGES_UPDATED: &str = "Images updated successfully!";
pub const NO_ACTIVE_EDITOR: &str = "No active editor found!";

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
}

/// Outcome of a single check, kept for front ends that report it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckReport {
    pub counts: MatchCounts,
    pub total_matches: usize,
    pub tier: Tier,
    /// Configured reference for the tier, before resolution.
    pub reference: String,
    pub image_source: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Image selection finished; `changed` slots were overwritten.
    ImagesUpdated { changed: usize },
    Checked(Box<CheckReport>),
    /// The check had no document to run on.
    NoActiveEditor,
}

/// Session state shared by the commands.
#[derive(Debug, Clone)]
pub struct StyleCheck {
    pub settings: ImageSettings,
    /// Installation directory; the result panel may only read files under it.
    pub extension_path: PathBuf,
}

impl StyleCheck {
    pub fn activate(config: Config, extension_path: impl Into<PathBuf>) -> Self {
        let extension_path = extension_path.into();
        info!(extension_path = %extension_path.display(), "Style Check extension is now active");
        Self {
            settings: config.images,
            extension_path,
        }
    }

    pub fn extension_path(&self) -> &Path {
        &self.extension_path
    }

    /// Prompt for the three tier images in order and store the picked ones.
    /// Returns how many slots changed.
    pub fn set_images<H: Host>(&mut self, host: &mut H) -> usize {
        let mut picks = Vec::with_capacity(Tier::ALL.len());
        for tier in Tier::ALL {
            let prompt = ImagePrompt::new(tier.prompt());
            let picked = host.pick_image(&prompt).filter(|path| {
                let ok = prompt.accepts(path);
                if !ok {
                    warn!(path = %path.display(), %tier, "ignoring non-image selection");
                }
                ok
            });
            picks.push((tier, picked));
        }

        let mut changed = 0;
        for (tier, picked) in picks {
            if let Some(path) = picked {
                let reference = path.to_string_lossy().into_owned();
                debug!(%tier, %reference, "image updated");
                *self.settings.reference_mut(tier) = reference;
                changed += 1;
            }
        }

        host.show_information_message(IMAGES_UPDATED);
        changed
    }

    /// Count the active document and show the tier image in a new panel.
    /// Returns `None` after notifying the user when no document is open.
    pub fn run_check<H: Host>(&self, host: &mut H) -> Option<CheckReport> {
        let Some(text) = host.active_document_text() else {
            host.show_error_message(NO_ACTIVE_EDITOR);
            return None;
        };
        debug!(content = %text, "document content");

        let counts = count(&text);
        let total_matches = counts.total_matches();
        debug!(
            variable_matches = counts.variable_matches,
            const_matches = counts.const_matches,
            function_matches = counts.function_matches,
            total_matches,
            "matches found"
        );

        let tier = select_tier(total_matches);
        let reference = self.settings.reference(tier).to_string();
        let spec = PanelSpec::for_results(&self.extension_path);

        let panel = host.create_panel(&spec);
        let image_source = resolve_image(&reference, &*panel);
        debug!(%image_source, "resolved image source");
        let html = render_html(total_matches, &image_source);
        panel.set_html(html.clone());

        Some(CheckReport {
            counts,
            total_matches,
            tier,
            reference,
            image_source,
            html,
        })
    }
}

pub type CommandHandler<H> = fn(&mut StyleCheck, &mut H) -> CommandOutcome;

fn set_images_command<H: Host>(state: &mut StyleCheck, host: &mut H) -> CommandOutcome {
    let changed = state.set_images(host);
    CommandOutcome::ImagesUpdated { changed }
}

fn run_check_command<H: Host>(state: &mut StyleCheck, host: &mut H) -> CommandOutcome {
    match state.run_check(host) {
        Some(report) => CommandOutcome::Checked(Box::new(report)),
        None => CommandOutcome::NoActiveEditor,
    }
}

/// Maps command identifiers to handlers.
pub struct CommandRegistry<H: Host> {
    handlers: BTreeMap<&'static str, CommandHandler<H>>,
}

impl<H: Host> Default for CommandRegistry<H> {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(SET_IMAGES, set_images_command::<H>);
        registry.register(RUN_CHECK, run_check_command::<H>);
        registry
    }
}

impl<H: Host> CommandRegistry<H> {
    /// A registry with no commands.
    pub fn empty() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Register `handler` under `id`, returning any handler it replaced.
    pub fn register(
        &mut self,
        id: &'static str,
        handler: CommandHandler<H>,
    ) -> Option<CommandHandler<H>> {
        self.handlers.insert(id, handler)
    }

    pub fn commands(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.handlers.contains_key(id)
    }

    pub fn execute(
        &self,
        id: &str,
        state: &mut StyleCheck,
        host: &mut H,
    ) -> Result<CommandOutcome, CommandError> {
        let handler = self
            .handlers
            .get(id)
            .ok_or_else(|| CommandError::UnknownCommand(id.to_string()))?;
        debug!(command = id, "executing command");
        Ok(handler(state, host))
    }
}
