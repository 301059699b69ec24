//! Editor collaborator surface.
//!
//! The commands never talk to an editor directly. A front end implements
//! [`Host`] (document access, picker, notifications, panels) and [`Panel`]
//! (URI translation, HTML display).

use std::path::{Path, PathBuf};

use crate::render::PanelSpec;

/// Extensions accepted by the image picker.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Parameters of a single-selection image open dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePrompt {
    pub open_label: &'static str,
    pub can_select_many: bool,
    pub filter_name: &'static str,
    pub extensions: &'static [&'static str],
}

impl ImagePrompt {
    pub fn new(open_label: &'static str) -> Self {
        Self {
            open_label,
            can_select_many: false,
            filter_name: "Images",
            extensions: &IMAGE_EXTENSIONS,
        }
    }

    /// Whether `path` passes the dialog's extension filter (case-insensitive).
    pub fn accepts(&self, path: &Path) -> bool {
        match path.extension().and_then(|s| s.to_str()) {
            Some(ext) => {
                let ext = ext.to_lowercase();
                self.extensions.iter().any(|allowed| *allowed == ext)
            }
            None => false,
        }
    }
}

/// A rendering surface created by the host.
pub trait Panel {
    /// Translate a local file into a URI the panel is able to load.
    fn as_webview_uri(&self, path: &Path) -> String;

    fn set_html(&mut self, html: String);
}

/// Editor services consumed by the commands.
pub trait Host {
    type Panel: Panel;

    /// Full text of the active document, or `None` when no editor is open.
    fn active_document_text(&self) -> Option<String>;

    /// Ask the user for one image. `None` means the dialog was cancelled.
    fn pick_image(&mut self, prompt: &ImagePrompt) -> Option<PathBuf>;

    fn show_information_message(&mut self, message: &str);

    fn show_error_message(&mut self, message: &str);

    /// Open a panel and hand back a handle owned by the host.
    fn create_panel(&mut self, spec: &PanelSpec) -> &mut Self::Panel;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_image_extensions_in_any_case() {
        let prompt = ImagePrompt::new("pick");
        assert!(prompt.accepts(Path::new("/img/a.png")));
        assert!(prompt.accepts(Path::new("/img/a.JPEG")));
        assert!(prompt.accepts(Path::new("b.Gif")));
    }

    #[test]
    fn rejects_other_files() {
        let prompt = ImagePrompt::new("pick");
        assert!(!prompt.accepts(Path::new("/img/a.svg")));
        assert!(!prompt.accepts(Path::new("/img/png")));
        assert!(!prompt.accepts(Path::new("")));
    }

    #[test]
    fn prompt_is_single_selection() {
        let prompt = ImagePrompt::new("pick");
        assert!(!prompt.can_select_many);
        assert_eq!(prompt.filter_name, "Images");
    }
}
