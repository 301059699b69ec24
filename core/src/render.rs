use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::host::Panel;

/// Options the result panel is created with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PanelOptions {
    pub enable_scripts: bool,
    /// Directories the panel may read local files from.
    pub local_resource_roots: Vec<PathBuf>,
}

/// Everything a host needs to open the result panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PanelSpec {
    pub view_type: String,
    pub title: String,
    /// 1-based editor column.
    pub view_column: u32,
    pub options: PanelOptions,
}

impl PanelSpec {
    /// Result panel with scripts on and local reads scoped to `extension_path`.
    pub fn for_results(extension_path: &Path) -> Self {
        Self {
            view_type: "styleCheck".into(),
            title: "Code Style Check".into(),
            view_column: 1,
            options: PanelOptions {
                enable_scripts: true,
                local_resource_roots: vec![extension_path.to_path_buf()],
            },
        }
    }

    /// Whether `path` sits under one of the panel's resource roots.
    pub fn can_read(&self, path: &Path) -> bool {
        self.options
            .local_resource_roots
            .iter()
            .any(|root| path.starts_with(root))
    }
}

/// Turn an image reference into something an `<img src>` can load.
///
/// URLs pass through untouched; anything else is a local path and goes
/// through the panel's translation. A missing file is not detected here.
pub fn resolve_image<P: Panel + ?Sized>(reference: &str, panel: &P) -> String {
    if reference.starts_with("http://") || reference.starts_with("https://") {
        return reference.to_string();
    }
    panel.as_webview_uri(Path::new(reference))
}

pub fn render_html(total_matches: usize, image_source: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<body>
    <h1>Code Style Results</h1>
    <p>Total Matches: {total_matches}</p>
    <img src="{image_source}" alt="Result Image" style="max-width: 100%; height: auto;" />
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SchemePanel;

    impl Panel for SchemePanel {
        fn as_webview_uri(&self, path: &Path) -> String {
            format!("webview-resource://{}", path.display())
        }

        fn set_html(&mut self, _html: String) {}
    }

    #[test]
    fn urls_pass_through() {
        let src = resolve_image("https://example.com/a.png", &SchemePanel);
        assert_eq!(src, "https://example.com/a.png");
        let src = resolve_image("http://example.com/b.gif", &SchemePanel);
        assert_eq!(src, "http://example.com/b.gif");
    }

    #[test]
    fn local_paths_are_translated() {
        let src = resolve_image("/local/a.png", &SchemePanel);
        assert_eq!(src, "webview-resource:///local/a.png");
        assert_ne!(src, "/local/a.png");
    }

    #[test]
    fn scheme_check_is_prefix_only() {
        let src = resolve_image("ftp://example.com/a.png", &SchemePanel);
        assert!(src.starts_with("webview-resource://"));
    }

    #[test]
    fn html_embeds_total_and_source() {
        let html = render_html(7, "https://example.com/great.png");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>Code Style Results</h1>"));
        assert!(html.contains("<p>Total Matches: 7</p>"));
        assert!(html.contains(r#"<img src="https://example.com/great.png" alt="Result Image""#));
    }

    #[test]
    fn results_panel_is_scoped_to_extension_dir() {
        let spec = PanelSpec::for_results(Path::new("/opt/ext"));
        assert_eq!(spec.view_type, "styleCheck");
        assert_eq!(spec.title, "Code Style Check");
        assert!(spec.options.enable_scripts);
        assert_eq!(spec.options.local_resource_roots, vec![PathBuf::from("/opt/ext")]);
        assert!(spec.can_read(Path::new("/opt/ext/media/a.png")));
        assert!(!spec.can_read(Path::new("/home/me/a.png")));
    }
}
