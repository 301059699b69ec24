use std::{
    env, fs,
    io::{self, BufRead, Read},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use clap::{ArgAction, Parser};
use console::style;
use stylecheck_core::{
    CommandOutcome, CommandRegistry, Config, Host, ImagePrompt, Panel, PanelSpec, StyleCheck,
    RUN_CHECK, SET_IMAGES,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Style Check CLI entry point.
#[derive(Debug, Parser)]
#[command(
    name = "stylecheck",
    version,
    about = "Count loose code-style constructs in a file and render the matching result image."
)]
struct Args {
    /// Path to config file (YAML). Defaults to stylecheck.yml if present.
    #[arg(long, default_value = "stylecheck.yml")]
    config: PathBuf,

    /// Set config overrides (repeatable as key=value). Example: --set images.no_matches=/tmp/none.png
    #[arg(long = "set", value_name = "KEY=VALUE")]
    sets: Vec<String>,

    /// Prompt for the three result images before checking.
    #[arg(long, action = ArgAction::SetTrue)]
    pick: bool,

    /// Emit the check report as JSON instead of HTML.
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Write the result page to this file instead of stdout.
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Directory local images may be loaded from. Defaults to the config directory.
    #[arg(long, value_name = "DIR")]
    extension_path: Option<PathBuf>,

    /// Debug logging on stderr.
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    /// Document to check; `-` reads stdin.
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,
}

/// Result page produced by one check.
struct PagePanel {
    spec: PanelSpec,
    html: Option<String>,
}

impl Panel for PagePanel {
    fn as_webview_uri(&self, path: &Path) -> String {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        if !self.spec.can_read(&absolute) {
            warn!(
                path = %absolute.display(),
                "image is outside the resource root and may not load"
            );
        }
        match Url::from_file_path(&absolute) {
            Ok(url) => url.to_string(),
            Err(()) => format!("file://{}", absolute.display()),
        }
    }

    fn set_html(&mut self, html: String) {
        self.html = Some(html);
    }
}

/// Terminal stand-in for the editor: the document comes from a file and the
/// image picker reads paths line by line from `input`.
struct TerminalHost<R> {
    document: Option<String>,
    input: R,
    panels: Vec<PagePanel>,
}

impl<R: BufRead> TerminalHost<R> {
    fn new(document: Option<String>, input: R) -> Self {
        Self {
            document,
            input,
            panels: Vec::new(),
        }
    }

    fn rendered_html(&self) -> Option<&str> {
        self.panels.last().and_then(|p| p.html.as_deref())
    }
}

impl<R: BufRead> Host for TerminalHost<R> {
    type Panel = PagePanel;

    fn active_document_text(&self) -> Option<String> {
        self.document.clone()
    }

    fn pick_image(&mut self, prompt: &ImagePrompt) -> Option<PathBuf> {
        loop {
            eprint!(
                "{} [{}] (empty to skip): ",
                style(prompt.open_label).bold(),
                prompt.extensions.join(", ")
            );
            let mut line = String::new();
            match self.input.read_line(&mut line) {
                Ok(0) => {
                    eprintln!();
                    return None;
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("failed to read selection: {err}");
                    return None;
                }
            }
            let answer = line.trim();
            if answer.is_empty() {
                return None;
            }
            let path = PathBuf::from(answer);
            if prompt.accepts(&path) {
                return Some(path);
            }
            eprintln!(
                "  {} `{}` is not one of {}",
                style("skipped").yellow(),
                answer,
                prompt.extensions.join(", ")
            );
        }
    }

    fn show_information_message(&mut self, message: &str) {
        eprintln!("{} {}", style("info:").cyan().bold(), message);
    }

    fn show_error_message(&mut self, message: &str) {
        eprintln!("{} {}", style("error:").red().bold(), message);
    }

    fn create_panel(&mut self, spec: &PanelSpec) -> &mut PagePanel {
        self.panels.push(PagePanel {
            spec: spec.clone(),
            html: None,
        });
        let index = self.panels.len() - 1;
        &mut self.panels[index]
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    run(args)
}

fn run(args: Args) -> anyhow::Result<()> {
    let reads_stdin = args.path.as_deref() == Some(Path::new("-"));
    if args.pick && reads_stdin {
        bail!("--pick reads image paths from stdin; pass the document as a file path");
    }

    let (mut cfg, config_root) = load_config(&args.config)?;
    for assignment in &args.sets {
        cfg.apply_override(assignment);
    }
    let extension_path = args.extension_path.clone().unwrap_or(config_root);
    let mut state = StyleCheck::activate(cfg, extension_path);

    let document = read_document(args.path.as_deref())?;
    let stdin = io::stdin();
    let mut host = TerminalHost::new(document, stdin.lock());
    let registry: CommandRegistry<TerminalHost<_>> = CommandRegistry::default();

    if args.pick {
        registry.execute(SET_IMAGES, &mut state, &mut host)?;
    }

    let report = match registry.execute(RUN_CHECK, &mut state, &mut host)? {
        CommandOutcome::Checked(report) => report,
        CommandOutcome::NoActiveEditor => std::process::exit(1),
        other => bail!("unexpected outcome from {RUN_CHECK}: {other:?}"),
    };
    let html = host.rendered_html().unwrap_or(report.html.as_str());

    if let Some(out) = &args.out {
        fs::write(out, html).with_context(|| format!("Failed to write {}", out.display()))?;
        if !args.json {
            eprintln!(
                "{} total matches ({} tier), page written to {}",
                report.total_matches,
                report.tier,
                style(out.display()).cyan()
            );
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if args.out.is_none() {
        print!("{html}");
    }

    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<(Config, PathBuf)> {
    let cfg = Config::load(path)?;
    let dir = if path.exists() {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => env::current_dir()?,
        }
    } else {
        env::current_dir()?
    };
    let dir = std::path::absolute(&dir).unwrap_or(dir);
    Ok((cfg, dir))
}

fn read_document(path: Option<&Path>) -> anyhow::Result<Option<String>> {
    let Some(path) = path else {
        return Ok(None);
    };
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read document from stdin")?;
        return Ok(Some(text));
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Some(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt() -> ImagePrompt {
        ImagePrompt::new("Select an image")
    }

    #[test]
    fn empty_line_cancels_pick() {
        let mut host = TerminalHost::new(None, "\n".as_bytes());
        assert_eq!(host.pick_image(&prompt()), None);
    }

    #[test]
    fn end_of_input_cancels_pick() {
        let mut host = TerminalHost::new(None, "".as_bytes());
        assert_eq!(host.pick_image(&prompt()), None);
    }

    #[test]
    fn non_image_answer_is_asked_again() {
        let mut host = TerminalHost::new(None, "notes.txt\n  /pics/a.png  \n".as_bytes());
        assert_eq!(host.pick_image(&prompt()), Some(PathBuf::from("/pics/a.png")));
    }

    #[test]
    fn local_images_become_file_urls() {
        let panel = PagePanel {
            spec: PanelSpec::for_results(Path::new("/opt/ext")),
            html: None,
        };
        assert_eq!(
            panel.as_webview_uri(Path::new("/opt/ext/media/a b.png")),
            "file:///opt/ext/media/a%20b.png"
        );
    }

    #[test]
    fn host_keeps_last_page() {
        let mut host = TerminalHost::new(Some("x = 1;".into()), "".as_bytes());
        let panel = host.create_panel(&PanelSpec::for_results(Path::new("/opt/ext")));
        panel.set_html("<p>one</p>".into());
        assert_eq!(host.rendered_html(), Some("<p>one</p>"));
    }
}
