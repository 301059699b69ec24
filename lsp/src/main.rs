//! Style Check Language Server Protocol front end.
//!
//! Editors reach the two Style Check commands through
//! `workspace/executeCommand`. The server tracks open documents so the check
//! can run against the active one, and returns the rendered page for the
//! client to show in a webview.

use std::collections::VecDeque;
use std::path::PathBuf;

use dashmap::DashMap;
use serde_json::{json, Value};
use stylecheck_core::{
    CheckReport, CommandOutcome, CommandRegistry, Config, Host, ImagePrompt, Panel, PanelSpec,
    StyleCheck, RUN_CHECK, SET_IMAGES,
};
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::{Error as RpcError, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_FILE: &str = "stylecheck.yml";

/// Document state cached by the server.
struct DocumentState {
    content: String,
    version: i32,
}

/// Webview the client is asked to open.
struct WebviewPanel {
    spec: PanelSpec,
    html: Option<String>,
}

impl Panel for WebviewPanel {
    /// Relative references are taken from the panel's resource root.
    fn as_webview_uri(&self, path: &std::path::Path) -> String {
        let absolute = match self.spec.options.local_resource_roots.first() {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        };
        match Url::from_file_path(&absolute) {
            Ok(url) => url.to_string(),
            Err(()) => format!("file:///{}", absolute.display()),
        }
    }

    fn set_html(&mut self, html: String) {
        self.html = Some(html);
    }
}

/// Host for one command execution. Requests that need the client are
/// recorded and sent once the command returns.
#[derive(Default)]
struct BufferedHost {
    document: Option<String>,
    /// Picker answers supplied as command arguments, in prompt order.
    answers: VecDeque<Option<PathBuf>>,
    messages: Vec<(MessageType, String)>,
    panels: Vec<WebviewPanel>,
}

impl Host for BufferedHost {
    type Panel = WebviewPanel;

    fn active_document_text(&self) -> Option<String> {
        self.document.clone()
    }

    fn pick_image(&mut self, prompt: &ImagePrompt) -> Option<PathBuf> {
        let answer = self.answers.pop_front().flatten();
        debug!(prompt = prompt.open_label, ?answer, "image prompt answered");
        answer
    }

    fn show_information_message(&mut self, message: &str) {
        self.messages.push((MessageType::INFO, message.to_string()));
    }

    fn show_error_message(&mut self, message: &str) {
        self.messages.push((MessageType::ERROR, message.to_string()));
    }

    fn create_panel(&mut self, spec: &PanelSpec) -> &mut WebviewPanel {
        self.panels.push(WebviewPanel {
            spec: spec.clone(),
            html: None,
        });
        let index = self.panels.len() - 1;
        &mut self.panels[index]
    }
}

/// Turn `styleCheck.setImages` arguments into picker answers. Strings are
/// paths or `file://` URIs; anything else counts as a cancelled prompt.
fn picks_from_arguments(arguments: &[Value]) -> VecDeque<Option<PathBuf>> {
    arguments
        .iter()
        .take(3)
        .map(|arg| match arg {
            Value::String(s) if !s.trim().is_empty() => {
                let s = s.trim();
                if s.starts_with("file://") {
                    Url::parse(s).ok().and_then(|u| u.to_file_path().ok())
                } else {
                    Some(PathBuf::from(s))
                }
            }
            _ => None,
        })
        .collect()
}

fn check_result(report: &CheckReport, panel: &WebviewPanel) -> Value {
    let html = panel.html.as_deref().unwrap_or(&report.html);
    json!({
        "viewType": panel.spec.view_type,
        "title": panel.spec.title,
        "viewColumn": panel.spec.view_column,
        "options": panel.spec.options,
        "html": html,
        "report": report,
    })
}

/// Style Check Language Server backend.
struct Backend {
    client: Client,
    registry: CommandRegistry<BufferedHost>,
    state: RwLock<StyleCheck>,
    documents: DashMap<Url, DocumentState>,
    active_document: RwLock<Option<Url>>,
    workspace_root: RwLock<Option<PathBuf>>,
    config_path: RwLock<Option<PathBuf>>,
    extension_path: RwLock<Option<PathBuf>>,
}

impl Backend {
    fn new(client: Client) -> Self {
        let extension_path = std::env::current_dir().unwrap_or_default();
        Self {
            client,
            registry: CommandRegistry::default(),
            state: RwLock::new(StyleCheck::activate(Config::default(), extension_path)),
            documents: DashMap::new(),
            active_document: RwLock::new(None),
            workspace_root: RwLock::new(None),
            config_path: RwLock::new(None),
            extension_path: RwLock::new(None),
        }
    }

    async fn reload_config(&self) -> anyhow::Result<()> {
        let workspace_root = self.workspace_root.read().await.clone();
        let configured = self.config_path.read().await.clone();
        let fallback = workspace_root.as_ref().map(|root| root.join(CONFIG_FILE));
        let Some(resolved) = configured.or(fallback) else {
            return Ok(());
        };

        let cfg = Config::load(&resolved)?;
        let extension_path = self
            .extension_path
            .read()
            .await
            .clone()
            .or(workspace_root)
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

        *self.state.write().await = StyleCheck::activate(cfg, extension_path);
        *self.config_path.write().await = Some(resolved.clone());

        self.client
            .log_message(
                MessageType::INFO,
                format!("Style Check config loaded: {}", resolved.display()),
            )
            .await;
        Ok(())
    }

    async fn apply_settings(&self, map: &serde_json::Map<String, Value>) {
        if let Some(Value::String(config_path)) = map.get("configPath") {
            let resolved = self.resolve_setting_path(config_path).await;
            *self.config_path.write().await = resolved;
        }
        if let Some(Value::String(extension_path)) = map.get("extensionPath") {
            let resolved = self.resolve_setting_path(extension_path).await;
            *self.extension_path.write().await = resolved;
        }
    }

    async fn resolve_setting_path(&self, value: &str) -> Option<PathBuf> {
        if value.trim().is_empty() {
            return None;
        }
        let configured = PathBuf::from(value);
        if configured.is_absolute() {
            return Some(configured);
        }
        self.workspace_root
            .read()
            .await
            .as_ref()
            .map(|root| root.join(configured))
    }

    /// Text of the document named by `argument`, or of the active document.
    async fn document_text(&self, argument: Option<&Value>) -> Option<String> {
        let uri = match argument.and_then(Value::as_str) {
            Some(raw) => Url::parse(raw).ok(),
            None => self.active_document.read().await.clone(),
        }?;
        let doc = self.documents.get(&uri)?;
        debug!(%uri, version = doc.version, "checking document");
        Some(doc.content.clone())
    }

    async fn flush_messages(&self, host: &mut BufferedHost) {
        for (kind, message) in host.messages.drain(..) {
            self.client.show_message(kind, message).await;
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        if let Some(root_uri) = params.root_uri.or_else(|| {
            params
                .workspace_folders
                .as_ref()
                .and_then(|folders| folders.first().map(|f| f.uri.clone()))
        }) {
            if let Ok(path) = root_uri.to_file_path() {
                *self.workspace_root.write().await = Some(path);
            }
        }

        if let Some(Value::Object(map)) = params.initialization_options {
            self.apply_settings(&map).await;
        }

        if let Err(err) = self.reload_config().await {
            self.client
                .log_message(MessageType::ERROR, format!("Failed to load config: {err:#}"))
                .await;
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: self.registry.commands().map(String::from).collect(),
                    work_done_progress_options: WorkDoneProgressOptions {
                        work_done_progress: None,
                    },
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "Style Check Language Server".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "Style Check extension is now active!")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let content = params.text_document.text;
        let version = params.text_document.version;

        self.documents
            .insert(uri.clone(), DocumentState { content, version });
        *self.active_document.write().await = Some(uri);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // With FULL sync, we get the complete new content
        if let Some(change) = params.content_changes.into_iter().last() {
            self.documents.insert(
                uri.clone(),
                DocumentState {
                    content: change.text,
                    version,
                },
            );
        }
        *self.active_document.write().await = Some(uri);
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.remove(&uri);
        let mut active = self.active_document.write().await;
        if active.as_ref() == Some(&uri) {
            *active = None;
        }
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        if let Value::Object(map) = params.settings {
            self.apply_settings(&map).await;
        }
        if let Err(err) = self.reload_config().await {
            self.client
                .log_message(
                    MessageType::ERROR,
                    format!("Failed to reload config: {err:#}"),
                )
                .await;
        }
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        let ExecuteCommandParams {
            command, arguments, ..
        } = params;
        if !self.registry.contains(&command) {
            warn!(%command, "unknown command");
            return Err(RpcError::invalid_params(format!("unknown command `{command}`")));
        }

        let mut host = BufferedHost::default();
        match command.as_str() {
            SET_IMAGES => host.answers = picks_from_arguments(&arguments),
            RUN_CHECK => host.document = self.document_text(arguments.first()).await,
            _ => {}
        }

        let mut state = self.state.write().await;
        let outcome = self
            .registry
            .execute(&command, &mut state, &mut host)
            .map_err(|err| RpcError::invalid_params(err.to_string()));
        drop(state);
        let outcome = outcome?;
        self.flush_messages(&mut host).await;

        let result = match outcome {
            CommandOutcome::Checked(report) => {
                info!(total_matches = report.total_matches, tier = %report.tier, "check finished");
                host.panels.last().map(|panel| check_result(&report, panel))
            }
            CommandOutcome::ImagesUpdated { changed } => Some(json!({ "changed": changed })),
            CommandOutcome::NoActiveEditor => None,
        };
        Ok(result)
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("stylecheck_lsp=info,stylecheck_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Style Check LSP server starting");

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
