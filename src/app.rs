use std::path::PathBuf;

use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use quotation_client::{reduce, DocumentFile, DocumentKind, Event, QuotationClient, Session};

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Proposal,
    Financial,
    Submit,
}

impl Focus {
    pub fn document(&self) -> Option<DocumentKind> {
        match self {
            Focus::Proposal => Some(DocumentKind::Proposal),
            Focus::Financial => Some(DocumentKind::Financial),
            Focus::Submit => None,
        }
    }
}

/// Path being typed for one upload slot
#[derive(Debug, Clone, Default)]
pub struct PathInput {
    pub value: String,
    pub cursor: usize, // cursor position in chars
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: Focus,

    pub proposal_input: PathInput,
    pub financial_input: PathInput,

    pub session: Session,
    /// One-line feedback that is not part of the request state (bad path, etc.)
    pub status: Option<String>,

    pub progress_scroll: u16,
    pub animation_frame: u8,

    pub client: QuotationClient,
    pub request_task: Option<JoinHandle<()>>,

    // Panel areas for mouse hit-testing (updated during render)
    pub proposal_area: Option<Rect>,
    pub financial_area: Option<Rect>,
    pub submit_area: Option<Rect>,
}

impl App {
    pub fn new(client: QuotationClient) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            focus: Focus::Proposal,

            proposal_input: PathInput::default(),
            financial_input: PathInput::default(),

            session: Session::new(),
            status: None,

            progress_scroll: 0,
            animation_frame: 0,

            client,
            request_task: None,

            proposal_area: None,
            financial_area: None,
            submit_area: None,
        }
    }

    /// Apply a session event through the reducer
    pub fn dispatch(&mut self, event: Event) {
        let finished = matches!(event, Event::StreamEnded(_) | Event::RequestFailed(_));
        self.session = reduce(std::mem::take(&mut self.session), event);
        if finished {
            self.request_task = None;
        }
    }

    pub fn input(&self, kind: DocumentKind) -> &PathInput {
        match kind {
            DocumentKind::Proposal => &self.proposal_input,
            DocumentKind::Financial => &self.financial_input,
        }
    }

    pub fn input_mut(&mut self, kind: DocumentKind) -> &mut PathInput {
        match kind {
            DocumentKind::Proposal => &mut self.proposal_input,
            DocumentKind::Financial => &mut self.financial_input,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            Focus::Proposal => Focus::Financial,
            Focus::Financial => Focus::Submit,
            Focus::Submit => Focus::Proposal,
        };
    }

    pub fn focus_prev(&mut self) {
        self.focus = match self.focus {
            Focus::Proposal => Focus::Submit,
            Focus::Financial => Focus::Proposal,
            Focus::Submit => Focus::Financial,
        };
    }

    /// Load the file named in the slot's path input and select it
    pub async fn select_file(&mut self, kind: DocumentKind) {
        let raw = self.input(kind).value.trim().to_string();
        if raw.is_empty() {
            self.status = Some(format!("Enter a path for the {}", kind.display_name()));
            return;
        }

        let path = expand_home(&raw);
        match DocumentFile::load(kind, &path).await {
            Ok(file) => {
                info!(
                    kind = kind.form_field(),
                    file = %file.name,
                    bytes = file.content.len(),
                    "document selected"
                );
                self.status = None;
                self.dispatch(Event::FileSelected(kind, file));
            }
            Err(e) => {
                warn!(error = %e, "document rejected");
                self.status = Some(e.to_string());
            }
        }
    }

    /// Start an upload on a background task. Its events come back through `tx`.
    pub fn submit(&mut self, tx: UnboundedSender<AppEvent>) {
        if self.session.request.is_processing() {
            self.status = Some("A quotation is already being generated".to_string());
            return;
        }
        if !self.session.can_submit() {
            self.status = Some("Select both documents before generating a quotation".to_string());
            return;
        }

        self.dispatch(Event::SubmitClicked);
        self.status = None;
        self.progress_scroll = 0;

        let client = self.client.clone();
        let files = self.session.files.clone();
        self.request_task = Some(tokio::spawn(async move {
            client
                .run(files, move |event| {
                    let _ = tx.send(AppEvent::Session(event));
                })
                .await;
        }));
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.request.is_processing() {
            self.animation_frame = (self.animation_frame + 1) % 4;
        }
    }

    pub fn scroll_progress_down(&mut self) {
        let max = self.session.progress.len().saturating_sub(1) as u16;
        self.progress_scroll = (self.progress_scroll + 1).min(max);
    }

    pub fn scroll_progress_up(&mut self) {
        self.progress_scroll = self.progress_scroll.saturating_sub(1);
    }
}

fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quotation_client::{
        ClientError, FileSelection, RequestState, ResponseMode, Transport, UploadResponse,
    };
    use std::sync::Arc;
    use std::time::Duration;

    struct StreamingBackend;

    #[async_trait]
    impl Transport for StreamingBackend {
        async fn upload(
            &self,
            _url: &str,
            files: &FileSelection,
        ) -> Result<UploadResponse, ClientError> {
            assert!(files.is_complete());
            let step = r#"{"name":"extract","progress":10,"description":"reading"}"#;
            let result = r#"{"premium":1450.0,"risk_score":0.45,"recommendation":"Approved"}"#;
            let chunks: Vec<Result<Vec<u8>, ClientError>> = vec![
                Ok(format!("{}\n", step).into_bytes()),
                Ok(format!("{}\n", result).into_bytes()),
            ];
            Ok(UploadResponse {
                status: 200,
                body: Box::pin(futures_util::stream::iter(chunks)),
            })
        }
    }

    fn app() -> App {
        let client = QuotationClient::with_transport(
            Arc::new(StreamingBackend),
            "http://backend.test",
            ResponseMode::Streaming,
            Duration::from_secs(5),
        );
        App::new(client)
    }

    #[test]
    fn focus_cycles_through_fields() {
        let mut app = app();
        app.focus_next();
        assert_eq!(app.focus, Focus::Financial);
        app.focus_next();
        assert_eq!(app.focus, Focus::Submit);
        app.focus_next();
        assert_eq!(app.focus, Focus::Proposal);
        app.focus_prev();
        assert_eq!(app.focus, Focus::Submit);
    }

    #[test]
    fn submit_without_files_only_sets_status() {
        let mut app = app();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        app.submit(tx);
        assert_eq!(app.session.request, RequestState::Idle);
        assert!(app.request_task.is_none());
        assert!(app.status.is_some());
    }

    #[test]
    fn expands_home_prefix() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/docs/form.pdf"), home.join("docs/form.pdf"));
        }
        assert_eq!(expand_home("/tmp/form.pdf"), PathBuf::from("/tmp/form.pdf"));
    }

    #[tokio::test]
    async fn select_then_submit_streams_into_session() {
        let dir = tempfile::tempdir().unwrap();
        let proposal = dir.path().join("proposal.pdf");
        let financial = dir.path().join("statement.csv");
        std::fs::write(&proposal, b"%PDF-1.4").unwrap();
        std::fs::write(&financial, b"assets,liabilities\n").unwrap();

        let mut app = app();
        app.proposal_input.value = proposal.display().to_string();
        app.select_file(DocumentKind::Proposal).await;
        assert!(!app.session.can_submit());

        app.financial_input.value = financial.display().to_string();
        app.select_file(DocumentKind::Financial).await;
        assert!(app.session.can_submit());

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        app.submit(tx);
        assert!(app.session.request.is_processing());
        assert!(!app.session.can_submit());

        while app.session.request.is_processing() {
            match rx.recv().await {
                Some(AppEvent::Session(event)) => app.dispatch(event),
                Some(_) => {}
                None => break,
            }
        }

        assert_eq!(app.session.progress.len(), 1);
        assert_eq!(app.session.result().map(|r| r.premium), Some(1450.0));
        assert!(app.request_task.is_none());
    }

    #[tokio::test]
    async fn wrong_extension_is_not_selected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let mut app = app();
        app.proposal_input.value = path.display().to_string();
        app.select_file(DocumentKind::Proposal).await;

        assert!(app.session.files.proposal.is_none());
        assert!(app.status.as_deref().unwrap_or_default().contains("notes.txt"));
    }
}
