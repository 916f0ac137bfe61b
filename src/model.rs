//! Wire and domain types shared by the client, the session reducer and the
//! front-ends.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::ClientError;

/// Which of the two upload slots a document belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    Proposal,
    Financial,
}

impl DocumentKind {
    /// Multipart field name the backend expects for this slot
    pub fn form_field(&self) -> &'static str {
        match self {
            DocumentKind::Proposal => "proposal_form",
            DocumentKind::Financial => "financial_statement",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DocumentKind::Proposal => "Proposal Form",
            DocumentKind::Financial => "Financial Statement",
        }
    }

    pub fn accepted_extensions(&self) -> &'static [&'static str] {
        match self {
            DocumentKind::Proposal => &["pdf", "docx", "doc"],
            DocumentKind::Financial => &["csv", "xlsx", "xls", "pdf"],
        }
    }

    /// Case-insensitive extension check against the accepted set
    pub fn accepts(&self, file_name: &str) -> bool {
        Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.accepted_extensions().iter().any(|a| *a == ext)
            })
            .unwrap_or(false)
    }

    pub fn all() -> [DocumentKind; 2] {
        [DocumentKind::Proposal, DocumentKind::Financial]
    }
}

/// A user-chosen file, already read into memory
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub name: String,
    pub content: Vec<u8>,
}

impl DocumentFile {
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }

    /// Read a file from disk for the given slot, rejecting extensions the
    /// backend does not accept for it.
    pub async fn load(kind: DocumentKind, path: &Path) -> Result<Self, ClientError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        if !kind.accepts(&name) {
            return Err(ClientError::UnsupportedFile {
                file: name,
                kind: kind.display_name(),
                accepted: kind
                    .accepted_extensions()
                    .iter()
                    .map(|ext| format!(".{}", ext))
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        let content = tokio::fs::read(path).await.map_err(|source| ClientError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self { name, content })
    }
}

// Content can be megabytes; keep Debug output readable.
impl fmt::Debug for DocumentFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentFile")
            .field("name", &self.name)
            .field("len", &self.content.len())
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSelection {
    pub proposal: Option<DocumentFile>,
    pub financial: Option<DocumentFile>,
}

impl FileSelection {
    pub fn get(&self, kind: DocumentKind) -> Option<&DocumentFile> {
        match kind {
            DocumentKind::Proposal => self.proposal.as_ref(),
            DocumentKind::Financial => self.financial.as_ref(),
        }
    }

    pub fn set(&mut self, kind: DocumentKind, file: DocumentFile) {
        match kind {
            DocumentKind::Proposal => self.proposal = Some(file),
            DocumentKind::Financial => self.financial = Some(file),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.proposal.is_some() && self.financial.is_some()
    }
}

/// One unit of streamed backend progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressStep {
    pub name: String,
    pub progress: f64,
    pub description: String,
}

impl ProgressStep {
    /// `progress` must be a percentage in 0..=100
    pub fn validate(&self) -> Result<(), ClientError> {
        if (0.0..=100.0).contains(&self.progress) {
            Ok(())
        } else {
            Err(ClientError::Parse(format!(
                "progress {} of step '{}' is outside 0-100",
                self.progress, self.name
            )))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotationResult {
    pub premium: f64,
    pub risk_score: f64,
    pub recommendation: String,
}

impl QuotationResult {
    /// `risk_score` must lie in 0.0..=1.0 and `premium` must be finite
    pub fn validate(&self) -> Result<(), ClientError> {
        if !self.premium.is_finite() {
            return Err(ClientError::Parse(format!("premium {} is not a number", self.premium)));
        }
        if !(0.0..=1.0).contains(&self.risk_score) {
            return Err(ClientError::Parse(format!(
                "risk score {} is outside 0.0-1.0",
                self.risk_score
            )));
        }
        Ok(())
    }

    pub fn premium_display(&self) -> String {
        format!("${:.2}", self.premium)
    }

    pub fn risk_display(&self) -> String {
        format!("{:.2}%", self.risk_score * 100.0)
    }
}

/// A single decoded NDJSON line. The backend sends no type tag, so records are
/// told apart by shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StreamRecord {
    Progress(ProgressStep),
    Quotation(QuotationResult),
}

/// Error body returned by the backend on non-success statuses
#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Processing,
    Succeeded(QuotationResult),
    Failed(String),
}

impl RequestState {
    pub fn is_processing(&self) -> bool {
        matches!(self, RequestState::Processing)
    }
}

/// How the response body of an upload is consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    #[default]
    Buffered,
    Streaming,
}

impl ResponseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseMode::Buffered => "buffered",
            ResponseMode::Streaming => "streaming",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "buffered" => Some(ResponseMode::Buffered),
            "streaming" | "stream" => Some(ResponseMode::Streaming),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_expected_extensions() {
        assert!(DocumentKind::Proposal.accepts("form.PDF"));
        assert!(DocumentKind::Proposal.accepts("form.docx"));
        assert!(!DocumentKind::Proposal.accepts("numbers.csv"));
        assert!(DocumentKind::Financial.accepts("numbers.csv"));
        assert!(DocumentKind::Financial.accepts("ledger.xls"));
        assert!(!DocumentKind::Financial.accepts("README"));
    }

    #[tokio::test]
    async fn load_reads_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statement.csv");
        std::fs::write(&path, b"assets,liabilities\n100,50\n").unwrap();

        let file = DocumentFile::load(DocumentKind::Financial, &path).await.unwrap();
        assert_eq!(file.name, "statement.csv");
        assert_eq!(file.content, b"assets,liabilities\n100,50\n");
    }

    #[tokio::test]
    async fn load_rejects_wrong_extension_before_reading() {
        let err = DocumentFile::load(DocumentKind::Proposal, Path::new("/nonexistent/sheet.xlsx"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedFile { .. }));
        assert!(err.to_string().contains(".pdf, .docx, .doc"));
    }

    #[tokio::test]
    async fn load_reports_missing_file() {
        let err = DocumentFile::load(DocumentKind::Proposal, Path::new("/nonexistent/form.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Io { .. }));
    }

    #[test]
    fn stream_record_is_decoded_by_shape() {
        let step: StreamRecord =
            serde_json::from_str(r#"{"name":"extract","progress":10,"description":"..."}"#)
                .unwrap();
        assert!(matches!(step, StreamRecord::Progress(ref s) if s.name == "extract"));

        let result: StreamRecord =
            serde_json::from_str(r#"{"premium":900,"risk_score":0.1,"recommendation":"deny"}"#)
                .unwrap();
        assert_eq!(
            result,
            StreamRecord::Quotation(QuotationResult {
                premium: 900.0,
                risk_score: 0.1,
                recommendation: "deny".to_string(),
            })
        );

        assert!(serde_json::from_str::<StreamRecord>(r#"{"unexpected":true}"#).is_err());
    }

    #[test]
    fn result_display_matches_card_format() {
        let result = QuotationResult {
            premium: 1200.5,
            risk_score: 0.42,
            recommendation: "approve".to_string(),
        };
        assert_eq!(result.premium_display(), "$1200.50");
        assert_eq!(result.risk_display(), "42.00%");
    }

    #[test]
    fn response_mode_parses_case_insensitively() {
        assert_eq!(ResponseMode::from_str("Streaming"), Some(ResponseMode::Streaming));
        assert_eq!(ResponseMode::from_str("buffered"), Some(ResponseMode::Buffered));
        assert_eq!(ResponseMode::from_str("chunky"), None);
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        let step = |progress| ProgressStep {
            name: "score".to_string(),
            progress,
            description: String::new(),
        };
        assert!(step(0.0).validate().is_ok());
        assert!(step(100.0).validate().is_ok());
        assert!(matches!(step(140.0).validate(), Err(ClientError::Parse(_))));
        assert!(step(-1.0).validate().is_err());

        let result = |premium, risk_score| QuotationResult {
            premium,
            risk_score,
            recommendation: "approve".to_string(),
        };
        assert!(result(1200.5, 0.42).validate().is_ok());
        assert!(result(0.0, 1.0).validate().is_ok());
        assert!(matches!(result(1200.5, 42.0).validate(), Err(ClientError::Parse(_))));
        assert!(result(1200.5, -0.1).validate().is_err());
        assert!(result(f64::INFINITY, 0.5).validate().is_err());
    }
}
