use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::Client;

use crate::error::ClientError;
use crate::model::{DocumentFile, DocumentKind, FileSelection};

pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, ClientError>> + Send>>;

/// Status line and a lazily read body
pub struct UploadResponse {
    pub status: u16,
    pub body: BodyStream,
}

impl UploadResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Read the remaining body into memory
    pub async fn bytes(mut self) -> Result<Vec<u8>, ClientError> {
        let mut buf = Vec::new();
        while let Some(chunk) = self.body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }
}

/// Sends the two documents to the backend. Implemented over HTTP by
/// [`ReqwestTransport`]; tests substitute scripted responses.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn upload(&self, url: &str, files: &FileSelection) -> Result<UploadResponse, ClientError>;
}

#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    fn build_form(files: &FileSelection) -> Result<Form, ClientError> {
        let mut form = Form::new();
        for kind in DocumentKind::all() {
            let file = files.get(kind).ok_or(ClientError::MissingFiles)?;
            form = form.part(kind.form_field(), file_part(file)?);
        }
        Ok(form)
    }
}

fn file_part(file: &DocumentFile) -> Result<Part, ClientError> {
    let part = Part::bytes(file.content.clone())
        .file_name(file.name.clone())
        .mime_str(mime_for(&file.name))?;
    Ok(part)
}

fn mime_for(name: &str) -> &'static str {
    let ext = name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase());
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("csv") => "text/csv",
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn upload(
        &self,
        url: &str,
        files: &FileSelection,
    ) -> Result<UploadResponse, ClientError> {
        let form = Self::build_form(files)?;

        let response = self.client.post(url).multipart(form).send().await?;

        let status = response.status().as_u16();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(ClientError::from));

        Ok(UploadResponse {
            status,
            body: Box::pin(body),
        })
    }
}
