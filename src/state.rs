//! UI-agnostic session state and the reducer that drives it.
//!
//! Front-ends never mutate a [`Session`] directly; they feed [`Event`]s through
//! [`reduce`]. Events that do not apply to the current state are ignored.

use crate::model::{
    DocumentFile, DocumentKind, FileSelection, ProgressStep, QuotationResult, RequestState,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    FileSelected(DocumentKind, DocumentFile),
    SubmitClicked,
    ChunkReceived(Vec<ProgressStep>),
    StreamEnded(QuotationResult),
    RequestFailed(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub files: FileSelection,
    pub request: RequestState,
    pub progress: Vec<ProgressStep>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_submit(&self) -> bool {
        self.files.is_complete() && !self.request.is_processing()
    }

    pub fn result(&self) -> Option<&QuotationResult> {
        match &self.request {
            RequestState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.request {
            RequestState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

pub fn reduce(mut session: Session, event: Event) -> Session {
    match event {
        Event::FileSelected(kind, file) => {
            session.files.set(kind, file);
        }
        Event::SubmitClicked => {
            if session.can_submit() {
                session.request = RequestState::Processing;
                session.progress.clear();
            }
        }
        Event::ChunkReceived(steps) => {
            if session.request.is_processing() {
                session.progress.extend(steps);
            }
        }
        Event::StreamEnded(result) => {
            if session.request.is_processing() {
                session.request = RequestState::Succeeded(result);
            }
        }
        Event::RequestFailed(message) => {
            if session.request.is_processing() {
                session.request = RequestState::Failed(message);
            }
        }
    }
    session
}
