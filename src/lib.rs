pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod ndjson;
pub mod state;
pub mod transport;

// Re-export main types for convenience
pub use client::{QuotationClient, DEFAULT_BASE_URL};
pub use config::Config;
pub use error::ClientError;
pub use model::{
    DocumentFile, DocumentKind, FileSelection, ProgressStep, QuotationResult, RequestState,
    ResponseMode, StreamRecord,
};
pub use ndjson::NdjsonDecoder;
pub use state::{reduce, Event, Session};
pub use transport::{ReqwestTransport, Transport, UploadResponse};
