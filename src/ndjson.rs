//! Incremental decoder for the newline-delimited JSON body of a streaming upload.
//!
//! Bytes are buffered until a `\n` completes a line, so a record (or a UTF-8
//! sequence) split across chunks is decoded once it is whole. Each completed
//! line is decoded on its own; lines that are not valid records, or whose
//! values are out of range, are logged and dropped. The last non-empty line in
//! document order is kept so it can be decoded as the terminal
//! [`QuotationResult`] once the body ends.

use tracing::{debug, warn};

use crate::error::ClientError;
use crate::model::{ProgressStep, QuotationResult, StreamRecord};

#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    pending: Vec<u8>,
    /// Prefix of `pending` already known to hold no newline
    scanned: usize,
    last_line: Option<String>,
    steps: Vec<ProgressStep>,
    discarded: usize,
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one body chunk. Returns the progress steps completed by this chunk,
    /// in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<ProgressStep> {
        self.pending.extend_from_slice(chunk);

        let mut completed = Vec::new();
        while let Some(pos) = self.pending[self.scanned..].iter().position(|b| *b == b'\n') {
            let end = self.scanned + pos;
            let line: Vec<u8> = self.pending.drain(..=end).collect();
            self.scanned = 0;
            if let Some(step) = self.decode_line(&line[..end]) {
                completed.push(step);
            }
        }
        self.scanned = self.pending.len();
        completed
    }

    /// Every progress step decoded so far
    pub fn steps(&self) -> &[ProgressStep] {
        &self.steps
    }

    /// Number of lines dropped because they were malformed or out of range
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// End of body: decode any unterminated trailing line, then decode the last
    /// non-empty line as the quotation.
    pub fn finish(&mut self) -> Result<QuotationResult, ClientError> {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.scanned = 0;
            if let Some(step) = self.decode_line(&rest) {
                debug!(step = %step.name, "progress step in unterminated final line");
            }
        }

        let last = self
            .last_line
            .as_deref()
            .ok_or_else(|| ClientError::Parse("stream ended without a result".to_string()))?;

        let result = serde_json::from_str::<QuotationResult>(last).map_err(|e| {
            ClientError::Parse(format!("last line is not a quotation result: {}", e))
        })?;
        result.validate()?;
        Ok(result)
    }

    fn decode_line(&mut self, raw: &[u8]) -> Option<ProgressStep> {
        let text = String::from_utf8_lossy(raw);
        let line = text.trim();
        if line.is_empty() {
            return None;
        }
        self.last_line = Some(line.to_string());

        match serde_json::from_str::<StreamRecord>(line) {
            Ok(StreamRecord::Progress(step)) => {
                if let Err(e) = step.validate() {
                    self.discarded += 1;
                    warn!(error = %e, "discarding out-of-range progress step");
                    return None;
                }
                debug!(step = %step.name, progress = step.progress, "progress step");
                self.steps.push(step.clone());
                Some(step)
            }
            Ok(StreamRecord::Quotation(_)) => {
                debug!("quotation record received");
                None
            }
            Err(e) => {
                self.discarded += 1;
                warn!(error = %e, line = %line, "discarding malformed stream line");
                None
            }
        }
    }
}
