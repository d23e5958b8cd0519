//! Background PDF text extraction.
//!
//! A single tokio task drains a request queue. Each request is parsed on the
//! blocking pool, one page at a time, and answered on its own channel with
//! zero or more `progress` messages followed by exactly one `done` or
//! `error`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::backend::{BackendError, PdfBackend};

/// Messages sent back to the requester.
///
/// Serialized with an internal `type` tag, e.g.
/// `{"type":"progress","page":1,"total":3}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerMessage {
    /// `page` (1-based) has been extracted out of `total`.
    Progress { page: usize, total: usize },
    /// Full document text, one `\n`-terminated line per page.
    Done { text: String },
    /// Extraction failed; no text follows.
    Error { error: String },
}

impl WorkerMessage {
    /// `done` and `error` end a request's stream.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkerMessage::Progress { .. })
    }
}

/// A document to extract, as raw bytes.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub bytes: Vec<u8>,
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("extraction task failed: {0}")]
    Task(String),
}

/// Extract the text of every page, in order.
///
/// Fragments within a page are joined with a single space and each page is
/// terminated by `\n`. `on_progress(page, total)` runs after each page.
pub fn extract_text(
    backend: &dyn PdfBackend,
    bytes: &[u8],
    mut on_progress: impl FnMut(usize, usize),
) -> Result<String, ExtractError> {
    let document = backend.open(bytes)?;
    let total = document.page_count()?;

    let mut text = String::new();
    for page in 1..=total {
        let fragments = document.page_fragments(page)?;
        text.push_str(&fragments.join(" "));
        text.push('\n');
        tracing::debug!(page, total, "extracted page");
        on_progress(page, total);
    }

    Ok(text)
}

struct ExtractJob {
    request: ExtractRequest,
    reply: mpsc::UnboundedSender<WorkerMessage>,
}

/// Handle to the background extraction task.
pub struct ExtractionWorker {
    job_tx: async_channel::Sender<ExtractJob>,
    handle: JoinHandle<()>,
}

impl ExtractionWorker {
    /// Spawn the worker task. Must be called from within a tokio runtime.
    pub fn spawn(backend: Arc<dyn PdfBackend>) -> Self {
        let (job_tx, job_rx) = async_channel::unbounded::<ExtractJob>();
        let handle = tokio::spawn(worker_loop(job_rx, backend));
        Self { job_tx, handle }
    }

    /// Queue a document. Requests are handled strictly one after another.
    pub fn submit(&self, request: ExtractRequest) -> mpsc::UnboundedReceiver<WorkerMessage> {
        let (reply, rx) = mpsc::unbounded_channel();
        if let Err(err) = self.job_tx.try_send(ExtractJob { request, reply }) {
            let job = err.into_inner();
            let _ = job.reply.send(WorkerMessage::Error {
                error: "extraction worker has shut down".to_string(),
            });
        }
        rx
    }

    /// Stop accepting requests and wait for queued ones to finish.
    pub async fn shutdown(self) {
        self.job_tx.close();
        let _ = self.handle.await;
    }
}

async fn worker_loop(jobs: async_channel::Receiver<ExtractJob>, backend: Arc<dyn PdfBackend>) {
    while let Ok(ExtractJob { request, reply }) = jobs.recv().await {
        let backend = Arc::clone(&backend);
        let progress_tx = reply.clone();
        let size = request.bytes.len();
        tracing::debug!(bytes = size, "extraction started");

        let outcome = tokio::task::spawn_blocking(move || {
            extract_text(backend.as_ref(), &request.bytes, |page, total| {
                let _ = progress_tx.send(WorkerMessage::Progress { page, total });
            })
        })
        .await
        .unwrap_or_else(|e| Err(ExtractError::Task(e.to_string())));

        let message = match outcome {
            Ok(text) => {
                tracing::info!(bytes = size, chars = text.len(), "extraction complete");
                WorkerMessage::Done { text }
            }
            Err(e) => {
                tracing::warn!(bytes = size, error = %e, "extraction failed");
                WorkerMessage::Error {
                    error: e.to_string(),
                }
            }
        };
        let _ = reply.send(message);
    }
}
