//! Progress-callback trait for per-document pipeline events.
//!
//! Inject an [`Arc<dyn RedactionProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as each document moves through extraction and anonymization.
//!
//! Callbacks rather than channels: the library stays agnostic about how the
//! host application communicates. The CLI forwards events to an indicatif
//! bar; a server could forward them to a websocket instead.

use std::sync::Arc;

/// Called by the pipeline as it processes each document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The trait is `Send + Sync` so an implementation
/// can be shared freely even though the pipeline itself is sequential.
pub trait RedactionProgressCallback: Send + Sync {
    /// Called once after extraction, before any document is anonymized.
    fn on_batch_start(&self, total_docs: usize) {
        let _ = total_docs;
    }

    /// Called just before a document's token stream is redacted.
    fn on_document_start(&self, doc_num: usize, total_docs: usize, name: &str) {
        let _ = (doc_num, total_docs, name);
    }

    /// Called when a document's anonymized Markdown has been written.
    ///
    /// `bytes_written` is the size of the output file.
    fn on_document_complete(&self, doc_num: usize, total_docs: usize, bytes_written: usize) {
        let _ = (doc_num, total_docs, bytes_written);
    }

    /// Called once after every document has been written.
    fn on_batch_complete(&self, total_docs: usize) {
        let _ = total_docs;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RedactionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn RedactionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        batch_total: AtomicUsize,
    }

    impl RedactionProgressCallback for TrackingCallback {
        fn on_batch_start(&self, total_docs: usize) {
            self.batch_total.store(total_docs, Ordering::SeqCst);
        }

        fn on_document_start(&self, _doc_num: usize, _total: usize, _name: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_complete(&self, _doc_num: usize, _total: usize, _bytes: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_document_start(1, 2, "report");
        cb.on_document_complete(1, 2, 1024);
        cb.on_batch_complete(2);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            starts: AtomicUsize::new(0),
            completes: AtomicUsize::new(0),
            batch_total: AtomicUsize::new(0),
        };

        tracker.on_batch_start(2);
        tracker.on_document_start(1, 2, "a");
        tracker.on_document_complete(1, 2, 100);
        tracker.on_document_start(2, 2, "b");
        tracker.on_document_complete(2, 2, 200);
        tracker.on_batch_complete(2);

        assert_eq!(tracker.batch_total.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn RedactionProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_batch_start(1);
        cb.on_document_complete(1, 1, 42);
    }
}
