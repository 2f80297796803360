//! Asynchronously loaded nested sub-documents.
//!
//! An element may host an embedded document that loads independently of the
//! outer tree (the moral equivalent of an iframe). A search pass waits for
//! each sub-document to become ready, bounded by a timeout; one that never
//! loads is skipped, never an error.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::debug;

use crate::tree::node::Document;

/// Readiness state of a sub-document.
#[derive(Debug)]
pub enum SubDocumentState {
    /// Still loading. A pass waits on the notify handle, up to the timeout.
    Pending,
    /// Loaded and holding its document, not yet merged into the host tree.
    Loaded(Document),
    /// The loader reported failure; treated like a timeout.
    Failed,
    /// Content has been merged into the host tree under the owning element.
    Integrated,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<SubDocumentState>,
    notify: Notify,
}

/// Handle stored on the hosting element.
#[derive(Debug, Clone)]
pub struct SubDocument {
    shared: Arc<Shared>,
}

/// Producer-side handle: whoever loads the embedded content resolves or
/// fails it through this.
#[derive(Debug, Clone)]
pub struct SubDocumentLoader {
    shared: Arc<Shared>,
}

impl SubDocument {
    /// Create a sub-document that is already loaded.
    pub fn loaded(content: Document) -> Self {
        SubDocument {
            shared: Arc::new(Shared {
                state: Mutex::new(SubDocumentState::Loaded(content)),
                notify: Notify::new(),
            }),
        }
    }

    /// Create a pending sub-document plus the loader that will resolve it.
    pub fn pending() -> (Self, SubDocumentLoader) {
        let shared = Arc::new(Shared {
            state: Mutex::new(SubDocumentState::Pending),
            notify: Notify::new(),
        });
        (
            SubDocument {
                shared: shared.clone(),
            },
            SubDocumentLoader { shared },
        )
    }

    /// True while the sub-document has not finished loading.
    pub fn is_pending(&self) -> bool {
        matches!(*self.shared.state.lock().unwrap(), SubDocumentState::Pending)
    }

    /// Wait until the sub-document leaves the pending state or the timeout
    /// elapses. Returns true when content is (or was already) available.
    pub async fn wait_ready(&self, timeout: Duration) -> bool {
        loop {
            // register before checking so a resolve between check and await
            // cannot be missed
            let notified = self.shared.notify.notified();
            match &*self.shared.state.lock().unwrap() {
                SubDocumentState::Pending => {}
                SubDocumentState::Failed => return false,
                _ => return true,
            }
            if tokio::time::timeout(timeout, notified).await.is_err() {
                debug!("sub-document did not become ready within {timeout:?}, skipping");
                return false;
            }
        }
    }

    /// Take the loaded document for integration into the host tree. Returns
    /// None unless the state is `Loaded`; flips the state to `Integrated`.
    pub fn take_content(&self) -> Option<Document> {
        let mut state = self.shared.state.lock().unwrap();
        if matches!(*state, SubDocumentState::Loaded(_)) {
            match std::mem::replace(&mut *state, SubDocumentState::Integrated) {
                SubDocumentState::Loaded(doc) => Some(doc),
                _ => unreachable!(),
            }
        } else {
            None
        }
    }
}

impl SubDocumentLoader {
    /// Deliver the loaded content and wake any waiting pass.
    pub fn resolve(&self, content: Document) {
        let mut state = self.shared.state.lock().unwrap();
        if matches!(*state, SubDocumentState::Pending) {
            *state = SubDocumentState::Loaded(content);
            self.shared.notify.notify_waiters();
        }
    }

    /// Report that the content will never be available.
    pub fn fail(&self) {
        let mut state = self.shared.state.lock().unwrap();
        if matches!(*state, SubDocumentState::Pending) {
            *state = SubDocumentState::Failed;
            self.shared.notify.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_doc(text: &str) -> Document {
        let mut doc = Document::new();
        doc.append_text(doc.root(), text);
        doc
    }

    #[tokio::test]
    async fn test_already_loaded() {
        let sub = SubDocument::loaded(small_doc("inner"));
        assert!(!sub.is_pending());
        assert!(sub.wait_ready(Duration::from_millis(10)).await);
        let content = sub.take_content().unwrap();
        assert_eq!(content.text_content(content.root()), "inner");
        // content can only be taken once
        assert!(sub.take_content().is_none());
    }

    #[tokio::test]
    async fn test_resolve_wakes_waiter() {
        let (sub, loader) = SubDocument::pending();
        assert!(sub.is_pending());
        let waiter = tokio::spawn({
            let sub = sub.clone();
            async move { sub.wait_ready(Duration::from_secs(5)).await }
        });
        tokio::task::yield_now().await;
        loader.resolve(small_doc("late"));
        assert!(waiter.await.unwrap());
        assert!(sub.take_content().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_skip_not_error() {
        let (sub, _loader) = SubDocument::pending();
        assert!(!sub.wait_ready(Duration::from_millis(50)).await);
        assert!(sub.take_content().is_none());
    }

    #[tokio::test]
    async fn test_failed_loader() {
        let (sub, loader) = SubDocument::pending();
        loader.fail();
        assert!(!sub.wait_ready(Duration::from_secs(1)).await);
    }
}
