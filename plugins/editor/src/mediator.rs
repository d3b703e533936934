//! Insertion mediator: from an in-document request to delivered content
//!
//! ```text
//! Idle --request--> AwaitingSelection --confirm(ok)--> Idle   callback invoked once
//!                                     --confirm(err)-> Idle   callback dropped
//!                                     --cancel-------> Idle   callback dropped
//!                                     --invalidate---> Idle   callback dropped
//! ```
//!
//! The pending insertion is taken out of the mediator before any await, so a
//! callback can never be reached twice, and dropping a `confirm` future
//! mid-lookup simply discards it.

use confedit_core::{Action, StateStore};
use std::sync::Arc;
use uuid::Uuid;

use crate::reference::{ResourceReference, ResourceSelection};
use crate::resolver::ResourceResolver;
use crate::surface::InsertionCallback;
use crate::EditorResult;

/// Insertion waiting for the user to pick a resource
#[derive(Debug)]
pub struct PendingInsertion {
    pub session_id: Uuid,
    pub callback: InsertionCallback,
}

/// Mediator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediatorState {
    Idle,
    AwaitingSelection { session_id: Uuid },
}

/// Outcome of a confirmed selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Content was handed to the requesting callback
    Delivered { session_id: Uuid, bytes: usize },
    /// Confirm arrived with nothing pending
    NothingPending,
}

/// Bridges insertion requests to the selection dialog and the resolver
pub struct InsertionMediator {
    pending: Option<PendingInsertion>,
    resolver: Arc<dyn ResourceResolver>,
    store: Arc<dyn StateStore>,
}

impl InsertionMediator {
    pub fn new(resolver: Arc<dyn ResourceResolver>, store: Arc<dyn StateStore>) -> Self {
        Self {
            pending: None,
            resolver,
            store,
        }
    }

    pub fn state(&self) -> MediatorState {
        match &self.pending {
            Some(pending) => MediatorState::AwaitingSelection {
                session_id: pending.session_id,
            },
            None => MediatorState::Idle,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    /// Store the request and open the selection dialog.
    ///
    /// A request arriving while another is pending replaces it; the older
    /// callback is dropped without being invoked.
    pub async fn request(&mut self, pending: PendingInsertion) -> EditorResult<()> {
        if let Some(previous) = self.pending.replace(pending) {
            tracing::warn!(
                "Insertion request from session {} superseded a pending one",
                previous.session_id
            );
        }

        self.store.dispatch(Action::ShowInsertionDialog(true)).await?;
        Ok(())
    }

    /// The user confirmed a resource in the dialog.
    ///
    /// On failure the pending callback is dropped, the error is logged and
    /// returned, and the document is left as it was.
    pub async fn confirm(&mut self, selection: ResourceSelection) -> EditorResult<Delivery> {
        let Some(pending) = self.pending.take() else {
            tracing::debug!("Selection confirmed with no pending insertion");
            return Ok(Delivery::NothingPending);
        };

        self.close_dialog().await;

        let reference = match ResourceReference::parse(&selection.resource) {
            Ok(reference) => reference,
            Err(e) => {
                tracing::warn!("Rejected selection from session {}: {}", pending.session_id, e);
                return Err(e);
            }
        };

        match self.resolver.resolve_detail(reference.as_str()).await {
            Ok(content) => {
                let bytes = content.len();
                pending.callback.deliver(content);
                tracing::info!(
                    "Inserted {} ({} bytes) into session {}",
                    reference,
                    bytes,
                    pending.session_id
                );
                Ok(Delivery::Delivered {
                    session_id: pending.session_id,
                    bytes,
                })
            }
            Err(e) => {
                tracing::warn!(
                    "Lookup of {} for session {} failed: {}",
                    reference,
                    pending.session_id,
                    e
                );
                Err(e)
            }
        }
    }

    /// The dialog was dismissed without a choice
    pub async fn cancel(&mut self) -> EditorResult<()> {
        if let Some(pending) = self.pending.take() {
            tracing::debug!("Insertion for session {} cancelled", pending.session_id);
        }
        self.store.dispatch(Action::ShowInsertionDialog(false)).await?;
        Ok(())
    }

    /// Drop a pending insertion that belongs to a disposed session.
    /// Returns whether anything was dropped.
    pub async fn invalidate_session(&mut self, session_id: Uuid) -> EditorResult<bool> {
        match &self.pending {
            Some(pending) if pending.session_id == session_id => {
                self.pending = None;
                tracing::info!(
                    "Dropped pending insertion of disposed session {}",
                    session_id
                );
                self.store.dispatch(Action::ShowInsertionDialog(false)).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn close_dialog(&self) {
        if let Err(e) = self.store.dispatch(Action::ShowInsertionDialog(false)).await {
            tracing::warn!("Failed to close the insertion dialog: {}", e);
        }
    }
}

impl std::fmt::Debug for InsertionMediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsertionMediator")
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{LookupResponse, StaticResourceResolver};
    use crate::EditorError;
    use async_trait::async_trait;
    use confedit_core::InMemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Resolver answering every detail lookup with a fixed envelope
    struct EnvelopeResolver(LookupResponse);

    #[async_trait]
    impl ResourceResolver for EnvelopeResolver {
        async fn resolve_by_name_version(
            &self,
            _environment: &str,
            _zone: &str,
            _name: &str,
        ) -> EditorResult<String> {
            self.0.clone().into_content()
        }

        async fn resolve_detail(&self, _reference: &str) -> EditorResult<String> {
            self.0.clone().into_content()
        }
    }

    fn recording_callback() -> (InsertionCallback, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        (
            InsertionCallback::new(move |content| sink.lock().unwrap().push(content)),
            calls,
        )
    }

    fn mediator(
        resolver: impl ResourceResolver + 'static,
    ) -> (InsertionMediator, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (
            InsertionMediator::new(Arc::new(resolver), store.clone()),
            store,
        )
    }

    #[tokio::test]
    async fn test_confirm_delivers_once() {
        let (mut mediator, store) =
            mediator(EnvelopeResolver(LookupResponse::ok("timeout=30")));
        let (callback, calls) = recording_callback();
        let session_id = Uuid::new_v4();

        mediator
            .request(PendingInsertion {
                session_id,
                callback,
            })
            .await
            .unwrap();
        assert_eq!(
            mediator.state(),
            MediatorState::AwaitingSelection { session_id }
        );
        assert!(store.snapshot().await.insertion_dialog_visible);

        let delivery = mediator
            .confirm(ResourceSelection::new("cache.conf@v2"))
            .await
            .unwrap();
        assert_eq!(
            delivery,
            Delivery::Delivered {
                session_id,
                bytes: 10
            }
        );
        assert_eq!(*calls.lock().unwrap(), vec!["timeout=30".to_string()]);
        assert!(mediator.is_idle());
        assert!(!store.snapshot().await.insertion_dialog_visible);

        // A second confirm finds nothing to deliver to
        let delivery = mediator
            .confirm(ResourceSelection::new("cache.conf@v2"))
            .await
            .unwrap();
        assert_eq!(delivery, Delivery::NothingPending);
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_lookup_never_invokes_callback() {
        let (mut mediator, _store) = mediator(EnvelopeResolver(LookupResponse::failed(1, "")));
        let (callback, calls) = recording_callback();

        mediator
            .request(PendingInsertion {
                session_id: Uuid::new_v4(),
                callback,
            })
            .await
            .unwrap();

        let result = mediator
            .confirm(ResourceSelection::new("missing.conf"))
            .await;
        assert!(matches!(result, Err(EditorError::NotFound { code: 1, .. })));
        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(mediator.state(), MediatorState::Idle);
    }

    #[tokio::test]
    async fn test_invalid_reference_skips_lookup() {
        let resolver = Arc::new(StaticResourceResolver::new());
        let store = Arc::new(InMemoryStore::new());
        let mut mediator = InsertionMediator::new(resolver.clone(), store);
        let (callback, calls) = recording_callback();

        mediator
            .request(PendingInsertion {
                session_id: Uuid::new_v4(),
                callback,
            })
            .await
            .unwrap();

        let result = mediator.confirm(ResourceSelection::new("  ")).await;
        assert!(matches!(result, Err(EditorError::InvalidReference(_))));
        assert_eq!(resolver.lookup_count(), 0);
        assert!(calls.lock().unwrap().is_empty());
        assert!(mediator.is_idle());
    }

    #[tokio::test]
    async fn test_cancel_returns_to_idle() {
        let (mut mediator, store) =
            mediator(EnvelopeResolver(LookupResponse::ok("timeout=30")));
        let (callback, calls) = recording_callback();

        mediator
            .request(PendingInsertion {
                session_id: Uuid::new_v4(),
                callback,
            })
            .await
            .unwrap();
        mediator.cancel().await.unwrap();

        assert!(mediator.is_idle());
        assert!(calls.lock().unwrap().is_empty());
        assert!(!store.snapshot().await.insertion_dialog_visible);
    }

    #[tokio::test]
    async fn test_newer_request_supersedes_older() {
        let (mut mediator, _store) =
            mediator(EnvelopeResolver(LookupResponse::ok("x=1")));
        let (first, first_calls) = recording_callback();
        let (second, second_calls) = recording_callback();
        let second_session = Uuid::new_v4();

        mediator
            .request(PendingInsertion {
                session_id: Uuid::new_v4(),
                callback: first,
            })
            .await
            .unwrap();
        mediator
            .request(PendingInsertion {
                session_id: second_session,
                callback: second,
            })
            .await
            .unwrap();

        mediator
            .confirm(ResourceSelection::new("x@1"))
            .await
            .unwrap();
        assert!(first_calls.lock().unwrap().is_empty());
        assert_eq!(second_calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_only_matching_session() {
        let (mut mediator, _store) =
            mediator(EnvelopeResolver(LookupResponse::ok("x=1")));
        let (callback, calls) = recording_callback();
        let session_id = Uuid::new_v4();

        mediator
            .request(PendingInsertion {
                session_id,
                callback,
            })
            .await
            .unwrap();

        assert!(!mediator.invalidate_session(Uuid::new_v4()).await.unwrap());
        assert!(!mediator.is_idle());

        assert!(mediator.invalidate_session(session_id).await.unwrap());
        assert!(mediator.is_idle());
        assert_eq!(
            mediator.confirm(ResourceSelection::new("x@1")).await.unwrap(),
            Delivery::NothingPending
        );
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_confirm_future_discards_pending() {
        struct NeverResolver(AtomicUsize);

        #[async_trait]
        impl ResourceResolver for NeverResolver {
            async fn resolve_by_name_version(
                &self,
                _environment: &str,
                _zone: &str,
                _name: &str,
            ) -> EditorResult<String> {
                std::future::pending::<EditorResult<String>>().await
            }

            async fn resolve_detail(&self, _reference: &str) -> EditorResult<String> {
                self.0.fetch_add(1, Ordering::SeqCst);
                std::future::pending::<EditorResult<String>>().await
            }
        }

        let (mut mediator, _store) = mediator(NeverResolver(AtomicUsize::new(0)));
        let (callback, calls) = recording_callback();
        mediator
            .request(PendingInsertion {
                session_id: Uuid::new_v4(),
                callback,
            })
            .await
            .unwrap();

        let confirm = mediator.confirm(ResourceSelection::new("slow@1"));
        let timed_out =
            tokio::time::timeout(std::time::Duration::from_millis(20), confirm).await;
        assert!(timed_out.is_err());

        assert!(mediator.is_idle());
        assert!(calls.lock().unwrap().is_empty());
    }
}
