//! The editing surface seam and the hooks a session hands to it

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::reference::ResourceReference;
use crate::resolver::ResourceResolver;
use crate::{EditorError, EditorResult};

/// Listener invoked with the full document text after every change
pub type ChangeListener = Arc<dyn Fn(String) + Send + Sync>;

/// One-shot continuation that delivers resource content to the point in the
/// document that asked for it.
pub struct InsertionCallback {
    deliver: Box<dyn FnOnce(String) + Send>,
}

impl InsertionCallback {
    pub fn new<F>(deliver: F) -> Self
    where
        F: FnOnce(String) + Send + 'static,
    {
        Self {
            deliver: Box::new(deliver),
        }
    }

    /// Deliver the content, consuming the callback
    pub fn deliver(self, content: String) {
        (self.deliver)(content)
    }
}

impl std::fmt::Debug for InsertionCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsertionCallback").finish_non_exhaustive()
    }
}

/// Events a surface reports back to the host, in emission order
#[derive(Debug)]
pub enum SurfaceEvent {
    ContentChanged {
        session_id: Uuid,
        content: String,
    },
    InsertResourceRequested {
        session_id: Uuid,
        callback: InsertionCallback,
    },
}

impl SurfaceEvent {
    pub fn session_id(&self) -> Uuid {
        match self {
            SurfaceEvent::ContentChanged { session_id, .. }
            | SurfaceEvent::InsertResourceRequested { session_id, .. } => *session_id,
        }
    }

    pub fn event_type(&self) -> &str {
        match self {
            SurfaceEvent::ContentChanged { .. } => "content_changed",
            SurfaceEvent::InsertResourceRequested { .. } => "insert_resource_requested",
        }
    }
}

/// Hooks a session registers on its surface.
///
/// Cloned into the surface; once the owning session is disposed every hook
/// turns into a no-op or a rejection.
#[derive(Clone)]
pub struct SessionHooks {
    session_id: Uuid,
    environment: String,
    zone: String,
    active: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<SurfaceEvent>,
    resolver: Arc<dyn ResourceResolver>,
}

impl SessionHooks {
    pub(crate) fn new(
        session_id: Uuid,
        environment: String,
        zone: String,
        events: mpsc::UnboundedSender<SurfaceEvent>,
        resolver: Arc<dyn ResourceResolver>,
    ) -> Self {
        Self {
            session_id,
            environment,
            zone,
            active: Arc::new(AtomicBool::new(true)),
            events,
            resolver,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub(crate) fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// The surface asks for a resource to be inserted
    pub fn insert_resource(&self, callback: InsertionCallback) {
        if !self.is_active() {
            tracing::debug!(
                "Dropping insertion request from disposed session {}",
                self.session_id
            );
            return;
        }

        self.send(SurfaceEvent::InsertResourceRequested {
            session_id: self.session_id,
            callback,
        });
    }

    /// The surface asks for the content behind a reference written in the
    /// document.
    ///
    /// Only the name is sent; the version suffix is resolved by the lookup
    /// service.
    pub async fn load_resource_detail(&self, reference: &str) -> EditorResult<String> {
        if !self.is_active() {
            tracing::debug!(
                "Rejecting resource load for disposed session {}",
                self.session_id
            );
            return Err(EditorError::NoActiveConfiguration);
        }

        let reference = ResourceReference::parse(reference)?;
        let result = self
            .resolver
            .resolve_by_name_version(&self.environment, &self.zone, reference.name())
            .await;

        if let Err(e) = &result {
            tracing::warn!(
                "Loading resource {} for {}/{} failed: {}",
                reference,
                self.environment,
                self.zone,
                e
            );
        }
        result
    }

    /// The surface reports its full text after a change
    pub fn content_changed(&self, content: String) {
        if !self.is_active() {
            return;
        }

        self.send(SurfaceEvent::ContentChanged {
            session_id: self.session_id,
            content,
        });
    }

    fn send(&self, event: SurfaceEvent) {
        if let Err(e) = self.events.send(event) {
            tracing::warn!(
                "Host is gone, dropping {} from session {}",
                e.0.event_type(),
                self.session_id
            );
        }
    }
}

impl std::fmt::Debug for SessionHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHooks")
            .field("session_id", &self.session_id)
            .field("environment", &self.environment)
            .field("zone", &self.zone)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Options a surface is constructed with
#[derive(Debug, Clone)]
pub struct SurfaceOptions {
    /// Document format, e.g. `toml`
    pub format: String,
    pub hooks: SessionHooks,
}

/// A live text-editing surface and its document model
pub trait EditorSurface: Send {
    /// Replace the whole document text
    fn set_value(&mut self, text: &str);

    /// Current document text
    fn value(&self) -> String;

    /// Move input focus to the surface
    fn focus(&mut self);

    /// Register the listener notified after every change
    fn on_change(&mut self, listener: ChangeListener);

    /// Release the surface and its document model
    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;
}

/// Builds surfaces for new sessions
pub trait SurfaceFactory: Send + Sync {
    fn create(&self, options: SurfaceOptions) -> EditorResult<Box<dyn EditorSurface>>;
}
