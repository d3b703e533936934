//! Editor session lifecycle and resource insertion for confedit
//!
//! A [`SessionHost`] owns the single live [`EditorSession`] of a configuration
//! page. Sessions are rebuilt whenever the bound configuration or the editing
//! mode changes, and an [`InsertionMediator`] turns "insert resource" requests
//! issued from inside a document into a dialog round trip followed by a
//! lookup through a [`ResourceResolver`].

use confedit_core::ConfEditError;
use thiserror::Error;

pub mod buffer;
pub mod host;
pub mod mediator;
pub mod page;
pub mod reference;
pub mod resolver;
pub mod session;
pub mod surface;
pub mod transition;

pub use buffer::{BufferHandle, BufferSurface, BufferSurfaceFactory};
pub use host::{HostView, SessionHost};
pub use mediator::{Delivery, InsertionMediator, MediatorState, PendingInsertion};
pub use page::ConfigPage;
pub use reference::{
    parse_resource_items, scan_placeholders, ResourceItem, ResourceReference, ResourceSelection,
};
pub use resolver::{
    HttpResourceResolver, LookupResponse, ResourceResolver, StaticResourceResolver,
};
pub use session::{EditorSession, SessionContext};
pub use surface::{
    ChangeListener, EditorSurface, InsertionCallback, SessionHooks, SurfaceEvent, SurfaceFactory,
    SurfaceOptions,
};
pub use transition::{SessionBinding, SessionTransition};

/// Result type alias for editor operations
pub type EditorResult<T> = std::result::Result<T, EditorError>;

/// Editor-specific errors
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("No configuration is bound to the editor")]
    NoActiveConfiguration,

    #[error("Invalid resource reference: {0:?}")]
    InvalidReference(String),

    #[error("Resource lookup failed with code {code}: {message}")]
    NotFound { code: i64, message: String },

    #[error("Resource lookup transport failed: {0}")]
    Transport(String),

    #[error("Editor surface has been disposed")]
    SurfaceDisposed,

    #[error("State store error: {0}")]
    Store(#[from] ConfEditError),
}

impl EditorError {
    /// Whether the error came back from the lookup service or its transport
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            EditorError::NotFound { .. } | EditorError::Transport(_)
        )
    }
}

impl From<EditorError> for ConfEditError {
    fn from(err: EditorError) -> Self {
        match err {
            EditorError::Store(inner) => inner,
            EditorError::NotFound { .. } | EditorError::Transport(_) => {
                ConfEditError::lookup(err.to_string())
            }
            other => ConfEditError::editor(other.to_string()),
        }
    }
}
