//! Editor session: one live surface bound to one configuration

use confedit_core::ConfigurationIdentity;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::resolver::ResourceResolver;
use crate::surface::{EditorSurface, SessionHooks, SurfaceEvent, SurfaceFactory, SurfaceOptions};
use crate::{EditorError, EditorResult};

/// Collaborators a session is built from
#[derive(Clone)]
pub struct SessionContext {
    pub factory: Arc<dyn SurfaceFactory>,
    pub resolver: Arc<dyn ResourceResolver>,
    pub events: mpsc::UnboundedSender<SurfaceEvent>,
    /// Format used when the identity carries none
    pub default_format: String,
}

/// Individual editor session owning exactly one surface
pub struct EditorSession {
    id: Uuid,
    identity: ConfigurationIdentity,
    format: String,
    surface: Option<Box<dyn EditorSurface>>,
    hooks: SessionHooks,
}

impl EditorSession {
    /// Build a surface for `identity`, seed it and start listening for edits.
    ///
    /// Any previously live surface must already be disposed; the host takes
    /// care of that ordering.
    pub fn create(
        identity: ConfigurationIdentity,
        initial_content: &str,
        context: &SessionContext,
    ) -> EditorResult<Self> {
        let id = Uuid::new_v4();
        let format = identity.format_or(&context.default_format).to_string();

        let hooks = SessionHooks::new(
            id,
            identity.environment.clone(),
            identity.zone.clone(),
            context.events.clone(),
            context.resolver.clone(),
        );

        let mut surface = context.factory.create(SurfaceOptions {
            format: format.clone(),
            hooks: hooks.clone(),
        })?;

        surface.set_value(initial_content);

        let listener_hooks = hooks.clone();
        surface.on_change(Arc::new(move |content| listener_hooks.content_changed(content)));

        tracing::info!("Created session {} for {} ({})", id, identity, format);

        Ok(Self {
            id,
            identity,
            format,
            surface: Some(surface),
            hooks,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn identity(&self) -> &ConfigurationIdentity {
        &self.identity
    }

    /// Format the surface was created with
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Whether the surface is still live
    pub fn is_live(&self) -> bool {
        self.surface
            .as_ref()
            .is_some_and(|surface| !surface.is_disposed())
    }

    /// Current document text
    pub fn content(&self) -> EditorResult<String> {
        match &self.surface {
            Some(surface) if !surface.is_disposed() => Ok(surface.value()),
            _ => Err(EditorError::SurfaceDisposed),
        }
    }

    /// Replace the document text, optionally returning focus to the surface
    pub fn set_content(&mut self, text: &str, focus: bool) -> EditorResult<()> {
        let surface = match &mut self.surface {
            Some(surface) if !surface.is_disposed() => surface,
            _ => return Err(EditorError::SurfaceDisposed),
        };

        surface.set_value(text);
        if focus {
            surface.focus();
        }
        tracing::debug!("Reseeded session {} ({} bytes)", self.id, text.len());
        Ok(())
    }

    /// Resolve a reference written in the document.
    ///
    /// Same path the surface's own load hook takes. The returned future does
    /// not borrow the session.
    pub fn load_resource_detail(
        &self,
        reference: &str,
    ) -> impl Future<Output = EditorResult<String>> + Send + 'static {
        let hooks = self.hooks.clone();
        let reference = reference.to_string();
        async move { hooks.load_resource_detail(&reference).await }
    }

    /// Release the surface and its model. Safe to call more than once.
    pub fn dispose(&mut self) {
        self.hooks.deactivate();
        if let Some(mut surface) = self.surface.take() {
            surface.dispose();
            tracing::info!("Disposed session {} for {}", self.id, self.identity);
        }
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("id", &self.id)
            .field("identity", &self.identity)
            .field("format", &self.format)
            .field("live", &self.is_live())
            .finish()
    }
}
