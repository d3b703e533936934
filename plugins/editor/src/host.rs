//! Session host: owns the live session and the presentation state around it

use confedit_core::{Action, BoundConfiguration, EditorMode, EditorSettings, StateStore};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::mediator::{Delivery, InsertionMediator, MediatorState, PendingInsertion};
use crate::reference::ResourceSelection;
use crate::resolver::ResourceResolver;
use crate::session::{EditorSession, SessionContext};
use crate::surface::{SurfaceEvent, SurfaceFactory};
use crate::transition::{SessionBinding, SessionTransition};
use crate::EditorResult;

/// What the host presents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostView {
    /// Configuration file is loading; editing is suppressed
    Loading,
    /// No configuration selected; no session exists
    Unselected,
    /// A live session is shown
    Editing { session_id: Uuid },
}

/// Composes the editor session, the insertion mediator and the state store.
///
/// The single live [`EditorSession`] is a field of the host; nothing else
/// holds it.
pub struct SessionHost {
    store: Arc<dyn StateStore>,
    settings: EditorSettings,
    context: SessionContext,
    events: mpsc::UnboundedReceiver<SurfaceEvent>,
    mediator: InsertionMediator,
    session: Option<EditorSession>,
    binding: SessionBinding,
    loading: bool,
}

impl SessionHost {
    pub fn new(
        store: Arc<dyn StateStore>,
        factory: Arc<dyn SurfaceFactory>,
        resolver: Arc<dyn ResourceResolver>,
        settings: EditorSettings,
    ) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        let context = SessionContext {
            factory,
            resolver: resolver.clone(),
            events: events_tx,
            default_format: settings.default_format.clone(),
        };

        Self {
            mediator: InsertionMediator::new(resolver, store.clone()),
            store,
            settings,
            context,
            events,
            session: None,
            binding: SessionBinding::default(),
            loading: false,
        }
    }

    /// Current presentation
    pub fn view(&self) -> HostView {
        if self.loading {
            return HostView::Loading;
        }

        match &self.session {
            Some(session) if self.binding.configuration.is_some() => HostView::Editing {
                session_id: session.id(),
            },
            _ => HostView::Unselected,
        }
    }

    pub fn session(&self) -> Option<&EditorSession> {
        self.session.as_ref()
    }

    pub fn binding(&self) -> &SessionBinding {
        &self.binding
    }

    pub fn mediator_state(&self) -> MediatorState {
        self.mediator.state()
    }

    /// Set the loading flag
    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Move to a new `(mode, configuration)` binding and apply whatever the
    /// change calls for.
    pub async fn sync(
        &mut self,
        mode: EditorMode,
        configuration: Option<BoundConfiguration>,
    ) -> EditorResult<SessionTransition> {
        let next = SessionBinding::new(mode, configuration);
        let transition = SessionTransition::between(&self.binding, &next);
        tracing::debug!("Session transition: {:?}", transition);

        let identity_changed = self.binding.identity() != next.identity();
        self.binding = next;

        match &transition {
            SessionTransition::NoOp => {}
            SessionTransition::Reseed(content) => match self.session.as_mut() {
                Some(session) => session.set_content(content, self.settings.focus_on_reseed)?,
                None => tracing::debug!("No live session to reseed"),
            },
            SessionTransition::Teardown => {
                self.dispose_session().await?;
                // Nothing is bound, so no text is current either
                self.store
                    .dispatch(Action::SetCurrentContent(String::new()))
                    .await?;
            }
            SessionTransition::Recreate => {
                if let Err(e) = self.recreate(identity_changed).await {
                    // Nothing is live now; the next sync has to rebuild
                    self.binding = SessionBinding::default();
                    return Err(e);
                }
            }
        }

        Ok(transition)
    }

    /// Read the store and sync to what it holds
    pub async fn sync_from_store(&mut self) -> EditorResult<SessionTransition> {
        let state = self.store.snapshot().await;
        self.loading = state.config_file_loading;
        self.sync(state.mode, state.current_config).await
    }

    /// Drain surface events in emission order.
    ///
    /// Content changes of the live session go to the store; insertion
    /// requests go to the mediator. Events from disposed sessions are
    /// dropped. While the configuration file is loading editing is
    /// suppressed: both kinds of event are dropped and the store keeps the
    /// text it had. Returns the number of events handled.
    pub async fn pump(&mut self) -> EditorResult<usize> {
        let mut handled = 0;

        while let Ok(event) = self.events.try_recv() {
            let live_id = self.session.as_ref().map(EditorSession::id);
            if live_id != Some(event.session_id()) {
                tracing::debug!(
                    "Ignoring {} from stale session {}",
                    event.event_type(),
                    event.session_id()
                );
                continue;
            }

            if self.loading {
                tracing::debug!("Ignoring {} while loading", event.event_type());
                continue;
            }

            match event {
                SurfaceEvent::ContentChanged { content, .. } => {
                    self.store.dispatch(Action::SetCurrentContent(content)).await?;
                }
                SurfaceEvent::InsertResourceRequested {
                    session_id,
                    callback,
                } => {
                    self.mediator
                        .request(PendingInsertion {
                            session_id,
                            callback,
                        })
                        .await?;
                }
            }
            handled += 1;
        }

        Ok(handled)
    }

    /// The user confirmed a resource in the insertion dialog
    pub async fn confirm_insertion(
        &mut self,
        selection: ResourceSelection,
    ) -> EditorResult<Delivery> {
        let delivery = self.mediator.confirm(selection).await?;
        // The delivered content shows up as a change event
        self.pump().await?;
        Ok(delivery)
    }

    /// The user dismissed the insertion dialog
    pub async fn cancel_insertion(&mut self) -> EditorResult<()> {
        self.mediator.cancel().await
    }

    /// Dispose the live session and drop any pending insertion
    pub async fn shutdown(&mut self) -> EditorResult<()> {
        tracing::info!("Shutting down session host");
        self.dispose_session().await?;
        self.binding = SessionBinding::default();
        Ok(())
    }

    async fn recreate(&mut self, identity_changed: bool) -> EditorResult<()> {
        self.dispose_session().await?;

        let Some(configuration) = self.binding.configuration.clone() else {
            return Ok(());
        };

        // A newly bound document starts from its stored text; a mode switch
        // keeps whatever was typed so far.
        let seed = if identity_changed {
            configuration.content.clone()
        } else {
            let current = self.store.snapshot().await.current_content;
            if current.is_empty() {
                configuration.content.clone()
            } else {
                current
            }
        };

        let session = EditorSession::create(configuration.identity, &seed, &self.context)?;
        self.session = Some(session);

        // The store mirrors the live session from its first keystroke on
        if identity_changed {
            self.store.dispatch(Action::SetCurrentContent(seed)).await?;
        }
        Ok(())
    }

    async fn dispose_session(&mut self) -> EditorResult<()> {
        if let Some(mut session) = self.session.take() {
            session.dispose();
            self.mediator.invalidate_session(session.id()).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for SessionHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHost")
            .field("view", &self.view())
            .field("binding", &self.binding)
            .field("mediator", &self.mediator)
            .finish()
    }
}
