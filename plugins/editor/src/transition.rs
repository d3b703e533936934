//! Deciding what a change of bound configuration or mode does to the session

use confedit_core::{BoundConfiguration, ConfigurationIdentity, EditorMode};

/// What the host observes: the editing mode and the bound configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionBinding {
    pub mode: EditorMode,
    pub configuration: Option<BoundConfiguration>,
}

impl SessionBinding {
    pub fn new(mode: EditorMode, configuration: Option<BoundConfiguration>) -> Self {
        Self {
            mode,
            configuration,
        }
    }

    pub fn identity(&self) -> Option<&ConfigurationIdentity> {
        self.configuration.as_ref().map(|c| &c.identity)
    }

    fn key(&self) -> (EditorMode, Option<&ConfigurationIdentity>) {
        (self.mode, self.identity())
    }
}

/// Action the host takes to move from one binding to the next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTransition {
    /// Nothing to do
    NoOp,
    /// Same document and mode, new stored content: replace the text in place
    Reseed(String),
    /// Dispose the live session, then create a new one
    Recreate,
    /// Dispose the live session; no configuration is bound any more
    Teardown,
}

impl SessionTransition {
    /// Compute the transition between two bindings.
    ///
    /// A change to the `(mode, identity)` pair rebuilds the session. A change
    /// to the stored content alone only reseeds it, and only in code mode.
    pub fn between(previous: &SessionBinding, next: &SessionBinding) -> Self {
        if previous.key() != next.key() {
            return match next.configuration {
                Some(_) => SessionTransition::Recreate,
                None => SessionTransition::Teardown,
            };
        }

        match (&previous.configuration, &next.configuration) {
            (Some(prev), Some(next_config))
                if next.mode == EditorMode::Code && prev.content != next_config.content =>
            {
                SessionTransition::Reseed(next_config.content.clone())
            }
            _ => SessionTransition::NoOp,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, SessionTransition::NoOp)
    }
}
