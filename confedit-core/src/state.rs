//! Process-wide state for the configuration page

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::binding::{BoundConfiguration, EditorMode};
use crate::error::Result;

/// Capacity of the action broadcast channel
const ACTION_CHANNEL_CAPACITY: usize = 256;

/// Environment the page is scoped to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentEnv {
    pub aid: u64,
    pub env: String,
    pub app_name: String,
    pub zone_code: String,
}

/// Actions accepted by the state store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Mirror the latest editor text
    SetCurrentContent(String),
    /// Open or close the insert-resource dialog
    ShowInsertionDialog(bool),
    /// Show or hide the mask layer over the editor
    ShowEditorMask(bool),
    /// Select the left-side menu entry
    SetActiveMenu(String),
    /// Request the config-file list for an application
    LoadConfigInfo { app_name: String, env: String },
    SetZoneList(Vec<String>),
    ClearCurrentConfig,
    SetCurrentEnv(CurrentEnv),
    /// Bind a configuration; also seeds the current content
    SetCurrentConfig(BoundConfiguration),
    SetConfigFileLoading(bool),
    SetMode(EditorMode),
}

impl Action {
    /// Stable type name of the action
    pub fn action_type(&self) -> &'static str {
        match self {
            Action::SetCurrentContent(_) => "config/setCurrentContent",
            Action::ShowInsertionDialog(_) => "config/showModalInsertResource",
            Action::ShowEditorMask(_) => "config/showEditorMaskLayer",
            Action::SetActiveMenu(_) => "config/setLeftSideActiveMenu",
            Action::LoadConfigInfo { .. } => "config/loadConfigInfo",
            Action::SetZoneList(_) => "config/setZoneList",
            Action::ClearCurrentConfig => "config/clearCurrentConfig",
            Action::SetCurrentEnv(_) => "config/setCurrentEnv",
            Action::SetCurrentConfig(_) => "config/setCurrentConfig",
            Action::SetConfigFileLoading(_) => "config/setConfigFileLoading",
            Action::SetMode(_) => "config/setMode",
        }
    }
}

/// Snapshot of the configuration page state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigState {
    pub current_config: Option<BoundConfiguration>,
    pub config_file_loading: bool,
    pub current_content: String,
    pub mode: EditorMode,
    pub insertion_dialog_visible: bool,
    pub editor_mask_visible: bool,
    pub active_menu: Option<String>,
    pub zone_list: Vec<String>,
    pub current_env: CurrentEnv,
    /// Last `(app_name, env)` whose config-file list was requested
    pub config_info_request: Option<(String, String)>,
}

impl ConfigState {
    /// Apply a single action
    pub fn reduce(&mut self, action: &Action) {
        match action {
            Action::SetCurrentContent(text) => self.current_content = text.clone(),
            Action::ShowInsertionDialog(visible) => self.insertion_dialog_visible = *visible,
            Action::ShowEditorMask(visible) => self.editor_mask_visible = *visible,
            Action::SetActiveMenu(name) => self.active_menu = Some(name.clone()),
            Action::LoadConfigInfo { app_name, env } => {
                self.config_info_request = Some((app_name.clone(), env.clone()));
                self.config_file_loading = true;
            }
            Action::SetZoneList(list) => self.zone_list = list.clone(),
            Action::ClearCurrentConfig => {
                self.current_config = None;
                self.current_content.clear();
            }
            Action::SetCurrentEnv(env) => self.current_env = env.clone(),
            Action::SetCurrentConfig(config) => {
                self.current_content = config.content.clone();
                self.current_config = Some(config.clone());
                self.config_file_loading = false;
            }
            Action::SetConfigFileLoading(loading) => self.config_file_loading = *loading,
            Action::SetMode(mode) => self.mode = *mode,
        }
    }
}

/// The process-wide state store the editor talks to
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Apply an action
    async fn dispatch(&self, action: Action) -> Result<()>;

    /// Get a copy of the current state
    async fn snapshot(&self) -> ConfigState;
}

/// In-memory store that reduces actions and broadcasts them to subscribers
pub struct InMemoryStore {
    state: Arc<RwLock<ConfigState>>,
    actions: broadcast::Sender<Action>,
}

impl InMemoryStore {
    /// Create a new store with empty state
    pub fn new() -> Self {
        Self::with_state(ConfigState::default())
    }

    /// Create a store starting from the given state
    pub fn with_state(state: ConfigState) -> Self {
        let (actions, _) = broadcast::channel(ACTION_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(state)),
            actions,
        }
    }

    /// Subscribe to every action applied after this call
    pub fn subscribe(&self) -> broadcast::Receiver<Action> {
        self.actions.subscribe()
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.actions.receiver_count()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for InMemoryStore {
    async fn dispatch(&self, action: Action) -> Result<()> {
        tracing::trace!("Dispatching {}", action.action_type());
        {
            let mut state = self.state.write().await;
            state.reduce(&action);
        }

        // No subscribers is not an error
        let _ = self.actions.send(action);
        Ok(())
    }

    async fn snapshot(&self) -> ConfigState {
        self.state.read().await.clone()
    }
}
