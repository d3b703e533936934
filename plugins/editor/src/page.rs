//! Configuration page composition
//!
//! Resets the page when the application, environment or zone list changes and
//! publishes the current environment scope to the store.

use confedit_core::{Action, CurrentEnv, StateStore};
use std::sync::Arc;

use crate::EditorResult;

/// Menu entry selected while a configuration page is shown
pub const CONFIG_EDIT_MENU: &str = "config-edit";

#[derive(Debug, Clone, PartialEq, Eq)]
struct PageKey {
    app_name: String,
    env: String,
    zone_list: Vec<String>,
}

/// Drives page-level store actions on navigation
pub struct ConfigPage {
    store: Arc<dyn StateStore>,
    page: Option<PageKey>,
    env: Option<CurrentEnv>,
}

impl ConfigPage {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            page: None,
            env: None,
        }
    }

    /// Enter (or re-enter) the page for an application and environment.
    ///
    /// Returns true when the page was reset. Nothing happens until both the
    /// application and the environment are known, or when the triple is the
    /// one already shown.
    pub async fn enter(
        &mut self,
        app_name: Option<&str>,
        env: Option<&str>,
        zone_list: &[String],
    ) -> EditorResult<bool> {
        let (Some(app_name), Some(env)) = (app_name, env) else {
            return Ok(false);
        };
        if app_name.is_empty() || env.is_empty() {
            return Ok(false);
        }

        let key = PageKey {
            app_name: app_name.to_string(),
            env: env.to_string(),
            zone_list: zone_list.to_vec(),
        };
        if self.page.as_ref() == Some(&key) {
            return Ok(false);
        }

        tracing::info!("Entering config page for {} in {}", app_name, env);

        let actions = [
            Action::ShowEditorMask(false),
            Action::SetActiveMenu(CONFIG_EDIT_MENU.to_string()),
            Action::LoadConfigInfo {
                app_name: key.app_name.clone(),
                env: key.env.clone(),
            },
            Action::SetZoneList(key.zone_list.clone()),
            Action::ClearCurrentConfig,
        ];
        for action in actions {
            self.store.dispatch(action).await?;
        }

        self.page = Some(key);
        Ok(true)
    }

    /// Publish the environment scope if it changed
    pub async fn publish_env(&mut self, current: CurrentEnv) -> EditorResult<bool> {
        if self.env.as_ref() == Some(&current) {
            return Ok(false);
        }

        tracing::debug!(
            "Publishing env {} / {} (aid {})",
            current.env,
            current.zone_code,
            current.aid
        );
        self.store
            .dispatch(Action::SetCurrentEnv(current.clone()))
            .await?;
        self.env = Some(current);
        Ok(true)
    }
}

impl std::fmt::Debug for ConfigPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigPage")
            .field("page", &self.page)
            .field("env", &self.env)
            .finish()
    }
}
