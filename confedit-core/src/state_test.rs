#[cfg(test)]
mod tests {
    use crate::binding::{BoundConfiguration, ConfigurationIdentity, EditorMode};
    use crate::state::{Action, CurrentEnv, InMemoryStore, StateStore};
    use tokio_test::assert_ok;

    fn bound(content: &str) -> BoundConfiguration {
        BoundConfiguration::new(
            ConfigurationIdentity::new("prod", "z1", "svc", "config.toml").with_format("toml"),
            content,
        )
    }

    #[tokio::test]
    async fn test_set_current_config_seeds_content() {
        let store = InMemoryStore::new();
        assert_ok!(store.dispatch(Action::SetConfigFileLoading(true)).await);
        assert_ok!(store.dispatch(Action::SetCurrentConfig(bound("a=1"))).await);

        let state = store.snapshot().await;
        assert_eq!(state.current_content, "a=1");
        assert!(!state.config_file_loading);
        assert_eq!(state.current_config, Some(bound("a=1")));
    }

    #[tokio::test]
    async fn test_clear_current_config() {
        let store = InMemoryStore::new();
        store
            .dispatch(Action::SetCurrentConfig(bound("a=1")))
            .await
            .unwrap();
        store.dispatch(Action::ClearCurrentConfig).await.unwrap();

        let state = store.snapshot().await;
        assert!(state.current_config.is_none());
        assert!(state.current_content.is_empty());
    }

    #[tokio::test]
    async fn test_page_actions() {
        let store = InMemoryStore::new();
        store
            .dispatch(Action::LoadConfigInfo {
                app_name: "svc".to_string(),
                env: "prod".to_string(),
            })
            .await
            .unwrap();
        store
            .dispatch(Action::SetZoneList(vec!["z1".to_string(), "z2".to_string()]))
            .await
            .unwrap();
        store
            .dispatch(Action::SetActiveMenu("config-edit".to_string()))
            .await
            .unwrap();
        store
            .dispatch(Action::SetCurrentEnv(CurrentEnv {
                aid: 7,
                env: "prod".to_string(),
                app_name: "svc".to_string(),
                zone_code: "z1".to_string(),
            }))
            .await
            .unwrap();
        store.dispatch(Action::SetMode(EditorMode::Diff)).await.unwrap();

        let state = store.snapshot().await;
        assert!(state.config_file_loading);
        assert_eq!(
            state.config_info_request,
            Some(("svc".to_string(), "prod".to_string()))
        );
        assert_eq!(state.zone_list.len(), 2);
        assert_eq!(state.active_menu.as_deref(), Some("config-edit"));
        assert_eq!(state.current_env.aid, 7);
        assert_eq!(state.mode, EditorMode::Diff);
    }

    #[tokio::test]
    async fn test_subscribers_see_actions_in_order() {
        let store = InMemoryStore::new();
        let mut rx = store.subscribe();
        assert_eq!(store.subscriber_count(), 1);

        store
            .dispatch(Action::SetCurrentContent("a=1".to_string()))
            .await
            .unwrap();
        store
            .dispatch(Action::ShowInsertionDialog(true))
            .await
            .unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            Action::SetCurrentContent("a=1".to_string())
        );
        assert_eq!(rx.recv().await.unwrap(), Action::ShowInsertionDialog(true));
    }

    #[test]
    fn test_action_type_names() {
        assert_eq!(
            Action::SetCurrentContent(String::new()).action_type(),
            "config/setCurrentContent"
        );
        assert_eq!(
            Action::ShowInsertionDialog(true).action_type(),
            "config/showModalInsertResource"
        );
        assert_eq!(
            Action::ClearCurrentConfig.action_type(),
            "config/clearCurrentConfig"
        );
    }
}
