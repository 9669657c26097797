//! Tests for the managed container components
//!
//! These use an in-memory runtime so catalog, lifecycle and log behavior
//! can be checked without a Docker daemon.

#[cfg(test)]
mod mock_runtime_tests {
    use crate::containers::{ContainerCatalog, LifecycleGuard, LogWindow, OwnershipMarker};
    use crate::error::ManagerError;
    use crate::models::{LifecycleCommand, LogicalStatus};
    use crate::observability::StructuredLogger;
    use crate::runtime::{ContainerRuntime, HostBinding, RuntimeContainer, RuntimeError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// In-memory runtime recording every mutating call
    #[derive(Default)]
    struct MockRuntime {
        containers: Mutex<HashMap<String, RuntimeContainer>>,
        calls: Mutex<Vec<String>>,
        fail_with: Mutex<Option<RuntimeError>>,
        log_output: Mutex<String>,
        log_window: Mutex<Option<(Option<i64>, Option<i64>)>>,
    }

    impl MockRuntime {
        fn with(containers: Vec<RuntimeContainer>) -> Arc<Self> {
            let runtime = Self::default();
            {
                let mut map = runtime.containers.lock().unwrap();
                for c in containers {
                    map.insert(c.id.clone(), c);
                }
            }
            Arc::new(runtime)
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn fail_next(&self, err: RuntimeError) {
            *self.fail_with.lock().unwrap() = Some(err);
        }

        fn record(&self, call: &str, id: &str) -> Result<(), RuntimeError> {
            self.calls.lock().unwrap().push(format!("{call}:{id}"));
            match self.fail_with.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl ContainerRuntime for MockRuntime {
        async fn ping(&self) -> Result<(), RuntimeError> {
            Ok(())
        }

        async fn list(&self, label_filter: &str) -> Result<Vec<RuntimeContainer>, RuntimeError> {
            let (key, value) = label_filter.split_once('=').unwrap();
            let mut list: Vec<_> = self
                .containers
                .lock()
                .unwrap()
                .values()
                .filter(|c| c.labels.get(key).map(|v| v == value).unwrap_or(false))
                .cloned()
                .collect();
            list.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(list)
        }

        async fn inspect(&self, id: &str) -> Result<Option<RuntimeContainer>, RuntimeError> {
            let map = self.containers.lock().unwrap();
            Ok(map
                .get(id)
                .or_else(|| map.values().find(|c| c.name == id))
                .cloned())
        }

        async fn start(&self, id: &str) -> Result<(), RuntimeError> {
            self.record("start", id)
        }

        async fn stop(&self, id: &str) -> Result<(), RuntimeError> {
            self.record("stop", id)
        }

        async fn pause(&self, id: &str) -> Result<(), RuntimeError> {
            self.record("pause", id)
        }

        async fn unpause(&self, id: &str) -> Result<(), RuntimeError> {
            self.record("unpause", id)
        }

        async fn remove(&self, id: &str) -> Result<(), RuntimeError> {
            self.record("remove", id)?;
            self.containers.lock().unwrap().remove(id);
            Ok(())
        }

        async fn logs(
            &self,
            id: &str,
            since: Option<i64>,
            until: Option<i64>,
        ) -> Result<String, RuntimeError> {
            self.record("logs", id)?;
            *self.log_window.lock().unwrap() = Some((since, until));
            Ok(self.log_output.lock().unwrap().clone())
        }
    }

    fn container(id: &str, status: &str, exit_code: i64, managed: bool) -> RuntimeContainer {
        let mut labels = HashMap::new();
        if managed {
            labels.insert("managed".to_string(), "true".to_string());
        }

        let mut ports = HashMap::new();
        ports.insert(
            "80/tcp".to_string(),
            Some(vec![HostBinding {
                host_ip: Some("0.0.0.0".to_string()),
                host_port: Some("8080".to_string()),
            }]),
        );
        ports.insert("9000/tcp".to_string(), None);

        RuntimeContainer {
            id: format!("{id}0123456789abcdef"),
            name: format!("{id}-name"),
            status: status.to_string(),
            exit_code,
            labels,
            ports,
            created: "2021-05-29T16:06:59.500000000Z".to_string(),
        }
    }

    fn full_id(id: &str) -> String {
        format!("{id}0123456789abcdef")
    }

    fn components(runtime: Arc<MockRuntime>) -> (ContainerCatalog, LifecycleGuard, LogWindow) {
        let catalog = ContainerCatalog::new(runtime, OwnershipMarker::default());
        let guard = LifecycleGuard::new(catalog.clone(), StructuredLogger::new("test-node"));
        let logs = LogWindow::new(catalog.clone());
        (catalog, guard, logs)
    }

    #[tokio::test]
    async fn test_list_only_returns_managed_containers() {
        let runtime = MockRuntime::with(vec![
            container("aaa", "running", 0, true),
            container("bbb", "exited", 1, true),
            container("ccc", "running", 0, false),
        ]);
        let (catalog, _, _) = components(runtime);

        let list = catalog.list().await.unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list[0].status(), LogicalStatus::Running);
        assert_eq!(list[1].status(), LogicalStatus::Error);
        assert_eq!(list[0].short_id, "aaa012345678");
        assert_eq!(list[0].created_at, 1_622_304_419);
        assert_eq!(list[0].ports.len(), 1);
        assert_eq!(list[0].ports["80/tcp"], vec!["8080".to_string()]);
    }

    #[tokio::test]
    async fn test_get_owned_hides_unmanaged_and_missing_alike() {
        let runtime = MockRuntime::with(vec![container("ccc", "running", 0, false)]);
        let (catalog, _, _) = components(runtime);

        let missing = catalog.get_owned("does-not-exist").await.unwrap_err();
        let unmanaged = catalog.get_owned(&full_id("ccc")).await.unwrap_err();

        assert_eq!(missing, ManagerError::NotFound);
        assert_eq!(unmanaged, missing);
    }

    #[tokio::test]
    async fn test_get_owned_resolves_by_name() {
        let runtime = MockRuntime::with(vec![container("aaa", "paused", 0, true)]);
        let (catalog, _, _) = components(runtime);

        let found = catalog.get_owned("aaa-name").await.unwrap();
        assert_eq!(found.id, full_id("aaa"));
        assert_eq!(found.status(), LogicalStatus::Paused);
    }

    #[tokio::test]
    async fn test_execute_dispatches_each_command() {
        let runtime = MockRuntime::with(vec![container("aaa", "running", 0, true)]);
        let (_, guard, _) = components(runtime.clone());
        let id = full_id("aaa");

        for command in [
            LifecycleCommand::Start,
            LifecycleCommand::Stop,
            LifecycleCommand::Pause,
            LifecycleCommand::Resume,
        ] {
            tokio_test::assert_ok!(guard.execute(&id, command).await);
        }

        assert_eq!(
            runtime.calls(),
            vec![
                format!("start:{id}"),
                format!("stop:{id}"),
                format!("pause:{id}"),
                format!("unpause:{id}"),
            ]
        );
    }

    #[tokio::test]
    async fn test_execute_surfaces_runtime_failure_as_internal() {
        let runtime = MockRuntime::with(vec![container("aaa", "running", 0, true)]);
        let (_, guard, _) = components(runtime.clone());
        runtime.fail_next(RuntimeError::Api("container already started".to_string()));

        let err = guard
            .execute(&full_id("aaa"), LifecycleCommand::Start)
            .await
            .unwrap_err();

        match err {
            ManagerError::Internal(msg) => assert!(msg.contains("already started")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_execute_on_unmanaged_container_never_reaches_runtime() {
        let runtime = MockRuntime::with(vec![container("ccc", "running", 0, false)]);
        let (_, guard, _) = components(runtime.clone());

        let err = guard
            .execute(&full_id("ccc"), LifecycleCommand::Stop)
            .await
            .unwrap_err();

        assert_eq!(err, ManagerError::NotFound);
        assert!(runtime.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_refuses_non_terminal_states() {
        let cases = [
            ("running", 0),
            ("paused", 0),
            ("restarting", 0),
            ("removing", 0),
            ("configured", 0),
        ];

        for (status, exit_code) in cases {
            let runtime = MockRuntime::with(vec![container("aaa", status, exit_code, true)]);
            let (_, guard, _) = components(runtime.clone());

            let err = guard.delete(&full_id("aaa")).await.unwrap_err();

            assert!(
                matches!(err, ManagerError::PreconditionFailed(_)),
                "status {status} should not be deletable"
            );
            assert!(runtime.calls().is_empty(), "status {status} touched runtime");
        }
    }

    #[tokio::test]
    async fn test_delete_removes_stopped_and_errored_containers() {
        let cases = [("created", 0), ("exited", 0), ("exited", 137), ("dead", 0)];

        for (status, exit_code) in cases {
            let runtime = MockRuntime::with(vec![container("aaa", status, exit_code, true)]);
            let (catalog, guard, _) = components(runtime.clone());

            tokio_test::assert_ok!(guard.delete(&full_id("aaa")).await);

            assert_eq!(runtime.calls(), vec![format!("remove:{}", full_id("aaa"))]);
            assert_eq!(
                catalog.get_owned(&full_id("aaa")).await.unwrap_err(),
                ManagerError::NotFound
            );
        }
    }

    #[tokio::test]
    async fn test_delete_surfaces_runtime_failure() {
        let runtime = MockRuntime::with(vec![container("aaa", "exited", 0, true)]);
        let (_, guard, _) = components(runtime.clone());
        runtime.fail_next(RuntimeError::Api("removal of container in progress".to_string()));

        let err = guard.delete(&full_id("aaa")).await.unwrap_err();
        assert!(matches!(err, ManagerError::Internal(_)));
    }

    #[tokio::test]
    async fn test_logs_split_and_windowed() {
        let runtime = MockRuntime::with(vec![container("aaa", "running", 0, true)]);
        *runtime.log_output.lock().unwrap() =
            "2021-01-01T00:00:00Z first\n2021-01-01T00:00:01Z second\n".to_string();
        let (_, _, logs) = components(runtime.clone());

        let before = chrono::Utc::now().timestamp();
        let lines = logs.get_logs(&full_id("aaa"), Some(60), None).await.unwrap();
        let after = chrono::Utc::now().timestamp();

        assert_eq!(
            lines,
            vec!["2021-01-01T00:00:00Z first", "2021-01-01T00:00:01Z second"]
        );

        let window = *runtime.log_window.lock().unwrap();
        let (since, until) = window.unwrap();
        let since = since.unwrap();
        assert!(since >= before - 60 && since <= after - 60);
        assert_eq!(until, None);
    }

    #[tokio::test]
    async fn test_logs_of_unmanaged_container_not_found() {
        let runtime = MockRuntime::with(vec![container("ccc", "running", 0, false)]);
        let (_, _, logs) = components(runtime.clone());

        let err = logs.get_logs(&full_id("ccc"), None, None).await.unwrap_err();
        assert_eq!(err, ManagerError::NotFound);
        assert!(runtime.calls().is_empty());
    }

    #[tokio::test]
    async fn test_logs_window_ending_before_epoch_skips_runtime() {
        let runtime = MockRuntime::with(vec![container("aaa", "running", 0, true)]);
        *runtime.log_output.lock().unwrap() = "2021-01-01T00:00:00Z everything\n".to_string();
        let (_, _, logs) = components(runtime.clone());

        let lines = logs
            .get_logs(&full_id("aaa"), None, Some(u64::MAX))
            .await
            .unwrap();

        assert!(lines.is_empty());
        assert!(runtime.calls().is_empty());
        assert!(runtime.log_window.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logs_huge_since_never_sends_negative_bound() {
        let runtime = MockRuntime::with(vec![container("aaa", "running", 0, true)]);
        let (_, _, logs) = components(runtime.clone());

        tokio_test::assert_ok!(logs.get_logs(&full_id("aaa"), Some(u64::MAX), None).await);

        let window = *runtime.log_window.lock().unwrap();
        assert_eq!(window, Some((Some(0), None)));
    }

    #[tokio::test]
    async fn test_invalid_creation_time_does_not_fail_listing() {
        let mut broken = container("bbb", "exited", 0, true);
        broken.created = "not a timestamp".to_string();
        let runtime = MockRuntime::with(vec![container("aaa", "running", 0, true), broken]);
        let (catalog, guard, _) = components(runtime.clone());

        let list = catalog.list().await.unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list[0].created_at, 1_622_304_419);
        assert_eq!(list[1].created_at, 0);
        tokio_test::assert_ok!(guard.delete(&full_id("bbb")).await);
    }
}
