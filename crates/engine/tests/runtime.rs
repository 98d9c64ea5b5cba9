//! End-to-end runtime tests: config cache → registry → instrumented handler
//! → classified outcome, over in-memory infrastructure.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{Map, Value, json};

use junction_config::{ConfigCache, ControlPlane, ControlPlaneError};
use junction_core::{
    ActionConfiguration, ActionDefinition, ActionHandler, ActionId, HandlerError, Integration,
    IntegrationId, IntegrationType, SourceId, WebhookConfiguration,
};
use junction_engine::{
    ActionRunner, ConfigEventConsumer, ConfigPushEvent, ErrorKind, ExecuteError, register_startup,
};
use junction_events::{EventPublisher, InstrumentedAction, MemorySink};
use junction_registry::ActionRegistry;
use junction_resilience::RetryPolicy;
use junction_state::StateStore;
use junction_store::{KeyValueStore, MemoryStore, RetryingStore};

const TOPIC: &str = "integration-events";

fn integration_id() -> IntegrationId {
    IntegrationId::new("acme").unwrap()
}

fn action_id(id: &str) -> ActionId {
    ActionId::new(id).unwrap()
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
        backoff_multiplier: 2.0,
        max_backoff: Duration::from_millis(5),
    }
}

fn sample_integration() -> Integration {
    Integration {
        id: integration_id(),
        name: "Acme Devices".to_string(),
        enabled: true,
        integration_type: IntegrationType {
            name: "device-fleet".to_string(),
            actions: vec![ActionDefinition {
                action_id: action_id("pull_data"),
                config_schema: json!({"type": "object"}),
            }],
        },
        owner: None,
        base_url: Some("https://api.acme.example".to_string()),
        action_configurations: vec![ActionConfiguration {
            integration_id: integration_id(),
            action_id: action_id("pull_data"),
            data: json!({"interval_minutes": 15}),
        }],
        webhook_configuration: Some(WebhookConfiguration {
            integration_id: integration_id(),
            data: json!({"secret_name": "acme-webhook"}),
        }),
    }
}

struct StaticControlPlane {
    integration: Integration,
    fetches: AtomicU32,
}

#[async_trait]
impl ControlPlane for StaticControlPlane {
    async fn get_integration_details(
        &self,
        id: &IntegrationId,
    ) -> Result<Integration, ControlPlaneError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if id == &self.integration.id {
            Ok(self.integration.clone())
        } else {
            Err(ControlPlaneError::NotFound(id.clone()))
        }
    }

    async fn register_integration_type(
        &self,
        _definition: &IntegrationType,
    ) -> Result<(), ControlPlaneError> {
        Ok(())
    }
}

/// Handler recording how it was invoked, returning a fixed result.
struct RecordingHandler {
    calls: AtomicU32,
    result: Result<Value, HandlerError>,
}

impl RecordingHandler {
    fn ok(result: Value) -> Self {
        Self {
            calls: AtomicU32::new(0),
            result: Ok(result),
        }
    }

    fn failing(msg: &str) -> Self {
        Self {
            calls: AtomicU32::new(0),
            result: Err(HandlerError::failed(msg)),
        }
    }
}

#[async_trait]
impl ActionHandler for RecordingHandler {
    async fn execute(
        &self,
        _integration: &Integration,
        _config: &Value,
    ) -> Result<Value, HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

struct Runtime {
    runner: ActionRunner,
    cache: Arc<ConfigCache>,
    sink: Arc<MemorySink>,
    plane: Arc<StaticControlPlane>,
    handler: Arc<RecordingHandler>,
}

/// Wire the whole pipeline over in-memory infrastructure, the way the
/// process bootstrap does it: retrying store, cache, publisher, then the
/// instrumented handler registered under `pull_data`.
fn runtime_with(integration: Integration, handler: RecordingHandler) -> Runtime {
    let store = Arc::new(RetryingStore::with_policy(MemoryStore::new(), fast_policy()));
    let plane = Arc::new(StaticControlPlane {
        integration,
        fetches: AtomicU32::new(0),
    });
    let cache = Arc::new(ConfigCache::with_reload_policy(
        store,
        plane.clone(),
        fast_policy(),
    ));

    let sink = Arc::new(MemorySink::new());
    let publisher = EventPublisher::with_policy(sink.clone(), fast_policy());

    let handler = Arc::new(handler);
    let registry = Arc::new(
        ActionRegistry::builder()
            .action(
                action_id("pull_data"),
                InstrumentedAction::new(
                    handler.clone(),
                    publisher,
                    action_id("pull_data"),
                    TOPIC,
                ),
            )
            .build(),
    );

    Runtime {
        runner: ActionRunner::new(cache.clone(), registry),
        cache,
        sink,
        plane,
        handler,
    }
}

#[tokio::test]
async fn successful_execution_returns_result_and_emits_event_pair() {
    let rt = runtime_with(sample_integration(), RecordingHandler::ok(json!({"records": 12})));

    let result = rt
        .runner
        .execute(&integration_id(), &action_id("pull_data"), None)
        .await
        .unwrap();

    assert_eq!(result, json!({"records": 12}));
    assert_eq!(rt.handler.calls.load(Ordering::SeqCst), 1);
    assert_eq!(rt.sink.event_types(), vec!["action_started", "action_complete"]);

    // The Complete event snapshots the configuration in effect.
    let (topic, complete) = &rt.sink.published()[1];
    assert_eq!(topic, TOPIC);
    assert_eq!(
        complete["payload"]["config_data"],
        json!({"interval_minutes": 15})
    );
    assert_eq!(complete["payload"]["result"], json!({"records": 12}));
}

#[tokio::test]
async fn failing_handler_is_classified_and_emits_failed() {
    let rt = runtime_with(
        sample_integration(),
        RecordingHandler::failing("vendor API returned 500"),
    );

    let err = rt
        .runner
        .execute(&integration_id(), &action_id("pull_data"), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Execution);
    assert!(matches!(err, ExecuteError::Execution { .. }));
    assert_eq!(rt.sink.event_types(), vec!["action_started", "action_failed"]);
}

#[tokio::test]
async fn overrides_replace_top_level_keys() {
    let rt = runtime_with(sample_integration(), RecordingHandler::ok(json!({})));

    let mut overrides = Map::new();
    overrides.insert("interval_minutes".to_string(), json!(1));
    overrides.insert("dry_run".to_string(), json!(true));

    rt.runner
        .execute(&integration_id(), &action_id("pull_data"), Some(&overrides))
        .await
        .unwrap();

    let (_, started) = &rt.sink.published()[0];
    assert_eq!(
        started["payload"]["config_data"],
        json!({"interval_minutes": 1, "dry_run": true})
    );
}

#[tokio::test]
async fn unknown_action_is_classified_and_never_starts() {
    let rt = runtime_with(sample_integration(), RecordingHandler::ok(json!({})));

    // The graph declares it, but nothing is registered under this id.
    let mut integration = sample_integration();
    integration.integration_type.actions.push(ActionDefinition {
        action_id: action_id("not_a_real_action"),
        config_schema: json!({"type": "object"}),
    });
    integration.action_configurations.push(ActionConfiguration {
        integration_id: integration_id(),
        action_id: action_id("not_a_real_action"),
        data: json!({}),
    });
    rt.cache.set_integration(&integration, None).await.unwrap();

    let err = rt
        .runner
        .execute(&integration_id(), &action_id("not_a_real_action"), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(matches!(err, ExecuteError::ActionNotSupported { .. }));
    // No Started event was emitted, and no handler ran.
    assert!(rt.sink.is_empty());
    assert_eq!(rt.handler.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_configuration_is_classified() {
    let mut integration = sample_integration();
    integration.action_configurations.clear();
    let rt = runtime_with(integration, RecordingHandler::ok(json!({})));

    let err = rt
        .runner
        .execute(&integration_id(), &action_id("pull_data"), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(matches!(err, ExecuteError::ConfigurationNotFound { .. }));
    assert!(rt.sink.is_empty());
}

#[tokio::test]
async fn invalid_configuration_is_rejected_before_the_handler_runs() {
    /// Handler demanding a numeric `interval_minutes`, the way typed
    /// registrations do.
    struct StrictHandler {
        calls: AtomicU32,
    }

    #[async_trait]
    impl ActionHandler for StrictHandler {
        async fn execute(
            &self,
            _integration: &Integration,
            _config: &Value,
        ) -> Result<Value, HandlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({}))
        }

        fn validate_config(&self, config: &Value) -> Result<(), HandlerError> {
            if config["interval_minutes"].is_u64() {
                Ok(())
            } else {
                Err(HandlerError::validation("interval_minutes must be a number"))
            }
        }
    }

    let store = Arc::new(MemoryStore::new());
    let plane = Arc::new(StaticControlPlane {
        integration: sample_integration(),
        fetches: AtomicU32::new(0),
    });
    let cache = Arc::new(ConfigCache::with_reload_policy(store, plane, fast_policy()));
    let registry = Arc::new(
        ActionRegistry::builder()
            .action(
                action_id("pull_data"),
                StrictHandler {
                    calls: AtomicU32::new(0),
                },
            )
            .build(),
    );
    let runner = ActionRunner::new(cache, registry.clone());

    // The stored configuration is fine; the override breaks it.
    let mut overrides = Map::new();
    overrides.insert("interval_minutes".to_string(), json!("soon"));

    let err = runner
        .execute(&integration_id(), &action_id("pull_data"), Some(&overrides))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Invalid);
    assert!(matches!(err, ExecuteError::InvalidConfiguration { .. }));

    // The stored configuration alone still passes.
    runner
        .execute(&integration_id(), &action_id("pull_data"), None)
        .await
        .unwrap();
}

#[tokio::test]
async fn disabled_integration_refuses_execution() {
    let mut integration = sample_integration();
    integration.enabled = false;
    let rt = runtime_with(integration, RecordingHandler::ok(json!({})));

    let err = rt
        .runner
        .execute(&integration_id(), &action_id("pull_data"), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Invalid);
    assert!(matches!(err, ExecuteError::IntegrationDisabled(_)));
    assert_eq!(rt.handler.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_integration_is_classified_not_found() {
    let rt = runtime_with(sample_integration(), RecordingHandler::ok(json!({})));

    let err = rt
        .runner
        .execute(&IntegrationId::new("ghost").unwrap(), &action_id("pull_data"), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(matches!(err, ExecuteError::IntegrationNotFound(_)));
}

#[tokio::test]
async fn dead_control_plane_maps_to_config_unavailable() {
    struct DeadControlPlane;

    #[async_trait]
    impl ControlPlane for DeadControlPlane {
        async fn get_integration_details(
            &self,
            _id: &IntegrationId,
        ) -> Result<Integration, ControlPlaneError> {
            Err(ControlPlaneError::Transport("connection refused".into()))
        }

        async fn register_integration_type(
            &self,
            _definition: &IntegrationType,
        ) -> Result<(), ControlPlaneError> {
            Err(ControlPlaneError::Transport("connection refused".into()))
        }
    }

    let store = Arc::new(MemoryStore::new());
    let cache = Arc::new(ConfigCache::with_reload_policy(
        store,
        Arc::new(DeadControlPlane),
        fast_policy(),
    ));
    let registry = Arc::new(
        ActionRegistry::builder()
            .action(action_id("pull_data"), RecordingHandler::ok(json!({})))
            .build(),
    );
    let runner = ActionRunner::new(cache, registry);

    let err = runner
        .execute(&integration_id(), &action_id("pull_data"), None)
        .await
        .unwrap_err();

    // Classified, not the raw transport error.
    assert_eq!(err.kind(), ErrorKind::Unavailable);
    assert!(matches!(err, ExecuteError::ConfigUnavailable { .. }));
}

#[tokio::test]
async fn repeated_executions_hit_the_cache() {
    let rt = runtime_with(sample_integration(), RecordingHandler::ok(json!({})));

    for _ in 0..5 {
        rt.runner
            .execute(&integration_id(), &action_id("pull_data"), None)
            .await
            .unwrap();
    }

    assert_eq!(rt.plane.fetches.load(Ordering::SeqCst), 1);
    assert_eq!(rt.handler.calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn push_update_changes_the_next_execution() {
    let rt = runtime_with(sample_integration(), RecordingHandler::ok(json!({})));

    // Warm the cache.
    rt.runner
        .execute(&integration_id(), &action_id("pull_data"), None)
        .await
        .unwrap();

    // Control plane pushes a changed integration graph (new interval).
    let mut updated = sample_integration();
    updated.action_configurations[0].data = json!({"interval_minutes": 1});
    let consumer = ConfigEventConsumer::new(rt.cache.clone());
    consumer
        .apply(&ConfigPushEvent::IntegrationUpserted {
            integration: updated,
        })
        .await
        .unwrap();

    rt.runner
        .execute(&integration_id(), &action_id("pull_data"), None)
        .await
        .unwrap();

    // The second Started event carries the pushed configuration, without any
    // further control-plane fetch.
    let (_, started) = &rt.sink.published()[2];
    assert_eq!(
        started["payload"]["config_data"],
        json!({"interval_minutes": 1})
    );
    assert_eq!(rt.plane.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn push_delete_forces_a_fresh_fetch() {
    let rt = runtime_with(sample_integration(), RecordingHandler::ok(json!({})));

    rt.runner
        .execute(&integration_id(), &action_id("pull_data"), None)
        .await
        .unwrap();
    assert_eq!(rt.plane.fetches.load(Ordering::SeqCst), 1);

    let consumer = ConfigEventConsumer::new(rt.cache.clone());
    consumer
        .apply_json(
            serde_json::to_vec(&ConfigPushEvent::IntegrationDeleted {
                integration_id: integration_id(),
            })
            .unwrap()
            .as_slice(),
        )
        .await
        .unwrap();

    rt.runner
        .execute(&integration_id(), &action_id("pull_data"), None)
        .await
        .unwrap();
    assert_eq!(rt.plane.fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn handler_state_round_trips_through_the_same_store() {
    // Handler that advances a cursor in the state store on every run.
    struct CursorHandler {
        state: StateStore,
    }

    #[async_trait]
    impl ActionHandler for CursorHandler {
        async fn execute(
            &self,
            integration: &Integration,
            _config: &Value,
        ) -> Result<Value, HandlerError> {
            let action = ActionId::new("pull_data").expect("static id");
            let source = SourceId::default();
            let state = self
                .state
                .get_state(&integration.id, &action, &source)
                .await
                .map_err(|e| HandlerError::failed(e.to_string()))?;

            let cursor = state["cursor"].as_u64().unwrap_or(0) + 1;
            self.state
                .set_state(&integration.id, &action, &source, &json!({"cursor": cursor}))
                .await
                .map_err(|e| HandlerError::failed(e.to_string()))?;

            Ok(json!({"cursor": cursor}))
        }
    }

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let plane = Arc::new(StaticControlPlane {
        integration: sample_integration(),
        fetches: AtomicU32::new(0),
    });
    let cache = Arc::new(ConfigCache::with_reload_policy(
        store.clone(),
        plane,
        fast_policy(),
    ));
    let registry = Arc::new(
        ActionRegistry::builder()
            .action(
                action_id("pull_data"),
                CursorHandler {
                    state: StateStore::new(store.clone()),
                },
            )
            .build(),
    );
    let runner = ActionRunner::new(cache, registry);

    // First run starts from "never run" ({}), then the cursor advances.
    let first = runner
        .execute(&integration_id(), &action_id("pull_data"), None)
        .await
        .unwrap();
    assert_eq!(first, json!({"cursor": 1}));

    let second = runner
        .execute(&integration_id(), &action_id("pull_data"), None)
        .await
        .unwrap();
    assert_eq!(second, json!({"cursor": 2}));

    // The record lives under the documented key.
    let raw = store
        .get("integration_state.acme.pull_data.no-source")
        .await
        .unwrap()
        .expect("state record");
    assert_eq!(serde_json::from_str::<Value>(&raw).unwrap(), json!({"cursor": 2}));
}

#[tokio::test]
async fn startup_registration_exports_the_registry() {
    struct CapturingPlane {
        registered: parking_lot::Mutex<Option<IntegrationType>>,
    }

    #[async_trait]
    impl ControlPlane for CapturingPlane {
        async fn get_integration_details(
            &self,
            id: &IntegrationId,
        ) -> Result<Integration, ControlPlaneError> {
            Err(ControlPlaneError::NotFound(id.clone()))
        }

        async fn register_integration_type(
            &self,
            definition: &IntegrationType,
        ) -> Result<(), ControlPlaneError> {
            *self.registered.lock() = Some(definition.clone());
            Ok(())
        }
    }

    let registry = ActionRegistry::builder()
        .action(action_id("pull_data"), RecordingHandler::ok(json!({})))
        .action(action_id("push_data"), RecordingHandler::ok(json!({})))
        .build();
    let plane = CapturingPlane {
        registered: parking_lot::Mutex::new(None),
    };

    register_startup(&plane, &registry, "device-fleet").await.unwrap();

    let definition = plane.registered.lock().clone().expect("registered");
    assert_eq!(definition.name, "device-fleet");
    let ids: Vec<&str> = definition.actions.iter().map(|a| a.action_id.as_str()).collect();
    assert_eq!(ids, vec!["pull_data", "push_data"]);
}
