//! Spawn flow: listener ordering, optimistic insertion, error mapping and
//! diagnostics.

mod support;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use support::{engine_with, session_row, ScriptedTransport};
use tether_core::transport::{PushHandler, SessionTransport, Subscription};
use tether_types::{SpawnOutcome, SpawnRefreshStatus};
use uuid::Uuid;

fn spawning_transport() -> (Arc<ScriptedTransport>, String) {
    let session_id = Uuid::new_v4().to_string();
    let transport = ScriptedTransport::new({
        let session_id = session_id.clone();
        move |command, _| match command {
            "spawn_session" => Ok(json!(session_id)),
            "list_sessions" | "list_dashboard_sessions" => Ok(json!([])),
            _ => Ok(Value::Null),
        }
    });
    (transport, session_id)
}

#[tokio::test]
async fn listeners_are_registered_before_the_spawn_request() {
    let (transport, _) = spawning_transport();
    let engine = engine_with(transport.clone());

    engine
        .spawn_session("My run", "do the thing", "/work")
        .await
        .unwrap();

    let mut channels = transport.subscribed_channels();
    channels.sort();
    assert_eq!(
        channels,
        vec![
            "session-complete",
            "session-debug",
            "session-error",
            "session-event",
            "session-output",
            "session-started",
        ]
    );
    assert!(
        transport.op_index("subscribe:session-event") < transport.op_index("call:spawn_session")
    );
}

#[tokio::test]
async fn spawn_inserts_an_optimistic_record_and_selects_it() {
    let (transport, session_id) = spawning_transport();
    let engine = engine_with(transport);

    let returned = engine
        .spawn_session("My run", "do the thing", "/work")
        .await
        .unwrap();
    assert_eq!(returned, session_id);

    // The backend list is still empty, but the pending overlay keeps the
    // new session at the head.
    let sessions = engine.sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, session_id);
    assert_eq!(sessions[0].status, "starting");
    assert_eq!(sessions[0].name, "My run");
    assert_eq!(engine.active_session_id().as_deref(), Some(session_id.as_str()));
    assert_eq!(
        engine.dashboard_selected_session_id().as_deref(),
        Some(session_id.as_str())
    );

    let diagnostics = engine.spawn_diagnostics().unwrap();
    assert_eq!(diagnostics.outcome, SpawnOutcome::Success);
    assert_eq!(diagnostics.refresh_status, SpawnRefreshStatus::Succeeded);
    assert_eq!(diagnostics.session_id.as_deref(), Some(session_id.as_str()));
    assert!(diagnostics.has_session_in_store);
    assert_eq!(diagnostics.error_message, None);
}

#[tokio::test]
async fn pending_overlay_clears_once_the_backend_list_includes_the_id() {
    let confirmed = Arc::new(AtomicBool::new(false));
    let transport = ScriptedTransport::new({
        let confirmed = confirmed.clone();
        move |command, _| match command {
            "spawn_session" => Ok(json!("spawned-1")),
            "list_sessions" => {
                if confirmed.load(Ordering::SeqCst) {
                    Ok(json!([session_row("spawned-1", "running", "2026-01-01T00:00:00Z")]))
                } else {
                    Ok(json!([]))
                }
            }
            "list_dashboard_sessions" => Ok(json!([])),
            _ => Ok(Value::Null),
        }
    });
    let engine = engine_with(transport);

    engine.spawn_session("Run", "prompt", "/work").await.unwrap();
    assert_eq!(engine.sessions()[0].status, "starting");

    // The canonical list now carries the id: the optimistic copy is
    // replaced and the pending marker clears.
    confirmed.store(true, Ordering::SeqCst);
    engine.refresh_sessions().await.unwrap();
    assert_eq!(engine.sessions()[0].status, "running");

    // With the marker gone, a list that omits the id wins: the session
    // disappears instead of being resurrected from the overlay.
    confirmed.store(false, Ordering::SeqCst);
    engine.refresh_sessions().await.unwrap();
    assert!(engine.sessions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn spawn_timeout_maps_to_an_actionable_message() {
    struct HangingSpawnTransport;

    #[async_trait]
    impl SessionTransport for HangingSpawnTransport {
        async fn call(&self, command: &str, _args: Option<Value>) -> anyhow::Result<Value> {
            if command == "spawn_session" {
                std::future::pending::<()>().await;
            }
            Ok(json!([]))
        }

        async fn subscribe(
            &self,
            _channel: &str,
            _handler: PushHandler,
        ) -> anyhow::Result<Subscription> {
            Ok(Subscription::detached())
        }
    }

    let engine = tether_application::SessionUseCase::new(
        Arc::new(HangingSpawnTransport),
        Arc::new(support::MemoryPreferences::default()),
    );

    let err = engine
        .spawn_session("Run", "prompt", "/work")
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(
        message.starts_with("Session launch timed out after 15 seconds."),
        "unexpected message: {message}"
    );

    // Nothing was inserted optimistically.
    assert!(engine.sessions().is_empty());

    let diagnostics = engine.spawn_diagnostics().unwrap();
    assert_eq!(diagnostics.outcome, SpawnOutcome::SpawnFailed);
    assert_eq!(diagnostics.refresh_status, SpawnRefreshStatus::Skipped);
    assert_eq!(diagnostics.session_id, None);
    assert_eq!(diagnostics.error_message.as_deref(), Some(message.as_str()));
}

#[tokio::test]
async fn known_backend_spawn_errors_pass_through_verbatim() {
    let transport = ScriptedTransport::new(|command, _| match command {
        "spawn_session" => Err(anyhow::anyhow!("Working directory does not exist: /nope")),
        _ => Ok(json!([])),
    });
    let engine = engine_with(transport);

    let err = engine.spawn_session("Run", "prompt", "/nope").await.unwrap_err();
    assert_eq!(err.to_string(), "Working directory does not exist: /nope");
}

#[tokio::test]
async fn missing_cli_spawn_errors_get_an_install_hint() {
    let transport = ScriptedTransport::new(|command, _| match command {
        "spawn_session" => Err(anyhow::anyhow!("agent CLI not found in PATH")),
        _ => Ok(json!([])),
    });
    let engine = engine_with(transport);

    let err = engine.spawn_session("Run", "prompt", "/work").await.unwrap_err();
    assert!(err.to_string().contains("CLI path override"));
}

#[tokio::test]
async fn spawn_forwards_the_cli_path_override_preference() {
    let (transport, _) = spawning_transport();
    let engine = engine_with(transport.clone());
    engine.preferences().set_cli_path_override("/opt/agent/bin/agent");

    engine.spawn_session("Run", "prompt", "/work").await.unwrap();

    let args = transport.last_args("spawn_session").unwrap();
    assert_eq!(args["name"], "Run");
    assert_eq!(args["prompt"], "prompt");
    assert_eq!(args["workingDir"], "/work");
    assert_eq!(args["cliPathOverride"], "/opt/agent/bin/agent");
}

#[tokio::test]
async fn failed_refresh_after_spawn_does_not_fail_the_spawn() {
    let transport = ScriptedTransport::new(|command, _| match command {
        "spawn_session" => Ok(json!("spawned-1")),
        "list_sessions" | "list_dashboard_sessions" => Err(anyhow::anyhow!("list exploded")),
        _ => Ok(Value::Null),
    });
    let engine = engine_with(transport);

    let returned = engine.spawn_session("Run", "prompt", "/work").await.unwrap();
    assert_eq!(returned, "spawned-1");

    // The optimistic record survives the failed reconciliation.
    assert_eq!(engine.sessions()[0].id, "spawned-1");

    let diagnostics = engine.spawn_diagnostics().unwrap();
    assert_eq!(diagnostics.outcome, SpawnOutcome::Success);
    assert_eq!(diagnostics.refresh_status, SpawnRefreshStatus::Failed);
    assert_eq!(diagnostics.error_message.as_deref(), Some("list exploded"));
}
