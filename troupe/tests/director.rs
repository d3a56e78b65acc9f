//! Director orchestration: naming handshake, report dispatch defaults and
//! overrides, termination semantics, and error propagation.

use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use troupe::prelude::*;

async fn run_to_completion(director: &mut Director) -> Result<(), DirectorError> {
    tokio::time::timeout(Duration::from_secs(5), director.run())
        .await
        .expect("director.run() timed out")
}

#[tokio::test]
async fn test_unnamed_actor_asks_for_name_before_running() {
    let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let wants = events.clone();
    let running = events.clone();

    let mut director = Director::new();
    director
        .spawn(
            None,
            ActorDefinition::new(|_ctx| ()),
            ReportHandlers::new()
                .on_wants_name(move |_cast, _actor, _payload, _env| {
                    wants.lock().unwrap().push("wantsName".to_string());
                    Ok(())
                })
                .on_running(move |cast, actor, _payload, _env| {
                    let name = cast
                        .name_of(actor)
                        .map(|n| n.to_string())
                        .unwrap_or_default();
                    running.lock().unwrap().push(format!("running:{name}"));
                    cast.terminate(actor)
                }),
        )
        .unwrap();

    run_to_completion(&mut director).await.unwrap();

    let events = events.lock().unwrap();
    assert_eq!(*events, vec!["wantsName", "running:actor-1"]);
}

#[tokio::test]
async fn test_named_actor_reports_running_directly() {
    let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let wants = events.clone();
    let running = events.clone();

    let mut director = Director::new();
    director
        .spawn(
            Some("Named"),
            ActorDefinition::new(|_ctx| ()),
            ReportHandlers::new()
                .on_wants_name(move |_cast, _actor, _payload, _env| {
                    wants.lock().unwrap().push("wantsName".to_string());
                    Ok(())
                })
                .on_running(move |cast, actor, _payload, _env| {
                    running.lock().unwrap().push("running".to_string());
                    cast.terminate(actor)
                }),
        )
        .unwrap();

    run_to_completion(&mut director).await.unwrap();

    let events = events.lock().unwrap();
    assert_eq!(*events, vec!["running"]);
}

#[tokio::test]
async fn test_unknown_message_type_names_actor_and_type() {
    let mut director = Director::new();
    let actor = director
        .spawn(
            Some("Loner"),
            ActorDefinition::new(|_ctx| ()),
            ReportHandlers::new(),
        )
        .unwrap();
    director.post(actor, "mystery", json!(null)).unwrap();

    let err = run_to_completion(&mut director).await.unwrap_err();
    match err {
        DirectorError::ActorReported { actor, message } => {
            assert_eq!(actor, "Loner");
            assert!(message.contains("mystery"), "unexpected message: {message}");
        }
        other => panic!("expected ActorReported, got {other}"),
    }
}

#[tokio::test]
async fn test_unknown_report_type_is_fatal() {
    let definition = ActorDefinition::new(|_ctx| ()).on("go", |ctx, _state, _payload, _env| {
        ctx.post_to_director("mystery", json!(null))?;
        Ok(None)
    });

    let mut director = Director::new();
    let actor = director
        .spawn(Some("Chatty"), definition, ReportHandlers::new())
        .unwrap();
    director.post(actor, "go", json!(null)).unwrap();

    let err = run_to_completion(&mut director).await.unwrap_err();
    match err {
        DirectorError::UnknownReport { actor, report_type } => {
            assert_eq!(actor, "Chatty");
            assert_eq!(report_type, "mystery");
        }
        other => panic!("expected UnknownReport, got {other}"),
    }
}

#[tokio::test]
async fn test_termination_is_immediate_and_final() {
    let handled = Arc::new(AtomicU64::new(0));
    let counter = handled.clone();

    let definition =
        ActorDefinition::new(|_ctx| ()).on("work", move |_ctx, _state, _payload, _env| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        });

    let mut director = Director::new();
    let actor = director
        .spawn(Some("Worker"), definition, ReportHandlers::new())
        .unwrap();

    for _ in 0..3 {
        director.post(actor, "work", json!(null)).unwrap();
    }
    director.terminate(actor).unwrap();

    // The cast is already empty, so run() returns immediately.
    run_to_completion(&mut director).await.unwrap();

    // No guarantee the queued messages were processed, only that handler
    // invocations stop once termination has taken effect.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let settled = handled.load(Ordering::SeqCst);
    assert!(settled <= 3);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(handled.load(Ordering::SeqCst), settled);

    // The handle is gone; further traffic fails loudly.
    assert!(matches!(
        director.post(actor, "work", json!(null)),
        Err(DirectorError::UnknownActor { .. })
    ));
}

#[tokio::test]
async fn test_duplicate_names_are_rejected() {
    let mut director = Director::new();
    director
        .spawn(
            Some("Twin"),
            ActorDefinition::new(|_ctx| ()),
            ReportHandlers::new(),
        )
        .unwrap();

    let err = director
        .spawn(
            Some("Twin"),
            ActorDefinition::new(|_ctx| ()),
            ReportHandlers::new(),
        )
        .unwrap_err();
    assert!(matches!(err, DirectorError::DuplicateName { .. }));
}

#[tokio::test]
async fn test_done_override_replaces_default_termination() {
    let definition = ActorDefinition::new(|_ctx| ()).on("finish", |ctx, _state, _payload, _env| {
        ctx.done(json!("all wrapped up"))?;
        Ok(None)
    });

    let observed: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let sink = observed.clone();

    let mut director = Director::new();
    let actor = director
        .spawn(
            Some("Closer"),
            definition,
            ReportHandlers::new().on_done(move |cast, _actor, payload, _env| {
                *sink.lock().unwrap() = payload.as_str().map(str::to_string);
                for member in cast.members() {
                    cast.terminate(member)?;
                }
                Ok(())
            }),
        )
        .unwrap();

    director.post(actor, "finish", json!(null)).unwrap();
    run_to_completion(&mut director).await.unwrap();

    assert_eq!(observed.lock().unwrap().as_deref(), Some("all wrapped up"));
}

#[tokio::test]
async fn test_log_reports_can_be_intercepted() {
    let definition = ActorDefinition::new(|_ctx| ()).on("speak", |ctx, _state, _payload, _env| {
        ctx.log("three customers waiting");
        ctx.done(json!(null))?;
        Ok(None)
    });

    let lines: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = lines.clone();

    let mut director = Director::new();
    let actor = director
        .spawn(
            Some("Narrator"),
            definition,
            ReportHandlers::new().on_log(move |_cast, _actor, payload, _env| {
                sink.lock().unwrap().push((
                    payload["name"].as_str().unwrap_or_default().to_string(),
                    payload["msg"].as_str().unwrap_or_default().to_string(),
                ));
                Ok(())
            }),
        )
        .unwrap();

    director.post(actor, "speak", json!(null)).unwrap();
    run_to_completion(&mut director).await.unwrap();

    let lines = lines.lock().unwrap();
    assert_eq!(
        *lines,
        vec![(
            "Narrator".to_string(),
            "three customers waiting".to_string()
        )]
    );
}

#[tokio::test]
async fn test_error_report_override_can_recover() {
    let definition = ActorDefinition::new(|_ctx| ()).on("boom", |_ctx, _state, _payload, _env| {
        Err(ActorError::Handler("deliberate failure".to_string()))
    });

    let observed: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let sink = observed.clone();

    let mut director = Director::new();
    let actor = director
        .spawn(
            Some("Fragile"),
            definition,
            ReportHandlers::new().on_error(move |cast, actor, payload, _env| {
                *sink.lock().unwrap() = payload["message"].as_str().map(str::to_string);
                cast.terminate(actor)
            }),
        )
        .unwrap();

    director.post(actor, "boom", json!(null)).unwrap();
    run_to_completion(&mut director).await.unwrap();

    let message = observed.lock().unwrap().clone().unwrap_or_default();
    assert!(
        message.contains("deliberate failure"),
        "unexpected message: {message}"
    );
}
