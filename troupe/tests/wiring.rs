//! Peer-mesh wiring: channel establishment, sender identity, per-link
//! ordering, unknown-channel fatality, and deferred self-messages.

use serde_json::json;
use std::time::Duration;
use troupe::prelude::*;

async fn run_to_completion(director: &mut Director) -> Result<(), DirectorError> {
    tokio::time::timeout(Duration::from_secs(5), director.run())
        .await
        .expect("director.run() timed out")
}

/// The two-actor exchange: A posts `ping {n:1}` to "B", B replies
/// `pong {n:2}` to "A", and A observes `from == B`.
#[tokio::test]
async fn test_ping_pong_exchange() {
    let a_def = ActorDefinition::new(|_ctx| ())
        .on("start", |ctx, _state, _payload, _env| {
            ctx.post_to("B", "ping", json!({ "n": 1 }))?;
            Ok(None)
        })
        .on("pong", |ctx, _state, payload, env| {
            ctx.post_to_director(
                "observed",
                json!({
                    "n": payload["n"],
                    "from": env.from.as_ref().map(|name| name.as_str()),
                }),
            )?;
            Ok(None)
        });

    let b_def = ActorDefinition::new(|_ctx| ()).on("ping", |ctx, _state, payload, _env| {
        let n = payload["n"].as_i64().unwrap_or(0);
        ctx.post_to("A", "pong", json!({ "n": n + 1 }))?;
        Ok(None)
    });

    let mut director = Director::new();
    let a = director
        .spawn(
            Some("A"),
            a_def,
            ReportHandlers::new().on("observed", |cast, _actor, payload, _env| {
                assert_eq!(payload["n"], 2);
                assert_eq!(payload["from"], "B");
                for member in cast.members() {
                    cast.terminate(member)?;
                }
                Ok(())
            }),
        )
        .unwrap();
    let b = director
        .spawn(Some("B"), b_def, ReportHandlers::new())
        .unwrap();

    director.connect(a, b).await.unwrap();
    director.post(a, "start", json!(null)).unwrap();

    run_to_completion(&mut director).await.unwrap();
}

#[tokio::test]
async fn test_post_to_unregistered_channel_is_fatal() {
    let definition = ActorDefinition::new(|_ctx| ()).on("go", |ctx, _state, _payload, _env| {
        ctx.post_to("Nobody", "ping", json!(null))?;
        Ok(None)
    });

    let mut director = Director::new();
    let actor = director
        .spawn(Some("Lonely"), definition, ReportHandlers::new())
        .unwrap();
    director.post(actor, "go", json!(null)).unwrap();

    let err = run_to_completion(&mut director).await.unwrap_err();
    match err {
        DirectorError::ActorReported { actor, message } => {
            assert_eq!(actor, "Lonely");
            assert!(message.contains("Nobody"), "unexpected message: {message}");
        }
        other => panic!("expected ActorReported, got {other}"),
    }
}

#[tokio::test]
async fn test_messages_from_one_sender_arrive_in_order() {
    let definition = ActorDefinition::new(|_ctx| Vec::new())
        .on("item", |_ctx, state: &Vec<i64>, payload, _env| {
            let mut next = state.clone();
            next.push(payload["n"].as_i64().unwrap_or(-1));
            Ok(Some(next))
        })
        .on("flush", |ctx, state, _payload, _env| {
            ctx.post_to_director("sequence", json!({ "items": state }))?;
            Ok(None)
        });

    let mut director = Director::new();
    let actor = director
        .spawn(
            Some("Seq"),
            definition,
            ReportHandlers::new().on("sequence", |cast, actor, payload, _env| {
                let expected: Vec<i64> = (0..10).collect();
                assert_eq!(payload["items"], json!(expected));
                cast.terminate(actor)
            }),
        )
        .unwrap();

    for n in 0..10 {
        director.post(actor, "item", json!({ "n": n })).unwrap();
    }
    director.post(actor, "flush", json!(null)).unwrap();

    run_to_completion(&mut director).await.unwrap();
}

/// Deferred work re-enters the actor as a fresh message instead of
/// blocking the dispatch loop.
#[tokio::test]
async fn test_schedule_reenters_actor_as_new_message() {
    let definition = ActorDefinition::new(|_ctx| ())
        .on("start", |ctx, _state, _payload, _env| {
            ctx.schedule(Duration::from_millis(10), "tick", json!({ "fired": true }));
            Ok(None)
        })
        .on("tick", |ctx, _state, payload, env| {
            // Scheduled messages come from the actor itself.
            assert_eq!(env.from.as_ref().map(|n| n.as_str()), Some("Timer"));
            ctx.done(payload)?;
            Ok(None)
        });

    let mut director = Director::new();
    let actor = director
        .spawn(Some("Timer"), definition, ReportHandlers::new())
        .unwrap();
    director.post(actor, "start", json!(null)).unwrap();

    // Default `_done` handling terminates the actor, emptying the cast.
    run_to_completion(&mut director).await.unwrap();
    assert!(director.cast().is_empty());
}

#[tokio::test]
async fn test_connect_requires_running_actors() {
    let mut director = Director::new();
    let a = director
        .spawn(
            Some("A"),
            ActorDefinition::new(|_ctx| ()),
            ReportHandlers::new(),
        )
        .unwrap();
    let b = director
        .spawn(
            Some("B"),
            ActorDefinition::new(|_ctx| ()),
            ReportHandlers::new(),
        )
        .unwrap();

    // No reports have been dispatched yet, so neither actor is marked
    // running and the non-waiting connect must refuse to wire them.
    let err = director.cast().connect(a, b).unwrap_err();
    assert!(matches!(err, DirectorError::NotReady { .. }));
}

#[tokio::test]
async fn test_connect_named_uses_explicit_channel_name() {
    let caller = ActorDefinition::new(|_ctx| ())
        .on("start", |ctx, _state, _payload, _env| {
            ctx.post_to("backline", "ping", json!(null))?;
            Ok(None)
        })
        .on("reply", |ctx, _state, _payload, env| {
            ctx.post_to_director(
                "observed",
                json!({ "from": env.from.as_ref().map(|n| n.as_str()) }),
            )?;
            Ok(None)
        });

    // The callee replies over the channel registered under the caller's
    // actor name.
    let callee = ActorDefinition::new(|_ctx| ()).on("ping", |ctx, _state, _payload, _env| {
        ctx.post_to("Caller", "reply", json!(null))?;
        Ok(None)
    });

    let mut director = Director::new();
    let a = director
        .spawn(
            Some("Caller"),
            caller,
            ReportHandlers::new().on("observed", |cast, _actor, payload, _env| {
                assert_eq!(payload["from"], "Callee");
                for member in cast.members() {
                    cast.terminate(member)?;
                }
                Ok(())
            }),
        )
        .unwrap();
    let b = director
        .spawn(Some("Callee"), callee, ReportHandlers::new())
        .unwrap();

    director.connect_named(a, b, "backline").await.unwrap();
    director.post(a, "start", json!(null)).unwrap();

    run_to_completion(&mut director).await.unwrap();
}
