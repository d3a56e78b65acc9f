//! Helicopter-dispatch demo: guests stranded at various distances ask to
//! be picked up; the dispatcher pairs the farthest-out guest with the next
//! available helicopter and reports each dispatch to the director.
//!
//! ```bash
//! cargo run --example helicopter
//! ```

use serde_json::json;
use tracing_subscriber::EnvFilter;
use troupe::prelude::*;

#[derive(Default, Clone)]
struct DispatchState {
    /// Waiting guests as (name, distance) pairs.
    guests: Vec<(String, f64)>,
    /// Idle helicopters by tail number.
    choppers: Vec<String>,
}

fn dispatcher() -> ActorDefinition<DispatchState> {
    ActorDefinition::new(|_ctx| DispatchState::default())
        .on("pickMeUp", |_ctx, state, payload, _env| {
            let mut next = state.clone();
            next.guests.push((
                payload["name"].as_str().unwrap_or_default().to_string(),
                payload["distance"].as_f64().unwrap_or(0.0),
            ));
            Ok(Some(next))
        })
        .on("helicopterAvailable", |_ctx, state, payload, _env| {
            let mut next = state.clone();
            next.choppers.push(
                payload["tailNumber"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
            );
            Ok(Some(next))
        })
        .after_each(|ctx, state, _payload, _env| {
            if state.guests.is_empty() || state.choppers.is_empty() {
                return Ok(None);
            }
            let mut next = state.clone();
            // Farthest guest flies first.
            let farthest = next
                .guests
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.1.total_cmp(&b.1))
                .map(|(i, _)| i)
                .unwrap_or(0);
            let (guest, distance) = next.guests.remove(farthest);
            let chopper = next.choppers.remove(0);
            ctx.post_to_director(
                "dispatchHelicopter",
                json!({
                    "chopper": { "tailNumber": chopper },
                    "guest": { "name": guest, "distance": distance },
                }),
            )?;
            Ok(Some(next))
        })
}

#[tokio::main]
async fn main() -> Result<(), DirectorError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let guests = [
        ("number 3", 1.0),
        ("number 1", 50.0),
        ("number 2", 10.0),
    ];
    let mut dispatched = 0usize;
    let total = guests.len();

    let mut director = Director::new();
    let actor = director.spawn(
        Some("Dispatcher"),
        dispatcher(),
        ReportHandlers::new().on("dispatchHelicopter", move |cast, actor, payload, _env| {
            println!(
                "{} picks up {} ({} km out)",
                payload["chopper"]["tailNumber"],
                payload["guest"]["name"],
                payload["guest"]["distance"]
            );
            dispatched += 1;
            if dispatched == total {
                cast.terminate(actor)?;
            } else {
                // The chopper is free again once the run is done.
                cast.post(
                    actor,
                    "helicopterAvailable",
                    json!({ "tailNumber": payload["chopper"]["tailNumber"] }),
                )?;
            }
            Ok(())
        }),
    )?;

    for (name, distance) in guests {
        director.post(actor, "pickMeUp", json!({ "name": name, "distance": distance }))?;
    }
    director.post(actor, "helicopterAvailable", json!({ "tailNumber": "budgie" }))?;

    director.run().await
}
