//! Bank-lobby queueing simulation: a front door generates customers, a
//! waiting line matches them with tellers, and tellers serve them with a
//! fixed service time before sending them back out the door.
//!
//! Topology: the front door and every teller are connected to the line;
//! every teller is also connected to the front door. The line matches
//! customers to tellers in its post-handler hook, which runs after every
//! message once state has settled.
//!
//! ```bash
//! RUST_LOG=troupe=debug cargo run --example lobby
//! ```

use serde_json::json;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use troupe::prelude::*;

#[derive(Clone, Copy)]
struct FrontDoorState {
    expected: u64,
    processed: u64,
    interval: Duration,
    next_customer: u64,
}

fn front_door() -> ActorDefinition<FrontDoorState> {
    ActorDefinition::new(|_ctx| FrontDoorState {
        expected: 0,
        processed: 0,
        interval: Duration::ZERO,
        next_customer: 1,
    })
    .on("start", |ctx, state, payload, _env| {
        let expected = payload["count"].as_u64().unwrap_or(0);
        let interval = Duration::from_millis(payload["intervalMs"].as_u64().unwrap_or(1000));
        ctx.schedule(Duration::ZERO, "arrive", json!(null));
        Ok(Some(FrontDoorState {
            expected,
            interval,
            ..*state
        }))
    })
    .on("arrive", |ctx, state, _payload, _env| {
        let n = state.next_customer;
        ctx.log(format!("customer {n} enters"));
        ctx.post_to("Line", "customerEnters", json!({ "id": n }))?;
        if n < state.expected {
            ctx.schedule(state.interval, "arrive", json!(null));
        }
        Ok(Some(FrontDoorState {
            next_customer: n + 1,
            ..*state
        }))
    })
    .on("customerLeaving", |ctx, state, payload, _env| {
        ctx.log(format!("customer {} leaves the building", payload["id"]));
        let processed = state.processed + 1;
        if processed == state.expected {
            ctx.done(json!("all customers have left the building"))?;
        }
        Ok(Some(FrontDoorState {
            processed,
            ..*state
        }))
    })
}

#[derive(Default, Clone)]
struct LineState {
    customers: Vec<u64>,
    tellers: Vec<String>,
}

fn waiting_line() -> ActorDefinition<LineState> {
    ActorDefinition::new(|_ctx| LineState::default())
        .on("customerEnters", |ctx, state, payload, _env| {
            let id = payload["id"].as_u64().unwrap_or(0);
            ctx.log(format!("customer {id} enters line"));
            let mut next = state.clone();
            next.customers.push(id);
            Ok(Some(next))
        })
        .on("tellerAvailable", |_ctx, state, _payload, env| {
            let mut next = state.clone();
            if let Some(teller) = &env.from {
                next.tellers.push(teller.as_str().to_string());
            }
            Ok(Some(next))
        })
        .after_each(|ctx, state, _payload, _env| {
            if state.customers.is_empty() || state.tellers.is_empty() {
                return Ok(None);
            }
            let mut next = state.clone();
            let customer = next.customers.remove(0);
            let teller = next.tellers.remove(0);
            ctx.log(format!("sending customer {customer} to {teller}"));
            ctx.post_to(&teller, "serveCustomer", json!({ "id": customer }))?;
            Ok(Some(next))
        })
}

struct TellerState {
    service_time: Duration,
}

fn teller() -> ActorDefinition<TellerState> {
    ActorDefinition::new(|_ctx| TellerState {
        service_time: Duration::ZERO,
    })
    .on("start", |ctx, _state, payload, _env| {
        ctx.log("available");
        ctx.post_to("Line", "tellerAvailable", json!(null))?;
        Ok(Some(TellerState {
            service_time: Duration::from_millis(payload["serviceMs"].as_u64().unwrap_or(1000)),
        }))
    })
    .on("serveCustomer", |ctx, state, payload, _env| {
        ctx.log(format!("start serving customer {}", payload["id"]));
        ctx.schedule(state.service_time, "finished", payload);
        Ok(None)
    })
    .on("finished", |ctx, _state, payload, _env| {
        ctx.log(format!("finished with customer {}", payload["id"]));
        ctx.post_to("Front door", "customerLeaving", payload.clone())?;
        ctx.post_to("Line", "tellerAvailable", json!(null))?;
        Ok(None)
    })
}

#[tokio::main]
async fn main() -> Result<(), DirectorError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut director = Director::new();

    let line = director.spawn(Some("Line"), waiting_line(), ReportHandlers::new())?;

    let door = director.spawn(
        Some("Front door"),
        front_door(),
        ReportHandlers::new().on_done(|cast, _actor, payload, _env| {
            println!("done: {payload}");
            for member in cast.members() {
                cast.terminate(member)?;
            }
            Ok(())
        }),
    )?;

    let tellers: Vec<ActorRef> = (1..=3)
        .map(|n| {
            let name = format!("Teller {n}");
            director.spawn(Some(name.as_str()), teller(), ReportHandlers::new())
        })
        .collect::<Result<_, _>>()?;

    director.connect(door, line).await?;
    for &t in &tellers {
        director.connect(t, line).await?;
        director.connect(t, door).await?;
    }

    for (n, &t) in tellers.iter().enumerate() {
        director.post(t, "start", json!({ "id": n + 1, "serviceMs": 600 }))?;
    }
    director.post(door, "start", json!({ "count": 5, "intervalMs": 200 }))?;

    director.run().await
}
