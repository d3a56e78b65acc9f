//! Running-statistics demo: a single actor accumulates numbers and reports
//! count, sum, and average back to the director on request.
//!
//! ```bash
//! cargo run --example stats
//! ```

use serde_json::json;
use tracing_subscriber::EnvFilter;
use troupe::prelude::*;

struct Stats {
    count: u64,
    sum: i64,
}

fn statistician() -> ActorDefinition<Stats> {
    ActorDefinition::new(|_ctx| Stats { count: 0, sum: 0 })
        .on("number", |_ctx, state, payload, _env| {
            let n = payload["value"].as_i64().unwrap_or(0);
            Ok(Some(Stats {
                count: state.count + 1,
                sum: state.sum + n,
            }))
        })
        .on("report", |ctx, state, _payload, _env| {
            let average = if state.count > 0 {
                state.sum as f64 / state.count as f64
            } else {
                0.0
            };
            ctx.post_to_director(
                "stats",
                json!({ "count": state.count, "sum": state.sum, "average": average }),
            )?;
            Ok(None)
        })
}

#[tokio::main]
async fn main() -> Result<(), DirectorError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut director = Director::new();

    let mut reports_left = 6u32;
    let actor = director.spawn(
        None,
        statistician(),
        ReportHandlers::new().on("stats", move |cast, actor, payload, _env| {
            println!(
                "count={} sum={} average={}",
                payload["count"], payload["sum"], payload["average"]
            );
            reports_left -= 1;
            if reports_left == 0 {
                cast.terminate(actor)?;
            }
            Ok(())
        }),
    )?;

    for i in 1..20 {
        director.post(actor, "number", json!({ "value": i }))?;
        if i % 3 == 0 {
            director.post(actor, "report", json!(null))?;
        }
    }

    director.run().await
}
