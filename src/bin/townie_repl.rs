//! Interactive loop for driving the assistant engine from a terminal.
//!
//! Wires the sample catalog, an in-memory store, and the scripted
//! reservation service, so the whole conversation (clarification,
//! follow-ups, reservation confirm/poll) can be smoke-tested by hand.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Timelike;
use tracing_subscriber::EnvFilter;

use townie_engine::store::{MemoryStore, PREFS_LIKED_KEY};
use townie_engine::{Catalog, Engine, KeyValueStore, StaticReservationService, TurnInput};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let catalog = Catalog::from_json_str(include_str!("../../config/catalog.sample.json"))?;

    let mut store = MemoryStore::new();
    // A lightly trained profile so ranking shows preference effects.
    store.put(PREFS_LIKED_KEY, r#"["coffee_shop_study","cheap_eats"]"#.to_string());

    let service = Arc::new(StaticReservationService::confirming("demo-job"));
    let mut engine = Engine::new(catalog, Box::new(store), service)?
        .with_poll_interval(Duration::from_secs(2));
    let mut session = engine.start_session()?;

    println!("townie> Hey! Ask me for a spot to eat, something to do, or a table booked. (ctrl-d to quit)");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("you> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if matches!(line.trim(), "quit" | "exit") {
            break;
        }

        let hour = chrono::Local::now().hour();
        let input = TurnInput::new(&line).at_hour(hour);
        let response = engine.handle_turn(&mut session, input).await;

        println!("townie> {}", response.text);
        if let Some(nav) = &response.navigation {
            println!("        [→ {}]", nav.label);
        }
        for action in &response.actions {
            println!("        [{:?}: {}]", action.kind, action.label);
        }

        // Give any in-flight reservation poll a beat to land, then show
        // whatever updates arrived while we were talking.
        tokio::time::sleep(Duration::from_millis(100)).await;
        for note in engine.drain_notifications() {
            println!("townie> {note}");
        }
    }

    engine.end_session(&mut session);
    println!("townie> See you around campus.");
    Ok(())
}
