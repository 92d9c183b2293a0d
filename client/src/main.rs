use std::time::Duration;

use futures::channel::mpsc;
use futures::stream::{self, StreamExt};
use provider::{CsvFetcher, FlightFeed};
use schema::{FlightClock, ReferenceTable, SimulatedClock, SystemClock};
use tokio_stream::wrappers::IntervalStream;

mod app;
mod config;
mod filter;
mod format;
mod list;
mod simulation;

use app::{Action, App, Context, Message};
use config::Config;

const REDRAW_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;

    schema::install_airports(ReferenceTable::from_csv(&config.airports_csv)?)?;
    schema::install_airlines(ReferenceTable::from_csv(&config.airlines_csv)?)?;
    log::info!(
        "loaded {} airports and {} airlines",
        schema::airports().len(),
        schema::airlines().len()
    );

    let clock: Box<dyn FlightClock> = match config.simulation_start {
        Some(start) => {
            log::info!("simulating flight time from {}", start);
            Box::new(SimulatedClock::new(start).with_speed(config.speed))
        }
        None => Box::new(SystemClock),
    };

    let fetcher = CsvFetcher::reloading(&config.flights_csv)
        .with_latency(config.latency)
        .with_speed(config.speed);
    let (feed, handle) = FlightFeed::new(fetcher, config.search.clone());
    let feed = feed.with_refresh_interval(config.refresh_interval);
    let updates = handle.subscribe()?;
    let feed_task = tokio::spawn(feed.run());

    // End of input quits
    let inputs = stdin_lines()
        .chain(stream::once(async { "quit".to_string() }))
        .map(Message::Input)
        .boxed();
    let redraws = IntervalStream::new(tokio::time::interval(REDRAW_INTERVAL))
        .map(|_| Message::Tick)
        .boxed();
    let updates = updates.map(Message::FlightUpdate).boxed();

    let mut messages = stream::select_all(vec![inputs, redraws, updates]);
    let mut app = App::new(config.search, config.time_zone);
    let mut last_view = String::new();

    while let Some(message) = messages.next().await {
        match app.update(message) {
            Action::None => {}
            Action::Search(search) => {
                log::info!("searching {}", search);
                handle.search(search)?
            }
            Action::Refresh => handle.refresh()?,
            Action::Quit => break,
        }

        let view = app.view(&Context {
            airports: schema::airports(),
            airlines: schema::airlines(),
            current_flight_time: clock.current_flight_time(),
            now: clock.now(),
        });
        // only redraw when something visible changed
        if view != last_view {
            println!("\n{}", view);
            last_view = view;
        }
    }

    drop(handle);
    drop(messages);
    feed_task.await?;

    Ok(())
}

/// Lines typed by the user. Read on a plain thread, a blocking read of stdin
/// would otherwise keep the runtime from shutting down.
fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded();

    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            match line {
                Ok(line) => {
                    if tx.unbounded_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::warn!("failed to read input: {}", e);
                    break;
                }
            }
        }
    });

    rx
}
