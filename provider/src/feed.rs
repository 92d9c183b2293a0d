use std::collections::HashMap;
use std::time::Duration;

use futures::channel::mpsc;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use schema::{FetchError, Flight, FlightFetcher, FlightSearch, FlightUpdate};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_stream::wrappers::IntervalStream;
use ulid::Ulid;

/// Stream of updates delivered to one subscriber of a `FlightFeed`
pub type Subscription = mpsc::UnboundedReceiver<FlightUpdate>;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("flight feed has shut down")]
    Closed,
}

#[derive(Debug)]
enum Command {
    Search(FlightSearch),
    Refresh,
    Subscribe(Ulid, mpsc::UnboundedSender<FlightUpdate>),
}

/// Cheap, cloneable control surface of a running `FlightFeed`.
/// The feed shuts down once every handle has been dropped.
#[derive(Clone, Debug)]
pub struct FeedHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl FeedHandle {
    /// Replace the active search. Triggers exactly one new fetch and
    /// supersedes any fetch still outstanding.
    pub fn search(&self, search: FlightSearch) -> Result<(), FeedError> {
        self.send(Command::Search(search))
    }

    /// Fetch the active search again, unless a fetch is already running
    pub fn refresh(&self) -> Result<(), FeedError> {
        self.send(Command::Refresh)
    }

    /// Receive every update published from now on, starting with the
    /// latest one if the feed already has it
    pub fn subscribe(&self) -> Result<Subscription, FeedError> {
        let (tx, rx) = mpsc::unbounded();
        self.send(Command::Subscribe(Ulid::new(), tx))?;

        Ok(rx)
    }

    fn send(&self, command: Command) -> Result<(), FeedError> {
        self.commands
            .unbounded_send(command)
            .map_err(|_| FeedError::Closed)
    }
}

/// Keeps the flights for the active `FlightSearch` up to date and
/// publishes them to subscribers.
///
/// Every fetch is tagged with a generation. A new search aborts the
/// outstanding fetch, and any result from an older generation which still
/// makes it back is dropped, so subscribers only ever see results for the
/// most recently submitted search.
pub struct FlightFeed<F: FlightFetcher> {
    fetcher: F,
    search: FlightSearch,
    refresh_interval: Option<Duration>,
    commands_receiver: mpsc::UnboundedReceiver<Command>,
}

struct Completion {
    generation: u64,
    search: FlightSearch,
    result: Result<Vec<Flight>, FetchError>,
}

enum Event {
    Command(Command),
    Completed(Completion),
    Refresh,
    Closed,
}

impl<F: FlightFetcher> FlightFeed<F> {
    pub fn new(fetcher: F, search: FlightSearch) -> (Self, FeedHandle) {
        let (tx, rx) = mpsc::unbounded();

        (
            Self {
                fetcher,
                search,
                refresh_interval: None,
                commands_receiver: rx,
            },
            FeedHandle { commands: tx },
        )
    }

    /// Re-fetch the active search periodically. The interval is real time,
    /// it is not scaled by the simulation `Speed`. Ticks that come while a
    /// fetch is still running are skipped.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = Some(interval).filter(|interval| !interval.is_zero());
        self
    }

    /// Drive the feed until every `FeedHandle` has been dropped
    pub async fn run(self) {
        let Self {
            fetcher,
            search,
            refresh_interval,
            commands_receiver,
        } = self;
        let (completions_sender, completions_receiver) = mpsc::unbounded();

        let commands = commands_receiver
            .map(Event::Command)
            .chain(stream::once(async { Event::Closed }))
            .boxed();
        let completions = completions_receiver.map(Event::Completed).boxed();
        // an interval too long to schedule never fires
        let first_refresh = refresh_interval
            .and_then(|period| Some((Instant::now().checked_add(period)?, period)));
        let refreshes: BoxStream<'static, Event> = match first_refresh {
            Some((start, period)) => IntervalStream::new(tokio::time::interval_at(start, period))
                .map(|_| Event::Refresh)
                .boxed(),
            None => stream::pending().boxed(),
        };

        let mut events = stream::select_all(vec![commands, completions, refreshes]);
        let mut state = State {
            fetcher,
            search,
            generation: 0,
            pending: None,
            latest: None,
            subscriptions: HashMap::new(),
            completions: completions_sender,
        };

        state.start_fetch();

        while let Some(event) = events.next().await {
            match event {
                Event::Command(Command::Search(search)) => {
                    log::info!("new search {}", search);
                    state.search = search;
                    state.start_fetch();
                }

                Event::Command(Command::Refresh) | Event::Refresh => state.refresh(),

                Event::Command(Command::Subscribe(id, tx)) => state.subscribe(id, tx),

                Event::Completed(completion) => state.complete(completion),

                Event::Closed => break,
            }
        }

        state.cancel_pending();
        log::info!("flight feed stopped");
    }
}

struct State<F> {
    fetcher: F,
    search: FlightSearch,
    generation: u64,
    pending: Option<JoinHandle<()>>,
    latest: Option<FlightUpdate>,
    subscriptions: HashMap<Ulid, mpsc::UnboundedSender<FlightUpdate>>,
    completions: mpsc::UnboundedSender<Completion>,
}

impl<F: FlightFetcher> State<F> {
    fn start_fetch(&mut self) {
        self.cancel_pending();

        self.generation += 1;
        let generation = self.generation;
        let search = self.search.clone();
        let response = self.fetcher.fetch(&search);
        let completions = self.completions.clone();
        log::info!("fetching flights {} (generation {})", search, generation);

        self.pending = Some(tokio::spawn(async move {
            let result = response.await;
            let _ = completions.unbounded_send(Completion {
                generation,
                search,
                result,
            });
        }));
    }

    /// Fetch the active search again, unless a fetch for it is still running
    fn refresh(&mut self) {
        match &self.pending {
            Some(pending) if !pending.is_finished() => {
                log::debug!(
                    "skipping refresh, generation {} still fetching",
                    self.generation
                );
            }
            _ => self.start_fetch(),
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            if !pending.is_finished() {
                log::debug!("cancelling fetch for generation {}", self.generation);
            }
            pending.abort();
        }
    }

    fn complete(&mut self, completion: Completion) {
        if completion.generation != self.generation {
            log::debug!(
                "discarding stale result of generation {} (current {})",
                completion.generation,
                self.generation
            );
            return;
        }
        self.pending = None;

        let update = match completion.result {
            Ok(flights) => {
                log::info!("received {} flights {}", flights.len(), completion.search);
                FlightUpdate::Flights {
                    search: completion.search,
                    flights,
                }
            }
            Err(e) => {
                log::warn!("fetch failed {}: {}", completion.search, e);
                FlightUpdate::Failed {
                    search: completion.search,
                    reason: e.to_string(),
                }
            }
        };

        self.publish(update);
    }

    fn subscribe(&mut self, id: Ulid, tx: mpsc::UnboundedSender<FlightUpdate>) {
        log::info!("new subscription {}", id);
        if let Some(latest) = &self.latest {
            if tx.unbounded_send(latest.clone()).is_err() {
                return;
            }
        }
        self.subscriptions.insert(id, tx);
    }

    /// Send the update to all of the subscribers, dropping any that have gone away
    fn publish(&mut self, update: FlightUpdate) {
        let mut disconnected = vec![];
        for (id, tx) in self.subscriptions.iter() {
            match tx.unbounded_send(update.clone()) {
                Err(e) if e.is_disconnected() => disconnected.push(*id),
                _ => {}
            }
        }

        for id in disconnected {
            log::info!("subscription {} disconnected", id);
            self.subscriptions.remove(&id);
        }

        self.latest = Some(update);
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use futures::future::BoxFuture;
    use futures::FutureExt;
    use schema::{parse_timestamp, AirlineCode, AirportCode};

    use super::*;

    /// Answers every search with one flight to the searched destination after
    /// a per-destination delay, counting how often it was asked
    #[derive(Clone, Default)]
    struct ScriptedFetcher {
        calls: Arc<AtomicUsize>,
        delays: HashMap<AirportCode, Duration>,
        failing: Option<AirportCode>,
    }

    impl ScriptedFetcher {
        fn with_delay(mut self, destination: &str, delay: Duration) -> Self {
            self.delays.insert(AirportCode::from_str(destination), delay);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl FlightFetcher for ScriptedFetcher {
        type Response = BoxFuture<'static, Result<Vec<Flight>, FetchError>>;

        fn fetch(&self, search: &FlightSearch) -> Self::Response {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = self
                .delays
                .get(&search.destination)
                .copied()
                .unwrap_or(Duration::from_secs(1));
            let fails = self.failing.as_ref() == Some(&search.destination);
            let destination = search.destination.clone();

            async move {
                tokio::time::sleep(delay).await;
                if fails {
                    return Err(FetchError::Provider("provider unavailable".to_string()));
                }

                Ok(vec![Flight {
                    ident: format!("UAL{}", destination),
                    airline: AirlineCode::from_str("UAL"),
                    number: 1,
                    origin: AirportCode::from_str("KLAX"),
                    destination,
                    departure: None,
                    arrival: parse_timestamp("2020-12-15T02:00:00Z").expect("arrival"),
                }])
            }
            .boxed()
        }
    }

    fn search(destination: &str) -> FlightSearch {
        FlightSearch::new(AirportCode::from_str(destination))
    }

    fn destination_of(update: &FlightUpdate) -> &str {
        update.search().destination.as_str()
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_search_triggers_one_fetch() {
        let fetcher = ScriptedFetcher::default();
        let (feed, handle) = FlightFeed::new(fetcher.clone(), search("KSFO"));
        let mut updates = handle.subscribe().expect("subscribe");
        tokio::spawn(feed.run());

        let first = updates.next().await.expect("initial update");
        assert_eq!(destination_of(&first), "KSFO");
        assert_eq!(fetcher.calls(), 1);

        handle.search(search("KLAS")).expect("search");
        let second = updates.next().await.expect("update for new search");
        assert!(matches!(&second, FlightUpdate::Flights { flights, .. } if flights[0].destination.as_str() == "KLAS"));
        assert_eq!(fetcher.calls(), 2);

        let nothing_more = tokio::time::timeout(Duration::from_secs(60), updates.next()).await;
        assert!(nothing_more.is_err());
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_fetch_never_published() {
        let fetcher = ScriptedFetcher::default()
            .with_delay("KSFO", Duration::from_secs(10))
            .with_delay("KLAS", Duration::from_secs(1));
        let (feed, handle) = FlightFeed::new(fetcher.clone(), search("KSFO"));
        let mut updates = handle.subscribe().expect("subscribe");
        handle.search(search("KLAS")).expect("search");
        tokio::spawn(feed.run());

        let update = updates.next().await.expect("update");
        assert_eq!(destination_of(&update), "KLAS");

        // the slow KSFO fetch would have finished long before this
        let stale = tokio::time::timeout(Duration::from_secs(30), updates.next()).await;
        assert!(stale.is_err());
        assert_eq!(fetcher.calls(), 2);
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let (feed, _handle) = FlightFeed::new(ScriptedFetcher::default(), search("KSFO"));
        let (completions, _) = mpsc::unbounded();
        let (tx, mut rx) = mpsc::unbounded();
        let mut state = State {
            fetcher: feed.fetcher,
            search: search("KLAS"),
            generation: 2,
            pending: None,
            latest: None,
            subscriptions: HashMap::from([(Ulid::new(), tx)]),
            completions,
        };

        state.complete(Completion {
            generation: 1,
            search: search("KSFO"),
            result: Ok(vec![]),
        });
        assert!(state.latest.is_none());
        assert!(rx.try_next().is_err());

        state.complete(Completion {
            generation: 2,
            search: search("KLAS"),
            result: Ok(vec![]),
        });
        let update = rx.try_next().expect("published").expect("open");
        assert_eq!(destination_of(&update), "KLAS");
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_refresh() {
        let fetcher = ScriptedFetcher::default();
        let (feed, handle) = FlightFeed::new(fetcher.clone(), search("KSFO"));
        let feed = feed.with_refresh_interval(Duration::from_secs(30));
        let mut updates = handle.subscribe().expect("subscribe");
        tokio::spawn(feed.run());

        for _ in 0..3 {
            let update = updates.next().await.expect("update");
            assert_eq!(destination_of(&update), "KSFO");
        }
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_waits_for_slow_fetch() {
        let fetcher = ScriptedFetcher::default().with_delay("KSFO", Duration::from_secs(40));
        let (feed, handle) = FlightFeed::new(fetcher.clone(), search("KSFO"));
        let feed = feed.with_refresh_interval(Duration::from_secs(30));
        let mut updates = handle.subscribe().expect("subscribe");
        tokio::spawn(feed.run());

        // a manual refresh while fetching is skipped as well
        handle.refresh().expect("refresh");

        let first = tokio::time::timeout(Duration::from_secs(600), updates.next())
            .await
            .expect("slow fetch published")
            .expect("update");
        assert_eq!(destination_of(&first), "KSFO");
        assert_eq!(fetcher.calls(), 1);

        // the next tick after completion starts the following fetch
        let second = tokio::time::timeout(Duration::from_secs(600), updates.next())
            .await
            .expect("refresh published")
            .expect("update");
        assert_eq!(second, first);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unschedulable_refresh_interval_never_fires() {
        let fetcher = ScriptedFetcher::default();
        let (feed, handle) = FlightFeed::new(fetcher.clone(), search("KSFO"));
        let feed = feed.with_refresh_interval(Duration::from_secs(u64::MAX));
        let mut updates = handle.subscribe().expect("subscribe");
        let running = tokio::spawn(feed.run());

        let update = updates.next().await.expect("initial update");
        assert_eq!(destination_of(&update), "KSFO");

        let nothing_more = tokio::time::timeout(Duration::from_secs(3600), updates.next()).await;
        assert!(nothing_more.is_err());
        assert_eq!(fetcher.calls(), 1);

        drop(handle);
        running.await.expect("feed task");
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_and_late_subscriber() {
        let fetcher = ScriptedFetcher::default();
        let (feed, handle) = FlightFeed::new(fetcher.clone(), search("KSFO"));
        let mut early = handle.subscribe().expect("subscribe");
        tokio::spawn(feed.run());

        let first = early.next().await.expect("update");

        // late subscribers start from the latest snapshot
        let mut late = handle.subscribe().expect("subscribe");
        assert_eq!(late.next().await.expect("snapshot"), first);

        handle.refresh().expect("refresh");
        assert_eq!(early.next().await.expect("refreshed"), first);
        assert_eq!(late.next().await.expect("refreshed"), first);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_published() {
        let fetcher = ScriptedFetcher {
            failing: Some(AirportCode::from_str("KSFO")),
            ..Default::default()
        };
        let (feed, handle) = FlightFeed::new(fetcher, search("KSFO"));
        let mut updates = handle.subscribe().expect("subscribe");
        tokio::spawn(feed.run());

        match updates.next().await.expect("update") {
            FlightUpdate::Failed { search, reason } => {
                assert_eq!(search.destination.as_str(), "KSFO");
                assert!(reason.contains("provider unavailable"));
            }
            update => panic!("expected failure, got {:?}", update),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_handles_dropped() {
        let (feed, handle) = FlightFeed::new(ScriptedFetcher::default(), search("KSFO"));
        let mut updates = handle.subscribe().expect("subscribe");
        let running = tokio::spawn(feed.run());

        let second_handle = handle.clone();
        drop(handle);
        assert!(second_handle.refresh().is_ok());
        drop(second_handle);

        running.await.expect("feed task");
        // the subscription ends with the feed
        while updates.next().await.is_some() {}
    }
}
