use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use itertools::Itertools;
use schema::{DataError, FetchError, Flight, FlightFetcher, FlightSearch, Speed};

type Response = Pin<Box<dyn Future<Output = Result<Vec<Flight>, FetchError>> + Send>>;

enum Source {
    /// Flights parsed once up front
    Loaded(Arc<Vec<Flight>>),
    /// Re-read from disk on every fetch
    File(Arc<str>),
}

/// Simulated flight data provider which answers searches from a CSV dataset
pub struct CsvFetcher {
    source: Source,
    latency: Duration,
    speed: Speed,
}

impl CsvFetcher {
    pub fn new(flights: Vec<Flight>) -> Self {
        Self {
            source: Source::Loaded(Arc::new(flights)),
            latency: Duration::ZERO,
            speed: Default::default(),
        }
    }

    /// Load the dataset once
    pub fn from_csv_path(path: &str) -> Result<Self, DataError> {
        let flights = Flight::from_csv(path)?;
        log::info!("loaded {} flights from {}", flights.len(), path);

        Ok(Self::new(flights))
    }

    /// Re-read the dataset on every fetch so edits to the file show up on refresh
    pub fn reloading(path: &str) -> Self {
        Self {
            source: Source::File(Arc::from(path)),
            latency: Duration::ZERO,
            speed: Default::default(),
        }
    }

    /// Wait this long before answering, like a remote provider would
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Run with the provided `Speed`
    pub fn with_speed(mut self, speed: Speed) -> Self {
        self.speed = speed;
        self
    }

    /// Flights matching `search`, ordered by arrival
    pub fn select(flights: &[Flight], search: &FlightSearch) -> Vec<Flight> {
        flights
            .iter()
            .filter(|flight| search.matches(flight))
            .cloned()
            .sorted_by(|a, b| a.arrival.cmp(&b.arrival).then_with(|| a.ident.cmp(&b.ident)))
            .collect()
    }

    async fn read_flights(path: &str) -> Result<Vec<Flight>, DataError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| DataError::Io {
                path: path.to_string(),
                source,
            })?;

        Flight::parse_csv(&contents)
    }
}

impl FlightFetcher for CsvFetcher {
    type Response = Response;

    fn fetch(&self, search: &FlightSearch) -> Self::Response {
        let search = search.clone();
        let delay = self.speed.adjust_duration(self.latency);
        let source = match &self.source {
            Source::Loaded(flights) => Source::Loaded(flights.clone()),
            Source::File(path) => Source::File(path.clone()),
        };

        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let flights = match source {
                Source::Loaded(flights) => Self::select(&flights, &search),
                Source::File(path) => Self::select(&Self::read_flights(&path).await?, &search),
            };
            log::debug!("{} flights {}", flights.len(), search);

            Ok::<_, FetchError>(flights)
        })
    }
}
