mod clock;
mod entities;
mod error;
mod fetcher;
mod reference;
mod speed;

pub use clock::{FlightClock, SimulatedClock, SystemClock};
pub use entities::{parse_timestamp, AirlineCode, AirportCode, Flight, FlightSearch};
pub use error::{DataError, FetchError, ReferenceError};
pub use fetcher::FlightFetcher;
pub use reference::{
    airlines, airports, install_airlines, install_airports, ReferenceCode, ReferenceEntry,
    ReferenceTable,
};
pub use speed::Speed;

pub const SAMPLE_FLIGHTS_CSV_PATH: &'static str = "./test_data/flights.csv";
pub const SAMPLE_AIRPORTS_CSV_PATH: &'static str = "./test_data/airports.csv";
pub const SAMPLE_AIRLINES_CSV_PATH: &'static str = "./test_data/airlines.csv";

/// Flight time at which the sample flights are consistent: some have landed,
/// some are in the air and some haven't left yet
pub const SAMPLE_SIMULATION_START: &'static str = "2020-12-15T02:00:00Z";

/// Published to subscribers whenever a fetch for the active search completes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlightUpdate {
    Flights {
        search: FlightSearch,
        flights: Vec<Flight>,
    },
    Failed {
        search: FlightSearch,
        reason: String,
    },
}

impl FlightUpdate {
    /// The search this update answers
    pub fn search(&self) -> &FlightSearch {
        match self {
            Self::Flights { search, .. } | Self::Failed { search, .. } => search,
        }
    }
}
