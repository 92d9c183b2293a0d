use futures::Future;

use crate::{FetchError, Flight, FlightSearch};

/// A `FlightFetcher` answers a `FlightSearch` with the matching flights.
/// It returns a `Response` future which resolves once the provider has
/// produced the whole result, ordered by arrival.
pub trait FlightFetcher {
    type Response: Future<Output = Result<Vec<Flight>, FetchError>> + Send + 'static;

    /// Start fetching the flights which match `search`.
    fn fetch(&self, search: &FlightSearch) -> Self::Response;
}
