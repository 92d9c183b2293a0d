mod feed;
mod fetcher;

pub use feed::{FeedError, FeedHandle, FlightFeed, Subscription};
pub use fetcher::CsvFetcher;
