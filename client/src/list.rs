use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use itertools::Itertools;
use schema::{AirlineCode, AirportCode, Flight, ReferenceTable};

use crate::format;

/// The three lines shown for each flight in the list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListEntry {
    pub name: String,
    pub arrives: String,
    pub origin: String,
}

impl fmt::Display for ListEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n    {}\n    {}", self.name, self.arrives, self.origin)
    }
}

/// Turns fetched flights into display text
pub struct ListFormatter<'a> {
    pub airports: &'a ReferenceTable<AirportCode>,
    pub airlines: &'a ReferenceTable<AirlineCode>,
    /// Possibly simulated "now" that arrival times are compared against
    pub current_flight_time: DateTime<Utc>,
    pub time_zone: FixedOffset,
}

impl<'a> ListFormatter<'a> {
    pub fn entry(&self, flight: &Flight) -> ListEntry {
        ListEntry {
            name: self.name(flight),
            arrives: self.arrives(flight),
            origin: self.origin(flight),
        }
    }

    pub fn name(&self, flight: &Flight) -> String {
        format!(
            "{} {}",
            self.airlines.friendly_name(&flight.airline),
            flight.number
        )
    }

    pub fn arrives(&self, flight: &Flight) -> String {
        let time = format::relative_to_today(
            self.current_flight_time,
            flight.arrival,
            &self.time_zone,
        );

        if !flight.has_departed() {
            format!("scheduled to arrive {} (not departed)", time)
        } else if flight.has_arrived(self.current_flight_time) {
            format!("arrived {}", time)
        } else {
            format!("arrives {}", time)
        }
    }

    pub fn origin(&self, flight: &Flight) -> String {
        format!("from {}", self.airports.friendly_name(&flight.origin))
    }

    /// One block per flight, in the order given. No flights means no rows.
    pub fn rows(&self, flights: &[Flight]) -> String {
        flights.iter().map(|flight| self.entry(flight)).join("\n")
    }
}

/// `Flights to KSFO`, or just `Flights` while the list is empty
pub fn title(flights: &[Flight]) -> String {
    match flights.first() {
        Some(flight) => format!("Flights to {}", flight.destination),
        None => "Flights".to_string(),
    }
}
