use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::DataError;

/// ICAO-style airport code, e.g. `KSFO`
#[derive(Default, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AirportCode(String);

impl AirportCode {
    pub fn from_str(s: &str) -> Self {
        Self(s.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AirportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ICAO-style airline code, e.g. `UAL`
#[derive(Default, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AirlineCode(String);

impl AirlineCode {
    pub fn from_str(s: &str) -> Self {
        Self(s.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AirlineCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the user is looking for. A `FlightSearch` is never edited in place,
/// changing any field means submitting a new search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlightSearch {
    /// Airport the flights are headed to
    pub destination: AirportCode,
    /// Only flights departing from this airport, if set
    pub origin: Option<AirportCode>,
    /// Only flights operated by this airline, if set
    pub airline: Option<AirlineCode>,
    /// Only flights which have already departed
    pub in_air: bool,
}

impl FlightSearch {
    pub fn new(destination: AirportCode) -> Self {
        Self {
            destination,
            origin: None,
            airline: None,
            in_air: true,
        }
    }

    pub fn with_origin(mut self, origin: AirportCode) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn with_airline(mut self, airline: AirlineCode) -> Self {
        self.airline = Some(airline);
        self
    }

    pub fn with_in_air(mut self, in_air: bool) -> Self {
        self.in_air = in_air;
        self
    }

    /// Returns true if the flight satisfies every criterion of this search
    pub fn matches(&self, flight: &Flight) -> bool {
        flight.destination == self.destination
            && self.origin.as_ref().map_or(true, |origin| *origin == flight.origin)
            && self.airline.as_ref().map_or(true, |airline| *airline == flight.airline)
            && (!self.in_air || flight.has_departed())
    }
}

impl fmt::Display for FlightSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "to {}", self.destination)?;
        if let Some(origin) = &self.origin {
            write!(f, " from {}", origin)?;
        }
        if let Some(airline) = &self.airline {
            write!(f, " on {}", airline)?;
        }
        if self.in_air {
            write!(f, " (in the air)")?;
        }
        Ok(())
    }
}

/// A single flight as reported by the flight data provider
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Flight {
    /// Unique identifier of the flight, e.g. `UAL1234`
    pub ident: String,
    pub airline: AirlineCode,
    pub number: u32,
    pub origin: AirportCode,
    pub destination: AirportCode,
    /// Actual departure time, absent until the flight has left the gate
    pub departure: Option<DateTime<Utc>>,
    /// Actual or estimated arrival time
    pub arrival: DateTime<Utc>,
}

impl Flight {
    const CSV_FIELDS: usize = 7;

    pub fn from_csv(path: &str) -> Result<Vec<Self>, DataError> {
        Self::parse_csv(&read_csv(path)?)
    }

    pub fn parse_csv(contents: &str) -> Result<Vec<Self>, DataError> {
        let mut flights = vec![];

        for (line, values) in csv_records(contents, Self::CSV_FIELDS + 1) {
            if values.len() != Self::CSV_FIELDS {
                return Err(DataError::FieldCount {
                    line,
                    expected: Self::CSV_FIELDS,
                    found: values.len(),
                });
            }

            flights.push(Self {
                ident: values[0].to_string(),
                airline: AirlineCode::from_str(values[1]),
                number: values[2]
                    .parse::<u32>()
                    .map_err(|_| invalid(line, "flight number", values[2]))?,
                origin: AirportCode::from_str(values[3]),
                destination: AirportCode::from_str(values[4]),
                departure: match values[5] {
                    "" => None,
                    s => Some(parse_timestamp(s).ok_or_else(|| invalid(line, "departure", s))?),
                },
                arrival: parse_timestamp(values[6])
                    .ok_or_else(|| invalid(line, "arrival", values[6]))?,
            });
        }

        Ok(flights)
    }

    pub fn has_departed(&self) -> bool {
        self.departure.is_some()
    }

    /// Returns true if the flight landed strictly before `now`
    pub fn has_arrived(&self, now: DateTime<Utc>) -> bool {
        self.arrival < now
    }
}

pub(crate) fn read_csv(path: &str) -> Result<String, DataError> {
    std::fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_string(),
        source,
    })
}

/// Yields the 1-based line number and at most `max_fields` comma-separated
/// fields of each non-blank, non-comment line. The last field keeps any
/// remaining commas.
pub(crate) fn csv_records(
    contents: &str,
    max_fields: usize,
) -> impl Iterator<Item = (usize, Vec<&str>)> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
        .map(move |(i, line)| (i + 1, line.splitn(max_fields, ',').map(str::trim).collect()))
}

pub(crate) fn invalid(line: usize, field: &'static str, value: &str) -> DataError {
    DataError::InvalidField {
        line,
        field,
        value: value.to_string(),
    }
}

pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|time| time.with_timezone(&Utc))
}
