use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use once_cell::sync::{Lazy, OnceCell};

use crate::entities::{csv_records, read_csv};
use crate::error::{DataError, ReferenceError};
use crate::{AirlineCode, AirportCode};

static AIRPORTS: OnceCell<ReferenceTable<AirportCode>> = OnceCell::new();
static AIRLINES: OnceCell<ReferenceTable<AirlineCode>> = OnceCell::new();

static NO_AIRPORTS: Lazy<ReferenceTable<AirportCode>> = Lazy::new(ReferenceTable::default);
static NO_AIRLINES: Lazy<ReferenceTable<AirlineCode>> = Lazy::new(ReferenceTable::default);

/// A code which can be resolved to a friendly name through a `ReferenceTable`
pub trait ReferenceCode: Clone + Eq + Hash + fmt::Display + Send + Sync + 'static {
    /// What kind of thing the code names, used in diagnostics
    const KIND: &'static str;
    /// Shown in place of a friendly name when the code is not in the table
    const UNKNOWN_LABEL: &'static str;

    fn parse(s: &str) -> Self;
}

impl ReferenceCode for AirportCode {
    const KIND: &'static str = "airport";
    const UNKNOWN_LABEL: &'static str = "Unknown Airport";

    fn parse(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl ReferenceCode for AirlineCode {
    const KIND: &'static str = "airline";
    const UNKNOWN_LABEL: &'static str = "Unknown Airline";

    fn parse(s: &str) -> Self {
        Self::from_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceEntry<C> {
    pub code: C,
    pub friendly_name: String,
}

/// Read-only lookup from a code to its friendly name
#[derive(Clone, Debug)]
pub struct ReferenceTable<C: ReferenceCode> {
    entries: HashMap<C, ReferenceEntry<C>>,
}

impl<C: ReferenceCode> Default for ReferenceTable<C> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<C: ReferenceCode> ReferenceTable<C> {
    pub fn new(entries: impl IntoIterator<Item = ReferenceEntry<C>>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.code.clone(), entry))
                .collect(),
        }
    }

    pub fn from_csv(path: &str) -> Result<Self, DataError> {
        Self::parse_csv(&read_csv(path)?)
    }

    /// Parses `code, friendly name` lines. Later duplicates win.
    pub fn parse_csv(contents: &str) -> Result<Self, DataError> {
        let mut entries = vec![];

        for (line, values) in csv_records(contents, 2) {
            match values.as_slice() {
                [code, name] if !code.is_empty() && !name.is_empty() => {
                    entries.push(ReferenceEntry {
                        code: C::parse(code),
                        friendly_name: name.to_string(),
                    })
                }
                _ => {
                    return Err(DataError::FieldCount {
                        line,
                        expected: 2,
                        found: values.iter().filter(|v| !v.is_empty()).count(),
                    })
                }
            }
        }

        Ok(Self::new(entries))
    }

    pub fn lookup(&self, code: &C) -> Option<&ReferenceEntry<C>> {
        self.entries.get(code)
    }

    /// Returns the friendly name of `code`, or the placeholder label for
    /// codes this table doesn't know about
    pub fn friendly_name(&self, code: &C) -> &str {
        self.lookup(code)
            .map(|entry| entry.friendly_name.as_str())
            .unwrap_or(C::UNKNOWN_LABEL)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Install the process-wide airport table. May only be done once.
pub fn install_airports(table: ReferenceTable<AirportCode>) -> Result<(), ReferenceError> {
    AIRPORTS
        .set(table)
        .map_err(|_| ReferenceError::AlreadyInstalled(AirportCode::KIND))
}

/// Install the process-wide airline table. May only be done once.
pub fn install_airlines(table: ReferenceTable<AirlineCode>) -> Result<(), ReferenceError> {
    AIRLINES
        .set(table)
        .map_err(|_| ReferenceError::AlreadyInstalled(AirlineCode::KIND))
}

/// The process-wide airport table, empty until installed
pub fn airports() -> &'static ReferenceTable<AirportCode> {
    AIRPORTS.get().unwrap_or_else(|| Lazy::force(&NO_AIRPORTS))
}

/// The process-wide airline table, empty until installed
pub fn airlines() -> &'static ReferenceTable<AirlineCode> {
    AIRLINES.get().unwrap_or_else(|| Lazy::force(&NO_AIRLINES))
}

#[cfg(test)]
mod test {
    use super::*;

    const AIRPORTS_CSV: &str = "\
KSFO, San Francisco International, San Francisco CA
klas, Harry Reid International, Las Vegas NV
";

    #[test]
    fn test_lookup() {
        let table = ReferenceTable::<AirportCode>::parse_csv(AIRPORTS_CSV).expect("airports");

        assert_eq!(table.len(), 2);
        let entry = table
            .lookup(&AirportCode::from_str("KSFO"))
            .expect("KSFO entry");
        assert_eq!(
            entry.friendly_name,
            "San Francisco International, San Francisco CA"
        );
        assert_eq!(
            table.friendly_name(&AirportCode::from_str("KLAS")),
            "Harry Reid International, Las Vegas NV"
        );
    }

    #[test]
    fn test_unknown_codes_fall_back() {
        let airports = ReferenceTable::<AirportCode>::parse_csv(AIRPORTS_CSV).expect("airports");
        let airlines = ReferenceTable::<AirlineCode>::default();

        assert!(airports.lookup(&AirportCode::from_str("ZZZZ")).is_none());
        assert_eq!(
            airports.friendly_name(&AirportCode::from_str("ZZZZ")),
            "Unknown Airport"
        );
        assert_eq!(
            airlines.friendly_name(&AirlineCode::from_str("UAL")),
            "Unknown Airline"
        );
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let err = ReferenceTable::<AirlineCode>::parse_csv("UAL, United\nSWA\n")
            .expect_err("missing name");
        assert!(matches!(err, DataError::FieldCount { line: 2, .. }));
    }

    #[test]
    fn test_install_once() {
        let table = ReferenceTable::new([ReferenceEntry {
            code: AirlineCode::from_str("UAL"),
            friendly_name: "United".to_string(),
        }]);

        install_airlines(table.clone()).expect("first install");
        assert_eq!(airlines().friendly_name(&AirlineCode::from_str("UAL")), "United");
        assert!(matches!(
            install_airlines(table),
            Err(ReferenceError::AlreadyInstalled("airline"))
        ));
    }
}
