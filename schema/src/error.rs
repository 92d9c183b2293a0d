/// Problems reading one of the sample data files
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: invalid {field} `{value}`")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },
}

/// Why a `FlightFetcher` could not produce flights for a search
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("flight data unavailable: {0}")]
    Data(#[from] DataError),
    #[error("provider error: {0}")]
    Provider(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("{0} table has already been installed")]
    AlreadyInstalled(&'static str),
    #[error(transparent)]
    Data(#[from] DataError),
}
