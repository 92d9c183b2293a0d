use schema::{AirlineCode, AirportCode, FlightSearch};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("a destination is required")]
    MissingDestination,
    #[error("`{0}` needs a value")]
    MissingValue(&'static str),
    #[error("expected `on` or `off`, found `{0}`")]
    InvalidToggle(String),
    #[error("unknown filter command `{0}`")]
    UnknownCommand(String),
}

/// What became of the editor after a line of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Editing,
    Confirmed(FlightSearch),
    Cancelled,
}

/// Modal editor working on a copy of the active search. Nothing it does
/// affects the active search until it is confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterEditor {
    destination: Option<AirportCode>,
    origin: Option<AirportCode>,
    airline: Option<AirlineCode>,
    in_air: bool,
}

impl FilterEditor {
    pub fn begin(current: &FlightSearch) -> Self {
        Self {
            destination: Some(current.destination.clone()),
            origin: current.origin.clone(),
            airline: current.airline.clone(),
            in_air: current.in_air,
        }
    }

    /// A blank code clears the destination
    pub fn set_destination(&mut self, code: &str) {
        self.destination = non_blank(Some(code)).map(AirportCode::from_str);
    }

    /// `None`, a blank code or `-` means any origin
    pub fn set_origin(&mut self, code: Option<&str>) {
        self.origin = non_blank(code).map(AirportCode::from_str);
    }

    /// `None`, a blank code or `-` means any airline
    pub fn set_airline(&mut self, code: Option<&str>) {
        self.airline = non_blank(code).map(AirlineCode::from_str);
    }

    pub fn set_in_air(&mut self, in_air: bool) {
        self.in_air = in_air;
    }

    /// The edited search, provided it names a destination
    pub fn confirm(&self) -> Result<FlightSearch, EditError> {
        let destination = self
            .destination
            .clone()
            .ok_or(EditError::MissingDestination)?;

        Ok(FlightSearch {
            destination,
            origin: self.origin.clone(),
            airline: self.airline.clone(),
            in_air: self.in_air,
        })
    }

    /// Apply one line of editor input
    pub fn apply(&mut self, input: &str) -> Result<EditOutcome, EditError> {
        let mut words = input.split_whitespace();
        let command = words.next().unwrap_or_default();
        let value = words.next();

        match command {
            "destination" | "dest" => {
                let code = value.ok_or(EditError::MissingValue("destination"))?;
                self.set_destination(code);
            }
            "origin" | "from" => self.set_origin(value),
            "airline" => self.set_airline(value),
            "in-air" => match value {
                Some("on" | "yes" | "true") => self.set_in_air(true),
                Some("off" | "no" | "false") => self.set_in_air(false),
                Some(other) => return Err(EditError::InvalidToggle(other.to_string())),
                None => return Err(EditError::MissingValue("in-air")),
            },
            "done" => return self.confirm().map(EditOutcome::Confirmed),
            "cancel" => return Ok(EditOutcome::Cancelled),
            "" => {}
            other => return Err(EditError::UnknownCommand(other.to_string())),
        }

        Ok(EditOutcome::Editing)
    }

    pub fn view(&self) -> String {
        let or_any = |code: Option<String>| code.unwrap_or_else(|| "any".to_string());

        format!(
            "Filter flights\n  \
             destination  {}\n  \
             origin       {}\n  \
             airline      {}\n  \
             in the air   {}\n\
             commands: destination <code>, origin <code|->, airline <code|->, in-air <on|off>, done, cancel",
            self.destination
                .as_ref()
                .map_or_else(|| "(required)".to_string(), ToString::to_string),
            or_any(self.origin.as_ref().map(ToString::to_string)),
            or_any(self.airline.as_ref().map(ToString::to_string)),
            if self.in_air { "on" } else { "off" },
        )
    }
}

fn non_blank(code: Option<&str>) -> Option<&str> {
    code.map(str::trim)
        .filter(|code| !code.is_empty() && *code != "-")
}
