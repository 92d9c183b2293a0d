use chrono::{DateTime, FixedOffset, Utc};
use schema::{AirlineCode, AirportCode, Flight, FlightSearch, FlightUpdate, ReferenceTable};

use crate::filter::{EditOutcome, FilterEditor};
use crate::list::{self, ListFormatter};
use crate::simulation;

#[derive(Debug, Clone)]
pub enum Message {
    FlightUpdate(FlightUpdate),
    /// A line typed by the user
    Input(String),
    /// Periodic redraw so the simulation indicator keeps up
    Tick,
}

/// What the app needs done outside of its own state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Search(FlightSearch),
    Refresh,
    Quit,
}

/// Everything `App::view` needs from the outside world
pub struct Context<'a> {
    pub airports: &'a ReferenceTable<AirportCode>,
    pub airlines: &'a ReferenceTable<AirlineCode>,
    pub current_flight_time: DateTime<Utc>,
    pub now: DateTime<Utc>,
}

pub struct App {
    search: FlightSearch,
    flights: Vec<Flight>,
    is_loading: bool,
    fetch_error: Option<String>,
    editor: Option<FilterEditor>,
    notice: Option<String>,
    time_zone: FixedOffset,
}

impl App {
    pub fn new(search: FlightSearch, time_zone: FixedOffset) -> Self {
        Self {
            search,
            flights: vec![],
            is_loading: true,
            fetch_error: None,
            editor: None,
            notice: None,
            time_zone,
        }
    }

    pub fn update(&mut self, message: Message) -> Action {
        match message {
            Message::FlightUpdate(update) => {
                // may still be queued from before the latest search was submitted
                if update.search() != &self.search {
                    log::debug!("ignoring update for superseded search {}", update.search());
                    return Action::None;
                }
                self.is_loading = false;

                match update {
                    FlightUpdate::Flights { flights, .. } => {
                        self.flights = flights;
                        self.fetch_error = None;
                    }
                    FlightUpdate::Failed { reason, .. } => {
                        self.fetch_error = Some(reason);
                    }
                }

                Action::None
            }

            Message::Input(input) => match self.editor.as_mut() {
                Some(editor) => match editor.apply(&input) {
                    Ok(EditOutcome::Editing) => {
                        self.notice = None;
                        Action::None
                    }
                    Ok(EditOutcome::Confirmed(search)) => {
                        self.editor = None;
                        self.notice = None;
                        self.search = search.clone();
                        self.flights.clear();
                        self.fetch_error = None;
                        self.is_loading = true;

                        Action::Search(search)
                    }
                    Ok(EditOutcome::Cancelled) => {
                        log::debug!("filter editing cancelled, keeping {}", self.search);
                        self.editor = None;
                        self.notice = None;
                        Action::None
                    }
                    Err(e) => {
                        self.notice = Some(e.to_string());
                        Action::None
                    }
                },

                None => match input.trim() {
                    "filter" => {
                        self.editor = Some(FilterEditor::begin(&self.search));
                        self.notice = None;
                        Action::None
                    }
                    "refresh" => {
                        self.notice = None;
                        Action::Refresh
                    }
                    "quit" | "q" => Action::Quit,
                    "" => Action::None,
                    other => {
                        self.notice = Some(format!("unknown command `{}`", other));
                        Action::None
                    }
                },
            },

            Message::Tick => Action::None,
        }
    }

    pub fn view(&self, context: &Context<'_>) -> String {
        let mut lines = vec![];

        if let Some(editor) = &self.editor {
            lines.push(editor.view());
        } else {
            let indicator = simulation::indicator(
                context.current_flight_time,
                context.now,
                &self.time_zone,
            );
            lines.push(format!("{:<8} | {}", indicator, list::title(&self.flights)));
            lines.push(format!("searching {}", self.search));

            let formatter = ListFormatter {
                airports: context.airports,
                airlines: context.airlines,
                current_flight_time: context.current_flight_time,
                time_zone: self.time_zone,
            };
            if !self.flights.is_empty() {
                lines.push(formatter.rows(&self.flights));
            } else if self.is_loading {
                lines.push("loading…".to_string());
            }

            if let Some(reason) = &self.fetch_error {
                lines.push(format!("fetch failed: {}", reason));
            }
            lines.push("commands: filter, refresh, quit".to_string());
        }

        if let Some(notice) = &self.notice {
            lines.push(notice.clone());
        }

        lines.join("\n")
    }
}
