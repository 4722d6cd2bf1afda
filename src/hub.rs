//! Route table and hub navigation.
//!
//! Every game is reached from the hub by name and offers a way back.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VentureError;

/// A screen in the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// The central hub.
    Hub,
    /// Reading comprehension quiz.
    Reading,
    /// Listen and spell.
    Listening,
    /// Typing practice.
    Writing,
    /// Word-picture matching.
    Matching,
    /// Speaking practice.
    Speaking,
    /// Alphabet explorer.
    Alphabet,
}

impl Route {
    /// Every game, in hub order.
    pub fn games() -> &'static [Route] {
        &[
            Route::Reading,
            Route::Listening,
            Route::Writing,
            Route::Matching,
            Route::Speaking,
            Route::Alphabet,
        ]
    }

    /// Stable route name.
    pub fn name(&self) -> &'static str {
        match self {
            Route::Hub => "hub",
            Route::Reading => "reading",
            Route::Listening => "listening",
            Route::Writing => "writing",
            Route::Matching => "matching",
            Route::Speaking => "speaking",
            Route::Alphabet => "alphabet",
        }
    }

    /// Route path.
    pub fn path(&self) -> &'static str {
        match self {
            Route::Hub => "/",
            Route::Reading => "/reading",
            Route::Listening => "/listening",
            Route::Writing => "/writing",
            Route::Matching => "/matching",
            Route::Speaking => "/speaking",
            Route::Alphabet => "/alphabet",
        }
    }

    /// Title shown on the hub.
    pub fn title(&self) -> &'static str {
        match self {
            Route::Hub => "Mission Control",
            Route::Reading => "Story Station",
            Route::Listening => "Sound Signals",
            Route::Writing => "Keyboard Cockpit",
            Route::Matching => "Picture Planets",
            Route::Speaking => "Voice Launch",
            Route::Alphabet => "Alphabet Galaxy",
        }
    }

    /// One-line description for the hub.
    pub fn description(&self) -> &'static str {
        match self {
            Route::Hub => "Pick a mission",
            Route::Reading => "Read a story and answer questions",
            Route::Listening => "Hear a word and spell it",
            Route::Writing => "Type sentences letter by letter",
            Route::Matching => "Connect words to pictures",
            Route::Speaking => "Read aloud and get scored",
            Route::Alphabet => "Explore letters from A to Z",
        }
    }

    /// Check if this is a game rather than the hub.
    pub fn is_game(&self) -> bool {
        !matches!(self, Route::Hub)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Route {
    type Err = VentureError;

    /// Accepts a name or a path, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        let key = if key == "/" {
            "hub"
        } else {
            key.trim_start_matches('/')
        };
        std::iter::once(Route::Hub)
            .chain(Route::games().iter().copied())
            .find(|r| r.name() == key)
            .ok_or_else(|| VentureError::unknown_item("route", s))
    }
}

/// Navigation state: which screen is open and how often each was opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hub {
    current: Option<Route>,
    visits: BTreeMap<Route, u32>,
}

impl Hub {
    /// Start on the hub screen.
    pub fn new() -> Self {
        Self::default()
    }

    /// The open screen.
    pub fn current(&self) -> Route {
        self.current.unwrap_or(Route::Hub)
    }

    /// How many times a screen has been opened.
    pub fn visits(&self, route: Route) -> u32 {
        self.visits.get(&route).copied().unwrap_or(0)
    }

    /// Open a screen. Returns the screen that was open before.
    pub fn open(&mut self, route: Route) -> Route {
        let previous = self.current();
        *self.visits.entry(route).or_insert(0) += 1;
        self.current = Some(route);
        tracing::debug!(from = %previous, to = %route, "navigate");
        previous
    }

    /// Leave the current game for the hub.
    pub fn return_to_hub(&mut self) -> Route {
        let previous = self.current();
        self.current = None;
        tracing::debug!(from = %previous, "return to hub");
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_round_trip_names() {
        for route in Route::games() {
            assert_eq!(route.name().parse::<Route>().unwrap(), *route);
            assert_eq!(route.path().parse::<Route>().unwrap(), *route);
        }
        assert_eq!("/".parse::<Route>().unwrap(), Route::Hub);
        assert_eq!(" Speaking ".parse::<Route>().unwrap(), Route::Speaking);
    }

    #[test]
    fn test_unknown_route() {
        let err = "space-invaders".parse::<Route>().unwrap_err();
        assert_eq!(err.to_string(), "unknown route: space-invaders");
    }

    #[test]
    fn test_games_exclude_hub() {
        assert_eq!(Route::games().len(), 6);
        assert!(Route::games().iter().all(Route::is_game));
        assert!(!Route::Hub.is_game());
    }

    #[test]
    fn test_display_uses_name() {
        assert_eq!(Route::Matching.to_string(), "matching");
    }

    #[test]
    fn test_hub_navigation() {
        let mut hub = Hub::new();
        assert_eq!(hub.current(), Route::Hub);

        assert_eq!(hub.open(Route::Listening), Route::Hub);
        assert_eq!(hub.current(), Route::Listening);
        assert_eq!(hub.return_to_hub(), Route::Listening);
        assert_eq!(hub.current(), Route::Hub);

        hub.open(Route::Listening);
        assert_eq!(hub.visits(Route::Listening), 2);
        assert_eq!(hub.visits(Route::Reading), 0);
    }
}
