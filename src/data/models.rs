//! Canonical play-by-play entities.
//!
//! All entities are built once per parse call from a single response and
//! are not mutated afterwards. Optional fields use `None` for "not
//! applicable to this event", never for an error.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

use super::codec::{EventType, PlayerPosition, ShotType};

/// Number of on-ice slots per side in the HTML report.
pub const ON_ICE_SLOTS: usize = 9;

// =============================================================================
// Identifiers
// =============================================================================

/// League-wide game identifier, e.g. `2023020001`.
///
/// The first four digits are the season's start year; the rest (game type
/// plus game number) name the HTML report file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameId(u64);

impl GameId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Season start year, or `None` when the id is too short to carry one.
    pub fn season_start_year(self) -> Option<u32> {
        let digits = self.0.to_string();
        if digits.len() <= 4 {
            return None;
        }
        digits[..4].parse().ok()
    }

    /// Eight-digit season label, e.g. `20232024`.
    pub fn season_label(self) -> Option<String> {
        self.season_start_year()
            .map(|year| format!("{}{}", year, year + 1))
    }

    /// Digits after the season year, e.g. `020001`.
    pub fn report_suffix(self) -> Option<String> {
        let digits = self.0.to_string();
        (digits.len() > 4).then(|| digits[4..].to_string())
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GameId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u64> for GameId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// =============================================================================
// Game-center entities
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub name: String,
    pub abbreviation: String,
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub team_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub id: i64,
    pub position: PlayerPosition,
    pub sweater_number: u16,
}

/// One event from the game-center play list.
///
/// `p1`..`p3` and `goalie` are overloaded by event type: `p1` is the
/// shooter on a shot, the hitter on a hit, the winner on a faceoff.
#[derive(Debug, Clone, PartialEq)]
pub struct Play {
    pub sequence_number: usize,
    pub event_type: EventType,
    pub period: u8,
    pub period_type: String,
    pub time_in_period: String,
    pub time_remaining: String,
    pub event_owner_team_id: Option<i64>,
    pub p1: Option<i64>,
    pub p2: Option<i64>,
    pub p3: Option<i64>,
    pub goalie: Option<i64>,
    pub shot_type: Option<ShotType>,
    pub x: Option<i64>,
    pub y: Option<i64>,
    pub reason: Option<String>,
    pub penalty_duration: Option<i64>,
}

/// On-ice officials; each slot is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Officials {
    pub referees: [Option<String>; 2],
    pub linesmen: [Option<String>; 2],
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Coaches {
    pub home: Option<String>,
    pub away: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub game_id: GameId,
    pub season: u32,
    pub date: NaiveDate,
    pub away_team: Team,
    pub home_team: Team,
    pub away_goals: u32,
    pub home_goals: u32,
    pub venue: String,
    pub venue_location: String,
    pub officials: Officials,
    pub coaches: Coaches,
    pub players: Vec<Player>,
    pub plays: Vec<Play>,
}

impl Game {
    /// Look up a rostered player by league id.
    pub fn player(&self, id: i64) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Plays of one event type, in source order.
    pub fn plays_of(&self, event_type: EventType) -> impl Iterator<Item = &Play> {
        self.plays.iter().filter(move |p| p.event_type == event_type)
    }
}

// =============================================================================
// HTML report entities
// =============================================================================

/// One on-ice slot in the HTML report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IceSlot {
    Sweater(u16),
    /// Padding past the last player on ice; projected as an empty string.
    Empty,
}

impl IceSlot {
    pub fn sweater(self) -> Option<u16> {
        match self {
            Self::Sweater(n) => Some(n),
            Self::Empty => None,
        }
    }
}

/// Fixed nine-slot on-ice roster, packed left to right.
pub type OnIce = [IceSlot; ON_ICE_SLOTS];

#[derive(Debug, Clone, PartialEq)]
pub struct HtmlPlay {
    pub game_id: GameId,
    pub n: u32,
    pub period: String,
    pub strength: String,
    pub time_elapsed: String,
    /// `None` for report rows that carry no play-by-play event.
    pub event_type: Option<EventType>,
    pub description: String,
    pub away_on_ice: OnIce,
    pub home_on_ice: OnIce,
}

// =============================================================================
// Shift chart entities
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shift {
    pub id: i64,
    pub start_time: String,
    pub end_time: String,
    pub period: u8,
    /// `None` on goal-event records, which carry no interval.
    pub duration: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub player_id: i64,
    pub team_id: i64,
    pub team_abbrev: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftInfo {
    pub game_id: GameId,
    pub shifts: Vec<Shift>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_id_season_parts() {
        let id = GameId::new(2023020001);
        assert_eq!(id.season_start_year(), Some(2023));
        assert_eq!(id.season_label().as_deref(), Some("20232024"));
        assert_eq!(id.report_suffix().as_deref(), Some("020001"));
    }

    #[test]
    fn test_short_game_id_has_no_season() {
        let id = GameId::new(2023);
        assert_eq!(id.season_start_year(), None);
        assert_eq!(id.report_suffix(), None);
    }

    #[test]
    fn test_game_id_from_str() {
        assert_eq!(" 2022030415 ".parse::<GameId>().unwrap().get(), 2022030415);
        assert!("abc".parse::<GameId>().is_err());
    }

    #[test]
    fn test_ice_slot_sweater() {
        assert_eq!(IceSlot::Sweater(91).sweater(), Some(91));
        assert_eq!(IceSlot::Empty.sweater(), None);
    }
}
