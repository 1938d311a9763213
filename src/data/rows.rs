//! Flat row projections of the entity model.
//!
//! One row type per table. Column order is the storage contract: it is the
//! field declaration order of each row struct and is mirrored by
//! [`TableKind::columns`]. Optional fields serialize as explicit `null`
//! (never skipped) and enum fields go through the codec's `encode` path.

use serde::ser::{Serialize, SerializeStruct, Serializer};

use super::codec::{encode, TokenCodec};
use super::models::{Game, HtmlPlay, IceSlot, OnIce, ShiftInfo, ON_ICE_SLOTS};

// =============================================================================
// Tables
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    GameInfo,
    Players,
    Plays,
    HtmlPlays,
    Shifts,
}

const GAME_INFO_COLUMNS: &[&str] = &[
    "game_id",
    "season",
    "date",
    "away_team_name",
    "away_team_abrv",
    "away_team_id",
    "away_team_goals",
    "home_team_name",
    "home_team_abrv",
    "home_team_id",
    "home_team_goals",
    "venue",
    "venue_location",
    "referee_1",
    "referee_2",
    "linesmen_1",
    "linesmen_2",
    "home_coach",
    "away_coach",
];

const PLAYER_COLUMNS: &[&str] = &[
    "game_id",
    "team_id",
    "first_name",
    "last_name",
    "id",
    "position",
    "sweater_number",
];

const PLAY_COLUMNS: &[&str] = &[
    "game_id",
    "n",
    "event_type",
    "period",
    "period_type",
    "time_in_period",
    "time_remaining",
    "event_owner_team_id",
    "p1",
    "p2",
    "p3",
    "goalie",
    "shot_type",
    "x",
    "y",
    "reason",
    "penalty_duration",
];

const AWAY_ON_ICE_COLUMNS: [&str; ON_ICE_SLOTS] = [
    "away_on_ice_p1",
    "away_on_ice_p2",
    "away_on_ice_p3",
    "away_on_ice_p4",
    "away_on_ice_p5",
    "away_on_ice_p6",
    "away_on_ice_p7",
    "away_on_ice_p8",
    "away_on_ice_p9",
];

const HOME_ON_ICE_COLUMNS: [&str; ON_ICE_SLOTS] = [
    "home_on_ice_p1",
    "home_on_ice_p2",
    "home_on_ice_p3",
    "home_on_ice_p4",
    "home_on_ice_p5",
    "home_on_ice_p6",
    "home_on_ice_p7",
    "home_on_ice_p8",
    "home_on_ice_p9",
];

const HTML_PLAY_COLUMNS: &[&str] = &[
    "game_id",
    "n",
    "period",
    "strength",
    "time_elapsed",
    "event",
    "description",
    "away_on_ice_p1",
    "away_on_ice_p2",
    "away_on_ice_p3",
    "away_on_ice_p4",
    "away_on_ice_p5",
    "away_on_ice_p6",
    "away_on_ice_p7",
    "away_on_ice_p8",
    "away_on_ice_p9",
    "home_on_ice_p1",
    "home_on_ice_p2",
    "home_on_ice_p3",
    "home_on_ice_p4",
    "home_on_ice_p5",
    "home_on_ice_p6",
    "home_on_ice_p7",
    "home_on_ice_p8",
    "home_on_ice_p9",
];

const SHIFT_COLUMNS: &[&str] = &[
    "game_id",
    "id",
    "start_time",
    "end_time",
    "period",
    "duration",
    "first_name",
    "last_name",
    "player_id",
    "team_id",
    "team_abbrev",
];

impl TableKind {
    pub const ALL: [TableKind; 5] = [
        Self::GameInfo,
        Self::Players,
        Self::Plays,
        Self::HtmlPlays,
        Self::Shifts,
    ];

    /// Storage table name.
    pub fn name(self) -> &'static str {
        match self {
            Self::GameInfo => "json_pbp_game_info",
            Self::Players => "json_pbp_player_info",
            Self::Plays => "json_pbp_plays",
            Self::HtmlPlays => "html_pbp_plays",
            Self::Shifts => "json_shift_info",
        }
    }

    /// Columns in storage order.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Self::GameInfo => GAME_INFO_COLUMNS,
            Self::Players => PLAYER_COLUMNS,
            Self::Plays => PLAY_COLUMNS,
            Self::HtmlPlays => HTML_PLAY_COLUMNS,
            Self::Shifts => SHIFT_COLUMNS,
        }
    }
}

/// A row of one table.
pub trait Row: Serialize {
    const TABLE: TableKind;
}

// =============================================================================
// Row types
// =============================================================================

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GameInfoRow {
    pub game_id: u64,
    pub season: u32,
    pub date: String,
    pub away_team_name: String,
    pub away_team_abrv: String,
    pub away_team_id: i64,
    pub away_team_goals: u32,
    pub home_team_name: String,
    pub home_team_abrv: String,
    pub home_team_id: i64,
    pub home_team_goals: u32,
    pub venue: String,
    pub venue_location: String,
    pub referee_1: Option<String>,
    pub referee_2: Option<String>,
    pub linesmen_1: Option<String>,
    pub linesmen_2: Option<String>,
    pub home_coach: Option<String>,
    pub away_coach: Option<String>,
}

impl Row for GameInfoRow {
    const TABLE: TableKind = TableKind::GameInfo;
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PlayerRow {
    pub game_id: u64,
    pub team_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub id: i64,
    pub position: &'static str,
    pub sweater_number: u16,
}

impl Row for PlayerRow {
    const TABLE: TableKind = TableKind::Players;
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PlayRow {
    pub game_id: u64,
    pub n: usize,
    pub event_type: &'static str,
    pub period: u8,
    pub period_type: String,
    pub time_in_period: String,
    pub time_remaining: String,
    pub event_owner_team_id: Option<i64>,
    pub p1: Option<i64>,
    pub p2: Option<i64>,
    pub p3: Option<i64>,
    pub goalie: Option<i64>,
    pub shot_type: Option<&'static str>,
    pub x: Option<i64>,
    pub y: Option<i64>,
    pub reason: Option<String>,
    pub penalty_duration: Option<i64>,
}

impl Row for PlayRow {
    const TABLE: TableKind = TableKind::Plays;
}

/// HTML play row. On-ice slots are flattened into nine columns per side;
/// an empty slot is the empty string, not null.
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlPlayRow {
    pub game_id: u64,
    pub n: u32,
    pub period: String,
    pub strength: String,
    pub time_elapsed: String,
    pub event: Option<&'static str>,
    pub description: String,
    pub away_on_ice: [String; ON_ICE_SLOTS],
    pub home_on_ice: [String; ON_ICE_SLOTS],
}

impl Serialize for HtmlPlayRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut row = serializer.serialize_struct("HtmlPlayRow", HTML_PLAY_COLUMNS.len())?;
        row.serialize_field("game_id", &self.game_id)?;
        row.serialize_field("n", &self.n)?;
        row.serialize_field("period", &self.period)?;
        row.serialize_field("strength", &self.strength)?;
        row.serialize_field("time_elapsed", &self.time_elapsed)?;
        row.serialize_field("event", &self.event)?;
        row.serialize_field("description", &self.description)?;
        for (column, value) in AWAY_ON_ICE_COLUMNS.into_iter().zip(&self.away_on_ice) {
            row.serialize_field(column, value)?;
        }
        for (column, value) in HOME_ON_ICE_COLUMNS.into_iter().zip(&self.home_on_ice) {
            row.serialize_field(column, value)?;
        }
        row.end()
    }
}

impl Row for HtmlPlayRow {
    const TABLE: TableKind = TableKind::HtmlPlays;
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ShiftRow {
    pub game_id: u64,
    pub id: i64,
    pub start_time: String,
    pub end_time: String,
    pub period: u8,
    pub duration: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub player_id: i64,
    pub team_id: i64,
    pub team_abbrev: String,
}

impl Row for ShiftRow {
    const TABLE: TableKind = TableKind::Shifts;
}

// =============================================================================
// Projections
// =============================================================================

impl Game {
    pub fn game_info_row(&self) -> GameInfoRow {
        let [referee_1, referee_2] = self.officials.referees.clone();
        let [linesmen_1, linesmen_2] = self.officials.linesmen.clone();
        GameInfoRow {
            game_id: self.game_id.get(),
            season: self.season,
            date: self.date.format("%Y-%m-%d").to_string(),
            away_team_name: self.away_team.name.clone(),
            away_team_abrv: self.away_team.abbreviation.clone(),
            away_team_id: self.away_team.id,
            away_team_goals: self.away_goals,
            home_team_name: self.home_team.name.clone(),
            home_team_abrv: self.home_team.abbreviation.clone(),
            home_team_id: self.home_team.id,
            home_team_goals: self.home_goals,
            venue: self.venue.clone(),
            venue_location: self.venue_location.clone(),
            referee_1,
            referee_2,
            linesmen_1,
            linesmen_2,
            home_coach: self.coaches.home.clone(),
            away_coach: self.coaches.away.clone(),
        }
    }

    pub fn player_rows(&self) -> Vec<PlayerRow> {
        self.players
            .iter()
            .map(|p| PlayerRow {
                game_id: self.game_id.get(),
                team_id: p.team_id,
                first_name: p.first_name.clone(),
                last_name: p.last_name.clone(),
                id: p.id,
                position: p.position.token(),
                sweater_number: p.sweater_number,
            })
            .collect()
    }

    pub fn play_rows(&self) -> Vec<PlayRow> {
        self.plays
            .iter()
            .map(|p| PlayRow {
                game_id: self.game_id.get(),
                n: p.sequence_number,
                event_type: p.event_type.token(),
                period: p.period,
                period_type: p.period_type.clone(),
                time_in_period: p.time_in_period.clone(),
                time_remaining: p.time_remaining.clone(),
                event_owner_team_id: p.event_owner_team_id,
                p1: p.p1,
                p2: p.p2,
                p3: p.p3,
                goalie: p.goalie,
                shot_type: encode(p.shot_type),
                x: p.x,
                y: p.y,
                reason: p.reason.clone(),
                penalty_duration: p.penalty_duration,
            })
            .collect()
    }
}

fn on_ice_cells(on_ice: &OnIce) -> [String; ON_ICE_SLOTS] {
    (*on_ice).map(|slot| match slot {
        IceSlot::Sweater(n) => n.to_string(),
        IceSlot::Empty => String::new(),
    })
}

impl HtmlPlay {
    pub fn row(&self) -> HtmlPlayRow {
        HtmlPlayRow {
            game_id: self.game_id.get(),
            n: self.n,
            period: self.period.clone(),
            strength: self.strength.clone(),
            time_elapsed: self.time_elapsed.clone(),
            event: encode(self.event_type),
            description: self.description.clone(),
            away_on_ice: on_ice_cells(&self.away_on_ice),
            home_on_ice: on_ice_cells(&self.home_on_ice),
        }
    }
}

pub fn html_play_rows(plays: &[HtmlPlay]) -> Vec<HtmlPlayRow> {
    plays.iter().map(HtmlPlay::row).collect()
}

impl ShiftInfo {
    pub fn rows(&self) -> Vec<ShiftRow> {
        self.shifts
            .iter()
            .map(|s| ShiftRow {
                game_id: self.game_id.get(),
                id: s.id,
                start_time: s.start_time.clone(),
                end_time: s.end_time.clone(),
                period: s.period,
                duration: s.duration.clone(),
                first_name: s.first_name.clone(),
                last_name: s.last_name.clone(),
                player_id: s.player_id,
                team_id: s.team_id,
                team_abbrev: s.team_abbrev.clone(),
            })
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::codec::EventType;
    use crate::data::models::GameId;

    /// Keys of a serialized row, in the order they were written.
    fn written_keys<R: Row>(row: &R) -> Vec<String> {
        let text = serde_json::to_string(row).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let mut keys: Vec<(usize, String)> = value
            .as_object()
            .unwrap()
            .keys()
            .map(|k| (text.find(&format!("\"{k}\":")).unwrap(), k.clone()))
            .collect();
        keys.sort();
        keys.into_iter().map(|(_, k)| k).collect()
    }

    fn html_play(event_type: Option<EventType>) -> HtmlPlay {
        let mut away = [IceSlot::Empty; ON_ICE_SLOTS];
        away[0] = IceSlot::Sweater(12);
        away[1] = IceSlot::Sweater(8);
        HtmlPlay {
            game_id: GameId::new(2023020001),
            n: 1,
            period: "1".into(),
            strength: "".into(),
            time_elapsed: "0:00".into(),
            event_type,
            description: "Period Start- Local time: 7:11 EDT".into(),
            away_on_ice: away,
            home_on_ice: [IceSlot::Empty; ON_ICE_SLOTS],
        }
    }

    #[test]
    fn test_html_row_columns_in_order() {
        let row = html_play(Some(EventType::PeriodStart)).row();
        assert_eq!(written_keys(&row), TableKind::HtmlPlays.columns());
    }

    #[test]
    fn test_html_row_empty_slots_are_empty_strings() {
        let value = serde_json::to_value(html_play(None).row()).unwrap();
        assert_eq!(value["away_on_ice_p1"], "12");
        assert_eq!(value["away_on_ice_p2"], "8");
        assert_eq!(value["away_on_ice_p3"], "");
        assert_eq!(value["home_on_ice_p9"], "");
        assert!(value["event"].is_null());
    }

    #[test]
    fn test_html_row_event_uses_canonical_token() {
        let row = html_play(Some(EventType::ShotOnGoal)).row();
        assert_eq!(row.event, Some("shot-on-goal"));
    }

    #[test]
    fn test_table_names_are_distinct() {
        let mut names: Vec<_> = TableKind::ALL.iter().map(|t| t.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 5);
        assert_eq!(HTML_PLAY_COLUMNS.len(), 7 + 2 * ON_ICE_SLOTS);
    }
}
