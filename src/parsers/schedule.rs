//! Daily schedule lookup: `{api_base}/schedule/{yyyy-mm-dd}`.
//!
//! The endpoint answers with a whole week; only the first day (the requested
//! one) is used.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::api::client::NhlClient;
use crate::api::errors::ApiError;
use crate::data::models::GameId;

pub const GAME_TYPE_REGULAR: u8 = 2;
pub const GAME_TYPE_PLAYOFF: u8 = 3;

/// A game listed on the schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledGame {
    pub game_id: GameId,
    pub date: NaiveDate,
    pub game_type: u8,
    pub away_team: String,
    pub home_team: String,
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleResponse {
    #[serde(default)]
    game_week: Vec<ScheduleDay>,
}

#[derive(Debug, Deserialize)]
struct ScheduleDay {
    date: NaiveDate,
    #[serde(default)]
    games: Vec<ScheduleEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleEntry {
    id: u64,
    game_type: u8,
    away_team: TeamRef,
    home_team: TeamRef,
}

#[derive(Debug, Deserialize)]
struct TeamRef {
    abbrev: String,
}

/// Games of the first schedule day, filtered by game type.
///
/// Regular-season games are always kept; playoff games only when
/// `only_reg_season` is false.
pub fn parse_schedule(doc: Value, only_reg_season: bool) -> Result<Vec<ScheduledGame>, ApiError> {
    let response: ScheduleResponse =
        serde_json::from_value(doc).map_err(|e| ApiError::Deserialization(e.to_string()))?;

    let Some(day) = response.game_week.into_iter().next() else {
        return Ok(Vec::new());
    };

    let games = day
        .games
        .into_iter()
        .filter(|g| match g.game_type {
            GAME_TYPE_REGULAR => true,
            GAME_TYPE_PLAYOFF => !only_reg_season,
            _ => false,
        })
        .map(|g| ScheduledGame {
            game_id: GameId::new(g.id),
            date: day.date,
            game_type: g.game_type,
            away_team: g.away_team.abbrev,
            home_team: g.home_team.abbrev,
        })
        .collect();

    Ok(games)
}

pub struct ScheduleClient {
    client: Arc<NhlClient>,
    api_base: String,
}

impl ScheduleClient {
    pub fn new(client: Arc<NhlClient>, api_base: &str) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, date: NaiveDate) -> String {
        format!("{}/schedule/{}", self.api_base, date.format("%Y-%m-%d"))
    }

    pub async fn games_on(
        &self,
        date: NaiveDate,
        only_reg_season: bool,
    ) -> Result<Vec<ScheduledGame>, ApiError> {
        let doc = self.client.get_json(&self.url(date)).await?;
        let games = parse_schedule(doc, only_reg_season)?;
        debug!(date = %date, games = games.len(), "Fetched schedule");
        Ok(games)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn week() -> Value {
        json!({
            "nextStartDate": "2024-04-27",
            "gameWeek": [
                {
                    "date": "2024-04-20",
                    "dayAbbrev": "SAT",
                    "games": [
                        {"id": 2023030111, "gameType": 3,
                         "awayTeam": {"id": 10, "abbrev": "TOR"},
                         "homeTeam": {"id": 6, "abbrev": "BOS"}},
                        {"id": 2023020999, "gameType": 2,
                         "awayTeam": {"id": 9, "abbrev": "OTT"},
                         "homeTeam": {"id": 8, "abbrev": "MTL"}},
                        {"id": 2023010001, "gameType": 1,
                         "awayTeam": {"id": 1, "abbrev": "NJD"},
                         "homeTeam": {"id": 2, "abbrev": "NYI"}}
                    ]
                },
                {"date": "2024-04-21", "games": [
                    {"id": 2023030112, "gameType": 3,
                     "awayTeam": {"abbrev": "TOR"}, "homeTeam": {"abbrev": "BOS"}}
                ]}
            ]
        })
    }

    #[test]
    fn test_regular_season_only() {
        let games = parse_schedule(week(), true).unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].game_id, GameId::new(2023020999));
        assert_eq!(games[0].date, NaiveDate::from_ymd_opt(2024, 4, 20).unwrap());
    }

    #[test]
    fn test_playoffs_included_and_sides_kept() {
        let games = parse_schedule(week(), false).unwrap();
        let ids: Vec<u64> = games.iter().map(|g| g.game_id.get()).collect();
        assert_eq!(ids, vec![2023030111, 2023020999]);
        assert_eq!(games[0].away_team, "TOR");
        assert_eq!(games[0].home_team, "BOS");
    }

    #[test]
    fn test_empty_week() {
        assert!(parse_schedule(json!({"gameWeek": []}), false).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_schedule() {
        let err = parse_schedule(json!({"gameWeek": [{"date": "soon"}]}), false).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn test_url() {
        let client = Arc::new(NhlClient::with_defaults().unwrap());
        let schedule = ScheduleClient::new(client, "https://api-web.nhle.com/v1");
        assert_eq!(
            schedule.url(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()),
            "https://api-web.nhle.com/v1/schedule/2024-01-05"
        );
    }
}
