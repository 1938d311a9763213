//! Game-center play-by-play parser.
//!
//! Fetches `{api_base}/gamecenter/{id}/play-by-play` and builds a fully
//! populated [`Game`]. The parse is atomic: any failure in a required
//! field, roster entry or play aborts the whole game.

use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::client::NhlClient;
use crate::data::codec::{EventType, PlayerPosition, TokenCodec};
use crate::data::fields::{lookup, optional_str, required_array, required_int, required_str};
use crate::data::models::{Coaches, Game, GameId, Officials, Play, Player, Team};
use crate::data::resolver::resolve;
use crate::error::ParseError;

pub struct JsonPbpParser {
    client: Arc<NhlClient>,
    api_base: String,
}

impl JsonPbpParser {
    pub fn new(client: Arc<NhlClient>, api_base: &str) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, game_id: GameId) -> String {
        format!("{}/gamecenter/{}/play-by-play", self.api_base, game_id)
    }

    /// Fetch and parse one game.
    pub async fn parse(&self, game_id: GameId) -> Result<Game, ParseError> {
        let url = self.url(game_id);
        let doc = self
            .client
            .get_json(&url)
            .await
            .map_err(|source| ParseError::SourceNotFound {
                game_id,
                url: url.clone(),
                source,
            })?;

        let game = parse_game(&doc)?;
        if game.game_id != game_id {
            warn!(requested = %game_id, returned = %game.game_id, "Game-center returned a different game id");
        }
        debug!(
            game_id = %game.game_id,
            players = game.players.len(),
            plays = game.plays.len(),
            "Parsed game-center play-by-play"
        );
        Ok(game)
    }
}

// =============================================================================
// Document parsing
// =============================================================================

/// Build a [`Game`] from a game-center play-by-play document.
pub fn parse_game(doc: &Value) -> Result<Game, ParseError> {
    let game_id = GameId::new(required_int(doc, &["id"])?);
    let season = required_int(doc, &["season"])?;
    let date_text = required_str(doc, &["gameDate"])?;
    let date = NaiveDate::parse_from_str(&date_text, "%Y-%m-%d")
        .map_err(|e| ParseError::malformed("gameDate", e.to_string()))?;

    let (away_team, away_goals) = parse_team(doc, "awayTeam")?;
    let (home_team, home_goals) = parse_team(doc, "homeTeam")?;

    let players = required_array(doc, &["rosterSpots"])?
        .iter()
        .enumerate()
        .map(|(i, entry)| parse_player(entry).map_err(|e| e.within(&format!("rosterSpots[{i}]"))))
        .collect::<Result<Vec<_>, _>>()?;

    let plays = required_array(doc, &["plays"])?
        .iter()
        .enumerate()
        .map(|(i, entry)| parse_play(i, entry).map_err(|e| e.within(&format!("plays[{i}]"))))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Game {
        game_id,
        season,
        date,
        away_team,
        home_team,
        away_goals,
        home_goals,
        venue: required_str(doc, &["venue", "default"])?,
        venue_location: required_str(doc, &["venueLocation", "default"])?,
        officials: parse_officials(doc),
        coaches: parse_coaches(doc),
        players,
        plays,
    })
}

fn parse_team(doc: &Value, side: &str) -> Result<(Team, u32), ParseError> {
    let team = Team {
        name: required_str(doc, &[side, "commonName", "default"])?,
        abbreviation: required_str(doc, &[side, "abbrev"])?,
        id: required_int(doc, &[side, "id"])?,
    };
    let goals = required_int(doc, &[side, "score"])?;
    Ok((team, goals))
}

/// `index`-th official of `role`, or absent.
fn official(doc: &Value, role: &str, index: usize) -> Option<String> {
    lookup(doc, &["summary", "gameInfo", role])
        .and_then(|list| list.get(index))
        .and_then(|entry| optional_str(entry, &["default"]))
}

fn parse_officials(doc: &Value) -> Officials {
    Officials {
        referees: [official(doc, "referees", 0), official(doc, "referees", 1)],
        linesmen: [official(doc, "linesmen", 0), official(doc, "linesmen", 1)],
    }
}

fn parse_coaches(doc: &Value) -> Coaches {
    Coaches {
        home: optional_str(doc, &["summary", "gameInfo", "homeTeam", "headCoach", "default"]),
        away: optional_str(doc, &["summary", "gameInfo", "awayTeam", "headCoach", "default"]),
    }
}

fn parse_player(entry: &Value) -> Result<Player, ParseError> {
    let position = required_str(entry, &["positionCode"])?;
    Ok(Player {
        team_id: required_int(entry, &["teamId"])?,
        first_name: required_str(entry, &["firstName", "default"])?,
        last_name: required_str(entry, &["lastName", "default"])?,
        id: required_int(entry, &["playerId"])?,
        position: PlayerPosition::decode(&position)?,
        sweater_number: required_int(entry, &["sweaterNumber"])?,
    })
}

fn parse_play(sequence_number: usize, entry: &Value) -> Result<Play, ParseError> {
    let event_type = EventType::from_json_token(&required_str(entry, &["typeDescKey"])?)?;
    let slots = resolve(entry.get("details").and_then(Value::as_object))?;

    Ok(Play {
        sequence_number,
        event_type,
        period: required_int(entry, &["periodDescriptor", "number"])?,
        period_type: required_str(entry, &["periodDescriptor", "periodType"])?,
        time_in_period: required_str(entry, &["timeInPeriod"])?,
        time_remaining: required_str(entry, &["timeRemaining"])?,
        event_owner_team_id: slots.event_owner_team_id,
        p1: slots.p1,
        p2: slots.p2,
        p3: slots.p3,
        goalie: slots.goalie,
        shot_type: slots.shot_type,
        x: slots.x,
        y: slots.y,
        reason: slots.reason,
        penalty_duration: slots.penalty_duration,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::errors::ApiError;
    use serde_json::json;

    fn minimal_doc() -> Value {
        json!({
            "id": 2023020204,
            "season": 20232024,
            "gameDate": "2023-11-11",
            "venue": {"default": "Scotiabank Arena"},
            "venueLocation": {"default": "Toronto"},
            "awayTeam": {"id": 10, "commonName": {"default": "Maple Leafs"}, "abbrev": "TOR", "score": 4},
            "homeTeam": {"id": 9, "commonName": {"default": "Senators"}, "abbrev": "OTT", "score": 3},
            "rosterSpots": [],
            "plays": []
        })
    }

    #[test]
    fn test_officials_are_independently_optional() {
        let mut doc = minimal_doc();
        doc["summary"] = json!({
            "gameInfo": {
                "referees": [{"default": "Wes McCauley"}],
                "linesmen": [{"default": "Devin Berg"}, {"default": "Ryan Gibbons"}],
                "homeTeam": {"headCoach": {"default": "D.J. Smith"}}
            }
        });
        let game = parse_game(&doc).unwrap();
        assert_eq!(game.officials.referees[0].as_deref(), Some("Wes McCauley"));
        assert_eq!(game.officials.referees[1], None);
        assert_eq!(game.officials.linesmen[1].as_deref(), Some("Ryan Gibbons"));
        assert_eq!(game.coaches.home.as_deref(), Some("D.J. Smith"));
        assert_eq!(game.coaches.away, None);
    }

    #[test]
    fn test_missing_summary_is_not_an_error() {
        let game = parse_game(&minimal_doc()).unwrap();
        assert_eq!(game.officials, Officials::default());
        assert_eq!(game.coaches, Coaches::default());
    }

    #[test]
    fn test_missing_venue_fails() {
        let mut doc = minimal_doc();
        doc.as_object_mut().unwrap().remove("venue");
        let err = parse_game(&doc).unwrap_err();
        assert_eq!(err.to_string(), "missing required field `venue.default`");
    }

    #[test]
    fn test_bad_game_date_is_malformed() {
        let mut doc = minimal_doc();
        doc["gameDate"] = json!("11/11/2023");
        assert!(matches!(
            parse_game(&doc),
            Err(ParseError::MalformedField { ref field, .. }) if field == "gameDate"
        ));
    }

    #[test]
    fn test_unknown_position_is_fatal_and_located() {
        let mut doc = minimal_doc();
        doc["rosterSpots"] = json!([{
            "teamId": 10, "playerId": 8478483, "sweaterNumber": 16,
            "positionCode": "F",
            "firstName": {"default": "Mitchell"}, "lastName": {"default": "Marner"}
        }]);
        match parse_game(&doc) {
            Err(ParseError::UnrecognizedToken(t)) => assert_eq!(t.token, "F"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_play_field_error_names_play_index() {
        let mut doc = minimal_doc();
        doc["plays"] = json!([
            {"typeDescKey": "period-start", "periodDescriptor": {"number": 1, "periodType": "REG"},
             "timeInPeriod": "00:00", "timeRemaining": "20:00"},
            {"typeDescKey": "faceoff", "periodDescriptor": {"number": 1, "periodType": "REG"},
             "timeInPeriod": "00:00"}
        ]);
        let err = parse_game(&doc).unwrap_err();
        assert_eq!(err.to_string(), "missing required field `plays[1].timeRemaining`");
    }

    #[test]
    fn test_url() {
        let client = Arc::new(NhlClient::with_defaults().unwrap());
        let parser = JsonPbpParser::new(client, "https://api-web.nhle.com/v1/");
        assert_eq!(
            parser.url(GameId::new(2023020204)),
            "https://api-web.nhle.com/v1/gamecenter/2023020204/play-by-play"
        );
    }

    #[tokio::test]
    async fn test_unreachable_source_is_source_not_found() {
        // Port 1 on loopback refuses connections.
        let client = Arc::new(NhlClient::new(100, 1, 5).unwrap());
        let parser = JsonPbpParser::new(client, "http://127.0.0.1:1/v1");

        let err = parser.parse(GameId::new(2023020204)).await.unwrap_err();
        assert_eq!(err.kind(), "source_not_found");
        match err {
            ParseError::SourceNotFound { game_id, url, source } => {
                assert_eq!(game_id, GameId::new(2023020204));
                assert_eq!(url, "http://127.0.0.1:1/v1/gamecenter/2023020204/play-by-play");
                assert!(matches!(source, ApiError::MaxRetriesExceeded { attempts: 1, .. }));
            }
            other => panic!("expected SourceNotFound, got {other:?}"),
        }
    }
}
