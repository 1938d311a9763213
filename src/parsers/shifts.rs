//! Shift-chart parser: `{stats_base}/shiftcharts?cayenneExp=gameId={id}`.

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::api::client::NhlClient;
use crate::data::fields::{nullable_str, required_array, required_int, required_str};
use crate::data::models::{GameId, Shift, ShiftInfo};
use crate::error::ParseError;

pub struct ShiftParser {
    client: Arc<NhlClient>,
    stats_base: String,
}

impl ShiftParser {
    pub fn new(client: Arc<NhlClient>, stats_base: &str) -> Self {
        Self {
            client,
            stats_base: stats_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, game_id: GameId) -> String {
        format!("{}/shiftcharts?cayenneExp=gameId={}", self.stats_base, game_id)
    }

    pub async fn parse(&self, game_id: GameId) -> Result<ShiftInfo, ParseError> {
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

        let info = parse_shifts(game_id, &doc)?;
        debug!(game_id = %game_id, shifts = info.shifts.len(), "Parsed shift chart");
        Ok(info)
    }
}

/// Map every `data[]` record to a [`Shift`], in feed order.
pub fn parse_shifts(game_id: GameId, doc: &Value) -> Result<ShiftInfo, ParseError> {
    let shifts = required_array(doc, &["data"])?
        .iter()
        .enumerate()
        .map(|(i, record)| parse_shift(record).map_err(|e| e.within(&format!("data[{i}]"))))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ShiftInfo { game_id, shifts })
}

fn parse_shift(record: &Value) -> Result<Shift, ParseError> {
    Ok(Shift {
        id: required_int(record, &["id"])?,
        start_time: required_str(record, &["startTime"])?,
        end_time: required_str(record, &["endTime"])?,
        period: required_int(record, &["period"])?,
        duration: nullable_str(record, &["duration"])?,
        first_name: required_str(record, &["firstName"])?,
        last_name: required_str(record, &["lastName"])?,
        player_id: required_int(record, &["playerId"])?,
        team_id: required_int(record, &["teamId"])?,
        team_abbrev: required_str(record, &["teamAbbrev"])?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> Value {
        json!({
            "id": 13178412,
            "detailCode": 0,
            "duration": "00:41",
            "endTime": "00:41",
            "eventNumber": 101,
            "firstName": "Auston",
            "gameId": 2023020204,
            "lastName": "Matthews",
            "period": 1,
            "playerId": 8479318,
            "shiftNumber": 1,
            "startTime": "00:00",
            "teamAbbrev": "TOR",
            "teamId": 10,
            "teamName": "Toronto Maple Leafs"
        })
    }

    #[test]
    fn test_shift_mapping() {
        let doc = json!({"data": [record()], "total": 1});
        let info = parse_shifts(GameId::new(2023020204), &doc).unwrap();
        assert_eq!(info.game_id, GameId::new(2023020204));
        assert_eq!(
            info.shifts,
            vec![Shift {
                id: 13178412,
                start_time: "00:00".into(),
                end_time: "00:41".into(),
                period: 1,
                duration: Some("00:41".into()),
                first_name: "Auston".into(),
                last_name: "Matthews".into(),
                player_id: 8479318,
                team_id: 10,
                team_abbrev: "TOR".into(),
            }]
        );
    }

    #[test]
    fn test_goal_record_with_null_duration_keeps_chart() {
        let mut goal = record();
        goal["id"] = json!(13178500);
        goal["typeCode"] = json!(505);
        goal["eventDescription"] = json!("EVG");
        goal["duration"] = Value::Null;
        let doc = json!({"data": [record(), goal], "total": 2});

        let info = parse_shifts(GameId::new(2023020204), &doc).unwrap();
        assert_eq!(info.shifts.len(), 2);
        assert_eq!(info.shifts[0].duration.as_deref(), Some("00:41"));
        assert_eq!(info.shifts[1].duration, None);

        let rows = serde_json::to_value(info.rows()).unwrap();
        assert!(rows[1]["duration"].is_null());
        assert_eq!(rows[1]["id"], 13178500);
    }

    #[test]
    fn test_missing_duration_key_fails() {
        let mut bad = record();
        bad.as_object_mut().unwrap().remove("duration");
        let doc = json!({"data": [record(), bad]});
        let err = parse_shifts(GameId::new(2023020204), &doc).unwrap_err();
        assert_eq!(err.to_string(), "missing required field `data[1].duration`");
    }

    #[test]
    fn test_empty_chart() {
        let info = parse_shifts(GameId::new(2023020204), &json!({"data": []})).unwrap();
        assert!(info.shifts.is_empty());
    }
}
