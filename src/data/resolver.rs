//! Canonical field resolver for game-center `details` bags.
//!
//! Each event type carries its own set of keys (`shootingPlayerId` on a
//! shot, `hittingPlayerId` on a hit, ...). The resolver collapses them into
//! the generic slots of [`Play`](super::models::Play) through a declared,
//! ordered candidate table: for each slot the first candidate key present in
//! the bag wins, and a slot with no present candidate is absent.

use serde_json::{Map, Value};

use super::codec::{ShotType, TokenCodec};
use super::fields::to_int;
use crate::error::ParseError;

/// A generic participant/attribute slot of a play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    P1,
    P2,
    P3,
    Goalie,
    X,
    Y,
    ShotType,
    Reason,
    PenaltyDuration,
    EventOwnerTeamId,
}

/// Candidate source keys per slot, highest priority first.
pub const SLOT_CANDIDATES: &[(Slot, &[&str])] = &[
    (
        Slot::P1,
        &[
            "winningPlayerId",
            "shootingPlayerId",
            "hittingPlayerId",
            "playerId",
            "scoringPlayerId",
            "committedByPlayerId",
        ],
    ),
    (
        Slot::P2,
        &[
            "losingPlayerId",
            "hitteePlayerId",
            "blockingPlayerId",
            "assist1PlayerId",
            "drawnByPlayerId",
        ],
    ),
    (Slot::P3, &["assist2PlayerId"]),
    (Slot::Goalie, &["goalieInNetId"]),
    (Slot::X, &["xCoord"]),
    (Slot::Y, &["yCoord"]),
    (Slot::ShotType, &["shotType"]),
    (Slot::Reason, &["reason"]),
    (Slot::PenaltyDuration, &["duration"]),
    (Slot::EventOwnerTeamId, &["eventOwnerTeamId"]),
];

impl Slot {
    /// Ordered candidate keys for this slot.
    pub fn candidates(self) -> &'static [&'static str] {
        SLOT_CANDIDATES
            .iter()
            .find(|(slot, _)| *slot == self)
            .map(|(_, keys)| *keys)
            .unwrap_or(&[])
    }
}

/// Slots resolved from one play's `details` bag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedSlots {
    pub p1: Option<i64>,
    pub p2: Option<i64>,
    pub p3: Option<i64>,
    pub goalie: Option<i64>,
    pub x: Option<i64>,
    pub y: Option<i64>,
    pub shot_type: Option<ShotType>,
    pub reason: Option<String>,
    pub penalty_duration: Option<i64>,
    pub event_owner_team_id: Option<i64>,
}

/// First candidate key of `slot` present in `bag`, with its value.
pub fn pick(bag: &Map<String, Value>, slot: Slot) -> Option<(&'static str, &Value)> {
    slot.candidates()
        .iter()
        .find_map(|key| bag.get(*key).filter(|v| !v.is_null()).map(|v| (*key, v)))
}

fn int_slot(bag: &Map<String, Value>, slot: Slot) -> Result<Option<i64>, ParseError> {
    pick(bag, slot)
        .map(|(key, value)| to_int(value, &format!("details.{key}")))
        .transpose()
}

/// Resolve every slot. A missing bag resolves to all-absent.
///
/// Fails when the winning key holds a value of the wrong shape (a
/// non-integer id, an unknown shot type).
pub fn resolve(details: Option<&Map<String, Value>>) -> Result<ResolvedSlots, ParseError> {
    let Some(bag) = details else {
        return Ok(ResolvedSlots::default());
    };

    let shot_type = match pick(bag, Slot::ShotType) {
        Some((key, value)) => {
            let token = value.as_str().ok_or_else(|| {
                ParseError::malformed(format!("details.{key}"), "expected string")
            })?;
            Some(ShotType::decode(token)?)
        }
        None => None,
    };

    let reason = match pick(bag, Slot::Reason) {
        Some((_, Value::String(s))) => Some(s.clone()),
        Some((key, other)) => {
            return Err(ParseError::malformed(
                format!("details.{key}"),
                format!("expected string, got {other}"),
            ))
        }
        None => None,
    };

    Ok(ResolvedSlots {
        p1: int_slot(bag, Slot::P1)?,
        p2: int_slot(bag, Slot::P2)?,
        p3: int_slot(bag, Slot::P3)?,
        goalie: int_slot(bag, Slot::Goalie)?,
        x: int_slot(bag, Slot::X)?,
        y: int_slot(bag, Slot::Y)?,
        shot_type,
        reason,
        penalty_duration: int_slot(bag, Slot::PenaltyDuration)?,
        event_owner_team_id: int_slot(bag, Slot::EventOwnerTeamId)?,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_shooter_outranks_generic_player_id() {
        let details = bag(json!({"playerId": 1, "shootingPlayerId": 2}));
        let slots = resolve(Some(&details)).unwrap();
        assert_eq!(slots.p1, Some(2));
    }

    #[test]
    fn test_faceoff_slots() {
        let details = bag(json!({
            "eventOwnerTeamId": 10,
            "losingPlayerId": 8478402,
            "winningPlayerId": 8477939,
            "xCoord": 0,
            "yCoord": 0,
            "zoneCode": "N"
        }));
        let slots = resolve(Some(&details)).unwrap();
        assert_eq!(slots.p1, Some(8477939));
        assert_eq!(slots.p2, Some(8478402));
        assert_eq!(slots.x, Some(0));
        assert_eq!(slots.y, Some(0));
        assert_eq!(slots.event_owner_team_id, Some(10));
        assert_eq!(slots.p3, None);
        assert_eq!(slots.goalie, None);
    }

    #[test]
    fn test_penalty_slots() {
        let details = bag(json!({
            "committedByPlayerId": 8476453,
            "drawnByPlayerId": 8479318,
            "descKey": "tripping",
            "duration": 2,
            "reason": "tripping",
            "typeCode": "MIN"
        }));
        let slots = resolve(Some(&details)).unwrap();
        assert_eq!(slots.p1, Some(8476453));
        assert_eq!(slots.p2, Some(8479318));
        assert_eq!(slots.reason.as_deref(), Some("tripping"));
        assert_eq!(slots.penalty_duration, Some(2));
    }

    #[test]
    fn test_no_recognized_keys_is_absent_not_zero() {
        let details = bag(json!({"zoneCode": "O", "secondaryReason": "tv-timeout"}));
        assert_eq!(resolve(Some(&details)).unwrap(), ResolvedSlots::default());
        assert_eq!(resolve(None).unwrap().p1, None);
    }

    #[test]
    fn test_null_value_falls_through_to_next_candidate() {
        let details = bag(json!({"winningPlayerId": null, "shootingPlayerId": 5}));
        assert_eq!(resolve(Some(&details)).unwrap().p1, Some(5));
    }

    #[test]
    fn test_shot_type_decoded() {
        let details = bag(json!({"shotType": "tip-in"}));
        assert_eq!(resolve(Some(&details)).unwrap().shot_type, Some(ShotType::TipIn));
    }

    #[test]
    fn test_unknown_shot_type_fails() {
        let details = bag(json!({"shotType": "slapshot"}));
        assert!(matches!(
            resolve(Some(&details)),
            Err(ParseError::UnrecognizedToken(_))
        ));
    }

    #[test]
    fn test_non_integer_id_fails() {
        let details = bag(json!({"hittingPlayerId": "n/a"}));
        let err = resolve(Some(&details)).unwrap_err();
        assert!(err.to_string().contains("details.hittingPlayerId"));
    }

    #[test]
    fn test_every_slot_has_candidates() {
        for (slot, keys) in SLOT_CANDIDATES {
            assert!(!keys.is_empty(), "{slot:?} has no candidates");
            assert_eq!(slot.candidates(), *keys);
        }
        assert_eq!(Slot::P1.candidates()[0], "winningPlayerId");
        assert_eq!(Slot::P1.candidates().last(), Some(&"committedByPlayerId"));
    }
}
