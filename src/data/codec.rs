//! Token codecs for the closed enum families.
//!
//! Every family has one canonical token vocabulary (the game-center JSON
//! one) used for both decoding and encoding. The HTML report spells event
//! types differently, so it gets its own decode table that feeds the same
//! `EventType`; it is never merged into the JSON table.

use std::fmt;
use thiserror::Error;

/// A token outside the known vocabulary of an enum family.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized {family} token: {token:?}")]
pub struct UnrecognizedToken {
    pub family: &'static str,
    pub token: String,
}

/// Bidirectional mapping between an enum and its canonical tokens.
pub trait TokenCodec: Sized + Copy + PartialEq + 'static {
    /// Family name used in error messages.
    const FAMILY: &'static str;
    /// Every variant, in declaration order.
    const ALL: &'static [Self];

    fn token(self) -> &'static str;

    fn decode(token: &str) -> Result<Self, UnrecognizedToken> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.token() == token)
            .ok_or_else(|| UnrecognizedToken {
                family: Self::FAMILY,
                token: token.to_string(),
            })
    }
}

/// Shared encode path: absent stays absent.
pub fn encode<T: TokenCodec>(value: Option<T>) -> Option<&'static str> {
    value.map(TokenCodec::token)
}

macro_rules! token_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $family:literal {
            $($variant:ident => $token:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl TokenCodec for $name {
            const FAMILY: &'static str = $family;
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn token(self) -> &'static str {
                match self {
                    $(Self::$variant => $token),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.token())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnrecognizedToken;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <Self as TokenCodec>::decode(s)
            }
        }
    };
}

token_enum! {
    /// Kind of a play-by-play event.
    EventType, "event type" {
        PeriodStart => "period-start",
        Faceoff => "faceoff",
        ShotOnGoal => "shot-on-goal",
        Stoppage => "stoppage",
        MissedShot => "missed-shot",
        Hit => "hit",
        BlockedShot => "blocked-shot",
        Giveaway => "giveaway",
        Goal => "goal",
        Takeaway => "takeaway",
        Penalty => "penalty",
        DelayedPenalty => "delayed-penalty",
        PeriodEnd => "period-end",
        GameEnd => "game-end",
        ShootoutComplete => "shootout-complete",
        FailedShotAttempt => "failed-shot-attempt",
    }
}

token_enum! {
    ShotType, "shot type" {
        Wrist => "wrist",
        Slap => "slap",
        Backhand => "backhand",
        Snap => "snap",
        TipIn => "tip-in",
        Deflected => "deflected",
        WrapAround => "wrap-around",
        BetweenLegs => "between-legs",
        Bat => "bat",
        Poke => "poke",
        Cradle => "cradle",
    }
}

token_enum! {
    PlayerPosition, "player position" {
        C => "C",
        L => "L",
        R => "R",
        D => "D",
        G => "G",
    }
}

token_enum! {
    /// Rink zone relative to the event owner. Not read by any parser yet.
    ZoneCode, "zone code" {
        Offensive => "O",
        Defensive => "D",
        Neutral => "N",
    }
}

// =============================================================================
// HTML report vocabulary
// =============================================================================

/// Result of decoding an HTML report event token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlEvent {
    /// Token maps to an event type.
    Event(EventType),
    /// Known token that carries no play-by-play event (anthem, reviews...).
    NoEvent,
    /// Token outside the report vocabulary.
    Unrecognized(String),
}

impl HtmlEvent {
    /// Collapse to the model's `Option<EventType>`, failing on unknown tokens.
    pub fn into_result(self) -> Result<Option<EventType>, UnrecognizedToken> {
        match self {
            Self::Event(e) => Ok(Some(e)),
            Self::NoEvent => Ok(None),
            Self::Unrecognized(token) => Err(UnrecognizedToken {
                family: "html event type",
                token,
            }),
        }
    }
}

impl EventType {
    /// Decode a game-center `typeDescKey`.
    pub fn from_json_token(token: &str) -> Result<Self, UnrecognizedToken> {
        <Self as TokenCodec>::decode(token)
    }

    /// Decode the event column of the HTML report.
    pub fn from_html_token(token: &str) -> HtmlEvent {
        let event = match token {
            "PSTR" => Self::PeriodStart,
            "FAC" => Self::Faceoff,
            "SHOT" => Self::ShotOnGoal,
            "STOP" => Self::Stoppage,
            "MISS" => Self::MissedShot,
            "HIT" => Self::Hit,
            "BLOCK" => Self::BlockedShot,
            "GIVE" => Self::Giveaway,
            "TAKE" => Self::Takeaway,
            "GOAL" => Self::Goal,
            "PENL" => Self::Penalty,
            "DELPEN" => Self::DelayedPenalty,
            "PEND" => Self::PeriodEnd,
            "GEND" => Self::GameEnd,
            "SOC" => Self::ShootoutComplete,
            "PGSTR" | "PGEND" | "ANTHEM" | "GOFF" | "EISTR" | "EIEND" | "EGT" | "EGPID"
            | "CHL" | "PBOX" | "SPC" => return HtmlEvent::NoEvent,
            other => return HtmlEvent::Unrecognized(other.to_string()),
        };
        HtmlEvent::Event(event)
    }
}

// =============================================================================
// Tests
// =============================================================================
