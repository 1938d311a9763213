//! Parse failure taxonomy.
//!
//! A `ParseError` always aborts the whole parse of one game; the batch
//! runner logs it with the game id and moves on.

use thiserror::Error;

use crate::api::errors::ApiError;
use crate::data::codec::UnrecognizedToken;
use crate::data::models::GameId;

#[derive(Error, Debug)]
pub enum ParseError {
    /// Fetch failed or the body was not a readable document.
    #[error("source for game {game_id} not found ({url}): {source}")]
    SourceNotFound {
        game_id: GameId,
        url: String,
        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    UnrecognizedToken(#[from] UnrecognizedToken),

    #[error("missing required field `{field}`")]
    MissingRequiredField { field: String },

    /// Field is present but does not have the expected shape.
    #[error("malformed field `{field}`: {reason}")]
    MalformedField { field: String, reason: String },
}

impl ParseError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            field: field.into(),
        }
    }

    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Prefix the field path of a field error, e.g. `rosterSpots[3]`.
    pub fn within(self, prefix: &str) -> Self {
        match self {
            Self::MissingRequiredField { field } => Self::MissingRequiredField {
                field: format!("{prefix}.{field}"),
            },
            Self::MalformedField { field, reason } => Self::MalformedField {
                field: format!("{prefix}.{field}"),
                reason,
            },
            other => other,
        }
    }

    /// Short machine-friendly label, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceNotFound { .. } => "source_not_found",
            Self::UnrecognizedToken(_) => "unrecognized_token",
            Self::MissingRequiredField { .. } => "missing_required_field",
            Self::MalformedField { .. } => "malformed_field",
        }
    }
}
