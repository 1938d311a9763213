//! Library entrypoint for nhl-pbp.
//!
//! Normalizes NHL play-by-play data from three public sources (the
//! game-center JSON feed, the legacy HTML report and the shift-chart feed)
//! into one entity model and five flat tables.

pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod ingest;
pub mod parsers;
