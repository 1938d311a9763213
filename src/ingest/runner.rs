//! Batch ingestion.
//!
//! Walks a date range, looks up the games of each day and runs the three
//! parsers for every game on tokio tasks bounded by a semaphore. Each
//! parser's failure is logged with the game id and counted; it never stops
//! the batch, and it never stops the other two parsers of the same game.
//! Rows are written to the sink on the driving task only.

use chrono::NaiveDate;
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use super::sink::{RowSink, SinkError};
use crate::api::client::NhlClient;
use crate::api::errors::ApiError;
use crate::config::Settings;
use crate::data::models::{Game, GameId, HtmlPlay, ShiftInfo};
use crate::data::rows::html_play_rows;
use crate::error::ParseError;
use crate::parsers::{HtmlPbpParser, JsonPbpParser, ScheduleClient, ScheduledGame, ShiftParser};

// =============================================================================
// Game source
// =============================================================================

/// Everything the runner needs to fetch.
pub trait GameSource: Send + Sync + 'static {
    fn games_on(
        &self,
        date: NaiveDate,
        only_reg_season: bool,
    ) -> impl Future<Output = Result<Vec<ScheduledGame>, ApiError>> + Send;

    fn json_game(&self, game_id: GameId) -> impl Future<Output = Result<Game, ParseError>> + Send;

    fn html_plays(
        &self,
        game_id: GameId,
    ) -> impl Future<Output = Result<Vec<HtmlPlay>, ParseError>> + Send;

    fn shifts(&self, game_id: GameId) -> impl Future<Output = Result<ShiftInfo, ParseError>> + Send;
}

/// The live NHL endpoints.
pub struct NhlSource {
    schedule: ScheduleClient,
    json_pbp: JsonPbpParser,
    html_pbp: HtmlPbpParser,
    shifts: ShiftParser,
}

impl NhlSource {
    pub fn new(client: Arc<NhlClient>, settings: &Settings) -> Self {
        Self {
            schedule: ScheduleClient::new(client.clone(), &settings.api_base_url),
            json_pbp: JsonPbpParser::new(client.clone(), &settings.api_base_url),
            html_pbp: HtmlPbpParser::new(client.clone(), &settings.reports_base_url),
            shifts: ShiftParser::new(client, &settings.stats_base_url),
        }
    }
}

impl GameSource for NhlSource {
    async fn games_on(
        &self,
        date: NaiveDate,
        only_reg_season: bool,
    ) -> Result<Vec<ScheduledGame>, ApiError> {
        self.schedule.games_on(date, only_reg_season).await
    }

    async fn json_game(&self, game_id: GameId) -> Result<Game, ParseError> {
        self.json_pbp.parse(game_id).await
    }

    async fn html_plays(&self, game_id: GameId) -> Result<Vec<HtmlPlay>, ParseError> {
        self.html_pbp.parse(game_id).await
    }

    async fn shifts(&self, game_id: GameId) -> Result<ShiftInfo, ParseError> {
        self.shifts.parse(game_id).await
    }
}

// =============================================================================
// Summary
// =============================================================================

/// Counters for one ingest run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub dates: usize,
    pub schedule_failures: usize,
    pub games: usize,
    pub json_failures: usize,
    pub html_failures: usize,
    pub shift_failures: usize,
    /// Games whose task died before producing any outcome.
    pub aborted_games: usize,
}

impl IngestSummary {
    pub fn merge(&mut self, other: &IngestSummary) {
        self.dates += other.dates;
        self.schedule_failures += other.schedule_failures;
        self.games += other.games;
        self.json_failures += other.json_failures;
        self.html_failures += other.html_failures;
        self.shift_failures += other.shift_failures;
        self.aborted_games += other.aborted_games;
    }

    pub fn parse_failures(&self) -> usize {
        self.json_failures + self.html_failures + self.shift_failures
    }

    pub fn is_clean(&self) -> bool {
        self.parse_failures() == 0 && self.schedule_failures == 0 && self.aborted_games == 0
    }
}

struct GameOutcome {
    game_id: GameId,
    json: Result<Game, ParseError>,
    html: Result<Vec<HtmlPlay>, ParseError>,
    shifts: Result<ShiftInfo, ParseError>,
}

fn log_failure(game_id: GameId, parser: &str, e: &ParseError) {
    warn!(
        game_id = %game_id,
        parser = parser,
        kind = e.kind(),
        error = %e,
        "Parser failed for game"
    );
}

// =============================================================================
// Ingestor
// =============================================================================

pub struct Ingestor<S: GameSource> {
    source: Arc<S>,
    max_concurrent_games: usize,
    only_reg_season: bool,
}

impl<S: GameSource> Ingestor<S> {
    pub fn new(source: S, max_concurrent_games: usize, only_reg_season: bool) -> Self {
        Self {
            source: Arc::new(source),
            max_concurrent_games: max_concurrent_games.max(1),
            only_reg_season,
        }
    }

    /// Ingest every game scheduled between `start` and `end`, inclusive.
    pub async fn run_range<K: RowSink>(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        sink: &mut K,
    ) -> Result<IngestSummary, SinkError> {
        let mut summary = IngestSummary::default();

        for date in start.iter_days().take_while(|d| *d <= end) {
            summary.dates += 1;

            let games = match self.source.games_on(date, self.only_reg_season).await {
                Ok(games) => games,
                Err(e) => {
                    warn!(date = %date, error = %e, "Schedule lookup failed, skipping date");
                    summary.schedule_failures += 1;
                    continue;
                }
            };

            info!(date = %date, games = games.len(), "Ingesting games");
            let ids = games.into_iter().map(|g| g.game_id).collect();
            summary.merge(&self.run_games(ids, sink).await?);
        }

        Ok(summary)
    }

    /// Ingest the given games. Rows are written in `game_ids` order.
    pub async fn run_games<K: RowSink>(
        &self,
        game_ids: Vec<GameId>,
        sink: &mut K,
    ) -> Result<IngestSummary, SinkError> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_games));
        let mut summary = IngestSummary::default();

        let tasks: Vec<_> = game_ids
            .iter()
            .map(|&game_id| {
                let source = self.source.clone();
                let sem = semaphore.clone();
                tokio::spawn(async move {
                    let _permit = sem.acquire_owned().await.ok()?;
                    let (json, html, shifts) = tokio::join!(
                        source.json_game(game_id),
                        source.html_plays(game_id),
                        source.shifts(game_id),
                    );
                    Some(GameOutcome {
                        game_id,
                        json,
                        html,
                        shifts,
                    })
                })
            })
            .collect();

        for (game_id, result) in game_ids.iter().zip(join_all(tasks).await) {
            summary.games += 1;
            let outcome = match result {
                Ok(Some(outcome)) => outcome,
                Ok(None) => {
                    error!(game_id = %game_id, "Semaphore closed before game ran");
                    summary.aborted_games += 1;
                    continue;
                }
                Err(e) => {
                    error!(game_id = %game_id, error = %e, "Game task panicked");
                    summary.aborted_games += 1;
                    continue;
                }
            };
            self.write_outcome(outcome, sink, &mut summary)?;
        }

        Ok(summary)
    }

    fn write_outcome<K: RowSink>(
        &self,
        outcome: GameOutcome,
        sink: &mut K,
        summary: &mut IngestSummary,
    ) -> Result<(), SinkError> {
        let game_id = outcome.game_id;

        match outcome.json {
            Ok(game) => {
                sink.write_rows(&[game.game_info_row()])?;
                sink.write_rows(&game.player_rows())?;
                sink.write_rows(&game.play_rows())?;
            }
            Err(e) => {
                log_failure(game_id, "json_pbp", &e);
                summary.json_failures += 1;
            }
        }

        match outcome.html {
            Ok(plays) => sink.write_rows(&html_play_rows(&plays))?,
            Err(e) => {
                log_failure(game_id, "html_pbp", &e);
                summary.html_failures += 1;
            }
        }

        match outcome.shifts {
            Ok(info) => sink.write_rows(&info.rows())?,
            Err(e) => {
                log_failure(game_id, "shifts", &e);
                summary.shift_failures += 1;
            }
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
