//! HTML play-by-play report parser.
//!
//! The legacy report at `{reports_base}/{season}/PL{suffix}.HTM` is one big
//! table per printed page. Event rows carry an `evenColor`/`oddColor` class
//! and eight positional cells; there are no usable header names, so column
//! position is the only signal. That contract lives in [`ColumnLayout`] and
//! [`RowTokenizer`] and nowhere else.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

use crate::api::client::NhlClient;
use crate::data::codec::EventType;
use crate::data::models::{GameId, HtmlPlay, IceSlot, OnIce, ON_ICE_SLOTS};
use crate::error::ParseError;

static PAGE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".tablewidth").expect("valid selector"));
static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
static ROW_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(even|odd)Color").expect("valid regex"));
static CLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]?[0-9]:[0-9][0-9]").expect("valid regex"));
static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid regex"));

// =============================================================================
// Row tokenizer
// =============================================================================

/// Cell index of each report column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub n: usize,
    pub period: usize,
    pub strength: usize,
    pub time: usize,
    pub event: usize,
    pub description: usize,
    pub away_on_ice: usize,
    pub home_on_ice: usize,
}

impl ColumnLayout {
    /// Layout of the reports published since 2007-08.
    pub const STANDARD: Self = Self {
        n: 0,
        period: 1,
        strength: 2,
        time: 3,
        event: 4,
        description: 5,
        away_on_ice: 6,
        home_on_ice: 7,
    };

    /// Minimum number of cells a row needs.
    pub fn width(&self) -> usize {
        [
            self.n,
            self.period,
            self.strength,
            self.time,
            self.event,
            self.description,
            self.away_on_ice,
            self.home_on_ice,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Cell contents of one event row, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub n: String,
    pub period: String,
    pub strength: String,
    /// Full markup of the time cell; elapsed and remaining are separated by `<br>`.
    pub time_markup: String,
    pub event: String,
    pub description: String,
    pub away_on_ice: String,
    pub home_on_ice: String,
}

/// Splits a report `<tr>` into a [`RawRow`] according to a [`ColumnLayout`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RowTokenizer {
    layout: ColumnLayout,
}

impl RowTokenizer {
    pub fn new(layout: ColumnLayout) -> Self {
        Self { layout }
    }

    /// Whether `tr` is an event row (as opposed to a header or page break).
    pub fn is_event_row(tr: &ElementRef) -> bool {
        tr.value().classes().any(|c| ROW_CLASS.is_match(c))
    }

    pub fn tokenize(&self, tr: ElementRef) -> Result<RawRow, ParseError> {
        // Direct children only: the on-ice cells nest whole tables.
        let cells: Vec<ElementRef> = tr
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|e| e.value().name() == "td")
            .collect();

        let layout = &self.layout;
        if cells.len() < layout.width() {
            return Err(ParseError::malformed(
                "row",
                format!("expected {} cells, found {}", layout.width(), cells.len()),
            ));
        }

        Ok(RawRow {
            n: stripped_text(&cells[layout.n]),
            period: cells[layout.period].text().collect::<String>().trim().to_string(),
            strength: stripped_text(&cells[layout.strength]),
            time_markup: cells[layout.time].html(),
            event: stripped_text(&cells[layout.event]),
            description: stripped_text(&cells[layout.description]),
            away_on_ice: cells[layout.away_on_ice].text().collect(),
            home_on_ice: cells[layout.home_on_ice].text().collect(),
        })
    }
}

/// Text nodes trimmed one by one and joined without separator.
fn stripped_text(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

// =============================================================================
// Cell interpretation
// =============================================================================

/// First `m:ss` / `mm:ss` clock value in `markup`: the elapsed time.
pub fn extract_clock(markup: &str) -> Option<String> {
    CLOCK.find(markup).map(|m| m.as_str().to_string())
}

/// Pack every integer in `text` into nine slots, left to right.
///
/// Slots past the last integer are [`IceSlot::Empty`]; integers past the
/// ninth are ignored.
pub fn pack_on_ice(text: &str) -> Result<OnIce, ParseError> {
    let mut slots = [IceSlot::Empty; ON_ICE_SLOTS];
    for (slot, m) in slots.iter_mut().zip(INTEGER.find_iter(text)) {
        let number = m
            .as_str()
            .parse()
            .map_err(|_| ParseError::malformed("on_ice", format!("sweater {:?}", m.as_str())))?;
        *slot = IceSlot::Sweater(number);
    }
    Ok(slots)
}

fn interpret(game_id: GameId, raw: RawRow) -> Result<HtmlPlay, ParseError> {
    let n = raw
        .n
        .parse()
        .map_err(|_| ParseError::malformed("n", format!("expected integer, got {:?}", raw.n)))?;
    let time_elapsed = extract_clock(&raw.time_markup)
        .ok_or_else(|| ParseError::malformed("time_elapsed", "no clock value in time cell"))?;
    let event_type = EventType::from_html_token(&raw.event).into_result()?;

    Ok(HtmlPlay {
        game_id,
        n,
        period: raw.period,
        strength: raw.strength,
        time_elapsed,
        event_type,
        description: raw.description,
        away_on_ice: pack_on_ice(&raw.away_on_ice).map_err(|e| e.within("away"))?,
        home_on_ice: pack_on_ice(&raw.home_on_ice).map_err(|e| e.within("home"))?,
    })
}

/// Parse a whole report document into plays, in document order.
pub fn parse_report(
    game_id: GameId,
    html: &str,
    tokenizer: &RowTokenizer,
) -> Result<Vec<HtmlPlay>, ParseError> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut plays = Vec::new();

    for page in document.select(&PAGE_SELECTOR) {
        for tr in page.select(&ROW_SELECTOR) {
            // Nested .tablewidth containers would otherwise yield a row twice.
            if !RowTokenizer::is_event_row(&tr) || !seen.insert(tr.id()) {
                continue;
            }
            let index = plays.len();
            let raw = tokenizer
                .tokenize(tr)
                .map_err(|e| e.within(&format!("report row {index}")))?;
            let play = interpret(game_id, raw).map_err(|e| e.within(&format!("report row {index}")))?;
            plays.push(play);
        }
    }

    Ok(plays)
}

/// Report URL for a game: `{base}/{yyyy}{yyyy+1}/PL{suffix}.HTM`.
pub fn report_url(reports_base: &str, game_id: GameId) -> Result<String, ParseError> {
    let (Some(season), Some(suffix)) = (game_id.season_label(), game_id.report_suffix()) else {
        return Err(ParseError::malformed(
            "game_id",
            format!("{game_id} has no season prefix"),
        ));
    };
    Ok(format!(
        "{}/{}/PL{}.HTM",
        reports_base.trim_end_matches('/'),
        season,
        suffix
    ))
}

// =============================================================================
// Parser
// =============================================================================

pub struct HtmlPbpParser {
    client: Arc<NhlClient>,
    reports_base: String,
    tokenizer: RowTokenizer,
}

impl HtmlPbpParser {
    pub fn new(client: Arc<NhlClient>, reports_base: &str) -> Self {
        Self {
            client,
            reports_base: reports_base.trim_end_matches('/').to_string(),
            tokenizer: RowTokenizer::default(),
        }
    }

    /// Use a non-standard column layout.
    pub fn with_layout(mut self, layout: ColumnLayout) -> Self {
        self.tokenizer = RowTokenizer::new(layout);
        self
    }

    pub async fn parse(&self, game_id: GameId) -> Result<Vec<HtmlPlay>, ParseError> {
        let url = report_url(&self.reports_base, game_id)?;
        let html = self
            .client
            .get_text(&url)
            .await
            .map_err(|source| ParseError::SourceNotFound {
                game_id,
                url: url.clone(),
                source,
            })?;

        let plays = parse_report(game_id, &html, &self.tokenizer)?;
        if plays.is_empty() {
            warn!(game_id = %game_id, url = %url, "HTML report contained no event rows");
        }
        debug!(game_id = %game_id, plays = plays.len(), "Parsed HTML play-by-play");
        Ok(plays)
    }
}

// =============================================================================
// Tests
// =============================================================================
