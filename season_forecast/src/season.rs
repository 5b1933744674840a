//! Season codes embedded in the free-text theme column
//!
//! A theme such as `T_PV25 05 MARFIL_P` carries a two-letter season type
//! (`PV` spring/summer, `OI` fall/winter) followed by a two-digit year.

use crate::data::SalesTable;
use crate::error::{ForecastError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::info;

/// Theme value that never carries a season
pub const UNDEFINED_THEME: &str = "SIN DEFINIR";

static SEASON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(PV|OI)(\d{2})").expect("valid regex"));

/// The two selling seasons of the retail calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeasonType {
    /// Spring/summer
    PV,
    /// Fall/winter
    OI,
}

impl SeasonType {
    pub const ALL: [SeasonType; 2] = [SeasonType::PV, SeasonType::OI];

    pub fn code(&self) -> &'static str {
        match self {
            SeasonType::PV => "PV",
            SeasonType::OI => "OI",
        }
    }
}

impl fmt::Display for SeasonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SeasonType {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "PV" => Ok(SeasonType::PV),
            "OI" => Ok(SeasonType::OI),
            other => Err(ForecastError::InvalidParameter(format!(
                "Unknown season type '{}', expected PV or OI",
                other
            ))),
        }
    }
}

/// A concrete season: type plus four-digit year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Season {
    pub kind: SeasonType,
    pub year: i32,
}

impl Season {
    pub fn new(kind: SeasonType, year: i32) -> Self {
        Self { kind, year }
    }

    /// The same season type one year later
    pub fn next(&self) -> Self {
        Self::new(self.kind, self.year + 1)
    }

    /// Short label such as `PV26`
    pub fn label(&self) -> String {
        format!("{}{:02}", self.kind, self.year.rem_euclid(100))
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Parse the season out of a theme string.
///
/// Returns `None` for the undefined sentinel, blank input, or text without
/// a `PV`/`OI` code followed by two digits.
pub fn extract_season(theme: &str) -> Option<Season> {
    if theme == UNDEFINED_THEME {
        return None;
    }
    let theme = theme.trim();
    if theme.is_empty() {
        return None;
    }

    let captures = SEASON_RE.captures(theme)?;
    let kind = match &captures[1] {
        "PV" => SeasonType::PV,
        _ => SeasonType::OI,
    };
    let short_year: i32 = captures[2].parse().ok()?;
    Some(Season::new(kind, 2000 + short_year))
}

/// Attach the parsed season to every record of the table
pub fn extract_seasons(mut table: SalesTable) -> SalesTable {
    for record in table.records_mut() {
        record.season = record.theme.as_deref().and_then(extract_season);
    }

    let seasons: Vec<Season> = table.records().iter().filter_map(|r| r.season).collect();
    let years = seasons.iter().map(|s| s.year);
    info!(
        with_season = seasons.len(),
        rows = table.len(),
        min_year = years.clone().min(),
        max_year = years.max(),
        "extracted season codes from theme column"
    );
    table
}
