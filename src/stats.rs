//! Per-team statistic aggregation over the finished fixtures of a season.

use serde_json::Value;
use tracing::{debug, warn};

use crate::fixtures::fetch_team_fixture_ids;
use crate::provider::{FootballProvider, response_items};

pub const DEFAULT_POSSESSION_PCT: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    PossessionPct,
    FoulsCommitted,
    YellowCards,
    RedCards,
    WonCorners,
    Saves,
    TotalShots,
    ShotsOnTarget,
    BlockedShots,
    TotalPasses,
    AccuratePasses,
}

impl Metric {
    /// Maps a provider statistic `type` label to a metric. Labels are matched
    /// exactly, as the provider sends them.
    pub fn from_provider_label(label: &str) -> Option<Self> {
        let metric = match label {
            "Ball Possession" => Self::PossessionPct,
            "Fouls" => Self::FoulsCommitted,
            "Yellow Cards" => Self::YellowCards,
            "Red Cards" => Self::RedCards,
            "Corner Kicks" => Self::WonCorners,
            "Goalkeeper Saves" => Self::Saves,
            "Total Shots" => Self::TotalShots,
            "Shots on Goal" => Self::ShotsOnTarget,
            "Blocked Shots" => Self::BlockedShots,
            "Total passes" => Self::TotalPasses,
            "Passes accurate" => Self::AccuratePasses,
            _ => return None,
        };
        Some(metric)
    }
}

/// Accumulated statistics for one team. Possession is averaged, every other
/// metric is a running total.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatAggregate {
    pub possession_sum: f64,
    pub possession_count: u32,
    pub fouls_committed: f64,
    pub yellow_cards: f64,
    pub red_cards: f64,
    pub won_corners: f64,
    pub saves: f64,
    pub total_shots: f64,
    pub shots_on_target: f64,
    pub blocked_shots: f64,
    pub total_passes: f64,
    pub accurate_passes: f64,
    pub fixtures_seen: u32,
}

impl StatAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn possession_pct(&self) -> f64 {
        if self.possession_count > 0 {
            self.possession_sum / f64::from(self.possession_count)
        } else {
            DEFAULT_POSSESSION_PCT
        }
    }

    /// On-target share of all shots, 0 when no shots were recorded.
    pub fn shot_conversion(&self) -> f64 {
        if self.total_shots > 0.0 {
            self.shots_on_target / self.total_shots
        } else {
            0.0
        }
    }

    pub fn add(&mut self, metric: Metric, value: f64) {
        match metric {
            Metric::PossessionPct => {
                self.possession_sum += value;
                self.possession_count += 1;
            }
            Metric::FoulsCommitted => self.fouls_committed += value,
            Metric::YellowCards => self.yellow_cards += value,
            Metric::RedCards => self.red_cards += value,
            Metric::WonCorners => self.won_corners += value,
            Metric::Saves => self.saves += value,
            Metric::TotalShots => self.total_shots += value,
            Metric::ShotsOnTarget => self.shots_on_target += value,
            Metric::BlockedShots => self.blocked_shots += value,
            Metric::TotalPasses => self.total_passes += value,
            Metric::AccuratePasses => self.accurate_passes += value,
        }
    }

    /// Folds one fixture's `statistics` rows (`{"type": .., "value": ..}`).
    /// A fixture with no rows is not counted as seen.
    pub fn accumulate(&mut self, rows: &[Value]) {
        if rows.is_empty() {
            return;
        }
        for row in rows {
            let Some(metric) = row
                .get("type")
                .and_then(Value::as_str)
                .and_then(Metric::from_provider_label)
            else {
                continue;
            };
            let Some(value) = row.get("value").and_then(parse_stat_value) else {
                continue;
            };
            self.add(metric, value);
        }
        self.fixtures_seen += 1;
    }
}

/// `null` is absent. Anything present but unparseable counts as zero.
pub fn parse_stat_value(value: &Value) -> Option<f64> {
    match value {
        Value::Null => None,
        Value::Number(n) => Some(n.as_f64().unwrap_or(0.0)),
        Value::String(s) => Some(parse_stat_cell(s)),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => Some(0.0),
    }
}

fn parse_stat_cell(raw: &str) -> f64 {
    let s = raw.trim();
    let s = if s.contains('%') {
        s.replace('%', "")
    } else {
        s.to_string()
    };
    s.trim().parse::<f64>().unwrap_or(0.0)
}

/// Statistics rows for one team in one fixture, empty when unavailable.
pub fn fetch_fixture_statistics(
    provider: &dyn FootballProvider,
    fixture_id: u64,
    team_id: u32,
) -> Vec<Value> {
    let params = [
        ("fixture", fixture_id.to_string()),
        ("team", team_id.to_string()),
    ];
    match provider.fetch("fixtures/statistics", &params) {
        Ok(payload) => response_items(&payload)
            .first()
            .and_then(|entry| entry.get("statistics"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        Err(err) => {
            warn!(fixture_id, team_id, error = %format!("{err:#}"), "fixture statistics request failed");
            Vec::new()
        }
    }
}

pub fn aggregate_team_stats(
    provider: &dyn FootballProvider,
    team_id: u32,
    league_id: u32,
    season: i32,
    cutoff: &str,
) -> StatAggregate {
    let mut agg = StatAggregate::new();
    let fixtures = fetch_team_fixture_ids(provider, team_id, league_id, season, cutoff);
    if fixtures.is_empty() {
        debug!(team_id, cutoff, "no finished fixtures, using defaults");
        return agg;
    }

    for fixture_id in fixtures {
        let rows = fetch_fixture_statistics(provider, fixture_id, team_id);
        agg.accumulate(&rows);
    }
    agg
}

/// Season goal totals from `teams/statistics`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TeamGoals {
    pub gf: f64,
    pub ga: f64,
}

impl TeamGoals {
    pub fn difference(&self) -> f64 {
        self.gf - self.ga
    }
}

// Goals for are taken from home games and goals against from away games,
// matching how the model's training set was built.
pub fn parse_team_goals(payload: &Value) -> TeamGoals {
    let Some(goals) = payload.get("response").and_then(|r| r.get("goals")) else {
        return TeamGoals::default();
    };
    // A value that is present but not numeric zeroes both totals.
    let gf = goals.pointer("/for/total/home").map_or(Some(0.0), goal_count);
    let ga = goals.pointer("/against/total/away").map_or(Some(0.0), goal_count);
    match (gf, ga) {
        (Some(gf), Some(ga)) => TeamGoals { gf, ga },
        _ => TeamGoals::default(),
    }
}

fn goal_count(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

pub fn fetch_team_goals(
    provider: &dyn FootballProvider,
    team_id: u32,
    league_id: u32,
    season: i32,
) -> TeamGoals {
    let params = [
        ("team", team_id.to_string()),
        ("league", league_id.to_string()),
        ("season", season.to_string()),
    ];
    match provider.fetch("teams/statistics", &params) {
        Ok(payload) => parse_team_goals(&payload),
        Err(err) => {
            warn!(team_id, error = %format!("{err:#}"), "team statistics request failed");
            TeamGoals::default()
        }
    }
}
