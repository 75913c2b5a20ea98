use chrono::{Duration as ChronoDuration, NaiveDate};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::provider::{FootballProvider, response_items};
use crate::season;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct League {
    pub name: &'static str,
    pub id: u32,
}

pub const DEFAULT_LEAGUES: [League; 5] = [
    League { name: "Premier League", id: 39 },
    League { name: "La Liga", id: 140 },
    League { name: "Serie A", id: 135 },
    League { name: "Bundesliga", id: 78 },
    League { name: "Ligue 1", id: 61 },
];

/// A fixture row as listed on the index page.
#[derive(Debug, Clone, PartialEq)]
pub struct UpcomingFixture {
    pub league: String,
    pub league_id: u32,
    pub fixture_id: u64,
    pub date: String,
    pub home_team: String,
    pub away_team: String,
    pub home_team_id: u32,
    pub away_team_id: u32,
    pub home_logo: String,
    pub away_logo: String,
    pub season: i32,
}

/// The parts of a provider `fixtures` item this service relies on.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureRecord {
    pub id: u64,
    pub date: String,
    pub home_id: u32,
    pub home_name: String,
    pub home_logo: String,
    pub away_id: u32,
    pub away_name: String,
    pub away_logo: String,
}

pub fn parse_fixture_list(payload: &Value) -> Vec<FixtureRecord> {
    response_items(payload)
        .iter()
        .filter_map(parse_fixture_record)
        .collect()
}

fn parse_fixture_record(item: &Value) -> Option<FixtureRecord> {
    let fixture = item.get("fixture")?;
    let id = fixture.get("id")?.as_u64()?;
    let date = fixture
        .get("date")
        .and_then(Value::as_str)
        .map(date_prefix)
        .unwrap_or_default();

    let teams = item.get("teams")?;
    let home = teams.get("home")?;
    let away = teams.get("away")?;

    Some(FixtureRecord {
        id,
        date,
        home_id: u32::try_from(home.get("id")?.as_u64()?).ok()?,
        home_name: string_field(home, "name"),
        home_logo: string_field(home, "logo"),
        away_id: u32::try_from(away.get("id")?.as_u64()?).ok()?,
        away_name: string_field(away, "name"),
        away_logo: string_field(away, "logo"),
    })
}

/// Ids of every item in a `fixtures` payload; items without an id are skipped.
pub fn parse_fixture_ids(payload: &Value) -> Vec<u64> {
    response_items(payload)
        .iter()
        .filter_map(|item| item.get("fixture")?.get("id")?.as_u64())
        .collect()
}

/// Upcoming (not started) fixtures for the next `days` days in every league.
/// A league whose request fails contributes nothing.
pub fn fetch_upcoming_fixtures(
    provider: &dyn FootballProvider,
    leagues: &[League],
    today: NaiveDate,
    days: i64,
) -> Vec<UpcomingFixture> {
    let from = season::format_date(today);
    let to = season::format_date(today + ChronoDuration::days(days));
    let season = season::season_for_fixtures(today);
    info!(%from, %to, season, "retrieving upcoming fixtures");

    let mut out = Vec::new();
    for league in leagues {
        let params = [
            ("league", league.id.to_string()),
            ("season", season.to_string()),
            ("from", from.clone()),
            ("to", to.clone()),
            ("status", "NS".to_string()),
        ];
        let payload = match provider.fetch("fixtures", &params) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(league = league.name, error = %format!("{err:#}"), "fixture listing failed");
                continue;
            }
        };

        let records = parse_fixture_list(&payload);
        if records.is_empty() {
            debug!(league = league.name, league_id = league.id, "no upcoming fixtures");
        }
        out.extend(records.into_iter().map(|r| UpcomingFixture {
            league: league.name.to_string(),
            league_id: league.id,
            fixture_id: r.id,
            date: r.date,
            home_team: r.home_name,
            away_team: r.away_name,
            home_team_id: r.home_id,
            away_team_id: r.away_id,
            home_logo: r.home_logo,
            away_logo: r.away_logo,
            season,
        }));
    }
    out
}

/// Finished fixtures of `team_id` from the season start up to `cutoff`.
pub fn fetch_team_fixture_ids(
    provider: &dyn FootballProvider,
    team_id: u32,
    league_id: u32,
    season: i32,
    cutoff: &str,
) -> Vec<u64> {
    let params = [
        ("team", team_id.to_string()),
        ("league", league_id.to_string()),
        ("season", season.to_string()),
        ("from", season::format_date(season::season_start(season))),
        ("to", cutoff.to_string()),
        ("status", "FT".to_string()),
    ];
    match provider.fetch("fixtures", &params) {
        Ok(payload) => {
            let ids = parse_fixture_ids(&payload);
            debug!(team_id, league_id, season, count = ids.len(), "finished fixtures");
            ids
        }
        Err(err) => {
            warn!(team_id, error = %format!("{err:#}"), "team fixtures request failed");
            Vec::new()
        }
    }
}

/// `YYYY-MM-DD` kickoff date of a single fixture.
pub fn fetch_fixture_date(provider: &dyn FootballProvider, fixture_id: u64) -> Option<String> {
    let payload = match provider.fetch("fixtures", &[("id", fixture_id.to_string())]) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(fixture_id, error = %format!("{err:#}"), "fixture lookup failed");
            return None;
        }
    };
    let date = response_items(&payload)
        .first()?
        .get("fixture")?
        .get("date")?
        .as_str()
        .map(date_prefix)?;
    if date.is_empty() { None } else { Some(date) }
}

fn date_prefix(raw: &str) -> String {
    raw.trim().chars().take(10).collect()
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}
