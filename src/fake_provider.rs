use std::sync::Mutex;

use anyhow::Result;
use chrono::{Duration as ChronoDuration, NaiveDate};
use serde_json::{Value, json};

use crate::fixtures::League;
use crate::provider::{FootballProvider, Params};
use crate::season;

#[derive(Debug, Clone)]
struct Canned {
    endpoint: String,
    params: Vec<(String, String)>,
    reply: Reply,
}

#[derive(Debug, Clone)]
enum Reply {
    Json(Value),
    Fail(String),
}

/// In-memory provider. A canned reply matches a request when the endpoint is
/// equal and every canned parameter is present with the same value; the most
/// specific match wins, ties going to the reply added last. Unmatched requests
/// get an empty provider payload.
#[derive(Debug, Default)]
pub struct FakeProvider {
    canned: Vec<Canned>,
    requests: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, endpoint: &str, params: &[(&str, &str)], body: Value) -> Self {
        self.push(endpoint, params, Reply::Json(body));
        self
    }

    pub fn fail(mut self, endpoint: &str, params: &[(&str, &str)], message: &str) -> Self {
        self.push(endpoint, params, Reply::Fail(message.to_string()));
        self
    }

    /// Every request seen so far, rendered as `endpoint?k=v&k=v`.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn push(&mut self, endpoint: &str, params: &[(&str, &str)], reply: Reply) {
        self.canned.push(Canned {
            endpoint: endpoint.to_string(),
            params: params
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            reply,
        });
    }

    fn lookup(&self, endpoint: &str, params: &Params<'_>) -> Option<&Reply> {
        self.canned
            .iter()
            .filter(|c| c.endpoint == endpoint)
            .filter(|c| {
                c.params
                    .iter()
                    .all(|(k, v)| params.iter().any(|(pk, pv)| pk == k && pv == v))
            })
            .max_by_key(|c| c.params.len())
            .map(|c| &c.reply)
    }
}

impl FootballProvider for FakeProvider {
    fn fetch(&self, endpoint: &str, params: &Params<'_>) -> Result<Value> {
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(render_request(endpoint, params));
        }
        match self.lookup(endpoint, params) {
            Some(Reply::Json(body)) => Ok(body.clone()),
            Some(Reply::Fail(message)) => Err(anyhow::anyhow!("{message}")),
            None => Ok(empty_payload()),
        }
    }
}

pub fn empty_payload() -> Value {
    json!({"errors": [], "results": 0, "response": []})
}

pub fn payload(items: Vec<Value>) -> Value {
    json!({"errors": [], "results": items.len(), "response": items})
}

fn render_request(endpoint: &str, params: &Params<'_>) -> String {
    let query = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{endpoint}?{query}")
}

pub fn fixture_item(
    id: u64,
    date: &str,
    league_id: u32,
    season: i32,
    home: (u32, &str),
    away: (u32, &str),
) -> Value {
    json!({
        "fixture": {"id": id, "date": format!("{date}T19:00:00+00:00"), "status": {"short": "NS"}},
        "league": {"id": league_id, "season": season},
        "teams": {
            "home": {"id": home.0, "name": home.1, "logo": format!("https://media.api-sports.io/football/teams/{}.png", home.0)},
            "away": {"id": away.0, "name": away.1, "logo": format!("https://media.api-sports.io/football/teams/{}.png", away.0)}
        }
    })
}

pub fn statistics_item(team_id: u32, stats: &[(&str, Value)]) -> Value {
    let rows = stats
        .iter()
        .map(|(kind, value)| json!({"type": kind, "value": value}))
        .collect::<Vec<_>>();
    json!({"team": {"id": team_id}, "statistics": rows})
}

pub fn team_goals_item(home_for: u32, away_against: u32) -> Value {
    json!({
        "goals": {
            "for": {"total": {"home": home_for, "away": 0, "total": home_for}},
            "against": {"total": {"home": 0, "away": away_against, "total": away_against}}
        }
    })
}

/// Offline data set: one upcoming fixture per league, three finished games of
/// history per team, and season goal totals.
pub fn demo_provider(today: NaiveDate, leagues: &[League]) -> FakeProvider {
    let season = season::season_for_fixtures(today);
    let season_label = season.to_string();
    let mut provider = FakeProvider::new();

    for (idx, league) in leagues.iter().enumerate() {
        let league_id = league.id.to_string();
        let offset = idx as u32;
        let home_id = 1000 + offset * 10;
        let away_id = home_id + 1;
        let fixture_id = 900_000 + u64::from(offset);
        let kickoff = today + ChronoDuration::days(1 + i64::from(offset));
        let kickoff = season::format_date(kickoff);
        let home_name = format!("{} Home XI", league.name);
        let away_name = format!("{} Away XI", league.name);

        let fixture = fixture_item(
            fixture_id,
            &kickoff,
            league.id,
            season,
            (home_id, home_name.as_str()),
            (away_id, away_name.as_str()),
        );
        provider = provider
            .respond(
                "fixtures",
                &[("league", league_id.as_str()), ("season", season_label.as_str()), ("status", "NS")],
                payload(vec![fixture.clone()]),
            )
            .respond(
                "fixtures",
                &[("id", fixture_id.to_string().as_str())],
                payload(vec![fixture]),
            );

        for (team_id, strength) in [(home_id, 3u32), (away_id, 1u32)] {
            let team = team_id.to_string();
            let history = (0..3u64)
                .map(|n| json!({"fixture": {"id": u64::from(team_id) * 10 + n}}))
                .collect::<Vec<_>>();
            provider = provider.respond(
                "fixtures",
                &[("team", team.as_str()), ("league", league_id.as_str()), ("status", "FT")],
                payload(history),
            );
            for n in 0..3u64 {
                let past_fixture = (u64::from(team_id) * 10 + n).to_string();
                let stats = statistics_item(
                    team_id,
                    &[
                        ("Ball Possession", json!(format!("{}%", 45 + strength * 3))),
                        ("Fouls", json!(11)),
                        ("Yellow Cards", json!(2)),
                        ("Red Cards", Value::Null),
                        ("Corner Kicks", json!(4 + strength)),
                        ("Goalkeeper Saves", json!(3)),
                        ("Total Shots", json!(9 + strength * 2)),
                        ("Shots on Goal", json!(3 + strength)),
                        ("Blocked Shots", json!(2)),
                        ("Total passes", json!(420 + strength * 30)),
                        ("Passes accurate", json!(350 + strength * 30)),
                        ("Passes %", json!("83%")),
                    ],
                );
                provider = provider.respond(
                    "fixtures/statistics",
                    &[("fixture", past_fixture.as_str()), ("team", team.as_str())],
                    payload(vec![stats]),
                );
            }
            provider = provider.respond(
                "teams/statistics",
                &[("team", team.as_str()), ("league", league_id.as_str())],
                payload_object(team_goals_item(8 * strength, 9 - 2 * strength)),
            );
        }
    }

    provider
}

// `teams/statistics` returns an object under `response`, not an array.
fn payload_object(item: Value) -> Value {
    json!({"errors": [], "results": 1, "response": item})
}
