// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use sailadmin_app::{
    Competitor, CompetitorId, Event, EventId, Leaderboard, LeaderboardName, Regatta, RegattaName,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use time::OffsetDateTime;
use url::Url;

const API_VERSION: &str = "v1";

/// Blocking client for the sailing server's REST gateway.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("server.base_url must not be empty");
        }
        let base_url = Url::parse(trimmed)
            .with_context(|| format!("server.base_url {trimmed:?} is not a valid URL"))?;
        if base_url.cannot_be_a_base() {
            bail!("server.base_url {trimmed:?} cannot carry a path -- use http(s)://host/path");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn list_regattas(&self) -> Result<Vec<Regatta>> {
        let wire: Vec<WireRegatta> = self.get_json(&["regattas"], "regatta list")?;
        Ok(wire.into_iter().map(WireRegatta::into_regatta).collect())
    }

    pub fn list_regatta_competitors(&self, regatta: &RegattaName) -> Result<Vec<Competitor>> {
        let wire: Vec<WireCompetitor> = self
            .get_json(&["regattas", regatta.as_str(), "competitors"], "competitor list")
            .with_context(|| format!("list competitors of regatta {regatta:?}"))?;
        Ok(wire.into_iter().map(WireCompetitor::into_competitor).collect())
    }

    pub fn list_leaderboards(&self) -> Result<Vec<Leaderboard>> {
        let names: Vec<String> = self.get_json(&["leaderboards"], "leaderboard list")?;
        Ok(names
            .into_iter()
            .map(|name| Leaderboard {
                name: LeaderboardName::new(name),
            })
            .collect())
    }

    pub fn list_events(&self) -> Result<Vec<Event>> {
        let wire: Vec<WireEvent> = self.get_json(&["events"], "event list")?;
        wire.into_iter().map(WireEvent::into_event).collect()
    }

    /// The cheapest request the gateway answers without authentication.
    pub fn ping(&self) -> Result<()> {
        self.list_leaderboards().map(|_| ())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("base URL {} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .push(API_VERSION)
            .extend(segments);
        Ok(url)
    }

    fn get_json<T: DeserializeOwned>(&self, segments: &[&str], what: &str) -> Result<T> {
        let url = self.endpoint(segments)?;
        debug!("GET {url}");
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|error| connection_error(self.base_url.as_str(), error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        response.json().with_context(|| format!("decode {what}"))
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- check server.base_url and that the sailing server is running ({})",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<GatewayErrorEnvelope>(body)
        && let Some(message) = parsed.message.or(parsed.error)
        && !message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), message);
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() < 200 && !trimmed.contains('<') && !trimmed.contains('{')
    {
        return anyhow!("server error ({}): {}", status.as_u16(), trimmed);
    }

    anyhow!("server returned {}", status.as_u16())
}

fn millis_to_datetime(millis: i64) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .with_context(|| format!("timestamp {millis} out of range"))
}

#[derive(Debug, Deserialize)]
struct GatewayErrorEnvelope {
    message: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireRegatta {
    name: String,
    #[serde(default, alias = "boatClass")]
    boatclass: Option<String>,
    #[serde(default, rename = "courseAreaName")]
    course_area: Option<String>,
    #[serde(default, rename = "competitorCount")]
    competitor_count: Option<u32>,
}

impl WireRegatta {
    fn into_regatta(self) -> Regatta {
        Regatta {
            name: RegattaName::new(self.name),
            boat_class: self.boatclass.unwrap_or_default(),
            course_area: self.course_area.unwrap_or_default(),
            competitor_count: self.competitor_count,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCompetitor {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default, rename = "sailID")]
    sail_id: Option<String>,
    #[serde(default)]
    nationality: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    search_tag: Option<String>,
    #[serde(default)]
    boat: Option<WireBoat>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBoat {
    #[serde(default, alias = "sailID")]
    sail_id: Option<String>,
    #[serde(default)]
    boat_class: Option<WireBoatClass>,
}

#[derive(Debug, Deserialize)]
struct WireBoatClass {
    #[serde(default)]
    name: Option<String>,
}

impl WireCompetitor {
    fn into_competitor(self) -> Competitor {
        let boat_sail_id = self.boat.as_ref().and_then(|boat| boat.sail_id.clone());
        let boat_class = self
            .boat
            .and_then(|boat| boat.boat_class)
            .and_then(|class| class.name);
        Competitor {
            id: CompetitorId::new(self.id.unwrap_or_default()),
            name: self.name.unwrap_or_default(),
            short_name: self.short_name.unwrap_or_default(),
            sail_id: self.sail_id.or(boat_sail_id).unwrap_or_default(),
            boat_class: boat_class.unwrap_or_default(),
            nationality: self.nationality.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            search_tag: self.search_tag.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEvent {
    id: String,
    name: String,
    #[serde(default)]
    venue: Option<WireVenue>,
    #[serde(default)]
    start_date: Option<i64>,
    #[serde(default)]
    end_date: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WireVenue {
    #[serde(default)]
    name: Option<String>,
}

impl WireEvent {
    fn into_event(self) -> Result<Event> {
        let start = self.start_date.map(millis_to_datetime).transpose()?;
        let end = self.end_date.map(millis_to_datetime).transpose()?;
        Ok(Event {
            id: EventId::new(self.id),
            name: self.name,
            venue: self.venue.and_then(|venue| venue.name).unwrap_or_default(),
            start,
            end,
        })
    }
}
