// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use sailadmin_grid::{Entity, Searchable};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PanelKind {
    Regattas,
    Competitors,
    Leaderboards,
    Events,
}

impl PanelKind {
    pub const ALL: [Self; 4] = [
        Self::Regattas,
        Self::Competitors,
        Self::Leaderboards,
        Self::Events,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Regattas => "regattas",
            Self::Competitors => "competitors",
            Self::Leaderboards => "leaderboards",
            Self::Events => "events",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.label() == value)
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Regattas => 0,
            Self::Competitors => 1,
            Self::Leaderboards => 2,
            Self::Events => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Nav,
    Filter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
    pub id: CompetitorId,
    pub name: String,
    pub short_name: String,
    pub sail_id: String,
    pub boat_class: String,
    pub nationality: String,
    pub email: String,
    pub search_tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Regatta {
    pub name: RegattaName,
    pub boat_class: String,
    pub course_area: String,
    pub competitor_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub name: LeaderboardName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub venue: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub start: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub end: Option<OffsetDateTime>,
}

impl Entity for Competitor {
    type Key = String;

    fn identity(&self) -> Option<String> {
        self.id.key()
    }
}

impl Searchable for Competitor {
    fn searchable_strings(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.short_name.clone(),
            self.sail_id.clone(),
            self.boat_class.clone(),
            self.nationality.clone(),
            self.search_tag.clone(),
            self.id.to_string(),
        ]
    }
}

impl Entity for Regatta {
    type Key = String;

    fn identity(&self) -> Option<String> {
        self.name.key()
    }
}

impl Searchable for Regatta {
    fn searchable_strings(&self) -> Vec<String> {
        vec![
            self.name.to_string(),
            self.boat_class.clone(),
            self.course_area.clone(),
        ]
    }
}

impl Entity for Leaderboard {
    type Key = String;

    fn identity(&self) -> Option<String> {
        self.name.key()
    }
}

impl Searchable for Leaderboard {
    fn searchable_strings(&self) -> Vec<String> {
        vec![self.name.to_string()]
    }
}

impl Entity for Event {
    type Key = String;

    fn identity(&self) -> Option<String> {
        self.id.key()
    }
}

impl Searchable for Event {
    fn searchable_strings(&self) -> Vec<String> {
        vec![self.name.clone(), self.venue.clone(), self.id.to_string()]
    }
}
