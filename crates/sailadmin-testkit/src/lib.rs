// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use sailadmin_app::{
    Competitor, CompetitorId, Event, EventId, Leaderboard, LeaderboardName, Regatta, RegattaName,
};
use std::collections::BTreeMap;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

const SEASON_START: OffsetDateTime = datetime!(2026-04-01 00:00 UTC);
const SEASON_DAYS: i64 = 180;
const SEASON_YEAR: i32 = 2026;

const FIRST_NAMES: [&str; 16] = [
    "Ann", "Bo", "Carla", "Dag", "Elin", "Finn", "Greta", "Hauke", "Ines", "Jonas", "Kaja",
    "Lars", "Mette", "Nils", "Ola", "Pia",
];
const LAST_NAMES: [&str; 16] = [
    "Berg", "Lund", "Hansen", "Schulz", "Meyer", "Nielsen", "Vogel", "Kruse", "Dahl", "Brandt",
    "Holm", "Petersen", "Lorenz", "Wolff", "Strand", "Janssen",
];
const NATIONS: [&str; 10] = [
    "GER", "DEN", "SWE", "NOR", "NED", "GBR", "FRA", "ITA", "AUS", "USA",
];
const BOAT_CLASSES: [&str; 8] = [
    "49er", "49erFX", "ILCA 7", "ILCA 6", "470", "Nacra 17", "Dragon", "J/70",
];
const VENUES: [&str; 8] = [
    "Kiel", "Aarhus", "Marstrand", "Medemblik", "Weymouth", "Hyeres", "Garda", "Travemunde",
];
const REGATTA_KINDS: [&str; 5] = ["Week", "Cup", "Open", "Championship", "Trophy"];
const COURSE_AREAS: [&str; 6] = ["Alpha", "Bravo", "Charlie", "Kilo", "Echo", "India"];
const CLUBS: [&str; 6] = ["KYC", "NRV", "KDY", "SSS", "RYS", "YCI"];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// A generated sailing season: regattas with their entry lists plus the
/// leaderboards and events around them.
#[derive(Debug, Clone, PartialEq)]
pub struct Fleet {
    pub regattas: Vec<Regatta>,
    pub competitors: BTreeMap<RegattaName, Vec<Competitor>>,
    pub leaderboards: Vec<Leaderboard>,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone)]
pub struct SailingFaker {
    rng: DeterministicRng,
    seed: u64,
    serial: u64,
}

impl SailingFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
            serial: 0,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn competitor(&mut self) -> Competitor {
        let serial = self.next_serial();
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        let nation = self.pick(&NATIONS);
        let class = self.pick(&BOAT_CLASSES);
        let club = self.pick(&CLUBS);
        let sail_number = 1 + self.int_n(999);
        Competitor {
            id: CompetitorId::new(format!("c-{}-{serial}", self.seed)),
            name: format!("{first} {last}"),
            short_name: format!("{}{}", initial(first), initial(last)),
            sail_id: format!("{nation} {sail_number}"),
            boat_class: class.to_owned(),
            nationality: nation.to_owned(),
            email: format!(
                "{}.{}@example.com",
                first.to_lowercase(),
                last.to_lowercase()
            ),
            search_tag: club.to_owned(),
        }
    }

    pub fn competitors(&mut self, count: usize) -> Vec<Competitor> {
        (0..count).map(|_| self.competitor()).collect()
    }

    /// Same identity, different payload: what a server returns after an edit.
    pub fn renamed(&mut self, competitor: &Competitor) -> Competitor {
        let last = self.pick(&LAST_NAMES);
        let sail_number = 1 + self.int_n(999);
        Competitor {
            name: format!("{} {last}", first_word(&competitor.name)),
            sail_id: format!("{} {sail_number}", competitor.nationality),
            ..competitor.clone()
        }
    }

    pub fn regatta(&mut self) -> Regatta {
        let serial = self.next_serial();
        let venue = self.pick(&VENUES);
        let kind = self.pick(&REGATTA_KINDS);
        let class = self.pick(&BOAT_CLASSES);
        let area = self.pick(&COURSE_AREAS);
        Regatta {
            name: RegattaName::new(format!("{venue} {kind} {SEASON_YEAR} #{serial} ({class})")),
            boat_class: class.to_owned(),
            course_area: area.to_owned(),
            competitor_count: None,
        }
    }

    pub fn leaderboard_for(&self, regatta: &Regatta) -> Leaderboard {
        Leaderboard {
            name: LeaderboardName::new(format!("{} Overall", regatta.name)),
        }
    }

    pub fn event(&mut self) -> Event {
        let serial = self.next_serial();
        let venue = self.pick(&VENUES);
        let kind = self.pick(&REGATTA_KINDS);
        let offset_days = self.int_n(SEASON_DAYS as usize) as i64;
        let length_days = 1 + self.int_n(9) as i64;
        let start = SEASON_START + Duration::days(offset_days);
        Event {
            id: EventId::new(format!("e-{}-{serial}", self.seed)),
            name: format!("{venue} {kind} {SEASON_YEAR}"),
            venue: venue.to_owned(),
            start: Some(start),
            end: Some(start + Duration::days(length_days)),
        }
    }

    pub fn fleet(&mut self, regatta_count: usize, entries_per_regatta: usize) -> Fleet {
        let mut regattas = Vec::with_capacity(regatta_count);
        let mut competitors = BTreeMap::new();
        let mut leaderboards = Vec::with_capacity(regatta_count);
        for _ in 0..regatta_count {
            let mut regatta = self.regatta();
            let entries: Vec<Competitor> = self
                .competitors(entries_per_regatta)
                .into_iter()
                .map(|competitor| Competitor {
                    boat_class: regatta.boat_class.clone(),
                    ..competitor
                })
                .collect();
            regatta.competitor_count = u32::try_from(entries.len()).ok();
            leaderboards.push(self.leaderboard_for(&regatta));
            competitors.insert(regatta.name.clone(), entries);
            regattas.push(regatta);
        }
        let events = (0..regatta_count.div_ceil(2).max(1))
            .map(|_| self.event())
            .collect();
        Fleet {
            regattas,
            competitors,
            leaderboards,
            events,
        }
    }

    fn next_serial(&mut self) -> u64 {
        self.serial += 1;
        self.serial
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }
}

fn initial(word: &str) -> String {
    word.chars().take(1).collect::<String>().to_uppercase()
}

fn first_word(name: &str) -> &str {
    name.split_whitespace().next().unwrap_or(name)
}

pub fn boat_classes() -> &'static [&'static str] {
    &BOAT_CLASSES
}

#[cfg(test)]
mod tests {
    use super::{SailingFaker, boat_classes};
    use sailadmin_grid::{Entity, represent_same_entity};
    use std::collections::BTreeSet;

    #[test]
    fn same_seed_same_output() {
        let mut left = SailingFaker::new(42);
        let mut right = SailingFaker::new(42);
        assert_eq!(left.competitors(5), right.competitors(5));
        assert_eq!(left.fleet(3, 4), right.fleet(3, 4));
    }

    #[test]
    fn zero_seed_is_normalized() {
        assert_eq!(SailingFaker::new(0).seed(), 1);
    }

    #[test]
    fn competitor_ids_are_unique() {
        let mut faker = SailingFaker::new(3);
        let ids: BTreeSet<String> = faker
            .competitors(50)
            .iter()
            .filter_map(Entity::identity)
            .collect();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn renamed_keeps_identity() {
        let mut faker = SailingFaker::new(7);
        let original = faker.competitor();
        let renamed = faker.renamed(&original);
        assert!(represent_same_entity(&original, &renamed));
        assert_eq!(renamed.id, original.id);
        assert_eq!(renamed.nationality, original.nationality);
    }

    #[test]
    fn fleet_entries_sail_the_regatta_class() {
        let mut faker = SailingFaker::new(11);
        let fleet = faker.fleet(4, 6);
        assert_eq!(fleet.regattas.len(), 4);
        assert_eq!(fleet.leaderboards.len(), 4);
        assert_eq!(fleet.events.len(), 2);
        for regatta in &fleet.regattas {
            let entries = &fleet.competitors[&regatta.name];
            assert_eq!(entries.len(), 6);
            assert_eq!(regatta.competitor_count, Some(6));
            assert!(entries.iter().all(|c| c.boat_class == regatta.boat_class));
            assert!(boat_classes().contains(&regatta.boat_class.as_str()));
        }
    }

    #[test]
    fn events_end_after_they_start() {
        let mut faker = SailingFaker::new(5);
        for _ in 0..20 {
            let event = faker.event();
            assert!(event.end > event.start);
        }
    }

    #[test]
    fn variety_across_seeds() {
        let mut names = BTreeSet::new();
        for seed in 0_u64..20_u64 {
            names.insert(SailingFaker::new(seed).competitor().name);
        }
        assert!(names.len() >= 10, "got {}", names.len());
    }
}
