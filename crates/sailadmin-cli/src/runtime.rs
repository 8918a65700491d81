// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use log::debug;
use sailadmin_app::{Competitor, Event, Leaderboard, Regatta, RegattaName};
use sailadmin_grid::FetchToken;
use sailadmin_rpc::Client;
use sailadmin_testkit::{Fleet, SailingFaker};
use sailadmin_tui::{AppRuntime, FetchRequest, InternalEvent};
use std::sync::mpsc::Sender;
use std::thread;

const DEMO_REGATTAS: usize = 12;
const DEMO_ENTRIES: usize = 40;

/// Talks to a live sailing server. Fetches run on their own thread so the
/// UI keeps drawing while the gateway answers.
#[derive(Debug, Clone)]
pub struct RpcRuntime {
    client: Client,
}

impl RpcRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl AppRuntime for RpcRuntime {
    fn fetch_regattas(&mut self) -> Result<Vec<Regatta>> {
        self.client.list_regattas()
    }

    fn fetch_competitors(&mut self, regatta: &RegattaName) -> Result<Vec<Competitor>> {
        self.client.list_regatta_competitors(regatta)
    }

    fn fetch_leaderboards(&mut self) -> Result<Vec<Leaderboard>> {
        self.client.list_leaderboards()
    }

    fn fetch_events(&mut self) -> Result<Vec<Event>> {
        self.client.list_events()
    }

    fn spawn_fetch(
        &mut self,
        request: FetchRequest,
        token: FetchToken,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let mut worker = self.clone();
        let name = format!("fetch-{}", request.panel().label());
        thread::Builder::new()
            .name(name)
            .spawn(move || {
                let rows = worker.fetch(request);
                if tx.send(InternalEvent::Fetched { token, rows }).is_err() {
                    debug!("fetch {token} finished after the UI closed");
                }
            })
            .context("spawn fetch worker")?;
        Ok(())
    }
}

/// Serves a generated season without a network. Every competitor reload
/// edits one entry so refreshes have something to reconcile.
#[derive(Debug, Clone)]
pub struct DemoRuntime {
    faker: SailingFaker,
    fleet: Fleet,
}

impl DemoRuntime {
    pub fn new(seed: u64) -> Self {
        Self::with_size(seed, DEMO_REGATTAS, DEMO_ENTRIES)
    }

    pub fn with_size(seed: u64, regattas: usize, entries: usize) -> Self {
        let mut faker = SailingFaker::new(seed);
        let fleet = faker.fleet(regattas, entries);
        Self { faker, fleet }
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }
}

impl AppRuntime for DemoRuntime {
    fn fetch_regattas(&mut self) -> Result<Vec<Regatta>> {
        Ok(self.fleet.regattas.clone())
    }

    fn fetch_competitors(&mut self, regatta: &RegattaName) -> Result<Vec<Competitor>> {
        let entries = self
            .fleet
            .competitors
            .get_mut(regatta)
            .ok_or_else(|| anyhow!("server error (404): no regatta named {regatta:?}"))?;
        if !entries.is_empty() {
            let index = self.faker.int_n(entries.len());
            entries[index] = self.faker.renamed(&entries[index]);
        }
        Ok(entries.clone())
    }

    fn fetch_leaderboards(&mut self) -> Result<Vec<Leaderboard>> {
        Ok(self.fleet.leaderboards.clone())
    }

    fn fetch_events(&mut self) -> Result<Vec<Event>> {
        Ok(self.fleet.events.clone())
    }
}
