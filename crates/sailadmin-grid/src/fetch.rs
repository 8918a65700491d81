// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::error::Error;
use std::fmt;

use log::{info, warn};

use crate::filter::Searchable;
use crate::identity::Entity;
use crate::selection::RefreshableSelectionModel;
use crate::table::TableWrapper;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FetchToken(u64);

impl FetchToken {
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FetchToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-table fetch counter. Only the most recently issued token may apply
/// its response; anything older is stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchGenerations {
    latest: u64,
}

impl FetchGenerations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> FetchToken {
        self.latest = self.latest.saturating_add(1);
        if self.latest == 0 {
            self.latest = 1;
        }
        FetchToken(self.latest)
    }

    pub fn is_current(&self, token: FetchToken) -> bool {
        self.latest != 0 && token.0 == self.latest
    }

    pub fn latest(&self) -> Option<FetchToken> {
        (self.latest != 0).then_some(FetchToken(self.latest))
    }

    /// Invalidates every outstanding token without starting a new fetch.
    pub fn cancel(&mut self) {
        self.issue();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for FetchError {}

impl From<anyhow::Error> for FetchError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(format!("{error:#}"))
    }
}

/// Success and failure arrive on the same channel; exactly one applies.
pub type FetchOutcome<T> = Result<Vec<T>, FetchError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchDisposition {
    Applied { rows: usize },
    Stale,
    Failed(String),
}

/// Applies a fetch result to `table` when `token` is still current. Stale
/// responses and failures leave the table exactly as it was; the caller
/// decides how to report them.
pub fn apply_fetch<E, S>(
    table: &mut TableWrapper<E, S>,
    generations: &FetchGenerations,
    token: FetchToken,
    outcome: FetchOutcome<E>,
) -> FetchDisposition
where
    E: Entity + Searchable,
    S: RefreshableSelectionModel<E>,
{
    if !generations.is_current(token) {
        warn!(
            "dropping stale fetch {token}; latest is {:?}",
            generations.latest()
        );
        return FetchDisposition::Stale;
    }
    match outcome {
        Ok(entities) => {
            let rows = entities.len();
            table.refresh(entities);
            info!("fetch {token} applied {rows} records");
            FetchDisposition::Applied { rows }
        }
        Err(error) => {
            warn!("fetch {token} failed: {error}");
            FetchDisposition::Failed(error.message)
        }
    }
}
