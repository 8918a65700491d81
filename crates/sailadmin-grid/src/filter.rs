// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use log::debug;

use crate::identity::{Entity, identity_keys, position_of};
use crate::notify::{Listener, Listeners};

/// Strings a record exposes to the keyword filter.
pub trait Searchable {
    fn searchable_strings(&self) -> Vec<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterChange {
    pub query: String,
    pub matched: usize,
    pub total: usize,
}

/// Lowercases `query` and splits it on whitespace. Double-quoted phrases
/// stay together as one keyword; an unterminated quote runs to the end.
/// A backslash makes the next character literal, so `\"` is a quote and
/// `\ ` a space inside a keyword. A trailing backslash stands for itself.
pub fn parse_keywords(query: &str) -> Vec<String> {
    let mut keywords = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut escaped = false;
    for ch in query.to_lowercase().chars() {
        match ch {
            ch if escaped => {
                current.push(ch);
                escaped = false;
            }
            '\\' => escaped = true,
            '"' => {
                if !current.is_empty() {
                    keywords.push(std::mem::take(&mut current));
                }
                quoted = !quoted;
            }
            ch if ch.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    keywords.push(std::mem::take(&mut current));
                }
            }
            ch => current.push(ch),
        }
    }
    if escaped {
        current.push('\\');
    }
    if !current.is_empty() {
        keywords.push(current);
    }
    keywords
}

/// Every keyword must occur, case-insensitively, in at least one of the
/// record's strings. No keywords matches everything.
pub fn matches_keywords<E: Searchable>(entity: &E, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let haystack: Vec<String> = entity
        .searchable_strings()
        .into_iter()
        .map(|s| s.to_lowercase())
        .collect();
    keywords
        .iter()
        .all(|keyword| haystack.iter().any(|s| s.contains(keyword.as_str())))
}

/// Owns the full collection and the subset matching the current query.
///
/// `filtered` holds indices into `all` in `all` order, so the visible subset
/// is always a subsequence of the full collection.
#[derive(Debug)]
pub struct FilterablePanel<E> {
    all: Vec<E>,
    filtered: Vec<usize>,
    query: String,
    keywords: Vec<String>,
    listeners: Listeners<FilterChange>,
}

impl<E: Entity + Searchable> FilterablePanel<E> {
    pub fn new() -> Self {
        Self {
            all: Vec::new(),
            filtered: Vec::new(),
            query: String::new(),
            keywords: Vec::new(),
            listeners: Listeners::new(),
        }
    }

    pub fn with_entities(entities: Vec<E>) -> Self {
        let mut panel = Self::new();
        panel.update_all(entities);
        panel
    }

    /// Sets the query and recomputes the visible subset. Listeners fire only
    /// when the query text actually changes.
    pub fn filter(&mut self, query: &str) {
        let changed = self.query != query;
        if changed {
            self.query = query.to_owned();
            self.keywords = parse_keywords(query);
        }
        self.apply();
        if changed {
            debug!(
                "filter {:?} matched {} of {}",
                self.query,
                self.filtered.len(),
                self.all.len()
            );
            let change = FilterChange {
                query: self.query.clone(),
                matched: self.filtered.len(),
                total: self.all.len(),
            };
            self.listeners.emit(&change);
        }
    }

    /// Replaces the whole collection and re-applies the current query.
    pub fn update_all(&mut self, entities: Vec<E>) {
        self.all = entities;
        self.apply();
    }

    pub fn add(&mut self, entity: E) {
        self.all.push(entity);
        self.apply();
    }

    pub fn add_all(&mut self, entities: impl IntoIterator<Item = E>) {
        self.all.extend(entities);
        self.apply();
    }

    /// Inserts at `index` in the full collection, clamped to its length.
    pub fn insert(&mut self, index: usize, entity: E) {
        let index = index.min(self.all.len());
        self.all.insert(index, entity);
        self.apply();
    }

    /// Removes every record with the same identity as `entity` and returns
    /// whether anything was removed. A record without identity removes the
    /// identity-less records equal to it.
    pub fn remove(&mut self, entity: &E) -> bool
    where
        E: PartialEq,
    {
        self.remove_all(std::slice::from_ref(entity)) > 0
    }

    pub fn remove_all<'a>(&mut self, entities: impl IntoIterator<Item = &'a E>) -> usize
    where
        E: PartialEq + 'a,
    {
        let targets: Vec<&E> = entities.into_iter().collect();
        let keys = identity_keys(targets.iter().copied());
        let anonymous: Vec<&E> = targets
            .into_iter()
            .filter(|entity| entity.identity().is_none())
            .collect();
        let before = self.all.len();
        self.all.retain(|candidate| match candidate.identity() {
            Some(key) => !keys.contains(&key),
            None => !anonymous.contains(&candidate),
        });
        let removed = before - self.all.len();
        if removed > 0 {
            self.apply();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.all.clear();
        self.filtered.clear();
    }

    pub fn all(&self) -> &[E] {
        &self.all
    }

    pub fn filtered(&self) -> impl Iterator<Item = &E> + '_ {
        self.filtered.iter().map(|&index| &self.all[index])
    }

    pub fn filtered_indices(&self) -> &[usize] {
        &self.filtered
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Position in the full collection of the record with `entity`'s identity.
    pub fn index_of(&self, entity: &E) -> Option<usize> {
        position_of(&self.all, entity)
    }

    pub fn on_filter_change(&mut self, listener: Listener<FilterChange>) {
        self.listeners.push(listener);
    }

    fn apply(&mut self) {
        let keywords = &self.keywords;
        self.filtered = self
            .all
            .iter()
            .enumerate()
            .filter(|(_, entity)| matches_keywords(*entity, keywords))
            .map(|(index, _)| index)
            .collect();
    }
}

impl<E: Entity + Searchable> Default for FilterablePanel<E> {
    fn default() -> Self {
        Self::new()
    }
}
