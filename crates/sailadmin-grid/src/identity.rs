// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};

const MISSING_IDENTITY_HASH: u64 = 0;

/// A record whose logical identity survives serialization round-trips even
/// though its object identity does not.
///
/// `identity` returns `None` for records with a missing or blank identifier.
/// Such records never compare equal to anything, including each other.
pub trait Entity: Clone {
    type Key: Clone + Eq + Hash + Debug;

    fn identity(&self) -> Option<Self::Key>;
}

pub fn represent_same_entity<E: Entity>(left: &E, right: &E) -> bool {
    match (left.identity(), right.identity()) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

/// Hash consistent with [`represent_same_entity`]: equal identities hash
/// equally, and identity-less records all share one sentinel value.
pub fn identity_hash<E: Entity>(entity: &E) -> u64 {
    match entity.identity() {
        Some(key) => {
            let mut hasher = DefaultHasher::new();
            key.hash(&mut hasher);
            hasher.finish()
        }
        None => MISSING_IDENTITY_HASH,
    }
}

pub fn identity_keys<'a, E, I>(entities: I) -> HashSet<E::Key>
where
    E: Entity + 'a,
    I: IntoIterator<Item = &'a E>,
{
    entities
        .into_iter()
        .filter_map(Entity::identity)
        .collect()
}

pub fn position_of<E: Entity>(entities: &[E], target: &E) -> Option<usize> {
    let key = target.identity()?;
    entities
        .iter()
        .position(|entity| entity.identity().as_ref() == Some(&key))
}

/// Treats blank identifiers as missing.
pub fn non_blank(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(raw)
    }
}
