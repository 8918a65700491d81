// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use log::{debug, warn};

use crate::identity::{Entity, identity_keys};
use crate::notify::{Listener, Listeners};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionCause {
    User,
    Refresh,
    Cleared,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChange<E> {
    pub cause: SelectionCause,
    pub selected: Vec<E>,
}

/// Selection keyed by logical identity that can be reconciled against a
/// freshly fetched collection.
pub trait RefreshableSelectionModel<E: Entity> {
    /// Adds or removes `entity`. Repeating the same call is a no-op and fires
    /// no notification. Records without an identity cannot be selected.
    fn set_selected(&mut self, entity: &E, selected: bool);

    fn is_selected(&self, entity: &E) -> bool;

    /// Snapshot of the selection; later changes do not affect it.
    fn selected_set(&self) -> Vec<E>;

    fn selected_count(&self) -> usize;

    fn clear(&mut self);

    /// Keeps only previously selected records whose identity occurs in
    /// `full_list`, swapping each for its instance from `full_list`. Fires
    /// exactly one notification once the new selection is in place.
    fn refresh_selection_model(&mut self, full_list: &[E]);

    fn on_selection_change(&mut self, listener: Listener<SelectionChange<E>>);

    fn is_multi(&self) -> bool;

    fn single_selected_or_none(&self) -> Option<E> {
        let mut selected = self.selected_set();
        if selected.len() == 1 {
            selected.pop()
        } else {
            None
        }
    }

    fn toggle(&mut self, entity: &E) {
        let selected = self.is_selected(entity);
        self.set_selected(entity, !selected);
    }
}

impl<E: Entity, M: RefreshableSelectionModel<E> + ?Sized> RefreshableSelectionModel<E> for Box<M> {
    fn set_selected(&mut self, entity: &E, selected: bool) {
        (**self).set_selected(entity, selected);
    }

    fn is_selected(&self, entity: &E) -> bool {
        (**self).is_selected(entity)
    }

    fn selected_set(&self) -> Vec<E> {
        (**self).selected_set()
    }

    fn selected_count(&self) -> usize {
        (**self).selected_count()
    }

    fn clear(&mut self) {
        (**self).clear();
    }

    fn refresh_selection_model(&mut self, full_list: &[E]) {
        (**self).refresh_selection_model(full_list);
    }

    fn on_selection_change(&mut self, listener: Listener<SelectionChange<E>>) {
        (**self).on_selection_change(listener);
    }

    fn is_multi(&self) -> bool {
        (**self).is_multi()
    }

    fn single_selected_or_none(&self) -> Option<E> {
        (**self).single_selected_or_none()
    }
}

fn reconcile<E: Entity>(previous: &[E], full_list: &[E]) -> Vec<E> {
    let wanted = identity_keys(previous);
    let mut seen = std::collections::HashSet::new();
    full_list
        .iter()
        .filter(|entity| {
            entity
                .identity()
                .is_some_and(|key| wanted.contains(&key) && seen.insert(key))
        })
        .cloned()
        .collect()
}

#[derive(Debug)]
pub struct MultiSelectionModel<E: Entity> {
    selected: Vec<E>,
    listeners: Listeners<SelectionChange<E>>,
}

impl<E: Entity> MultiSelectionModel<E> {
    pub fn new() -> Self {
        Self {
            selected: Vec::new(),
            listeners: Listeners::new(),
        }
    }

    fn position(&self, key: &E::Key) -> Option<usize> {
        self.selected
            .iter()
            .position(|entity| entity.identity().as_ref() == Some(key))
    }

    fn notify(&mut self, cause: SelectionCause) {
        let change = SelectionChange {
            cause,
            selected: self.selected.clone(),
        };
        self.listeners.emit(&change);
    }
}

impl<E: Entity> Default for MultiSelectionModel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> RefreshableSelectionModel<E> for MultiSelectionModel<E> {
    fn set_selected(&mut self, entity: &E, selected: bool) {
        let Some(key) = entity.identity() else {
            warn!("ignoring selection of a record without identity");
            return;
        };
        match (self.position(&key), selected) {
            (None, true) => {
                self.selected.push(entity.clone());
                self.notify(SelectionCause::User);
            }
            (Some(index), false) => {
                self.selected.remove(index);
                self.notify(SelectionCause::User);
            }
            _ => {}
        }
    }

    fn is_selected(&self, entity: &E) -> bool {
        entity
            .identity()
            .is_some_and(|key| self.position(&key).is_some())
    }

    fn selected_set(&self) -> Vec<E> {
        self.selected.clone()
    }

    fn selected_count(&self) -> usize {
        self.selected.len()
    }

    fn clear(&mut self) {
        if self.selected.is_empty() {
            return;
        }
        self.selected.clear();
        self.notify(SelectionCause::Cleared);
    }

    fn refresh_selection_model(&mut self, full_list: &[E]) {
        let before = self.selected.len();
        self.selected = reconcile(&self.selected, full_list);
        debug!(
            "selection reconciled: kept {} of {} against {} records",
            self.selected.len(),
            before,
            full_list.len()
        );
        self.notify(SelectionCause::Refresh);
    }

    fn on_selection_change(&mut self, listener: Listener<SelectionChange<E>>) {
        self.listeners.push(listener);
    }

    fn is_multi(&self) -> bool {
        true
    }
}

#[derive(Debug)]
pub struct SingleSelectionModel<E: Entity> {
    selected: Option<E>,
    listeners: Listeners<SelectionChange<E>>,
}

impl<E: Entity> SingleSelectionModel<E> {
    pub fn new() -> Self {
        Self {
            selected: None,
            listeners: Listeners::new(),
        }
    }

    pub fn selected(&self) -> Option<&E> {
        self.selected.as_ref()
    }

    fn selected_key(&self) -> Option<E::Key> {
        self.selected.as_ref().and_then(Entity::identity)
    }

    fn notify(&mut self, cause: SelectionCause) {
        let change = SelectionChange {
            cause,
            selected: self.selected.iter().cloned().collect(),
        };
        self.listeners.emit(&change);
    }
}

impl<E: Entity> Default for SingleSelectionModel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> RefreshableSelectionModel<E> for SingleSelectionModel<E> {
    fn set_selected(&mut self, entity: &E, selected: bool) {
        let Some(key) = entity.identity() else {
            warn!("ignoring selection of a record without identity");
            return;
        };
        let current = self.selected_key();
        if selected {
            if current.as_ref() == Some(&key) {
                return;
            }
            self.selected = Some(entity.clone());
            self.notify(SelectionCause::User);
        } else if current.as_ref() == Some(&key) {
            self.selected = None;
            self.notify(SelectionCause::User);
        }
    }

    fn is_selected(&self, entity: &E) -> bool {
        match (entity.identity(), self.selected_key()) {
            (Some(key), Some(current)) => key == current,
            _ => false,
        }
    }

    fn selected_set(&self) -> Vec<E> {
        self.selected.iter().cloned().collect()
    }

    fn selected_count(&self) -> usize {
        usize::from(self.selected.is_some())
    }

    fn clear(&mut self) {
        if self.selected.take().is_some() {
            self.notify(SelectionCause::Cleared);
        }
    }

    fn refresh_selection_model(&mut self, full_list: &[E]) {
        let previous: Vec<E> = self.selected.take().into_iter().collect();
        self.selected = reconcile(&previous, full_list).into_iter().next();
        debug!(
            "single selection reconciled: {}",
            if self.selected.is_some() {
                "kept"
            } else {
                "empty"
            }
        );
        self.notify(SelectionCause::Refresh);
    }

    fn on_selection_change(&mut self, listener: Listener<SelectionChange<E>>) {
        self.listeners.push(listener);
    }

    fn is_multi(&self) -> bool {
        false
    }
}
