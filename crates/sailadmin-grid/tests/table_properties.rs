// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use sailadmin_grid::{
    Column, Entity, FetchDisposition, FetchGenerations, FilterablePanel, MultiSelectionModel,
    RefreshableSelectionModel, Searchable, SelectionCause, SortDirection, TableBuilder,
    TableWrapper, apply_fetch, non_blank,
};

#[derive(Debug, Clone, PartialEq)]
struct Sailor {
    id: String,
    name: String,
}

impl Entity for Sailor {
    type Key = String;

    fn identity(&self) -> Option<String> {
        non_blank(&self.id).map(str::to_owned)
    }
}

impl Searchable for Sailor {
    fn searchable_strings(&self) -> Vec<String> {
        vec![self.name.clone(), self.id.clone()]
    }
}

fn sailor(id: &str, name: &str) -> Sailor {
    Sailor {
        id: id.to_owned(),
        name: name.to_owned(),
    }
}

fn roster(table_page_size: usize) -> TableWrapper<Sailor, MultiSelectionModel<Sailor>> {
    TableBuilder::new()
        .column(Column::text("Name", |s: &Sailor| s.name.clone()))
        .column(Column::text("Id", |s: &Sailor| s.id.clone()))
        .pager(table_page_size)
        .build_multi()
}

#[test]
fn refresh_keeps_exactly_the_surviving_identities() {
    let mut model = MultiSelectionModel::new();
    for id in ["1", "3", "5", "7"] {
        model.set_selected(&sailor(id, "before"), true);
    }
    let fresh: Vec<Sailor> = (0..6).map(|n| sailor(&n.to_string(), "after")).collect();

    model.refresh_selection_model(&fresh);

    let kept: HashSet<String> = model
        .selected_set()
        .iter()
        .filter_map(Entity::identity)
        .collect();
    let expected: HashSet<String> = ["1", "3", "5"].iter().map(|s| (*s).to_owned()).collect();
    assert_eq!(kept, expected);
    assert!(model.selected_set().iter().all(|s| s.name == "after"));
}

#[test]
fn filtering_twice_matches_filtering_once() {
    let mut panel =
        FilterablePanel::with_entities(vec![sailor("1", "Ann"), sailor("2", "Anders"), sailor("3", "Bo")]);
    panel.filter("an");
    let once: Vec<Sailor> = panel.filtered().cloned().collect();
    panel.filter("an");
    let twice: Vec<Sailor> = panel.filtered().cloned().collect();
    assert_eq!(once, twice);
    assert_eq!(once.len(), 2);
}

#[test]
fn empty_filter_returns_full_collection() {
    let all = vec![sailor("1", "Ann"), sailor("2", "Bo"), sailor("3", "Cy")];
    let mut panel = FilterablePanel::with_entities(all.clone());
    panel.filter("bo");
    panel.filter("");
    let visible: Vec<Sailor> = panel.filtered().cloned().collect();
    assert_eq!(visible, all);
    assert_eq!(panel.all(), all.as_slice());
}

#[test]
fn remove_all_undoes_add_all() {
    let original = vec![sailor("1", "Ann"), sailor("2", "Bo")];
    let mut panel = FilterablePanel::with_entities(original.clone());
    let extra = vec![sailor("8", "Hal"), sailor("", "Unregistered"), sailor("9", "Ida")];

    panel.add_all(extra.clone());
    assert_eq!(panel.all().len(), 5);
    assert_eq!(panel.remove_all(&extra), 3);

    assert_eq!(panel.all(), original.as_slice());
}

#[test]
fn query_matches_case_insensitive_substrings() {
    let mut panel = FilterablePanel::with_entities(vec![sailor("1", "Alpha"), sailor("2", "beta")]);
    panel.filter("AL");
    let names: Vec<&str> = panel.filtered().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha"]);
}

#[test]
fn renamed_entity_stays_selected_as_new_instance() {
    let mut table = roster(10);
    table.refresh(vec![sailor("42", "Old")]);
    assert!(table.select_visible(0, true));

    table.refresh(vec![sailor("42", "New")]);

    assert_eq!(table.selected(), vec![sailor("42", "New")]);
}

#[test]
fn vanished_entity_leaves_selection() {
    let mut table = roster(10);
    table.refresh(vec![sailor("7", "Gone")]);
    table.select_visible(0, true);

    table.refresh(vec![sailor("8", "Other")]);

    assert!(table.selected().is_empty());
}

#[test]
fn second_page_is_stable_across_noop_filter() {
    let mut table = roster(2);
    table.refresh(vec![
        sailor("a", "A"),
        sailor("b", "B"),
        sailor("c", "C"),
        sailor("d", "D"),
    ]);
    table.sort_by(1, SortDirection::Desc);
    table.clear_sort();

    assert!(table.next_page());
    let page: Vec<String> = table.visible_rows().iter().map(|s| s.id.clone()).collect();
    assert_eq!(page, vec!["c", "d"]);

    table.filter("");
    let again: Vec<String> = table.visible_rows().iter().map(|s| s.id.clone()).collect();
    assert_eq!(again, page);
}

#[test]
fn refresh_fires_one_selection_notification() {
    let mut table = roster(10);
    table.refresh(vec![sailor("1", "a"), sailor("2", "b"), sailor("3", "c")]);
    table.select_visible(0, true);
    table.select_visible(1, true);

    let causes = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&causes);
    table.on_selection_change(Box::new(move |change| sink.borrow_mut().push(change.cause)));

    table.refresh(vec![sailor("2", "b"), sailor("1", "a")]);

    assert_eq!(*causes.borrow(), vec![SelectionCause::Refresh]);
    assert_eq!(table.selected().len(), 2);
}

#[test]
fn out_of_order_fetches_apply_only_the_latest() {
    let mut table = roster(10);
    let mut generations = FetchGenerations::new();
    let first = generations.issue();
    let second = generations.issue();

    let newest = apply_fetch(&mut table, &generations, second, Ok(vec![sailor("2", "new")]));
    let oldest = apply_fetch(&mut table, &generations, first, Ok(vec![sailor("1", "old")]));

    assert_eq!(newest, FetchDisposition::Applied { rows: 1 });
    assert_eq!(oldest, FetchDisposition::Stale);
    assert_eq!(table.all(), &[sailor("2", "new")]);
}
