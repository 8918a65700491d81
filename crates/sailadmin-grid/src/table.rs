// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::filter::{FilterChange, FilterablePanel, Searchable};
use crate::identity::Entity;
use crate::natural::natural_cmp_ignore_case;
use crate::notify::Listener;
use crate::selection::{
    MultiSelectionModel, RefreshableSelectionModel, SelectionChange, SingleSelectionModel,
};

pub const DEFAULT_PAGE_SIZE: usize = 100;

const SELECTION_HEADER: &str = "✓";
const CHECKED: &str = "[x]";
const UNCHECKED: &str = "[ ]";

pub type CellValue<E> = Box<dyn Fn(&E) -> String>;
pub type Comparator<E> = Box<dyn Fn(&E, &E) -> Ordering>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Asc => " ↑",
            Self::Desc => " ↓",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: usize,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortStatus {
    Asc(String),
    Desc(String),
    Cleared,
    Unavailable,
}

enum ColumnSort<E> {
    Natural,
    By(Comparator<E>),
    Disabled,
}

enum ColumnKind<E> {
    Data {
        value: CellValue<E>,
        sort: ColumnSort<E>,
    },
    Selection,
}

pub struct Column<E> {
    header: String,
    kind: ColumnKind<E>,
}

impl<E> Column<E> {
    /// Sorts on the rendered value using case-insensitive natural ordering.
    pub fn text(header: impl Into<String>, value: impl Fn(&E) -> String + 'static) -> Self {
        Self {
            header: header.into(),
            kind: ColumnKind::Data {
                value: Box::new(value),
                sort: ColumnSort::Natural,
            },
        }
    }

    pub fn with_comparator(
        header: impl Into<String>,
        value: impl Fn(&E) -> String + 'static,
        comparator: impl Fn(&E, &E) -> Ordering + 'static,
    ) -> Self {
        Self {
            header: header.into(),
            kind: ColumnKind::Data {
                value: Box::new(value),
                sort: ColumnSort::By(Box::new(comparator)),
            },
        }
    }

    pub fn unsortable(header: impl Into<String>, value: impl Fn(&E) -> String + 'static) -> Self {
        Self {
            header: header.into(),
            kind: ColumnKind::Data {
                value: Box::new(value),
                sort: ColumnSort::Disabled,
            },
        }
    }

    fn selection() -> Self {
        Self {
            header: SELECTION_HEADER.to_owned(),
            kind: ColumnKind::Selection,
        }
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn is_sortable(&self) -> bool {
        !matches!(
            self.kind,
            ColumnKind::Data {
                sort: ColumnSort::Disabled,
                ..
            }
        )
    }

    pub fn is_selection(&self) -> bool {
        matches!(self.kind, ColumnKind::Selection)
    }

    fn cell(&self, entity: &E, selected: bool) -> String {
        match &self.kind {
            ColumnKind::Data { value, .. } => value(entity),
            ColumnKind::Selection if selected => CHECKED.to_owned(),
            ColumnKind::Selection => UNCHECKED.to_owned(),
        }
    }

    fn compare(&self, left: &E, right: &E, is_selected: impl Fn(&E) -> bool) -> Ordering {
        match &self.kind {
            ColumnKind::Data {
                value,
                sort: ColumnSort::Natural,
            } => natural_cmp_ignore_case(&value(left), &value(right)),
            ColumnKind::Data {
                sort: ColumnSort::By(comparator),
                ..
            } => comparator(left, right),
            ColumnKind::Data {
                sort: ColumnSort::Disabled,
                ..
            } => Ordering::Equal,
            ColumnKind::Selection => is_selected(right).cmp(&is_selected(left)),
        }
    }
}

impl<E> fmt::Debug for Column<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("header", &self.header)
            .field("sortable", &self.is_sortable())
            .finish()
    }
}

/// Zero-based page cursor over a fixed page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page_size: usize,
    page: usize,
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            page: 0,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size).max(1)
    }

    pub fn range(&self, total: usize) -> Range<usize> {
        let start = (self.page * self.page_size).min(total);
        let end = (start + self.page_size).min(total);
        start..end
    }

    pub fn clamp(&mut self, total: usize) {
        self.page = self.page.min(self.page_count(total) - 1);
    }

    pub fn summary(&self, total: usize) -> String {
        let range = self.range(total);
        if range.is_empty() {
            return format!("0 of {total}");
        }
        format!("{}-{} of {total}", range.start + 1, range.end)
    }
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub cells: Vec<String>,
    pub selected: bool,
}

/// Everything a renderer needs for one frame of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub headers: Vec<String>,
    pub rows: Vec<RowView>,
    pub pager: Option<String>,
    pub matched: usize,
    pub total: usize,
    pub selected: usize,
}

/// Sortable, optionally paged grid over a [`FilterablePanel`] with a
/// selection model that survives refreshes.
pub struct TableWrapper<E, S> {
    panel: FilterablePanel<E>,
    selection: S,
    columns: Vec<Column<E>>,
    sort: Option<SortSpec>,
    pager: Option<Pager>,
    order: Vec<usize>,
}

impl<E, S> TableWrapper<E, S>
where
    E: Entity + Searchable,
    S: RefreshableSelectionModel<E>,
{
    /// Replaces the full collection, reapplies the filter, reconciles the
    /// selection against the new records, then reapplies sort and paging.
    pub fn refresh(&mut self, entities: Vec<E>) {
        self.panel.update_all(entities);
        self.selection.refresh_selection_model(self.panel.all());
        self.reorder();
        debug!(
            "table refreshed: {} records, {} visible, {} selected",
            self.panel.all().len(),
            self.order.len(),
            self.selection.selected_count()
        );
    }

    /// Applies `query`. A changed query returns to the first page; the same
    /// query keeps the current page.
    pub fn filter(&mut self, query: &str) {
        let changed = self.panel.query() != query;
        self.panel.filter(query);
        if changed && let Some(pager) = self.pager.as_mut() {
            pager.page = 0;
        }
        self.reorder();
    }

    pub fn add(&mut self, entity: E) {
        self.panel.add(entity);
        self.reorder();
    }

    pub fn add_all(&mut self, entities: impl IntoIterator<Item = E>) {
        self.panel.add_all(entities);
        self.reorder();
    }

    /// Removes by identity and drops the record from the selection.
    pub fn remove(&mut self, entity: &E) -> bool
    where
        E: PartialEq,
    {
        let removed = self.panel.remove(entity);
        if removed {
            self.selection.set_selected(entity, false);
            self.reorder();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.panel.clear();
        self.selection.clear();
        self.reorder();
    }

    /// Deselects everything while keeping the rows.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.reorder();
    }

    pub fn sort_by(&mut self, column: usize, direction: SortDirection) -> bool {
        if !self.columns.get(column).is_some_and(Column::is_sortable) {
            return false;
        }
        self.sort = Some(SortSpec { column, direction });
        self.reorder();
        true
    }

    /// Cycles the sort on `column` through ascending, descending, and off.
    pub fn toggle_sort(&mut self, column: usize) -> SortStatus {
        let Some(header) = self
            .columns
            .get(column)
            .filter(|col| col.is_sortable())
            .map(|col| col.header.clone())
        else {
            return SortStatus::Unavailable;
        };
        let next = match self.sort {
            Some(SortSpec {
                column: current,
                direction: SortDirection::Asc,
            }) if current == column => Some(SortDirection::Desc),
            Some(SortSpec {
                column: current,
                direction: SortDirection::Desc,
            }) if current == column => None,
            _ => Some(SortDirection::Asc),
        };
        self.sort = next.map(|direction| SortSpec { column, direction });
        self.reorder();
        match next {
            Some(SortDirection::Asc) => SortStatus::Asc(header),
            Some(SortDirection::Desc) => SortStatus::Desc(header),
            None => SortStatus::Cleared,
        }
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
        self.reorder();
    }

    pub fn sort(&self) -> Option<SortSpec> {
        self.sort
    }

    pub fn next_page(&mut self) -> bool {
        let total = self.order.len();
        match self.pager.as_mut() {
            Some(pager) if pager.page + 1 < pager.page_count(total) => {
                pager.page += 1;
                true
            }
            _ => false,
        }
    }

    pub fn prev_page(&mut self) -> bool {
        match self.pager.as_mut() {
            Some(pager) if pager.page > 0 => {
                pager.page -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn set_page(&mut self, page: usize) {
        let total = self.order.len();
        if let Some(pager) = self.pager.as_mut() {
            pager.page = page;
            pager.clamp(total);
        }
    }

    pub fn page(&self) -> usize {
        self.pager.map_or(0, |pager| pager.page)
    }

    pub fn page_count(&self) -> usize {
        self.pager
            .map_or(1, |pager| pager.page_count(self.order.len()))
    }

    pub fn page_summary(&self) -> Option<String> {
        self.pager.map(|pager| pager.summary(self.order.len()))
    }

    /// Rows of the current page in display order.
    pub fn visible_rows(&self) -> Vec<&E> {
        let all = self.panel.all();
        self.visible_range()
            .filter_map(|position| self.order.get(position))
            .map(|&index| &all[index])
            .collect()
    }

    pub fn visible_len(&self) -> usize {
        self.visible_range().len()
    }

    pub fn visible_row(&self, row: usize) -> Option<&E> {
        let range = self.visible_range();
        let position = range.start + row;
        if position >= range.end {
            return None;
        }
        self.order
            .get(position)
            .map(|&index| &self.panel.all()[index])
    }

    /// Selects or deselects the `row`th visible row. Returns false when the
    /// row does not exist.
    pub fn select_visible(&mut self, row: usize, selected: bool) -> bool {
        let Some(entity) = self.visible_row(row).cloned() else {
            return false;
        };
        self.selection.set_selected(&entity, selected);
        self.resort_on_selection();
        true
    }

    pub fn toggle_visible(&mut self, row: usize) -> bool {
        let Some(entity) = self.visible_row(row).cloned() else {
            return false;
        };
        self.selection.toggle(&entity);
        self.resort_on_selection();
        true
    }

    pub fn selected(&self) -> Vec<E> {
        self.selection.selected_set()
    }

    pub fn single_selected_or_none(&self) -> Option<E> {
        self.selection.single_selected_or_none()
    }

    pub fn all(&self) -> &[E] {
        self.panel.all()
    }

    pub fn filtered_len(&self) -> usize {
        self.order.len()
    }

    pub fn query(&self) -> &str {
        self.panel.query()
    }

    pub fn columns(&self) -> &[Column<E>] {
        &self.columns
    }

    pub fn selection(&self) -> &S {
        &self.selection
    }

    pub fn on_selection_change(&mut self, listener: Listener<SelectionChange<E>>) {
        self.selection.on_selection_change(listener);
    }

    pub fn on_filter_change(&mut self, listener: Listener<FilterChange>) {
        self.panel.on_filter_change(listener);
    }

    pub fn view(&self) -> TableView {
        let headers = self
            .columns
            .iter()
            .enumerate()
            .map(|(index, column)| match self.sort {
                Some(sort) if sort.column == index => {
                    format!("{}{}", column.header, sort.direction.marker())
                }
                _ => column.header.clone(),
            })
            .collect();
        let rows = self
            .visible_rows()
            .into_iter()
            .map(|entity| {
                let selected = self.selection.is_selected(entity);
                RowView {
                    cells: self
                        .columns
                        .iter()
                        .map(|column| column.cell(entity, selected))
                        .collect(),
                    selected,
                }
            })
            .collect();
        TableView {
            headers,
            rows,
            pager: self.page_summary(),
            matched: self.order.len(),
            total: self.panel.all().len(),
            selected: self.selection.selected_count(),
        }
    }

    fn visible_range(&self) -> Range<usize> {
        let total = self.order.len();
        match self.pager {
            Some(pager) => pager.range(total),
            None => 0..total,
        }
    }

    fn resort_on_selection(&mut self) {
        let by_selection = self
            .sort
            .and_then(|sort| self.columns.get(sort.column))
            .is_some_and(Column::is_selection);
        if by_selection {
            self.reorder();
        }
    }

    fn reorder(&mut self) {
        let all = self.panel.all();
        let mut order = self.panel.filtered_indices().to_vec();
        if let Some(sort) = self.sort
            && let Some(column) = self.columns.get(sort.column)
        {
            let selection = &self.selection;
            order.sort_by(|&left, &right| {
                let ordering =
                    column.compare(&all[left], &all[right], |entity| selection.is_selected(entity));
                match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }
        self.order = order;
        let total = self.order.len();
        if let Some(pager) = self.pager.as_mut() {
            pager.clamp(total);
        }
    }
}

impl<E, S> fmt::Debug for TableWrapper<E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableWrapper")
            .field("columns", &self.columns)
            .field("sort", &self.sort)
            .field("pager", &self.pager)
            .field("visible", &self.order.len())
            .finish()
    }
}

/// Assembles a [`TableWrapper`] from columns, optional paging, and an
/// injected selection model.
pub struct TableBuilder<E> {
    columns: Vec<Column<E>>,
    page_size: Option<usize>,
    selection_column: bool,
    entities: Vec<E>,
}

impl<E> TableBuilder<E>
where
    E: Entity + Searchable,
{
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            page_size: None,
            selection_column: true,
            entities: Vec::new(),
        }
    }

    pub fn column(mut self, column: Column<E>) -> Self {
        self.columns.push(column);
        self
    }

    pub fn pager(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn paged(self, enabled: bool, page_size: usize) -> Self {
        if enabled { self.pager(page_size) } else { self }
    }

    /// Multi-selection tables get a leading checkbox column unless this is
    /// turned off.
    pub fn selection_column(mut self, enabled: bool) -> Self {
        self.selection_column = enabled;
        self
    }

    pub fn entities(mut self, entities: Vec<E>) -> Self {
        self.entities = entities;
        self
    }

    pub fn build_multi(self) -> TableWrapper<E, MultiSelectionModel<E>> {
        self.build_with(MultiSelectionModel::new())
    }

    pub fn build_single(self) -> TableWrapper<E, SingleSelectionModel<E>> {
        self.build_with(SingleSelectionModel::new())
    }

    pub fn build_with<S: RefreshableSelectionModel<E>>(self, selection: S) -> TableWrapper<E, S> {
        let mut columns = self.columns;
        if self.selection_column && selection.is_multi() {
            columns.insert(0, Column::selection());
        }
        let mut table = TableWrapper {
            panel: FilterablePanel::with_entities(self.entities),
            selection,
            columns,
            sort: None,
            pager: self.page_size.map(Pager::new),
            order: Vec::new(),
        };
        table.reorder();
        table
    }
}

impl<E> Default for TableBuilder<E>
where
    E: Entity + Searchable,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{Column, Pager, SortDirection, SortStatus, TableBuilder, TableWrapper};
    use crate::filter::Searchable;
    use crate::identity::{Entity, non_blank};
    use crate::selection::{MultiSelectionModel, RefreshableSelectionModel};

    #[derive(Debug, Clone, PartialEq)]
    struct Race {
        id: String,
        name: String,
        fleet: String,
    }

    impl Entity for Race {
        type Key = String;

        fn identity(&self) -> Option<String> {
            non_blank(&self.id).map(str::to_owned)
        }
    }

    impl Searchable for Race {
        fn searchable_strings(&self) -> Vec<String> {
            vec![self.name.clone(), self.fleet.clone()]
        }
    }

    fn race(id: &str, name: &str, fleet: &str) -> Race {
        Race {
            id: id.to_owned(),
            name: name.to_owned(),
            fleet: fleet.to_owned(),
        }
    }

    fn races() -> Vec<Race> {
        vec![
            race("a", "Race 10", "Gold"),
            race("b", "Race 2", "Silver"),
            race("c", "Race 1", "Gold"),
            race("d", "Medal", "Gold"),
        ]
    }

    fn table(page_size: Option<usize>) -> TableWrapper<Race, MultiSelectionModel<Race>> {
        let builder = TableBuilder::new()
            .column(Column::text("Name", |r: &Race| r.name.clone()))
            .column(Column::unsortable("Fleet", |r: &Race| r.fleet.clone()))
            .entities(races());
        match page_size {
            Some(size) => builder.pager(size).build_multi(),
            None => builder.build_multi(),
        }
    }

    fn visible_ids<S: RefreshableSelectionModel<Race>>(table: &TableWrapper<Race, S>) -> Vec<&str> {
        table
            .visible_rows()
            .into_iter()
            .map(|r| r.id.as_str())
            .collect()
    }

    #[test]
    fn multi_tables_lead_with_selection_column() {
        let table = table(None);
        let headers: Vec<&str> = table.columns().iter().map(Column::header).collect();
        assert_eq!(headers, vec!["✓", "Name", "Fleet"]);

        let single = TableBuilder::new()
            .column(Column::text("Name", |r: &Race| r.name.clone()))
            .build_single();
        assert_eq!(single.columns().len(), 1);
    }

    #[test]
    fn toggle_sort_cycles_asc_desc_off() {
        let mut table = table(None);
        assert_eq!(table.toggle_sort(1), SortStatus::Asc("Name".to_owned()));
        assert_eq!(visible_ids(&table), vec!["d", "c", "b", "a"]);

        assert_eq!(table.toggle_sort(1), SortStatus::Desc("Name".to_owned()));
        assert_eq!(visible_ids(&table), vec!["a", "b", "c", "d"]);

        assert_eq!(table.toggle_sort(1), SortStatus::Cleared);
        assert_eq!(visible_ids(&table), vec!["a", "b", "c", "d"]);
        assert_eq!(table.sort(), None);
    }

    #[test]
    fn unsortable_columns_are_rejected() {
        let mut table = table(None);
        assert_eq!(table.toggle_sort(2), SortStatus::Unavailable);
        assert_eq!(table.toggle_sort(9), SortStatus::Unavailable);
        assert!(!table.sort_by(2, SortDirection::Asc));
        assert_eq!(table.sort(), None);
    }

    #[test]
    fn sort_is_stable_on_ties() {
        let mut table = TableBuilder::new()
            .column(Column::text("Fleet", |r: &Race| r.fleet.clone()))
            .entities(races())
            .build_single();
        assert!(table.sort_by(0, SortDirection::Asc));
        assert_eq!(visible_ids(&table), vec!["a", "c", "d", "b"]);
    }

    #[test]
    fn selection_column_sorts_selected_first() {
        let mut table = table(None);
        table.select_visible(2, true);
        assert!(table.sort_by(0, SortDirection::Asc));
        assert_eq!(visible_ids(&table), vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn toggling_resorts_a_selection_sorted_table() {
        let mut table = table(None);
        assert!(table.sort_by(0, SortDirection::Asc));
        assert!(table.toggle_visible(3));
        assert_eq!(visible_ids(&table), vec!["d", "a", "b", "c"]);
    }

    #[test]
    fn paging_slices_the_sorted_filtered_view() {
        let mut table = table(Some(2));
        assert_eq!(visible_ids(&table), vec!["a", "b"]);
        assert!(table.next_page());
        assert_eq!(visible_ids(&table), vec!["c", "d"]);
        assert!(!table.next_page());
        assert_eq!(table.page_summary().as_deref(), Some("3-4 of 4"));

        table.filter("");
        assert_eq!(visible_ids(&table), vec!["c", "d"]);

        table.filter("gold");
        assert_eq!(table.page(), 0);
        assert_eq!(visible_ids(&table), vec!["a", "c"]);
    }

    #[test]
    fn refresh_clamps_page_and_reconciles_selection() {
        let mut table = table(Some(2));
        table.set_page(1);
        table.select_visible(0, true);
        assert_eq!(table.selected(), vec![race("c", "Race 1", "Gold")]);

        table.refresh(vec![race("c", "Race 1 (resailed)", "Gold"), race("z", "New", "Bronze")]);

        assert_eq!(table.page(), 0);
        assert_eq!(table.selected(), vec![race("c", "Race 1 (resailed)", "Gold")]);
        assert_eq!(table.page_count(), 1);
    }

    #[test]
    fn refresh_keeps_sort() {
        let mut table = table(None);
        table.sort_by(1, SortDirection::Asc);
        table.refresh(vec![race("x", "Race 20", "Gold"), race("y", "Race 3", "Gold")]);
        assert_eq!(visible_ids(&table), vec!["y", "x"]);
    }

    #[test]
    fn remove_drops_selection() {
        let mut table = table(None);
        table.select_visible(0, true);
        assert!(table.remove(&race("a", "", "")));
        assert!(table.selected().is_empty());
        assert_eq!(table.filtered_len(), 3);
    }

    #[test]
    fn clear_selection_keeps_rows() {
        let mut table = table(None);
        table.select_visible(0, true);
        table.select_visible(1, true);
        table.clear_selection();
        assert!(table.selected().is_empty());
        assert_eq!(table.all().len(), 4);
    }

    #[test]
    fn view_marks_sort_and_selection() {
        let mut table = table(Some(3));
        table.toggle_sort(1);
        table.toggle_visible(0);

        let view = table.view();
        assert_eq!(view.headers, vec!["✓", "Name ↑", "Fleet"]);
        assert_eq!(view.rows.len(), 3);
        assert_eq!(view.rows[0].cells, vec!["[x]", "Medal", "Gold"]);
        assert!(view.rows[0].selected);
        assert!(!view.rows[1].selected);
        assert_eq!(view.pager.as_deref(), Some("1-3 of 4"));
        assert_eq!((view.matched, view.total, view.selected), (4, 4, 1));
    }

    #[test]
    fn out_of_range_rows_are_ignored() {
        let mut table = table(Some(2));
        assert!(!table.select_visible(2, true));
        assert!(!table.toggle_visible(5));
        assert!(table.selected().is_empty());
    }

    #[test]
    fn pager_summary_and_bounds() {
        let mut pager = Pager::new(100);
        assert_eq!(pager.summary(250), "1-100 of 250");
        assert_eq!(pager.page_count(250), 3);
        assert_eq!(pager.summary(0), "0 of 0");
        assert_eq!(pager.page_count(0), 1);
        pager.page = 7;
        pager.clamp(250);
        assert_eq!(pager.page(), 2);
        assert_eq!(pager.range(250), 200..250);
        assert_eq!(Pager::new(0).page_size(), 1);
    }
}
