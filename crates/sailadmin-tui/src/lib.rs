// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use log::{debug, info};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs};
use sailadmin_app::{
    AppCommand, AppEvent, AppMode, AppState, Competitor, Leaderboard, PanelKind, Regatta,
    RegattaName,
};
use sailadmin_grid::{
    Column, DEFAULT_PAGE_SIZE, Entity, FetchDisposition, FetchError, FetchGenerations,
    FetchOutcome, FetchToken, MultiSelectionModel, RefreshableSelectionModel, Searchable,
    SingleSelectionModel, SortStatus, TableBuilder, TableView, TableWrapper, apply_fetch,
};
use std::cell::Cell as FlagCell;
use std::io;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::OffsetDateTime;

const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const KEY_HINTS: &str =
    "tab panel | j/k h/l move | space select | s sort | / filter | n/p page | r refresh | c clear | q quit";

type SailingEvent = sailadmin_app::Event;
type Selection<E> = Box<dyn RefreshableSelectionModel<E>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiOptions {
    pub page_size: usize,
    pub enable_pager: bool,
    pub multi_selection: bool,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            enable_pager: true,
            multi_selection: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    Regattas,
    Competitors(RegattaName),
    Leaderboards,
    Events,
}

impl FetchRequest {
    pub fn panel(&self) -> PanelKind {
        match self {
            Self::Regattas => PanelKind::Regattas,
            Self::Competitors(_) => PanelKind::Competitors,
            Self::Leaderboards => PanelKind::Leaderboards,
            Self::Events => PanelKind::Events,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchedRows {
    Regattas(FetchOutcome<Regatta>),
    Competitors {
        regatta: RegattaName,
        outcome: FetchOutcome<Competitor>,
    },
    Leaderboards(FetchOutcome<Leaderboard>),
    Events(FetchOutcome<SailingEvent>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    Fetched { token: FetchToken, rows: FetchedRows },
}

pub trait AppRuntime {
    fn fetch_regattas(&mut self) -> Result<Vec<Regatta>>;
    fn fetch_competitors(&mut self, regatta: &RegattaName) -> Result<Vec<Competitor>>;
    fn fetch_leaderboards(&mut self) -> Result<Vec<Leaderboard>>;
    fn fetch_events(&mut self) -> Result<Vec<SailingEvent>>;

    fn fetch(&mut self, request: FetchRequest) -> FetchedRows {
        match request {
            FetchRequest::Regattas => {
                FetchedRows::Regattas(self.fetch_regattas().map_err(FetchError::from))
            }
            FetchRequest::Competitors(regatta) => {
                let outcome = self.fetch_competitors(&regatta).map_err(FetchError::from);
                FetchedRows::Competitors { regatta, outcome }
            }
            FetchRequest::Leaderboards => {
                FetchedRows::Leaderboards(self.fetch_leaderboards().map_err(FetchError::from))
            }
            FetchRequest::Events => {
                FetchedRows::Events(self.fetch_events().map_err(FetchError::from))
            }
        }
    }

    /// Runs `request` and posts the result on `tx`. Runtimes backed by a
    /// network override this to fetch on a worker thread.
    fn spawn_fetch(
        &mut self,
        request: FetchRequest,
        token: FetchToken,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let rows = self.fetch(request);
        tx.send(InternalEvent::Fetched { token, rows })
            .map_err(|_| anyhow!("fetch event channel closed"))?;
        Ok(())
    }
}

struct Panel<E: Entity + 'static> {
    table: TableWrapper<E, Selection<E>>,
    generations: FetchGenerations,
    cursor: usize,
    column: usize,
    loading: bool,
}

impl<E> Panel<E>
where
    E: Entity + Searchable + 'static,
{
    fn new(columns: Vec<Column<E>>, options: UiOptions) -> Self {
        let selection: Selection<E> = if options.multi_selection {
            Box::new(MultiSelectionModel::new())
        } else {
            Box::new(SingleSelectionModel::new())
        };
        let table = columns
            .into_iter()
            .fold(TableBuilder::new(), TableBuilder::column)
            .paged(options.enable_pager, options.page_size)
            .build_with(selection);
        let column = table
            .columns()
            .iter()
            .position(|column| !column.is_selection())
            .unwrap_or(0);
        Self {
            table,
            generations: FetchGenerations::new(),
            cursor: 0,
            column,
            loading: false,
        }
    }

    fn finish_fetch(&mut self, token: FetchToken, outcome: FetchOutcome<E>) -> FetchDisposition {
        let disposition = apply_fetch(&mut self.table, &self.generations, token, outcome);
        if disposition != FetchDisposition::Stale {
            self.loading = false;
        }
        self.clamp_cursor();
        disposition
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self
            .cursor
            .min(self.table.visible_len().saturating_sub(1));
    }
}

/// What the event loop needs from a panel regardless of its record type.
trait PanelControl {
    fn view(&self) -> TableView;
    fn cursor(&self) -> usize;
    fn column(&self) -> usize;
    fn is_loading(&self) -> bool;
    fn query(&self) -> String;
    fn move_cursor(&mut self, delta: isize);
    fn move_column(&mut self, delta: isize);
    fn toggle_at_cursor(&mut self) -> Option<usize>;
    fn clear_selection(&mut self);
    fn cycle_sort(&mut self) -> SortStatus;
    fn next_page(&mut self) -> bool;
    fn prev_page(&mut self) -> bool;
    fn apply_filter(&mut self, query: &str);
    fn begin_fetch(&mut self) -> FetchToken;
    fn abandon_fetch(&mut self);
}

impl<E> PanelControl for Panel<E>
where
    E: Entity + Searchable + 'static,
{
    fn view(&self) -> TableView {
        self.table.view()
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn column(&self) -> usize {
        self.column
    }

    fn is_loading(&self) -> bool {
        self.loading
    }

    fn query(&self) -> String {
        self.table.query().to_owned()
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.table.visible_len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let next = (self.cursor as isize + delta).clamp(0, len as isize - 1);
        self.cursor = next as usize;
    }

    fn move_column(&mut self, delta: isize) {
        let len = self.table.columns().len();
        if len == 0 {
            return;
        }
        let next = (self.column as isize + delta).clamp(0, len as isize - 1);
        self.column = next as usize;
    }

    fn toggle_at_cursor(&mut self) -> Option<usize> {
        if !self.table.toggle_visible(self.cursor) {
            return None;
        }
        Some(self.table.selection().selected_count())
    }

    fn clear_selection(&mut self) {
        self.table.clear_selection();
    }

    fn cycle_sort(&mut self) -> SortStatus {
        self.table.toggle_sort(self.column)
    }

    fn next_page(&mut self) -> bool {
        let moved = self.table.next_page();
        if moved {
            self.cursor = 0;
        }
        moved
    }

    fn prev_page(&mut self) -> bool {
        let moved = self.table.prev_page();
        if moved {
            self.cursor = 0;
        }
        moved
    }

    fn apply_filter(&mut self, query: &str) {
        self.table.filter(query);
        self.clamp_cursor();
    }

    fn begin_fetch(&mut self) -> FetchToken {
        self.loading = true;
        self.generations.issue()
    }

    fn abandon_fetch(&mut self) {
        self.generations.cancel();
        self.loading = false;
    }
}

struct Panels {
    regattas: Panel<Regatta>,
    competitors: Panel<Competitor>,
    leaderboards: Panel<Leaderboard>,
    events: Panel<SailingEvent>,
    competitors_of: Option<RegattaName>,
    regatta_selection_dirty: Rc<FlagCell<bool>>,
}

impl Panels {
    fn new(options: UiOptions) -> Self {
        let mut regattas = Panel::new(regatta_columns(), options);
        let regatta_selection_dirty = Rc::new(FlagCell::new(false));
        let flag = Rc::clone(&regatta_selection_dirty);
        regattas
            .table
            .on_selection_change(Box::new(move |_| flag.set(true)));
        Self {
            regattas,
            competitors: Panel::new(competitor_columns(), options),
            leaderboards: Panel::new(leaderboard_columns(), options),
            events: Panel::new(event_columns(), options),
            competitors_of: None,
            regatta_selection_dirty,
        }
    }

    fn get(&self, kind: PanelKind) -> &dyn PanelControl {
        match kind {
            PanelKind::Regattas => &self.regattas,
            PanelKind::Competitors => &self.competitors,
            PanelKind::Leaderboards => &self.leaderboards,
            PanelKind::Events => &self.events,
        }
    }

    fn get_mut(&mut self, kind: PanelKind) -> &mut dyn PanelControl {
        match kind {
            PanelKind::Regattas => &mut self.regattas,
            PanelKind::Competitors => &mut self.competitors,
            PanelKind::Leaderboards => &mut self.leaderboards,
            PanelKind::Events => &mut self.events,
        }
    }

    fn selected_regatta(&self) -> Option<RegattaName> {
        self.regattas
            .table
            .single_selected_or_none()
            .map(|regatta| regatta.name)
    }
}

struct ViewData {
    panels: Panels,
    status_token: u64,
}

impl ViewData {
    fn new(options: UiOptions) -> Self {
        Self {
            panels: Panels::new(options),
            status_token: 0,
        }
    }
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    options: UiOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(options);
    let (internal_tx, internal_rx) = mpsc::channel();

    for kind in [PanelKind::Regattas, PanelKind::Leaderboards, PanelKind::Events] {
        request_fetch(state, runtime, &mut view_data, &internal_tx, kind);
    }

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Fetched { token, rows } => {
                handle_fetched(state, view_data, tx, token, rows);
            }
        }
    }
}

fn handle_fetched(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    token: FetchToken,
    rows: FetchedRows,
) {
    let panels = &mut view_data.panels;
    let (kind, disposition) = match rows {
        FetchedRows::Regattas(outcome) => (
            PanelKind::Regattas,
            panels.regattas.finish_fetch(token, outcome),
        ),
        FetchedRows::Competitors { regatta, outcome } => {
            let disposition = panels.competitors.finish_fetch(token, outcome);
            if matches!(disposition, FetchDisposition::Applied { .. }) {
                panels.competitors_of = Some(regatta);
            }
            (PanelKind::Competitors, disposition)
        }
        FetchedRows::Leaderboards(outcome) => (
            PanelKind::Leaderboards,
            panels.leaderboards.finish_fetch(token, outcome),
        ),
        FetchedRows::Events(outcome) => (
            PanelKind::Events,
            panels.events.finish_fetch(token, outcome),
        ),
    };

    let label = kind.label();
    let message = match disposition {
        FetchDisposition::Applied { rows } => match (kind, &view_data.panels.competitors_of) {
            (PanelKind::Competitors, Some(regatta)) => {
                format!("{label}: loaded {rows} for {regatta}")
            }
            _ => format!("{label}: loaded {rows}"),
        },
        FetchDisposition::Stale => format!("{label}: dropped stale response"),
        FetchDisposition::Failed(error) => format!("{label}: fetch failed: {error}"),
    };
    emit_status(state, view_data, tx, message);
}

fn request_fetch<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    kind: PanelKind,
) {
    let request = match kind {
        PanelKind::Regattas => FetchRequest::Regattas,
        PanelKind::Leaderboards => FetchRequest::Leaderboards,
        PanelKind::Events => FetchRequest::Events,
        PanelKind::Competitors => {
            let Some(regatta) = view_data.panels.selected_regatta() else {
                emit_status(
                    state,
                    view_data,
                    tx,
                    "select exactly one regatta to list its competitors",
                );
                return;
            };
            FetchRequest::Competitors(regatta)
        }
    };

    let panel = view_data.panels.get_mut(kind);
    let token = panel.begin_fetch();
    debug!("requesting {} fetch {token}", kind.label());
    if let Err(error) = runtime.spawn_fetch(request, token, tx.clone()) {
        view_data.panels.get_mut(kind).abandon_fetch();
        emit_status(
            state,
            view_data,
            tx,
            format!("{}: fetch not started: {error:#}", kind.label()),
        );
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if state.mode == AppMode::Filter {
        handle_filter_key(state, view_data, key);
        return false;
    }

    let active = state.active_panel;
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Tab => {
            dispatch_and_follow(state, runtime, view_data, internal_tx, AppCommand::NextPanel);
        }
        KeyCode::BackTab => {
            dispatch_and_follow(state, runtime, view_data, internal_tx, AppCommand::PrevPanel);
        }
        KeyCode::Char('r') => {
            dispatch_and_follow(
                state,
                runtime,
                view_data,
                internal_tx,
                AppCommand::RequestRefresh,
            );
        }
        KeyCode::Char('/') => {
            state.dispatch(AppCommand::EnterFilterMode);
        }
        KeyCode::Char(' ') => {
            let message = match view_data.panels.get_mut(active).toggle_at_cursor() {
                Some(count) => format!("{count} selected"),
                None => "nothing to select".to_owned(),
            };
            emit_status(state, view_data, internal_tx, message);
        }
        KeyCode::Char('c') => {
            view_data.panels.get_mut(active).clear_selection();
            emit_status(state, view_data, internal_tx, "selection cleared");
        }
        KeyCode::Char('s') => {
            let message = match view_data.panels.get_mut(active).cycle_sort() {
                SortStatus::Asc(header) => format!("sort {header} ascending"),
                SortStatus::Desc(header) => format!("sort {header} descending"),
                SortStatus::Cleared => "sort cleared".to_owned(),
                SortStatus::Unavailable => "column is not sortable".to_owned(),
            };
            emit_status(state, view_data, internal_tx, message);
        }
        KeyCode::Char('n') | KeyCode::PageDown => {
            if !view_data.panels.get_mut(active).next_page() {
                emit_status(state, view_data, internal_tx, "last page");
            }
        }
        KeyCode::Char('p') | KeyCode::PageUp => {
            if !view_data.panels.get_mut(active).prev_page() {
                emit_status(state, view_data, internal_tx, "first page");
            }
        }
        KeyCode::Down | KeyCode::Char('j') => view_data.panels.get_mut(active).move_cursor(1),
        KeyCode::Up | KeyCode::Char('k') => view_data.panels.get_mut(active).move_cursor(-1),
        KeyCode::Right | KeyCode::Char('l') => view_data.panels.get_mut(active).move_column(1),
        KeyCode::Left | KeyCode::Char('h') => view_data.panels.get_mut(active).move_column(-1),
        _ => {}
    }
    false
}

fn handle_filter_key(state: &mut AppState, view_data: &mut ViewData, key: KeyEvent) {
    let panel = view_data.panels.get_mut(state.active_panel);
    match key.code {
        KeyCode::Esc => {
            panel.apply_filter("");
            state.dispatch(AppCommand::ExitToNav);
        }
        KeyCode::Enter => {
            state.dispatch(AppCommand::ExitToNav);
        }
        KeyCode::Backspace => {
            let mut query = panel.query();
            query.pop();
            panel.apply_filter(&query);
        }
        KeyCode::Char(ch) => {
            let mut query = panel.query();
            query.push(ch);
            panel.apply_filter(&query);
        }
        _ => {}
    }
}

fn dispatch_and_follow<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    for event in state.dispatch(command) {
        match event {
            AppEvent::RefreshRequested(kind) => {
                request_fetch(state, runtime, view_data, internal_tx, kind);
            }
            AppEvent::PanelChanged(PanelKind::Competitors) => {
                follow_regatta_selection(state, runtime, view_data, internal_tx);
            }
            AppEvent::PanelChanged(_)
            | AppEvent::ModeChanged(_)
            | AppEvent::StatusUpdated(_)
            | AppEvent::StatusCleared => {}
        }
    }
}

/// Reloads the competitors panel when the regatta selection moved since the
/// panel was last filled.
fn follow_regatta_selection<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if !view_data.panels.regatta_selection_dirty.replace(false) {
        return;
    }
    let selected = view_data.panels.selected_regatta();
    if selected.is_some() && selected != view_data.panels.competitors_of {
        info!("regatta selection changed; reloading competitors");
        request_fetch(state, runtime, view_data, internal_tx, PanelKind::Competitors);
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let titles = PanelKind::ALL
        .iter()
        .map(|kind| panel_title(*kind, view_data.panels.get(*kind)))
        .collect::<Vec<String>>();
    let tabs = Tabs::new(titles)
        .block(Block::default().title("sailadmin").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(state.active_panel.index());
    frame.render_widget(tabs, layout[0]);

    render_table(frame, layout[1], state, view_data);

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[2]);
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let panel = view_data.panels.get(state.active_panel);
    let view = panel.view();

    let widths = view
        .headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            if index == 0 && header.starts_with('✓') {
                Constraint::Length(3)
            } else {
                Constraint::Min(8)
            }
        })
        .collect::<Vec<_>>();

    let header = Row::new(view.headers.iter().enumerate().map(|(index, label)| {
        let mut style = Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);
        if index == panel.column() {
            style = style.fg(Color::Cyan);
        }
        Cell::from(label.clone()).style(style)
    }));

    let rows = view.rows.iter().enumerate().map(|(row_index, row)| {
        let mut style = Style::default();
        if row.selected {
            style = style.fg(Color::Green);
        }
        if row_index == panel.cursor() {
            style = style.bg(Color::DarkGray);
        }
        Row::new(row.cells.iter().map(|cell| Cell::from(cell.clone()))).style(style)
    });

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(table_title(state.active_panel, panel, &view))
                .borders(Borders::ALL),
        );
    frame.render_widget(table, area);
}

fn panel_title(kind: PanelKind, panel: &dyn PanelControl) -> String {
    let view = panel.view();
    let loading = if panel.is_loading() { " …" } else { "" };
    format!("{} {}/{}{loading}", kind.label(), view.matched, view.total)
}

fn table_title(kind: PanelKind, panel: &dyn PanelControl, view: &TableView) -> String {
    let mut title = kind.label().to_owned();
    let query = panel.query();
    if !query.is_empty() {
        title.push_str(&format!(" /{query}"));
    }
    if let Some(pager) = &view.pager {
        title.push_str(&format!(" [{pager}]"));
    }
    if view.selected > 0 {
        title.push_str(&format!(" {} selected", view.selected));
    }
    title
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    let mode = match state.mode {
        AppMode::Nav => "NAV".to_owned(),
        AppMode::Filter => format!(
            "FILTER /{}",
            view_data.panels.get(state.active_panel).query()
        ),
    };
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {KEY_HINTS}"),
        None => format!("{mode} | {KEY_HINTS}"),
    }
}

fn format_date(value: Option<OffsetDateTime>) -> String {
    value
        .map(|datetime| datetime.date().to_string())
        .unwrap_or_default()
}

fn regatta_columns() -> Vec<Column<Regatta>> {
    vec![
        Column::text("name", |r: &Regatta| r.name.to_string()),
        Column::text("class", |r: &Regatta| r.boat_class.clone()),
        Column::text("area", |r: &Regatta| r.course_area.clone()),
        Column::with_comparator(
            "entries",
            |r: &Regatta| {
                r.competitor_count
                    .map(|count| count.to_string())
                    .unwrap_or_default()
            },
            |a: &Regatta, b: &Regatta| a.competitor_count.cmp(&b.competitor_count),
        ),
    ]
}

fn competitor_columns() -> Vec<Column<Competitor>> {
    vec![
        Column::text("name", |c: &Competitor| c.name.clone()),
        Column::text("short", |c: &Competitor| c.short_name.clone()),
        Column::text("sail", |c: &Competitor| c.sail_id.clone()),
        Column::text("nat", |c: &Competitor| c.nationality.clone()),
        Column::text("class", |c: &Competitor| c.boat_class.clone()),
        Column::unsortable("tag", |c: &Competitor| c.search_tag.clone()),
    ]
}

fn leaderboard_columns() -> Vec<Column<Leaderboard>> {
    vec![Column::text("name", |l: &Leaderboard| l.name.to_string())]
}

fn event_columns() -> Vec<Column<SailingEvent>> {
    vec![
        Column::text("name", |e: &SailingEvent| e.name.clone()),
        Column::text("venue", |e: &SailingEvent| e.venue.clone()),
        Column::with_comparator(
            "start",
            |e: &SailingEvent| format_date(e.start),
            |a: &SailingEvent, b: &SailingEvent| a.start.cmp(&b.start),
        ),
        Column::with_comparator(
            "end",
            |e: &SailingEvent| format_date(e.end),
            |a: &SailingEvent, b: &SailingEvent| a.end.cmp(&b.end),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, FetchRequest, FetchedRows, InternalEvent, PanelControl, UiOptions, ViewData,
        handle_key_event, process_internal_events, request_fetch, status_text,
    };
    use anyhow::{Result, anyhow};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use sailadmin_app::{
        AppMode, AppState, Competitor, Leaderboard, PanelKind, Regatta, RegattaName,
    };
    use sailadmin_grid::FetchError;
    use sailadmin_testkit::{Fleet, SailingFaker};
    use std::sync::mpsc::{self, Receiver, Sender};

    #[derive(Debug)]
    struct TestRuntime {
        fleet: Fleet,
        fail_next: Option<String>,
        fetch_count: usize,
        held: Vec<FetchRequest>,
        hold: bool,
    }

    impl TestRuntime {
        fn new() -> Self {
            Self {
                fleet: SailingFaker::new(9).fleet(3, 4),
                fail_next: None,
                fetch_count: 0,
                held: Vec::new(),
                hold: false,
            }
        }

        fn take_failure(&mut self) -> Result<()> {
            match self.fail_next.take() {
                Some(message) => Err(anyhow!(message)),
                None => Ok(()),
            }
        }
    }

    impl AppRuntime for TestRuntime {
        fn fetch_regattas(&mut self) -> Result<Vec<Regatta>> {
            self.take_failure()?;
            Ok(self.fleet.regattas.clone())
        }

        fn fetch_competitors(&mut self, regatta: &RegattaName) -> Result<Vec<Competitor>> {
            self.take_failure()?;
            self.fleet
                .competitors
                .get(regatta)
                .cloned()
                .ok_or_else(|| anyhow!("no regatta named {regatta}"))
        }

        fn fetch_leaderboards(&mut self) -> Result<Vec<Leaderboard>> {
            self.take_failure()?;
            Ok(self.fleet.leaderboards.clone())
        }

        fn fetch_events(&mut self) -> Result<Vec<sailadmin_app::Event>> {
            self.take_failure()?;
            Ok(self.fleet.events.clone())
        }

        fn spawn_fetch(
            &mut self,
            request: FetchRequest,
            token: sailadmin_grid::FetchToken,
            tx: Sender<InternalEvent>,
        ) -> Result<()> {
            self.fetch_count += 1;
            if self.hold {
                self.held.push(request);
                return Ok(());
            }
            let rows = self.fetch(request);
            tx.send(InternalEvent::Fetched { token, rows })
                .map_err(|_| anyhow!("closed"))?;
            Ok(())
        }
    }

    struct Harness {
        state: AppState,
        runtime: TestRuntime,
        view_data: ViewData,
        tx: Sender<InternalEvent>,
        rx: Receiver<InternalEvent>,
    }

    impl Harness {
        fn new(options: UiOptions) -> Self {
            let (tx, rx) = mpsc::channel();
            Self {
                state: AppState::default(),
                runtime: TestRuntime::new(),
                view_data: ViewData::new(options),
                tx,
                rx,
            }
        }

        fn press(&mut self, code: KeyCode) -> bool {
            let quit = handle_key_event(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                KeyEvent::new(code, KeyModifiers::NONE),
            );
            self.pump();
            quit
        }

        fn type_text(&mut self, text: &str) {
            for ch in text.chars() {
                self.press(KeyCode::Char(ch));
            }
        }

        fn fetch(&mut self, kind: PanelKind) {
            request_fetch(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                kind,
            );
            self.pump();
        }

        fn pump(&mut self) {
            process_internal_events(&mut self.state, &mut self.view_data, &self.tx, &self.rx);
        }

        fn panel(&self, kind: PanelKind) -> &dyn PanelControl {
            self.view_data.panels.get(kind)
        }

        fn status(&self) -> String {
            self.state.status_line.clone().unwrap_or_default()
        }
    }

    #[test]
    fn fetch_fills_the_panel_through_the_channel() {
        let mut harness = Harness::new(UiOptions::default());
        harness.fetch(PanelKind::Regattas);

        let view = harness.panel(PanelKind::Regattas).view();
        assert_eq!(view.total, 3);
        assert_eq!(view.headers[0], "✓");
        assert_eq!(harness.status(), "regattas: loaded 3");
        assert!(!harness.panel(PanelKind::Regattas).is_loading());
    }

    #[test]
    fn competitors_need_exactly_one_selected_regatta() {
        let mut harness = Harness::new(UiOptions::default());
        harness.fetch(PanelKind::Regattas);

        harness.fetch(PanelKind::Competitors);
        assert_eq!(
            harness.status(),
            "select exactly one regatta to list its competitors"
        );

        harness.press(KeyCode::Char(' '));
        harness.fetch(PanelKind::Competitors);
        assert_eq!(harness.panel(PanelKind::Competitors).view().total, 4);
        assert!(harness.status().starts_with("competitors: loaded 4 for "));
    }

    #[test]
    fn switching_to_competitors_follows_the_regatta_selection() {
        let mut harness = Harness::new(UiOptions::default());
        harness.fetch(PanelKind::Regattas);
        harness.press(KeyCode::Char(' '));

        harness.press(KeyCode::Tab);
        assert_eq!(harness.state.active_panel, PanelKind::Competitors);
        assert_eq!(harness.panel(PanelKind::Competitors).view().total, 4);
        let fetches = harness.runtime.fetch_count;

        harness.press(KeyCode::BackTab);
        harness.press(KeyCode::Tab);
        assert_eq!(harness.runtime.fetch_count, fetches);
    }

    #[test]
    fn refresh_keeps_selection_on_renamed_records() {
        let mut harness = Harness::new(UiOptions::default());
        harness.fetch(PanelKind::Regattas);
        harness.press(KeyCode::Char(' '));
        harness.press(KeyCode::Tab);
        harness.press(KeyCode::Char(' '));

        let regatta = harness
            .view_data
            .panels
            .selected_regatta()
            .expect("regatta selected");
        let mut faker = SailingFaker::new(77);
        let entries = harness
            .runtime
            .fleet
            .competitors
            .get_mut(&regatta)
            .expect("entries exist");
        let selected = harness.view_data.panels.competitors.table.selected();
        for entry in entries.iter_mut() {
            *entry = faker.renamed(entry);
        }
        let expected = entries
            .iter()
            .find(|entry| entry.id == selected[0].id)
            .cloned()
            .expect("selected entry still listed");

        harness.press(KeyCode::Char('r'));

        assert_eq!(
            harness.view_data.panels.competitors.table.selected(),
            vec![expected]
        );
    }

    #[test]
    fn stale_responses_are_dropped_and_reported() {
        let mut harness = Harness::new(UiOptions::default());
        let old = harness.view_data.panels.get_mut(PanelKind::Events).begin_fetch();
        harness.fetch(PanelKind::Events);
        assert_eq!(harness.panel(PanelKind::Events).view().total, 2);

        harness
            .tx
            .send(InternalEvent::Fetched {
                token: old,
                rows: FetchedRows::Events(Ok(Vec::new())),
            })
            .expect("send stale event");
        harness.pump();

        assert_eq!(harness.panel(PanelKind::Events).view().total, 2);
        assert_eq!(harness.status(), "events: dropped stale response");
    }

    #[test]
    fn stale_response_keeps_the_newer_fetch_loading() {
        let mut harness = Harness::new(UiOptions::default());
        harness.runtime.hold = true;
        harness.fetch(PanelKind::Leaderboards);
        let old = harness.view_data.panels.leaderboards.generations.latest();
        harness.fetch(PanelKind::Leaderboards);
        assert_eq!(harness.runtime.held.len(), 2);

        let old = old.expect("token issued");
        harness
            .tx
            .send(InternalEvent::Fetched {
                token: old,
                rows: FetchedRows::Leaderboards(Ok(Vec::new())),
            })
            .expect("send stale event");
        harness.pump();

        assert!(harness.panel(PanelKind::Leaderboards).is_loading());
    }

    #[test]
    fn failed_fetch_keeps_rows_and_reports() {
        let mut harness = Harness::new(UiOptions::default());
        harness.fetch(PanelKind::Regattas);
        harness.runtime.fail_next = Some("cannot reach server".to_owned());

        harness.press(KeyCode::Char('r'));

        assert_eq!(harness.panel(PanelKind::Regattas).view().total, 3);
        assert_eq!(
            harness.status(),
            "regattas: fetch failed: cannot reach server"
        );
    }

    #[test]
    fn fetch_errors_convert_with_context_chain() {
        let error = FetchError::from(anyhow!("connection refused").context("list events"));
        assert_eq!(error.message(), "list events: connection refused");
    }

    #[test]
    fn filter_mode_narrows_and_escape_restores() {
        let mut harness = Harness::new(UiOptions::default());
        harness.fetch(PanelKind::Regattas);
        let name = harness.runtime.fleet.regattas[0].name.to_string();

        harness.press(KeyCode::Char('/'));
        assert_eq!(harness.state.mode, AppMode::Filter);
        harness.type_text(&format!("\"{name}\""));
        assert_eq!(harness.panel(PanelKind::Regattas).view().matched, 1);
        assert!(status_text(&harness.state, &harness.view_data).starts_with("FILTER /\""));

        harness.press(KeyCode::Backspace);
        harness.press(KeyCode::Esc);
        assert_eq!(harness.state.mode, AppMode::Nav);
        assert_eq!(harness.panel(PanelKind::Regattas).view().matched, 3);
        assert_eq!(harness.panel(PanelKind::Regattas).query(), "");
    }

    #[test]
    fn sort_key_cycles_the_cursor_column() {
        let mut harness = Harness::new(UiOptions::default());
        harness.fetch(PanelKind::Regattas);

        harness.press(KeyCode::Char('s'));
        assert_eq!(harness.status(), "sort name ascending");
        assert_eq!(harness.panel(PanelKind::Regattas).view().headers[1], "name ↑");

        harness.press(KeyCode::Char('s'));
        harness.press(KeyCode::Char('s'));
        assert_eq!(harness.status(), "sort cleared");
    }

    #[test]
    fn paging_moves_between_pages() {
        let mut harness = Harness::new(UiOptions {
            page_size: 2,
            ..UiOptions::default()
        });
        harness.fetch(PanelKind::Regattas);

        assert_eq!(harness.panel(PanelKind::Regattas).view().rows.len(), 2);
        harness.press(KeyCode::Char('n'));
        assert_eq!(harness.panel(PanelKind::Regattas).view().rows.len(), 1);
        harness.press(KeyCode::Char('n'));
        assert_eq!(harness.status(), "last page");
        harness.press(KeyCode::Char('p'));
        assert_eq!(
            harness.panel(PanelKind::Regattas).view().pager.as_deref(),
            Some("1-2 of 3")
        );
    }

    #[test]
    fn single_selection_tables_have_no_checkbox_column() {
        let mut harness = Harness::new(UiOptions {
            multi_selection: false,
            enable_pager: false,
            ..UiOptions::default()
        });
        harness.fetch(PanelKind::Regattas);

        let view = harness.panel(PanelKind::Regattas).view();
        assert_eq!(view.headers[0], "name");
        assert_eq!(view.pager, None);

        harness.press(KeyCode::Char(' '));
        harness.press(KeyCode::Char('j'));
        harness.press(KeyCode::Char(' '));
        assert_eq!(harness.panel(PanelKind::Regattas).view().selected, 1);
        assert_eq!(harness.status(), "1 selected");
    }

    #[test]
    fn clear_key_empties_selection() {
        let mut harness = Harness::new(UiOptions::default());
        harness.fetch(PanelKind::Regattas);
        harness.press(KeyCode::Char(' '));
        harness.press(KeyCode::Char('j'));
        harness.press(KeyCode::Char(' '));
        assert_eq!(harness.panel(PanelKind::Regattas).view().selected, 2);

        harness.press(KeyCode::Char('c'));
        assert_eq!(harness.panel(PanelKind::Regattas).view().selected, 0);
    }

    #[test]
    fn quit_keys() {
        let mut harness = Harness::new(UiOptions::default());
        assert!(harness.press(KeyCode::Char('q')));
        assert!(handle_key_event(
            &mut harness.state,
            &mut harness.runtime,
            &mut harness.view_data,
            &harness.tx,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        ));
    }
}
