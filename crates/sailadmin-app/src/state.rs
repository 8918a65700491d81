// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{AppMode, PanelKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub mode: AppMode,
    pub active_panel: PanelKind,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Nav,
            active_panel: PanelKind::Regattas,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    NextPanel,
    PrevPanel,
    SelectPanel(PanelKind),
    EnterFilterMode,
    ExitToNav,
    RequestRefresh,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ModeChanged(AppMode),
    PanelChanged(PanelKind),
    RefreshRequested(PanelKind),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::NextPanel => self.rotate_panel(1),
            AppCommand::PrevPanel => self.rotate_panel(-1),
            AppCommand::SelectPanel(panel) => {
                if panel == self.active_panel {
                    return Vec::new();
                }
                self.active_panel = panel;
                vec![AppEvent::PanelChanged(panel)]
            }
            AppCommand::EnterFilterMode => {
                self.mode = AppMode::Filter;
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::ExitToNav => {
                if self.mode == AppMode::Nav {
                    return Vec::new();
                }
                self.mode = AppMode::Nav;
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::RequestRefresh => {
                let label = format!("refreshing {}", self.active_panel.label());
                vec![
                    AppEvent::RefreshRequested(self.active_panel),
                    self.set_status(&label),
                ]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn rotate_panel(&mut self, delta: isize) -> Vec<AppEvent> {
        let panels = PanelKind::ALL;
        let current = self.active_panel.index() as isize;
        let len = panels.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.active_panel = panels[next];
        vec![AppEvent::PanelChanged(self.active_panel)]
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
