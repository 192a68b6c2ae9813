// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use crate::{AppMode, FormKind, ViewKind};

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub mode: AppMode,
    pub active_view: ViewKind,
    pub input_tab: FormKind,
    pub location_filter: BTreeSet<String>,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Nav,
            active_view: ViewKind::Dashboard,
            input_tab: FormKind::Planting,
            location_filter: BTreeSet::new(),
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    NextView,
    PrevView,
    SelectView(ViewKind),
    NextInputTab,
    OpenForm(FormKind),
    ExitToNav,
    EnterFilter,
    ToggleLocation(String),
    ClearLocationFilter,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ModeChanged(AppMode),
    ViewChanged(ViewKind),
    InputTabChanged(FormKind),
    LocationFilterChanged(usize),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::NextView => self.rotate_view(1),
            AppCommand::PrevView => self.rotate_view(-1),
            AppCommand::SelectView(view) => self.select_view(view),
            AppCommand::NextInputTab => {
                let tab = self.input_tab.other();
                self.switch_input_tab(tab)
            }
            AppCommand::OpenForm(kind) => {
                let mut events = Vec::new();
                if self.active_view != ViewKind::Input {
                    self.active_view = ViewKind::Input;
                    events.push(AppEvent::ViewChanged(self.active_view));
                }
                if self.input_tab != kind {
                    events.extend(self.switch_input_tab(kind));
                }
                self.mode = AppMode::Form(kind);
                events.push(AppEvent::ModeChanged(self.mode));
                events
            }
            AppCommand::ExitToNav => {
                self.mode = AppMode::Nav;
                vec![AppEvent::ModeChanged(self.mode), self.set_status("nav")]
            }
            AppCommand::EnterFilter => {
                let mut events = Vec::new();
                if self.active_view != ViewKind::Monitoring {
                    self.active_view = ViewKind::Monitoring;
                    events.push(AppEvent::ViewChanged(self.active_view));
                }
                self.mode = AppMode::Filter;
                events.push(AppEvent::ModeChanged(self.mode));
                events
            }
            AppCommand::ToggleLocation(location) => {
                if !self.location_filter.remove(&location) {
                    self.location_filter.insert(location);
                }
                self.filter_changed()
            }
            AppCommand::ClearLocationFilter => {
                self.location_filter.clear();
                self.filter_changed()
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn rotate_view(&mut self, delta: isize) -> Vec<AppEvent> {
        let views = ViewKind::ALL;
        let current = views
            .iter()
            .position(|view| *view == self.active_view)
            .unwrap_or(0) as isize;
        let len = views.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.select_view(views[next])
    }

    fn select_view(&mut self, view: ViewKind) -> Vec<AppEvent> {
        let mut events = Vec::new();
        if self.mode != AppMode::Nav {
            self.mode = AppMode::Nav;
            events.push(AppEvent::ModeChanged(self.mode));
        }
        self.active_view = view;
        events.push(AppEvent::ViewChanged(view));
        events
    }

    fn switch_input_tab(&mut self, tab: FormKind) -> Vec<AppEvent> {
        self.input_tab = tab;
        let mut events = vec![AppEvent::InputTabChanged(tab)];
        if let AppMode::Form(kind) = self.mode
            && kind != tab
        {
            self.mode = AppMode::Form(tab);
            events.push(AppEvent::ModeChanged(self.mode));
        }
        events
    }

    fn filter_changed(&mut self) -> Vec<AppEvent> {
        let count = self.location_filter.len();
        let label = if count == 0 {
            "filter cleared".to_owned()
        } else {
            format!("filter: {count} location(s)")
        };
        vec![
            AppEvent::LocationFilterChanged(count),
            self.set_status(&label),
        ]
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{AppCommand, AppEvent, AppState};
    use crate::{AppMode, FormKind, ViewKind};

    #[test]
    fn view_rotation_wraps() {
        let mut state = AppState {
            active_view: ViewKind::Monitoring,
            ..AppState::default()
        };

        let events = state.dispatch(AppCommand::NextView);
        assert_eq!(state.active_view, ViewKind::Dashboard);
        assert_eq!(events, vec![AppEvent::ViewChanged(ViewKind::Dashboard)]);

        state.dispatch(AppCommand::PrevView);
        assert_eq!(state.active_view, ViewKind::Monitoring);
    }

    #[test]
    fn selecting_a_view_leaves_form_mode() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::OpenForm(FormKind::Harvest));
        assert_eq!(state.mode, AppMode::Form(FormKind::Harvest));
        assert_eq!(state.active_view, ViewKind::Input);

        let events = state.dispatch(AppCommand::SelectView(ViewKind::Dashboard));
        assert_eq!(state.mode, AppMode::Nav);
        assert_eq!(
            events,
            vec![
                AppEvent::ModeChanged(AppMode::Nav),
                AppEvent::ViewChanged(ViewKind::Dashboard),
            ]
        );
    }

    #[test]
    fn switching_input_tab_moves_open_form() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::OpenForm(FormKind::Planting));

        let events = state.dispatch(AppCommand::NextInputTab);
        assert_eq!(state.input_tab, FormKind::Harvest);
        assert_eq!(state.mode, AppMode::Form(FormKind::Harvest));
        assert_eq!(
            events,
            vec![
                AppEvent::InputTabChanged(FormKind::Harvest),
                AppEvent::ModeChanged(AppMode::Form(FormKind::Harvest)),
            ]
        );

        let events = state.dispatch(AppCommand::NextInputTab);
        assert_eq!(state.mode, AppMode::Form(FormKind::Planting));
        assert!(events.contains(&AppEvent::InputTabChanged(FormKind::Planting)));
    }

    #[test]
    fn toggle_location_adds_then_removes() {
        let mut state = AppState::default();

        let events = state.dispatch(AppCommand::ToggleLocation("Blok A".to_owned()));
        assert!(state.location_filter.contains("Blok A"));
        assert_eq!(
            events,
            vec![
                AppEvent::LocationFilterChanged(1),
                AppEvent::StatusUpdated("filter: 1 location(s)".to_owned()),
            ]
        );

        state.dispatch(AppCommand::ToggleLocation("Blok A".to_owned()));
        assert!(state.location_filter.is_empty());
        assert_eq!(state.status_line.as_deref(), Some("filter cleared"));
    }

    #[test]
    fn enter_filter_switches_to_monitoring() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::EnterFilter);
        assert_eq!(state.active_view, ViewKind::Monitoring);
        assert_eq!(state.mode, AppMode::Filter);

        state.dispatch(AppCommand::ExitToNav);
        assert_eq!(state.mode, AppMode::Nav);
        assert_eq!(state.status_line.as_deref(), Some("nav"));
    }
}
