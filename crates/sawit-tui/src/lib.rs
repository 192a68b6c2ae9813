// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Axis, BarChart, Block, Borders, Cell, Chart, Clear, Dataset, Gauge, GraphType, List,
    ListItem, ListState, Paragraph, Row, Table, TableState, Tabs, Wrap,
};
use sawit_app::{
    AppCommand, AppEvent, AppMode, AppState, DashboardSummary, FormKind, FormPayload,
    GrowthStatus, HarvestFormInput, MIN_PLOT_ID, MonthlyYield, PlantingFormInput,
    PlantingRecord, PlotId, PlotProgress, PlotYield, RecordTables, Variety, ViewKind,
    distinct_locations, filter_by_location, format_date, monthly_yield, parse_date, plot_progress,
    summarize, yield_by_plot,
};
use std::io;
use std::ops::Range;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::{Date, Month};

const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const DATE_INPUT_LEN: usize = 10;
const CARD_HEIGHT: u16 = 3;
const BAR_WIDTH: u16 = 7;
const BAR_GAP: u16 = 1;
// Borders plus the header row.
const TABLE_CHROME_ROWS: u16 = 3;

pub trait AppRuntime {
    fn load_tables(&mut self) -> Result<RecordTables>;
    fn today(&self) -> Date;
    /// Returns the confirmation shown in the status bar.
    fn submit_form(&mut self, payload: &FormPayload) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Text,
    Integer { min: i64 },
    Decimal,
    Date,
    Variety,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FormFieldSpec {
    label: &'static str,
    kind: FieldKind,
}

const PLANTING_FIELDS: [FormFieldSpec; 6] = [
    FormFieldSpec {
        label: "planting date",
        kind: FieldKind::Date,
    },
    FormFieldSpec {
        label: "plot name",
        kind: FieldKind::Text,
    },
    FormFieldSpec {
        label: "area (Ha)",
        kind: FieldKind::Decimal,
    },
    FormFieldSpec {
        label: "tree count",
        kind: FieldKind::Integer { min: 0 },
    },
    FormFieldSpec {
        label: "variety",
        kind: FieldKind::Variety,
    },
    FormFieldSpec {
        label: "location",
        kind: FieldKind::Text,
    },
];

const HARVEST_FIELDS: [FormFieldSpec; 5] = [
    FormFieldSpec {
        label: "plot id",
        kind: FieldKind::Integer { min: MIN_PLOT_ID },
    },
    FormFieldSpec {
        label: "harvest date",
        kind: FieldKind::Date,
    },
    FormFieldSpec {
        label: "yield (kg)",
        kind: FieldKind::Integer { min: 0 },
    },
    FormFieldSpec {
        label: "worker",
        kind: FieldKind::Text,
    },
    FormFieldSpec {
        label: "note",
        kind: FieldKind::Text,
    },
];

fn form_field_specs(kind: FormKind) -> &'static [FormFieldSpec] {
    match kind {
        FormKind::Planting => &PLANTING_FIELDS,
        FormKind::Harvest => &HARVEST_FIELDS,
    }
}

/// Raw text per field. Values are parsed only on submit, so a half-typed
/// date stays on screen until it is fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FormUiState {
    kind: FormKind,
    field_index: usize,
    buffers: Vec<String>,
}

impl FormUiState {
    fn blank(kind: FormKind, today: Date) -> Self {
        let buffers = match FormPayload::blank_for(kind, today) {
            FormPayload::Planting(input) => vec![
                format_date(input.planted_on),
                input.plot_name,
                format!("{:.1}", input.area_ha),
                input.tree_count.to_string(),
                input.variety.as_str().to_owned(),
                input.location,
            ],
            FormPayload::Harvest(input) => vec![
                input.plot_id.to_string(),
                format_date(input.harvested_on),
                input.yield_kg.to_string(),
                input.worker,
                input.note,
            ],
        };
        Self {
            kind,
            field_index: 0,
            buffers,
        }
    }

    fn spec(&self) -> Option<FormFieldSpec> {
        form_field_specs(self.kind).get(self.field_index).copied()
    }

    fn active_buffer(&mut self) -> Option<&mut String> {
        self.buffers.get_mut(self.field_index)
    }

    fn value(&self, index: usize) -> &str {
        self.buffers.get(index).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
struct DerivedView {
    summary: DashboardSummary,
    trend: Vec<MonthlyYield>,
    locations: Vec<String>,
    monitored: Vec<(PlantingRecord, PlotProgress)>,
    per_plot: Vec<PlotYield>,
}

impl DerivedView {
    fn build(tables: &RecordTables, state: &AppState, today: Date) -> Self {
        let filtered = filter_by_location(&tables.plantings, &state.location_filter);
        Self {
            summary: summarize(&tables.plantings, &tables.harvests),
            trend: monthly_yield(&tables.harvests),
            locations: distinct_locations(&tables.plantings),
            monitored: filtered
                .into_iter()
                .map(|record| {
                    let progress = plot_progress(&record, today);
                    (record, progress)
                })
                .collect(),
            per_plot: yield_by_plot(&tables.plantings, &tables.harvests),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ViewData {
    today: Date,
    tables: RecordTables,
    derived: DerivedView,
    form: Option<FormUiState>,
    filter_cursor: usize,
    /// Index into `derived.monitored`; the table, cards and bars scroll to it.
    plot_cursor: usize,
    help_visible: bool,
    status_token: u64,
}

impl ViewData {
    fn new(today: Date) -> Self {
        Self {
            today,
            tables: RecordTables::default(),
            derived: DerivedView::default(),
            form: None,
            filter_cursor: 0,
            plot_cursor: 0,
            help_visible: false,
            status_token: 0,
        }
    }

    fn selected_plot(&self) -> Option<PlotId> {
        self.derived
            .monitored
            .get(self.plot_cursor)
            .map(|(record, _)| record.id)
    }

    fn clamp_plot_cursor(&mut self) {
        let count = self.derived.monitored.len();
        self.plot_cursor = self.plot_cursor.min(count.saturating_sub(1));
    }
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(runtime.today());
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Err(error) = refresh_view_data(state, runtime, &mut view_data) {
        state.dispatch(AppCommand::SetStatus(format!("load failed: {error:#}")));
    }

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
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
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
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

/// Returns `true` when the app should quit. Every other key regenerates the
/// record tables afterwards.
fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    handle_key(state, runtime, view_data, internal_tx, key);

    if let Err(error) = refresh_view_data(state, runtime, view_data) {
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("load failed: {error:#}"),
        );
    }
    false
}

fn handle_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
            emit_status(state, view_data, internal_tx, "help hidden");
        }
        return;
    }

    match state.mode {
        AppMode::Nav => handle_nav_key(state, view_data, internal_tx, key),
        AppMode::Form(_) => handle_form_key(state, runtime, view_data, internal_tx, key),
        AppMode::Filter => handle_filter_key(state, view_data, internal_tx, key),
    }
}

fn handle_nav_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match (key.code, key.modifiers) {
        (KeyCode::Tab, KeyModifiers::NONE) | (KeyCode::Char('f'), KeyModifiers::NONE) => {
            dispatch_command(state, view_data, AppCommand::NextView, internal_tx);
        }
        (KeyCode::BackTab, _) | (KeyCode::Char('b'), KeyModifiers::NONE) => {
            dispatch_command(state, view_data, AppCommand::PrevView, internal_tx);
        }
        (KeyCode::Char(ch @ '1'..='3'), KeyModifiers::NONE) => {
            let index = usize::from(ch as u8 - b'1');
            if let Some(view) = ViewKind::ALL.get(index).copied() {
                dispatch_command(state, view_data, AppCommand::SelectView(view), internal_tx);
            }
        }
        (KeyCode::Char('?'), KeyModifiers::NONE) => {
            view_data.help_visible = true;
            emit_status(state, view_data, internal_tx, "help open");
        }
        (KeyCode::Esc, _) => {
            state.dispatch(AppCommand::ClearStatus);
        }
        _ => match state.active_view {
            ViewKind::Dashboard => {}
            ViewKind::Input => handle_input_nav_key(state, view_data, internal_tx, key),
            ViewKind::Monitoring => handle_monitoring_nav_key(state, view_data, internal_tx, key),
        },
    }
}

fn handle_input_nav_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match (key.code, key.modifiers) {
        (KeyCode::Char('t'), KeyModifiers::NONE) => {
            dispatch_command(state, view_data, AppCommand::NextInputTab, internal_tx);
            let label = state.input_tab.label();
            emit_status(state, view_data, internal_tx, format!("tab: {label}"));
        }
        (KeyCode::Enter, _) | (KeyCode::Char('i'), KeyModifiers::NONE) => {
            let kind = state.input_tab;
            dispatch_command(state, view_data, AppCommand::OpenForm(kind), internal_tx);
            let status = format_form_field_status(kind, 0);
            emit_status(state, view_data, internal_tx, status);
        }
        _ => {}
    }
}

fn handle_monitoring_nav_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match (key.code, key.modifiers) {
        (KeyCode::Char('/'), KeyModifiers::NONE) => {
            if view_data.derived.locations.is_empty() {
                emit_status(state, view_data, internal_tx, "no locations to filter");
                return;
            }
            dispatch_command(state, view_data, AppCommand::EnterFilter, internal_tx);
        }
        (KeyCode::Char('c'), KeyModifiers::NONE) => {
            dispatch_command(
                state,
                view_data,
                AppCommand::ClearLocationFilter,
                internal_tx,
            );
        }
        (KeyCode::Char('j'), KeyModifiers::NONE) | (KeyCode::Down, _) => {
            move_plot_cursor(view_data, 1);
        }
        (KeyCode::Char('k'), KeyModifiers::NONE) | (KeyCode::Up, _) => {
            move_plot_cursor(view_data, -1);
        }
        _ => {}
    }
}

fn move_plot_cursor(view_data: &mut ViewData, delta: isize) {
    let count = view_data.derived.monitored.len();
    if count == 0 {
        view_data.plot_cursor = 0;
        return;
    }

    let current = view_data.plot_cursor;
    let next = if delta.is_negative() {
        current.saturating_sub(delta.unsigned_abs())
    } else {
        current.saturating_add(delta as usize)
    };
    view_data.plot_cursor = next.min(count - 1);
}

fn handle_filter_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let count = view_data.derived.locations.len();
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) | (KeyCode::Char('/'), KeyModifiers::NONE) => {
            dispatch_command(state, view_data, AppCommand::ExitToNav, internal_tx);
        }
        (KeyCode::Char('j'), KeyModifiers::NONE)
        | (KeyCode::Down, _)
        | (KeyCode::Char('l'), KeyModifiers::NONE)
        | (KeyCode::Right, _) => {
            if count > 0 {
                view_data.filter_cursor = (view_data.filter_cursor + 1) % count;
            }
        }
        (KeyCode::Char('k'), KeyModifiers::NONE)
        | (KeyCode::Up, _)
        | (KeyCode::Char('h'), KeyModifiers::NONE)
        | (KeyCode::Left, _) => {
            if count > 0 {
                view_data.filter_cursor = (view_data.filter_cursor + count - 1) % count;
            }
        }
        (KeyCode::Char(' '), _) | (KeyCode::Enter, _) => {
            let Some(location) = view_data.derived.locations.get(view_data.filter_cursor) else {
                emit_status(state, view_data, internal_tx, "no location selected");
                return;
            };
            let command = AppCommand::ToggleLocation(location.clone());
            dispatch_command(state, view_data, command, internal_tx);
        }
        (KeyCode::Char('c'), KeyModifiers::NONE) => {
            dispatch_command(
                state,
                view_data,
                AppCommand::ClearLocationFilter,
                internal_tx,
            );
        }
        _ => {}
    }
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    sync_form_ui_state(state, view_data);
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            dispatch_command(state, view_data, AppCommand::ExitToNav, internal_tx);
        }
        (KeyCode::Enter, _) | (KeyCode::Char('s'), KeyModifiers::CONTROL) => {
            submit_active_form(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('t'), KeyModifiers::CONTROL) => {
            dispatch_command(state, view_data, AppCommand::NextInputTab, internal_tx);
            let status = format_form_field_status(state.input_tab, 0);
            emit_status(state, view_data, internal_tx, status);
        }
        (KeyCode::Tab, KeyModifiers::NONE) => {
            let status = move_form_field_cursor(view_data, 1);
            emit_status(state, view_data, internal_tx, status);
        }
        (KeyCode::BackTab, _) => {
            let status = move_form_field_cursor(view_data, -1);
            emit_status(state, view_data, internal_tx, status);
        }
        (KeyCode::Backspace, _) => {
            if let Some(form) = view_data.form.as_mut()
                && !matches!(form.spec().map(|spec| spec.kind), Some(FieldKind::Variety))
                && let Some(buffer) = form.active_buffer()
            {
                buffer.pop();
            }
        }
        (KeyCode::Up, _) => step_active_field(view_data, 1, false),
        (KeyCode::Down, _) => step_active_field(view_data, -1, false),
        (KeyCode::PageUp, _) => step_active_field(view_data, 1, true),
        (KeyCode::PageDown, _) => step_active_field(view_data, -1, true),
        (KeyCode::Right, _) => cycle_variety(view_data, 1),
        (KeyCode::Left, _) => cycle_variety(view_data, -1),
        (KeyCode::Char(ch), modifiers)
            if modifiers == KeyModifiers::NONE || modifiers == KeyModifiers::SHIFT =>
        {
            if let Some(status) = type_into_active_field(view_data, ch) {
                emit_status(state, view_data, internal_tx, status);
            }
        }
        _ => {}
    }
}

fn submit_active_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(form) = view_data.form.as_ref() else {
        emit_status(state, view_data, internal_tx, "form unavailable");
        return;
    };
    let payload = match validated_payload(form) {
        Ok(payload) => payload,
        Err(error) => {
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("form invalid: {error:#}"),
            );
            return;
        }
    };

    match runtime.submit_form(&payload) {
        Ok(message) => {
            tracing::info!(kind = payload.kind().label(), "form submitted");
            emit_status(state, view_data, internal_tx, format!("✅ {message}"));
        }
        Err(error) => {
            tracing::warn!(error = %format!("{error:#}"), "form submission failed");
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("save failed: {error:#}"),
            );
        }
    }
}

fn validated_payload(form: &FormUiState) -> Result<FormPayload> {
    let payload = parse_form_payload(form)?;
    payload.validate()?;
    Ok(payload)
}

fn parse_form_payload(form: &FormUiState) -> Result<FormPayload> {
    let fields = form_field_specs(form.kind);
    let label = |index: usize| fields.get(index).map_or("field", |spec| spec.label);
    match form.kind {
        FormKind::Planting => Ok(FormPayload::Planting(PlantingFormInput {
            planted_on: parse_date_field(label(0), form.value(0))?,
            plot_name: form.value(1).trim().to_owned(),
            area_ha: parse_decimal_field(label(2), form.value(2))?,
            tree_count: parse_integer_field(label(3), form.value(3))?,
            variety: Variety::parse(form.value(4))
                .ok_or_else(|| anyhow!("{} must be one of Tenera, DxP, Lainnya", label(4)))?,
            location: form.value(5).trim().to_owned(),
        })),
        FormKind::Harvest => Ok(FormPayload::Harvest(HarvestFormInput {
            plot_id: parse_integer_field(label(0), form.value(0))?,
            harvested_on: parse_date_field(label(1), form.value(1))?,
            yield_kg: parse_integer_field(label(2), form.value(2))?,
            worker: form.value(3).trim().to_owned(),
            note: form.value(4).trim().to_owned(),
        })),
    }
}

fn parse_date_field(label: &str, value: &str) -> Result<Date> {
    parse_date(value.trim()).with_context(|| format!("{label} must be YYYY-MM-DD"))
}

fn parse_integer_field(label: &str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .with_context(|| format!("{label} must be a whole number"))
}

fn parse_decimal_field(label: &str, value: &str) -> Result<f64> {
    let parsed = value
        .trim()
        .parse::<f64>()
        .with_context(|| format!("{label} must be a number"))?;
    if !parsed.is_finite() {
        return Err(anyhow!("{label} must be a finite number"));
    }
    Ok(parsed)
}

/// Numeric fields only take digits (plus one point for decimals), so a
/// negative value cannot be typed.
fn type_into_active_field(view_data: &mut ViewData, ch: char) -> Option<String> {
    let form = view_data.form.as_mut()?;
    let spec = form.spec()?;
    match spec.kind {
        FieldKind::Variety => {
            let index = ch.to_digit(10)?.checked_sub(1)? as usize;
            let Some(variety) = Variety::ALL.get(index) else {
                return Some(format!("choice {ch} out of range"));
            };
            let buffer = form.active_buffer()?;
            *buffer = variety.as_str().to_owned();
            Some(format!("variety: {}", variety.as_str()))
        }
        kind => {
            let buffer = form.active_buffer()?;
            if accepts_char(kind, buffer, ch) {
                buffer.push(ch);
            }
            None
        }
    }
}

fn accepts_char(kind: FieldKind, buffer: &str, ch: char) -> bool {
    match kind {
        FieldKind::Text => !ch.is_control(),
        FieldKind::Integer { .. } => ch.is_ascii_digit(),
        FieldKind::Decimal => ch.is_ascii_digit() || (ch == '.' && !buffer.contains('.')),
        FieldKind::Date => {
            buffer.chars().count() < DATE_INPUT_LEN && (ch.is_ascii_digit() || ch == '-')
        }
        FieldKind::Variety => false,
    }
}

/// Up/down nudges numbers by one (never below the field minimum) and dates
/// by a day; page keys move dates by a month.
fn step_active_field(view_data: &mut ViewData, delta: i32, coarse: bool) {
    let today = view_data.today;
    let Some(form) = view_data.form.as_mut() else {
        return;
    };
    let Some(spec) = form.spec() else {
        return;
    };
    let Some(buffer) = form.active_buffer() else {
        return;
    };
    match spec.kind {
        FieldKind::Integer { min } => {
            let current = buffer.trim().parse::<i64>().unwrap_or(min);
            let next = current.saturating_add(i64::from(delta)).max(min);
            *buffer = next.to_string();
        }
        FieldKind::Decimal => {
            let current = buffer.trim().parse::<f64>().unwrap_or(0.0);
            let next = (current + f64::from(delta)).max(0.0);
            *buffer = format!("{next:.1}");
        }
        FieldKind::Date => {
            let current = parse_date(buffer.trim()).unwrap_or(today);
            let next = if coarse {
                shift_date_by_months(current, delta)
            } else {
                shift_date_by_days(current, i64::from(delta))
            };
            if let Some(date) = next {
                *buffer = format_date(date);
            }
        }
        FieldKind::Text | FieldKind::Variety => {}
    }
}

fn cycle_variety(view_data: &mut ViewData, delta: isize) {
    let Some(form) = view_data.form.as_mut() else {
        return;
    };
    if form.spec().map(|spec| spec.kind) != Some(FieldKind::Variety) {
        return;
    }
    let Some(buffer) = form.active_buffer() else {
        return;
    };
    let current = Variety::ALL
        .iter()
        .position(|variety| variety.as_str() == buffer.as_str())
        .unwrap_or(0) as isize;
    let len = Variety::ALL.len() as isize;
    let next = (current + delta).rem_euclid(len) as usize;
    *buffer = Variety::ALL[next].as_str().to_owned();
}

fn sync_form_ui_state(state: &AppState, view_data: &mut ViewData) {
    let AppMode::Form(kind) = state.mode else {
        view_data.form = None;
        return;
    };
    if view_data.form.as_ref().is_some_and(|form| form.kind == kind) {
        return;
    }
    view_data.form = Some(FormUiState::blank(kind, view_data.today));
}

fn move_form_field_cursor(view_data: &mut ViewData, delta: isize) -> String {
    let Some(form) = view_data.form.as_mut() else {
        return "form unavailable".to_owned();
    };
    let len = form_field_specs(form.kind).len() as isize;
    if len == 0 {
        return "form has no fields".to_owned();
    }
    form.field_index = (form.field_index as isize + delta).rem_euclid(len) as usize;
    format_form_field_status(form.kind, form.field_index)
}

fn format_form_field_status(kind: FormKind, index: usize) -> String {
    let fields = form_field_specs(kind);
    let label = fields.get(index).map_or("?", |spec| spec.label);
    format!("field {}/{}: {label}", index + 1, fields.len())
}

fn shift_date_by_days(date: Date, days: i64) -> Option<Date> {
    date.checked_add(time::Duration::days(days))
}

fn shift_date_by_months(date: Date, months: i32) -> Option<Date> {
    let base_month = i32::from(u8::from(date.month()));
    let total_month = base_month - 1 + months;
    let year = date.year() + total_month.div_euclid(12);
    let month_number = (total_month.rem_euclid(12) + 1) as u8;
    let month = Month::try_from(month_number).ok()?;
    let max_day = last_day_of_month(year, month)?;
    Date::from_calendar_date(year, month, date.day().min(max_day)).ok()
}

fn last_day_of_month(year: i32, month: Month) -> Option<u8> {
    let (next_year, next_month) = if month == Month::December {
        (year + 1, Month::January)
    } else {
        (year, month.next())
    };
    let first_next_month = Date::from_calendar_date(next_year, next_month, 1).ok()?;
    first_next_month.previous_day().map(|last| last.day())
}

fn dispatch_command(
    state: &mut AppState,
    view_data: &mut ViewData,
    command: AppCommand,
    internal_tx: &Sender<InternalEvent>,
) {
    let events = state.dispatch(command);
    sync_form_ui_state(state, view_data);
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::LocationFilterChanged(_)))
    {
        view_data.derived = DerivedView::build(&view_data.tables, state, view_data.today);
        view_data.clamp_plot_cursor();
    }
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::StatusUpdated(_)))
    {
        view_data.status_token = view_data.status_token.saturating_add(1);
        schedule_status_clear(internal_tx, view_data.status_token);
    }
}

fn refresh_view_data<R: AppRuntime>(
    state: &AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
) -> Result<()> {
    sync_form_ui_state(state, view_data);
    view_data.today = runtime.today();
    view_data.tables = runtime.load_tables()?;
    view_data.derived = DerivedView::build(&view_data.tables, state, view_data.today);
    let locations = view_data.derived.locations.len();
    view_data.filter_cursor = view_data.filter_cursor.min(locations.saturating_sub(1));
    view_data.clamp_plot_cursor();
    Ok(())
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(frame.area());
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(20), Constraint::Min(1)])
        .split(rows[0]);

    render_sidebar(frame, columns[0], state);
    match state.active_view {
        ViewKind::Dashboard => render_dashboard(frame, columns[1], view_data),
        ViewKind::Input => render_input(frame, columns[1], state, view_data),
        ViewKind::Monitoring => render_monitoring(frame, columns[1], state, view_data),
    }

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, rows[1]);

    if view_data.help_visible {
        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .wrap(Wrap { trim: false })
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_sidebar(frame: &mut ratatui::Frame<'_>, area: Rect, state: &AppState) {
    let items = ViewKind::ALL
        .iter()
        .enumerate()
        .map(|(index, view)| ListItem::new(format!("{} {}", index + 1, view.label())))
        .collect::<Vec<_>>();
    let selected = ViewKind::ALL
        .iter()
        .position(|view| *view == state.active_view);
    let list = List::new(items)
        .block(Block::default().title("sawit").borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");
    let mut list_state = ListState::default().with_selected(selected);
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_dashboard(frame: &mut ratatui::Frame<'_>, area: Rect, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(5)])
        .split(area);
    let tiles = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25); 4])
        .split(layout[0]);

    for (index, (label, value)) in metric_tiles(&view_data.derived.summary)
        .into_iter()
        .enumerate()
    {
        let tile = Paragraph::new(Span::styled(
            value,
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .block(Block::default().title(label).borders(Borders::ALL));
        frame.render_widget(tile, tiles[index]);
    }

    render_trend_chart(frame, layout[1], &view_data.derived.trend);
}

fn metric_tiles(summary: &DashboardSummary) -> [(&'static str, String); 4] {
    [
        (
            "total area",
            format!("{} Ha", format_area(summary.total_area_ha)),
        ),
        ("tree count", summary.total_trees.to_string()),
        (
            "total harvest",
            format!("{} Kg", format_thousands(summary.total_yield_kg)),
        ),
        ("mean harvest", format_mean(summary.mean_yield_kg)),
    ]
}

fn render_trend_chart(frame: &mut ratatui::Frame<'_>, area: Rect, trend: &[MonthlyYield]) {
    let block = Block::default()
        .title("harvest trend (kg per month)")
        .borders(Borders::ALL);
    let (Some(first), Some(last)) = (trend.first(), trend.last()) else {
        frame.render_widget(Paragraph::new("no harvest data").block(block), area);
        return;
    };

    let points = trend
        .iter()
        .enumerate()
        .map(|(index, row)| (index as f64, row.yield_kg as f64))
        .collect::<Vec<_>>();
    let max_yield = trend.iter().map(|row| row.yield_kg).max().unwrap_or(0);
    let y_max = (max_yield as f64 * 1.1).max(1.0);
    let x_max = (trend.len().saturating_sub(1) as f64).max(1.0);

    let dataset = Dataset::default()
        .name("kg")
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(&points);
    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .title("month")
                .bounds([0.0, x_max])
                .labels(vec![
                    Span::raw(first.month.clone()),
                    Span::raw(last.month.clone()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("kg")
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(format_thousands(max_yield / 2)),
                    Span::raw(format_thousands(max_yield)),
                ]),
        );
    frame.render_widget(chart, area);
}

fn render_input(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    let selected = FormKind::ALL
        .iter()
        .position(|kind| *kind == state.input_tab)
        .unwrap_or(0);
    let tabs = Tabs::new(
        FormKind::ALL
            .iter()
            .map(|kind| kind.label().to_owned())
            .collect::<Vec<_>>(),
    )
    .block(Block::default().title("input data").borders(Borders::ALL))
    .highlight_style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
    .select(selected);
    frame.render_widget(tabs, layout[0]);

    let editing = matches!(state.mode, AppMode::Form(_));
    let preview;
    let form = match view_data.form.as_ref() {
        Some(form) if editing => form,
        _ => {
            preview = FormUiState::blank(state.input_tab, view_data.today);
            &preview
        }
    };
    let title = if editing {
        format!("{} (editing)", form.kind.label())
    } else {
        format!("{} (enter to edit)", form.kind.label())
    };
    let body = Paragraph::new(render_form_lines(form, editing))
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(body, layout[1]);
}

fn render_form_lines(form: &FormUiState, editing: bool) -> Vec<Line<'static>> {
    form_field_specs(form.kind)
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let active = editing && index == form.field_index;
            let marker = if active { "▸ " } else { "  " };
            let value = match spec.kind {
                FieldKind::Variety => Variety::ALL
                    .iter()
                    .enumerate()
                    .map(|(choice, variety)| {
                        if variety.as_str() == form.value(index) {
                            format!("[{}:{}]", choice + 1, variety.as_str())
                        } else {
                            format!(" {}:{} ", choice + 1, variety.as_str())
                        }
                    })
                    .collect::<String>(),
                _ => form.value(index).to_owned(),
            };
            let style = if active {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!("{marker}{:<14}", spec.label), style),
                Span::raw(value),
            ])
        })
        .collect()
}

fn render_monitoring(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Percentage(40),
            Constraint::Min(CARD_HEIGHT),
        ])
        .split(area);
    let lower = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(layout[2]);

    let filter = Paragraph::new(render_filter_line(state, view_data)).block(
        Block::default()
            .title("location filter (/ to edit)")
            .borders(Borders::ALL),
    );
    frame.render_widget(filter, layout[0]);

    let monitored = &view_data.derived.monitored;
    render_plot_table(frame, layout[1], monitored, view_data.plot_cursor);
    render_progress_cards(frame, lower[0], monitored, view_data.plot_cursor);
    render_yield_bars(
        frame,
        lower[1],
        &view_data.derived.per_plot,
        view_data.selected_plot(),
    );
}

fn render_filter_line(state: &AppState, view_data: &ViewData) -> Line<'static> {
    let locations = &view_data.derived.locations;
    if locations.is_empty() {
        return Line::from("no locations");
    }
    let mut spans = Vec::with_capacity(locations.len());
    for (index, location) in locations.iter().enumerate() {
        let mark = if state.location_filter.contains(location) {
            "[x]"
        } else {
            "[ ]"
        };
        let style = if state.mode == AppMode::Filter && index == view_data.filter_cursor {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        spans.push(Span::styled(format!("{mark} {location}"), style));
        spans.push(Span::raw("  "));
    }
    Line::from(spans)
}

/// Fits `len` items into `capacity` slots, keeping `focus` on screen.
fn visible_window(len: usize, capacity: usize, focus: usize) -> Range<usize> {
    if len == 0 || capacity == 0 {
        return 0..0;
    }
    let focus = focus.min(len - 1);
    let start = (focus + 1).saturating_sub(capacity);
    start..start.saturating_add(capacity).min(len)
}

fn window_label(window: &Range<usize>, len: usize) -> String {
    if window.start == 0 && window.end == len {
        len.to_string()
    } else if window.is_empty() {
        format!("0 of {len}")
    } else {
        format!("showing {}-{} of {len}", window.start + 1, window.end)
    }
}

fn render_plot_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    monitored: &[(PlantingRecord, PlotProgress)],
    cursor: usize,
) {
    let capacity = usize::from(area.height.saturating_sub(TABLE_CHROME_ROWS));
    let window = visible_window(monitored.len(), capacity, cursor);
    let header = Row::new(
        [
            "id",
            "plot",
            "planted",
            "area (Ha)",
            "trees",
            "variety",
            "location",
            "age (months)",
        ]
        .map(Cell::from),
    )
    .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = monitored.iter().map(|(record, progress)| {
        Row::new(vec![
            Cell::from(record.id.to_string()),
            Cell::from(record.plot_name.clone()),
            Cell::from(format_date(record.planted_on)),
            Cell::from(format_area(record.area_ha)),
            Cell::from(record.tree_count.to_string()),
            Cell::from(record.variety.as_str()),
            Cell::from(record.location.clone()),
            Cell::from(progress.age_months.to_string()),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(10),
            Constraint::Length(11),
            Constraint::Length(10),
            Constraint::Length(7),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .row_highlight_style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
    .block(
        Block::default()
            .title(format!("plots ({})", window_label(&window, monitored.len())))
            .borders(Borders::ALL),
    );

    let selected = (!monitored.is_empty()).then_some(cursor);
    let mut table_state = TableState::default()
        .with_offset(window.start)
        .with_selected(selected);
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn render_progress_cards(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    monitored: &[(PlantingRecord, PlotProgress)],
    cursor: usize,
) {
    let inner = Block::default().borders(Borders::ALL).inner(area);
    let capacity = usize::from(inner.height / CARD_HEIGHT);
    let window = visible_window(monitored.len(), capacity, cursor);
    let block = Block::default()
        .title(format!("progress ({})", window_label(&window, monitored.len())))
        .borders(Borders::ALL);
    frame.render_widget(block, area);
    if window.is_empty() {
        return;
    }

    let slots = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(CARD_HEIGHT); window.len()])
        .split(inner);

    for ((index, (_, progress)), slot) in monitored
        .iter()
        .enumerate()
        .skip(window.start)
        .zip(slots.iter())
    {
        let title_style = if index == cursor {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let gauge = Gauge::default()
            .block(
                Block::default()
                    .title(Span::styled(
                        format!("{} · {}", progress.plot_name, progress.location),
                        title_style,
                    ))
                    .borders(Borders::ALL),
            )
            .gauge_style(Style::default().fg(status_color(progress.status)))
            .ratio(progress.progress_pct / 100.0)
            .label(format!(
                "{:.0}% · {}",
                progress.progress_pct,
                progress.status.label()
            ));
        frame.render_widget(gauge, *slot);
    }
}

fn status_color(status: GrowthStatus) -> Color {
    match status {
        GrowthStatus::NewlyPlanted => Color::LightBlue,
        GrowthStatus::Growing => Color::Yellow,
        GrowthStatus::ReadyToHarvest => Color::Green,
    }
}

/// Covers every plot regardless of the location filter, scrolled so the
/// selected plot's bar stays visible.
fn render_yield_bars(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    per_plot: &[PlotYield],
    selected: Option<PlotId>,
) {
    let inner_width = area.width.saturating_sub(2);
    let capacity = usize::from(inner_width.saturating_add(BAR_GAP) / (BAR_WIDTH + BAR_GAP));
    let focus = selected
        .and_then(|plot_id| per_plot.iter().position(|row| row.plot_id == plot_id))
        .unwrap_or(0);
    let window = visible_window(per_plot.len(), capacity, focus);

    let shown = &per_plot[window.clone()];
    let labels = shown
        .iter()
        .map(|row| row.plot_id.to_string())
        .collect::<Vec<_>>();
    let bars = labels
        .iter()
        .zip(shown)
        .map(|(label, row)| (label.as_str(), row.yield_kg))
        .collect::<Vec<_>>();
    let chart = BarChart::default()
        .block(
            Block::default()
                .title(format!(
                    "harvest per plot (kg, {})",
                    window_label(&window, per_plot.len())
                ))
                .borders(Borders::ALL),
        )
        .data(bars.as_slice())
        .bar_width(BAR_WIDTH)
        .bar_gap(BAR_GAP)
        .bar_style(Style::default().fg(Color::Green))
        .value_style(Style::default().fg(Color::Black).bg(Color::Green));
    frame.render_widget(chart, area);
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if view_data.help_visible {
        return String::new();
    }

    let mode = match state.mode {
        AppMode::Nav => "NAV",
        AppMode::Form(_) => "FORM",
        AppMode::Filter => "FILTER",
    };
    let hints = match state.mode {
        AppMode::Nav => match state.active_view {
            ViewKind::Dashboard => "1-3/tab views | ? help | ctrl+q quit",
            ViewKind::Input => "enter edit | t tab | 1-3/tab views | ? help | ctrl+q quit",
            ViewKind::Monitoring => {
                "j/k plot | / filter | c clear | 1-3/tab views | ? help | ctrl+q quit"
            }
        },
        AppMode::Form(_) => "tab field | up/down adjust | enter save | esc cancel",
        AppMode::Filter => "j/k move | space toggle | c clear | esc done",
    };
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | ? help\n\
nav: tab/shift+tab or f/b next/prev view | 1 dashboard | 2 input | 3 monitoring | esc clear status\n\
input: t switch tab | enter or i edit form\n\
form: tab/shift+tab field | type to edit | backspace delete | up/down adjust number or day\n\
form: pgup/pgdn month | 1-3 or left/right variety | ctrl+t switch tab | enter or ctrl+s save | esc cancel\n\
monitoring: j/k or up/down scroll plots | / edit location filter | c clear filter\n\
filter: j/k or arrows move | space/enter toggle | c clear | esc done"
}

fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn format_area(area_ha: f64) -> String {
    let text = format!("{area_ha:.1}");
    match text.strip_suffix(".0") {
        Some(whole) => whole.to_owned(),
        None => text,
    }
}

fn format_mean(mean_kg: Option<f64>) -> String {
    match mean_kg {
        Some(mean) if mean.is_finite() && mean >= 0.0 => {
            format!("{} Kg", format_thousands(mean.round() as u64))
        }
        _ => "n/a".to_owned(),
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, FormUiState, InternalEvent, ViewData, format_area, format_mean,
        format_thousands, handle_key_event, help_overlay_text, parse_form_payload,
        process_internal_events, refresh_view_data, render, shift_date_by_months, status_text,
        visible_window, window_label,
    };
    use anyhow::{Result, bail};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use sawit_app::{
        AppMode, AppState, FormKind, FormPayload, HarvestId, HarvestRecord, PlantingRecord,
        PlotId, RecordTables, Variety, ViewKind,
    };
    use std::sync::mpsc;
    use time::Date;
    use time::macros::date;

    const TODAY: Date = date!(2026 - 10 - 16);

    #[derive(Debug, Default)]
    struct TestRuntime {
        tables: RecordTables,
        submitted: Vec<FormPayload>,
        load_count: usize,
        fail_load: bool,
    }

    impl TestRuntime {
        fn with_sample_tables() -> Self {
            Self {
                tables: RecordTables {
                    plantings: vec![
                        sample_plot(1, "Blok A", date!(2023 - 03 - 10)),
                        sample_plot(2, "Blok B", date!(2024 - 01 - 15)),
                        sample_plot(3, "Blok A", date!(2026 - 06 - 01)),
                    ],
                    harvests: vec![
                        sample_harvest(1, 1, 12_000),
                        sample_harvest(2, 1, 15_000),
                        sample_harvest(3, 3, 9_000),
                    ],
                },
                ..Self::default()
            }
        }
    }

    fn sample_plot(id: i64, location: &str, planted_on: Date) -> PlantingRecord {
        PlantingRecord {
            id: PlotId::new(id),
            plot_name: format!("Plot {id}"),
            planted_on,
            area_ha: 10.0,
            tree_count: 1_400,
            variety: Variety::Tenera,
            location: location.to_owned(),
        }
    }

    fn sample_harvest(id: i64, plot_id: i64, yield_kg: u64) -> HarvestRecord {
        HarvestRecord {
            id: HarvestId::new(id),
            plot_id: PlotId::new(plot_id),
            harvested_on: date!(2026 - 04 - 20),
            yield_kg,
            worker: "Budi".to_owned(),
            note: String::new(),
        }
    }

    impl AppRuntime for TestRuntime {
        fn load_tables(&mut self) -> Result<RecordTables> {
            self.load_count += 1;
            if self.fail_load {
                bail!("generator unavailable");
            }
            Ok(self.tables.clone())
        }

        fn today(&self) -> Date {
            TODAY
        }

        fn submit_form(&mut self, payload: &FormPayload) -> Result<String> {
            self.submitted.push(payload.clone());
            Ok(payload.confirmation())
        }
    }

    fn runtime_with_plots(count: i64) -> TestRuntime {
        TestRuntime {
            tables: RecordTables {
                plantings: (1..=count)
                    .map(|id| sample_plot(id, "Blok A", date!(2023 - 03 - 10)))
                    .collect(),
                harvests: (1..=count)
                    .map(|id| sample_harvest(id, id, id.unsigned_abs() * 1_000))
                    .collect(),
            },
            ..TestRuntime::default()
        }
    }

    fn view_data_for_test() -> ViewData {
        ViewData::new(TODAY)
    }

    fn internal_tx() -> mpsc::Sender<InternalEvent> {
        let (tx, _rx) = mpsc::channel();
        tx
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn press(
        state: &mut AppState,
        runtime: &mut TestRuntime,
        view_data: &mut ViewData,
        keys: &[KeyEvent],
    ) {
        let tx = internal_tx();
        for key in keys {
            assert!(!handle_key_event(state, runtime, view_data, &tx, *key));
        }
    }

    fn type_text(
        state: &mut AppState,
        runtime: &mut TestRuntime,
        view_data: &mut ViewData,
        text: &str,
    ) {
        let keys = text
            .chars()
            .map(|ch| key(KeyCode::Char(ch)))
            .collect::<Vec<_>>();
        press(state, runtime, view_data, &keys);
    }

    fn loaded() -> (AppState, TestRuntime, ViewData) {
        let state = AppState::default();
        let mut runtime = TestRuntime::with_sample_tables();
        let mut view_data = view_data_for_test();
        refresh_view_data(&state, &mut runtime, &mut view_data).expect("refresh");
        (state, runtime, view_data)
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn ctrl_q_quits_from_any_mode() {
        let (mut state, mut runtime, mut view_data) = loaded();
        state.mode = AppMode::Form(FormKind::Harvest);
        let quit = handle_key_event(
            &mut state,
            &mut runtime,
            &mut view_data,
            &internal_tx(),
            KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL),
        );
        assert!(quit);
    }

    #[test]
    fn every_handled_key_regenerates_tables() {
        let (mut state, mut runtime, mut view_data) = loaded();
        assert_eq!(runtime.load_count, 1);
        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[key(KeyCode::Char('x')), key(KeyCode::Char('y'))],
        );
        assert_eq!(runtime.load_count, 3);
    }

    #[test]
    fn tab_and_number_keys_switch_views() {
        let (mut state, mut runtime, mut view_data) = loaded();
        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Tab)]);
        assert_eq!(state.active_view, ViewKind::Input);

        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::BackTab)]);
        assert_eq!(state.active_view, ViewKind::Dashboard);

        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Char('b'))]);
        assert_eq!(state.active_view, ViewKind::Monitoring);

        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Char('2'))]);
        assert_eq!(state.active_view, ViewKind::Input);
    }

    #[test]
    fn help_overlay_opens_and_swallows_keys() {
        let (mut state, mut runtime, mut view_data) = loaded();
        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Char('?'))]);
        assert!(view_data.help_visible);
        assert_eq!(status_text(&state, &view_data), "");

        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Char('3'))]);
        assert_eq!(state.active_view, ViewKind::Dashboard);

        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Esc)]);
        assert!(!view_data.help_visible);
        assert!(help_overlay_text().contains("ctrl+q quit"));
    }

    #[test]
    fn planting_form_saves_without_storing() {
        let (mut state, mut runtime, mut view_data) = loaded();
        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[key(KeyCode::Char('2')), key(KeyCode::Enter)],
        );
        assert_eq!(state.mode, AppMode::Form(FormKind::Planting));
        let form = view_data.form.as_ref().expect("form open");
        assert_eq!(form.value(0), "2026-10-16");

        let tabs = [key(KeyCode::Tab); 2];
        press(&mut state, &mut runtime, &mut view_data, &tabs);
        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Backspace); 3]);
        type_text(&mut state, &mut runtime, &mut view_data, "4.5");
        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Tab)]);
        type_text(&mut state, &mut runtime, &mut view_data, "600");
        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Tab)]);
        type_text(&mut state, &mut runtime, &mut view_data, "2");
        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Tab)]);
        type_text(&mut state, &mut runtime, &mut view_data, "Blok D");
        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Enter)]);

        assert_eq!(
            state.status_line.as_deref(),
            Some("✅ planting data Blok D saved")
        );
        assert_eq!(runtime.submitted.len(), 1);
        match &runtime.submitted[0] {
            FormPayload::Planting(input) => {
                assert_eq!(input.area_ha, 4.5);
                assert_eq!(input.tree_count, 600);
                assert_eq!(input.variety, Variety::Dxp);
                assert_eq!(input.planted_on, TODAY);
            }
            other => panic!("unexpected payload {other:?}"),
        }
        assert_eq!(view_data.tables.plantings.len(), 3);
        assert_eq!(state.mode, AppMode::Form(FormKind::Planting));
    }

    #[test]
    fn numeric_fields_reject_letters_and_signs() {
        let (mut state, mut runtime, mut view_data) = loaded();
        state.active_view = ViewKind::Input;
        state.input_tab = FormKind::Harvest;
        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Enter)]);
        type_text(&mut state, &mut runtime, &mut view_data, "-x2");
        let form = view_data.form.as_ref().expect("form open");
        assert_eq!(form.value(0), "12");
    }

    #[test]
    fn harvest_plot_id_cannot_go_below_one() {
        let (mut state, mut runtime, mut view_data) = loaded();
        state.active_view = ViewKind::Input;
        state.input_tab = FormKind::Harvest;
        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[key(KeyCode::Enter), key(KeyCode::Down), key(KeyCode::Down)],
        );
        assert_eq!(view_data.form.as_ref().expect("form").value(0), "1");

        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Backspace)]);
        type_text(&mut state, &mut runtime, &mut view_data, "0");
        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Enter)]);
        let status = state.status_line.clone().unwrap_or_default();
        assert!(status.starts_with("form invalid"), "{status}");
        assert!(status.contains("at least 1"), "{status}");
        assert!(runtime.submitted.is_empty());
    }

    #[test]
    fn harvest_form_confirms_plot_id() {
        let (mut state, mut runtime, mut view_data) = loaded();
        state.active_view = ViewKind::Input;
        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[key(KeyCode::Char('t')), key(KeyCode::Char('i'))],
        );
        assert_eq!(state.mode, AppMode::Form(FormKind::Harvest));
        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Backspace)]);
        type_text(&mut state, &mut runtime, &mut view_data, "7");
        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)],
        );
        assert_eq!(
            state.status_line.as_deref(),
            Some("✅ harvest data for plot 7 saved")
        );
    }

    #[test]
    fn date_field_steps_by_day_and_month() {
        let (mut state, mut runtime, mut view_data) = loaded();
        state.active_view = ViewKind::Input;
        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[key(KeyCode::Enter), key(KeyCode::Up), key(KeyCode::PageDown)],
        );
        assert_eq!(view_data.form.as_ref().expect("form").value(0), "2026-09-17");
    }

    #[test]
    fn half_typed_date_is_reported_on_submit() {
        let (mut state, mut runtime, mut view_data) = loaded();
        state.active_view = ViewKind::Input;
        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Enter)]);
        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Backspace); 3]);
        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Enter)]);
        let status = state.status_line.clone().unwrap_or_default();
        assert!(status.contains("planting date must be YYYY-MM-DD"), "{status}");
    }

    #[test]
    fn escape_leaves_form_and_drops_buffers() {
        let (mut state, mut runtime, mut view_data) = loaded();
        state.active_view = ViewKind::Input;
        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[key(KeyCode::Enter), key(KeyCode::Esc)],
        );
        assert_eq!(state.mode, AppMode::Nav);
        assert!(view_data.form.is_none());
    }

    #[test]
    fn filter_mode_toggles_locations() {
        let (mut state, mut runtime, mut view_data) = loaded();
        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[key(KeyCode::Char('3')), key(KeyCode::Char('/'))],
        );
        assert_eq!(state.mode, AppMode::Filter);
        assert_eq!(view_data.derived.locations, vec!["Blok A", "Blok B"]);

        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Char(' '))]);
        assert!(state.location_filter.contains("Blok A"));
        assert_eq!(view_data.derived.monitored.len(), 2);
        assert_eq!(view_data.derived.per_plot.len(), 3);

        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[key(KeyCode::Char('c')), key(KeyCode::Esc)],
        );
        assert!(state.location_filter.is_empty());
        assert_eq!(view_data.derived.monitored.len(), 3);
        assert_eq!(state.mode, AppMode::Nav);
    }

    #[test]
    fn load_failure_surfaces_in_status() {
        let (mut state, mut runtime, mut view_data) = loaded();
        runtime.fail_load = true;
        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Tab)]);
        let status = state.status_line.clone().unwrap_or_default();
        assert_eq!(status, "load failed: generator unavailable");
    }

    #[test]
    fn stale_status_clear_is_ignored() {
        let (mut state, _runtime, mut view_data) = loaded();
        let (tx, rx) = mpsc::channel();
        state.status_line = Some("saved".to_owned());
        view_data.status_token = 2;

        tx.send(InternalEvent::ClearStatus { token: 1 }).expect("send");
        process_internal_events(&mut state, &mut view_data, &rx);
        assert_eq!(state.status_line.as_deref(), Some("saved"));

        tx.send(InternalEvent::ClearStatus { token: 2 }).expect("send");
        process_internal_events(&mut state, &mut view_data, &rx);
        assert_eq!(state.status_line, None);
    }

    #[test]
    fn blank_form_parses_to_default_payload() {
        let form = FormUiState::blank(FormKind::Harvest, TODAY);
        let payload = parse_form_payload(&form).expect("blank form parses");
        assert_eq!(payload, FormPayload::blank_for(FormKind::Harvest, TODAY));

        let form = FormUiState::blank(FormKind::Planting, TODAY);
        let payload = parse_form_payload(&form).expect("blank form parses");
        assert_eq!(payload, FormPayload::blank_for(FormKind::Planting, TODAY));
    }

    #[test]
    fn formatters_match_dashboard_tiles() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(59_500), "59,500");
        assert_eq!(format_thousands(1_234_567), "1,234,567");
        assert_eq!(format_area(30.0), "30");
        assert_eq!(format_area(12.3), "12.3");
        assert_eq!(format_mean(Some(11_900.0)), "11,900 Kg");
        assert_eq!(format_mean(Some(11_899.6)), "11,900 Kg");
        assert_eq!(format_mean(None), "n/a");
    }

    #[test]
    fn month_shift_clamps_to_last_day() {
        assert_eq!(
            shift_date_by_months(date!(2024 - 01 - 31), 1),
            Some(date!(2024 - 02 - 29))
        );
        assert_eq!(
            shift_date_by_months(date!(2024 - 12 - 15), 1),
            Some(date!(2025 - 01 - 15))
        );
        assert_eq!(
            shift_date_by_months(date!(2024 - 01 - 15), -1),
            Some(date!(2023 - 12 - 15))
        );
    }

    #[test]
    fn dashboard_renders_na_without_harvests() -> Result<()> {
        let state = AppState::default();
        let mut runtime = TestRuntime::with_sample_tables();
        runtime.tables.harvests.clear();
        let mut view_data = view_data_for_test();
        refresh_view_data(&state, &mut runtime, &mut view_data)?;

        let mut terminal = Terminal::new(TestBackend::new(120, 30))?;
        terminal.draw(|frame| render(frame, &state, &view_data))?;
        let text = buffer_text(&terminal);
        assert!(text.contains("n/a"), "{text}");
        assert!(text.contains("30 Ha"));
        assert!(text.contains("no harvest data"));
        Ok(())
    }

    #[test]
    fn every_view_renders() -> Result<()> {
        let (mut state, mut runtime, mut view_data) = loaded();
        let mut terminal = Terminal::new(TestBackend::new(140, 40))?;
        for view in ViewKind::ALL {
            state.active_view = view;
            terminal.draw(|frame| render(frame, &state, &view_data))?;
        }
        let text = buffer_text(&terminal);
        assert!(text.contains("harvest per plot"), "{text}");
        assert!(text.contains("ready to harvest"));

        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Char('2'))]);
        terminal.draw(|frame| render(frame, &state, &view_data))?;
        let text = buffer_text(&terminal);
        assert!(text.contains("planting date"));
        assert!(text.contains("2026-10-16"));
        Ok(())
    }

    #[test]
    fn visible_window_keeps_focus_on_screen() {
        assert_eq!(visible_window(8, 5, 0), 0..5);
        assert_eq!(visible_window(8, 5, 4), 0..5);
        assert_eq!(visible_window(8, 5, 7), 3..8);
        assert_eq!(visible_window(8, 5, 99), 3..8);
        assert_eq!(visible_window(3, 5, 2), 0..3);
        assert_eq!(visible_window(0, 5, 0), 0..0);
        assert_eq!(visible_window(4, 0, 1), 0..0);

        assert_eq!(window_label(&(0..3), 3), "3");
        assert_eq!(window_label(&(3..8), 8), "showing 4-8 of 8");
        assert_eq!(window_label(&(0..0), 4), "0 of 4");
    }

    #[test]
    fn monitoring_scrolls_to_plots_past_the_fold() -> Result<()> {
        let mut state = AppState {
            active_view: ViewKind::Monitoring,
            ..AppState::default()
        };
        let mut runtime = runtime_with_plots(8);
        let mut view_data = view_data_for_test();
        refresh_view_data(&state, &mut runtime, &mut view_data)?;

        let mut terminal = Terminal::new(TestBackend::new(120, 40))?;
        terminal.draw(|frame| render(frame, &state, &view_data))?;
        let text = buffer_text(&terminal);
        assert!(text.contains("Plot 1 ·"), "{text}");
        assert!(!text.contains("Plot 8 ·"), "{text}");
        assert!(text.contains("6000"), "{text}");
        assert!(!text.contains("8000"), "{text}");
        assert!(text.contains("of 8)"), "{text}");

        let down = vec![key(KeyCode::Char('j')); 10];
        press(&mut state, &mut runtime, &mut view_data, &down);
        assert_eq!(view_data.plot_cursor, 7);
        assert_eq!(view_data.selected_plot(), Some(PlotId::new(8)));

        terminal.draw(|frame| render(frame, &state, &view_data))?;
        let text = buffer_text(&terminal);
        assert!(text.contains("Plot 8 ·"), "{text}");
        assert!(!text.contains("Plot 1 ·"), "{text}");
        assert!(text.contains("8000"), "{text}");
        assert!(text.contains("of 8)"), "{text}");

        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Up)]);
        assert_eq!(view_data.plot_cursor, 6);
        Ok(())
    }

    #[test]
    fn plot_cursor_stays_inside_filtered_plots() {
        let (mut state, mut runtime, mut view_data) = loaded();
        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[
                key(KeyCode::Char('3')),
                key(KeyCode::Char('j')),
                key(KeyCode::Char('j')),
            ],
        );
        assert_eq!(view_data.plot_cursor, 2);

        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[
                key(KeyCode::Char('/')),
                key(KeyCode::Down),
                key(KeyCode::Char(' ')),
                key(KeyCode::Esc),
            ],
        );
        assert!(state.location_filter.contains("Blok B"));
        assert_eq!(view_data.derived.monitored.len(), 1);
        assert_eq!(view_data.plot_cursor, 0);
        assert_eq!(view_data.selected_plot(), Some(PlotId::new(2)));
    }
}
