use std::future::Future;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError, SyncResponse};
use crate::calendar::grid::{add_months, first_of_month, visible_range};
use crate::calendar::{
    map_events_to_days, sort_for_display, DateRange, DayLayout, Event, EventId,
};
use crate::components::day_view::Detail;
use crate::components::event_form::EventFormState;
use crate::components::status_bar::{Toast, ToastKind};
use crate::config::Config;
use crate::theme::{Theme, ThemeConfig, ThemeStore};

/// Result of a backend request, delivered back to the UI thread.
#[derive(Debug)]
pub enum ApiOutcome {
    EventsLoaded(Result<Vec<Event>, ApiError>),
    EventLoaded(EventId, Result<Event, ApiError>),
    Created(Result<Event, ApiError>),
    Updated(EventId, Result<Event, ApiError>),
    Deleted(EventId, Result<(), ApiError>),
    Synced(Result<SyncResponse, ApiError>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Form,
}

pub struct App {
    pub running: bool,
    pub selected_date: NaiveDate,
    pub today: NaiveDate,
    pub events: Vec<Event>,
    /// Index into the selected day's display-ordered events.
    pub cursor: usize,
    pub form_state: Option<EventFormState>,
    pub detail: Option<Detail>,
    pub show_help: bool,
    pub toast: Option<Toast>,
    pub loading: bool,
    pub syncing: bool,
    pub theme: Theme,
    pub config: Config,
    theme_config: ThemeConfig,
    theme_store: Box<dyn ThemeStore>,
    client: ApiClient,
    runtime: Handle,
    tx: UnboundedSender<ApiOutcome>,
    rx: UnboundedReceiver<ApiOutcome>,
}

impl App {
    pub fn new(
        config: Config,
        client: ApiClient,
        runtime: Handle,
        theme_store: Box<dyn ThemeStore>,
    ) -> Self {
        let today = Local::now().date_naive();
        let theme_config = theme_store.load().unwrap_or_default();
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            running: true,
            selected_date: today,
            today,
            events: Vec::new(),
            cursor: 0,
            form_state: None,
            detail: None,
            show_help: false,
            toast: None,
            loading: false,
            syncing: false,
            theme: theme_config.to_theme(),
            config,
            theme_config,
            theme_store,
            client,
            runtime,
            tx,
            rx,
        }
    }

    pub fn input_mode(&self) -> InputMode {
        if self.form_state.is_some() {
            InputMode::Form
        } else {
            InputMode::Normal
        }
    }

    pub fn month_anchor(&self) -> NaiveDate {
        first_of_month(self.selected_date)
    }

    pub fn visible_range(&self) -> DateRange {
        visible_range(self.selected_date, self.config.week_start)
    }

    /// Recomputed on every call from the current event list.
    pub fn day_layout(&self) -> DayLayout<'_> {
        map_events_to_days(&self.events, self.visible_range())
    }

    pub fn selected_day_events(&self) -> Vec<&Event> {
        let layout = self.day_layout();
        let mut events = layout.events_on(self.selected_date).to_vec();
        sort_for_display(&mut events);
        events
    }

    /// The event the popup shows, else the one under the day-list cursor.
    pub fn selected_event(&self) -> Option<&Event> {
        if let Some(Detail::Loaded(ref ev)) = self.detail {
            return Some(ev);
        }
        self.selected_day_events().get(self.cursor).copied()
    }

    pub fn notify(&mut self, message: impl Into<String>, kind: ToastKind) {
        let toast = Toast::new(message, kind, self.config.toast_duration());
        debug!(message = %toast.message, ?kind, "toast");
        self.toast = Some(toast);
    }

    pub fn tick(&mut self, now: Instant) {
        if self.toast.as_ref().is_some_and(|t| t.is_expired(now)) {
            self.toast = None;
        }
    }

    fn spawn<F>(&self, request: F)
    where
        F: Future<Output = ApiOutcome> + Send + 'static,
    {
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            // The receiver only goes away on shutdown.
            let _ = tx.send(request.await);
        });
    }

    // ── Requests ──

    pub fn reload(&mut self) {
        self.loading = true;
        let client = self.client.clone();
        self.spawn(async move { ApiOutcome::EventsLoaded(client.list_events().await) });
    }

    pub fn sync(&mut self) {
        if self.syncing {
            self.notify("Sync already in progress", ToastKind::Info);
            return;
        }
        info!("starting google sync");
        self.syncing = true;
        let client = self.client.clone();
        self.spawn(async move { ApiOutcome::Synced(client.sync_google().await) });
    }

    pub fn show_detail(&mut self) {
        let Some(id) = self.selected_event().map(|e| e.id) else {
            return;
        };
        self.detail = Some(Detail::Loading(id));
        let client = self.client.clone();
        self.spawn(async move { ApiOutcome::EventLoaded(id, client.get_event(id).await) });
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    pub fn delete_selected_event(&mut self) {
        let Some(id) = self.selected_event().map(|e| e.id) else {
            return;
        };
        info!(id, "deleting event");
        let client = self.client.clone();
        self.spawn(async move { ApiOutcome::Deleted(id, client.delete_event(id).await) });
    }

    // ── Form ──

    pub fn open_event_form(&mut self) {
        self.form_state = Some(EventFormState::new(self.selected_date));
    }

    pub fn open_edit_form(&mut self) {
        if let Some(event) = self.selected_event().cloned() {
            self.form_state = Some(EventFormState::for_event(&event, self.selected_date));
            self.detail = None;
        }
    }

    pub fn close_event_form(&mut self) {
        self.form_state = None;
    }

    fn editable_form(&mut self) -> Option<&mut EventFormState> {
        self.form_state.as_mut().filter(|f| !f.submitting)
    }

    pub fn form_input_char(&mut self, c: char) {
        if let Some(form) = self.editable_form() {
            form.input_char(c);
        }
    }

    pub fn form_backspace(&mut self) {
        if let Some(form) = self.editable_form() {
            form.backspace();
        }
    }

    pub fn form_tab(&mut self) {
        if let Some(form) = self.editable_form() {
            form.active_field = form.active_field.next();
        }
    }

    pub fn form_backtab(&mut self) {
        if let Some(form) = self.editable_form() {
            form.active_field = form.active_field.prev();
        }
    }

    pub fn form_toggle_all_day(&mut self) {
        if let Some(form) = self.editable_form() {
            form.toggle_all_day();
        }
    }

    /// Validate and send the form. The form stays open with its contents
    /// until the server confirms.
    pub fn submit_event_form(&mut self) {
        let Some(form) = self.form_state.as_ref() else {
            return;
        };
        if form.submitting {
            return;
        }

        let client = self.client.clone();
        match form.editing.as_ref().map(|e| e.id) {
            None => match form.to_new_event() {
                Ok(body) => {
                    info!(title = %body.title, "creating event");
                    self.spawn(async move { ApiOutcome::Created(client.create_event(&body).await) });
                }
                Err(err) => return self.notify(err.to_string(), ToastKind::Error),
            },
            Some(id) => match form.to_update() {
                Ok(update) if update.is_empty() => {
                    self.form_state = None;
                    return self.notify("No changes to save", ToastKind::Info);
                }
                Ok(update) => {
                    info!(id, "updating event");
                    self.spawn(async move {
                        ApiOutcome::Updated(id, client.update_event(id, &update).await)
                    });
                }
                Err(err) => return self.notify(err.to_string(), ToastKind::Error),
            },
        }

        if let Some(form) = self.form_state.as_mut() {
            form.submitting = true;
        }
    }

    // ── Responses ──

    /// Apply every finished request. Called once per UI tick.
    pub fn poll_responses(&mut self) {
        while let Ok(outcome) = self.rx.try_recv() {
            self.handle_outcome(outcome);
        }
    }

    pub fn handle_outcome(&mut self, outcome: ApiOutcome) {
        match outcome {
            ApiOutcome::EventsLoaded(result) => {
                self.loading = false;
                match result {
                    Ok(events) => {
                        debug!(count = events.len(), "events loaded");
                        self.events = events;
                        self.clamp_cursor();
                    }
                    Err(err) => self.request_failed("Failed to load events", &err),
                }
            }
            ApiOutcome::EventLoaded(id, result) => {
                let showing = self.detail == Some(Detail::Loading(id));
                match result {
                    Ok(event) => {
                        self.replace_event(event.clone());
                        if showing {
                            self.detail = Some(Detail::Loaded(event));
                        }
                    }
                    Err(err) => {
                        if showing {
                            self.detail = None;
                        }
                        self.request_failed("Failed to load event", &err);
                        if err.is_not_found() {
                            self.remove_event(id);
                        }
                    }
                }
            }
            ApiOutcome::Created(result) => match result {
                Ok(event) => {
                    self.events.push(event);
                    self.form_state = None;
                    self.notify("Event created successfully!", ToastKind::Success);
                }
                Err(err) => {
                    self.release_form();
                    self.request_failed("Failed to create event", &err);
                }
            },
            ApiOutcome::Updated(id, result) => match result {
                Ok(event) => {
                    if matches!(self.detail, Some(Detail::Loaded(ref e)) if e.id == id) {
                        self.detail = Some(Detail::Loaded(event.clone()));
                    }
                    self.replace_event(event);
                    self.form_state = None;
                    self.notify("Event updated successfully!", ToastKind::Success);
                }
                Err(err) if err.is_not_found() => {
                    self.form_state = None;
                    self.remove_event(id);
                    self.request_failed("Failed to update event", &err);
                }
                Err(err) => {
                    self.release_form();
                    self.request_failed("Failed to update event", &err);
                }
            },
            ApiOutcome::Deleted(id, result) => match result {
                Ok(()) => {
                    self.remove_event(id);
                    self.notify("Event deleted", ToastKind::Success);
                }
                Err(err) => {
                    if err.is_not_found() {
                        self.remove_event(id);
                    }
                    self.request_failed("Failed to delete event", &err);
                }
            },
            ApiOutcome::Synced(result) => {
                self.syncing = false;
                match result {
                    Ok(resp) => {
                        let synced = resp.synced.unwrap_or(0);
                        info!(synced, "google sync finished");
                        self.notify(
                            format!("Google sync completed! {synced} events synced."),
                            ToastKind::Success,
                        );
                        self.reload();
                    }
                    Err(err) => self.request_failed("Sync failed", &err),
                }
            }
        }
    }

    fn request_failed(&mut self, what: &str, err: &ApiError) {
        warn!(%err, "{what}");
        let message = if err.is_not_found() {
            "Event not found".to_string()
        } else {
            format!("{what}: {err}")
        };
        self.notify(message, ToastKind::Error);
    }

    fn release_form(&mut self) {
        if let Some(form) = self.form_state.as_mut() {
            form.submitting = false;
        }
    }

    fn replace_event(&mut self, event: Event) {
        match self.events.iter_mut().find(|e| e.id == event.id) {
            Some(slot) => *slot = event,
            None => self.events.push(event),
        }
    }

    fn remove_event(&mut self, id: EventId) {
        self.events.retain(|e| e.id != id);
        if matches!(self.detail, Some(Detail::Loaded(ref e)) if e.id == id) {
            self.detail = None;
        }
        self.clamp_cursor();
    }

    fn clamp_cursor(&mut self) {
        let len = self.selected_day_events().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    // ── Theme ──

    /// Move to the next preset and persist the choice.
    pub fn cycle_theme(&mut self) {
        self.theme_config.cycle_preset();
        self.theme = self.theme_config.to_theme();
        match self.theme_store.save(&self.theme_config) {
            Ok(()) => {
                let msg = format!("Theme: {}", self.theme.name);
                self.notify(msg, ToastKind::Info);
            }
            Err(err) => {
                warn!(error = %err, "saving theme failed");
                self.notify("Could not save theme", ToastKind::Error);
            }
        }
    }

    // ── Navigation ──

    fn select(&mut self, date: NaiveDate) {
        if date != self.selected_date {
            self.selected_date = date;
            self.cursor = 0;
        }
    }

    pub fn next_day(&mut self) {
        self.select(self.selected_date.succ_opt().unwrap_or(self.selected_date));
    }

    pub fn prev_day(&mut self) {
        self.select(self.selected_date.pred_opt().unwrap_or(self.selected_date));
    }

    pub fn next_week(&mut self) {
        let date = self
            .selected_date
            .checked_add_days(chrono::Days::new(7))
            .unwrap_or(self.selected_date);
        self.select(date);
    }

    pub fn prev_week(&mut self) {
        let date = self
            .selected_date
            .checked_sub_days(chrono::Days::new(7))
            .unwrap_or(self.selected_date);
        self.select(date);
    }

    pub fn next_month(&mut self) {
        self.select(add_months(self.selected_date, 1));
    }

    pub fn prev_month(&mut self) {
        self.select(add_months(self.selected_date, -1));
    }

    pub fn go_to_today(&mut self) {
        self.today = Local::now().date_naive();
        self.select(self.today);
    }

    pub fn cursor_down(&mut self) {
        let len = self.selected_day_events().len();
        if self.cursor + 1 < len {
            self.cursor += 1;
        }
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }
}
