use chrono::{Local, NaiveDate, NaiveTime, TimeZone};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use thiserror::Error;

use crate::calendar::datetime::{parse_calendar_date_in, parse_date_time, to_server_instant_in};
use crate::calendar::{Event, EventUpdate, NewEvent};
use crate::theme::Theme;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormField {
    Title,
    Description,
    StartDate,
    EndDate,
    StartTime,
    EndTime,
    AllDay,
}

impl FormField {
    pub fn next(&self) -> Self {
        match self {
            FormField::Title => FormField::Description,
            FormField::Description => FormField::StartDate,
            FormField::StartDate => FormField::EndDate,
            FormField::EndDate => FormField::StartTime,
            FormField::StartTime => FormField::EndTime,
            FormField::EndTime => FormField::AllDay,
            FormField::AllDay => FormField::Title,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            FormField::Title => FormField::AllDay,
            FormField::Description => FormField::Title,
            FormField::StartDate => FormField::Description,
            FormField::EndDate => FormField::StartDate,
            FormField::StartTime => FormField::EndDate,
            FormField::EndTime => FormField::StartTime,
            FormField::AllDay => FormField::EndTime,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Event title is required")]
    TitleRequired,
    #[error("Invalid date {0:?}, use YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Invalid time {0:?}, use HH:MM")]
    InvalidTime(String),
    #[error("End must not be before start")]
    EndBeforeStart,
}

#[derive(Debug, Clone)]
pub struct EventFormState {
    pub title: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    pub start_time: String,
    pub end_time: String,
    pub is_all_day: bool,
    pub active_field: FormField,
    /// The event being edited; `None` for a new event.
    pub editing: Option<Event>,
    /// A request is in flight; input is ignored until it resolves.
    pub submitting: bool,
}

impl EventFormState {
    pub fn new(date: NaiveDate) -> Self {
        let day = date.format(DATE_FORMAT).to_string();
        Self {
            title: String::new(),
            description: String::new(),
            start_date: day.clone(),
            end_date: day,
            start_time: "09:00".to_string(),
            end_time: "10:00".to_string(),
            is_all_day: false,
            active_field: FormField::Title,
            editing: None,
            submitting: false,
        }
    }

    pub fn for_event(event: &Event, fallback_date: NaiveDate) -> Self {
        Self::for_event_in(event, fallback_date, &Local)
    }

    /// Prefill from an existing event. All-day events show their inclusive
    /// last day; timed events show local wall-clock values. Parts that do
    /// not parse fall back to `fallback_date` and 09:00/10:00.
    pub fn for_event_in<Tz: TimeZone>(event: &Event, fallback_date: NaiveDate, tz: &Tz) -> Self {
        let mut form = Self::new(fallback_date);
        form.title = event.title.clone();
        form.description = event.description.clone().unwrap_or_default();
        form.is_all_day = event.all_day;

        if event.all_day {
            let start = parse_calendar_date_in(&event.start_time, true, tz).unwrap_or(fallback_date);
            let last = parse_calendar_date_in(&event.end_time, true, tz)
                .ok()
                .and_then(|end| end.pred_opt())
                .filter(|last| *last >= start)
                .unwrap_or(start);
            form.start_date = start.format(DATE_FORMAT).to_string();
            form.end_date = last.format(DATE_FORMAT).to_string();
        } else {
            if let Ok(start) = parse_date_time(&event.start_time) {
                let local = start.with_timezone(tz).naive_local();
                form.start_date = local.date().format(DATE_FORMAT).to_string();
                form.end_date = form.start_date.clone();
                form.start_time = local.time().format(TIME_FORMAT).to_string();
            }
            if let Ok(end) = parse_date_time(&event.end_time) {
                let local = end.with_timezone(tz).naive_local();
                form.end_date = local.date().format(DATE_FORMAT).to_string();
                form.end_time = local.time().format(TIME_FORMAT).to_string();
            }
        }

        form.editing = Some(event.clone());
        form
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn input_char(&mut self, c: char) {
        match self.active_field {
            FormField::Title => self.title.push(c),
            FormField::Description => self.description.push(c),
            FormField::StartDate => self.start_date.push(c),
            FormField::EndDate => self.end_date.push(c),
            FormField::StartTime => self.start_time.push(c),
            FormField::EndTime => self.end_time.push(c),
            FormField::AllDay => {}
        }
    }

    pub fn backspace(&mut self) {
        match self.active_field {
            FormField::Title => { self.title.pop(); }
            FormField::Description => { self.description.pop(); }
            FormField::StartDate => { self.start_date.pop(); }
            FormField::EndDate => { self.end_date.pop(); }
            FormField::StartTime => { self.start_time.pop(); }
            FormField::EndTime => { self.end_time.pop(); }
            FormField::AllDay => {}
        }
    }

    pub fn toggle_all_day(&mut self) {
        self.is_all_day = !self.is_all_day;
    }

    fn parse_date(raw: &str) -> Result<NaiveDate, FormError> {
        NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
            .map_err(|_| FormError::InvalidDate(raw.to_string()))
    }

    fn parse_time(raw: &str) -> Result<NaiveTime, FormError> {
        NaiveTime::parse_from_str(raw.trim(), TIME_FORMAT)
            .map_err(|_| FormError::InvalidTime(raw.to_string()))
    }

    /// An empty end date means a single-day event.
    fn end_date_or_start(&self, start: NaiveDate) -> Result<NaiveDate, FormError> {
        if self.end_date.trim().is_empty() {
            Ok(start)
        } else {
            Self::parse_date(&self.end_date)
        }
    }

    pub fn is_multi_day(&self) -> bool {
        match Self::parse_date(&self.start_date) {
            Ok(start) => self.end_date_or_start(start).map_or(false, |end| end != start),
            Err(_) => false,
        }
    }

    pub fn to_new_event(&self) -> Result<NewEvent, FormError> {
        self.to_new_event_in(&Local)
    }

    /// Build the request body.
    ///
    /// All-day events are sent as date strings with an exclusive end one day
    /// after the last day. Timed events are sent as UTC instants; the end
    /// falls on the end date for multi-day events, else on the start date.
    pub fn to_new_event_in<Tz: TimeZone>(&self, tz: &Tz) -> Result<NewEvent, FormError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(FormError::TitleRequired);
        }
        let start_date = Self::parse_date(&self.start_date)?;
        let end_date = self.end_date_or_start(start_date)?;
        if end_date < start_date {
            return Err(FormError::EndBeforeStart);
        }
        let multi_day = end_date != start_date;

        let (start_time, end_time) = if self.is_all_day {
            let last = if multi_day { end_date } else { start_date };
            let exclusive = last.succ_opt().unwrap_or(last);
            (
                start_date.format(DATE_FORMAT).to_string(),
                exclusive.format(DATE_FORMAT).to_string(),
            )
        } else {
            let start = start_date.and_time(Self::parse_time(&self.start_time)?);
            let end_day = if multi_day { end_date } else { start_date };
            let end = end_day.and_time(Self::parse_time(&self.end_time)?);
            if end < start {
                return Err(FormError::EndBeforeStart);
            }
            let start = to_server_instant_in(start, tz)
                .ok_or_else(|| FormError::InvalidTime(self.start_time.clone()))?;
            let end = to_server_instant_in(end, tz)
                .ok_or_else(|| FormError::InvalidTime(self.end_time.clone()))?;
            (start, end)
        };

        let description = self.description.trim();
        Ok(NewEvent {
            title: title.to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            start_time,
            end_time,
            all_day: self.is_all_day,
        })
    }

    pub fn to_update(&self) -> Result<EventUpdate, FormError> {
        self.to_update_in(&Local)
    }

    /// Changes against the event being edited. Only differing fields are
    /// set; with no original event every field is set.
    pub fn to_update_in<Tz: TimeZone>(&self, tz: &Tz) -> Result<EventUpdate, FormError> {
        let body = self.to_new_event_in(tz)?;
        let Some(ref original) = self.editing else {
            return Ok(EventUpdate {
                title: Some(body.title),
                description: body.description,
                start_time: Some(body.start_time),
                end_time: Some(body.end_time),
                all_day: Some(body.all_day),
            });
        };

        let description = body.description.unwrap_or_default();
        let original_description = original.description.clone().unwrap_or_default();
        let unchanged_start = same_moment(&original.start_time, &body.start_time, original.all_day);
        let unchanged_end = same_moment(&original.end_time, &body.end_time, original.all_day);
        let all_day_same = original.all_day == body.all_day;

        Ok(EventUpdate {
            title: (body.title != original.title).then_some(body.title),
            description: (description != original_description).then_some(description),
            start_time: (!(all_day_same && unchanged_start)).then_some(body.start_time),
            end_time: (!(all_day_same && unchanged_end)).then_some(body.end_time),
            all_day: (!all_day_same).then_some(body.all_day),
        })
    }
}

/// Whether an edited timestamp still denotes the stored one, ignoring
/// serialization differences such as a missing `Z` or fractional seconds.
fn same_moment(stored: &str, edited: &str, all_day: bool) -> bool {
    if all_day {
        return stored.get(..10) == edited.get(..10);
    }
    match (parse_date_time(stored), parse_date_time(edited)) {
        (Ok(a), Ok(b)) => a == b,
        _ => stored == edited,
    }
}

pub struct EventForm;

impl EventForm {
    pub fn render(frame: &mut Frame, area: Rect, state: &EventFormState, theme: &Theme) {
        // Center the form popup
        let form_w = area.width.clamp(30, 56);
        let form_h = area.height.clamp(12, 15);
        let x = area.x + (area.width.saturating_sub(form_w)) / 2;
        let y = area.y + (area.height.saturating_sub(form_h)) / 2;
        let form_area = Rect::new(x, y, form_w.min(area.width), form_h.min(area.height));

        frame.render_widget(Clear, form_area);

        let title = if state.is_editing() { " Edit Event " } else { " New Event " };
        let accent = Style::default().fg(ratatui::style::Color::Green);
        let block = Block::default()
            .title(title)
            .title_style(accent.add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_style(accent);

        let inner = block.inner(form_area);
        frame.render_widget(block, form_area);

        let rows = Layout::vertical([
            Constraint::Length(1), // title
            Constraint::Length(1), // description
            Constraint::Length(1), // start date
            Constraint::Length(1), // end date
            Constraint::Length(1), // start time
            Constraint::Length(1), // end time
            Constraint::Length(1), // all day
            Constraint::Length(1), // spacer
            Constraint::Length(1), // help
            Constraint::Min(0),
        ])
        .split(inner);

        let active = |field| state.active_field == field && !state.submitting;

        render_field(frame, rows[0], "Title:", &state.title, active(FormField::Title), theme);
        render_field(frame, rows[1], "Notes:", &state.description, active(FormField::Description), theme);
        render_field(frame, rows[2], "Start:", &state.start_date, active(FormField::StartDate), theme);
        render_field(frame, rows[3], "End:", &state.end_date, active(FormField::EndDate), theme);

        if state.is_all_day {
            render_field(frame, rows[4], "From:", "--:--", false, theme);
            render_field(frame, rows[5], "To:", "--:--", false, theme);
        } else {
            render_field(frame, rows[4], "From:", &state.start_time, active(FormField::StartTime), theme);
            render_field(frame, rows[5], "To:", &state.end_time, active(FormField::EndTime), theme);
        }

        let check = if state.is_all_day { "[x]" } else { "[ ]" };
        let mut all_day_val = format!("{check} All Day");
        if state.is_multi_day() {
            all_day_val.push_str("  (multi-day)");
        }
        render_field(frame, rows[6], "", &all_day_val, active(FormField::AllDay), theme);

        let help = if state.submitting {
            Line::from(Span::styled("Saving...", theme.dim))
        } else {
            Line::from(vec![
                Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(":Next ", theme.dim),
                Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(":Save ", theme.dim),
                Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(":Cancel", theme.dim),
            ])
        };
        frame.render_widget(Paragraph::new(help), rows[8]);
    }
}

fn render_field(frame: &mut Frame, area: Rect, label: &str, value: &str, active: bool, theme: &Theme) {
    let label_w = if label.is_empty() { 0 } else { 7 };
    let cursor = if active { "_" } else { "" };

    let style = if active {
        Style::default().fg(ratatui::style::Color::Cyan)
    } else {
        Style::default()
    };

    let mut spans = Vec::new();
    if !label.is_empty() {
        spans.push(Span::styled(
            format!("{:<width$}", label, width = label_w),
            theme.dim,
        ));
    }
    spans.push(Span::styled(format!("{}{}", value, cursor), style));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
