mod api;
mod app;
mod calendar;
mod cli;
mod components;
mod config;
mod event;
mod logging;
mod theme;
mod tui;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use app::{App, InputMode};
use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Layout, Rect};
use tracing::info;

use crate::api::ApiClient;
use crate::cli::Cli;
use crate::components::event_form::FormField;
use crate::components::month_view::MonthGrid;
use crate::components::status_bar::StatusLine;
use crate::config::Config;
use crate::event::Input;
use crate::theme::{FileThemeStore, Theme};

const TICK: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let _log_guard = logging::init_tracing(cli.verbose, cli.quiet, cli.log_stderr)?;

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.api_base_url {
        config.api_base_url = url;
    }

    let runtime = tokio::runtime::Runtime::new().wrap_err("starting async runtime")?;
    let client = ApiClient::new(&config.api_base_url, config.request_timeout())
        .wrap_err("building HTTP client")?;
    info!(api = %client.base_url(), "backend client ready");
    let theme_path = config::theme_path(cli.config.as_deref())
        .unwrap_or_else(|| PathBuf::from("theme.toml"));

    let mut app = App::new(
        config,
        client,
        runtime.handle().clone(),
        Box::new(FileThemeStore::new(theme_path)),
    );
    app.reload();

    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app);
    tui::restore()?;
    runtime.shutdown_timeout(Duration::from_secs(1));
    result
}

fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    while app.running {
        terminal.draw(|frame| draw(frame, app))?;

        match event::next_input(TICK)? {
            Input::Key(key) => handle_key(app, key),
            Input::Resize | Input::Tick => {}
        }
        app.poll_responses();
        app.tick(Instant::now());
    }
    info!("exiting");
    Ok(())
}

fn draw(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let layout = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(area);

    render_main(frame, layout[0], app);

    if let Some(ref form) = app.form_state {
        components::EventForm::render(frame, area, form, &app.theme);
    }
    if let Some(ref detail) = app.detail {
        components::day_view::render_detail_popup(frame, area, detail, &app.theme);
    }
    if app.show_help {
        render_help(frame, area, &app.theme);
    }

    let mode = match app.input_mode() {
        InputMode::Form if app.form_state.as_ref().is_some_and(|f| f.is_editing()) => "Edit Event",
        InputMode::Form => "New Event",
        InputMode::Normal => "Month",
    };
    let status = StatusLine {
        mode,
        loading: app.loading,
        syncing: app.syncing,
        toast: app.toast.as_ref(),
    };
    components::StatusBar::render(frame, layout[1], &status, &app.theme);
}

/// Month grid, plus the selected day's list when there is room for it.
fn render_main(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    let layout = app.day_layout();
    let grid = MonthGrid {
        anchor: app.month_anchor(),
        selected: app.selected_date,
        today: app.today,
        range: app.visible_range(),
        layout: &layout,
        week_start: app.config.week_start,
        max_visible_events: app.config.max_visible_events,
    };

    if area.width < 80 {
        components::MonthView::render(frame, area, &grid, &app.theme);
        return;
    }

    let list_w = if area.width >= 140 { 48 } else { 34 };
    let content = Layout::horizontal([Constraint::Min(40), Constraint::Length(list_w)]).split(area);
    components::MonthView::render(frame, content[0], &grid, &app.theme);

    let events = app.selected_day_events();
    components::DayView::render(
        frame,
        content[1],
        app.selected_date,
        &events,
        app.cursor,
        &app.theme,
    );
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.running = false;
        return;
    }

    // Overlays take keys before the grid.
    if app.show_help {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.show_help = false;
        }
        return;
    }

    match app.input_mode() {
        InputMode::Form => handle_form_input(app, key.code),
        InputMode::Normal if app.detail.is_some() => handle_detail_input(app, key.code),
        InputMode::Normal => handle_normal_input(app, key.code),
    }
}

fn handle_detail_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc | KeyCode::Char('q') => app.close_detail(),
        KeyCode::Char('e') => app.open_edit_form(),
        KeyCode::Char('d') => app.delete_selected_event(),
        _ => {}
    }
}

fn handle_normal_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('q') => app.running = false,
        KeyCode::Char('t') => app.go_to_today(),
        KeyCode::Char('r') => app.reload(),
        KeyCode::Char('s') => app.sync(),
        KeyCode::Char('n') => app.open_event_form(),
        KeyCode::Char('e') => app.open_edit_form(),
        KeyCode::Char('d') => app.delete_selected_event(),
        KeyCode::Char('T') => app.cycle_theme(),
        KeyCode::Enter => app.show_detail(),
        KeyCode::Left | KeyCode::Char('h') => app.prev_day(),
        KeyCode::Right | KeyCode::Char('l') => app.next_day(),
        KeyCode::Char('K') => app.prev_week(),
        KeyCode::Char('J') => app.next_week(),
        KeyCode::Up | KeyCode::Char('k') => app.cursor_up(),
        KeyCode::Down | KeyCode::Char('j') => app.cursor_down(),
        KeyCode::Char('[') => app.prev_month(),
        KeyCode::Char(']') => app.next_month(),
        KeyCode::Char('?') => app.show_help = true,
        _ => {}
    }
}

fn handle_form_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => app.close_event_form(),
        KeyCode::Enter => app.submit_event_form(),
        KeyCode::Tab => app.form_tab(),
        KeyCode::BackTab => app.form_backtab(),
        KeyCode::Backspace => app.form_backspace(),
        KeyCode::Char(' ')
            if app.form_state.as_ref().map(|f| f.active_field) == Some(FormField::AllDay) =>
        {
            app.form_toggle_all_day();
        }
        KeyCode::Char(c) => app.form_input_char(c),
        _ => {}
    }
}

fn render_help(frame: &mut ratatui::Frame, area: Rect, theme: &Theme) {
    use ratatui::style::{Modifier, Style};
    use ratatui::text::{Line, Span};
    use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

    let popup_w = area.width.clamp(30, 52).min(area.width);
    let popup_h = area.height.clamp(12, 24).min(area.height);
    let x = area.x + (area.width.saturating_sub(popup_w)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_h)) / 2;
    let popup_area = Rect::new(x, y, popup_w, popup_h);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Keybindings ")
        .title_style(theme.header)
        .borders(Borders::ALL)
        .border_style(theme.border);

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let section = Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let key = |k: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {k:<10}"), theme.event.add_modifier(Modifier::BOLD)),
            Span::raw(desc),
        ])
    };

    let lines = vec![
        Line::from(Span::styled("Navigation", section)),
        key("h/l", "Previous/next day"),
        key("J/K", "Next/previous week"),
        key("[/]", "Previous/next month"),
        key("j/k", "Move in day list"),
        key("t", "Jump to today"),
        Line::from(""),
        Line::from(Span::styled("Events", section)),
        key("Enter", "Event details"),
        key("n", "New event"),
        key("e", "Edit selected event"),
        key("d", "Delete selected event"),
        key("r", "Reload events"),
        key("s", "Sync with Google Calendar"),
        Line::from(""),
        Line::from(Span::styled("Form", section)),
        key("Tab", "Next field"),
        key("Space", "Toggle all-day"),
        key("Enter/Esc", "Save / cancel"),
        Line::from(""),
        key("T", "Cycle theme"),
        key("q", "Quit / close popup"),
    ];

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
