use chrono::NaiveDate;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::calendar::datetime;
use crate::calendar::Event;
use crate::theme::Theme;

pub struct DayView;

impl DayView {
    /// `events` must already be in display order.
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        date: NaiveDate,
        events: &[&Event],
        cursor: usize,
        theme: &Theme,
    ) {
        let w = area.width as usize;

        let title = if w >= 30 {
            format!(" {} ", date.format("%A, %B %-d, %Y"))
        } else if w >= 18 {
            format!(" {} ", date.format("%b %-d, %Y"))
        } else {
            format!(" {} ", date.format("%m/%d"))
        };

        let count_str = match events.len() {
            0 => String::new(),
            1 => " 1 event ".to_string(),
            n => format!(" {n} events "),
        };

        let block = Block::default()
            .title(title)
            .title_style(theme.header)
            .title_bottom(Line::from(Span::styled(count_str, theme.dim)))
            .borders(Borders::ALL)
            .border_style(theme.border);

        if events.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let msg = Paragraph::new("No events scheduled for this day").style(theme.dim);
            frame.render_widget(msg, inner);
            return;
        }

        let items: Vec<ListItem> = events.iter().map(|ev| format_event(ev, theme)).collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(theme.highlight);
        let mut state = ListState::default().with_selected(Some(cursor.min(events.len() - 1)));
        frame.render_stateful_widget(list, area, &mut state);
    }
}

fn format_event(ev: &Event, theme: &Theme) -> ListItem<'static> {
    let (badge, badge_style) = if ev.all_day {
        (" ALL DAY ", theme.all_day)
    } else {
        (" TIMED ", theme.event.add_modifier(Modifier::REVERSED))
    };

    let time_str = format!(" {:<19} ", ev.duration_display());
    let mut lines = vec![Line::from(vec![
        Span::styled(badge, badge_style),
        Span::styled(time_str, Style::default().add_modifier(Modifier::DIM)),
        Span::styled(ev.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
    ])];

    if let Some(ref desc) = ev.description {
        if !desc.is_empty() {
            lines.push(Line::from(Span::styled(format!("   {desc}"), theme.dim)));
        }
    }

    ListItem::new(lines)
}

/// What the detail popup is showing.
#[derive(Debug, Clone, PartialEq)]
pub enum Detail {
    Loading(crate::calendar::EventId),
    Loaded(Event),
}

/// Render the event detail popup overlay.
pub fn render_detail_popup(frame: &mut Frame, area: Rect, detail: &Detail, theme: &Theme) {
    let popup_w = area.width.clamp(30, 60).min(area.width);
    let popup_h = area.height.clamp(8, 16).min(area.height);
    let x = area.x + (area.width.saturating_sub(popup_w)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_h)) / 2;
    let popup_area = Rect::new(x, y, popup_w, popup_h);

    frame.render_widget(Clear, popup_area);

    match detail {
        Detail::Loading(_) => {
            let block = detail_block(" Loading... ".to_string());
            let inner = block.inner(popup_area);
            frame.render_widget(block, popup_area);
            frame.render_widget(Paragraph::new("Fetching event details").style(theme.dim), inner);
        }
        Detail::Loaded(ev) => render_event_detail(frame, popup_area, ev, theme),
    }
}

fn detail_block(title: String) -> Block<'static> {
    Block::default()
        .title(title)
        .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
}

fn render_event_detail(frame: &mut Frame, area: Rect, ev: &Event, theme: &Theme) {
    let block = detail_block(format!(" {} ", ev.title));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::new();

    if ev.all_day {
        lines.push(Line::from(Span::styled("All day", theme.dim)));
        lines.push(Line::from(vec![
            Span::styled("Starts: ", theme.dim),
            Span::raw(datetime::format_all_day(&ev.start_time)),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Ends:   ", theme.dim),
            Span::raw(last_all_day(ev)),
        ]));
    } else {
        let start = datetime::format_with_zone(&ev.start_time);
        let end = datetime::format_with_zone(&ev.end_time);
        lines.push(Line::from(vec![
            Span::styled("Starts: ", theme.dim),
            Span::raw(format!("{} {}", start.date, start.time)),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Ends:   ", theme.dim),
            Span::raw(format!("{} {}", end.date, end.time)),
        ]));
        if !start.zone.is_empty() {
            lines.push(Line::from(vec![
                Span::styled("Zone:   ", theme.dim),
                Span::raw(start.zone),
            ]));
        }
    }

    if let Some(ref desc) = ev.description {
        if !desc.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Description:", theme.dim)));
            for line in desc.lines() {
                lines.push(Line::from(line.to_string()));
            }
        }
    }

    if let Some(ref created) = ev.created_at {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Added:   ", theme.dim),
            Span::raw(datetime::format_date(created)),
        ]));
    }
    if let Some(ref updated) = ev.updated_at {
        lines.push(Line::from(vec![
            Span::styled("Updated: ", theme.dim),
            Span::raw(datetime::format_date_time(updated)),
        ]));
    }

    if ev.google_id.is_some() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Synced from Google Calendar", theme.dim)));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "e:Edit  d:Delete  Esc:Close",
        theme.dim,
    )));

    let para = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(para, inner);
}

/// The stored end is exclusive; show the last day the event covers.
fn last_all_day(ev: &Event) -> String {
    let start = datetime::parse_calendar_date(&ev.start_time, true);
    match datetime::parse_calendar_date(&ev.end_time, true) {
        Ok(end) => {
            let last = end.pred_opt().unwrap_or(end);
            let last = match start {
                Ok(start) if last < start => start,
                _ => last,
            };
            last.format("%b %-d, %Y").to_string()
        }
        Err(_) => datetime::format_all_day(&ev.end_time),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_day(start: &str, end: &str) -> Event {
        Event {
            id: 1,
            title: "Camping".into(),
            description: None,
            start_time: start.into(),
            end_time: end.into(),
            all_day: true,
            google_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn all_day_end_shows_last_covered_day() {
        assert_eq!(last_all_day(&all_day("2025-08-22", "2025-08-25")), "Aug 24, 2025");
        assert_eq!(last_all_day(&all_day("2025-08-22", "2025-08-23")), "Aug 22, 2025");
    }

    #[test]
    fn malformed_all_day_end_is_clamped_or_raw() {
        assert_eq!(last_all_day(&all_day("2025-08-22", "2025-08-22")), "Aug 22, 2025");
        assert_eq!(last_all_day(&all_day("2025-08-22", "soon")), "soon");
    }
}
