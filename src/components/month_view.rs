use chrono::{Datelike, NaiveDate};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::calendar::grid::month_name;
use crate::calendar::{DateRange, DayLayout, Event, SpanPosition, WeekStart};
use crate::theme::Theme;

/// Everything the month grid needs for one frame.
pub struct MonthGrid<'a> {
    pub anchor: NaiveDate,
    pub selected: NaiveDate,
    pub today: NaiveDate,
    pub range: DateRange,
    pub layout: &'a DayLayout<'a>,
    pub week_start: WeekStart,
    pub max_visible_events: usize,
}

pub struct MonthView;

impl MonthView {
    pub fn render(frame: &mut Frame, area: Rect, grid: &MonthGrid, theme: &Theme) {
        let title = format!(" {} {} ", month_name(grid.anchor.month()), grid.anchor.year());

        let block = Block::default()
            .title(title)
            .title_style(theme.header)
            .borders(Borders::ALL)
            .border_style(theme.border);

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let weeks = grid.range.weeks();
        if weeks.is_empty() || inner.width < 7 {
            return;
        }

        let mut rows = vec![Constraint::Length(1)];
        rows.extend(weeks.iter().map(|_| Constraint::Fill(1)));
        let rows = Layout::vertical(rows).split(inner);

        let columns = || Layout::horizontal([Constraint::Fill(1); 7]);

        for (cell, name) in columns().split(rows[0]).iter().zip(grid.week_start.day_names()) {
            let header = Paragraph::new(Span::styled(name, theme.header));
            frame.render_widget(header, *cell);
        }

        for (week, row) in weeks.iter().zip(rows.iter().skip(1)) {
            for (day, cell) in week.iter().zip(columns().split(*row).iter()) {
                render_day(frame, *cell, *day, grid, theme);
            }
        }
    }
}

fn render_day(frame: &mut Frame, area: Rect, day: NaiveDate, grid: &MonthGrid, theme: &Theme) {
    let in_month = day.month() == grid.anchor.month() && day.year() == grid.anchor.year();
    let width = area.width as usize;

    let number_style = if day == grid.selected {
        theme.selected.add_modifier(Modifier::BOLD)
    } else if day == grid.today {
        theme.today
    } else if !in_month {
        theme.dim
    } else {
        Style::default()
    };

    let mut lines = vec![Line::from(Span::styled(format!("{:>2}", day.day()), number_style))];

    if in_month && area.height > 1 {
        let events = grid.layout.events_on(day);
        let shown = shown_events(events.len(), area.height as usize - 1, grid.max_visible_events);

        for event in &events[..shown] {
            let position = grid.layout.position(day, event.id);
            lines.push(event_line(event, position, width, theme));
        }
        if shown < events.len() {
            lines.push(Line::from(Span::styled(
                format!("+{} more", events.len() - shown),
                theme.dim,
            )));
        }
    }

    let style = if day == grid.selected {
        theme.highlight
    } else {
        Style::default()
    };
    frame.render_widget(Paragraph::new(lines).style(style), area);
}

/// How many of `total` event lines fit below the day number. Up to `max`
/// labels are shown; the "+N more" marker takes a label's line only when the
/// cell has no spare line under them.
fn shown_events(total: usize, lines: usize, max: usize) -> usize {
    if total <= max.min(lines) {
        total
    } else if lines > max {
        max
    } else {
        lines.saturating_sub(1)
    }
}

/// One event inside a cell. All-day bars fill the cell width so adjacent
/// cells read as a continuous bar; only the labelled edges carry the title.
fn event_line(event: &Event, position: SpanPosition, width: usize, theme: &Theme) -> Line<'static> {
    if !event.all_day {
        let text = format!("{} {}", short_time(event), event.title);
        return Line::from(Span::styled(truncate(&text, width), theme.event));
    }

    let body = if position.shows_label() {
        event.title.clone()
    } else {
        "\u{b7}\u{b7}\u{b7}".to_string()
    };
    let (lead, tail) = match position {
        SpanPosition::Single => (" ", " "),
        SpanPosition::Start => (" ", ""),
        SpanPosition::Middle => ("", ""),
        SpanPosition::End => ("", " "),
    };
    let inner = width.saturating_sub(lead.len() + tail.len());
    let text = format!("{lead}{:<inner$}{tail}", truncate(&body, inner));
    Line::from(Span::styled(text, theme.all_day))
}

fn short_time(event: &Event) -> String {
    let full = event.time_display();
    // "1:30 PM" -> "1:30p"
    full.replace(" AM", "a").replace(" PM", "p")
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(width - 1).collect();
    out.push('\u{2026}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_day(title: &str) -> Event {
        Event {
            id: 1,
            title: title.into(),
            description: None,
            start_time: "2025-08-22".into(),
            end_time: "2025-08-25".into(),
            all_day: true,
            google_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn truncates_with_ellipsis() {
        assert_eq!(truncate("Soccer", 10), "Soccer");
        assert_eq!(truncate("Soccer practice", 7), "Soccer\u{2026}");
        assert_eq!(truncate("abc", 0), "");
    }

    #[test]
    fn overflow_keeps_max_labels_when_cell_is_tall() {
        // Tall cell: three labels, then "+1 more" on its own line.
        assert_eq!(shown_events(4, 10, 3), 3);
        // Only three lines: the marker replaces the third label.
        assert_eq!(shown_events(4, 3, 3), 2);
        assert_eq!(shown_events(4, 2, 3), 1);
        assert_eq!(shown_events(3, 10, 3), 3);
        assert_eq!(shown_events(3, 3, 3), 3);
        assert_eq!(shown_events(0, 1, 3), 0);
    }

    #[test]
    fn bar_segments_fill_cell_width() {
        let event = all_day("Camping");
        let theme = Theme::default();
        for position in [
            SpanPosition::Single,
            SpanPosition::Start,
            SpanPosition::Middle,
            SpanPosition::End,
        ] {
            let line = event_line(&event, position, 12, &theme);
            assert_eq!(text(&line).chars().count(), 12);
        }
    }

    #[test]
    fn middle_segment_hides_title() {
        let event = all_day("Camping");
        let theme = Theme::default();
        let middle = text(&event_line(&event, SpanPosition::Middle, 10, &theme));
        assert!(!middle.contains("Camping"));
        assert!(middle.contains("\u{b7}\u{b7}\u{b7}"));
        let end = text(&event_line(&event, SpanPosition::End, 10, &theme));
        assert!(end.contains("Camping"));
    }
}
