//! Placement of events onto the days of the month grid.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate, TimeZone};

use super::datetime::{parse_calendar_date_in, parse_date_time, ParseError};
use super::event::{Event, EventId};
use super::grid::DateRange;

/// Where a day sits within an event's run of days. Drives which edge of a
/// multi-day bar carries the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanPosition {
    Single,
    Start,
    Middle,
    End,
}

impl SpanPosition {
    fn for_day(day: NaiveDate, first: NaiveDate, last: NaiveDate) -> Self {
        if first == last {
            SpanPosition::Single
        } else if day == first {
            SpanPosition::Start
        } else if day == last {
            SpanPosition::End
        } else {
            SpanPosition::Middle
        }
    }

    /// Whether the event title is drawn in this cell.
    pub fn shows_label(self) -> bool {
        !matches!(self, SpanPosition::Middle)
    }
}

/// Events per visible day, in input order.
pub type DayEventMap<'a> = BTreeMap<NaiveDate, Vec<&'a Event>>;

/// Span position per (day, event id), for every entry in the [`DayEventMap`].
pub type SpanPositionMap = BTreeMap<(NaiveDate, EventId), SpanPosition>;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct DayLayout<'a> {
    pub days: DayEventMap<'a>,
    pub positions: SpanPositionMap,
}

impl<'a> DayLayout<'a> {
    pub fn events_on(&self, day: NaiveDate) -> &[&'a Event] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Unmapped pairs read as `Single`.
    pub fn position(&self, day: NaiveDate, id: EventId) -> SpanPosition {
        self.positions
            .get(&(day, id))
            .copied()
            .unwrap_or(SpanPosition::Single)
    }

    fn place(&mut self, day: NaiveDate, event: &'a Event, position: SpanPosition) {
        self.days.entry(day).or_default().push(event);
        self.positions.insert((day, event.id), position);
    }
}

/// Map events onto the days of `range` in the viewer's local zone.
pub fn map_events_to_days(events: &[Event], range: DateRange) -> DayLayout<'_> {
    map_events_to_days_in(events, range, &Local)
}

/// Map events onto the days of `range` as seen from `tz`.
///
/// All-day events cover `[start, end)` by calendar date; an end on or
/// before the start is clamped to a single day. Timed events appear only on
/// the local day they start. An event whose dates cannot be read is placed
/// on its start day alone, or skipped when even that fails.
pub fn map_events_to_days_in<'a, Tz: TimeZone>(
    events: &'a [Event],
    range: DateRange,
    tz: &Tz,
) -> DayLayout<'a> {
    let mut layout = DayLayout::default();

    for event in events {
        let placed = if event.all_day {
            place_all_day(&mut layout, event, range, tz)
        } else {
            place_timed(&mut layout, event, range, tz)
        };

        if let Err(err) = placed {
            tracing::warn!(id = event.id, %err, "falling back to start-day placement");
            if let Err(err) = place_start_day(&mut layout, event, range, tz) {
                tracing::warn!(id = event.id, %err, "dropping event with unreadable start_time");
            }
        }
    }

    tracing::trace!(
        events = events.len(),
        visible = range.len(),
        days = layout.days.len(),
        "mapped events onto grid"
    );
    layout
}

fn place_all_day<'a, Tz: TimeZone>(
    layout: &mut DayLayout<'a>,
    event: &'a Event,
    range: DateRange,
    tz: &Tz,
) -> Result<(), ParseError> {
    let first = parse_calendar_date_in(&event.start_time, true, tz)?;
    let end_exclusive = parse_calendar_date_in(&event.end_time, true, tz)?;

    let last = if end_exclusive <= first {
        first
    } else {
        end_exclusive.pred_opt().unwrap_or(first)
    };

    // Walk only the overlap with the grid; positions still come from the
    // full span, so a bar cut by the grid edge keeps its interior look.
    let from = first.max(range.start);
    let to = last.min(range.end);
    if from > to {
        return Ok(());
    }
    for day in DateRange::new(from, to).days() {
        layout.place(day, event, SpanPosition::for_day(day, first, last));
    }
    Ok(())
}

fn place_timed<'a, Tz: TimeZone>(
    layout: &mut DayLayout<'a>,
    event: &'a Event,
    range: DateRange,
    tz: &Tz,
) -> Result<(), ParseError> {
    let day = parse_date_time(&event.start_time)?
        .with_timezone(tz)
        .date_naive();
    if range.contains(day) {
        layout.place(day, event, SpanPosition::Single);
    }
    Ok(())
}

/// Single-day placement for events whose full range could not be read.
/// All-day events keep their calendar date: reading "2025-08-22" as an
/// instant would land it on Aug 21 anywhere west of UTC.
fn place_start_day<'a, Tz: TimeZone>(
    layout: &mut DayLayout<'a>,
    event: &'a Event,
    range: DateRange,
    tz: &Tz,
) -> Result<(), ParseError> {
    if !event.all_day {
        return place_timed(layout, event, range, tz);
    }
    let day = parse_calendar_date_in(&event.start_time, true, tz)?;
    if range.contains(day) {
        layout.place(day, event, SpanPosition::Single);
    }
    Ok(())
}

/// Order a day's events for listing: all-day first, then by start time.
/// Ties keep their incoming order.
pub fn sort_for_display(events: &mut [&Event]) {
    events.sort_by(|a, b| {
        b.all_day
            .cmp(&a.all_day)
            .then_with(|| a.start_time.cmp(&b.start_time))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use chrono_tz::{America::New_York, Asia::Tokyo};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn august() -> DateRange {
        DateRange::new(ymd(2025, 7, 27), ymd(2025, 9, 6))
    }

    fn event(id: EventId, start: &str, end: &str, all_day: bool) -> Event {
        Event {
            id,
            title: format!("event {id}"),
            description: None,
            start_time: start.to_string(),
            end_time: end.to_string(),
            all_day,
            google_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn ids(events: &[&Event]) -> Vec<EventId> {
        events.iter().map(|e| e.id).collect()
    }

    #[test]
    fn multi_day_all_day_event_spans_with_exclusive_end() {
        let events = vec![event(1, "2025-08-22", "2025-08-25", true)];
        let layout = map_events_to_days_in(&events, august(), &Utc);

        assert_eq!(layout.days.len(), 3);
        assert_eq!(layout.position(ymd(2025, 8, 22), 1), SpanPosition::Start);
        assert_eq!(layout.position(ymd(2025, 8, 23), 1), SpanPosition::Middle);
        assert_eq!(layout.position(ymd(2025, 8, 24), 1), SpanPosition::End);
        assert!(layout.events_on(ymd(2025, 8, 25)).is_empty());
    }

    #[test]
    fn one_day_all_day_event_is_single() {
        let events = vec![event(1, "2025-08-22", "2025-08-23", true)];
        let layout = map_events_to_days_in(&events, august(), &Utc);

        assert_eq!(layout.days.len(), 1);
        assert_eq!(ids(layout.events_on(ymd(2025, 8, 22))), vec![1]);
        assert_eq!(layout.positions[&(ymd(2025, 8, 22), 1)], SpanPosition::Single);
    }

    #[test]
    fn inverted_or_empty_all_day_range_is_clamped_to_one_day() {
        let events = vec![
            event(1, "2025-08-22", "2025-08-22", true),
            event(2, "2025-08-22", "2025-08-10", true),
        ];
        let layout = map_events_to_days_in(&events, august(), &Utc);

        assert_eq!(layout.days.len(), 1);
        assert_eq!(ids(layout.events_on(ymd(2025, 8, 22))), vec![1, 2]);
        assert_eq!(layout.position(ymd(2025, 8, 22), 1), SpanPosition::Single);
        assert_eq!(layout.position(ymd(2025, 8, 22), 2), SpanPosition::Single);
    }

    #[test]
    fn all_day_events_ignore_viewer_zone() {
        let events = vec![event(1, "2025-08-22", "2025-08-23", true)];
        for layout in [
            map_events_to_days_in(&events, august(), &New_York),
            map_events_to_days_in(&events, august(), &Tokyo),
        ] {
            assert_eq!(ids(layout.events_on(ymd(2025, 8, 22))), vec![1]);
            assert_eq!(layout.days.len(), 1);
        }
    }

    #[test]
    fn all_day_with_server_midnight_timestamps() {
        let events = vec![event(1, "2025-08-22T00:00:00", "2025-08-24T00:00:00", true)];
        let layout = map_events_to_days_in(&events, august(), &New_York);
        assert_eq!(layout.position(ymd(2025, 8, 22), 1), SpanPosition::Start);
        assert_eq!(layout.position(ymd(2025, 8, 23), 1), SpanPosition::End);
        assert_eq!(layout.days.len(), 2);
    }

    #[test]
    fn timed_event_uses_local_day_not_utc_day() {
        // 01:30 UTC on the 23rd is 21:30 on the 22nd in New York.
        let events = vec![event(1, "2025-08-23T01:30:00", "2025-08-23T02:30:00", false)];

        let ny = map_events_to_days_in(&events, august(), &New_York);
        assert_eq!(ids(ny.events_on(ymd(2025, 8, 22))), vec![1]);
        assert!(ny.events_on(ymd(2025, 8, 23)).is_empty());

        let utc = map_events_to_days_in(&events, august(), &Utc);
        assert_eq!(ids(utc.events_on(ymd(2025, 8, 23))), vec![1]);
    }

    #[test]
    fn late_evening_utc_event_viewed_behind_utc() {
        let events = vec![event(1, "2025-08-22T23:30:00", "2025-08-23T00:30:00", false)];
        let layout = map_events_to_days_in(&events, august(), &New_York);
        assert_eq!(ids(layout.events_on(ymd(2025, 8, 22))), vec![1]);
        assert_eq!(layout.position(ymd(2025, 8, 22), 1), SpanPosition::Single);
    }

    #[test]
    fn multi_day_timed_event_shows_on_start_day_only() {
        let events = vec![event(1, "2025-08-22T10:00:00Z", "2025-08-25T10:00:00Z", false)];
        let layout = map_events_to_days_in(&events, august(), &Utc);
        assert_eq!(layout.days.len(), 1);
        assert_eq!(layout.position(ymd(2025, 8, 22), 1), SpanPosition::Single);
    }

    #[test]
    fn bucket_keeps_input_order() {
        let events = vec![
            event(10, "2025-08-22T18:00:00Z", "2025-08-22T19:00:00Z", false),
            event(11, "2025-08-22T08:00:00Z", "2025-08-22T09:00:00Z", false),
            event(12, "2025-08-22", "2025-08-23", true),
        ];
        let layout = map_events_to_days_in(&events, august(), &Utc);
        assert_eq!(ids(layout.events_on(ymd(2025, 8, 22))), vec![10, 11, 12]);
    }

    #[test]
    fn events_outside_range_contribute_nothing() {
        let events = vec![
            event(1, "2025-10-01", "2025-10-03", true),
            event(2, "2025-06-01T12:00:00Z", "2025-06-01T13:00:00Z", false),
        ];
        let layout = map_events_to_days_in(&events, august(), &Utc);
        assert!(layout.days.is_empty());
        assert!(layout.positions.is_empty());
    }

    #[test]
    fn span_clipped_by_grid_keeps_its_positions() {
        let range = DateRange::new(ymd(2025, 8, 3), ymd(2025, 8, 9));
        let events = vec![event(1, "2025-08-01", "2025-08-05", true)];
        let layout = map_events_to_days_in(&events, range, &Utc);

        assert_eq!(layout.days.len(), 2);
        assert_eq!(layout.position(ymd(2025, 8, 3), 1), SpanPosition::Middle);
        assert_eq!(layout.position(ymd(2025, 8, 4), 1), SpanPosition::End);
    }

    #[test]
    fn huge_span_only_walks_visible_days() {
        let events = vec![event(1, "0001-01-01", "9999-12-31", true)];
        let layout = map_events_to_days_in(&events, august(), &Utc);
        assert_eq!(layout.days.len(), august().len());
        assert!(layout
            .positions
            .values()
            .all(|p| *p == SpanPosition::Middle));
    }

    #[test]
    fn unreadable_all_day_end_falls_back_to_start_day() {
        let events = vec![event(1, "2025-08-22T12:00:00", "whenever", true)];
        let layout = map_events_to_days_in(&events, august(), &Utc);
        assert_eq!(ids(layout.events_on(ymd(2025, 8, 22))), vec![1]);
        assert_eq!(layout.position(ymd(2025, 8, 22), 1), SpanPosition::Single);
    }

    #[test]
    fn unreadable_all_day_end_keeps_start_date_behind_utc() {
        let events = vec![event(1, "2025-08-22", "whenever", true)];
        let layout = map_events_to_days_in(&events, august(), &New_York);
        assert_eq!(layout.days.len(), 1);
        assert_eq!(ids(layout.events_on(ymd(2025, 8, 22))), vec![1]);
        assert!(layout.events_on(ymd(2025, 8, 21)).is_empty());
        assert_eq!(layout.position(ymd(2025, 8, 22), 1), SpanPosition::Single);
    }

    #[test]
    fn unreadable_start_is_skipped() {
        let events = vec![
            event(1, "garbage", "garbage", false),
            event(2, "2025-08-22", "2025-08-23", true),
        ];
        let layout = map_events_to_days_in(&events, august(), &Utc);
        assert_eq!(layout.days.len(), 1);
        assert_eq!(ids(layout.events_on(ymd(2025, 8, 22))), vec![2]);
    }

    #[test]
    fn mapping_is_idempotent() {
        let events = vec![
            event(1, "2025-08-22", "2025-08-25", true),
            event(2, "2025-08-23T15:00:00", "2025-08-23T16:00:00", false),
            event(3, "2025-08-30", "2025-09-02", true),
        ];
        let first = map_events_to_days_in(&events, august(), &New_York);
        let second = map_events_to_days_in(&events, august(), &New_York);
        assert_eq!(first, second);
        assert_eq!(format!("{first:?}"), format!("{second:?}"));
    }

    #[test]
    fn display_sort_puts_all_day_first_then_start_time() {
        let a = event(1, "2025-08-22T18:00:00Z", "2025-08-22T19:00:00Z", false);
        let b = event(2, "2025-08-22T08:00:00Z", "2025-08-22T09:00:00Z", false);
        let c = event(3, "2025-08-22", "2025-08-23", true);
        let d = event(4, "2025-08-22T08:00:00Z", "2025-08-22T10:00:00Z", false);
        let mut day = vec![&a, &b, &c, &d];
        sort_for_display(&mut day);
        assert_eq!(ids(&day), vec![3, 2, 4, 1]);
    }
}
