pub mod datetime;
pub mod day_map;
pub mod event;
pub mod grid;

pub use day_map::{map_events_to_days, sort_for_display, DayLayout, SpanPosition};
pub use event::{Event, EventId, EventUpdate, NewEvent};
pub use grid::{DateRange, WeekStart};
