use chrono::{Datelike, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// First column of the month grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    pub fn weekday(self) -> Weekday {
        match self {
            WeekStart::Sunday => Weekday::Sun,
            WeekStart::Monday => Weekday::Mon,
        }
    }

    fn offset_of(self, date: NaiveDate) -> u32 {
        (7 + date.weekday().num_days_from_monday() - self.weekday().num_days_from_monday()) % 7
    }

    /// Short weekday labels in column order.
    pub fn day_names(self) -> [&'static str; 7] {
        match self {
            WeekStart::Sunday => ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"],
            WeekStart::Monday => ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
        }
    }
}

/// An inclusive run of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    pub fn len(&self) -> usize {
        if self.end < self.start {
            return 0;
        }
        (self.end - self.start).num_days() as usize + 1
    }

    /// The range in rows of seven days. Only meaningful for ranges built by
    /// [`visible_range`].
    pub fn weeks(&self) -> Vec<Vec<NaiveDate>> {
        let days: Vec<NaiveDate> = self.days().collect();
        days.chunks(7).map(|week| week.to_vec()).collect()
    }
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Move by whole months, clamping the day to the target month's length.
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.unwrap_or(date)
}

/// Full weeks covering the month containing `anchor`: from the first
/// `week_start` on or before the 1st, to the last day of the week holding
/// the month's final day.
pub fn visible_range(anchor: NaiveDate, week_start: WeekStart) -> DateRange {
    let first = first_of_month(anchor);
    let last = add_months(first, 1).pred_opt().unwrap_or(first);

    let start = first
        .checked_sub_days(chrono::Days::new(week_start.offset_of(first) as u64))
        .unwrap_or(first);
    let trailing = 6 - week_start.offset_of(last);
    let end = last
        .checked_add_days(chrono::Days::new(trailing as u64))
        .unwrap_or(last);

    DateRange::new(start, end)
}

pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn sunday_grid_for_august_2025() {
        let range = visible_range(ymd(2025, 8, 15), WeekStart::Sunday);
        assert_eq!(range.start, ymd(2025, 7, 27));
        assert_eq!(range.end, ymd(2025, 9, 6));
        assert_eq!(range.len(), 42);
        assert_eq!(range.weeks().len(), 6);
        assert!(range.weeks().iter().all(|w| w.len() == 7));
    }

    #[test]
    fn monday_grid_for_august_2025() {
        let range = visible_range(ymd(2025, 8, 1), WeekStart::Monday);
        assert_eq!(range.start, ymd(2025, 7, 28));
        assert_eq!(range.end, ymd(2025, 8, 31));
        assert_eq!(range.len() % 7, 0);
    }

    #[test]
    fn month_that_fits_exactly() {
        // February 2026 starts on a Sunday and has 28 days.
        let range = visible_range(ymd(2026, 2, 10), WeekStart::Sunday);
        assert_eq!(range.start, ymd(2026, 2, 1));
        assert_eq!(range.end, ymd(2026, 2, 28));
        assert_eq!(range.weeks().len(), 4);
    }

    #[test]
    fn grid_always_starts_on_week_start() {
        for month in 1..=12 {
            for ws in [WeekStart::Sunday, WeekStart::Monday] {
                let range = visible_range(ymd(2025, month, 1), ws);
                assert_eq!(range.start.weekday(), ws.weekday());
                assert_eq!(range.len() % 7, 0);
                assert!(range.contains(ymd(2025, month, 1)));
            }
        }
    }

    #[test]
    fn add_months_clamps_day() {
        assert_eq!(add_months(ymd(2025, 1, 31), 1), ymd(2025, 2, 28));
        assert_eq!(add_months(ymd(2024, 3, 31), -1), ymd(2024, 2, 29));
        assert_eq!(add_months(ymd(2025, 12, 15), 1), ymd(2026, 1, 15));
        assert_eq!(add_months(ymd(2025, 1, 15), -1), ymd(2024, 12, 15));
    }

    #[test]
    fn range_membership_is_inclusive() {
        let range = DateRange::new(ymd(2025, 8, 1), ymd(2025, 8, 3));
        assert!(range.contains(ymd(2025, 8, 1)));
        assert!(range.contains(ymd(2025, 8, 3)));
        assert!(!range.contains(ymd(2025, 8, 4)));
        assert_eq!(range.days().count(), 3);
    }
}
