// ABOUTME: Calendar-date helpers for due-date display and overdue checks
// ABOUTME: Pure functions over chrono NaiveDate, no clock injection needed by callers

use chrono::{NaiveDate, Utc};

pub fn is_today(date: NaiveDate) -> bool {
    date == Utc::now().date_naive()
}

pub fn is_past(date: NaiveDate) -> bool {
    date < Utc::now().date_naive()
}

/// Past and not today.
pub fn is_overdue(date: NaiveDate) -> bool {
    is_past(date) && !is_today(date)
}

/// Human-readable distance from today, e.g. "Today", "Tomorrow", "In 3 days".
pub fn relative_time(date: NaiveDate) -> String {
    let today = Utc::now().date_naive();
    let diff_days = (date - today).num_days();

    match diff_days {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        d if d > 1 => format!("In {} days", d),
        d => format!("{} days ago", -d),
    }
}
