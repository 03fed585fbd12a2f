use chrono::{DateTime, TimeZone};

/// Format an hour of the day as a slot label, e.g. `9` -> `09:00`
pub fn format_hour(hour: u32) -> String {
    format!("{:02}:00", hour)
}

/// Format a booked instant for confirmation messages,
/// e.g. `Tuesday, October 20, 2026 at 15:00`
pub fn format_appointment_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%A, %B %-d, %Y at %H:%M").to_string()
}

/// Shorten a bearer token for display so it never appears in full
pub fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    if token.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}
