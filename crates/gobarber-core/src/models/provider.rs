use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::format_hour;

/// Hours before this belong to the morning section of a day.
pub const AFTERNOON_START_HOUR: u32 = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct Provider {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// One entry of `GET /providers/:id/day-availability`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct AvailabilityItem {
    pub hour: u32,
    pub available: bool,
}

/// An availability item ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilitySlot {
    pub hour: u32,
    pub available: bool,
    /// `HH:00`
    pub label: String,
}

impl From<&AvailabilityItem> for AvailabilitySlot {
    fn from(item: &AvailabilityItem) -> Self {
        Self {
            hour: item.hour,
            available: item.available,
            label: format_hour(item.hour),
        }
    }
}

/// A provider's hourly availability for a single day.
#[derive(Debug, Clone)]
pub struct DayAvailability {
    pub provider_id: String,
    pub date: NaiveDate,
    pub items: Vec<AvailabilityItem>,
}

impl DayAvailability {
    pub fn new(provider_id: impl Into<String>, date: NaiveDate, items: Vec<AvailabilityItem>) -> Self {
        Self {
            provider_id: provider_id.into(),
            date,
            items,
        }
    }

    /// Slots before noon, in server order.
    pub fn morning(&self) -> Vec<AvailabilitySlot> {
        self.items
            .iter()
            .filter(|item| item.hour < AFTERNOON_START_HOUR)
            .map(AvailabilitySlot::from)
            .collect()
    }

    /// Slots from noon on, in server order.
    pub fn afternoon(&self) -> Vec<AvailabilitySlot> {
        self.items
            .iter()
            .filter(|item| item.hour >= AFTERNOON_START_HOUR)
            .map(AvailabilitySlot::from)
            .collect()
    }

    pub fn is_available(&self, hour: u32) -> bool {
        self.items.iter().any(|item| item.hour == hour && item.available)
    }

    pub fn available_count(&self) -> usize {
        self.items.iter().filter(|item| item.available).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(items: &[(u32, bool)]) -> DayAvailability {
        DayAvailability::new(
            "p1",
            NaiveDate::from_ymd_opt(2026, 10, 20).expect("valid date"),
            items
                .iter()
                .map(|&(hour, available)| AvailabilityItem { hour, available })
                .collect(),
        )
    }

    #[test]
    fn test_split_morning_afternoon() {
        let availability = day(&[(8, true), (11, false), (12, true), (17, false)]);

        let morning = availability.morning();
        assert_eq!(morning.len(), 2);
        assert_eq!(morning[0].label, "08:00");
        assert_eq!(morning[1].hour, 11);
        assert!(!morning[1].available);

        let afternoon = availability.afternoon();
        assert_eq!(afternoon.len(), 2);
        assert_eq!(afternoon[0].label, "12:00");
        assert_eq!(afternoon[1].label, "17:00");
    }

    #[test]
    fn test_split_empty_day() {
        let availability = day(&[]);
        assert!(availability.morning().is_empty());
        assert!(availability.afternoon().is_empty());
        assert_eq!(availability.available_count(), 0);
    }

    #[test]
    fn test_is_available() {
        let availability = day(&[(9, true), (10, false)]);
        assert!(availability.is_available(9));
        assert!(!availability.is_available(10));
        // Hours the server did not list are never bookable
        assert!(!availability.is_available(13));
    }

    #[test]
    fn test_parse_availability_response() {
        let json = r#"[{"hour":8,"available":false},{"hour":9,"available":true}]"#;
        let items: Vec<AvailabilityItem> = serde_json::from_str(json).expect("parse availability");
        assert_eq!(items.len(), 2);
        assert!(items[1].available);
    }

    #[test]
    fn test_parse_provider_without_avatar() {
        let json = r#"[{"id":"a1","name":"Carlos","email":"c@example.com"}]"#;
        let providers: Vec<Provider> = serde_json::from_str(json).expect("parse providers");
        assert_eq!(providers[0].name, "Carlos");
        assert!(providers[0].avatar_url.is_none());
    }
}
