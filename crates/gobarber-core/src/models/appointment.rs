use chrono::{DateTime, Local, NaiveDate, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /appointments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct NewAppointment {
    pub provider_id: String,
    pub date: DateTime<Utc>,
}

impl NewAppointment {
    /// Book `hour:00` local time on `date`.
    ///
    /// Returns `None` when the hour is out of range or the local time does
    /// not exist (DST gap).
    pub fn at_hour(provider_id: impl Into<String>, date: NaiveDate, hour: u32) -> Option<Self> {
        let naive = date.and_hms_opt(hour, 0, 0)?;
        let local = Local.from_local_datetime(&naive).earliest()?;
        Some(Self {
            provider_id: provider_id.into(),
            date: local.with_timezone(&Utc),
        })
    }

    /// The booked instant in local time.
    pub fn local_date(&self) -> DateTime<Local> {
        self.date.with_timezone(&Local)
    }

    pub fn local_hour(&self) -> u32 {
        self.local_date().hour()
    }
}

/// The server's echo of a created appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct Appointment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}
