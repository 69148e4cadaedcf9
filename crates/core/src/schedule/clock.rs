use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Game time: an opaque monotonic count of whole minutes since the game
/// epoch. Every scheduler tick advances it by exactly one minute, which is
/// what makes replays line up; the calendar view below is pure presentation.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Display,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[display(fmt = "minute {}", total_minutes)]
#[serde(rename_all = "camelCase")]
pub struct GameTime {
    total_minutes: u64,
}

/// A human-readable decomposition of [GameTime]. The game calendar is fixed
/// and regular: 60-minute hours, 24-hour days, 30-day months, 12-month
/// years, starting at year 1, month 1, day 1, 00:00.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarTime {
    pub year: u64,
    pub month: u64,
    pub day: u64,
    pub hour: u64,
    pub minute: u64,
}

impl GameTime {
    const MINUTES_PER_HOUR: u64 = 60;
    const HOURS_PER_DAY: u64 = 24;
    const DAYS_PER_MONTH: u64 = 30;
    const MONTHS_PER_YEAR: u64 = 12;

    pub fn from_total_minutes(total_minutes: u64) -> Self {
        Self { total_minutes }
    }

    pub fn total_minutes(self) -> u64 {
        self.total_minutes
    }

    pub fn advance_minutes(&mut self, minutes: u64) {
        self.total_minutes += minutes;
    }

    /// Decompose into the fixed game calendar.
    pub fn calendar(self) -> CalendarTime {
        let minute = self.total_minutes % Self::MINUTES_PER_HOUR;
        let hours = self.total_minutes / Self::MINUTES_PER_HOUR;
        let hour = hours % Self::HOURS_PER_DAY;
        let days = hours / Self::HOURS_PER_DAY;
        let day = days % Self::DAYS_PER_MONTH + 1;
        let months = days / Self::DAYS_PER_MONTH;
        let month = months % Self::MONTHS_PER_YEAR + 1;
        let year = months / Self::MONTHS_PER_YEAR + 1;
        CalendarTime {
            year,
            month,
            day,
            hour,
            minute,
        }
    }
}
