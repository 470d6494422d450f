use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use toyu_types::{DATE_FORMAT, TIME_FORMAT};

/// Source of the current date and time
pub trait Clock {
    /// Local wall-clock time, used for delivery dates and file names
    fn now_local(&self) -> NaiveDateTime;

    /// Absolute time, used for export and import stamps
    fn now_utc(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now_local().date()
    }

    /// Today's date in the ledger's fixed-width format
    fn date_string(&self) -> String {
        self.now_local().format(DATE_FORMAT).to_string()
    }

    fn time_string(&self) -> String {
        self.now_local().format(TIME_FORMAT).to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_local(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant; local time is taken to be UTC
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    at: NaiveDateTime,
}

impl FixedClock {
    pub fn new(at: NaiveDateTime) -> Self {
        Self { at }
    }

    /// Parse `YYYY-MM-DD HH:MM:SS`
    pub fn parse(text: &str) -> Option<Self> {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(Self::new)
    }
}

impl Clock for FixedClock {
    fn now_local(&self) -> NaiveDateTime {
        self.at
    }

    fn now_utc(&self) -> DateTime<Utc> {
        self.at.and_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_formats_zero_padded() {
        let clock = FixedClock::parse("2024-03-02 08:05:09").unwrap();
        assert_eq!(clock.date_string(), "2024/03/02");
        assert_eq!(clock.time_string(), "08:05");
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
    }
}
