//! Display-time formatting.
//!
//! Presentation shows instants in a fixed local offset (the clinic's
//! timezone). Nothing here feeds back into the evaluator, which compares
//! UTC instants only.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeDelta, Timelike, Utc};

use crate::config::DisplayConfig;

/// Formats instants in the configured display offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayClock {
    offset: FixedOffset,
}

impl Default for DisplayClock {
    fn default() -> Self {
        Self::from_config(&DisplayConfig::default())
    }
}

impl DisplayClock {
    /// Display clock for `config.utc_offset_minutes`. An offset that does
    /// not fit within a day falls back to UTC.
    pub fn from_config(config: &DisplayConfig) -> Self {
        let offset = config
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        Self { offset }
    }

    /// The configured offset.
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// `at` in local time.
    pub fn local(&self, at: DateTime<Utc>) -> DateTime<FixedOffset> {
        at.with_timezone(&self.offset)
    }

    /// `HH:MM` in local time.
    pub fn format_time(&self, at: DateTime<Utc>) -> String {
        self.local(at).format("%H:%M").to_string()
    }

    /// `DD/MM/YYYY HH:MM:SS` in local time.
    pub fn format_date_time(&self, at: DateTime<Utc>) -> String {
        self.local(at).format("%d/%m/%Y %H:%M:%S").to_string()
    }

    /// Minutes elapsed since local midnight.
    pub fn minutes_since_midnight(&self, at: DateTime<Utc>) -> u32 {
        let local = self.local(at);
        local
            .hour()
            .saturating_mul(60)
            .saturating_add(local.minute())
    }

    /// Local calendar date of `at`.
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        self.local(at).date_naive()
    }

    /// The UTC instant of `hour:00` local time on `date`. `hour` may be 24
    /// (midnight ending the day).
    pub fn local_hour(&self, date: NaiveDate, hour: u32) -> Option<DateTime<Utc>> {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        let local = midnight.checked_add_signed(TimeDelta::try_hours(i64::from(hour))?)?;
        let utc = local.checked_sub_signed(TimeDelta::try_seconds(i64::from(
            self.offset.local_minus_utc(),
        ))?)?;
        Some(utc.and_utc())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn casablanca() -> DisplayClock {
        DisplayClock::from_config(&DisplayConfig::default())
    }

    #[test]
    fn formats_in_local_offset() {
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 22, 5, 9).unwrap();
        let clock = casablanca();
        assert_eq!(clock.format_time(at), "23:05");
        assert_eq!(clock.format_date_time(at), "02/03/2026 23:05:09");
        assert_eq!(clock.minutes_since_midnight(at), 23 * 60 + 5);
    }

    #[test]
    fn local_date_rolls_over_before_utc() {
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 23, 30, 0).unwrap();
        assert_eq!(
            casablanca().local_date(at),
            NaiveDate::from_ymd_opt(2026, 3, 3).unwrap()
        );
    }

    #[test]
    fn local_hour_maps_back_to_utc() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let clock = casablanca();
        assert_eq!(
            clock.local_hour(date, 8),
            Some(Utc.with_ymd_and_hms(2026, 3, 2, 7, 0, 0).unwrap())
        );
        assert_eq!(
            clock.local_hour(date, 24),
            Some(Utc.with_ymd_and_hms(2026, 3, 2, 23, 0, 0).unwrap())
        );
    }

    #[test]
    fn out_of_range_offset_falls_back_to_utc() {
        let config = DisplayConfig {
            utc_offset_minutes: 100_000,
            ..DisplayConfig::default()
        };
        let clock = DisplayClock::from_config(&config);
        assert_eq!(clock.offset().local_minus_utc(), 0);
    }
}
