//! Time keeping module
//!
//! The wall clock is a reference date-time plus the monotonic uptime elapsed
//! since the reference was taken.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Timelike};

use crate::Error;

/// Length of a Current Time Service characteristic value
pub const CTS_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeReference {
    /// Clock time (UTC)
    time: NaiveDateTime,
    /// Uptime in µs when the clock time was valid
    uptime_us: u64,
}

impl TimeReference {
    /// Create new time reference from a UTC date-time
    pub fn from_datetime(time: NaiveDateTime, uptime_us: u64) -> Self {
        Self { time, uptime_us }
    }

    /// Create new time reference from seconds since the Unix epoch
    pub fn from_timestamp(secs: i64, uptime_us: u64) -> Result<Self, Error> {
        let time = DateTime::from_timestamp(secs, 0)
            .ok_or(Error::InvalidTime)?
            .naive_utc();
        Ok(Self::from_datetime(time, uptime_us))
    }

    /// Create new time reference from Current Time Service data
    ///
    /// Layout: year (u16 LE), month, day, hours, minutes, seconds, day of
    /// week, fractions of a second in 1/256 steps.
    pub fn from_cts_bytes(bytes: &[u8], uptime_us: u64) -> Result<Self, Error> {
        if bytes.len() < CTS_LEN {
            return Err(Error::InvalidTime);
        }
        let year = u16::from_le_bytes([bytes[0], bytes[1]]) as i32;
        let month = bytes[2] as u32;
        let day = bytes[3] as u32;
        let hour = bytes[4] as u32;
        let min = bytes[5] as u32;
        let sec = bytes[6] as u32;
        // bytes[7] is the day of week, derived from the date instead
        let milli = bytes[8] as u32 * 1000 / 256;

        let time = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_milli_opt(hour, min, sec, milli))
            .ok_or(Error::InvalidTime)?;

        Ok(Self::from_datetime(time, uptime_us))
    }

    pub fn time(&self) -> NaiveDateTime {
        self.time
    }
}

pub struct TimeManager {
    reference: TimeReference,
    /// Offset of local time from UTC in seconds
    utc_offset_secs: i32,
}

impl TimeManager {
    /// Initialize time measurement on boot
    pub fn init(reference: TimeReference, utc_offset_secs: i32) -> Self {
        Self {
            reference,
            utc_offset_secs,
        }
    }

    /// Current UTC time at `uptime_us`
    pub fn utc_time(&self, uptime_us: u64) -> NaiveDateTime {
        let elapsed = uptime_us.saturating_sub(self.reference.uptime_us);
        let elapsed = TimeDelta::microseconds(i64::try_from(elapsed).unwrap_or(i64::MAX));
        self.reference
            .time
            .checked_add_signed(elapsed)
            .unwrap_or(self.reference.time)
    }

    /// Current local time at `uptime_us`
    pub fn local_time(&self, uptime_us: u64) -> NaiveDateTime {
        let utc = self.utc_time(uptime_us);
        utc.checked_add_signed(TimeDelta::seconds(self.utc_offset_secs as i64))
            .unwrap_or(utc)
    }

    /// Update time reference
    pub fn set_time(&mut self, reference: TimeReference) {
        debug!("Clock set to {}", reference.time.and_utc().timestamp());
        self.reference = reference;
    }

    pub fn set_utc_offset(&mut self, utc_offset_secs: i32) {
        self.utc_offset_secs = utc_offset_secs;
    }

    pub fn utc_offset(&self) -> i32 {
        self.utc_offset_secs
    }
}

/// Seconds until the next minute boundary after `now`, in 1–60.
pub fn secs_until_next_minute(now: &NaiveDateTime) -> u64 {
    60 - now.second().min(59) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const SECOND: u64 = 1_000_000;

    fn reference() -> TimeReference {
        // 2025-01-06 13:05:00 UTC
        TimeReference::from_timestamp(1_736_168_700, 5 * SECOND).unwrap()
    }

    #[test]
    fn timestamp_reference() {
        let time = reference().time();
        assert_eq!((time.year(), time.month(), time.day()), (2025, 1, 6));
        assert_eq!((time.hour(), time.minute(), time.second()), (13, 5, 0));
    }

    #[test]
    fn clock_advances_with_uptime() {
        let manager = TimeManager::init(reference(), 0);
        assert_eq!(manager.utc_time(5 * SECOND), reference().time());
        let later = manager.utc_time(5 * SECOND + 90 * SECOND);
        assert_eq!((later.hour(), later.minute(), later.second()), (13, 6, 30));
    }

    #[test]
    fn uptime_before_reference_is_clamped() {
        let manager = TimeManager::init(reference(), 0);
        assert_eq!(manager.utc_time(0), reference().time());
    }

    #[test]
    fn local_time_applies_offset() {
        let mut manager = TimeManager::init(reference(), 3_600);
        assert_eq!(manager.local_time(5 * SECOND).hour(), 14);
        manager.set_utc_offset(-14 * 3_600);
        let local = manager.local_time(5 * SECOND);
        assert_eq!((local.day(), local.hour()), (5, 23));
    }

    #[test]
    fn set_time_replaces_reference() {
        let mut manager = TimeManager::init(reference(), 0);
        let new = TimeReference::from_timestamp(0, 10 * SECOND).unwrap();
        manager.set_time(new);
        assert_eq!(manager.utc_time(12 * SECOND).and_utc().timestamp(), 2);
    }

    #[test]
    fn cts_bytes() {
        // 2024-03-03 18:30:15, Sunday, 128/256 s
        let bytes = [0xE8, 0x07, 3, 3, 18, 30, 15, 7, 128, 0];
        let time = TimeReference::from_cts_bytes(&bytes, 0).unwrap().time();
        assert_eq!((time.year(), time.month(), time.day()), (2024, 3, 3));
        assert_eq!((time.hour(), time.minute(), time.second()), (18, 30, 15));
        assert_eq!(time.nanosecond(), 500_000_000);
    }

    #[test]
    fn invalid_cts_bytes() {
        let bad_month = [0xE8, 0x07, 13, 3, 18, 30, 15, 7, 0, 0];
        assert_eq!(
            TimeReference::from_cts_bytes(&bad_month, 0),
            Err(Error::InvalidTime)
        );
        assert_eq!(
            TimeReference::from_cts_bytes(&[0xE8, 0x07, 3], 0),
            Err(Error::InvalidTime)
        );
    }

    #[test]
    fn cts_value_needs_all_ten_bytes() {
        let bytes = [0xE8, 0x07, 3, 3, 18, 30, 15, 7, 128, 0];
        assert_eq!(
            TimeReference::from_cts_bytes(&bytes[..CTS_LEN - 1], 0),
            Err(Error::InvalidTime)
        );
        assert!(TimeReference::from_cts_bytes(&bytes, 0).is_ok());
    }

    #[test]
    fn next_minute() {
        let at = |s| reference().time().with_second(s).unwrap();
        assert_eq!(secs_until_next_minute(&at(0)), 60);
        assert_eq!(secs_until_next_minute(&at(59)), 1);
        assert_eq!(secs_until_next_minute(&at(15)), 45);
    }
}
