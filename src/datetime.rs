//! Broken-down calendar time as stored by the chip, and its conversions to
//! Unix timestamps and `chrono` types.

use core::convert::TryFrom;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::RtcError;

/// First year the two year digits of the chip can hold
pub const BASE_YEAR: i32 = 2000;

/// Date and time information as held by the timekeeping registers.
///
/// `hour` is always in 24-hour format, `weekday` runs from 1 (Sunday) to 7
/// and `year` is the offset from 2000.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    pub second: u8,
    pub minute: u8,
    pub hour: u8,
    pub weekday: u8,
    pub day: u8,
    pub month: u8,
    pub year: u8,
}

impl DateTime {
    /// Break a Unix timestamp down into calendar fields.
    ///
    /// Timestamps before 2000-01-01 00:00:00 cannot be stored by the chip and
    /// are rejected with [`RtcError::Parameter`].
    pub fn from_timestamp(timestamp: i32) -> Result<Self, RtcError> {
        let utc = chrono::DateTime::from_timestamp(i64::from(timestamp), 0)
            .ok_or(RtcError::Parameter)?;
        DateTime::try_from(&utc.naive_utc())
    }

    /// Seconds elapsed since 1970-01-01 00:00:00 UTC.
    pub fn timestamp(&self) -> Result<i32, RtcError> {
        let seconds = self.to_naive()?.and_utc().timestamp();
        i32::try_from(seconds).map_err(|_| RtcError::Parameter)
    }

    /// Convert to a `chrono` date and time, failing on impossible dates.
    pub fn to_naive(&self) -> Result<NaiveDateTime, RtcError> {
        NaiveDate::from_ymd_opt(
            BASE_YEAR + i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )
        .and_then(|date| {
            date.and_hms_opt(
                u32::from(self.hour),
                u32::from(self.minute),
                u32::from(self.second),
            )
        })
        .ok_or(RtcError::Parameter)
    }
}

impl TryFrom<&NaiveDateTime> for DateTime {
    type Error = RtcError;

    fn try_from(datetime: &NaiveDateTime) -> Result<Self, Self::Error> {
        let year = datetime.year() - BASE_YEAR;
        if !(0..=99).contains(&year) {
            return Err(RtcError::Parameter);
        }
        Ok(DateTime {
            second: datetime.second() as u8,
            minute: datetime.minute() as u8,
            hour: datetime.hour() as u8,
            weekday: datetime.weekday().number_from_sunday() as u8,
            day: datetime.day() as u8,
            month: datetime.month() as u8,
            year: year as u8,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_of_year_2000() {
        let dt = DateTime::from_timestamp(946_684_800).unwrap();
        assert_eq!(
            dt,
            DateTime {
                second: 0,
                minute: 0,
                hour: 0,
                weekday: 7,
                day: 1,
                month: 1,
                year: 0,
            }
        );
        assert_eq!(dt.timestamp(), Ok(946_684_800));
    }

    #[test]
    fn before_2000_is_rejected() {
        assert_eq!(
            DateTime::from_timestamp(946_684_799),
            Err(RtcError::Parameter)
        );
        assert_eq!(DateTime::from_timestamp(0), Err(RtcError::Parameter));
    }

    #[test]
    fn end_of_signed_32_bit_range() {
        let dt = DateTime::from_timestamp(i32::MAX).unwrap();
        assert_eq!((dt.year, dt.month, dt.day), (38, 1, 19));
        assert_eq!((dt.hour, dt.minute, dt.second), (3, 14, 7));

        let past = DateTime { second: 8, ..dt };
        assert_eq!(past.timestamp(), Err(RtcError::Parameter));
    }

    #[test]
    fn impossible_dates() {
        let feb30 = DateTime {
            day: 30,
            month: 2,
            year: 24,
            ..DateTime::default()
        };
        assert_eq!(feb30.to_naive(), Err(RtcError::Parameter));

        let month13 = DateTime {
            day: 1,
            month: 13,
            ..DateTime::default()
        };
        assert_eq!(month13.timestamp(), Err(RtcError::Parameter));
    }

    #[test]
    fn leap_day() {
        let dt = DateTime {
            second: 59,
            minute: 59,
            hour: 23,
            weekday: 5,
            day: 29,
            month: 2,
            year: 24,
        };
        let t = dt.timestamp().unwrap();
        assert_eq!(t, 1_709_251_199);
        assert_eq!(DateTime::from_timestamp(t), Ok(dt));
    }

    #[test]
    fn timestamp_round_trip_every_day() {
        let mut date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2037, 12, 31).unwrap();
        while date <= last {
            let naive = date.and_hms_opt(13, 45, 30).unwrap();
            let dt = DateTime::try_from(&naive).unwrap();
            let t = dt.timestamp().unwrap();
            assert_eq!(i64::from(t), naive.and_utc().timestamp());
            assert_eq!(DateTime::from_timestamp(t), Ok(dt));
            date = date.succ_opt().unwrap();
        }
    }

    #[test]
    fn year_outside_chip_range() {
        let naive = NaiveDate::from_ymd_opt(2100, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(DateTime::try_from(&naive), Err(RtcError::Parameter));
    }
}
