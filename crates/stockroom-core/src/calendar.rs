//! # Business Calendar
//!
//! Maps instants to business dates under one fixed UTC offset.
//!
//! ## Why a Fixed Offset?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Order finished 2026-03-01 21:30 UTC                                    │
//! │                                                                         │
//! │    in UTC        → 2026-03-01                                           │
//! │    in UTC+05:00  → 2026-03-02   ← the shop's day                        │
//! │                                                                         │
//! │  If completion dates and report keys used different zones, an order    │
//! │  could count towards one day and be filtered by another. Both sides    │
//! │  go through the same BusinessCalendar, configured once.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The host machine's local time zone is never consulted.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};

use crate::error::ValidationError;
use crate::validation::ValidationResult;
use crate::DEFAULT_UTC_OFFSET_SECS;

/// Business-day arithmetic for one configured UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessCalendar {
    offset: FixedOffset,
}

impl BusinessCalendar {
    pub const fn new(offset: FixedOffset) -> Self {
        BusinessCalendar { offset }
    }

    /// Calendar in plain UTC.
    pub fn utc() -> Self {
        BusinessCalendar::new(Utc.fix())
    }

    /// Builds a calendar from an offset in seconds east of UTC.
    pub fn from_offset_secs(secs: i32) -> ValidationResult<Self> {
        FixedOffset::east_opt(secs)
            .map(BusinessCalendar::new)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "utc_offset".to_string(),
                min: -86_399,
                max: 86_399,
            })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Business date an instant falls on.
    pub fn date_of(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    /// Half-open UTC range `[start, end)` covering `date`.
    ///
    /// `end` is the next local midnight. Fails for dates at the edge of the
    /// representable range, where either instant does not exist.
    ///
    /// ```rust
    /// use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
    /// use stockroom_core::BusinessCalendar;
    ///
    /// let cal = BusinessCalendar::new(FixedOffset::east_opt(5 * 3600).unwrap());
    /// let (start, end) = cal.bounds(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()).unwrap();
    /// assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 1, 19, 0, 0).unwrap());
    /// assert_eq!(end, Utc.with_ymd_and_hms(2026, 3, 2, 19, 0, 0).unwrap());
    ///
    /// assert!(cal.bounds(NaiveDate::MAX).is_err());
    /// ```
    pub fn bounds(&self, date: NaiveDate) -> ValidationResult<(DateTime<Utc>, DateTime<Utc>)> {
        let out_of_range = || ValidationError::InvalidFormat {
            field: "date".to_string(),
            reason: format!("{} is outside the supported calendar", date),
        };

        let offset = Duration::seconds(i64::from(self.offset.local_minus_utc()));
        let midnight_utc = |day: NaiveDate| {
            day.and_time(NaiveTime::MIN)
                .checked_sub_signed(offset)
                .map(|at| at.and_utc())
        };

        let start = midnight_utc(date).ok_or_else(out_of_range)?;
        let end = date
            .succ_opt()
            .and_then(midnight_utc)
            .ok_or_else(out_of_range)?;
        Ok((start, end))
    }

    /// Every date from `from` to `to`, inclusive.
    pub fn days(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
        from.iter_days().take_while(move |d| *d <= to)
    }
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECS)
            .map(BusinessCalendar::new)
            .unwrap_or_else(BusinessCalendar::utc)
    }
}
