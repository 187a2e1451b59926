use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Seconds per day
pub const SECONDS_PER_DAY: u32 = 60 * 60 * 24;

/// Seconds per GPS week
pub const SECONDS_PER_WEEK: u32 = 60 * 60 * 24 * 7;

const DAYS_OF_MONTH: [i32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// The GPS epoch (1980/01/06) expressed in UNIX seconds.
const GPS_UNIX_OFFSET_S: f64 = 315964800.0;

/// True when `year` is a leap year (Gregorian rule, century years included).
pub fn is_leap_year(year: i32) -> bool {
    (year % 400 == 0) || ((year % 4 == 0) && (year % 100 != 0))
}

/// Leap year property of `year`.
///
/// Returns `(extra_days, is_leap_year)` where `extra_days` counts the years
/// divisible by 4 that are *not* leap years (2100, 2200, 2300, 2500, ...)
/// since 1980, strictly before `year`; `is_leap_year` tells whether `year`
/// itself is one.
pub fn leap_year_prop(year: i32) -> (i32, bool) {
    let mut extra_days = 0;
    let mut leap_year = year % 4 == 0;

    let q_400 = year / 400 - 5;
    if q_400 >= 0 {
        // year >= 2000
        extra_days += q_400 * 3;
        let r_400 = year % 400;
        if r_400 != 0 {
            extra_days += r_400 / 100;
            if r_400 % 100 == 0 {
                // just 2100, 2200, 2300, or 2500, ...
                extra_days -= 1;
                leap_year = false;
            }
        }
    }

    (extra_days, leap_year)
}

/// Civil (UTC) calendar instant.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct CivilDateTime {
    /// Full year (e.g. 2026)
    pub year: i32,
    /// Month in [1, 12]
    pub month: u32,
    /// Day of month in [1, 31]
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    /// Day of week, 0 = Sunday. Filled by [GpsTime::to_civil].
    pub weekday: u32,
    /// Day of year, 1 = January 1st. Filled by [GpsTime::to_civil].
    pub yearday: u32,
}

impl CivilDateTime {
    pub fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            weekday: 0,
            yearday: 0,
        }
    }
}

/// GPS time as a (week, seconds into week) pair.
///
/// After [GpsTime::canonicalize], `0 <= seconds < 604800` holds; all
/// constructors return canonicalized values. Comparison is lexicographic
/// on (week, seconds).
#[derive(Debug, Default, Copy, Clone, PartialEq, PartialOrd)]
pub struct GpsTime {
    pub week: i32,
    pub seconds: f64,
}

impl GpsTime {
    pub fn new(week: i32, seconds: f64) -> Self {
        Self { week, seconds }.canonicalized()
    }

    /// Wraps `seconds` into [0, 604800), adjusting `week`.
    pub fn canonicalize(&mut self) {
        let quot = (self.seconds / SECONDS_PER_WEEK as f64).floor() as i32;
        self.week += quot;
        self.seconds -= SECONDS_PER_WEEK as f64 * quot as f64;
    }

    pub fn canonicalized(mut self) -> Self {
        self.canonicalize();
        self
    }

    /// Total seconds since the GPS epoch.
    pub fn total_seconds(&self) -> f64 {
        self.seconds + SECONDS_PER_WEEK as f64 * self.week as f64
    }

    /// Current GPS time estimated from the system clock.
    ///
    /// Leap seconds are not compensated: this is only meant to recover
    /// truncated week numbers from broadcast data.
    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let unix_s = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        Self {
            week: 0,
            seconds: unix_s - GPS_UNIX_OFFSET_S,
        }
        .canonicalized()
    }

    /// Builds GPS time from a civil (UTC) instant, compensating
    /// `leap_seconds` ahead of UTC.
    pub fn from_civil(civil: &CivilDateTime, leap_seconds: f64) -> Self {
        // base is 1980/01/06
        let mut days = -6;
        let (extra_days, leap_year) = leap_year_prop(civil.year);
        days -= extra_days;

        let years = civil.year - 1980;
        days += years * 365 + (years + 3) / 4;
        for month in 0..civil.month.saturating_sub(1) as usize {
            days += DAYS_OF_MONTH[month];
            if month == 1 && leap_year {
                days += 1;
            }
        }
        days += civil.day as i32;

        let week = days.div_euclid(7);
        let seconds = leap_seconds
            + days.rem_euclid(7) as f64 * SECONDS_PER_DAY as f64
            + civil.hour as f64 * 60.0 * 60.0
            + civil.minute as f64 * 60.0
            + civil.second as f64;

        Self { week, seconds }.canonicalized()
    }

    /// Converts back to a civil (UTC) instant, the inverse of
    /// [GpsTime::from_civil].
    pub fn to_civil(&self, leap_seconds: f64) -> CivilDateTime {
        let t = *self + leap_seconds;

        let total = t.seconds as i64;
        let second = total.rem_euclid(60);
        let total = total.div_euclid(60);
        let minute = total.rem_euclid(60);
        let total = total.div_euclid(60);
        let hour = total.rem_euclid(24);
        let day_in_week = total.div_euclid(24) as i32;

        let weekday = day_in_week;
        let mut mday = day_in_week + 6 + t.week * 7;

        // split by standard 4 year blocks, then walk the remainder
        let blocks = mday.div_euclid(366 + 365 * 3);
        mday = mday.rem_euclid(366 + 365 * 3);
        let mut year = blocks * 4 + 1980;
        let (extra_days, mut leap_year) = leap_year_prop(year);
        mday += extra_days;

        let remaining = [if leap_year { 366 } else { 365 }, 365, 365, 365];
        for days_of_year in remaining {
            if mday <= days_of_year {
                break;
            }
            mday -= days_of_year;
            year += 1;
        }

        leap_year = is_leap_year(year);
        let yearday = mday;

        let mut month = 0usize;
        while mday > DAYS_OF_MONTH[month] {
            if month == 1 && leap_year {
                if mday == 29 {
                    break;
                }
                mday -= 1;
            }
            mday -= DAYS_OF_MONTH[month];
            month += 1;
        }

        CivilDateTime {
            year,
            month: month as u32 + 1,
            day: mday as u32,
            hour: hour as u32,
            minute: minute as u32,
            second: second as u32,
            weekday: weekday as u32,
            yearday: yearday as u32,
        }
    }

    /// Fractional civil year, e.g. 2026.5 around July.
    pub fn year(&self, leap_seconds: f64) -> f64 {
        // days from 1980/01/01, whose 00:00:00 is just 0
        let mut days = (self.seconds + leap_seconds) / SECONDS_PER_DAY as f64
            + (self.week * 7) as f64
            + (6 - 1) as f64;

        let blocks = (days / (366 + 365 * 3) as f64).floor();
        days -= blocks * (366 + 365 * 3) as f64;
        let mut year = 1980 + blocks as i32 * 4;
        let (extra_days, leap_year) = leap_year_prop(year);
        days += extra_days as f64;

        let remaining = [
            if leap_year { 366.0 } else { 365.0 },
            365.0,
            365.0,
            365.0,
            if is_leap_year(year + 4) { 366.0 } else { 365.0 },
        ];
        let mut index = 0;
        while index < remaining.len() - 1 {
            if days <= remaining[index] {
                break;
            }
            days -= remaining[index];
            year += 1;
            index += 1;
        }

        days / remaining[index] + year as f64
    }
}

impl Add<f64> for GpsTime {
    type Output = GpsTime;
    fn add(self, seconds: f64) -> GpsTime {
        GpsTime {
            week: self.week,
            seconds: self.seconds + seconds,
        }
        .canonicalized()
    }
}

impl AddAssign<f64> for GpsTime {
    fn add_assign(&mut self, seconds: f64) {
        self.seconds += seconds;
        self.canonicalize();
    }
}

impl Sub<f64> for GpsTime {
    type Output = GpsTime;
    fn sub(self, seconds: f64) -> GpsTime {
        self + (-seconds)
    }
}

impl SubAssign<f64> for GpsTime {
    fn sub_assign(&mut self, seconds: f64) {
        *self += -seconds;
    }
}

/// Interval in seconds, positive when `self` is later than `rhs`.
impl Sub<GpsTime> for GpsTime {
    type Output = f64;
    fn sub(self, rhs: GpsTime) -> f64 {
        self.seconds - rhs.seconds + (self.week - rhs.week) as f64 * SECONDS_PER_WEEK as f64
    }
}

impl std::fmt::Display for GpsTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} week {:.3} sec.", self.week, self.seconds)
    }
}
