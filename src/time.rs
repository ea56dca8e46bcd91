//! Time abstractions.
//!
//! Two independent clocks feed the controller: a monotonic clock for all
//! elapsed-time math (fades, hold timer, debounce) and a wall clock for the
//! schedule. The wall clock may jump on time sync; the monotonic one must not.

/// Trait for abstracting monotonic time sources.
pub trait TimeSource<I: TimeInstant> {
    /// Returns the current time instant.
    fn now(&self) -> I;
}

/// Trait abstraction for duration types.
pub trait TimeDuration: Copy + PartialEq {
    /// Zero duration constant.
    const ZERO: Self;

    /// Converts duration to milliseconds.
    fn as_millis(&self) -> u64;

    /// Creates duration from milliseconds.
    fn from_millis(millis: u64) -> Self;

    /// Saturating subtraction (returns ZERO on underflow).
    fn saturating_sub(self, other: Self) -> Self;
}

/// Trait abstraction for instant types.
pub trait TimeInstant: Copy {
    /// Duration type for this instant.
    type Duration: TimeDuration;

    /// Calculates duration since an earlier instant.
    fn duration_since(&self, earlier: Self) -> Self::Duration;

    /// Adds duration to instant, returns None on overflow.
    fn checked_add(self, duration: Self::Duration) -> Option<Self>;

    /// Subtracts duration from instant, returns None on underflow.
    fn checked_sub(self, duration: Self::Duration) -> Option<Self>;

    /// Milliseconds elapsed since an earlier instant.
    #[inline]
    fn millis_since(&self, earlier: Self) -> u64 {
        self.duration_since(earlier).as_millis()
    }
}

#[cfg(feature = "std")]
impl TimeDuration for std::time::Duration {
    const ZERO: Self = std::time::Duration::ZERO;

    fn as_millis(&self) -> u64 {
        u64::try_from(std::time::Duration::as_millis(self)).unwrap_or(u64::MAX)
    }

    fn from_millis(millis: u64) -> Self {
        std::time::Duration::from_millis(millis)
    }

    fn saturating_sub(self, other: Self) -> Self {
        std::time::Duration::saturating_sub(self, other)
    }
}

#[cfg(feature = "std")]
impl TimeInstant for std::time::Instant {
    type Duration = std::time::Duration;

    fn duration_since(&self, earlier: Self) -> Self::Duration {
        self.saturating_duration_since(earlier)
    }

    fn checked_add(self, duration: Self::Duration) -> Option<Self> {
        std::time::Instant::checked_add(&self, duration)
    }

    fn checked_sub(self, duration: Self::Duration) -> Option<Self> {
        std::time::Instant::checked_sub(&self, duration)
    }
}

/// [`TimeSource`] backed by [`std::time::Instant`].
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Copy)]
pub struct StdTimeSource;

#[cfg(feature = "std")]
impl TimeSource<std::time::Instant> for StdTimeSource {
    fn now(&self) -> std::time::Instant {
        std::time::Instant::now()
    }
}

/// Errors from validating time-of-day values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeError {
    /// Hour outside `0..=23`.
    HourOutOfRange(u8),
    /// Minute outside `0..=59`.
    MinuteOutOfRange(u8),
}

impl core::fmt::Display for TimeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TimeError::HourOutOfRange(hour) => {
                write!(f, "hour {} is out of range 0-23", hour)
            }
            TimeError::MinuteOutOfRange(minute) => {
                write!(f, "minute {} is out of range 0-59", minute)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TimeError {}

/// A time of day with minute resolution.
///
/// Ordering is lexicographic on `(hour, minute)`, which is what window
/// containment relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    /// Midnight.
    pub const MIDNIGHT: ClockTime = ClockTime { hour: 0, minute: 0 };

    /// Creates a validated time of day.
    pub const fn new(hour: u8, minute: u8) -> Result<Self, TimeError> {
        if hour > 23 {
            return Err(TimeError::HourOutOfRange(hour));
        }
        if minute > 59 {
            return Err(TimeError::MinuteOutOfRange(minute));
        }
        Ok(Self { hour, minute })
    }

    /// Creates a time of day, clamping each field into range.
    pub fn clamped(hour: i32, minute: i32) -> Self {
        Self {
            hour: hour.clamp(0, 23) as u8,
            minute: minute.clamp(0, 59) as u8,
        }
    }

    /// Hour of day, `0..=23`.
    #[inline]
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    /// Minute of hour, `0..=59`.
    #[inline]
    pub const fn minute(&self) -> u8 {
        self.minute
    }

    /// Minutes since midnight.
    #[inline]
    pub const fn minutes_since_midnight(&self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }
}

impl core::fmt::Display for ClockTime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Local wall-clock reading used for schedule evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WallTime {
    /// Time of day.
    pub time: ClockTime,
    /// Day of year, used to detect the day rollover for sunset refresh.
    pub day_of_year: u16,
}

impl WallTime {
    /// Creates a wall-clock reading.
    #[inline]
    pub const fn new(time: ClockTime, day_of_year: u16) -> Self {
        Self { time, day_of_year }
    }
}
