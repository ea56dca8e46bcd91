//! Schedule evaluation against a daily sunset anchor.
//!
//! Everything here except [`SunsetTracker`] is a pure function of its inputs.
//! Windows are evaluated inside a single day: a window whose end is earlier
//! than its start never activates, and the sunset offset wraps minutes without
//! carrying into the hour. Both quirks are intentional and covered by tests.

use crate::config::{MinuteOffset, ScheduleConfig, ScheduleWindow, WindowStart};
use crate::event::{Event, EventSink};
use crate::time::{ClockTime, WallTime};

/// Today's sunset, as consumed by the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SunsetAnchor(pub ClockTime);

impl SunsetAnchor {
    /// 18:00, used until the first successful fetch.
    pub const DEFAULT: SunsetAnchor = match ClockTime::new(18, 0) {
        Ok(time) => SunsetAnchor(time),
        Err(_) => SunsetAnchor(ClockTime::MIDNIGHT),
    };

    /// Converts a UTC sunset time to local time by adding whole hours.
    pub fn from_utc(utc: ClockTime, offset_hours: i8) -> Self {
        let hour = (i32::from(utc.hour()) + i32::from(offset_hours)).rem_euclid(24);
        SunsetAnchor(ClockTime::clamped(hour, i32::from(utc.minute())))
    }

    /// The anchored time of day.
    #[inline]
    pub const fn time(&self) -> ClockTime {
        self.0
    }
}

impl Default for SunsetAnchor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Which schedule window is currently live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActiveWindow {
    /// Outside every window.
    None,
    /// Inside the morning window.
    Morning,
    /// Inside the evening window.
    Evening,
}

/// Start of a sunset-relative window.
///
/// Hours and minutes are summed and wrapped independently:
/// `18:50 + 0h20m` gives `18:10`, not `19:10`. The remainder truncates, so a
/// negative sum stays below every real value: a negative minute opens the
/// window at the top of its hour, a negative hour opens it at midnight.
pub fn evening_start(offset: MinuteOffset, sunset: SunsetAnchor) -> ClockTime {
    let hour = (i32::from(sunset.0.hour()) + i32::from(offset.hours)) % 24;
    let minute = (i32::from(sunset.0.minute()) + i32::from(offset.minutes)) % 60;
    if hour < 0 {
        return ClockTime::MIDNIGHT;
    }
    ClockTime::clamped(hour, minute)
}

impl ScheduleWindow {
    /// Resolved start time for today.
    pub fn start_time(&self, sunset: SunsetAnchor) -> ClockTime {
        match self.start {
            WindowStart::Fixed(time) => time,
            WindowStart::SunsetRelative(offset) => evening_start(offset, sunset),
        }
    }

    /// Returns true if `start <= time < end`, compared as `(hour, minute)`.
    pub fn contains(&self, time: ClockTime, sunset: SunsetAnchor) -> bool {
        let start = self.start_time(sunset);
        time >= start && time < self.end
    }
}

/// Stateless schedule queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleEvaluator;

impl ScheduleEvaluator {
    /// Returns true if any window contains `now`.
    pub fn is_active(now: WallTime, config: &ScheduleConfig, sunset: SunsetAnchor) -> bool {
        Self::active_window(now, config, sunset) != ActiveWindow::None
    }

    /// Identifies the live window. Morning wins if both contain `now`.
    pub fn active_window(
        now: WallTime,
        config: &ScheduleConfig,
        sunset: SunsetAnchor,
    ) -> ActiveWindow {
        if config.morning.contains(now.time, sunset) {
            ActiveWindow::Morning
        } else if config.evening.contains(now.time, sunset) {
            ActiveWindow::Evening
        } else {
            ActiveWindow::None
        }
    }
}

/// Supplies today's sunset time.
///
/// Implementations wrap whatever transport fetches it. The core calls this at
/// most once per day and never retries.
pub trait SunsetProvider {
    /// Fetch failure type.
    type Error: core::fmt::Debug;

    /// Fetches today's local sunset time.
    fn fetch_sunset(&mut self) -> Result<ClockTime, Self::Error>;
}

/// Provider that never has data; the anchor keeps its default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSunsetProvider;

/// Error returned by [`NoSunsetProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SunsetUnavailable;

impl core::fmt::Display for SunsetUnavailable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "sunset time unavailable")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SunsetUnavailable {}

impl SunsetProvider for NoSunsetProvider {
    type Error = SunsetUnavailable;

    fn fetch_sunset(&mut self) -> Result<ClockTime, Self::Error> {
        Err(SunsetUnavailable)
    }
}

/// Day-rollover tracking for the sunset anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SunsetTracker {
    anchor: SunsetAnchor,
    last_check_day: Option<u16>,
}

impl SunsetTracker {
    /// Creates a tracker starting from `anchor`, with no day checked yet.
    pub const fn new(anchor: SunsetAnchor) -> Self {
        Self {
            anchor,
            last_check_day: None,
        }
    }

    /// Current anchor (possibly stale after a failed fetch).
    #[inline]
    pub fn anchor(&self) -> SunsetAnchor {
        self.anchor
    }

    /// Day of year of the last refresh attempt.
    #[inline]
    pub fn last_check_day(&self) -> Option<u16> {
        self.last_check_day
    }

    /// Refreshes the anchor if `day_of_year` differs from the last attempt.
    ///
    /// Returns true if a fetch was attempted. A failed fetch still counts as
    /// today's attempt; the previous anchor is kept and an event is emitted.
    pub fn refresh_if_new_day<P, E>(&mut self, day_of_year: u16, provider: &mut P, events: &mut E) -> bool
    where
        P: SunsetProvider,
        E: EventSink,
    {
        if self.last_check_day == Some(day_of_year) {
            return false;
        }
        self.last_check_day = Some(day_of_year);

        match provider.fetch_sunset() {
            Ok(time) => {
                info!("sunset for day {} is {}:{}", day_of_year, time.hour(), time.minute());
                self.anchor = SunsetAnchor(time);
                events.record(Event::SunsetUpdated(time));
            }
            Err(_e) => {
                warn!("sunset fetch failed, keeping {}:{}", self.anchor.0.hour(), self.anchor.0.minute());
                events.record(Event::SunsetFetchFailed { kept: self.anchor.0 });
            }
        }
        true
    }
}
