//! Schedule and fixture configuration.
//!
//! `ScheduleConfig` is the validated in-memory form the controller works
//! with. `RawScheduleConfig` mirrors the persisted shape; converting it clamps
//! every out-of-range field so the fade and schedule math never see invalid
//! input.

use crate::mode::{LightMode, RawLightMode};
use crate::time::ClockTime;

/// Signed hour/minute offset applied to the sunset anchor.
///
/// The two components are independent: each is added to its own field of
/// the sunset time and they may carry different signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MinuteOffset {
    /// Hours added to the sunset hour, `-23..=23`.
    pub hours: i8,
    /// Minutes added to the sunset minute, `-59..=59`.
    pub minutes: i8,
}

impl MinuteOffset {
    /// No offset.
    pub const ZERO: MinuteOffset = MinuteOffset { hours: 0, minutes: 0 };

    /// Creates an offset from its stored components, clamping each into range.
    pub fn new(hours: i32, minutes: i32) -> Self {
        Self {
            hours: hours.clamp(-23, 23) as i8,
            minutes: minutes.clamp(-59, 59) as i8,
        }
    }

    /// Splits a signed total with truncating division (`-90` becomes `-1h -30m`).
    pub fn from_total_minutes(total: i32) -> Self {
        let total = total.clamp(-23 * 60 - 59, 23 * 60 + 59);
        Self {
            hours: (total / 60) as i8,
            minutes: (total % 60) as i8,
        }
    }

    /// Total signed minutes.
    pub fn total_minutes(&self) -> i32 {
        i32::from(self.hours) * 60 + i32::from(self.minutes)
    }
}

/// Where a schedule window starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WindowStart {
    /// Fixed time of day.
    Fixed(ClockTime),
    /// Today's sunset shifted by an offset.
    SunsetRelative(MinuteOffset),
}

/// A time-of-day interval during which the fixture should be lit.
///
/// Evaluated within a single day; see [`crate::schedule`] for containment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScheduleWindow {
    /// Inclusive start.
    pub start: WindowStart,
    /// Exclusive end.
    pub end: ClockTime,
}

impl ScheduleWindow {
    /// Window between two fixed times.
    pub const fn fixed(start: ClockTime, end: ClockTime) -> Self {
        Self {
            start: WindowStart::Fixed(start),
            end,
        }
    }

    /// Window starting at sunset plus `offset`.
    pub const fn after_sunset(offset: MinuteOffset, end: ClockTime) -> Self {
        Self {
            start: WindowStart::SunsetRelative(offset),
            end,
        }
    }
}

/// Fade and hold durations in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FadeTimings {
    /// Duration of fades toward a brighter state.
    pub fade_in_ms: u32,
    /// Duration of fades toward a dimmer state.
    pub fade_out_ms: u32,
    /// How long the motion-elevated state outlives the last motion reading.
    pub hold_ms: u32,
}

impl Default for FadeTimings {
    fn default() -> Self {
        Self {
            fade_in_ms: 2_000,
            fade_out_ms: 30_000,
            hold_ms: 300_000,
        }
    }
}

/// Complete controller configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScheduleConfig {
    /// Fixed morning window.
    pub morning: ScheduleWindow,
    /// Sunset-anchored evening window.
    pub evening: ScheduleWindow,
    /// Motion-elevated mode.
    pub high: LightMode,
    /// Schedule baseline mode.
    pub low: LightMode,
    /// Fade and hold durations.
    pub timings: FadeTimings,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            morning: ScheduleWindow::fixed(hm(6, 0), hm(9, 0)),
            evening: ScheduleWindow::after_sunset(MinuteOffset::ZERO, hm(23, 30)),
            high: LightMode::default(),
            low: LightMode::default(),
            timings: FadeTimings::default(),
        }
    }
}

const fn hm(hour: u8, minute: u8) -> ClockTime {
    match ClockTime::new(hour, minute) {
        Ok(t) => t,
        Err(_) => ClockTime::MIDNIGHT,
    }
}

/// Configuration in its persisted shape.
///
/// Mirrors the flat key layout of the stored settings. Convert with
/// `ScheduleConfig::from(raw)`; every field is clamped on the way in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RawScheduleConfig {
    /// Morning window start hour.
    pub morning_on_hour: i32,
    /// Morning window start minute.
    pub morning_on_minute: i32,
    /// Morning window end hour.
    pub morning_off_hour: i32,
    /// Morning window end minute.
    pub morning_off_minute: i32,
    /// Hours added to the sunset hour, clamped to `-23..=23`.
    pub sunset_offset_hour: i32,
    /// Minutes added to the sunset minute, clamped to `-59..=59`.
    pub sunset_offset_minute: i32,
    /// Evening window end hour.
    pub evening_off_hour: i32,
    /// Evening window end minute.
    pub evening_off_minute: i32,
    /// Motion-elevated mode.
    pub high_mode: RawLightMode,
    /// Schedule baseline mode.
    pub low_mode: RawLightMode,
    /// Fade-in duration in milliseconds.
    pub fade_duration_on: i64,
    /// Fade-out duration in milliseconds.
    pub fade_duration_off: i64,
    /// Hold time after the last motion in milliseconds.
    pub hold_time: i64,
}

impl From<RawScheduleConfig> for ScheduleConfig {
    fn from(raw: RawScheduleConfig) -> Self {
        Self {
            morning: ScheduleWindow::fixed(
                ClockTime::clamped(raw.morning_on_hour, raw.morning_on_minute),
                ClockTime::clamped(raw.morning_off_hour, raw.morning_off_minute),
            ),
            evening: ScheduleWindow::after_sunset(
                MinuteOffset::new(raw.sunset_offset_hour, raw.sunset_offset_minute),
                ClockTime::clamped(raw.evening_off_hour, raw.evening_off_minute),
            ),
            high: raw.high_mode.into(),
            low: raw.low_mode.into(),
            timings: FadeTimings {
                fade_in_ms: clamp_millis(raw.fade_duration_on),
                fade_out_ms: clamp_millis(raw.fade_duration_off),
                hold_ms: clamp_millis(raw.hold_time),
            },
        }
    }
}

impl From<ScheduleConfig> for RawScheduleConfig {
    fn from(config: ScheduleConfig) -> Self {
        // The persisted layout has a fixed morning start and a sunset-relative evening start.
        let morning_on = match config.morning.start {
            WindowStart::Fixed(time) => time,
            WindowStart::SunsetRelative(_) => ClockTime::MIDNIGHT,
        };
        let evening_offset = match config.evening.start {
            WindowStart::SunsetRelative(offset) => offset,
            WindowStart::Fixed(_) => MinuteOffset::ZERO,
        };
        Self {
            morning_on_hour: i32::from(morning_on.hour()),
            morning_on_minute: i32::from(morning_on.minute()),
            morning_off_hour: i32::from(config.morning.end.hour()),
            morning_off_minute: i32::from(config.morning.end.minute()),
            sunset_offset_hour: i32::from(evening_offset.hours),
            sunset_offset_minute: i32::from(evening_offset.minutes),
            evening_off_hour: i32::from(config.evening.end.hour()),
            evening_off_minute: i32::from(config.evening.end.minute()),
            high_mode: config.high.into(),
            low_mode: config.low.into(),
            fade_duration_on: i64::from(config.timings.fade_in_ms),
            fade_duration_off: i64::from(config.timings.fade_out_ms),
            hold_time: i64::from(config.timings.hold_ms),
        }
    }
}

impl Default for RawScheduleConfig {
    fn default() -> Self {
        ScheduleConfig::default().into()
    }
}

fn clamp_millis(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}
