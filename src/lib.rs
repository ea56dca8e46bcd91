#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`LightMode`**: A steady-state output (brightness, RGB color, white level and channel enables)
//! - **`ScheduleConfig`**: Morning and evening windows, the HIGH and LOW modes, and fade/hold timings
//! - **`ScheduleEvaluator`**: Pure check of whether the schedule wants the light on at a wall-clock time
//! - **`SunsetTracker`**: Refreshes the evening anchor once per day from a `SunsetProvider`
//! - **`FadeEngine`**: Non-blocking linear fade player sampled on a 20 ms grid
//! - **`LightingController`**: The OFF / LOW / HIGH state machine driven by motion and schedule
//! - **`HoldLight`**: Button-driven variant that fades in, holds, and fades out
//! - **`DebouncedInput`** / **`MotionInput`**: Digital inputs on top of `embedded-hal`
//! - **`LightSink`**: Trait to implement for your LED strip
//! - **`TimeSource`**: Trait to implement for your monotonic clock
//! - **`EventSink`**: Receives transitions and faults; `EventLog` keeps the newest ones in a ring
//!
//! Colors are 8-bit `Srgb<u8>`. RGB blending goes through `palette` in linear
//! float space; brightness and white are ramped per channel.

#[macro_use]
mod fmt;

// Re-export Srgb from palette for user convenience
pub use palette::Srgb;

pub mod command;
pub mod config;
pub mod controller;
pub mod diagnostic;
pub mod event;
pub mod fade;
pub mod hold;
pub mod input;
pub mod mode;
pub mod schedule;
pub mod time;

pub use command::ControllerCommand;
pub use config::{FadeTimings, MinuteOffset, RawScheduleConfig, ScheduleConfig, ScheduleWindow, WindowStart};
pub use controller::{
    ConfigUpdate, ControllerState, LightState, LightingController, ReportedMode, ServiceTiming, Status,
};
pub use diagnostic::{Channel, WiringStep, WiringTest, WiringTimings};
pub use event::{DEFAULT_LOG_CAPACITY, Event, EventLog, EventSink, TransitionCause};
pub use fade::{FADE_TICK_MS, Fade, FadeEngine, FadeFrame, FadeFrames, FadeStatus, LightSink, transition};
pub use hold::{HOLD_LIGHT_TIMINGS, HoldLight, HoldState};
pub use input::{DEBOUNCE_MS, DebouncedInput, MotionInput};
pub use mode::{LightMode, OutputChannels, RawLightMode, level_to_percent, pack_rgb, percent_to_level, unpack_rgb};
pub use schedule::{
    ActiveWindow, NoSunsetProvider, ScheduleEvaluator, SunsetAnchor, SunsetProvider, SunsetTracker,
    SunsetUnavailable, evening_start,
};
pub use time::{ClockTime, TimeDuration, TimeError, TimeInstant, TimeSource, WallTime};
#[cfg(feature = "std")]
pub use time::StdTimeSource;
