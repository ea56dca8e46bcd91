//! Channel wiring check.
//!
//! Lights red, green, blue and white one at a time, each followed by a dark
//! gap, then pauses and starts over. Used at install time to confirm the
//! strip's channel order before any schedule is configured.

use crate::controller::ServiceTiming;
use crate::fade::LightSink;
use crate::mode::LightMode;
use crate::time::{TimeDuration, TimeInstant};
use palette::Srgb;

/// A single output channel of an RGBW strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Red LED of the RGB triple.
    Red,
    /// Green LED of the RGB triple.
    Green,
    /// Blue LED of the RGB triple.
    Blue,
    /// Dedicated white LED.
    White,
}

impl Channel {
    /// Test order.
    pub const ALL: [Channel; 4] = [Channel::Red, Channel::Green, Channel::Blue, Channel::White];

    /// Mode lighting only this channel at `brightness`.
    pub const fn solo(self, brightness: u8) -> LightMode {
        let base = LightMode::OFF.with_brightness(brightness);
        match self {
            Channel::Red => base.with_color(Srgb::new(255, 0, 0)),
            Channel::Green => base.with_color(Srgb::new(0, 255, 0)),
            Channel::Blue => base.with_color(Srgb::new(0, 0, 255)),
            Channel::White => base.with_white(255),
        }
    }
}

/// Step of the wiring cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WiringStep {
    /// One channel lit.
    On(Channel),
    /// Dark gap after a channel.
    Gap,
    /// Dark pause before the cycle repeats.
    Pause,
}

/// Durations of the wiring cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WiringTimings {
    /// Time each channel stays lit.
    pub on_ms: u32,
    /// Dark gap after each channel.
    pub gap_ms: u32,
    /// Dark pause at the end of the cycle.
    pub pause_ms: u32,
}

impl Default for WiringTimings {
    fn default() -> Self {
        Self {
            on_ms: 1_000,
            gap_ms: 500,
            pause_ms: 2_000,
        }
    }
}

const STEP_COUNT: usize = Channel::ALL.len() * 2 + 1;

/// Looping wiring check driven from the control loop.
///
/// Nothing blocks: [`service`](Self::service) pushes the step due at `now`
/// the first time it becomes due and returns the delay to the next one.
#[derive(Debug, Clone, Copy)]
pub struct WiringTest<I: TimeInstant> {
    timings: WiringTimings,
    brightness: u8,
    started: Option<I>,
    shown: Option<usize>,
}

impl<I: TimeInstant> WiringTest<I> {
    /// Creates a test that lights each channel at `brightness`.
    pub fn new(timings: WiringTimings, brightness: u8) -> Self {
        Self {
            timings,
            brightness,
            started: None,
            shown: None,
        }
    }

    /// Restarts the cycle on the next service call.
    pub fn reset(&mut self) {
        self.started = None;
        self.shown = None;
    }

    /// Step displayed by the last service call.
    pub fn current_step(&self) -> Option<WiringStep> {
        self.shown.map(Self::step)
    }

    /// Pushes the step due at `now`, starting the cycle on the first call.
    pub fn service<L: LightSink>(&mut self, now: I, sink: &mut L) -> ServiceTiming<I::Duration> {
        let started = *self.started.get_or_insert(now);
        let cycle_ms = self.cycle_ms();
        if cycle_ms == 0 {
            return ServiceTiming::Steady;
        }

        let time_in_cycle = now.millis_since(started) % cycle_ms;
        let (index, remaining) = self.locate(time_in_cycle);

        if self.shown != Some(index) {
            let step = Self::step(index);
            trace!("wiring step {}", step);
            let channels = self.mode_for(step).channels();
            sink.set_channels(channels.brightness, channels.color, channels.white);
            self.shown = Some(index);
        }

        ServiceTiming::Delay(I::Duration::from_millis(remaining))
    }

    /// Step index and time left in it for a position within one cycle.
    fn locate(&self, time_in_cycle: u64) -> (usize, u64) {
        let mut accumulated = 0u64;
        for index in 0..STEP_COUNT {
            let step_end = accumulated + self.duration_of(index);
            if time_in_cycle < step_end {
                return (index, step_end - time_in_cycle);
            }
            accumulated = step_end;
        }
        (STEP_COUNT - 1, 0)
    }

    fn step(index: usize) -> WiringStep {
        match Channel::ALL.get(index / 2) {
            Some(&channel) if index % 2 == 0 => WiringStep::On(channel),
            Some(_) => WiringStep::Gap,
            None => WiringStep::Pause,
        }
    }

    fn duration_of(&self, index: usize) -> u64 {
        let ms = match Self::step(index) {
            WiringStep::On(_) => self.timings.on_ms,
            WiringStep::Gap => self.timings.gap_ms,
            WiringStep::Pause => self.timings.pause_ms,
        };
        u64::from(ms)
    }

    fn cycle_ms(&self) -> u64 {
        (0..STEP_COUNT).map(|index| self.duration_of(index)).sum()
    }

    fn mode_for(&self, step: WiringStep) -> LightMode {
        match step {
            WiringStep::On(channel) => channel.solo(self.brightness),
            WiringStep::Gap | WiringStep::Pause => LightMode::OFF,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    extern crate std;
    use std::vec::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct TestDuration(u64);

    impl TimeDuration for TestDuration {
        const ZERO: Self = TestDuration(0);

        fn as_millis(&self) -> u64 {
            self.0
        }

        fn from_millis(millis: u64) -> Self {
            TestDuration(millis)
        }

        fn saturating_sub(self, other: Self) -> Self {
            TestDuration(self.0.saturating_sub(other.0))
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct TestInstant(u64);

    impl TimeInstant for TestInstant {
        type Duration = TestDuration;

        fn duration_since(&self, earlier: Self) -> Self::Duration {
            TestDuration(self.0 - earlier.0)
        }

        fn checked_add(self, duration: Self::Duration) -> Option<Self> {
            Some(TestInstant(self.0 + duration.0))
        }

        fn checked_sub(self, duration: Self::Duration) -> Option<Self> {
            self.0.checked_sub(duration.0).map(TestInstant)
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        writes: Vec<(u8, Srgb<u8>, u8)>,
    }

    impl LightSink for RecordingSink {
        fn set_channels(&mut self, brightness: u8, color: Srgb<u8>, white: u8) {
            self.writes.push((brightness, color, white));
        }
    }

    #[test]
    fn walks_channels_in_order() {
        let mut test = WiringTest::<TestInstant>::new(WiringTimings::default(), 255);
        let mut sink = RecordingSink::default();

        let mut steps = Vec::new();
        let mut now = 0;
        while now < 8_000 {
            if let ServiceTiming::Delay(d) = test.service(TestInstant(now), &mut sink) {
                steps.push(test.current_step().unwrap());
                now += d.0;
            }
        }

        assert_eq!(
            steps,
            [
                WiringStep::On(Channel::Red),
                WiringStep::Gap,
                WiringStep::On(Channel::Green),
                WiringStep::Gap,
                WiringStep::On(Channel::Blue),
                WiringStep::Gap,
                WiringStep::On(Channel::White),
                WiringStep::Gap,
                WiringStep::Pause,
            ]
        );
        assert_eq!(sink.writes[0], (255, Srgb::new(255, 0, 0), 0));
        assert_eq!(sink.writes[6], (255, Srgb::new(0, 0, 0), 255));
    }

    #[test]
    fn repeats_after_pause() {
        let mut test = WiringTest::<TestInstant>::new(WiringTimings::default(), 128);
        let mut sink = RecordingSink::default();

        test.service(TestInstant(0), &mut sink);
        test.service(TestInstant(7_999), &mut sink);
        assert_eq!(test.current_step(), Some(WiringStep::Pause));

        test.service(TestInstant(8_000), &mut sink);
        assert_eq!(test.current_step(), Some(WiringStep::On(Channel::Red)));
    }

    #[test]
    fn repeated_service_within_step_writes_once() {
        let mut test = WiringTest::<TestInstant>::new(WiringTimings::default(), 255);
        let mut sink = RecordingSink::default();

        assert_eq!(
            test.service(TestInstant(0), &mut sink),
            ServiceTiming::Delay(TestDuration(1_000))
        );
        assert_eq!(
            test.service(TestInstant(400), &mut sink),
            ServiceTiming::Delay(TestDuration(600))
        );
        assert_eq!(sink.writes.len(), 1);
    }

    #[test]
    fn reset_restarts_cycle_from_red() {
        let mut test = WiringTest::<TestInstant>::new(WiringTimings::default(), 255);
        let mut sink = RecordingSink::default();

        test.service(TestInstant(0), &mut sink);
        test.service(TestInstant(2_000), &mut sink);
        assert_eq!(test.current_step(), Some(WiringStep::On(Channel::Green)));

        test.reset();
        assert_eq!(test.current_step(), None);
        assert_eq!(
            test.service(TestInstant(3_000), &mut sink),
            ServiceTiming::Delay(TestDuration(1_000))
        );
        assert_eq!(test.current_step(), Some(WiringStep::On(Channel::Red)));
        assert_eq!(sink.writes.last(), Some(&(255, Srgb::new(255, 0, 0), 0)));
    }

    #[test]
    fn zero_length_cycle_is_steady() {
        let timings = WiringTimings {
            on_ms: 0,
            gap_ms: 0,
            pause_ms: 0,
        };
        let mut test = WiringTest::<TestInstant>::new(timings, 255);
        let mut sink = RecordingSink::default();
        assert_eq!(test.service(TestInstant(0), &mut sink), ServiceTiming::Steady);
        assert!(sink.writes.is_empty());
    }
}
