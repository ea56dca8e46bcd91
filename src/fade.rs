//! Linear fades between light modes.
//!
//! A fade is sampled on a fixed [`FADE_TICK_MS`] grid measured from its start.
//! [`transition`] yields that sample sequence directly; [`FadeEngine`] plays
//! it against a monotonic clock one sample at a time so the caller's loop
//! never blocks. Both produce identical frames for identical elapsed times,
//! and both end exactly on the target.

use crate::mode::LightMode;
use crate::time::{TimeDuration, TimeInstant};
use palette::Srgb;

/// Sample period of a fade in milliseconds.
pub const FADE_TICK_MS: u32 = 20;

/// Trait for abstracting the LED strip driver.
///
/// Implement this for your strip hardware. The controller calls it once per
/// fade sample and once per steady-state mode application.
pub trait LightSink {
    /// Drives every pixel with `color` scaled by `brightness` plus `white`.
    ///
    /// Handle any hardware errors internally - this method cannot fail.
    fn set_channels(&mut self, brightness: u8, color: Srgb<u8>, white: u8);
}

impl<S: LightSink + ?Sized> LightSink for &mut S {
    #[inline]
    fn set_channels(&mut self, brightness: u8, color: Srgb<u8>, white: u8) {
        (**self).set_channels(brightness, color, white);
    }
}

/// A time-bounded interpolation between two modes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    from: LightMode,
    to: LightMode,
    duration_ms: u32,
}

impl Fade {
    /// Creates a fade from `from` to `to` over `duration_ms`.
    pub const fn new(from: LightMode, to: LightMode, duration_ms: u32) -> Self {
        Self {
            from,
            to,
            duration_ms,
        }
    }

    /// Start mode.
    #[inline]
    pub fn from(&self) -> LightMode {
        self.from
    }

    /// Target mode.
    #[inline]
    pub fn to(&self) -> LightMode {
        self.to
    }

    /// Total duration.
    #[inline]
    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }

    /// `clamp(elapsed / duration, 0, 1)`; a zero-length fade is always complete.
    pub fn progress_at(&self, elapsed_ms: u64) -> f32 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        let progress = (elapsed_ms as f32) / (self.duration_ms as f32);
        progress.clamp(0.0, 1.0)
    }

    /// Returns true once `elapsed_ms` reaches the duration.
    #[inline]
    pub fn is_complete_at(&self, elapsed_ms: u64) -> bool {
        elapsed_ms >= u64::from(self.duration_ms)
    }

    /// Mode displayed `elapsed_ms` into the fade.
    pub fn sample_at(&self, elapsed_ms: u64) -> LightMode {
        if self.is_complete_at(elapsed_ms) {
            return self.to;
        }
        self.from.interpolate(&self.to, self.progress_at(elapsed_ms))
    }

    /// All samples of this fade, in order.
    pub fn frames(&self) -> FadeFrames {
        FadeFrames {
            fade: *self,
            next_elapsed_ms: if self.duration_ms == 0 {
                0
            } else {
                u64::from(FADE_TICK_MS)
            },
            done: false,
        }
    }
}

/// Samples the fade from `from` to `to` over `duration_ms`.
///
/// A zero duration yields exactly one frame, equal to `to`. Otherwise a frame
/// is produced every [`FADE_TICK_MS`] and the last one equals `to`.
pub fn transition(from: LightMode, to: LightMode, duration_ms: u32) -> FadeFrames {
    Fade::new(from, to, duration_ms).frames()
}

/// One sample of a fade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeFrame {
    /// Time since the fade started.
    pub elapsed_ms: u64,
    /// Linear progress in `[0, 1]`.
    pub progress: f32,
    /// Mode to display.
    pub mode: LightMode,
}

/// Iterator over the samples of a [`Fade`].
#[derive(Debug, Clone)]
pub struct FadeFrames {
    fade: Fade,
    next_elapsed_ms: u64,
    done: bool,
}

impl Iterator for FadeFrames {
    type Item = FadeFrame;

    fn next(&mut self) -> Option<FadeFrame> {
        if self.done {
            return None;
        }

        let elapsed_ms = self.next_elapsed_ms.min(u64::from(self.fade.duration_ms));
        if self.fade.is_complete_at(elapsed_ms) {
            self.done = true;
        }
        self.next_elapsed_ms += u64::from(FADE_TICK_MS);

        Some(FadeFrame {
            elapsed_ms,
            progress: self.fade.progress_at(elapsed_ms),
            mode: self.fade.sample_at(elapsed_ms),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.done {
            0
        } else {
            let duration = u64::from(self.fade.duration_ms);
            let tick = u64::from(FADE_TICK_MS);
            let pending = duration.saturating_sub(self.next_elapsed_ms);
            (pending.div_ceil(tick) + 1) as usize
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FadeFrames {}

/// Result of servicing a [`FadeEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FadeStatus<D> {
    /// No fade in flight.
    Idle,
    /// Fade in flight; the next sample is due after this delay.
    Pending(D),
    /// The fade just reached its target, which is now displayed.
    Completed,
}

#[derive(Debug, Clone, Copy)]
struct ActiveFade<I> {
    fade: Fade,
    started: I,
    next_sample_ms: u64,
}

/// Non-blocking fade player.
///
/// Owns the mode currently displayed on the strip. Every sample pushed to the
/// sink is recorded as the current mode, so `current_mode` never runs ahead of
/// the hardware. Starting a new fade while one is in flight restarts the
/// interpolation from the displayed frame.
#[derive(Debug, Clone, Copy)]
pub struct FadeEngine<I: TimeInstant> {
    current: LightMode,
    active: Option<ActiveFade<I>>,
}

impl<I: TimeInstant> FadeEngine<I> {
    /// Creates an idle engine that considers `current` to be displayed.
    pub const fn new(current: LightMode) -> Self {
        Self {
            current,
            active: None,
        }
    }

    /// Mode last pushed to the sink.
    #[inline]
    pub fn current_mode(&self) -> LightMode {
        self.current
    }

    /// Returns true while a fade is in flight.
    #[inline]
    pub fn is_fading(&self) -> bool {
        self.active.is_some()
    }

    /// Target of the fade in flight.
    pub fn target(&self) -> Option<LightMode> {
        self.active.as_ref().map(|active| active.fade.to)
    }

    /// Progress of the fade in flight at `now`.
    pub fn progress(&self, now: I) -> Option<f32> {
        self.active
            .as_ref()
            .map(|active| active.fade.progress_at(now.millis_since(active.started)))
    }

    /// Starts fading from the displayed mode to `to`.
    ///
    /// A zero duration pushes `to` immediately. Returns true if a fade in
    /// flight was redirected.
    pub fn begin<L: LightSink>(&mut self, to: LightMode, duration_ms: u32, now: I, sink: &mut L) -> bool {
        let redirected = self.active.take().is_some();
        if duration_ms == 0 {
            self.push(to, sink);
            return redirected;
        }

        trace!("fade over {} ms (redirected: {})", duration_ms, redirected);
        self.active = Some(ActiveFade {
            fade: Fade::new(self.current, to, duration_ms),
            started: now,
            next_sample_ms: u64::from(FADE_TICK_MS),
        });
        redirected
    }

    /// Pushes the sample due at `now`, if any.
    ///
    /// Samples land on the fade's own tick grid no matter how often this is
    /// called; calling it twice within one tick pushes at most one frame.
    pub fn service<L: LightSink>(&mut self, now: I, sink: &mut L) -> FadeStatus<I::Duration> {
        let Some(mut active) = self.active else {
            return FadeStatus::Idle;
        };

        let elapsed = now.millis_since(active.started);
        let duration = u64::from(active.fade.duration_ms);
        if elapsed >= duration {
            self.active = None;
            self.push(active.fade.to, sink);
            return FadeStatus::Completed;
        }

        let tick = u64::from(FADE_TICK_MS);
        if elapsed >= active.next_sample_ms {
            let grid = elapsed - elapsed % tick;
            let frame = active.fade.sample_at(grid);
            active.next_sample_ms = grid + tick;
            self.push(frame, sink);
        }
        self.active = Some(active);

        let due = active.next_sample_ms.min(duration);
        FadeStatus::Pending(I::Duration::from_millis(due - elapsed))
    }

    /// Ends the fade in flight by jumping to its target.
    ///
    /// Returns true if a fade was aborted.
    pub fn abort<L: LightSink>(&mut self, sink: &mut L) -> bool {
        match self.active.take() {
            Some(active) => {
                self.push(active.fade.to, sink);
                true
            }
            None => false,
        }
    }

    /// Cancels any fade and displays `mode` immediately.
    pub fn show<L: LightSink>(&mut self, mode: LightMode, sink: &mut L) {
        self.active = None;
        self.push(mode, sink);
    }

    fn push<L: LightSink>(&mut self, mode: LightMode, sink: &mut L) {
        let channels = mode.channels();
        sink.set_channels(channels.brightness, channels.color, channels.white);
        self.current = mode;
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

    const DIM: LightMode = LightMode {
        brightness: 10,
        color_enabled: true,
        color: Srgb::new(10, 20, 30),
        white_enabled: true,
        white: 0,
    };

    const BRIGHT: LightMode = LightMode {
        brightness: 255,
        color_enabled: true,
        color: Srgb::new(250, 120, 3),
        white_enabled: true,
        white: 77,
    };

    #[test]
    fn zero_duration_yields_only_target() {
        let frames: Vec<_> = transition(DIM, BRIGHT, 0).collect();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].mode, BRIGHT);
        assert_eq!(frames[0].progress, 1.0);
    }

    #[test]
    fn frames_follow_tick_grid_and_end_on_target() {
        let frames: Vec<_> = transition(DIM, BRIGHT, 1_000).collect();
        assert_eq!(frames.len(), 50);
        assert_eq!(frames[0].elapsed_ms, 20);
        assert_eq!(frames[24].elapsed_ms, 500);
        assert_eq!(frames.last().unwrap().mode, BRIGHT);
    }

    #[test]
    fn uneven_duration_clamps_final_frame() {
        let frames: Vec<_> = transition(DIM, BRIGHT, 45).collect();
        let elapsed: Vec<_> = frames.iter().map(|f| f.elapsed_ms).collect();
        assert_eq!(elapsed, [20, 40, 45]);
        assert_eq!(frames[2].mode, BRIGHT);
    }

    #[test]
    fn size_hint_is_exact() {
        let mut frames = transition(DIM, BRIGHT, 45);
        assert_eq!(frames.len(), 3);
        frames.next();
        assert_eq!(frames.len(), 2);
        assert_eq!(transition(DIM, BRIGHT, 0).len(), 1);
        assert_eq!(transition(DIM, BRIGHT, 40).len(), 2);
    }

    #[test]
    fn progress_is_monotonic_and_bounded() {
        let mut last = 0.0;
        for frame in transition(BRIGHT, DIM, 777) {
            assert!(frame.progress >= last);
            assert!((0.0..=1.0).contains(&frame.progress));
            last = frame.progress;
        }
        assert_eq!(last, 1.0);
    }

    #[test]
    fn engine_pushes_samples_on_grid_only() {
        let mut engine = FadeEngine::<TestInstant>::new(DIM);
        let mut sink = RecordingSink::default();

        engine.begin(BRIGHT, 100, TestInstant(0), &mut sink);
        assert!(sink.writes.is_empty());

        assert_eq!(
            engine.service(TestInstant(5), &mut sink),
            FadeStatus::Pending(TestDuration(15))
        );
        assert!(sink.writes.is_empty());

        engine.service(TestInstant(27), &mut sink);
        engine.service(TestInstant(33), &mut sink);
        assert_eq!(sink.writes.len(), 1);
        assert_eq!(engine.current_mode(), Fade::new(DIM, BRIGHT, 100).sample_at(20));

        assert_eq!(engine.service(TestInstant(100), &mut sink), FadeStatus::Completed);
        assert_eq!(engine.current_mode(), BRIGHT);
        assert_eq!(engine.service(TestInstant(120), &mut sink), FadeStatus::Idle);
    }

    #[test]
    fn engine_zero_duration_applies_immediately() {
        let mut engine = FadeEngine::<TestInstant>::new(DIM);
        let mut sink = RecordingSink::default();

        engine.begin(BRIGHT, 0, TestInstant(0), &mut sink);
        assert!(!engine.is_fading());
        assert_eq!(engine.current_mode(), BRIGHT);
        assert_eq!(sink.writes, [(255, Srgb::new(250, 120, 3), 77)]);
    }

    #[test]
    fn redirect_restarts_from_displayed_frame() {
        let mut engine = FadeEngine::<TestInstant>::new(LightMode::OFF.with_white(0));
        let mut sink = RecordingSink::default();
        let target = LightMode::OFF.with_brightness(200).with_white(200);

        engine.begin(target, 1_000, TestInstant(0), &mut sink);
        engine.service(TestInstant(500), &mut sink);
        let displayed = engine.current_mode();
        assert_eq!(displayed.brightness, 100);

        let redirected = engine.begin(LightMode::OFF, 1_000, TestInstant(500), &mut sink);
        assert!(redirected);
        engine.service(TestInstant(1_000), &mut sink);
        assert_eq!(engine.current_mode().brightness, 50);

        engine.service(TestInstant(1_500), &mut sink);
        assert_eq!(engine.current_mode(), LightMode::OFF);
    }

    #[test]
    fn engine_exposes_target_and_progress_while_fading() {
        let mut engine = FadeEngine::<TestInstant>::new(DIM);
        let mut sink = RecordingSink::default();
        assert_eq!(engine.target(), None);
        assert_eq!(engine.progress(TestInstant(0)), None);

        engine.begin(BRIGHT, 400, TestInstant(100), &mut sink);
        assert_eq!(engine.target(), Some(BRIGHT));
        assert_eq!(engine.progress(TestInstant(200)), Some(0.25));
        assert_eq!(engine.progress(TestInstant(900)), Some(1.0));

        engine.service(TestInstant(500), &mut sink);
        assert_eq!(engine.target(), None);
    }

    #[test]
    fn abort_commits_target() {
        let mut engine = FadeEngine::<TestInstant>::new(DIM);
        let mut sink = RecordingSink::default();

        engine.begin(BRIGHT, 1_000, TestInstant(0), &mut sink);
        engine.service(TestInstant(300), &mut sink);
        assert!(engine.abort(&mut sink));
        assert_eq!(engine.current_mode(), BRIGHT);
        assert!(!engine.abort(&mut sink));
    }

    #[test]
    fn sink_receives_masked_channels() {
        let mut engine = FadeEngine::<TestInstant>::new(LightMode::OFF);
        let mut sink = RecordingSink::default();

        engine.show(BRIGHT.without_color().without_white(), &mut sink);
        assert_eq!(sink.writes, [(255, Srgb::new(0, 0, 0), 0)]);
    }
}
