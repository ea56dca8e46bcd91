//! Button-triggered light with a single target and no schedule.
//!
//! The reduced product variant: a press fades the fixture in, it holds for a
//! fixed time, then fades out. Pressing again while lit restarts the hold;
//! pressing while fading out turns the fade around from the displayed frame.

use crate::config::FadeTimings;
use crate::controller::ServiceTiming;
use crate::event::{Event, EventSink};
use crate::fade::{FadeEngine, FadeStatus, LightSink};
use crate::mode::LightMode;
use crate::time::{TimeDuration, TimeInstant, TimeSource};

/// Phase of a [`HoldLight`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HoldState {
    /// Dark, waiting for a press.
    Off,
    /// Fading toward the on mode.
    FadingIn,
    /// Holding the on mode.
    On,
    /// Fading toward dark.
    FadingOut,
}

/// Timings of the button variant: 2 s in, 5 s hold, 10 s out.
pub const HOLD_LIGHT_TIMINGS: FadeTimings = FadeTimings {
    fade_in_ms: 2_000,
    fade_out_ms: 10_000,
    hold_ms: 5_000,
};

/// Press-to-light controller.
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source reference
/// * `I` - Monotonic time instant type
/// * `L` - LED strip implementation type
/// * `T` - Time source implementation type
/// * `E` - Event sink type
pub struct HoldLight<'t, I: TimeInstant, L: LightSink, T: TimeSource<I>, E: EventSink> {
    sink: L,
    time_source: &'t T,
    events: E,
    on_mode: LightMode,
    timings: FadeTimings,
    state: HoldState,
    state_start: Option<I>,
    engine: FadeEngine<I>,
}

impl<'t, I: TimeInstant, L: LightSink, T: TimeSource<I>, E: EventSink> HoldLight<'t, I, L, T, E> {
    /// Creates a dark hold light.
    pub fn new(mut sink: L, time_source: &'t T, on_mode: LightMode, timings: FadeTimings, events: E) -> Self {
        let mut engine = FadeEngine::new(LightMode::OFF);
        engine.show(LightMode::OFF, &mut sink);

        Self {
            sink,
            time_source,
            events,
            on_mode,
            timings,
            state: HoldState::Off,
            state_start: None,
            engine,
        }
    }

    /// Runs one loop iteration. `pressed` is a debounced press event.
    pub fn tick(&mut self, pressed: bool) -> ServiceTiming<I::Duration> {
        let now = self.time_source.now();

        if pressed {
            self.events.record(Event::ButtonPressed);
            self.on_press(now);
        }

        let mut status = self.engine.service(now, &mut self.sink);
        if matches!(status, FadeStatus::Completed) {
            self.events.record(Event::FadeCompleted);
            match self.state {
                HoldState::FadingIn => self.enter(HoldState::On, now),
                HoldState::FadingOut => self.enter(HoldState::Off, now),
                HoldState::Off | HoldState::On => {}
            }
        }

        if self.state == HoldState::On {
            let held = self.held_for(now);
            let hold = u64::from(self.timings.hold_ms);
            if held < hold {
                return ServiceTiming::Delay(I::Duration::from_millis(hold - held));
            }
            self.fade_out(now);
            status = self.engine.service(now, &mut self.sink);
        }

        match status {
            FadeStatus::Pending(delay) => ServiceTiming::Delay(delay),
            FadeStatus::Idle | FadeStatus::Completed => ServiceTiming::Steady,
        }
    }

    /// Current phase.
    pub fn state(&self) -> HoldState {
        self.state
    }

    /// Mode last pushed to the strip.
    pub fn current_mode(&self) -> LightMode {
        self.engine.current_mode()
    }

    /// Event sink.
    pub fn events(&self) -> &E {
        &self.events
    }

    fn on_press(&mut self, now: I) {
        match self.state {
            HoldState::Off | HoldState::FadingOut => {
                self.enter(HoldState::FadingIn, now);
                let redirected = self
                    .engine
                    .begin(self.on_mode, self.timings.fade_in_ms, now, &mut self.sink);
                if self.timings.fade_in_ms > 0 {
                    self.events.record(Event::FadeStarted {
                        duration_ms: self.timings.fade_in_ms,
                        redirected,
                    });
                } else {
                    self.enter(HoldState::On, now);
                }
            }
            HoldState::On => {
                trace!("hold restarted");
                self.state_start = Some(now);
            }
            HoldState::FadingIn => {}
        }
    }

    fn fade_out(&mut self, now: I) {
        let duration_ms = self.timings.fade_out_ms;
        self.enter(HoldState::FadingOut, now);
        self.engine.begin(LightMode::OFF, duration_ms, now, &mut self.sink);
        if duration_ms > 0 {
            self.events.record(Event::FadeStarted {
                duration_ms,
                redirected: false,
            });
        } else {
            self.enter(HoldState::Off, now);
        }
    }

    fn enter(&mut self, next: HoldState, now: I) {
        if next == self.state {
            return;
        }
        debug!("hold light {} -> {}", self.state, next);
        self.events.record(Event::HoldStateChanged {
            from: self.state,
            to: next,
        });
        self.state = next;
        self.state_start = Some(now);
    }

    fn held_for(&self, now: I) -> u64 {
        self.state_start
            .map(|start| now.millis_since(start))
            .unwrap_or(0)
    }
}
