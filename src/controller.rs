//! Schedule- and motion-driven lighting state machine.
//!
//! Provides [`LightingController`], which owns the single [`ControllerState`]
//! of a fixture and drives its [`LightSink`] through OFF, LOW and HIGH.
//! Motion elevates to HIGH; the schedule holds LOW; leaving HIGH after the
//! hold time lands on LOW or OFF depending on the schedule at that moment.

use crate::command::ControllerCommand;
use crate::config::ScheduleConfig;
use crate::event::{Event, EventSink, TransitionCause};
use crate::fade::{FadeEngine, FadeStatus, LightSink};
use crate::mode::{LightMode, percent_to_level, unpack_rgb};
use crate::schedule::{ActiveWindow, ScheduleEvaluator, SunsetAnchor, SunsetProvider, SunsetTracker};
use crate::time::{TimeInstant, TimeSource, WallTime};

/// Lighting state of the fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LightState {
    /// All channels dark.
    Off,
    /// Schedule baseline.
    Low,
    /// Motion-elevated.
    High,
}

/// Timing information returned by [`LightingController::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServiceTiming<D> {
    /// A fade is in flight. Tick again after this delay to hit the next sample.
    Delay(D),

    /// Output is steady. Tick again at your sensor polling rate.
    Steady,
}

/// Outcome of a configuration update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigUpdate {
    /// The configuration is live.
    Applied,
    /// A fade was in flight; the configuration applies when it completes.
    Deferred,
}

/// Mode classification as shown to users.
///
/// Derived from the displayed output rather than the state machine, so a
/// preview or a fade in flight is reported by what it looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportedMode {
    /// Brightness is zero.
    Off,
    /// Anything lit that isn't the HIGH configuration.
    Low,
    /// Brightness, color and white match the HIGH configuration.
    High,
}

impl ReportedMode {
    /// Classifies `mode` against the configured HIGH mode.
    pub fn classify(mode: &LightMode, high: &LightMode) -> Self {
        if mode.brightness == 0 {
            ReportedMode::Off
        } else if mode.brightness == high.brightness
            && mode.color == high.color
            && mode.white == high.white
        {
            ReportedMode::High
        } else {
            ReportedMode::Low
        }
    }
}

/// Snapshot of the controller for status reporting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Status {
    /// State machine state.
    pub state: LightState,
    /// Displayed mode.
    pub mode: LightMode,
    /// Displayed mode as a user-facing label.
    pub reported: ReportedMode,
    /// Whether a fade is in flight.
    pub fading: bool,
    /// Whether a manual preview is overriding the schedule.
    pub manual_override: bool,
    /// Schedule state as of the last tick.
    pub schedule_active: bool,
    /// Live schedule window as of the last tick.
    pub active_window: ActiveWindow,
    /// Sunset anchor in use.
    pub sunset: SunsetAnchor,
}

/// Live mutable state of one fixture.
///
/// Owned by [`LightingController`] and passed by reference into the fade
/// engine and sunset tracker; nothing else mutates it.
#[derive(Debug, Clone, Copy)]
pub struct ControllerState<I: TimeInstant> {
    engine: FadeEngine<I>,
    state: LightState,
    last_motion: Option<I>,
    sunset: SunsetTracker,
    schedule_active: bool,
    active_window: ActiveWindow,
    manual_override: bool,
}

impl<I: TimeInstant> ControllerState<I> {
    /// Fresh state: OFF, dark, no motion seen, sunset at its default.
    pub const fn new() -> Self {
        Self {
            engine: FadeEngine::new(LightMode::OFF),
            state: LightState::Off,
            last_motion: None,
            sunset: SunsetTracker::new(SunsetAnchor::DEFAULT),
            schedule_active: false,
            active_window: ActiveWindow::None,
            manual_override: false,
        }
    }

    /// Mode last pushed to the sink, including intermediate fade frames.
    #[inline]
    pub fn current_mode(&self) -> LightMode {
        self.engine.current_mode()
    }

    /// State machine state.
    #[inline]
    pub fn state(&self) -> LightState {
        self.state
    }

    /// Time of the most recent motion reading.
    #[inline]
    pub fn last_motion(&self) -> Option<I> {
        self.last_motion
    }

    /// Day of year of the last sunset refresh attempt.
    #[inline]
    pub fn last_schedule_check_day(&self) -> Option<u16> {
        self.sunset.last_check_day()
    }

    /// Sunset anchor in use.
    #[inline]
    pub fn sunset(&self) -> SunsetAnchor {
        self.sunset.anchor()
    }

    /// Schedule state as of the last tick.
    #[inline]
    pub fn schedule_active(&self) -> bool {
        self.schedule_active
    }

    /// Returns true while a fade is in flight.
    #[inline]
    pub fn is_fading(&self) -> bool {
        self.engine.is_fading()
    }

    /// Returns true while a manual preview overrides the schedule.
    #[inline]
    pub fn manual_override(&self) -> bool {
        self.manual_override
    }
}

impl<I: TimeInstant> Default for ControllerState<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives one fixture from motion, schedule and sunset inputs.
///
/// Call [`tick`](Self::tick) from the control loop. Fades never block: while
/// one is in flight `tick` returns [`ServiceTiming::Delay`] with the time to
/// the next sample, and the loop is free to service other I/O in between.
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source reference
/// * `I` - Monotonic time instant type
/// * `L` - LED strip implementation type
/// * `T` - Time source implementation type
/// * `E` - Event sink type
pub struct LightingController<'t, I: TimeInstant, L: LightSink, T: TimeSource<I>, E: EventSink> {
    sink: L,
    time_source: &'t T,
    events: E,
    config: ScheduleConfig,
    pending_config: Option<ScheduleConfig>,
    state: ControllerState<I>,
}

impl<'t, I: TimeInstant, L: LightSink, T: TimeSource<I>, E: EventSink> LightingController<'t, I, L, T, E> {
    /// Creates a controller in OFF and drives the strip dark.
    pub fn new(mut sink: L, time_source: &'t T, config: ScheduleConfig, events: E) -> Self {
        let state = ControllerState::new();
        let off = state.current_mode().channels();
        sink.set_channels(off.brightness, off.color, off.white);

        Self {
            sink,
            time_source,
            events,
            config,
            pending_config: None,
            state,
        }
    }

    /// Runs one control-loop iteration.
    ///
    /// Refreshes the sunset anchor on a new day, evaluates the schedule,
    /// applies at most one state transition and pushes any fade sample due.
    /// Motion takes precedence over a schedule-off in the same tick.
    pub fn tick<P: SunsetProvider>(
        &mut self,
        motion: bool,
        wall: WallTime,
        sunset: &mut P,
    ) -> ServiceTiming<I::Duration> {
        let now = self.time_source.now();

        self.state
            .sunset
            .refresh_if_new_day(wall.day_of_year, sunset, &mut self.events);
        let window = ScheduleEvaluator::active_window(wall, &self.config, self.state.sunset.anchor());
        let schedule_active = window != ActiveWindow::None;
        self.state.schedule_active = schedule_active;
        self.state.active_window = window;

        if let Some((target, cause)) = self.next_transition(motion, schedule_active, now) {
            self.transition_to(target, cause, now);
        }

        self.service_fade(now)
    }

    /// Pushes any fade sample due without evaluating inputs.
    ///
    /// Useful when the loop wakes for a fade sample between sensor polls.
    pub fn service(&mut self) -> ServiceTiming<I::Duration> {
        let now = self.time_source.now();
        self.service_fade(now)
    }

    /// Handles a queued command.
    pub fn handle_command(&mut self, command: ControllerCommand) -> ServiceTiming<I::Duration> {
        match command {
            ControllerCommand::UpdateConfig(config) => {
                self.update_config(config);
            }
            ControllerCommand::Preview(mode) => self.preview(mode),
            ControllerCommand::SetColor(rgb) => {
                let mode = self.state.current_mode().with_color(unpack_rgb(rgb));
                self.preview(mode);
            }
            ControllerCommand::FullWhite => {
                let mode = self.state.current_mode().with_white(u8::MAX);
                self.preview(mode);
            }
            ControllerCommand::SetBrightnessPercent(percent) => {
                let mode = self
                    .state
                    .current_mode()
                    .with_brightness(percent_to_level(percent));
                self.preview(mode);
            }
            ControllerCommand::Resume => self.resume(),
        }
        self.service()
    }

    /// Replaces the configuration.
    ///
    /// Never changes configuration under a fade in flight: the update is
    /// queued and applied when the fade completes. Once applied, the strip
    /// fades to the new mode for the current state.
    pub fn update_config(&mut self, config: ScheduleConfig) -> ConfigUpdate {
        if self.state.engine.is_fading() {
            debug!("config update deferred until fade completes");
            self.pending_config = Some(config);
            self.events.record(Event::ConfigDeferred);
            return ConfigUpdate::Deferred;
        }
        self.apply_config(config);
        ConfigUpdate::Applied
    }

    /// Displays `mode` immediately, cancelling any fade.
    ///
    /// The preview holds until [`resume`](Self::resume) or until the state
    /// machine next changes state, which fades from the previewed output.
    pub fn preview(&mut self, mode: LightMode) {
        self.state.engine.show(mode, &mut self.sink);
        if !self.state.manual_override {
            self.state.manual_override = true;
            self.events.record(Event::ManualOverride);
        }
        self.apply_pending_config();
    }

    /// Ends a preview and fades back to the current state's mode.
    pub fn resume(&mut self) {
        if !self.state.manual_override {
            return;
        }
        self.state.manual_override = false;
        self.events.record(Event::ManualOverrideCleared);

        let now = self.time_source.now();
        let target = self.mode_for(self.state.state);
        let duration = self.config.timings.fade_in_ms;
        self.begin_fade(target, duration, now);
    }

    /// Active configuration.
    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// Returns true if a configuration update is waiting for a fade to finish.
    pub fn has_pending_config(&self) -> bool {
        self.pending_config.is_some()
    }

    /// Live controller state.
    pub fn state(&self) -> &ControllerState<I> {
        &self.state
    }

    /// State machine state.
    pub fn light_state(&self) -> LightState {
        self.state.state
    }

    /// Mode last pushed to the strip.
    pub fn current_mode(&self) -> LightMode {
        self.state.current_mode()
    }

    /// Status snapshot.
    pub fn status(&self) -> Status {
        let mode = self.state.current_mode();
        Status {
            state: self.state.state,
            mode,
            reported: ReportedMode::classify(&mode, &self.config.high),
            fading: self.state.is_fading(),
            manual_override: self.state.manual_override,
            schedule_active: self.state.schedule_active,
            active_window: self.state.active_window,
            sunset: self.state.sunset.anchor(),
        }
    }

    /// Event sink.
    pub fn events(&self) -> &E {
        &self.events
    }

    /// Mutable event sink.
    pub fn events_mut(&mut self) -> &mut E {
        &mut self.events
    }

    /// Strip driver.
    pub fn sink(&self) -> &L {
        &self.sink
    }

    /// Consumes the controller and returns the strip driver and event sink.
    pub fn into_parts(self) -> (L, E) {
        (self.sink, self.events)
    }

    fn next_transition(
        &mut self,
        motion: bool,
        schedule_active: bool,
        now: I,
    ) -> Option<(LightState, TransitionCause)> {
        let state = self.state.state;

        if motion {
            self.state.last_motion = Some(now);
            return (state != LightState::High).then_some((LightState::High, TransitionCause::Motion));
        }

        match state {
            LightState::High => {
                let hold = u64::from(self.config.timings.hold_ms);
                let expired = match self.state.last_motion {
                    Some(last) => now.millis_since(last) > hold,
                    None => true,
                };
                if !expired {
                    return None;
                }
                let target = if schedule_active {
                    LightState::Low
                } else {
                    LightState::Off
                };
                Some((target, TransitionCause::HoldExpired))
            }
            LightState::Off if schedule_active => Some((LightState::Low, TransitionCause::ScheduleStarted)),
            LightState::Low if !schedule_active => Some((LightState::Off, TransitionCause::ScheduleEnded)),
            _ => None,
        }
    }

    fn transition_to(&mut self, target: LightState, cause: TransitionCause, now: I) {
        let from = self.state.state;
        let timings = self.config.timings;
        let duration = match (from, target) {
            (_, LightState::High) => timings.fade_in_ms,
            (LightState::Off, LightState::Low) => timings.fade_in_ms,
            _ => timings.fade_out_ms,
        };

        info!("{} -> {} ({})", from, target, cause);
        self.state.state = target;
        self.state.manual_override = false;
        self.events.record(Event::StateChanged {
            from,
            to: target,
            cause,
        });

        let mode = self.mode_for(target);
        self.begin_fade(mode, duration, now);
    }

    fn begin_fade(&mut self, target: LightMode, duration_ms: u32, now: I) {
        let redirected = self
            .state
            .engine
            .begin(target, duration_ms, now, &mut self.sink);
        if duration_ms > 0 {
            self.events.record(Event::FadeStarted {
                duration_ms,
                redirected,
            });
        } else {
            self.apply_pending_config();
        }
    }

    fn service_fade(&mut self, now: I) -> ServiceTiming<I::Duration> {
        match self.state.engine.service(now, &mut self.sink) {
            FadeStatus::Idle => ServiceTiming::Steady,
            FadeStatus::Pending(delay) => ServiceTiming::Delay(delay),
            FadeStatus::Completed => {
                debug!("fade complete");
                self.events.record(Event::FadeCompleted);
                self.apply_pending_config();
                if self.state.engine.is_fading() {
                    // Applying a queued config may have started a new fade.
                    self.service_fade(now)
                } else {
                    ServiceTiming::Steady
                }
            }
        }
    }

    fn apply_pending_config(&mut self) {
        if self.state.engine.is_fading() {
            return;
        }
        if let Some(config) = self.pending_config.take() {
            self.apply_config(config);
        }
    }

    fn apply_config(&mut self, config: ScheduleConfig) {
        self.config = config;
        self.events.record(Event::ConfigApplied);
        info!("configuration applied");

        if self.state.manual_override {
            return;
        }
        let target = self.mode_for(self.state.state);
        if target != self.state.current_mode() {
            let now = self.time_source.now();
            let duration = self.config.timings.fade_in_ms;
            self.begin_fade(target, duration, now);
        }
    }

    fn mode_for(&self, state: LightState) -> LightMode {
        match state {
            LightState::Off => LightMode::OFF,
            LightState::Low => self.config.low,
            LightState::High => self.config.high,
        }
    }
}
