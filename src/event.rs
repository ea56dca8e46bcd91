//! Structured controller events and a bounded in-memory log.
//!
//! The controller reports every state transition and every degraded
//! condition through an [`EventSink`]. Sinks are fire-and-forget: they return
//! nothing and must not block.

use crate::controller::LightState;
use crate::hold::HoldState;
use crate::time::ClockTime;
use heapless::Deque;

/// Default capacity of an [`EventLog`].
pub const DEFAULT_LOG_CAPACITY: usize = 50;

/// Why the lighting state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransitionCause {
    /// Motion was detected.
    Motion,
    /// The motion hold timer expired.
    HoldExpired,
    /// A schedule window opened.
    ScheduleStarted,
    /// All schedule windows closed.
    ScheduleEnded,
}

/// Something worth recording happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// The lighting state machine moved to a new state.
    StateChanged {
        from: LightState,
        to: LightState,
        cause: TransitionCause,
    },
    /// The button-driven hold light moved to a new state.
    HoldStateChanged { from: HoldState, to: HoldState },
    /// A fade started. `redirected` is set when it replaced a fade in flight.
    FadeStarted { duration_ms: u32, redirected: bool },
    /// A fade reached its target.
    FadeCompleted,
    /// A new sunset anchor was fetched.
    SunsetUpdated(ClockTime),
    /// The sunset fetch failed; the previous anchor stays in use.
    SunsetFetchFailed { kept: ClockTime },
    /// The motion sensor could not be read; treated as no motion.
    MotionSensorFault,
    /// The motion sensor is readable again.
    MotionSensorRecovered,
    /// A configuration update took effect.
    ConfigApplied,
    /// A configuration update arrived mid-fade and was queued.
    ConfigDeferred,
    /// A manual preview replaced the scheduled output.
    ManualOverride,
    /// Manual preview ended; the state machine drives the output again.
    ManualOverrideCleared,
    /// A debounced button press was accepted.
    ButtonPressed,
}

/// Fire-and-forget event consumer.
pub trait EventSink {
    /// Records an event. Must not block.
    fn record(&mut self, event: Event);
}

impl EventSink for () {
    #[inline]
    fn record(&mut self, _event: Event) {}
}

impl<E: EventSink + ?Sized> EventSink for &mut E {
    #[inline]
    fn record(&mut self, event: Event) {
        (**self).record(event);
    }
}

/// Ring buffer keeping the newest `N` events.
#[derive(Debug, Clone)]
pub struct EventLog<const N: usize = DEFAULT_LOG_CAPACITY> {
    entries: Deque<Event, N>,
}

impl<const N: usize> EventLog<N> {
    /// Creates an empty log.
    pub const fn new() -> Self {
        Self {
            entries: Deque::new(),
        }
    }

    /// Number of stored events.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent event.
    pub fn latest(&self) -> Option<&Event> {
        self.entries.back()
    }

    /// Events from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Event> {
        self.entries.iter()
    }

    /// Events from newest to oldest, the order a log page shows them in.
    pub fn newest_first(&self) -> impl Iterator<Item = &Event> {
        self.entries.iter().rev()
    }

    /// Drops all events.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<const N: usize> Default for EventLog<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> EventSink for EventLog<N> {
    fn record(&mut self, event: Event) {
        if self.entries.is_full() {
            self.entries.pop_front();
        }
        let _ = self.entries.push_back(event);
    }
}
