//! Digital inputs: a debounced push button and a polled motion sensor.

use crate::event::{Event, EventSink};
use crate::time::TimeInstant;
use embedded_hal::digital::InputPin;

/// Minimum time a raw level must stay unchanged to be accepted.
pub const DEBOUNCE_MS: u64 = 50;

/// Filters a bouncing digital level into one-shot press events.
///
/// Call [`update`](Self::update) every tick with the raw level. A press is
/// latched when the level has been high for at least [`DEBOUNCE_MS`] after
/// being stably low, and [`was_pressed`](Self::was_pressed) returns it once.
#[derive(Debug, Clone, Copy)]
pub struct DebouncedInput<I: TimeInstant> {
    last_raw_level: bool,
    stable_level: bool,
    debounce_start: Option<I>,
    pending_press: bool,
}

impl<I: TimeInstant> DebouncedInput<I> {
    /// Creates an input whose level starts released (low).
    pub const fn new() -> Self {
        Self {
            last_raw_level: false,
            stable_level: false,
            debounce_start: None,
            pending_press: false,
        }
    }

    /// Feeds one raw sample.
    pub fn update(&mut self, raw_level: bool, now: I) {
        if raw_level != self.last_raw_level {
            self.last_raw_level = raw_level;
            self.debounce_start = Some(now);
        }

        if raw_level == self.stable_level {
            return;
        }

        let settled = match self.debounce_start {
            Some(start) => now.millis_since(start) >= DEBOUNCE_MS,
            None => false,
        };
        if settled {
            self.stable_level = raw_level;
            if raw_level {
                self.pending_press = true;
            }
        }
    }

    /// Samples `pin` and feeds the level. A read error counts as released.
    pub fn update_from<P: InputPin>(&mut self, pin: &mut P, now: I) {
        let level = pin.is_high().unwrap_or(false);
        self.update(level, now);
    }

    /// Returns true once per accepted press, clearing the latch.
    pub fn was_pressed(&mut self) -> bool {
        core::mem::take(&mut self.pending_press)
    }

    /// Debounced level.
    #[inline]
    pub fn is_high(&self) -> bool {
        self.stable_level
    }
}

impl<I: TimeInstant> Default for DebouncedInput<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// Polled motion sensor.
///
/// A failed read is reported as "no motion", the less intrusive outcome.
/// Faults are logged once per episode rather than on every tick.
#[derive(Debug)]
pub struct MotionInput<P: InputPin> {
    pin: P,
    faulted: bool,
}

impl<P: InputPin> MotionInput<P> {
    /// Wraps a sensor pin that reads high while motion is present.
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            faulted: false,
        }
    }

    /// Polls the sensor.
    pub fn read<E: EventSink>(&mut self, events: &mut E) -> bool {
        match self.pin.is_high() {
            Ok(level) => {
                if self.faulted {
                    self.faulted = false;
                    info!("motion sensor recovered");
                    events.record(Event::MotionSensorRecovered);
                }
                level
            }
            Err(_e) => {
                if !self.faulted {
                    self.faulted = true;
                    warn!("motion sensor read failed, assuming no motion");
                    events.record(Event::MotionSensorFault);
                }
                false
            }
        }
    }

    /// Returns true while the last read failed.
    #[inline]
    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    /// Releases the pin.
    pub fn release(self) -> P {
        self.pin
    }
}
