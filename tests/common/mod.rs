//! Shared test infrastructure for motion-light integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use motion_light::{ClockTime, LightSink, Srgb, SunsetProvider, TimeDuration, TimeInstant, TimeSource, WallTime};

// ============================================================================
// Mock Time Types
// ============================================================================

/// Mock duration type for testing (wraps milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestDuration(pub u64);

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

/// Mock instant type for testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestInstant(pub u64);

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

// ============================================================================
// Mock Strip
// ============================================================================

/// One `set_channels` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Write {
    pub brightness: u8,
    pub color: Srgb<u8>,
    pub white: u8,
}

/// Mock strip that records every write
#[derive(Default)]
pub struct MockStrip {
    history: Vec<Write>,
}

impl MockStrip {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<Write> {
        self.history.last().copied()
    }

    pub fn history(&self) -> &[Write] {
        &self.history
    }
}

impl LightSink for MockStrip {
    fn set_channels(&mut self, brightness: u8, color: Srgb<u8>, white: u8) {
        self.history.push(Write {
            brightness,
            color,
            white,
        });
    }
}

// ============================================================================
// Mock Time Source
// ============================================================================

/// Mock time source with controllable time advancement
pub struct MockTimeSource {
    current_time: core::cell::Cell<TestInstant>,
}

impl MockTimeSource {
    pub fn new() -> Self {
        Self {
            current_time: core::cell::Cell::new(TestInstant(0)),
        }
    }

    /// Advance time by the given number of milliseconds
    pub fn advance(&self, millis: u64) {
        let current = self.current_time.get();
        self.current_time.set(TestInstant(current.0 + millis));
    }

    pub fn set_time(&self, time: TestInstant) {
        self.current_time.set(time);
    }
}

impl TimeSource<TestInstant> for MockTimeSource {
    fn now(&self) -> TestInstant {
        self.current_time.get()
    }
}

// ============================================================================
// Mock Sunset Provider
// ============================================================================

/// Sunset provider replaying scripted answers; `None` is a fetch failure.
pub struct ScriptedSunset {
    answers: Vec<Option<ClockTime>>,
    pub calls: usize,
}

impl ScriptedSunset {
    pub fn new(answers: &[Option<ClockTime>]) -> Self {
        Self {
            answers: answers.to_vec(),
            calls: 0,
        }
    }
}

impl SunsetProvider for ScriptedSunset {
    type Error = &'static str;

    fn fetch_sunset(&mut self) -> Result<ClockTime, Self::Error> {
        let answer = self.answers.get(self.calls).copied().flatten();
        self.calls += 1;
        answer.ok_or("sunset service unreachable")
    }
}

// ============================================================================
// Test Helper Functions
// ============================================================================

pub fn at(hour: u8, minute: u8) -> ClockTime {
    ClockTime::new(hour, minute).unwrap()
}

/// Wall time on day 100.
pub fn wall(hour: u8, minute: u8) -> WallTime {
    WallTime::new(at(hour, minute), 100)
}

pub fn wall_on(day: u16, hour: u8, minute: u8) -> WallTime {
    WallTime::new(at(hour, minute), day)
}
