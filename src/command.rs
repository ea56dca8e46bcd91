//! Command-based control for the lighting controller.
//!
//! Lets an outer surface (web handler, MQTT bridge, console) queue requests
//! that the control loop applies between ticks via
//! [`LightingController::handle_command`](crate::LightingController::handle_command).

use crate::config::ScheduleConfig;
use crate::mode::LightMode;

/// Requests accepted by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerCommand {
    /// Replace the configuration. Queued if a fade is in flight.
    UpdateConfig(ScheduleConfig),
    /// Display a mode immediately, overriding the schedule until `Resume`
    /// or the next state transition.
    Preview(LightMode),
    /// Preview the displayed mode with RGB enabled at `0xRRGGBB`.
    SetColor(u32),
    /// Preview the displayed mode with the white channel at full level.
    FullWhite,
    /// Preview the displayed mode at a brightness percentage (`0..=100`).
    SetBrightnessPercent(u8),
    /// Drop any preview and fade back to the state machine's mode.
    Resume,
}
