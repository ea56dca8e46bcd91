//! Steady-state light configurations and per-channel interpolation.

use palette::{Mix, Srgb};

/// Packs an 8-bit RGB color into `0xRRGGBB`.
#[inline]
pub fn pack_rgb(color: Srgb<u8>) -> u32 {
    (u32::from(color.red) << 16) | (u32::from(color.green) << 8) | u32::from(color.blue)
}

/// Unpacks `0xRRGGBB` into an 8-bit RGB color. Bits above 24 are ignored.
#[inline]
pub fn unpack_rgb(packed: u32) -> Srgb<u8> {
    Srgb::new((packed >> 16) as u8, (packed >> 8) as u8, packed as u8)
}

/// Maps a `0..=255` level to a `0..=100` percentage (integer, truncating).
#[inline]
pub fn level_to_percent(level: u8) -> u8 {
    (u16::from(level) * 100 / 255) as u8
}

/// Maps a `0..=100` percentage to a `0..=255` level. Values above 100 clamp.
#[inline]
pub fn percent_to_level(percent: u8) -> u8 {
    (u16::from(percent.min(100)) * 255 / 100) as u8
}

/// One steady-state lighting configuration.
///
/// Values are never mutated in place by the controller: every transition
/// produces a new `LightMode`, either from configuration or from
/// [`LightMode::interpolate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightMode {
    /// Overall brightness scale.
    pub brightness: u8,
    /// Whether the RGB channels are lit.
    pub color_enabled: bool,
    /// RGB color.
    pub color: Srgb<u8>,
    /// Whether the white channel is lit.
    pub white_enabled: bool,
    /// White channel level.
    pub white: u8,
}

impl LightMode {
    /// All channels dark.
    pub const OFF: LightMode = LightMode {
        brightness: 0,
        color_enabled: false,
        color: Srgb::new(0, 0, 0),
        white_enabled: false,
        white: 0,
    };

    /// Returns a copy with the given brightness.
    #[inline]
    pub const fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = brightness;
        self
    }

    /// Returns a copy with the RGB channels enabled and set to `color`.
    #[inline]
    pub const fn with_color(mut self, color: Srgb<u8>) -> Self {
        self.color_enabled = true;
        self.color = color;
        self
    }

    /// Returns a copy with the RGB channels disabled. The stored color is kept.
    #[inline]
    pub const fn without_color(mut self) -> Self {
        self.color_enabled = false;
        self
    }

    /// Returns a copy with the white channel enabled at `white`.
    #[inline]
    pub const fn with_white(mut self, white: u8) -> Self {
        self.white_enabled = true;
        self.white = white;
        self
    }

    /// Returns a copy with the white channel disabled. The stored level is kept.
    #[inline]
    pub const fn without_white(mut self) -> Self {
        self.white_enabled = false;
        self
    }

    /// Color as `0xRRGGBB`.
    #[inline]
    pub fn packed_color(&self) -> u32 {
        pack_rgb(self.color)
    }

    /// The values actually driven onto the strip.
    ///
    /// A disabled RGB channel is output as black, a disabled white channel as 0.
    pub fn channels(&self) -> OutputChannels {
        OutputChannels {
            brightness: self.brightness,
            color: if self.color_enabled {
                self.color
            } else {
                Srgb::new(0, 0, 0)
            },
            white: if self.white_enabled { self.white } else { 0 },
        }
    }

    /// Linear per-channel interpolation from `self` toward `target`.
    ///
    /// `progress` is clamped to `[0, 1]`. Brightness and white ramp
    /// independently. RGB only blends when both ends have color enabled;
    /// otherwise the target's color flags apply immediately. `white_enabled`
    /// always comes from the target. At `progress == 1.0` the result equals
    /// `target` exactly.
    pub fn interpolate(&self, target: &LightMode, progress: f32) -> LightMode {
        let progress = progress.clamp(0.0, 1.0);
        if progress >= 1.0 {
            return *target;
        }

        let (color_enabled, color) = if self.color_enabled && target.color_enabled {
            let start: Srgb<f32> = self.color.into_format();
            let end: Srgb<f32> = target.color.into_format();
            (true, start.mix(end, progress).into_format())
        } else {
            (target.color_enabled, target.color)
        };

        LightMode {
            brightness: lerp_channel(self.brightness, target.brightness, progress),
            color_enabled,
            color,
            white_enabled: target.white_enabled,
            white: lerp_channel(self.white, target.white, progress),
        }
    }
}

impl Default for LightMode {
    /// Factory defaults: dim warm white, RGB off.
    fn default() -> Self {
        Self {
            brightness: 20,
            color_enabled: false,
            color: Srgb::new(0xFF, 0xFF, 0xFF),
            white_enabled: true,
            white: 0,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LightMode {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "LightMode {{ brightness: {=u8}, color: {=u32:#x} ({=bool}), white: {=u8} ({=bool}) }}",
            self.brightness,
            self.packed_color(),
            self.color_enabled,
            self.white,
            self.white_enabled
        )
    }
}

#[inline]
fn lerp_channel(start: u8, target: u8, progress: f32) -> u8 {
    let start = f32::from(start);
    let value = start + (f32::from(target) - start) * progress;
    // `as` saturates; value already lies between the two endpoints.
    value as u8
}

/// Channel values handed to a [`crate::LightSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputChannels {
    /// Brightness scale.
    pub brightness: u8,
    /// Per-pixel RGB (black when color is disabled).
    pub color: Srgb<u8>,
    /// White level (0 when white is disabled).
    pub white: u8,
}

/// Light mode in its persisted shape.
///
/// Fields are wide signed integers so that out-of-range stored values survive
/// decoding and get clamped on conversion into [`LightMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RawLightMode {
    /// Brightness, clamped to `0..=255`.
    pub brightness: i32,
    /// Color as `0xRRGGBB`; higher bits are ignored.
    pub color: u32,
    /// White level, clamped to `0..=255`.
    pub white: i32,
    /// Whether the RGB channels are lit.
    pub color_enabled: bool,
    /// Whether the white channel is lit.
    pub white_enabled: bool,
}

impl From<RawLightMode> for LightMode {
    fn from(raw: RawLightMode) -> Self {
        LightMode {
            brightness: raw.brightness.clamp(0, 255) as u8,
            color_enabled: raw.color_enabled,
            color: unpack_rgb(raw.color & 0x00FF_FFFF),
            white_enabled: raw.white_enabled,
            white: raw.white.clamp(0, 255) as u8,
        }
    }
}

impl From<LightMode> for RawLightMode {
    fn from(mode: LightMode) -> Self {
        RawLightMode {
            brightness: i32::from(mode.brightness),
            color: mode.packed_color(),
            white: i32::from(mode.white),
            color_enabled: mode.color_enabled,
            white_enabled: mode.white_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WARM: LightMode = LightMode {
        brightness: 40,
        color_enabled: true,
        color: Srgb::new(200, 100, 0),
        white_enabled: true,
        white: 10,
    };

    const COOL: LightMode = LightMode {
        brightness: 240,
        color_enabled: true,
        color: Srgb::new(0, 100, 200),
        white_enabled: false,
        white: 250,
    };

    #[test]
    fn packing_round_trips_through_24_bits() {
        let color = unpack_rgb(0x12_34_56);
        assert_eq!(color, Srgb::new(0x12, 0x34, 0x56));
        assert_eq!(pack_rgb(color), 0x12_34_56);
        assert_eq!(unpack_rgb(0xFF_00_00_01), Srgb::new(0, 0, 1));
    }

    #[test]
    fn percent_mapping_matches_integer_map() {
        assert_eq!(percent_to_level(0), 0);
        assert_eq!(percent_to_level(50), 127);
        assert_eq!(percent_to_level(100), 255);
        assert_eq!(percent_to_level(180), 255);
        assert_eq!(level_to_percent(255), 100);
        assert_eq!(level_to_percent(20), 7);
    }

    #[test]
    fn interpolation_endpoints() {
        let start = WARM.interpolate(&COOL, 0.0);
        assert_eq!(start.brightness, WARM.brightness);
        assert_eq!(start.color, WARM.color);
        assert_eq!(start.white, WARM.white);
        // white_enabled always follows the target
        assert!(!start.white_enabled);

        assert_eq!(WARM.interpolate(&COOL, 1.0), COOL);
        assert_eq!(WARM.interpolate(&COOL, 7.5), COOL);
    }

    #[test]
    fn interpolation_midpoint_is_linear_per_channel() {
        let mid = WARM.interpolate(&COOL, 0.5);
        assert_eq!(mid.brightness, 140);
        assert_eq!(mid.white, 130);
        assert_eq!(mid.color.green, 100);
        assert!((i16::from(mid.color.red) - 100).abs() <= 1);
        assert!((i16::from(mid.color.blue) - 100).abs() <= 1);
    }

    #[test]
    fn color_steps_when_either_end_has_color_disabled() {
        let plain = WARM.without_color();
        let mid = plain.interpolate(&COOL, 0.25);
        assert!(mid.color_enabled);
        assert_eq!(mid.color, COOL.color);

        let mid = WARM.interpolate(&COOL.without_color(), 0.25);
        assert!(!mid.color_enabled);
        assert_eq!(mid.color, COOL.color);
    }

    #[test]
    fn decreasing_channels_interpolate_downward() {
        let mid = COOL.interpolate(&LightMode::OFF, 0.5);
        assert_eq!(mid.brightness, 120);
        assert_eq!(mid.white, 125);
    }

    #[test]
    fn channels_mask_disabled_outputs() {
        let out = WARM.without_color().without_white().channels();
        assert_eq!(out.brightness, 40);
        assert_eq!(out.color, Srgb::new(0, 0, 0));
        assert_eq!(out.white, 0);

        let out = WARM.channels();
        assert_eq!(out.color, WARM.color);
        assert_eq!(out.white, 10);
    }

    #[test]
    fn raw_mode_clamps_out_of_range_values() {
        let raw = RawLightMode {
            brightness: 400,
            color: 0xAB_FF_80_00,
            white: -3,
            color_enabled: true,
            white_enabled: true,
        };
        let mode = LightMode::from(raw);
        assert_eq!(mode.brightness, 255);
        assert_eq!(mode.white, 0);
        assert_eq!(mode.packed_color(), 0xFF_80_00);

        let back = RawLightMode::from(mode);
        assert_eq!(back.brightness, 255);
        assert_eq!(back.color, 0xFF_80_00);
    }
}
