//! General watchface configuration

use crate::ui::format::ClockFormat;

// Build time UTC epoch, generated by `build.rs`
include!(concat!(env!("OUT_DIR"), "/build_time.rs"));

/// Depth of the event channel between the event sources and the render task.
pub const EVENT_QUEUE_LEN: usize = 8;

/// Compile-time watchface settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchfaceConfig {
    /// Clock format used until the user toggles it
    pub clock_format: ClockFormat,
    /// Offset of local time from UTC in seconds
    pub utc_offset_secs: i32,
    /// Interval between battery measurements in seconds
    pub battery_poll_secs: u64,
    /// Backlight brightness (0–7)
    pub backlight_level: u8,
}

impl WatchfaceConfig {
    pub const DEFAULT: Self = Self {
        clock_format: ClockFormat::TwentyFourHour,
        utc_offset_secs: 1 * 3_600,
        battery_poll_secs: 60,
        backlight_level: 2,
    };
}

impl Default for WatchfaceConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
