//! Battery charge estimation
//!
//! Implementation based upon https://github.com/dbrgn/pinetime-rtic/blob/master/pinetime-rtic/src/battery.rs
//! and https://wiki.pine64.org/wiki/PineTime.

use crate::Error;

/// Convert a 12 bit ADC sample of the battery voltage divider into millivolts.
pub fn adc_to_millivolts(raw_measurement: i16) -> Result<u16, Error> {
    match raw_measurement {
        0..=4095 => {
            // Use u32 during calculation to prevent overflow:
            // multiply by 2 * 1000 for mV and divide by (2 ^ 12 / 3.3V reference)
            Ok((raw_measurement as u32 * 2000 / 1241) as u16)
        }
        _ => Err(Error::InvalidMeasurement),
    }
}

/// Estimate battery capacity in percent from the voltage in millivolts.
pub fn millivolts_to_percent(voltage: u16) -> u8 {
    // Use fixed data points and linear interpolation in between
    (match voltage {
        0..=3449 => 0,
        3450..=3699 => (voltage - 3450) / 5,
        3700..=4199 => 50 + (voltage - 3700) / 10,
        _ => 100,
    }) as u8
}

/// Battery level notifications for one connected client.
///
/// A level is handed out once while the client is subscribed. Unsubscribing
/// forgets what was sent, so a new subscription starts with the current level.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LevelNotifier {
    subscribed: bool,
    last_sent: Option<u8>,
}

impl LevelNotifier {
    pub const fn new() -> Self {
        Self {
            subscribed: false,
            last_sent: None,
        }
    }

    pub fn set_subscribed(&mut self, subscribed: bool) {
        self.subscribed = subscribed;
        if !subscribed {
            self.last_sent = None;
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Level to notify, if the client is subscribed and hasn't received it yet.
    pub fn next(&mut self, percent: u8) -> Option<u8> {
        if !self.subscribed || self.last_sent == Some(percent) {
            return None;
        }
        self.last_sent = Some(percent);
        Some(percent)
    }
}
