//! Backlight control
//!
//! Implementation based upon https://github.com/dbrgn/pinetime-rtic/blob/master/pinetime-rtic/src/backlight.rs
//! and https://wiki.pine64.org/wiki/PineTime.

use embassy_nrf::{
    gpio::{Output, Pin},
    peripherals::{P0_14, P0_22, P0_23},
};

use pellet_watchface::Error;

/// Highest brightness level
pub const MAX_LEVEL: u8 = 7;

/// Control the backlight.
///
/// There are three active-low backlight pins, each connected to a FET that
/// toggles backlight power through a resistor.
///
/// - Low: 2.2 kΩ
/// - Mid: 100 Ω
/// - High: 30 Ω
///
/// Through combinations of these pins, 7 brightness levels (+ off) can be
/// configured.
pub struct Backlight {
    low: Output<'static, P0_14>,
    mid: Output<'static, P0_22>,
    high: Output<'static, P0_23>,
}

impl Backlight {
    /// Take the backlight pins, starting with the backlight off.
    pub fn init(
        low: Output<'static, P0_14>,
        mid: Output<'static, P0_22>,
        high: Output<'static, P0_23>,
    ) -> Self {
        let mut backlight = Self {
            low,
            mid,
            high,
        };
        backlight.apply(0);
        backlight
    }

    /// Set the brightness level between 0 (off) and 7 (max brightness).
    pub fn set(&mut self, brightness: u8) -> Result<(), Error> {
        if brightness > MAX_LEVEL {
            return Err(Error::BrightnessOutOfBounds);
        }
        defmt::debug!("Setting backlight brightness to {}", brightness);
        self.apply(brightness);
        Ok(())
    }

    fn apply(&mut self, brightness: u8) {
        drive(&mut self.low, brightness & 0x01 != 0);
        drive(&mut self.mid, brightness & 0x02 != 0);
        drive(&mut self.high, brightness & 0x04 != 0);
    }
}

/// Pins are active low
fn drive<P: Pin>(pin: &mut Output<'static, P>, on: bool) {
    if on {
        pin.set_low();
    } else {
        pin.set_high();
    }
}
