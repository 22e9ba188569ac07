//! Battery status check
//!
//! Implementation based upon https://github.com/dbrgn/pinetime-rtic/blob/master/pinetime-rtic/src/battery.rs
//! and https://wiki.pine64.org/wiki/PineTime.

use embassy_nrf::{gpio::Input, peripherals::P0_12, saadc::Saadc};

use pellet_watchface::{system::power, Error};

/// Battery API
pub struct Battery {
    /// ADC instance for battery voltage measurement, 12 bit resolution
    adc: Saadc<'static, 1>,
    /// Charge indication pin:
    /// high = battery, low = charging
    pin_charge_indication: Input<'static, P0_12>,
}

impl Battery {
    /// Configure battery settings on boot
    pub fn init(adc: Saadc<'static, 1>, charge_pin: Input<'static, P0_12>) -> Self {
        Self {
            adc,
            pin_charge_indication: charge_pin,
        }
    }

    /// Carging state of the battery
    pub fn is_charging(&self) -> bool {
        self.pin_charge_indication.is_low()
    }

    /// Battery capacity in percent
    pub async fn percent(&mut self) -> Result<u8, Error> {
        let voltage = self.voltage().await?;
        Ok(power::millivolts_to_percent(voltage))
    }

    /// Battery voltage in millivolts
    async fn voltage(&mut self) -> Result<u16, Error> {
        let mut buf = [0; 1];
        self.adc.sample(&mut buf).await;
        power::adc_to_millivolts(buf[0])
    }
}
