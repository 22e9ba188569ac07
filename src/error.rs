//! Error type shared by the watchface library and the firmware

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// ADC sample outside the 12 bit range
    InvalidMeasurement,
    /// Date or time fields that don't form a valid date-time
    InvalidTime,
    /// Backlight level above 7
    BrightnessOutOfBounds,
    /// Display initialisation or transfer failed
    Display,
    /// SoftDevice or GATT server setup failed
    Bluetooth,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Error::InvalidMeasurement => "invalid battery measurement",
            Error::InvalidTime => "invalid date or time",
            Error::BrightnessOutOfBounds => "brightness level out of bounds",
            Error::Display => "display error",
            Error::Bluetooth => "bluetooth error",
        })
    }
}
