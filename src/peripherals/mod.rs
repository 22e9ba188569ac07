//! PineTime peripherals used by the watchface

pub mod backlight;
pub mod battery;
pub mod button;
pub mod display;
