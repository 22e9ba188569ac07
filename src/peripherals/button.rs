//! Side button of the PineTime

use debouncr::{debounce_2, Debouncer, Edge, Repeat2};
use embassy_nrf::{
    gpio::{Input, Output},
    peripherals::{P0_13, P0_15},
};
use embassy_time::{Duration, Timer};

/// Delay between two button samples
const POLL_INTERVAL: Duration = Duration::from_millis(10);

pub struct SideButton {
    /// Button detection pin (high/low)
    pin_button: Input<'static, P0_13>,
    /// Button enable pin
    pin_enable: Output<'static, P0_15>,
    debouncer: Debouncer<u8, Repeat2>,
}

impl SideButton {
    /// Configure button on boot
    pub fn init(button_pin: Input<'static, P0_13>, enable_pin: Output<'static, P0_15>) -> Self {
        Self {
            pin_button: button_pin,
            pin_enable: enable_pin,
            debouncer: debounce_2(false),
        }
    }

    /// Poll the button until it is pressed without bouncing for two samples.
    pub async fn wait_for_press(&mut self) {
        loop {
            if self.sample().await == Some(Edge::Rising) {
                return;
            }
            Timer::after(POLL_INTERVAL).await;
        }
    }

    async fn sample(&mut self) -> Option<Edge> {
        self.pin_enable.set_high();
        // The button needs a short time to give stable outputs
        Timer::after(Duration::from_nanos(1)).await;
        let edge = self.debouncer.update(self.pin_button.is_high());

        // Button consumes around 34µA when P0.15 is left high.
        self.pin_enable.set_low();
        edge
    }
}
