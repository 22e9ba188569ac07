//! UI definitions module

use chrono::NaiveDateTime;
use embassy_sync::{blocking_mutex::raw::RawMutex, channel::Receiver};
use embedded_graphics::{draw_target::DrawTarget, pixelcolor::Rgb565};

pub mod battery_gauge;
pub mod bluetooth_indicator;
pub mod default_watchface;
pub mod format;
pub mod layer;

#[cfg(test)]
pub(crate) mod test_support;

pub use default_watchface::DefaultWatchface;
pub use format::ClockFormat;

pub type ColorMode = Rgb565;

/// Size of the watchface canvas in pixels
pub const CANVAS_WIDTH: u32 = 144;
pub const CANVAS_HEIGHT: u32 = 168;

/// Events delivered to the watchface, one at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// A minute boundary passed, or the clock format changed
    Tick,
    /// New battery charge in percent
    BatteryChange(u8),
    /// Bluetooth connected (`true`) or disconnected (`false`)
    BluetoothChange(bool),
}

/// Current state of the system, queried on load and on every tick
pub trait WatchHost {
    /// Local wall clock time
    fn local_time(&self) -> NaiveDateTime;

    fn clock_format(&self) -> ClockFormat;

    /// Battery charge in percent
    fn battery_percent(&self) -> u8;

    fn bluetooth_connected(&self) -> bool;
}

pub trait WatchFace {
    /// Create the watchface showing the host's current state
    fn load<H: WatchHost>(host: &H) -> Self;

    /// Apply one event
    fn handle<H: WatchHost>(&mut self, event: Event, host: &H);

    /// Redraw whatever changed since the last draw
    fn draw<D>(&mut self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = ColorMode>;
}

/// Wait for the next event on `events` and apply it to `face`.
pub async fn dispatch<F, H, M, const N: usize>(
    face: &mut F,
    events: &Receiver<'_, M, Event, N>,
    host: &H,
) -> Event
where
    F: WatchFace,
    H: WatchHost,
    M: RawMutex,
{
    let event = events.receive().await;
    trace!("Dispatching {:?}", event);
    face.handle(event, host);
    event
}
