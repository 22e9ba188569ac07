//! Default watchface

use embedded_graphics::{
    draw_target::{DrawTarget, DrawTargetExt},
    geometry::{Point, Size},
    mono_font::iso_8859_1::FONT_10X20,
    pixelcolor::{Rgb565, RgbColor},
    primitives::{Primitive, PrimitiveStyle, Rectangle},
    text::Alignment,
    Drawable,
};
use profont::{PROFONT_14_POINT, PROFONT_24_POINT};

use super::{
    battery_gauge::{BatteryGauge, PelletChanges, PELLET_COUNT},
    bluetooth_indicator::BluetoothIndicator,
    format::{format_display, ClockFormat, ClockReading},
    layer::{Layer, TextLayer},
    ColorMode, Event, WatchFace, WatchHost,
};

/// Oxford blue
const BACKGROUND: ColorMode = Rgb565::new(0, 0, 10);
/// Picton blue
const DATE_COLOR: ColorMode = Rgb565::new(10, 42, 31);

const TEXT_TOP: i32 = 80;
const SUFFIX_FRAME: Rectangle = Rectangle::new(Point::new(114, TEXT_TOP + 24), Size::new(40, 50));
const DATE_FRAME: Rectangle = Rectangle::new(Point::new(10, TEXT_TOP + 41), Size::new(124, 50));

const fn time_frame(width: u32) -> Rectangle {
    Rectangle::new(Point::new(0, TEXT_TOP), Size::new(width, 50))
}

// Layer indices, bottom to top
const TIME: usize = 0;
const SUFFIX: usize = 1;
const DATE: usize = 2;
const CONTAINER: usize = 3;
const FIRST_PELLET: usize = 4;
const ICON: usize = FIRST_PELLET + PELLET_COUNT;
const LAYER_COUNT: usize = ICON + 1;

/// Clock, date, battery gauge and Bluetooth icon
pub struct DefaultWatchface {
    /// Time label
    time_label: TextLayer,
    /// AM/PM label, hidden in 24 hour mode
    suffix_label: TextLayer,
    /// Date label
    date_label: TextLayer,
    battery: BatteryGauge,
    bluetooth: BluetoothIndicator,
    clock_format: ClockFormat,
    /// The whole canvas must be cleared before the next draw
    needs_clear: bool,
}

impl DefaultWatchface {
    /// Create the layers with placeholder content.
    pub fn new(clock_format: ClockFormat) -> Self {
        let mut suffix_label = TextLayer::new(
            SUFFIX_FRAME,
            "AM",
            &PROFONT_14_POINT,
            ColorMode::WHITE,
            Alignment::Left,
        );
        suffix_label.layer.set_hidden(clock_format.is_24h());

        Self {
            time_label: TextLayer::new(
                time_frame(clock_format.time_field_width()),
                "00:00",
                &PROFONT_24_POINT,
                ColorMode::WHITE,
                Alignment::Right,
            ),
            suffix_label,
            date_label: TextLayer::new(
                DATE_FRAME,
                "Mon Jan 01",
                &FONT_10X20,
                DATE_COLOR,
                Alignment::Right,
            ),
            battery: BatteryGauge::new(ColorMode::WHITE),
            bluetooth: BluetoothIndicator::new(ColorMode::WHITE),
            clock_format,
            needs_clear: true,
        }
    }

    /// Show the time and date of `reading` in `format`.
    pub fn update_time(&mut self, reading: &ClockReading, format: ClockFormat) {
        let strings = format_display(reading, format);

        self.time_label.set_text(strings.time.as_str());
        self.date_label.set_text(strings.date.as_str());
        if !strings.suffix.is_empty() {
            self.suffix_label.set_text(strings.suffix.as_str());
        }
        if self.suffix_label.layer.is_hidden() != format.is_24h() {
            self.suffix_label.layer.set_hidden(format.is_24h());
        }
        // No-op unless the format changed
        self.time_label.layer.set_width(strings.time_field_width);

        if format != self.clock_format {
            info!("Clock format changed to {:?}", format);
            self.clock_format = format;
        }
        trace!("Time {} {}", self.time_label.text(), self.date_label.text());
    }

    /// Show `percent` on the battery gauge.
    pub fn update_battery(&mut self, percent: u8) -> PelletChanges {
        self.battery.update(percent)
    }

    /// Show or hide the Bluetooth icon. Returns whether it changed.
    pub fn update_bluetooth(&mut self, connected: bool) -> bool {
        self.bluetooth.update(connected)
    }

    pub fn clock_format(&self) -> ClockFormat {
        self.clock_format
    }

    pub fn time_text(&self) -> &str {
        self.time_label.text()
    }

    pub fn suffix_text(&self) -> &str {
        self.suffix_label.text()
    }

    pub fn date_text(&self) -> &str {
        self.date_label.text()
    }

    pub fn is_suffix_hidden(&self) -> bool {
        self.suffix_label.layer.is_hidden()
    }

    pub fn time_field_width(&self) -> u32 {
        self.time_label.layer.frame().size.width
    }

    pub fn is_pellet_hidden(&self, index: usize) -> bool {
        self.battery.is_pellet_hidden(index)
    }

    pub fn is_bluetooth_visible(&self) -> bool {
        self.bluetooth.is_visible()
    }

    /// Force a full redraw on the next draw.
    pub fn invalidate(&mut self) {
        self.needs_clear = true;
        for index in 0..LAYER_COUNT {
            self.layer_mut(index).mark_dirty();
        }
    }

    fn layer(&self, index: usize) -> &Layer {
        match index {
            TIME => &self.time_label.layer,
            SUFFIX => &self.suffix_label.layer,
            DATE => &self.date_label.layer,
            CONTAINER => &self.battery.container.layer,
            ICON => &self.bluetooth.icon.layer,
            pellet => &self.battery.pellets[pellet - FIRST_PELLET].layer,
        }
    }

    fn layer_mut(&mut self, index: usize) -> &mut Layer {
        match index {
            TIME => &mut self.time_label.layer,
            SUFFIX => &mut self.suffix_label.layer,
            DATE => &mut self.date_label.layer,
            CONTAINER => &mut self.battery.container.layer,
            ICON => &mut self.bluetooth.icon.layer,
            pellet => &mut self.battery.pellets[pellet - FIRST_PELLET].layer,
        }
    }

    fn paint_layer<D>(&self, index: usize, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = ColorMode>,
    {
        match index {
            TIME => self.time_label.paint(target),
            SUFFIX => self.suffix_label.paint(target),
            DATE => self.date_label.paint(target),
            CONTAINER => self.battery.container.paint(target),
            ICON => self.bluetooth.icon.paint(target),
            pellet => self.battery.pellets[pellet - FIRST_PELLET].paint(target),
        }
    }

    /// Clear `area` and repaint every visible layer reaching into it.
    fn compose<D>(&self, target: &mut D, area: Rectangle) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = ColorMode>,
    {
        area.into_styled(PrimitiveStyle::with_fill(BACKGROUND))
            .draw(target)?;
        let mut clipped = target.clipped(&area);
        for index in 0..LAYER_COUNT {
            if self.layer(index).covers(&area) {
                self.paint_layer(index, &mut clipped)?;
            }
        }
        Ok(())
    }

    fn draw_damage<D>(&mut self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = ColorMode>,
    {
        if self.needs_clear {
            target.clear(BACKGROUND)?;
            self.needs_clear = false;
        }
        for index in 0..LAYER_COUNT {
            for area in self.layer_mut(index).take_damage().into_iter().flatten() {
                self.compose(target, area)?;
            }
        }
        Ok(())
    }
}

impl WatchFace for DefaultWatchface {
    fn load<H: WatchHost>(host: &H) -> Self {
        let clock_format = host.clock_format();
        let mut face = Self::new(clock_format);
        face.update_battery(host.battery_percent());
        face.update_bluetooth(host.bluetooth_connected());
        face.update_time(&ClockReading::from(&host.local_time()), clock_format);
        info!("Watchface loaded");
        face
    }

    fn handle<H: WatchHost>(&mut self, event: Event, host: &H) {
        match event {
            Event::Tick => {
                let reading = ClockReading::from(&host.local_time());
                self.update_time(&reading, host.clock_format());
            }
            Event::BatteryChange(percent) => {
                let changes = self.update_battery(percent);
                debug!("Battery at {}%, {} pellets changed", percent, changes.len());
            }
            Event::BluetoothChange(connected) => {
                if self.update_bluetooth(connected) {
                    info!("Bluetooth {}", if connected { "connected" } else { "disconnected" });
                }
            }
        }
    }

    fn draw<D>(&mut self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = ColorMode>,
    {
        let result = self.draw_damage(target);
        if result.is_err() {
            warn!("Draw failed, scheduling a full redraw");
            self.invalidate();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::{
        battery_gauge::pellet_frame, format::NARROW_TIME_WIDTH, format::WIDE_TIME_WIDTH,
        test_support::Recorder,
    };
    use chrono::{NaiveDate, NaiveDateTime};
    use core::cell::Cell;
    use embedded_graphics::primitives::{ContainsPoint, PointsIter};

    struct FakeHost {
        time: Cell<NaiveDateTime>,
        format: Cell<ClockFormat>,
        percent: u8,
        connected: bool,
    }

    impl FakeHost {
        fn new(format: ClockFormat) -> Self {
            Self {
                time: Cell::new(at(13, 5)),
                format: Cell::new(format),
                percent: 100,
                connected: true,
            }
        }
    }

    impl WatchHost for FakeHost {
        fn local_time(&self) -> NaiveDateTime {
            self.time.get()
        }
        fn clock_format(&self) -> ClockFormat {
            self.format.get()
        }
        fn battery_percent(&self) -> u8 {
            self.percent
        }
        fn bluetooth_connected(&self) -> bool {
            self.connected
        }
    }

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 6)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn load_shows_host_state() {
        let host = FakeHost {
            percent: 47,
            connected: false,
            ..FakeHost::new(ClockFormat::TwentyFourHour)
        };
        let face = DefaultWatchface::load(&host);
        assert_eq!(face.time_text(), "13:05");
        assert_eq!(face.date_text(), "Mon Jan 06");
        assert!(face.is_suffix_hidden());
        assert_eq!(face.time_field_width(), WIDE_TIME_WIDTH);
        assert!(!face.is_pellet_hidden(9));
        assert!(face.is_pellet_hidden(10));
        assert!(!face.is_bluetooth_visible());
    }

    #[test]
    fn tick_rereads_clock_format() {
        let host = FakeHost::new(ClockFormat::TwentyFourHour);
        let mut face = DefaultWatchface::load(&host);

        host.format.set(ClockFormat::TwelveHour);
        host.time.set(at(9, 5));
        face.handle(Event::Tick, &host);
        assert_eq!(face.time_text(), "9:05");
        assert_eq!(face.suffix_text(), "AM");
        assert!(!face.is_suffix_hidden());
        assert_eq!(face.time_field_width(), NARROW_TIME_WIDTH);
        assert_eq!(face.clock_format(), ClockFormat::TwelveHour);

        host.format.set(ClockFormat::TwentyFourHour);
        face.handle(Event::Tick, &host);
        assert_eq!(face.time_text(), "09:05");
        assert!(face.is_suffix_hidden());
        assert_eq!(face.time_field_width(), WIDE_TIME_WIDTH);
    }

    #[test]
    fn events_route_to_their_updater() {
        let host = FakeHost::new(ClockFormat::TwelveHour);
        let mut face = DefaultWatchface::load(&host);
        face.handle(Event::BluetoothChange(false), &host);
        assert!(!face.is_bluetooth_visible());
        assert_eq!(face.time_text(), "1:05");

        face.handle(Event::BatteryChange(20), &host);
        assert!(!face.is_pellet_hidden(4));
        assert!(face.is_pellet_hidden(5));
        assert!(!face.is_bluetooth_visible());
    }

    #[test]
    fn first_draw_clears_whole_canvas() {
        let host = FakeHost::new(ClockFormat::TwentyFourHour);
        let mut face = DefaultWatchface::load(&host);
        let mut display = Recorder::new();
        face.draw(&mut display).unwrap();
        assert_eq!(display.pixel(Point::new(143, 167)), Some(BACKGROUND));
        assert_eq!(display.pixel(Point::new(7, 7)), Some(ColorMode::WHITE));
        for point in pellet_frame(19).points() {
            assert_eq!(display.pixel(point), Some(ColorMode::WHITE));
        }
    }

    #[test]
    fn nothing_changed_draws_nothing() {
        let host = FakeHost::new(ClockFormat::TwentyFourHour);
        let mut face = DefaultWatchface::load(&host);
        let mut display = Recorder::new();
        face.draw(&mut display).unwrap();
        display.reset_log();

        face.handle(Event::Tick, &host);
        face.handle(Event::BatteryChange(100), &host);
        face.handle(Event::BluetoothChange(true), &host);
        face.draw(&mut display).unwrap();
        assert!(display.log().is_empty());
    }

    #[test]
    fn battery_change_redraws_only_changed_pellets() {
        let host = FakeHost::new(ClockFormat::TwentyFourHour);
        let mut face = DefaultWatchface::load(&host);
        let mut display = Recorder::new();
        face.draw(&mut display).unwrap();
        display.reset_log();

        face.handle(Event::BatteryChange(50), &host);
        face.draw(&mut display).unwrap();

        let changed: Vec<_> = (11..PELLET_COUNT).map(pellet_frame).collect();
        assert_eq!(display.log().len(), changed.len() * 6);
        assert!(display
            .log()
            .iter()
            .all(|p| changed.iter().any(|frame| frame.contains(*p))));
        for frame in &changed {
            assert!(frame.points().all(|p| display.pixel(p) == Some(BACKGROUND)));
        }
        assert!(pellet_frame(10)
            .points()
            .all(|p| display.pixel(p) == Some(ColorMode::WHITE)));
    }

    #[test]
    fn hiding_the_suffix_keeps_the_wide_time() {
        let host = FakeHost::new(ClockFormat::TwelveHour);
        host.time.set(at(23, 58));
        let mut face = DefaultWatchface::load(&host);
        let mut display = Recorder::new();
        face.draw(&mut display).unwrap();

        host.format.set(ClockFormat::TwentyFourHour);
        face.handle(Event::Tick, &host);
        face.draw(&mut display).unwrap();

        // Redraw everything from scratch and compare
        let mut fresh = Recorder::new();
        let mut reference = DefaultWatchface::load(&host);
        reference.draw(&mut fresh).unwrap();
        for point in Rectangle::new(Point::zero(), Size::new(144, 168)).points() {
            assert_eq!(display.pixel(point), fresh.pixel(point), "{:?}", point);
        }
    }

    #[test]
    fn bluetooth_toggle_redraws_icon_only() {
        let host = FakeHost::new(ClockFormat::TwentyFourHour);
        let mut face = DefaultWatchface::load(&host);
        let mut display = Recorder::new();
        face.draw(&mut display).unwrap();
        display.reset_log();

        face.handle(Event::BluetoothChange(false), &host);
        face.draw(&mut display).unwrap();
        let icon = face.bluetooth.icon.layer.frame();
        assert!(!display.log().is_empty());
        assert!(display.log().iter().all(|p| icon.contains(*p)));
        assert!(icon.points().all(|p| display.pixel(p) == Some(BACKGROUND)));
    }

    #[test]
    fn invalidate_forces_full_redraw() {
        let host = FakeHost::new(ClockFormat::TwentyFourHour);
        let mut face = DefaultWatchface::load(&host);
        let mut display = Recorder::new();
        face.draw(&mut display).unwrap();
        display.reset_log();

        face.invalidate();
        face.draw(&mut display).unwrap();
        assert!(display.log().len() >= 144 * 168);
    }
}
