//! Bluetooth connection icon

use embedded_graphics::{
    geometry::{Point, Size},
    primitives::Rectangle,
};

use super::{
    layer::{BitmapLayer, Graphic},
    ColorMode,
};

const ICON_FRAME: Rectangle = Rectangle::new(Point::new(10, 53), Size::new(8, 11));

pub struct BluetoothIndicator {
    pub icon: BitmapLayer,
}

impl BluetoothIndicator {
    pub fn new(color: ColorMode) -> Self {
        Self {
            icon: BitmapLayer::new(ICON_FRAME, Graphic::BluetoothRune, color),
        }
    }

    /// Show the icon iff `connected`. Returns whether the visibility changed.
    pub fn update(&mut self, connected: bool) -> bool {
        let hidden = !connected;
        if hidden == self.icon.layer.is_hidden() {
            return false;
        }
        self.icon.layer.set_hidden(hidden);
        true
    }

    pub fn is_visible(&self) -> bool {
        !self.icon.layer.is_hidden()
    }
}
