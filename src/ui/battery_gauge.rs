//! Battery gauge: a container with 20 pellets, one per 5 % of charge

use embedded_graphics::{
    geometry::{Point, Size},
    primitives::Rectangle,
};

use super::{
    layer::{BitmapLayer, Graphic},
    ColorMode,
};

pub const PELLET_COUNT: usize = 20;
/// Charge represented by one pellet, in percent
pub const PELLET_STEP: u8 = 5;

const CONTAINER_FRAME: Rectangle = Rectangle::new(Point::new(7, 7), Size::new(14, 60));

/// Frame of pellet `index`, stacked upwards from the bottom of the container.
pub const fn pellet_frame(index: usize) -> Rectangle {
    Rectangle::new(
        Point::new(11, 9 + (PELLET_COUNT as i32 - index as i32) * 2),
        Size::new(6, 1),
    )
}

/// Whether pellet `index` is hidden at `percent` charge.
pub fn pellet_hidden(index: usize, percent: u8) -> bool {
    (percent as usize) < index * PELLET_STEP as usize
}

/// Visibility of every pellet at `percent` charge
pub fn pellet_visibility(percent: u8) -> [bool; PELLET_COUNT] {
    core::array::from_fn(|i| !pellet_hidden(i, percent))
}

/// Pellets toggled by one update, as a bit mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PelletChanges(u32);

impl PelletChanges {
    pub fn contains(&self, index: usize) -> bool {
        index < PELLET_COUNT && self.0 & (1 << index) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    fn insert(&mut self, index: usize) {
        self.0 |= 1 << index;
    }
}

pub struct BatteryGauge {
    pub container: BitmapLayer,
    pub pellets: [BitmapLayer; PELLET_COUNT],
}

impl BatteryGauge {
    pub fn new(color: ColorMode) -> Self {
        Self {
            container: BitmapLayer::new(CONTAINER_FRAME, Graphic::Outline, color),
            pellets: core::array::from_fn(|i| BitmapLayer::new(pellet_frame(i), Graphic::Solid, color)),
        }
    }

    /// Show the pellets for `percent`, touching only those whose visibility changes.
    pub fn update(&mut self, percent: u8) -> PelletChanges {
        let mut changes = PelletChanges::default();
        for (i, pellet) in self.pellets.iter_mut().enumerate() {
            let should_be_hidden = pellet_hidden(i, percent);
            if should_be_hidden != pellet.layer.is_hidden() {
                pellet.layer.set_hidden(should_be_hidden);
                changes.insert(i);
            }
        }
        changes
    }

    pub fn is_pellet_hidden(&self, index: usize) -> bool {
        self.pellets[index].layer.is_hidden()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::pixelcolor::RgbColor;

    fn visible(gauge: &BatteryGauge) -> usize {
        (0..PELLET_COUNT).filter(|&i| !gauge.is_pellet_hidden(i)).count()
    }

    #[test]
    fn threshold_ladder_for_every_percent() {
        let mut gauge = BatteryGauge::new(ColorMode::WHITE);
        for percent in 0..=100u8 {
            gauge.update(percent);
            for i in 0..PELLET_COUNT {
                assert_eq!(gauge.is_pellet_hidden(i), (percent as usize) < i * 5);
            }
        }
    }

    #[test]
    fn visibility_is_monotonic() {
        for percent in 0..=100u8 {
            let visibility = pellet_visibility(percent);
            for i in 1..PELLET_COUNT {
                assert!(visibility[i - 1] || !visibility[i], "{percent}% pellet {i}");
            }
        }
    }

    #[test]
    fn boundaries() {
        let mut gauge = BatteryGauge::new(ColorMode::WHITE);
        gauge.update(100);
        assert_eq!(visible(&gauge), 20);

        gauge.update(47);
        assert!((0..=9).all(|i| !gauge.is_pellet_hidden(i)));
        assert!((10..PELLET_COUNT).all(|i| gauge.is_pellet_hidden(i)));

        // Pellet 0 has a threshold of 0 % and stays lit on an empty battery
        gauge.update(0);
        assert_eq!(visible(&gauge), 1);
        assert!(!gauge.is_pellet_hidden(0));
    }

    #[test]
    fn only_changed_pellets_are_reported() {
        let mut gauge = BatteryGauge::new(ColorMode::WHITE);
        let changes = gauge.update(100);
        assert!(changes.is_empty());

        let changes = gauge.update(50);
        assert_eq!(changes.len(), 9);
        assert!((11..PELLET_COUNT).all(|i| changes.contains(i)));
        assert!(!changes.contains(10));

        assert!(gauge.update(50).is_empty());
    }

    #[test]
    fn unchanged_pellets_stay_clean() {
        let mut gauge = BatteryGauge::new(ColorMode::WHITE);
        for pellet in gauge.pellets.iter_mut() {
            pellet.layer.take_damage();
        }
        gauge.update(60);
        let dirty: usize = gauge.pellets.iter().filter(|p| p.layer.is_dirty()).count();
        assert_eq!(dirty, 7);
    }

    #[test]
    fn pellets_fill_the_container_bottom_up() {
        assert_eq!(pellet_frame(0).top_left, Point::new(11, 49));
        assert_eq!(pellet_frame(19).top_left, Point::new(11, 11));
        for i in 0..PELLET_COUNT {
            let inside = CONTAINER_FRAME.intersection(&pellet_frame(i));
            assert_eq!(inside, pellet_frame(i));
        }
    }
}
