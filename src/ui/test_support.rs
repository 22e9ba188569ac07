//! Draw target recording every pixel written to it

use core::convert::Infallible;

use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Point, Size},
    Pixel,
};

use super::{ColorMode, CANVAS_HEIGHT, CANVAS_WIDTH};

pub struct Recorder {
    pixels: Vec<Option<ColorMode>>,
    log: Vec<Point>,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            pixels: vec![None; (CANVAS_WIDTH * CANVAS_HEIGHT) as usize],
            log: Vec::new(),
        }
    }

    fn index(point: Point) -> Option<usize> {
        let inside = (0..CANVAS_WIDTH as i32).contains(&point.x)
            && (0..CANVAS_HEIGHT as i32).contains(&point.y);
        inside.then(|| point.y as usize * CANVAS_WIDTH as usize + point.x as usize)
    }

    /// Last colour written at `point`
    pub fn pixel(&self, point: Point) -> Option<ColorMode> {
        Self::index(point).and_then(|i| self.pixels[i])
    }

    /// Every point written since the last reset, in order
    pub fn log(&self) -> &[Point] {
        &self.log
    }

    pub fn reset_log(&mut self) {
        self.log.clear();
    }
}

impl OriginDimensions for Recorder {
    fn size(&self) -> Size {
        Size::new(CANVAS_WIDTH, CANVAS_HEIGHT)
    }
}

impl DrawTarget for Recorder {
    type Color = ColorMode;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some(i) = Self::index(point) {
                self.pixels[i] = Some(color);
                self.log.push(point);
            }
        }
        Ok(())
    }
}
