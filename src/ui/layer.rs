//! Layers of the watchface
//!
//! A layer is a rectangle on the canvas with a hidden flag. Changes mark the
//! layer dirty and the watchface recomposes only the damaged areas.

use embedded_graphics::{
    draw_target::{DrawTarget, DrawTargetExt},
    geometry::{Point, Size},
    mono_font::{MonoFont, MonoTextStyle},
    primitives::{Polyline, Primitive, PrimitiveStyle, Rectangle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
    Drawable,
};

use super::{format::TextBuf, ColorMode};

/// Capacity of a text layer
pub const TEXT_LEN: usize = 16;

/// Position and visibility shared by all layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layer {
    frame: Rectangle,
    hidden: bool,
    dirty: bool,
    /// Area covered before the last frame change, cleared on the next draw
    erase: Option<Rectangle>,
}

impl Layer {
    pub const fn new(frame: Rectangle) -> Self {
        Self {
            frame,
            hidden: false,
            dirty: true,
            erase: None,
        }
    }

    pub fn frame(&self) -> Rectangle {
        self.frame
    }

    /// Move or resize the layer. Does nothing if the frame is unchanged.
    pub fn set_frame(&mut self, frame: Rectangle) {
        if frame != self.frame {
            // Keep the oldest area if the layer moves twice between draws
            let previous = self.erase.map_or(self.frame, |e| envelope(e, self.frame));
            self.erase = Some(previous);
            self.frame = frame;
            self.dirty = true;
        }
    }

    pub fn set_width(&mut self, width: u32) {
        let frame = Rectangle::new(self.frame.top_left, Size::new(width, self.frame.size.height));
        self.set_frame(frame);
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Set the hidden flag. Always marks the layer dirty.
    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Areas that must be recomposed: the area left behind by a frame
    /// change and, if dirty, the current frame. Resets the layer to clean.
    pub fn take_damage(&mut self) -> [Option<Rectangle>; 2] {
        let frame = if self.dirty { Some(self.frame) } else { None };
        self.dirty = false;
        [self.erase.take(), frame]
    }

    /// Whether the layer paints anything inside `area`.
    pub fn covers(&self, area: &Rectangle) -> bool {
        !self.hidden && !self.frame.intersection(area).is_zero_sized()
    }
}

/// Smallest rectangle covering both `a` and `b`.
fn envelope(a: Rectangle, b: Rectangle) -> Rectangle {
    match (a.bottom_right(), b.bottom_right()) {
        (Some(a_end), Some(b_end)) => Rectangle::with_corners(
            a.top_left.component_min(b.top_left),
            a_end.component_max(b_end),
        ),
        (None, _) => b,
        (_, None) => a,
    }
}

/// Single line of text
pub struct TextLayer {
    pub layer: Layer,
    text: TextBuf<TEXT_LEN>,
    font: &'static MonoFont<'static>,
    color: ColorMode,
    alignment: Alignment,
}

impl TextLayer {
    pub fn new(
        frame: Rectangle,
        text: &str,
        font: &'static MonoFont<'static>,
        color: ColorMode,
        alignment: Alignment,
    ) -> Self {
        Self {
            layer: Layer::new(frame),
            text: TextBuf::from_text(text),
            font,
            color,
            alignment,
        }
    }

    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    /// Replace the text, marking the layer dirty only if it changed.
    pub fn set_text(&mut self, text: &str) {
        if self.text.as_str() != text {
            self.text = TextBuf::from_text(text);
            self.layer.mark_dirty();
        }
    }

    /// Paint the text, clipped to the frame.
    pub fn paint<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = ColorMode>,
    {
        if self.layer.hidden {
            return Ok(());
        }

        let frame = self.layer.frame;
        let anchor = match self.alignment {
            Alignment::Left => frame.top_left,
            Alignment::Center => frame.top_left + Point::new(frame.size.width as i32 / 2, 0),
            Alignment::Right => frame.top_left + Point::new(frame.size.width as i32 - 1, 0),
        };
        let character_style = MonoTextStyle::new(self.font, self.color);
        let text_style = TextStyleBuilder::new()
            .alignment(self.alignment)
            .baseline(Baseline::Top)
            .build();

        Text::with_text_style(self.text.as_str(), anchor, character_style, text_style)
            .draw(&mut target.clipped(&frame))?;
        Ok(())
    }
}

/// What a bitmap layer paints inside its frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Graphic {
    /// One pixel border
    Outline,
    /// Filled frame
    Solid,
    /// Bluetooth rune scaled to the frame
    BluetoothRune,
}

/// Layer painted from primitives
pub struct BitmapLayer {
    pub layer: Layer,
    graphic: Graphic,
    color: ColorMode,
}

impl BitmapLayer {
    pub const fn new(frame: Rectangle, graphic: Graphic, color: ColorMode) -> Self {
        Self {
            layer: Layer::new(frame),
            graphic,
            color,
        }
    }

    /// Paint the graphic, clipped to the frame.
    pub fn paint<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = ColorMode>,
    {
        if self.layer.hidden {
            return Ok(());
        }

        let frame = self.layer.frame;
        let mut clipped = target.clipped(&frame);
        match self.graphic {
            Graphic::Outline => frame
                .into_styled(PrimitiveStyle::with_stroke(self.color, 1))
                .draw(&mut clipped)?,
            Graphic::Solid => frame
                .into_styled(PrimitiveStyle::with_fill(self.color))
                .draw(&mut clipped)?,
            Graphic::BluetoothRune => {
                let points = bluetooth_rune(frame);
                Polyline::new(&points)
                    .into_styled(PrimitiveStyle::with_stroke(self.color, 1))
                    .draw(&mut clipped)?
            }
        }
        Ok(())
    }
}

/// Stroke points of the Bluetooth rune inside `frame`.
fn bluetooth_rune(frame: Rectangle) -> [Point; 6] {
    let w = frame.size.width as i32 - 1;
    let h = frame.size.height as i32 - 1;
    let mid = w / 2;
    let origin = frame.top_left;
    [
        origin + Point::new(0, h / 4),
        origin + Point::new(w, h * 3 / 4),
        origin + Point::new(mid, h),
        origin + Point::new(mid, 0),
        origin + Point::new(w, h / 4),
        origin + Point::new(0, h * 3 / 4),
    ]
}
