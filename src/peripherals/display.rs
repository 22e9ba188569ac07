//! Display control module for PineTime

use display_interface_spi::SPIInterface;
use embassy_nrf::{
    gpio::Output,
    peripherals::{P0_18, P0_25, P0_26},
    spim::{self, Spim},
};
use embassy_time::Delay;
use embedded_graphics::{
    draw_target::{DrawTargetExt, Translated},
    geometry::Point,
};
use mipidsi::{models::ST7789, Builder, Orientation};

use pellet_watchface::{
    ui::{CANVAS_HEIGHT, CANVAS_WIDTH},
    Error,
};

const LCD_W: u16 = 240;
const LCD_H: u16 = 240;

/// Top left corner of the watchface canvas, centred on the panel
const CANVAS_ORIGIN: Point = Point::new(
    (LCD_W as i32 - CANVAS_WIDTH as i32) / 2,
    (LCD_H as i32 - CANVAS_HEIGHT as i32) / 2,
);

pub type Lcd<SPI> = mipidsi::Display<
    SPIInterface<Spim<'static, SPI>, Output<'static, P0_18>, Output<'static, P0_25>>,
    ST7789,
    Output<'static, P0_26>,
>;

pub struct Display<SPI>
where
    SPI: spim::Instance,
{
    lcd: Lcd<SPI>,
}

impl<SPI> Display<SPI>
where
    SPI: spim::Instance,
{
    /// Configure display settings on boot
    pub fn init(
        spim: Spim<'static, SPI>,
        cs_pin: Output<'static, P0_25>,
        dc_pin: Output<'static, P0_18>,
        rst_pin: Output<'static, P0_26>,
    ) -> Result<Self, Error> {
        let lcd = Builder::st7789(SPIInterface::new(spim, dc_pin, cs_pin))
            .with_display_size(LCD_W, LCD_H)
            .with_orientation(Orientation::Portrait(false))
            .init(&mut Delay, Some(rst_pin))
            .map_err(|_| Error::Display)?;
        Ok(Self { lcd })
    }

    /// Draw target for the watchface canvas
    pub fn canvas(&mut self) -> Translated<'_, Lcd<SPI>> {
        self.lcd.translated(CANVAS_ORIGIN)
    }
}
