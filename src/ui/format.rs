//! Time and date formatting for the watchface

use core::fmt;

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};

/// Time field width in 24 hour mode, where no suffix is shown.
pub const WIDE_TIME_WIDTH: u32 = 134;
/// Time field width in 12 hour mode, leaving room for the AM/PM suffix.
pub const NARROW_TIME_WIDTH: u32 = 110;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Fixed capacity text buffer filled through `format_no_std`.
#[derive(Clone, Copy)]
pub struct TextBuf<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> TextBuf<N> {
    /// Create an empty buffer
    pub const fn new() -> Self {
        Self { buf: [0; N], len: 0 }
    }

    /// Render formatting arguments into a new buffer.
    ///
    /// Output that doesn't fit leaves the buffer empty.
    pub fn from_fmt(args: fmt::Arguments<'_>) -> Self {
        let mut buf = [0; N];
        let len = format_no_std::show(&mut buf, args).map_or(0, str::len);
        Self { buf, len }
    }

    /// Copy a string into a new buffer
    pub fn from_text(text: &str) -> Self {
        Self::from_fmt(format_args!("{}", text))
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop a leading `'0'`, shifting the rest of the text left.
    fn strip_leading_zero(&mut self) {
        if self.len > 0 && self.buf[0] == b'0' {
            self.buf.copy_within(1..self.len, 0);
            self.len -= 1;
            self.buf[self.len] = 0;
        }
    }
}

impl<const N: usize> Default for TextBuf<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> PartialEq for TextBuf<N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl<const N: usize> Eq for TextBuf<N> {}

impl<const N: usize> fmt::Debug for TextBuf<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

#[cfg(feature = "defmt")]
impl<const N: usize> defmt::Format for TextBuf<N> {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.as_str())
    }
}

/// 12 or 24 hour clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockFormat {
    TwelveHour,
    TwentyFourHour,
}

impl ClockFormat {
    pub const fn from_24h_flag(is_24h: bool) -> Self {
        if is_24h {
            ClockFormat::TwentyFourHour
        } else {
            ClockFormat::TwelveHour
        }
    }

    pub const fn is_24h(self) -> bool {
        matches!(self, ClockFormat::TwentyFourHour)
    }

    /// The other format
    pub fn toggled(self) -> Self {
        Self::from_24h_flag(!self.is_24h())
    }

    /// Width of the time field for this format.
    pub fn time_field_width(self) -> u32 {
        match self {
            ClockFormat::TwelveHour => NARROW_TIME_WIDTH,
            ClockFormat::TwentyFourHour => WIDE_TIME_WIDTH,
        }
    }
}

/// Local wall clock broken down into the fields shown on the face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockReading {
    /// Hour, 0–23
    pub hour: u32,
    /// Minute, 0–59
    pub minute: u32,
    pub weekday: Weekday,
    /// Month, 1–12
    pub month: u32,
    /// Day of month, 1–31
    pub day: u32,
}

impl ClockReading {
    pub fn is_pm(&self) -> bool {
        self.hour >= 12
    }

    /// Hour on a 12 hour dial (1–12)
    pub fn hour12(&self) -> u32 {
        match self.hour % 12 {
            0 => 12,
            h => h,
        }
    }
}

impl From<&NaiveDateTime> for ClockReading {
    fn from(time: &NaiveDateTime) -> Self {
        Self {
            hour: time.hour(),
            minute: time.minute(),
            weekday: time.weekday(),
            month: time.month(),
            day: time.day(),
        }
    }
}

/// Texts and time field width for one redraw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayStrings {
    pub time: TextBuf<8>,
    /// Empty in 24 hour mode
    pub suffix: TextBuf<4>,
    pub date: TextBuf<16>,
    pub time_field_width: u32,
}

/// Format a clock reading for display.
pub fn format_display(reading: &ClockReading, format: ClockFormat) -> DisplayStrings {
    let (time, suffix) = match format {
        ClockFormat::TwentyFourHour => (
            TextBuf::from_fmt(format_args!("{:02}:{:02}", reading.hour, reading.minute)),
            TextBuf::new(),
        ),
        ClockFormat::TwelveHour => {
            let mut time =
                TextBuf::from_fmt(format_args!("{:02}:{:02}", reading.hour12(), reading.minute));
            time.strip_leading_zero();
            let suffix = TextBuf::from_text(if reading.is_pm() { "PM" } else { "AM" });
            (time, suffix)
        }
    };

    DisplayStrings {
        time,
        suffix,
        date: format_date(reading),
        time_field_width: format.time_field_width(),
    }
}

/// Abbreviated weekday, abbreviated month and two digit day, e.g. "Mon Jan 06".
pub fn format_date(reading: &ClockReading) -> TextBuf<16> {
    let month = MONTHS
        .get(reading.month.wrapping_sub(1) as usize)
        .copied()
        .unwrap_or("???");
    TextBuf::from_fmt(format_args!("{} {} {:02}", reading.weekday, month, reading.day))
}
