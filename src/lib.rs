//! Pellet watchface
//!
//! Clock, date, Bluetooth indicator and a 20 pellet battery gauge. Everything
//! with decision logic lives in this library so it can be tested on the host;
//! the PineTime firmware in `main.rs` only feeds it events and a display.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod config;
pub mod error;
pub mod system;
pub mod ui;

pub use error::Error;
