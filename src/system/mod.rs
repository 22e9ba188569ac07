pub mod power;
pub mod time;
