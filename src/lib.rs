#![no_std]

pub mod acquisition;
pub mod bus;
pub mod config;
pub mod error;
pub mod image;
pub mod opcode;
pub mod register;
pub mod validation;
mod gpx2;

#[cfg(test)]
mod testing;

pub use gpx2::{ChannelResult, Gpx2, Gpx2Result, Measurement, ResetPolicy, RESULT_LEN};
