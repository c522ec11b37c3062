//! ### REFCLK_DIVISIONS (`0x03 - 0x05`, 20 bits, R/W)
//!
//! The reference clock period in picoseconds. The chip uses it to scale the stop results, so it has to
//! match the clock actually applied to REFCLK (or the XOSC crystal).
//!
//! - `0x03`: bits 0-7
//! - `0x04`: bits 8-15
//! - `0x05` bits 0-3: bits 16-19. The upper nibble of `0x05` belongs to other settings and is preserved.
//!
//! Values wider than 20 bits are truncated when stored.
//!
//! ### Default values
//! `0x40 0x0D 0x03`: 200 000 ps, a 5 MHz reference clock.
//!
//! ### Examples
//! ```rust
//! use gpx2_rs::image::RegisterImage;
//! use gpx2_rs::register::refclk_div::{divisions_from_frequency, RefClkDivisions};
//!
//! let mut image = RegisterImage::default();
//! image.set::<RefClkDivisions>(divisions_from_frequency(10_000_000).unwrap() as u32);
//! assert_eq!(100_000, image.get::<RefClkDivisions>());
//! ```
#![doc(alias = "REFCLK_DIVISIONS")]
use crate::error::DivisionByZero;
use crate::register::{Field, Reg};

/// Mask of the 20 bits the chip stores.
pub const REFCLK_DIVISIONS_MASK: u32 = 0x000F_FFFF;

const PICOSECONDS_PER_SECOND: u64 = 1_000_000_000_000;

/// Marker type for the `REFCLK_DIVISIONS` field.
pub struct RefClkDivisions;
impl Reg for RefClkDivisions { const ADDR: u8 = 0x03; }

impl Field for RefClkDivisions {
    type Value = u32;

    const N: usize = 3;

    fn decode(b: &[u8]) -> Self::Value {
        u32::from_le_bytes([b[0], b[1], b[2] & 0x0F, 0])
    }

    fn merge(v: &Self::Value, b: &mut [u8]) {
        let [low, mid, high, _] = (v & REFCLK_DIVISIONS_MASK).to_le_bytes();
        b[0] = low;
        b[1] = mid;
        b[2] = (b[2] & 0xF0) | high;
    }
}

/// Computes the reference clock period in picoseconds for a clock of `frequency_hz`, rounded to the nearest picosecond.
///
/// The result is not truncated to 20 bits here; that happens when it is stored in the image.
pub fn divisions_from_frequency(frequency_hz: u32) -> Result<u64, DivisionByZero> {
    if frequency_hz == 0 {
        return Err(DivisionByZero);
    }

    let frequency_hz = frequency_hz as u64;
    Ok((PICOSECONDS_PER_SECOND + frequency_hz / 2) / frequency_hz)
}

/// Computes the reference clock frequency in Hz for the given period in picoseconds.
pub fn frequency_from_divisions(divisions: u32) -> Result<u64, DivisionByZero> {
    if divisions == 0 {
        return Err(DivisionByZero);
    }

    Ok(PICOSECONDS_PER_SECOND / divisions as u64)
}
