//! ### PIN_ENA - Pin enables (`0x00`, 1 byte, R/W)
//!
//! - bits 0-3: `PIN_ENA_STOP1..4`, enables the STOP inputs
//! - bit 4: `PIN_ENA_REFCLK`, enables the external reference clock input
//! - bit 6: `PIN_ENA_DISABLE`, master switch; when set, all STOP inputs are ignored
//! - bit 7: `PIN_ENA_RSTIDX`, reference index reset pulse
//!
//! ### Default values
//! `0x31`: STOP1 and REFCLK enabled.
//!
//! ### Examples
//! ```rust
//! use gpx2_rs::image::RegisterImage;
//! use gpx2_rs::register::Channels;
//! use gpx2_rs::register::pin_ena::{RefClkPin, StopPins};
//!
//! let mut image = RegisterImage::default();
//! image.set::<StopPins>(Channels::CH1 | Channels::CH2);
//! assert!(image.get::<RefClkPin>());
//! ```
#![doc(alias = "PIN_ENA")]
use crate::register::{merge_bits, merge_flag, Channels, Field, Reg};

const ADDR: u8 = 0x00;

/// Marker type for the `PIN_ENA_STOP1..4` bits.
pub struct StopPins;
impl Reg for StopPins { const ADDR: u8 = ADDR; }

impl Field for StopPins {
    type Value = Channels;

    fn decode(b: &[u8]) -> Self::Value {
        Channels::from_bits_truncate(b[0] & 0x0F)
    }

    fn merge(v: &Self::Value, b: &mut [u8]) {
        b[0] = merge_bits(b[0], 0x0F, 0, v.bits());
    }
}

/// Marker type for the `PIN_ENA_REFCLK` bit.
pub struct RefClkPin;
impl Reg for RefClkPin { const ADDR: u8 = ADDR; }

impl Field for RefClkPin {
    type Value = bool;

    fn decode(b: &[u8]) -> Self::Value {
        (b[0] >> 4) & 1 != 0
    }

    fn merge(v: &Self::Value, b: &mut [u8]) {
        b[0] = merge_flag(b[0], 4, *v);
    }
}

/// Marker type for the `PIN_ENA_DISABLE` bit.
///
/// This is the STOP master switch. Setting it pauses all STOP inputs without touching the
/// individual `PIN_ENA_STOPx` bits.
pub struct StopInputsDisabled;
impl Reg for StopInputsDisabled { const ADDR: u8 = ADDR; }

impl Field for StopInputsDisabled {
    type Value = bool;

    fn decode(b: &[u8]) -> Self::Value {
        (b[0] >> 6) & 1 != 0
    }

    fn merge(v: &Self::Value, b: &mut [u8]) {
        b[0] = merge_flag(b[0], 6, *v);
    }
}

/// Marker type for the `PIN_ENA_RSTIDX` bit, used to pulse a reference clock index reset.
pub struct RefClkReset;
impl Reg for RefClkReset { const ADDR: u8 = ADDR; }

impl Field for RefClkReset {
    type Value = bool;

    fn decode(b: &[u8]) -> Self::Value {
        (b[0] >> 7) & 1 != 0
    }

    fn merge(v: &Self::Value, b: &mut [u8]) {
        b[0] = merge_flag(b[0], 7, *v);
    }
}
