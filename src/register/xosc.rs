//! ### REF_CLK_BY_XOSC (`0x07`, bit 7, R/W)
//!
//! When set, the reference clock is generated by a crystal on the XOSC pins instead of the
//! REFCLK input. The remaining bits of register 7 are left untouched.
//!
//! ### Default values
//! `0x53`: external REFCLK.
use crate::register::{merge_flag, Field, Reg};

/// Marker type for the `REF_CLK_BY_XOSC` bit.
pub struct RefClkByXosc;
impl Reg for RefClkByXosc { const ADDR: u8 = 0x07; }

impl Field for RefClkByXosc {
    type Value = bool;

    fn decode(b: &[u8]) -> Self::Value {
        (b[0] >> 7) & 1 != 0
    }

    fn merge(v: &Self::Value, b: &mut [u8]) {
        b[0] = merge_flag(b[0], 7, *v);
    }
}
