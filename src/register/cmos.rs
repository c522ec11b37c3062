//! ### CMOS_INPUT (`0x10`, bit 2, R/W)
//!
//! Selects single ended CMOS levels on the STOP and REFCLK inputs instead of LVDS.
//!
//! ### Default values
//! `0x04`: CMOS input enabled.
use crate::register::{merge_flag, Field, Reg};

/// Marker type for the `CMOS_INPUT` bit.
pub struct CmosInput;
impl Reg for CmosInput { const ADDR: u8 = 0x10; }

impl Field for CmosInput {
    type Value = bool;

    fn decode(b: &[u8]) -> Self::Value {
        (b[0] >> 2) & 1 != 0
    }

    fn merge(v: &Self::Value, b: &mut [u8]) {
        b[0] = merge_flag(b[0], 2, *v);
    }
}
