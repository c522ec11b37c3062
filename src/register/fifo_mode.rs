//! ### FIFO mode bits (`0x02`, 1 byte, R/W)
//!
//! - bit 6: `COMMON_FIFO_READ`, results of all channels are read through one common FIFO
//! - bit 7: `BLOCKWISE_FIFO_READ`, results are only released once the FIFO holds a complete block
//!
//! The lower six bits hold LVDS and FIFO-depth settings which this driver does not expose.
//!
//! ### Default values
//! `0x1F`: both modes off.
use crate::register::{merge_flag, Field, Reg};

const ADDR: u8 = 0x02;

/// Marker type for the `COMMON_FIFO_READ` bit.
pub struct CommonFifo;
impl Reg for CommonFifo { const ADDR: u8 = ADDR; }

impl Field for CommonFifo {
    type Value = bool;

    fn decode(b: &[u8]) -> Self::Value {
        (b[0] >> 6) & 1 != 0
    }

    fn merge(v: &Self::Value, b: &mut [u8]) {
        b[0] = merge_flag(b[0], 6, *v);
    }
}

/// Marker type for the `BLOCKWISE_FIFO_READ` bit.
pub struct BlockwiseFifo;
impl Reg for BlockwiseFifo { const ADDR: u8 = ADDR; }

impl Field for BlockwiseFifo {
    type Value = bool;

    fn decode(b: &[u8]) -> Self::Value {
        (b[0] >> 7) & 1 != 0
    }

    fn merge(v: &Self::Value, b: &mut [u8]) {
        b[0] = merge_flag(b[0], 7, *v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_mode_decode() {
        assert!(!CommonFifo::decode(&[0x1F]));
        assert!(!BlockwiseFifo::decode(&[0x1F]));
        assert!(CommonFifo::decode(&[0b0100_0000]));
        assert!(BlockwiseFifo::decode(&[0b1000_0000]));
    }

    #[test]
    fn fifo_mode_merge() {
        let mut buffer = [0x1Fu8];
        CommonFifo::merge(&true, &mut buffer);
        assert_eq!([0x5F], buffer);

        BlockwiseFifo::merge(&true, &mut buffer);
        assert_eq!([0xDF], buffer);

        CommonFifo::merge(&false, &mut buffer);
        assert_eq!([0x9F], buffer);
    }
}
