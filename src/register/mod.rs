//! Typed views over the GPX2 configuration register file.
//!
//! Every field of the 17-byte image is described by a marker type implementing [`Field`].
//! The marker knows the first register address, how many consecutive registers it spans and how
//! to extract and merge its bits. [`crate::image::RegisterImage::get`] and
//! [`crate::image::RegisterImage::set`] use these markers, so a setter can never touch bits
//! outside of its own span.

pub mod pin_ena;
pub mod hit_ena;
pub mod fifo_mode;
pub mod refclk_div;
pub mod xosc;
pub mod cmos;

use bitflags::bitflags;

/// Number of configuration registers on the TDC-GPX2.
pub const CONFIG_LEN: usize = 17;

/// Number of measurement channels on the TDC-GPX2.
pub const CHANNEL_COUNT: usize = 4;

pub trait Reg { const ADDR: u8; }

/// A field inside the configuration register file.
pub trait Field: Reg {
    type Value;

    /// Number of consecutive registers starting at [`Reg::ADDR`] that hold the field.
    const N: usize = 1;

    /// Extracts the field from `b`, which starts at [`Reg::ADDR`].
    fn decode(b: &[u8]) -> Self::Value;

    /// Clears the field span in `b` and merges `v` into it. Bits outside the span are preserved.
    fn merge(v: &Self::Value, b: &mut [u8]);
}

/// Clears `mask` in `byte` and ORs in `value` shifted by `shift`, truncated to the mask.
pub(crate) fn merge_bits(byte: u8, mask: u8, shift: u8, value: u8) -> u8 {
    (byte & !mask) | ((value << shift) & mask)
}

pub(crate) fn merge_flag(byte: u8, bit: u8, set: bool) -> u8 {
    merge_bits(byte, 1 << bit, bit, set as u8)
}

bitflags! {
    /// A set of the four measurement channels, bit `n` being channel `n + 1`.
    ///
    /// Used for both the STOP pin enables and the HIT_ENA bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Channels: u8 {
        const CH1 = 1 << 0;
        const CH2 = 1 << 1;
        const CH3 = 1 << 2;
        const CH4 = 1 << 3;
    }
}

impl Channels {
    /// Builds the set from one enable flag per channel, channel 1 first.
    pub fn from_enables(enables: [bool; CHANNEL_COUNT]) -> Self {
        enables
            .iter()
            .enumerate()
            .filter(|(_, enabled)| **enabled)
            .fold(Channels::empty(), |set, (i, _)| set | Channels::from_bits_retain(1 << i))
    }

    /// Is the channel with zero-based `index` part of the set?
    pub fn is_enabled(&self, index: usize) -> bool {
        index < CHANNEL_COUNT && self.bits() & (1 << index) != 0
    }
}
