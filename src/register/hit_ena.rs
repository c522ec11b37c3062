//! ### HIT_ENA - Input processing (`0x01`, 1 byte, R/W)
//!
//! - bits 0-3: `HIT_ENA_STOP1..4`, enables hit processing per channel
//! - bits 4-5: `CHANNEL_COMBINE`, merges channel pairs into pulse distance or pulse width measurement
//! - bits 6-7: `HIGH_RESOLUTION`, interpolation mode
//!
//! ### Default values
//! `0x01`: HIT_ENA1 enabled, no channel combine, high resolution off.
#![doc(alias = "HIT_ENA")]
use crate::register::{merge_bits, Channels, Field, Reg};

const ADDR: u8 = 0x01;

/// Marker type for the `HIT_ENA_STOP1..4` bits.
pub struct HitEnable;
impl Reg for HitEnable { const ADDR: u8 = ADDR; }

impl Field for HitEnable {
    type Value = Channels;

    fn decode(b: &[u8]) -> Self::Value {
        Channels::from_bits_truncate(b[0] & 0x0F)
    }

    fn merge(v: &Self::Value, b: &mut [u8]) {
        b[0] = merge_bits(b[0], 0x0F, 0, v.bits());
    }
}

/// Marker type for the `CHANNEL_COMBINE` bits.
pub struct ChannelCombine;
impl Reg for ChannelCombine { const ADDR: u8 = ADDR; }

impl Field for ChannelCombine {
    type Value = CombineMode;

    fn decode(b: &[u8]) -> Self::Value {
        CombineMode::from((b[0] >> 4) & 0b11)
    }

    fn merge(v: &Self::Value, b: &mut [u8]) {
        b[0] = merge_bits(b[0], 0b0011_0000, 4, (*v).into());
    }
}

/// Channel combine modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineMode {
    /// Each channel timestamps independently.
    None,
    /// STOP1/STOP2 report the distance between two pulses.
    PulseDistance,
    /// STOP1/STOP2 report the width of a pulse.
    PulseWidth,
    /// `0b11` is not a documented mode.
    Reserved,
}

impl CombineMode {
    pub fn is_enabled(&self) -> bool {
        *self != CombineMode::None
    }
}

impl From<u8> for CombineMode {
    fn from(field: u8) -> Self {
        match field {
            0b00 => CombineMode::None,
            0b01 => CombineMode::PulseDistance,
            0b10 => CombineMode::PulseWidth,
            _ => CombineMode::Reserved,
        }
    }
}

impl From<CombineMode> for u8 {
    fn from(mode: CombineMode) -> u8 {
        match mode {
            CombineMode::None => 0b00,
            CombineMode::PulseDistance => 0b01,
            CombineMode::PulseWidth => 0b10,
            CombineMode::Reserved => 0b11,
        }
    }
}

/// Operator selector: `D` for pulse distance, `W` for pulse width, anything else for none.
impl From<char> for CombineMode {
    fn from(selector: char) -> Self {
        match selector.to_ascii_uppercase() {
            'D' => CombineMode::PulseDistance,
            'W' => CombineMode::PulseWidth,
            _ => CombineMode::None,
        }
    }
}

/// Marker type for the `HIGH_RESOLUTION` bits.
pub struct HighResolution;
impl Reg for HighResolution { const ADDR: u8 = ADDR; }

impl Field for HighResolution {
    type Value = HiresMode;

    fn decode(b: &[u8]) -> Self::Value {
        HiresMode::from((b[0] >> 6) & 0b11)
    }

    fn merge(v: &Self::Value, b: &mut [u8]) {
        b[0] = merge_bits(b[0], 0b1100_0000, 6, (*v).into());
    }
}

/// High resolution interpolation modes.
///
/// Note that the register encoding is not the multiplier: `X2` is stored as `1` and `X4` as `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiresMode {
    Off,
    X2,
    X4,
    /// `0b11` is not a documented mode.
    Reserved,
}

impl HiresMode {
    /// Maps an operator supplied multiplier (`2` or `4`) to a mode. Anything else turns high resolution off.
    pub fn from_multiplier(multiplier: u8) -> Self {
        match multiplier {
            2 => HiresMode::X2,
            4 => HiresMode::X4,
            _ => HiresMode::Off,
        }
    }

    pub fn is_enabled(&self) -> bool {
        *self != HiresMode::Off
    }
}

impl From<u8> for HiresMode {
    fn from(field: u8) -> Self {
        match field {
            0b00 => HiresMode::Off,
            0b01 => HiresMode::X2,
            0b10 => HiresMode::X4,
            _ => HiresMode::Reserved,
        }
    }
}

impl From<HiresMode> for u8 {
    fn from(mode: HiresMode) -> u8 {
        match mode {
            HiresMode::Off => 0b00,
            HiresMode::X2 => 0b01,
            HiresMode::X4 => 0b10,
            HiresMode::Reserved => 0b11,
        }
    }
}
