//! The in-memory copy of the 17 configuration registers.
//!
//! A [`RegisterImage`] is the single source of truth that is written to the chip, read back for
//! verification and validated before arming. It is a plain owned value; every component that needs
//! it takes it by reference.

use crate::error::DivisionByZero;
use crate::register::pin_ena::StopPins;
use crate::register::refclk_div::{divisions_from_frequency, RefClkDivisions, REFCLK_DIVISIONS_MASK};
use crate::register::{Channels, Field, CONFIG_LEN};

/// Power-on defaults from the TDC-GPX2 datasheet.
pub const DEFAULT_CONFIG: [u8; CONFIG_LEN] = [
    0x31, 0x01, 0x1F, 0x40,
    0x0D, 0x03, 0xC0, 0x53,
    0xA1, 0x13, 0x00, 0x0A,
    0xCC, 0xCC, 0x31, 0x8E,
    0x04,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterImage {
    bytes: [u8; CONFIG_LEN],
}

impl Default for RegisterImage {
    fn default() -> Self {
        Self { bytes: DEFAULT_CONFIG }
    }
}

impl RegisterImage {
    pub fn from_bytes(bytes: [u8; CONFIG_LEN]) -> Self {
        Self { bytes }
    }

    /// The register values in address order.
    pub fn as_bytes(&self) -> &[u8; CONFIG_LEN] {
        &self.bytes
    }

    /// Reads a field using a **typed marker** from [`crate::register`].
    ///
    /// ```rust
    /// use gpx2_rs::image::RegisterImage;
    /// use gpx2_rs::register::hit_ena::{HighResolution, HiresMode};
    ///
    /// let image = RegisterImage::default();
    /// assert_eq!(HiresMode::Off, image.get::<HighResolution>());
    /// ```
    pub fn get<F: Field>(&self) -> F::Value {
        let start = F::ADDR as usize;
        F::decode(&self.bytes[start..start + F::N])
    }

    /// Writes a field using a **typed marker** from [`crate::register`].
    ///
    /// Only the bits belonging to the field are changed, everything else in the image stays as it was.
    /// Values wider than the field are truncated.
    ///
    /// ```rust
    /// use gpx2_rs::image::RegisterImage;
    /// use gpx2_rs::register::hit_ena::{ChannelCombine, CombineMode};
    ///
    /// let mut image = RegisterImage::default();
    /// image.set::<ChannelCombine>(CombineMode::PulseWidth);
    /// assert_eq!(0x21, image.as_bytes()[1]);
    /// ```
    pub fn set<F: Field>(&mut self, value: F::Value) {
        let start = F::ADDR as usize;
        F::merge(&value, &mut self.bytes[start..start + F::N]);
    }

    /// Stores the reference clock period matching `frequency_hz`, truncated to 20 bits.
    ///
    /// Returns [`DivisionByZero`] and leaves the image untouched if `frequency_hz` is zero.
    pub fn set_refclk_frequency(&mut self, frequency_hz: u32) -> Result<(), DivisionByZero> {
        let divisions = divisions_from_frequency(frequency_hz)?;
        self.set::<RefClkDivisions>((divisions & REFCLK_DIVISIONS_MASK as u64) as u32);

        Ok(())
    }

    /// Channels whose STOP input is enabled. Only these produce output lines while measuring.
    pub fn active_channels(&self) -> Channels {
        self.get::<StopPins>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::cmos::CmosInput;
    use crate::register::fifo_mode::{BlockwiseFifo, CommonFifo};
    use crate::register::hit_ena::{ChannelCombine, CombineMode, HighResolution, HiresMode, HitEnable};
    use crate::register::pin_ena::{RefClkPin, RefClkReset, StopInputsDisabled};
    use crate::register::xosc::RefClkByXosc;

    /// Returns the indexes of all bytes that differ between the two images.
    fn changed_bytes(a: &RegisterImage, b: &RegisterImage) -> heapless::Vec<usize, CONFIG_LEN> {
        (0..CONFIG_LEN).filter(|&i| a.as_bytes()[i] != b.as_bytes()[i]).collect()
    }

    #[test]
    fn default_image_fields() {
        let image = RegisterImage::default();
        assert_eq!(Channels::CH1, image.get::<StopPins>());
        assert!(image.get::<RefClkPin>());
        assert!(!image.get::<StopInputsDisabled>());
        assert!(!image.get::<RefClkReset>());
        assert_eq!(Channels::CH1, image.get::<HitEnable>());
        assert_eq!(CombineMode::None, image.get::<ChannelCombine>());
        assert_eq!(HiresMode::Off, image.get::<HighResolution>());
        assert!(!image.get::<CommonFifo>());
        assert!(!image.get::<BlockwiseFifo>());
        assert_eq!(200_000, image.get::<RefClkDivisions>());
        assert!(!image.get::<RefClkByXosc>());
        assert!(image.get::<CmosInput>());
    }

    #[test]
    fn set_then_get_round_trips_and_leaves_other_bytes_alone() {
        let original = RegisterImage::default();

        let mut image = original;
        image.set::<StopPins>(Channels::CH2 | Channels::CH3);
        assert_eq!(Channels::CH2 | Channels::CH3, image.get::<StopPins>());
        assert!(image.get::<RefClkPin>());
        assert_eq!(&[0usize][..], &changed_bytes(&original, &image)[..]);

        let mut image = original;
        image.set::<HighResolution>(HiresMode::X2);
        assert_eq!(HiresMode::X2, image.get::<HighResolution>());
        assert_eq!(Channels::CH1, image.get::<HitEnable>());
        assert_eq!(CombineMode::None, image.get::<ChannelCombine>());
        assert_eq!(&[1usize][..], &changed_bytes(&original, &image)[..]);

        let mut image = original;
        image.set::<BlockwiseFifo>(true);
        assert!(image.get::<BlockwiseFifo>());
        assert!(!image.get::<CommonFifo>());
        assert_eq!(0x1F, image.as_bytes()[2] & 0x3F);
        assert_eq!(&[2usize][..], &changed_bytes(&original, &image)[..]);

        let mut image = original;
        image.set::<RefClkDivisions>(25_000);
        assert_eq!(25_000, image.get::<RefClkDivisions>());
        assert_eq!(original.as_bytes()[5] & 0xF0, image.as_bytes()[5] & 0xF0);
        assert_eq!(&[3usize, 4, 5][..], &changed_bytes(&original, &image)[..]);

        let mut image = original;
        image.set::<RefClkByXosc>(true);
        assert!(image.get::<RefClkByXosc>());
        assert_eq!(&[7usize][..], &changed_bytes(&original, &image)[..]);

        let mut image = original;
        image.set::<CmosInput>(false);
        assert!(!image.get::<CmosInput>());
        assert_eq!(&[16usize][..], &changed_bytes(&original, &image)[..]);
    }

    #[test]
    fn setting_same_value_is_a_no_op() {
        let original = RegisterImage::default();
        let mut image = original;
        image.set::<StopPins>(Channels::CH1);
        image.set::<RefClkPin>(true);
        image.set::<HitEnable>(Channels::CH1);
        image.set::<RefClkDivisions>(200_000);
        image.set::<CmosInput>(true);
        assert_eq!(original, image);
    }

    #[test]
    fn set_refclk_frequency() {
        let mut image = RegisterImage::default();
        image.set_refclk_frequency(1_000_000).unwrap();
        assert_eq!(1_000_000, image.get::<RefClkDivisions>());

        image.set_refclk_frequency(5_000_000).unwrap();
        assert_eq!(200_000, image.get::<RefClkDivisions>());
        assert_eq!(RegisterImage::default(), image);
    }

    #[test]
    fn set_refclk_frequency_truncates_slow_clocks() {
        let mut image = RegisterImage::default();
        // 1e12 / 100 kHz = 10 000 000 ps, which does not fit in 20 bits.
        image.set_refclk_frequency(100_000).unwrap();
        assert_eq!(10_000_000 & REFCLK_DIVISIONS_MASK, image.get::<RefClkDivisions>());
    }

    #[test]
    fn set_refclk_frequency_zero() {
        let mut image = RegisterImage::default();
        assert_eq!(Err(DivisionByZero), image.set_refclk_frequency(0));
        assert_eq!(RegisterImage::default(), image);
    }

    #[test]
    fn active_channels_follow_stop_pins() {
        let mut image = RegisterImage::default();
        image.set::<StopPins>(Channels::from_enables([false, true, false, true]));
        assert_eq!(Channels::CH2 | Channels::CH4, image.active_channels());
    }
}
