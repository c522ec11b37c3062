//! The byte transport between the driver and the TDC-GPX2.
//!
//! A [`Bus`] knows nothing about opcodes or registers. It performs one chip-select framed,
//! full-duplex exchange: every byte of the frame is clocked out while a response byte is clocked in
//! and stored in its place.

use core::future::Future;

pub trait Bus {
    type Error;

    /// Selects the chip, exchanges `frame` in place and deselects the chip again.
    ///
    /// On return `frame` holds the bytes received from the chip. The chip must be deselected on
    /// every exit path, including errors. There is no timeout: a wedged bus blocks the caller.
    fn exchange(&mut self, frame: &mut [u8]) -> impl Future<Output = Result<(), Self::Error>>;
}

/// [`Bus`] implementation on top of an [`embedded_hal_async::spi::SpiDevice`].
///
/// The `SpiDevice` owns the chip select line and guarantees that it is released when the
/// transaction ends, successfully or not. The SPI peripheral must be set up for 8 bit words,
/// MSB first, CPOL = 0 and CPHA = 1 (SPI mode 1) as required by the GPX2.
pub struct Spi<SpiType> {
    spi: SpiType,
}

impl<SpiType> Spi<SpiType>
where
    SpiType: embedded_hal_async::spi::SpiDevice
{
    pub(crate) fn new(spi: SpiType) -> Self {
        Self { spi }
    }

    /// Releases the underlying `SpiDevice`.
    pub fn release(self) -> SpiType {
        self.spi
    }
}

impl<SpiType> Bus for Spi<SpiType>
where
    SpiType: embedded_hal_async::spi::SpiDevice,
{
    type Error = <SpiType as embedded_hal_async::spi::ErrorType>::Error;

    async fn exchange(&mut self, frame: &mut [u8]) -> Result<(), Self::Error> {
        self.spi.transfer_in_place(frame).await?;

        Ok(())
    }
}
