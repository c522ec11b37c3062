//! Runtime settings of the driver itself.
//!
//! These are not chip registers; the register contents live in [`crate::image::RegisterImage`].

/// SPI clock the GPX2 example wiring runs at.
pub const DEFAULT_SPI_CLOCK_HZ: u32 = 4_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Configuration {
    pub(crate) spi_clock_hz: u32,
    pub(crate) settle_time_us: u32,
    pub(crate) reset_settle_us: u32,
    pub(crate) interrupt_poll_limit: Option<u32>,
    pub(crate) verify_retries: u8,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            spi_clock_hz: DEFAULT_SPI_CLOCK_HZ,
            settle_time_us: 100,
            reset_settle_us: 100,
            interrupt_poll_limit: None,
            verify_retries: 0,
        }
    }
}

impl Configuration {
    /// The clock rate the SPI bus is set up with.
    ///
    /// The driver does not configure the bus; this value is used by the validator to judge whether
    /// the FIFO read modes can be drained fast enough.
    pub fn spi_clock_hz(mut self, spi_clock_hz: u32) -> Self {
        self.spi_clock_hz = spi_clock_hz;

        self
    }

    /// Time the chip needs after the init opcode before results are valid.
    pub fn settle_time_us(mut self, settle_time_us: u32) -> Self {
        self.settle_time_us = settle_time_us;

        self
    }

    /// Time to wait after a power-on reset before the chip accepts a configuration.
    pub fn reset_settle_us(mut self, reset_settle_us: u32) -> Self {
        self.reset_settle_us = reset_settle_us;

        self
    }

    /// Bounds the wait for the interrupt line when reading results.
    ///
    /// `None` (the default) waits forever, which is what the chip's contract calls for. `Some(n)` gives
    /// up after `n` polls with [`crate::error::Gpx2Error::Timeout`]; useful on a bench without stop signals.
    pub fn interrupt_poll_limit(mut self, limit: Option<u32>) -> Self {
        self.interrupt_poll_limit = limit;

        self
    }

    /// How many more times a configuration write is repeated when the read-back does not match.
    ///
    /// Defaults to 0: a mismatch is reported right away and the caller decides what to do.
    pub fn verify_retries(mut self, retries: u8) -> Self {
        self.verify_retries = retries;

        self
    }

    pub fn get_spi_clock_hz(&self) -> u32 {
        self.spi_clock_hz
    }
}
