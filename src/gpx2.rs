use crate::bus::{Bus, Spi};
use crate::config::Configuration;
use crate::error::Gpx2Error;
use crate::image::RegisterImage;
use crate::opcode::Opcode;
use crate::register::{CHANNEL_COUNT, CONFIG_LEN};
use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;
use log::{debug, warn};

/// Number of result bytes read per cycle: 4 channels, reference index and stop value, 3 bytes each.
pub const RESULT_LEN: usize = CHANNEL_COUNT * 2 * 3;

/// Type alias for a Gpx2 chip communicating over SPI
type Gpx2Spi<T, IntPin, D> = Gpx2<Spi<T>, IntPin, D>;

/// Main Gpx2 driver struct
///
/// Every public method is exactly one chip-select framed transaction on the bus.
pub struct Gpx2<B, IntPin, D> {
    bus: B,
    int_pin: IntPin,
    delay: D,
    config: Configuration,
}

/// Type alias used to simplify return types throughout the driver
pub type Gpx2Result<T, BusError, PinError> = Result<T, Gpx2Error<BusError, PinError>>;

impl<T, IntPin, D> Gpx2Spi<T, IntPin, D>
where
    T: embedded_hal_async::spi::SpiDevice,
    Spi<T>: Bus,
    IntPin: InputPin,
    D: DelayNs,
{
    /// Constructs a new Gpx2 driver instance that communicates over SPI
    ///
    /// `int_pin` is the chip's INTERRUPT output, which is pulled low when results are ready.
    ///
    /// This function will issue a power-on reset if `reset` == [`ResetPolicy::PowerOn`]. It does not
    /// write any configuration; use [`Gpx2::write_and_verify`] for that.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use embedded_hal::digital::InputPin;
    /// # use embedded_hal_async::delay::DelayNs;
    /// # use embedded_hal_async::spi::SpiDevice;
    /// # use gpx2_rs::Gpx2Result;
    ///  use gpx2_rs::{Gpx2, ResetPolicy};
    ///  use gpx2_rs::config::Configuration;
    /// # async fn demo<S: SpiDevice, P: InputPin, D: DelayNs>(spi: S, int_pin: P, delay: D) -> Gpx2Result<(), S::Error, P::Error> {
    ///
    ///  let device = Gpx2::new_spi(
    ///     spi,
    ///     int_pin,
    ///     Configuration::default(),
    ///     ResetPolicy::PowerOn,
    ///     delay
    ///  ).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new_spi(
        spi: T,
        int_pin: IntPin,
        config: Configuration,
        reset: ResetPolicy,
        delay: D,
    ) -> Gpx2Result<Self, <Spi<T> as Bus>::Error, IntPin::Error> {
        Self::new(Spi::new(spi), int_pin, config, reset, delay).await
    }
}

impl<B, IntPin, D> Gpx2<B, IntPin, D>
where
    B: Bus,
    IntPin: InputPin,
    D: DelayNs,
{
    /// Creates a new instance of the Gpx2 driver struct on top of any [`Bus`].
    pub async fn new(
        bus: B,
        int_pin: IntPin,
        config: Configuration,
        reset: ResetPolicy,
        delay: D,
    ) -> Gpx2Result<Self, B::Error, IntPin::Error> {
        let mut device = Gpx2 { bus, int_pin, delay, config };

        if reset == ResetPolicy::PowerOn {
            device.power_reset().await?;
        }

        Ok(device)
    }

    /// Issues a power-on reset.
    ///
    /// All configuration registers return to their defaults. The driver then waits
    /// [`Configuration::reset_settle_us`] before returning.
    pub async fn power_reset(&mut self) -> Gpx2Result<(), B::Error, IntPin::Error> {
        debug!("GPX2 power-on reset");
        let mut frame = [u8::from(Opcode::PowerReset)];
        self.bus.exchange(&mut frame).await.map_err(Gpx2Error::Bus)?;

        self.delay.delay_us(self.config.reset_settle_us).await;

        Ok(())
    }

    /// Writes all 17 configuration registers, starting at address 0.
    pub async fn write_config(&mut self, image: &RegisterImage) -> Gpx2Result<(), B::Error, IntPin::Error> {
        let mut frame = [0u8; CONFIG_LEN + 1];
        frame[0] = Opcode::WriteConfig.with_address(0);
        frame[1..].copy_from_slice(image.as_bytes());

        debug!("GPX2 write config {:02X?}", image.as_bytes());
        self.bus.exchange(&mut frame).await.map_err(Gpx2Error::Bus)?;

        Ok(())
    }

    /// Reads all 17 configuration registers, starting at address 0.
    pub async fn read_config(&mut self) -> Gpx2Result<[u8; CONFIG_LEN], B::Error, IntPin::Error> {
        let mut frame = [0u8; CONFIG_LEN + 1];
        frame[0] = Opcode::ReadConfig.with_address(0);
        self.bus.exchange(&mut frame).await.map_err(Gpx2Error::Bus)?;

        let mut config = [0u8; CONFIG_LEN];
        config.copy_from_slice(&frame[1..]);

        Ok(config)
    }

    /// Reads the configuration back from the chip and compares it to `image`.
    ///
    /// Returns `false` on the first register that differs. The offending register is logged, but
    /// only the pass/fail result is reported. No retries are made here.
    pub async fn verify(&mut self, image: &RegisterImage) -> Gpx2Result<bool, B::Error, IntPin::Error> {
        let readback = self.read_config().await?;

        let mismatch = image
            .as_bytes()
            .iter()
            .zip(readback.iter())
            .enumerate()
            .find(|(_, (expected, actual))| expected != actual);

        match mismatch {
            Some((index, (expected, actual))) => {
                warn!(
                    "GPX2 config mismatch at byte {} (register 0x{:02X}): wrote 0x{:02X}, read 0x{:02X}",
                    index, index, expected, actual
                );
                Ok(false)
            }
            None => Ok(true),
        }
    }

    /// Writes `image` and verifies it.
    ///
    /// On a mismatch the write is repeated up to [`Configuration::verify_retries`] more times.
    /// Returns whether the chip ended up holding `image`.
    pub async fn write_and_verify(&mut self, image: &RegisterImage) -> Gpx2Result<bool, B::Error, IntPin::Error> {
        let attempts = self.config.verify_retries as u16 + 1;

        for attempt in 1..=attempts {
            self.write_config(image).await?;
            if self.verify(image).await? {
                return Ok(true);
            }

            if attempt < attempts {
                warn!("GPX2 config verification failed, retrying ({}/{})", attempt, attempts - 1);
            }
        }

        Ok(false)
    }

    /// Initializes the chip and starts measuring.
    ///
    /// Waits [`Configuration::settle_time_us`] (100 µs by default) afterwards, which the chip needs
    /// before it produces valid results.
    pub async fn start_measurement(&mut self) -> Gpx2Result<(), B::Error, IntPin::Error> {
        debug!("GPX2 init, starting measurement");
        let mut frame = [u8::from(Opcode::Init)];
        self.bus.exchange(&mut frame).await.map_err(Gpx2Error::Bus)?;

        self.delay.delay_us(self.config.settle_time_us).await;

        Ok(())
    }

    /// Waits for results and reads the reference index and stop value of all 4 channels.
    ///
    /// This busy-polls the interrupt pin until the chip pulls it low. Unless
    /// [`Configuration::interrupt_poll_limit`] is set, there is no timeout: without stop events the
    /// call never returns.
    pub async fn read_results(&mut self) -> Gpx2Result<Measurement, B::Error, IntPin::Error> {
        self.wait_for_interrupt()?;

        let mut frame = [0u8; RESULT_LEN + 1];
        frame[0] = Opcode::ReadResults.with_address(Opcode::RESULTS_ADDR);
        self.bus.exchange(&mut frame).await.map_err(Gpx2Error::Bus)?;

        let mut results = [0u8; RESULT_LEN];
        results.copy_from_slice(&frame[1..]);

        Ok(decode_results(&results))
    }

    fn wait_for_interrupt(&mut self) -> Gpx2Result<(), B::Error, IntPin::Error> {
        let mut polls: u32 = 0;

        while !self.int_pin.is_low().map_err(Gpx2Error::Pin)? {
            polls = polls.saturating_add(1);
            if let Some(limit) = self.config.interrupt_poll_limit {
                if polls >= limit {
                    return Err(Gpx2Error::Timeout);
                }
            }

            core::hint::spin_loop();
        }

        Ok(())
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    /// Destroys the driver and returns the bus, the interrupt pin and the delay.
    pub fn release(self) -> (B, IntPin, D) {
        (self.bus, self.int_pin, self.delay)
    }
}

/// Decodes the result registers. Every value is 24 bits, big-endian, in the order
/// ch1 reference index, ch1 stop, ch2 reference index, ch2 stop, and so on.
fn decode_results(b: &[u8; RESULT_LEN]) -> Measurement {
    let mut channels = [ChannelResult::default(); CHANNEL_COUNT];

    for (channel, chunk) in channels.iter_mut().zip(b.chunks_exact(6)) {
        channel.reference_index = u32::from_be_bytes([0, chunk[0], chunk[1], chunk[2]]);
        channel.stop = u32::from_be_bytes([0, chunk[3], chunk[4], chunk[5]]);
    }

    Measurement { channels }
}

/// The result of one channel
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelResult {
    /// Number of reference clock periods since the last reference index reset.
    pub reference_index: u32,
    /// Time of the stop event within the reference clock period, in units of the configured resolution.
    pub stop: u32,
}

/// Holds the results of all 4 channels from one read.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Measurement {
    pub channels: [ChannelResult; CHANNEL_COUNT],
}

/// What to do when constructing the driver.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResetPolicy {
    /// Send the power-on reset opcode and wait for the chip to settle (recommended default).
    PowerOn,
    /// Don't reset; leave the chip as-is.
    None,
}
