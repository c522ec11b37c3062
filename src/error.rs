//! Errors that can occur when using the TDC-GPX2 device.
//!
//! [`Gpx2Error`] covers everything that can go wrong while talking to the chip. It is generic over
//! the underlying SPI error type and the interrupt pin error type.
//!
//! Configuration problems are not errors: they are reported as findings by
//! [`crate::validation::validate`], and a failed read-back is reported as `false` by
//! [`crate::Gpx2::verify`].

/// This represents all possible errors that can occur when communicating with the TDC-GPX2.
#[derive(Debug, PartialEq)]
pub enum Gpx2Error<BusError, PinError> {
    /// An error has occurred in the SPI driver
    Bus(BusError),

    /// Reading the interrupt pin failed
    Pin(PinError),

    /// The interrupt line did not go low within the configured number of polls.
    ///
    /// Only returned when [`crate::config::Configuration::interrupt_poll_limit`] is set; by default
    /// the driver waits for the interrupt indefinitely.
    Timeout,
}

/// Returned when a reference clock period is requested for a frequency of zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DivisionByZero;

impl core::fmt::Display for DivisionByZero {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("reference clock frequency must not be zero")
    }
}

/// Errors that end [`crate::acquisition::AcquisitionLoop::run`].
///
/// Validation failures and verify mismatches are not in here: the loop handles those itself by
/// prompting again or halting.
#[derive(Debug, PartialEq)]
pub enum AcquisitionError<BusError, PinError> {
    /// Talking to the chip failed
    Device(Gpx2Error<BusError, PinError>),

    /// The output sink refused a write
    Output(core::fmt::Error),
}

impl<BusError, PinError> From<Gpx2Error<BusError, PinError>> for AcquisitionError<BusError, PinError> {
    fn from(err: Gpx2Error<BusError, PinError>) -> Self {
        AcquisitionError::Device(err)
    }
}

impl<BusError, PinError> From<core::fmt::Error> for AcquisitionError<BusError, PinError> {
    fn from(err: core::fmt::Error) -> Self {
        AcquisitionError::Output(err)
    }
}
