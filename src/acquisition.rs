//! Steady-state operation: configure, arm, then drain results until told otherwise.
//!
//! [`AcquisitionLoop`] owns the driver, the register image and the control state. Everything the
//! loop needs from outside comes through two seams: an [`Operator`] that edits the image and
//! hands out control commands, and a [`core::fmt::Write`] sink that receives the validation reports
//! and result lines.
//!
//! The loop moves through [`State::Configuring`], [`State::Arming`] and [`State::Running`]. A
//! configuration that cannot be verified after writing sends it to [`State::Halted`], which is only
//! left by [`Command::Restart`]. A restart ends [`AcquisitionLoop::run`] with [`Exit::Restart`];
//! rebooting is up to the caller.

use crate::bus::Bus;
use crate::error::AcquisitionError;
use crate::gpx2::Gpx2;
use crate::image::RegisterImage;
use crate::register::pin_ena::{RefClkReset, StopInputsDisabled};
use crate::validation::validate;
use core::fmt::Write;
use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;
use log::{debug, error, info};

/// Written to the output sink when the chip does not hold the configuration that was written.
pub const HALT_MESSAGE: &str = "Config write error, press Q to reset";

pub type AcquisitionResult<T, BusError, PinError> = Result<T, AcquisitionError<BusError, PinError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Waiting for the operator to produce a configuration that passes validation.
    Configuring,
    /// Writing and verifying the configuration, then starting the measurement.
    Arming,
    Running,
    /// The chip rejected a configuration; only a restart leaves this state.
    Halted,
}

/// Control commands an operator can send while the loop is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Disables the STOP inputs and stops reading results.
    Pause,
    /// Restores the STOP inputs and restarts the measurement.
    Resume,
    /// Pulses the reference clock index reset.
    ClockReset,
    /// Leaves the loop so the device can be restarted.
    Restart,
}

impl Command {
    /// Maps the operator keys `p`, `r`, `c` and `q` (either case) to commands.
    pub fn from_char(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'p' => Some(Command::Pause),
            'r' => Some(Command::Resume),
            'c' => Some(Command::ClockReset),
            'q' => Some(Command::Restart),
            _ => None,
        }
    }
}

/// Why [`AcquisitionLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The operator asked for a full restart.
    Restart,
}

/// The source of configuration edits and control commands.
pub trait Operator {
    /// Edits `image` in place. Called again with the same image until it passes validation.
    fn configure(&mut self, image: &mut RegisterImage);

    /// Returns the next pending command, if any. Must not block.
    fn poll_command(&mut self) -> Option<Command>;
}

/// Signals driving the running loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    measuring: bool,
    clock_reset_pending: bool,
    /// The STOP master disable bit as it was before pausing. `None` while not paused.
    stop_disable_before_pause: Option<bool>,
}

impl Default for ControlState {
    fn default() -> Self {
        ControlState { measuring: true, clock_reset_pending: false, stop_disable_before_pause: None }
    }
}

impl ControlState {
    pub fn is_measuring(&self) -> bool {
        self.measuring
    }

    pub fn is_clock_reset_pending(&self) -> bool {
        self.clock_reset_pending
    }

    fn pause(&mut self, image: &mut RegisterImage) {
        if self.stop_disable_before_pause.is_none() {
            self.stop_disable_before_pause = Some(image.get::<StopInputsDisabled>());
        }
        image.set::<StopInputsDisabled>(true);
        self.measuring = false;
    }

    fn resume(&mut self, image: &mut RegisterImage) {
        if let Some(disabled) = self.stop_disable_before_pause.take() {
            image.set::<StopInputsDisabled>(disabled);
        }
        self.measuring = true;
    }
}

pub struct AcquisitionLoop<B, IntPin, D, O, W> {
    device: Gpx2<B, IntPin, D>,
    image: RegisterImage,
    control: ControlState,
    state: State,
    operator: O,
    output: W,
}

impl<B, IntPin, D, O, W> AcquisitionLoop<B, IntPin, D, O, W>
where
    B: Bus,
    IntPin: InputPin,
    D: DelayNs,
    O: Operator,
    W: Write,
{
    /// Creates a loop in [`State::Configuring`], starting from `image`.
    ///
    /// The device is expected to be freshly reset, see [`crate::ResetPolicy`].
    pub fn new(device: Gpx2<B, IntPin, D>, image: RegisterImage, operator: O, output: W) -> Self {
        AcquisitionLoop {
            device,
            image,
            control: ControlState::default(),
            state: State::Configuring,
            operator,
            output,
        }
    }

    /// Runs until the operator asks for a restart.
    ///
    /// Under normal operation this only returns [`Exit::Restart`]. Bus and pin failures end the loop
    /// with an error; verify failures do not, they halt the loop instead.
    pub async fn run(&mut self) -> AcquisitionResult<Exit, B::Error, IntPin::Error> {
        loop {
            if let Some(exit) = self.step().await? {
                return Ok(exit);
            }
        }
    }

    /// Does the work of the current state once: one configuration attempt, the arming sequence, one
    /// running cycle or one command poll while halted.
    pub async fn step(&mut self) -> AcquisitionResult<Option<Exit>, B::Error, IntPin::Error> {
        match self.state {
            State::Configuring => self.configure().await.map(|_| None),
            State::Arming => self.arm().await.map(|_| None),
            State::Running => self.cycle().await,
            State::Halted => Ok(self.halted()),
        }
    }

    async fn configure(&mut self) -> AcquisitionResult<(), B::Error, IntPin::Error> {
        self.operator.configure(&mut self.image);

        let verdict = validate(&self.image, self.device.configuration().get_spi_clock_hz());
        write!(self.output, "{}", verdict)?;

        if verdict.passed() {
            self.transition(State::Arming);
        }

        Ok(())
    }

    async fn arm(&mut self) -> AcquisitionResult<(), B::Error, IntPin::Error> {
        if !self.apply().await? {
            return Ok(());
        }

        writeln!(self.output, "Config written, starting measurement...")?;
        self.device.start_measurement().await?;
        self.transition(State::Running);

        Ok(())
    }

    async fn cycle(&mut self) -> AcquisitionResult<Option<Exit>, B::Error, IntPin::Error> {
        if self.control.clock_reset_pending {
            self.image.set::<RefClkReset>(false);
            if !self.apply().await? {
                return Ok(None);
            }
            self.control.clock_reset_pending = false;
            self.device.start_measurement().await?;
        }

        if let Some(command) = self.operator.poll_command() {
            debug!("Operator command {:?}", command);

            match command {
                Command::Pause => {
                    self.control.pause(&mut self.image);
                    if !self.apply().await? {
                        return Ok(None);
                    }
                }
                Command::Resume => {
                    self.control.resume(&mut self.image);
                    if !self.apply().await? {
                        return Ok(None);
                    }
                    self.device.start_measurement().await?;
                }
                Command::ClockReset => {
                    self.image.set::<RefClkReset>(true);
                    if !self.apply().await? {
                        return Ok(None);
                    }
                    self.control.clock_reset_pending = true;
                }
                Command::Restart => {
                    info!("Restart requested");
                    return Ok(Some(Exit::Restart));
                }
            }
        }

        if self.control.measuring {
            let measurement = self.device.read_results().await?;
            let active = self.image.active_channels();

            for (i, result) in measurement.channels.iter().enumerate() {
                if active.is_enabled(i) {
                    writeln!(self.output, "CH{}: REF={}   STOP={}", i + 1, result.reference_index, result.stop)?;
                }
            }
        }

        Ok(None)
    }

    fn halted(&mut self) -> Option<Exit> {
        match self.operator.poll_command() {
            Some(Command::Restart) => {
                info!("Restart requested while halted");
                Some(Exit::Restart)
            }
            _ => {
                core::hint::spin_loop();
                None
            }
        }
    }

    /// Writes the image and verifies it. Halts the loop if the chip does not hold it afterwards.
    async fn apply(&mut self) -> AcquisitionResult<bool, B::Error, IntPin::Error> {
        if self.device.write_and_verify(&self.image).await? {
            return Ok(true);
        }

        error!("GPX2 rejected the configuration, halting");
        self.transition(State::Halted);
        writeln!(self.output, "{}", HALT_MESSAGE)?;

        Ok(false)
    }

    fn transition(&mut self, next: State) {
        info!("Acquisition {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn image(&self) -> &RegisterImage {
        &self.image
    }

    pub fn control(&self) -> &ControlState {
        &self.control
    }

    /// Destroys the loop and returns the driver, the operator and the output sink.
    pub fn release(self) -> (Gpx2<B, IntPin, D>, O, W) {
        (self.device, self.operator, self.output)
    }
}
